//! Import of Polarion work item exports.
//!
//! [`PolarionExport`] reads the XML export, [`PolarionImporter`] turns the
//! document outline into folders and creates one item per work item, with
//! pictures from a [`PictureFolder`] uploaded along the way.

mod images;
mod import;
mod text;
mod workitem;

pub use images::PictureFolder;
pub use import::{
    load_item_tracker, CategoryFields, ImportOptions, ImportReport, PolarionImporter,
    DEFAULT_IMPORT_REASON, REJECTED_LABEL, UPLINK_ROLES,
};
pub use text::{first_sentence, heading_title, remove_numbers, replace_dots, Description, StepRow, StepTable};
pub use workitem::{compare_outline, outline_parts, LinkedWorkItem, PolarionExport, WorkItem, PARENT_ROLE};
