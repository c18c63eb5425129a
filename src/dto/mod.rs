//! Serde mirrors of the server's JSON payloads.
//!
//! Every field is defaulted and unknown keys are ignored, so older and
//! newer servers decode into the same types.

mod audit;
mod category;
mod item;
mod job;
mod project;
mod setting;
mod user;

pub use audit::{Tag, TrimAudit, TrimAuditList};
pub use category::{
    AllCategories, Category, CategoryAdd, CategoryAndItems, CategoryExtended, CategoryList, Field,
    FieldId, FieldList,
};
pub use item::{
    CategoryRoot, FancyLeaf, FieldValue, FieldValueList, HtmlCompareRequest, HtmlCompareResponse,
    Item, ItemAndSerial, ItemAndValue, ItemHistoryEntry, ItemLink, ItemList, ItemWithChildren,
    ItemWithHistory, LinkItem, NeedleFieldValue, TrimNeedle, TrimNeedleItem,
};
pub use job::{Job, JobFile, JobId, JobStatus, JobWithUrl, JobsWithUrl};
pub use project::{
    ConvertWordAck, DateAck, FileAndKey, GroupProjectPermission, LicenseStatus, ProjectDetails,
    ProjectFile, ProjectFileList, ProjectType, ProjectsAndSettings, ServerStatus, UserPermission,
    LEGACY_SERVER_VERSION,
};
pub use setting::{
    AllSetting, CategorySetting, DeletedProjectsSetting, LabelDisplay, LabelOnOff, LabelSetting,
    LabelStyle, LabelsSetting, PluginSettings, Setting, TraceRule, TraceRuleCategory,
    TraceabilitySetting,
};
pub use user::{
    CreateUser, Group, GroupList, GroupMember, GroupPermission, ProjectAccess,
    ProjectAccessPeriod, Token, TokenAck, User, UserAck, UserDetails, UserDetailsAdvanced,
    UserEdit, UserList, UserListWithDetails,
};
