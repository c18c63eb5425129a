use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info, warn};

use super::images::PictureFolder;
use super::text::{remove_numbers, replace_dots};
use super::workitem::{PolarionExport, WorkItem};
use crate::{
    dto::{CategoryAndItems, FieldValueList},
    ItemDraft, MatrixClient, MatrixError, Result,
};

/// Link roles whose targets are listed in the `Uplinks` field.
pub const UPLINK_ROLES: [&str; 4] = ["implements", "refines", "verifies", "depends_on"];

/// Label put on items the item tracker does not know.
pub const REJECTED_LABEL: &str = "rejected";

pub const DEFAULT_IMPORT_REASON: &str = "Polarion import";

const DESCRIPTION_FIELD: &str = "Description";
const LEGACY_ID_FIELD: &str = "LegacyID";
const UPLINKS_FIELD: &str = "Uplinks";

#[derive(Clone, Debug)]
pub struct ImportOptions {
    /// Polarion type id to Matrix category.
    pub categories: BTreeMap<String, String>,
    /// Category for types missing from `categories`.
    pub default_category: Option<String>,
    /// Only import work items of this type.
    pub type_filter: Option<String>,
    /// Label of the category field receiving test steps.
    pub steps_field: Option<String>,
    /// Roles listed as uplinks on top of [`UPLINK_ROLES`].
    pub extra_uplink_roles: Vec<String>,
    pub remove_numbers: bool,
    pub replace_dots: bool,
    /// Work item ids known to the item tracker. Items outside it are
    /// labelled [`REJECTED_LABEL`].
    pub tracked_items: Option<HashSet<String>>,
    pub reason: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            categories: BTreeMap::new(),
            default_category: None,
            type_filter: None,
            steps_field: None,
            extra_uplink_roles: Vec::new(),
            remove_numbers: false,
            replace_dots: false,
            tracked_items: None,
            reason: DEFAULT_IMPORT_REASON.to_owned(),
        }
    }
}

impl ImportOptions {
    pub fn category_of(&self, type_id: &str) -> Option<&str> {
        self.categories
            .get(type_id)
            .or(self.default_category.as_ref())
            .map(String::as_str)
    }

    fn wants(&self, item: &WorkItem) -> bool {
        !item.is_structural()
            && self
                .type_filter
                .as_deref()
                .map_or(true, |wanted| wanted == item.type_id)
    }

    fn is_uplink(&self, role: &str) -> bool {
        UPLINK_ROLES.contains(&role) || self.extra_uplink_roles.iter().any(|extra| extra == role)
    }
}

/// Ids of the fields an import writes in one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryFields {
    pub description: i64,
    pub legacy_id: Option<i64>,
    pub uplinks: Option<i64>,
    pub steps: Option<i64>,
}

impl CategoryFields {
    pub fn resolve(
        category: &str,
        definition: &CategoryAndItems,
        steps_field: Option<&str>,
    ) -> Result<Self> {
        let id_of = |label: &str| definition.field_by_label(label).map(|field| field.id);
        let description = id_of(DESCRIPTION_FIELD).ok_or_else(|| {
            MatrixError::InvalidArgument(format!(
                "category {category} has no {DESCRIPTION_FIELD} field"
            ))
        })?;
        Ok(Self {
            description,
            legacy_id: id_of(LEGACY_ID_FIELD),
            uplinks: id_of(UPLINKS_FIELD),
            steps: steps_field.and_then(id_of),
        })
    }
}

/// What an import created, and what it left out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Heading work item id and the folder made from it.
    pub folders: Vec<(String, String)>,
    /// Legacy work item id and the new item ref.
    pub items: Vec<(String, String)>,
    /// Work items with no category or no heading above them.
    pub skipped: Vec<String>,
    /// Work item id and the error that stopped it.
    pub failed: Vec<(String, String)>,
}

/// Recreates the documents of a Polarion export as Matrix folders and items.
///
/// Headings become folders under the category root `F-<CAT>-1`, every other
/// work item becomes an item in the folder of its closest heading.
pub struct PolarionImporter<'a> {
    client: &'a MatrixClient,
    project: String,
    options: ImportOptions,
    pictures: Option<PictureFolder>,
    fields: HashMap<String, CategoryFields>,
    folders: HashMap<(String, String), String>,
}

impl<'a> PolarionImporter<'a> {
    pub fn new(client: &'a MatrixClient, project: impl Into<String>, options: ImportOptions) -> Self {
        Self {
            client,
            project: project.into(),
            options,
            pictures: None,
            fields: HashMap::new(),
            folders: HashMap::new(),
        }
    }

    /// Uploads pictures found in descriptions from `pictures`.
    pub fn with_pictures(mut self, pictures: PictureFolder) -> Self {
        self.pictures = Some(pictures);
        self
    }

    /// Imports every wanted work item. A failing item is recorded in the
    /// report and the import goes on; a category without a description
    /// field stops it before anything is created.
    pub async fn run(&mut self, export: &PolarionExport) -> Result<ImportReport> {
        let categories: BTreeSet<String> = export
            .items()
            .iter()
            .filter(|item| self.options.wants(item))
            .filter_map(|item| self.options.category_of(&item.type_id))
            .map(str::to_owned)
            .collect();
        for category in categories {
            if self.fields.contains_key(&category) {
                continue;
            }
            let definition = self.client.get_category(&self.project, &category).await?;
            let fields =
                CategoryFields::resolve(&category, &definition, self.options.steps_field.as_deref())?;
            debug!(%category, ?fields, "category fields resolved");
            self.fields.insert(category, fields);
        }

        let mut report = ImportReport::default();
        for item in export.items() {
            if !self.options.wants(item) {
                continue;
            }
            let Some(category) = self.options.category_of(&item.type_id).map(str::to_owned) else {
                warn!(item = %item.id, type_id = %item.type_id, "no category for work item type");
                report.skipped.push(item.id.clone());
                continue;
            };
            let headings = export.heading_path(item);
            if headings.is_empty() {
                warn!(item = %item.id, "work item has no heading above it");
                report.skipped.push(item.id.clone());
                continue;
            }

            let imported = match self.ensure_folders(&category, &headings, &mut report).await {
                Ok(folder) => self.import_item(&category, &folder, item).await,
                Err(err) => Err(err),
            };
            match imported {
                Ok(item_ref) => {
                    info!(legacy = %item.id, %item_ref, "item created");
                    report.items.push((item.id.clone(), item_ref));
                }
                Err(err) => {
                    warn!(item = %item.id, error = %err, "work item not imported");
                    report.failed.push((item.id.clone(), err.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Folder for the innermost heading of `headings`, creating the missing
    /// levels from the category root down.
    async fn ensure_folders(
        &mut self,
        category: &str,
        headings: &[&WorkItem],
        report: &mut ImportReport,
    ) -> Result<String> {
        let mut parent = format!("F-{category}-1");
        for heading in headings {
            let key = (category.to_owned(), heading.id.clone());
            if let Some(existing) = self.folders.get(&key) {
                parent = existing.clone();
                continue;
            }
            let label = if self.options.remove_numbers {
                heading.folder_title()
            } else {
                heading.title.clone()
            };
            let ack = self
                .client
                .add_folder(
                    &self.project,
                    &parent,
                    &label,
                    &self.options.reason,
                    &FieldValueList::default(),
                )
                .await?;
            let folder = format!("F-{category}-{}", ack.serial);
            info!(heading = %heading.id, %folder, %parent, "folder created");
            report.folders.push((heading.id.clone(), folder.clone()));
            self.folders.insert(key, folder.clone());
            parent = folder;
        }
        Ok(parent)
    }

    async fn import_item(&mut self, category: &str, folder: &str, item: &WorkItem) -> Result<String> {
        let fields = self.fields.get(category).copied().ok_or_else(|| {
            MatrixError::InvalidArgument(format!("fields of category {category} not resolved"))
        })?;

        let mut title = item.title.clone();
        if self.options.remove_numbers {
            title = remove_numbers(&title);
        }
        if self.options.replace_dots && title.contains("...") {
            title = replace_dots(&title, &item.description);
        }

        let (mut html, mut steps) = match (fields.steps, &item.description.steps) {
            (Some(_), Some(table)) => (table.html_without_table.clone(), Some(table.to_json())),
            _ => (item.description.html.clone(), None),
        };
        if let Some(pictures) = &mut self.pictures {
            html = pictures.rehost(self.client, &self.project, &html).await?;
            if let Some(json) = steps {
                steps = Some(pictures.rehost(self.client, &self.project, &json).await?);
            }
        }

        let mut draft = ItemDraft::new(title, &self.options.reason).field(fields.description, html);
        if let Some(id) = fields.legacy_id {
            draft = draft.field(id, &item.id);
        }
        let uplinks = self.uplinks(item);
        if let Some(id) = fields.uplinks.filter(|_| !uplinks.is_empty()) {
            draft = draft.field(id, uplinks.join(","));
        }
        if let (Some(id), Some(steps)) = (fields.steps, steps) {
            draft = draft.field(id, steps);
        }
        let untracked = self
            .options
            .tracked_items
            .as_ref()
            .is_some_and(|tracked| !tracked.contains(&item.id));
        if untracked {
            draft = draft.labels(vec![REJECTED_LABEL.to_owned()]);
        }

        let ack = self.client.add_item(&self.project, folder, &draft).await?;
        Ok(format!("{category}-{}", ack.serial))
    }

    fn uplinks<'i>(&self, item: &'i WorkItem) -> Vec<&'i str> {
        item.links
            .iter()
            .filter(|link| self.options.is_uplink(&link.role))
            .map(|link| link.work_item_id.as_str())
            .collect()
    }
}

/// Work item ids of an item tracker export, one `id|...` line per entry.
pub async fn load_item_tracker(path: &Path) -> Result<HashSet<String>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(tracked_ids(&text))
}

fn tracked_ids(text: &str) -> HashSet<String> {
    text.lines()
        .map(|line| line.split('|').next().unwrap_or_default().trim())
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}
