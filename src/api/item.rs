use std::path::Path;

use chrono::{DateTime, Utc};

use super::{require_file, require_project};
use crate::{
    client::decode,
    dto::{
        ConvertWordAck, FancyLeaf, FieldValueList, FileAndKey, HtmlCompareRequest,
        HtmlCompareResponse, ItemAndSerial, ItemAndValue, ItemList, ItemWithChildren,
        ItemWithHistory, JobId, ProjectFileList, TrimNeedle,
    },
    util::format_iso8601_utc,
    MatrixClient, MatrixError, Params, RequestSpec, Result,
};

/// Content of an item to create or update.
///
/// Field values are sent as `fx<field id>` form parameters. `labels`, when
/// set, replaces the item's labels (servers 1.7 and later).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub title: String,
    pub reason: String,
    pub fields: FieldValueList,
    /// Only honoured on creation.
    pub author: Option<String>,
    pub labels: Option<Vec<String>>,
}

impl ItemDraft {
    pub fn new(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reason: reason.into(),
            ..Self::default()
        }
    }

    pub fn field(mut self, id: i64, value: impl Into<String>) -> Self {
        self.fields.set(id, value);
        self
    }

    pub fn fields(mut self, fields: FieldValueList) -> Self {
        self.fields = fields;
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }
}

fn push_fields(form: &mut Params, fields: &FieldValueList) {
    for field in &fields.field_val {
        form.push(format!("fx{}", field.id), &field.value);
    }
}

fn item_ack(body: &str) -> Result<ItemAndSerial> {
    let ack: ItemAndSerial = decode(body, "item creation")?;
    if ack.item_id == 0 {
        return Err(MatrixError::rejected("Error adding item", body));
    }
    Ok(ack)
}

impl MatrixClient {
    pub async fn get_item(&self, project: &str, item: &str) -> Result<ItemAndValue> {
        self.fetch(RequestSpec::get(format!("/{project}/item/{item}")), "item")
            .await
    }

    /// Item as it was at `date` (any format the server accepts, e.g. ISO-8601).
    pub async fn get_item_at_date(
        &self,
        project: &str,
        item: &str,
        date: &str,
    ) -> Result<ItemAndValue> {
        let spec = RequestSpec::get(format!("/{project}/item/{item}")).query([("atDate", date)]);
        self.fetch(spec, "item").await
    }

    pub async fn get_item_with_history(
        &self,
        project: &str,
        item: &str,
    ) -> Result<ItemWithHistory> {
        let spec = RequestSpec::get(format!("/{project}/item/{item}")).query([("history", "1")]);
        self.fetch(spec, "item with history").await
    }

    pub async fn get_item_with_children(
        &self,
        project: &str,
        item: &str,
    ) -> Result<ItemWithChildren> {
        self.get_item_with_children_options(project, item, ()).await
    }

    /// Folder with its children; `options` are extra query parameters
    /// such as `fields` or `filter`.
    pub async fn get_item_with_children_options(
        &self,
        project: &str,
        item: &str,
        options: impl Into<Params>,
    ) -> Result<ItemWithChildren> {
        let mut query = Params::new().with("children", "yes");
        for (name, value) in options.into().iter() {
            query.push(name, value);
        }
        let spec = RequestSpec::get(format!("/{project}/item/{item}")).query(query);
        self.fetch(spec, "item with children").await
    }

    /// Items of a document (`DOC-` item).
    pub async fn get_item_list(&self, project: &str, doc: &str) -> Result<ItemList> {
        self.fetch(
            RequestSpec::get(format!("/{project}/itemlist/{doc}")),
            "item list",
        )
        .await
    }

    pub async fn add_item(
        &self,
        project: &str,
        folder: &str,
        draft: &ItemDraft,
    ) -> Result<ItemAndSerial> {
        let mut form = Params::new()
            .with("title", &draft.title)
            .with("folder", folder)
            .with("reason", &draft.reason)
            .with_opt("author", draft.author.as_deref());
        push_fields(&mut form, &draft.fields);
        if let Some(labels) = &draft.labels {
            form.push("labels", labels.join(","));
        }
        let body = self.rest_post(&format!("/{project}/item"), form).await?;
        item_ack(&body)
    }

    pub async fn add_folder(
        &self,
        project: &str,
        parent: &str,
        label: &str,
        reason: &str,
        fields: &FieldValueList,
    ) -> Result<ItemAndSerial> {
        let mut form = Params::new()
            .with("label", label)
            .with("parent", parent)
            .with("reason", reason);
        push_fields(&mut form, fields);
        let body = self.rest_post(&format!("/{project}/folder"), form).await?;
        item_ack(&body)
    }

    /// Replaces title, fields and, when given, labels of an item.
    pub async fn update_item(&self, project: &str, item: &str, draft: &ItemDraft) -> Result<String> {
        let mut form = Params::new()
            .with("title", &draft.title)
            .with("reason", &draft.reason);
        push_fields(&mut form, &draft.fields);
        if let Some(labels) = &draft.labels {
            self.ensure_labels_supported().await?;
            form.push("labels", labels.join(","));
        }
        self.rest_put(&format!("/{project}/item/{item}"), form).await
    }

    /// Like [`MatrixClient::update_item`] but fields missing from the draft
    /// are left untouched.
    pub async fn update_item_only_those(
        &self,
        project: &str,
        item: &str,
        draft: &ItemDraft,
    ) -> Result<String> {
        let mut form = Params::new()
            .with("onlyThoseFields", "1")
            .with("onlyThoseLabels", "1")
            .with("title", &draft.title)
            .with("reason", &draft.reason);
        push_fields(&mut form, &draft.fields);
        self.rest_put(&format!("/{project}/item/{item}"), form).await
    }

    /// Adds `label` to an item. Does nothing if it is already set.
    pub async fn set_label(&self, project: &str, item: &str, label: &str, reason: &str) -> Result<()> {
        self.ensure_labels_supported().await?;
        let current = self.get_item(project, item).await?;
        let mut labels = current.labels.unwrap_or_default();
        if labels.iter().any(|l| l == label) {
            return Ok(());
        }
        labels.push(label.to_owned());
        let draft = ItemDraft::new(current.title, reason)
            .fields(current.field_val_list)
            .labels(labels);
        self.update_item(project, item, &draft).await?;
        Ok(())
    }

    pub async fn unset_label(
        &self,
        project: &str,
        item: &str,
        label: &str,
        reason: &str,
    ) -> Result<()> {
        self.ensure_labels_supported().await?;
        let current = self.get_item(project, item).await?;
        let labels = current
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter(|l| l != label)
            .collect();
        let draft = ItemDraft::new(current.title, reason)
            .fields(current.field_val_list)
            .labels(labels);
        self.update_item(project, item, &draft).await?;
        Ok(())
    }

    pub async fn delete_item(&self, project: &str, item: &str, reason: &str) -> Result<String> {
        let spec = RequestSpec::delete(format!("/{project}/item/{item}")).query([("reason", reason)]);
        self.text(spec).await
    }

    /// Deletes a folder and everything below it.
    pub async fn delete_folder(&self, project: &str, folder: &str, reason: &str) -> Result<String> {
        let spec = RequestSpec::delete(format!("/{project}/item/{folder}"))
            .query([("confirm", "yes"), ("reason", reason)]);
        self.text(spec).await
    }

    /// Restores a deleted item, or rolls it back to `version`.
    pub async fn restore_item(
        &self,
        project: &str,
        item: &str,
        version: Option<u32>,
        reason: &str,
    ) -> Result<String> {
        let form = Params::new().with_opt("at", version).with("reason", reason);
        self.rest_post(&format!("/{project}/item/{item}"), form).await
    }

    /// Moves an item. `new_position` starts at 1.
    pub async fn move_item_to_folder(
        &self,
        project: &str,
        item: &str,
        new_folder: Option<&str>,
        new_position: Option<u32>,
        reason: &str,
    ) -> Result<String> {
        let query = Params::new()
            .with_opt("newPosition", new_position)
            .with_opt("newFolder", new_folder)
            .with("reason", reason);
        self.text(RequestSpec::put(format!("/{project}/item/{item}")).query(query))
            .await
    }

    /// Moves a comma separated list of items into `folder`.
    pub async fn move_in(
        &self,
        project: &str,
        folder: &str,
        items: &str,
        reason: Option<&str>,
    ) -> Result<String> {
        let form = Params::new()
            .with("items", items)
            .with_opt("reason", reason.filter(|r| !r.is_empty()));
        self.rest_post(&format!("/{project}/movein/{folder}"), form)
            .await
    }

    pub async fn add_link(
        &self,
        project: &str,
        up_item: &str,
        down_item: &str,
        reason: &str,
    ) -> Result<String> {
        self.rest_post(
            &format!("/{project}/itemlink/{up_item}/{down_item}"),
            [("reason", reason)],
        )
        .await
    }

    pub async fn delete_link(
        &self,
        project: &str,
        up_item: &str,
        down_item: &str,
        reason: &str,
    ) -> Result<String> {
        let spec = RequestSpec::delete(format!("/{project}/itemlink/{up_item}/{down_item}"))
            .query([("reason", reason)]);
        self.text(spec).await
    }

    /// Full-text search.
    pub async fn find(&self, project: &str, needle: &str) -> Result<TrimNeedle> {
        self.find_with_parameters(project, needle, ()).await
    }

    /// Search with extra parameters such as `fieldsOut` or `labels`.
    pub async fn find_with_parameters(
        &self,
        project: &str,
        needle: &str,
        parameters: impl Into<Params>,
    ) -> Result<TrimNeedle> {
        let mut query = Params::new().with("search", needle);
        for (name, value) in parameters.into().iter() {
            query.push(name, value);
        }
        let spec = RequestSpec::get(format!("/{project}/needle")).query(query);
        self.fetch(spec, "search result").await
    }

    /// Search returning only the matching refs.
    pub async fn find_minimal(&self, project: &str, needle: &str) -> Result<Vec<String>> {
        let spec = RequestSpec::get(format!("/{project}/needleminimal")).query([("search", needle)]);
        self.fetch(spec, "search result").await
    }

    pub async fn get_fancy_tree(
        &self,
        project: &str,
        filters: Option<&[String]>,
    ) -> Result<Vec<FancyLeaf>> {
        self.get_fancy_tree_at_date(project, filters, None).await
    }

    /// Project tree, optionally filtered by labels and taken at a past date.
    pub async fn get_fancy_tree_at_date(
        &self,
        project: &str,
        filters: Option<&[String]>,
        at: Option<DateTime<Utc>>,
    ) -> Result<Vec<FancyLeaf>> {
        let query = Params::new()
            .with_opt("filter", filters.map(|f| f.join(",")))
            .with_opt("atDate", at.map(format_iso8601_utc));
        let spec = RequestSpec::get(format!("/{project}/tree?fancy")).query(query);
        self.fetch(spec, "tree").await
    }

    /// Marks up the differences between successive HTML versions.
    pub async fn get_html_diff(&self, request: &HtmlCompareRequest) -> Result<Vec<String>> {
        let arg = serde_json::to_string(request)
            .map_err(|err| MatrixError::InvalidArgument(err.to_string()))?;
        let body = self.rest_post("/all/compareHtml", [("arg", arg)]).await?;
        let response: HtmlCompareResponse = decode(&body, "html comparison")?;
        Ok(response.html)
    }

    pub async fn get_all_files(&self, project: &str) -> Result<ProjectFileList> {
        self.fetch(RequestSpec::get(format!("/{project}/file")), "file list")
            .await
    }

    /// Attaches a file to a project. The returned key is needed to reference
    /// the file from a field.
    pub async fn upload_file(&self, project: &str, file: impl AsRef<Path>) -> Result<FileAndKey> {
        let file = file.as_ref();
        require_project(project)?;
        require_file(file).await?;
        let body = self.rest_post_file(&format!("/{project}/file"), file).await?;
        decode(&body, "uploaded file")
    }

    /// Starts a server-side conversion of a Word document into items.
    pub async fn convert_word_file(
        &self,
        project: &str,
        file: impl AsRef<Path>,
        reason: &str,
    ) -> Result<ConvertWordAck> {
        let file = file.as_ref();
        require_project(project)?;
        require_file(file).await?;
        let spec = RequestSpec::post(format!("/{project}/wordconvert"))
            .query([("reason", reason)])
            .file(file);
        self.fetch(spec, "word conversion").await
    }

    /// Imports items from an XML export. Returns the import job id.
    pub async fn import_items(
        &self,
        project: &str,
        file: impl AsRef<Path>,
        reason: &str,
    ) -> Result<i64> {
        let spec = RequestSpec::post(format!("/{project}/import"))
            .query([("reason", reason)])
            .file(file.as_ref());
        let job: JobId = self.fetch(spec, "import job").await?;
        Ok(job.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{push_fields, ItemDraft};
    use crate::{dto::FieldValueList, Params};

    #[test]
    fn fields_become_fx_params() {
        let draft = ItemDraft::new("Title", "why").field(12, "a").field(13, "b").field(12, "c");
        let mut form = Params::new();
        push_fields(&mut form, &draft.fields);
        let pairs: Vec<_> = form.iter().collect();
        assert_eq!(pairs, vec![("fx12", "c"), ("fx13", "b")]);
    }

    #[test]
    fn draft_builders() {
        let draft = ItemDraft::new("T", "r")
            .fields(FieldValueList::default())
            .author("jo")
            .labels(vec!["ok".to_owned()]);
        assert_eq!(draft.author.as_deref(), Some("jo"));
        assert_eq!(draft.labels, Some(vec!["ok".to_owned()]));
        assert!(draft.fields.field_val.is_empty());
    }
}
