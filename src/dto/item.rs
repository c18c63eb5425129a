use serde::{Deserialize, Serialize};

use crate::util::decode_label_field;

/// Value of one field of an item, keyed by field id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldValue {
    pub id: i64,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted: Option<i32>,
}

impl FieldValue {
    pub fn new(id: i64, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldValueList {
    pub field_val: Vec<FieldValue>,
}

impl FieldValueList {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { field_val: values }
    }

    pub fn get(&self, id: i64) -> Option<&FieldValue> {
        self.field_val.iter().find(|field| field.id == id)
    }

    /// Replaces the value of field `id`, appending it when absent.
    pub fn set(&mut self, id: i64, value: impl Into<String>) {
        let value = value.into();
        match self.field_val.iter_mut().find(|field| field.id == id) {
            Some(field) => field.value = value,
            None => self.field_val.push(FieldValue::new(id, value)),
        }
    }
}

/// Node of a folder tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub item_ref: String,
    pub title: String,
    pub item_list: Vec<Item>,
    pub field_val_list: Option<FieldValueList>,
    pub is_folder: i32,
    pub partial: i32,
}

impl Item {
    pub fn is_folder(&self) -> bool {
        self.is_folder != 0
    }

    /// Refs of this node and everything below it, depth first.
    pub fn all_items(&self, include_items: bool, include_folders: bool) -> Vec<String> {
        let mut refs = Vec::new();
        self.collect_refs(include_items, include_folders, &mut refs);
        refs
    }

    fn collect_refs(&self, include_items: bool, include_folders: bool, refs: &mut Vec<String>) {
        if !self.is_folder() {
            if include_items {
                refs.push(self.item_ref.clone());
            }
            return;
        }
        if include_folders {
            refs.push(self.item_ref.clone());
        }
        for child in &self.item_list {
            child.collect_refs(include_items, include_folders, refs);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemLink {
    pub to: String,
    pub title: String,
    pub mod_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryRoot {
    pub category_short: String,
    pub root_folder: String,
}

/// Full item as returned by `GET /{project}/item/{item}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemAndValue {
    pub item_ref: String,
    pub title: String,
    pub folder_ref: Option<String>,
    pub is_folder: i32,
    pub disabled: i32,
    pub max_version: i32,
    pub is_unselected: i32,
    pub item_id: i64,
    pub mod_date: Option<String>,
    pub mod_date_user_format: Option<String>,
    pub field_val_list: FieldValueList,
    pub available_formats: Vec<String>,
    /// Absent on 1.6 servers, where labels live in a field.
    pub labels: Option<Vec<String>>,
    pub down_link_list: Vec<ItemLink>,
    pub up_link_list: Vec<ItemLink>,
    pub select_sub_tree: Vec<CategoryRoot>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemHistoryEntry {
    pub version: i32,
    pub created_at: Option<String>,
    pub created_at_user_format: Option<String>,
    pub user: Option<String>,
    pub action: Option<String>,
    pub title: Option<String>,
    pub reason: Option<String>,
    pub audit_id: Option<i64>,
    pub field_val_list: Option<FieldValueList>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemWithHistory {
    #[serde(flatten)]
    pub item: ItemAndValue,
    pub history: Vec<ItemHistoryEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemWithChildren {
    #[serde(flatten)]
    pub item: ItemAndValue,
    #[serde(rename = "itemList")]
    pub item_list: Vec<Item>,
}

/// Acknowledgement of a created item or folder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemAndSerial {
    pub item_id: i64,
    pub serial: i64,
    pub item_ref: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemList {
    pub item_list: Vec<Item>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkItem {
    pub item_ref: String,
    pub title: String,
    pub mod_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NeedleFieldValue {
    pub id: i64,
    pub field_name: Option<String>,
    pub value: Option<String>,
}

/// One hit of a needle search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrimNeedleItem {
    /// Item or folder ref.
    pub item_or_folder_ref: String,
    pub title: String,
    pub project: Option<String>,
    pub last_mod_date: Option<String>,
    pub creation_date: Option<String>,
    pub up_link_list: Vec<LinkItem>,
    pub down_link_list: Vec<LinkItem>,
    pub field_val: Vec<NeedleFieldValue>,
    /// Raw `"(a),(b)"` label field.
    pub labels: Option<String>,
}

impl TrimNeedleItem {
    /// Decoded labels. A malformed label field yields an empty list.
    pub fn labels(&self) -> Vec<String> {
        self.labels
            .as_deref()
            .and_then(|field| decode_label_field(field).ok())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimNeedle {
    pub needles: Vec<TrimNeedleItem>,
}

/// Node of the `tree?fancy` listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FancyLeaf {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub is_unselected: Option<i32>,
    pub version: Option<String>,
    pub children: Vec<FancyLeaf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlCompareRequest {
    pub versions: Vec<String>,
    pub span_element: String,
    pub css_class_added: String,
    pub css_class_deleted: String,
    pub css_class_format_change: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlCompareResponse {
    pub html: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemAndValue, TrimNeedleItem};

    fn tree() -> Item {
        serde_json::from_str(
            r#"{
                "itemRef": "F-REQ-1", "title": "root", "isFolder": 1,
                "itemList": [
                    {"itemRef": "REQ-1", "title": "a", "isFolder": 0},
                    {"itemRef": "F-REQ-2", "title": "sub", "isFolder": 1,
                     "itemList": [{"itemRef": "REQ-2", "title": "b", "isFolder": 0}]}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn all_items_walks_depth_first() {
        let root = tree();
        assert_eq!(root.all_items(true, false), vec!["REQ-1", "REQ-2"]);
        assert_eq!(root.all_items(false, true), vec!["F-REQ-1", "F-REQ-2"]);
        assert_eq!(
            root.all_items(true, true),
            vec!["F-REQ-1", "REQ-1", "F-REQ-2", "REQ-2"]
        );
    }

    #[test]
    fn item_and_value_tolerates_unknown_and_missing_fields() {
        let item: ItemAndValue = serde_json::from_str(
            r#"{"itemRef":"REQ-7","title":"t","unknownField":42,
                "fieldValList":{"fieldVal":[{"id":3,"value":"x"}]}}"#,
        )
        .unwrap();
        assert_eq!(item.item_ref, "REQ-7");
        assert_eq!(item.field_val_list.get(3).map(|f| f.value.as_str()), Some("x"));
        assert!(item.labels.is_none());
        assert!(item.up_link_list.is_empty());
    }

    #[test]
    fn field_value_list_set_replaces_or_appends() {
        let mut item = ItemAndValue::default();
        item.field_val_list.set(1, "a");
        item.field_val_list.set(1, "b");
        item.field_val_list.set(2, "c");
        assert_eq!(item.field_val_list.field_val.len(), 2);
        assert_eq!(item.field_val_list.get(1).unwrap().value, "b");
    }

    #[test]
    fn needle_labels_are_decoded_leniently() {
        let mut needle = TrimNeedleItem {
            labels: Some("(red),(blue)".to_owned()),
            ..TrimNeedleItem::default()
        };
        assert_eq!(needle.labels(), vec!["red", "blue"]);
        needle.labels = Some("broken".to_owned());
        assert!(needle.labels().is_empty());
        needle.labels = None;
        assert!(needle.labels().is_empty());
    }
}
