use serde::{Deserialize, Serialize};

use super::Item;

/// Field definition of a category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    pub id: i64,
    pub label: String,
    pub field_type: String,
    pub field_param: Option<String>,
    pub order: Option<i32>,
}

impl Field {
    /// Same type and label, ignoring id and parameters.
    pub fn is_same_as(&self, other: &Field) -> bool {
        self.field_type == other.field_type && self.label == other.label
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: i64,
    pub label: String,
    pub short_label: String,
    pub max_items: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldList {
    pub field: Vec<Field>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryExtended {
    pub category: Category,
    pub field_list: FieldList,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryList {
    pub category_extended: Vec<CategoryExtended>,
}

/// Response of `GET /{project}/cat`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllCategories {
    pub category_list: CategoryList,
}

impl AllCategories {
    pub fn find(&self, short_label: &str) -> Option<&CategoryExtended> {
        self.category_list
            .category_extended
            .iter()
            .find(|extended| extended.category.short_label == short_label)
    }
}

/// Response of `GET /{project}/cat/{category}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryAndItems {
    pub category_id: Option<i64>,
    pub field_list: Vec<Field>,
    pub folder: Option<Item>,
}

impl CategoryAndItems {
    pub fn field_by_label(&self, label: &str) -> Option<&Field> {
        self.field_list.iter().find(|field| field.label == label)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryAdd {
    pub category_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldId {
    pub field_id: i64,
}
