use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TrimNeedleItem;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    pub id: i64,
    pub audit_id: i64,
    pub audit_time: Option<String>,
    pub label: String,
    pub comments: Option<String>,
    pub tag_type: Option<String>,
    pub tag_creation: Option<String>,
    pub user_login: Option<String>,
    pub base_project_id: Option<i64>,
    pub base_project_name: Option<String>,
    pub base_project_tag: Option<String>,
    pub base_audit_creation: Option<String>,
    pub base_audit_id: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrimAudit {
    pub audit_id: i64,
    pub user_login: Option<String>,
    pub date_time: Option<String>,
    pub date_time_user_format: Option<String>,
    pub action: Option<String>,
    pub entity: Option<String>,
    pub reason: Option<String>,
    pub project_label: Option<String>,
    pub report_ref: Option<String>,
    pub report_title: Option<String>,
    pub report_job_id: Option<i64>,
    pub item_before: Option<TrimNeedleItem>,
    pub item_after: Option<TrimNeedleItem>,
    pub item_up: Option<TrimNeedleItem>,
    pub item_down: Option<TrimNeedleItem>,
    /// Only with `tech=yes`.
    pub tech_audit: Vec<BTreeMap<String, Value>>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrimAuditList {
    pub start_at: i64,
    pub max_results: i64,
    pub total_results: i64,
    pub audit: Vec<TrimAudit>,
}
