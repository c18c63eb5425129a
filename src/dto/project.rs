use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Setting;

/// Version reported for servers that predate the `serverVersion` field.
pub const LEGACY_SERVER_VERSION: &str = "1.6.999.999";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectType {
    pub id: i64,
    pub label: String,
    pub short_label: String,
    pub access_type: Option<String>,
}

/// Response of `GET /` (project list, optionally with settings).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectsAndSettings {
    pub project: Vec<ProjectType>,
    pub settings: Vec<Setting>,
    pub customer_settings: Vec<Setting>,
    pub current_user: Option<String>,
    pub server_version: Option<String>,
    pub base_url: Option<String>,
    pub rest_url: Option<String>,
}

impl ProjectsAndSettings {
    pub fn short_labels(&self) -> Vec<String> {
        self.project
            .iter()
            .map(|project| project.short_label.clone())
            .collect()
    }

    pub(crate) fn with_default_version(mut self) -> Self {
        if self.server_version.is_none() {
            self.server_version = Some(LEGACY_SERVER_VERSION.to_owned());
        }
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPermission {
    pub id: i64,
    pub login: String,
    pub email: Option<String>,
    /// 0 none, 1 read, 2 read-write, 3 admin.
    pub permission: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupProjectPermission {
    pub group_id: i64,
    pub group_name: String,
    pub permission: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDetails {
    pub user_permission: Vec<UserPermission>,
    pub group_permission: Vec<GroupProjectPermission>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Free-form server status (`/all/status`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerStatus {
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Free-form license status (`/all/license`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LicenseStatus {
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Date as formatted for the current user and for the customer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateAck {
    pub date_iso8601: Option<String>,
    pub time_user_format: Option<String>,
    pub date_user_format: Option<String>,
    pub time_customer_format: Option<String>,
    pub date_customer_format: Option<String>,
    #[serde(rename = "dateformat")]
    pub date_format: Option<String>,
    #[serde(rename = "timeformat")]
    pub time_format: Option<String>,
    pub time_zone: Option<String>,
    pub time_zone_desc: Option<String>,
    #[serde(rename = "customerDateformat")]
    pub customer_date_format: Option<String>,
    #[serde(rename = "customerTimeformat")]
    pub customer_time_format: Option<String>,
    pub customer_timezone: Option<String>,
    pub customer_timezone_desc: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectFile {
    pub file_id: i64,
    pub local_name: Option<String>,
    pub full_path: Option<String>,
    pub mime_type: Option<String>,
    pub key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectFileList {
    pub project_file: Vec<ProjectFile>,
}

/// Acknowledgement of an uploaded file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileAndKey {
    pub file_id: i64,
    pub key: String,
    pub file_full_path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertWordAck {
    pub job_id: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
