use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: Option<i64>,
    pub login: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub super_admin: Option<i32>,
    pub customer_admin: Option<i32>,
    pub user_status: Option<String>,
    pub group_list: Vec<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserList {
    pub user: Vec<User>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectAccessPeriod {
    pub start_date8601: Option<String>,
    pub end_date8601: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectAccess {
    pub project: Option<String>,
    pub accesses: Vec<ProjectAccessPeriod>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub signature_image: Option<String>,
    pub nb_read_write_projects_now: Option<i32>,
    /// 0 or 1.
    pub admin: Option<i32>,
    pub password_age_in_days: Option<i32>,
    pub bad_logins: Option<i32>,
    pub bad_logins_before: Option<i32>,
    pub projects: Vec<ProjectAccess>,
    pub info_updates: Vec<Value>,
}

impl UserDetails {
    /// Oldest start among the latest access period of each project, or
    /// `now` when there is none. Unparseable dates are skipped.
    pub fn oldest_read_write_access(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.projects
            .iter()
            .filter_map(|project| project.accesses.last())
            .filter_map(|access| access.start_date8601.as_deref())
            .filter_map(|start| DateTime::parse_from_rfc3339(start).ok())
            .map(|start| start.with_timezone(&Utc))
            .fold(now, |oldest, start| oldest.min(start))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserListWithDetails {
    pub user: Vec<UserDetails>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Token {
    pub purpose: Option<String>,
    pub reason: Option<String>,
    pub value: Option<String>,
    pub validity: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDetailsAdvanced {
    pub id: i64,
    pub login: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub signature_image: Option<String>,
    #[serde(rename = "customeradmin")]
    pub customer_admin: i32,
    pub password_age_in_days: i32,
    pub bad_logins: i32,
    pub bad_logins_before: i32,
    #[serde(rename = "superadmin")]
    pub super_admin: i32,
    /// `normal`, `deleted`, ...
    pub user_status: Option<String>,
    pub token_list: Vec<Token>,
}

/// JSON form of a new user, sent as the `json` query parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_is_encrypted: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub signature_image: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_password: Option<String>,
    pub admin: i32,
}

/// JSON form of a user update, sent as the `json` query parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub login: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserAck {
    pub user_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenAck {
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupMember {
    pub user_id: Option<i64>,
    pub login: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupPermission {
    pub project: String,
    pub permission: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub group_id: i64,
    pub group_name: String,
    pub membership: Vec<GroupMember>,
    /// Only filled by the detailed listing.
    pub permission: Vec<GroupPermission>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupList {
    pub group_list: Vec<Group>,
}
