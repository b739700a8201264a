//! Wire types for the device's ISAPI-style JSON endpoints.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single check-in/out observation. Ephemeral: consumed by the reconciler,
/// never persisted raw.
#[derive(Debug, Clone)]
pub struct DeviceEvent {
    pub employee_no: String,
    pub time: DateTime<FixedOffset>,
}

/// A user record as provisioned on the device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceUser {
    pub employee_no: String,
    pub name: String,
}

// ---- access event search ----

#[derive(Serialize)]
pub struct AcsEventSearch {
    #[serde(rename = "AcsEventCond")]
    pub cond: AcsEventCond,
}

#[derive(Serialize)]
pub struct AcsEventCond {
    #[serde(rename = "searchID")]
    pub search_id: String,
    #[serde(rename = "searchResultPosition")]
    pub search_result_position: u32,
    #[serde(rename = "maxResults")]
    pub max_results: u32,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
}

#[derive(Deserialize)]
pub struct AcsEventReply {
    #[serde(rename = "AcsEvent")]
    pub acs_event: Option<AcsEventBody>,
}

#[derive(Deserialize)]
pub struct AcsEventBody {
    #[serde(rename = "InfoList", default)]
    pub info_list: Vec<AcsEventInfo>,
}

#[derive(Deserialize)]
pub struct AcsEventInfo {
    /// Absent on events not tied to a provisioned user (door forced, tamper)
    #[serde(rename = "employeeNoString")]
    pub employee_no: Option<String>,
    pub time: String,
}

// ---- user provisioning ----

#[derive(Serialize)]
pub struct UserInfoRecord {
    #[serde(rename = "UserInfo")]
    pub user_info: Vec<UserInfo>,
}

#[derive(Serialize)]
pub struct UserInfoModify {
    #[serde(rename = "UserInfo")]
    pub user_info: UserInfo,
}

#[derive(Serialize)]
pub struct UserInfo {
    #[serde(rename = "employeeNo")]
    pub employee_no: String,
    pub name: String,
    #[serde(rename = "Valid")]
    pub valid: ValidWindow,
}

#[derive(Serialize)]
pub struct ValidWindow {
    #[serde(rename = "beginTime")]
    pub begin_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
}

#[derive(Serialize)]
pub struct UserInfoDelete {
    #[serde(rename = "UserInfoDetail")]
    pub detail: UserInfoDeleteDetail,
}

#[derive(Serialize)]
pub struct UserInfoDeleteDetail {
    pub mode: String,
    #[serde(rename = "EmployeeNoList")]
    pub employee_no_list: Vec<EmployeeNoRef>,
}

#[derive(Serialize)]
pub struct FaceDelete {
    #[serde(rename = "FaceInfoDelCond")]
    pub cond: FaceDeleteCond,
}

#[derive(Serialize)]
pub struct FaceDeleteCond {
    #[serde(rename = "EmployeeNoList")]
    pub employee_no_list: Vec<EmployeeNoRef>,
}

#[derive(Serialize)]
pub struct EmployeeNoRef {
    #[serde(rename = "employeeNo")]
    pub employee_no: String,
}

#[derive(Serialize)]
pub struct UserInfoSearch {
    #[serde(rename = "UserInfoSearchCond")]
    pub cond: UserInfoSearchCond,
}

#[derive(Serialize)]
pub struct UserInfoSearchCond {
    #[serde(rename = "searchID")]
    pub search_id: String,
    #[serde(rename = "searchResultPosition")]
    pub search_result_position: u32,
    #[serde(rename = "maxResults")]
    pub max_results: u32,
}

#[derive(Deserialize)]
pub struct UserInfoSearchReply {
    #[serde(rename = "UserInfoSearch")]
    pub search: Option<UserInfoSearchBody>,
}

#[derive(Deserialize)]
pub struct UserInfoSearchBody {
    #[serde(rename = "UserInfo", default)]
    pub user_info: Vec<UserInfoRow>,
}

#[derive(Deserialize)]
pub struct UserInfoRow {
    #[serde(rename = "employeeNo")]
    pub employee_no: String,
    #[serde(default)]
    pub name: String,
}
