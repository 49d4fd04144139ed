use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CurlhopError, Result};

pub const LOG_PATH_PREFIX: &str = "/api/v1/admin/log/request/";

const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// One server-side log line belonging to a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "Id", default)]
    pub id: Option<Value>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
    #[serde(rename = "Exception", default)]
    pub exception: Option<String>,
    #[serde(rename = "Level", default)]
    pub level: Option<String>,
    #[serde(rename = "TimeStamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
    #[serde(rename = "DrillingProgramId", default)]
    pub drilling_program_id: Option<Value>,
    #[serde(rename = "UserName", default)]
    pub user_name: Option<String>,
    #[serde(rename = "ApplicationName", default)]
    pub application_name: Option<String>,
    #[serde(rename = "ApplicationVersion", default)]
    pub application_version: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

pub fn log_url(origin: &str, correlation_id: &str) -> String {
    format!(
        "{}{}{}",
        origin.trim().trim_end_matches('/'),
        LOG_PATH_PREFIX,
        utf8_percent_encode(correlation_id.trim(), SEGMENT)
    )
}

pub fn decode_logs(body: &[u8]) -> Result<Vec<LogRecord>> {
    serde_json::from_slice(body)
        .map_err(|err| CurlhopError::LogFetch(format!("unexpected log payload: {err}")))
}
