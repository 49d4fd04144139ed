use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

use super::model::{Attachment, ClassifiedResponse, Payload};
use crate::error::{CurlhopError, Result};

pub const CORRELATION_HEADER: &str = "kiussrequestid";
pub const EXECUTION_TIME_HEADER: &str = "request-execution-time";
pub const DEFAULT_FILENAME: &str = "downloaded-file";

static FILENAME_STAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)filename\*=UTF-8''([^;]+)").expect("valid regex"));

pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

pub fn correlation_id(headers: &[(String, String)]) -> String {
    find_header(headers, CORRELATION_HEADER)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

pub fn elapsed_seconds(headers: &[(String, String)]) -> Option<f64> {
    find_header(headers, EXECUTION_TIME_HEADER)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Decodes a response body according to its headers.
///
/// Attachments are returned as raw bytes, JSON content types must carry valid
/// JSON, and everything else is treated as text.
pub fn classify_response(headers: &[(String, String)], bytes: &[u8]) -> Result<ClassifiedResponse> {
    Ok(ClassifiedResponse {
        payload: decode_payload(headers, bytes)?,
        correlation_id: correlation_id(headers),
        elapsed_seconds: elapsed_seconds(headers),
    })
}

fn decode_payload(headers: &[(String, String)], bytes: &[u8]) -> Result<Payload> {
    let disposition = find_header(headers, "content-disposition").unwrap_or_default();
    let content_type = find_header(headers, "content-type")
        .unwrap_or_default()
        .to_ascii_lowercase();

    if disposition.to_ascii_lowercase().contains("attachment")
        || content_type.starts_with("application/octet-stream")
    {
        return Ok(Payload::Attachment(Attachment {
            filename: attachment_filename(disposition),
            bytes: bytes.to_vec(),
            saved_to: None,
        }));
    }

    if content_type.contains("application/json") {
        return serde_json::from_slice(bytes)
            .map(Payload::Json)
            .map_err(|err| CurlhopError::Server {
                message: format!("Malformed JSON payload: {err}"),
                status_text: None,
            });
    }

    Ok(Payload::Text(String::from_utf8_lossy(bytes).into_owned()))
}

pub fn attachment_filename(disposition: &str) -> String {
    FILENAME_STAR_PATTERN
        .captures(disposition)
        .and_then(|captures| captures.get(1))
        .and_then(|raw| {
            percent_decode_str(raw.as_str().trim().trim_matches('"'))
                .decode_utf8()
                .ok()
                .map(|name| name.into_owned())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}
