use tracing::debug;

use super::url_parts::{is_absolute_url, split_url, UrlParts};
use crate::error::{CurlhopError, Result};
use crate::interpreter::{CurlBody, CurlDescriptor};

/// An executable request: the interpreted curl command pointed at its final
/// origin.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<CurlBody>,
    /// Origin and path of the URL found in the curl text, before any override.
    pub source: UrlParts,
}

impl RequestDescriptor {
    /// History label: `"<method> <pathAndQuery>"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.source.path_and_query)
    }

    /// A plain GET without body, used for auxiliary fetches such as logs.
    pub fn get(url: &str, headers: Vec<(String, String)>) -> Result<Self> {
        let source = split_url(url)?;
        Ok(Self {
            method: "GET".to_string(),
            url: source.join(),
            headers,
            body: None,
            source,
        })
    }
}

impl From<&RequestDescriptor> for CurlDescriptor {
    fn from(request: &RequestDescriptor) -> Self {
        CurlDescriptor {
            method: request.method.clone(),
            url: Some(request.url.clone()),
            headers: request.headers.clone(),
            body: request.body.clone(),
        }
    }
}

pub fn build_request(
    curl: &CurlDescriptor,
    origin_override: Option<&str>,
) -> Result<RequestDescriptor> {
    let url = curl.url.as_deref().ok_or(CurlhopError::UnparsableCurl)?;
    let source = split_url(url)?;

    let origin = origin_override
        .map(|value| value.trim().trim_end_matches('/'))
        .filter(|value| !value.is_empty())
        .unwrap_or(source.origin.as_str());

    let resolved = format!("{}{}", origin, source.path_and_query);
    if !is_absolute_url(&resolved) {
        return Err(CurlhopError::InvalidUrl(resolved));
    }

    debug!(method = %curl.method, url = %resolved, "resolved request");

    Ok(RequestDescriptor {
        method: curl.method.clone(),
        url: resolved,
        headers: curl.headers.clone(),
        body: curl.body.clone(),
        source,
    })
}
