use url::Url;

use crate::error::{CurlhopError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub origin: String,
    pub path_and_query: String,
}

impl UrlParts {
    pub fn join(&self) -> String {
        format!("{}{}", self.origin, self.path_and_query)
    }
}

/// Splits an absolute URL into `scheme://host[:port]` and everything after
/// the authority. The remainder is taken verbatim from the input so that
/// path encoding, query order and fragments survive untouched.
pub fn split_url(url: &str) -> Result<UrlParts> {
    let trimmed = url.trim();
    let invalid = || CurlhopError::InvalidUrl(trimmed.to_string());

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    let host = parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(invalid)?;

    let authority_start = trimmed.find("://").ok_or_else(invalid)? + 3;
    let after_scheme = &trimmed[authority_start..];
    let rest_start = after_scheme
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(after_scheme.len());

    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };

    Ok(UrlParts {
        origin,
        path_and_query: after_scheme[rest_start..].to_string(),
    })
}

/// Returns true when `value` is an absolute URL with a host.
pub fn is_absolute_url(value: &str) -> bool {
    Url::parse(value)
        .map(|parsed| parsed.has_host() && value.contains("://"))
        .unwrap_or(false)
}

/// Returns true for a bare `scheme://host[:port]`, optionally with a
/// trailing `/`. Anything carrying a path, query or fragment is rejected.
pub fn is_origin(value: &str) -> bool {
    is_absolute_url(value)
        && Url::parse(value)
            .map(|url| {
                matches!(url.path(), "" | "/") && url.query().is_none() && url.fragment().is_none()
            })
            .unwrap_or(false)
}
