use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum CurlBody {
    Json(Value),
    Text(String),
}

impl CurlBody {
    pub fn to_text(&self) -> String {
        match self {
            CurlBody::Json(value) => value.to_string(),
            CurlBody::Text(text) => text.clone(),
        }
    }
}

/// Result of interpreting a pasted curl command.
///
/// `url` is `None` when no absolute URL could be found; the other fields are
/// still filled in as far as the text allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct CurlDescriptor {
    pub method: String,
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<CurlBody>,
}

impl CurlDescriptor {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Inserts or replaces a header, matching names case-insensitively. A
/// replaced header keeps its original position.
pub fn upsert_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
    {
        Some(slot) => *slot = (name, value),
        None => headers.push((name, value)),
    }
}
