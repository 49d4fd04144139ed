use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::model::{upsert_header, CurlBody, CurlDescriptor};
use crate::error::{CurlhopError, Result};

static CONTINUATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\\r?\n").expect("valid regex"));

static FLAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:^|\s)",
        r"(?:(?P<short>-X|-H|-d)\s*",
        r"|(?P<long>--request|--header|--data-raw|--data-binary|--data-ascii|--data)(?:\s+|=))",
        r#"(?P<value>\$'(?:[^'\\]|\\.)*'|'(?:[^']|'\\'')*'|"(?:[^"\\]|\\.)*"|[^\s'"]+)"#,
    ))
    .expect("valid regex")
});

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[A-Za-z][A-Za-z0-9+.\-]*://[^\s'"]+"#).expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
enum FlagKind {
    Method,
    Header,
    Data,
    Binary,
}

impl FlagKind {
    fn from_flag(flag: &str) -> Self {
        match flag {
            "-X" | "--request" => FlagKind::Method,
            "-H" | "--header" => FlagKind::Header,
            "--data-binary" => FlagKind::Binary,
            _ => FlagKind::Data,
        }
    }
}

struct FlagValue {
    kind: FlagKind,
    value: String,
    span: Range<usize>,
}

/// Interprets curl command text as pasted from a terminal or a browser's
/// "copy as cURL" action.
pub fn parse_curl(text: &str) -> Result<CurlDescriptor> {
    let folded = CONTINUATION_PATTERN.replace_all(text.trim(), "\n");
    let flags = scan_flags(&folded);

    let url = find_url(&folded, &flags);

    let mut headers = Vec::new();
    for flag in flags.iter().filter(|flag| flag.kind == FlagKind::Header) {
        if let Some((name, value)) = parse_header(&flag.value) {
            upsert_header(&mut headers, name, value);
        }
    }

    let explicit_method = flags
        .iter()
        .filter(|flag| flag.kind == FlagKind::Method)
        .map(|flag| flag.value.trim().to_ascii_uppercase())
        .filter(|method| !method.is_empty())
        .last();

    let body = match flags
        .iter()
        .filter(|flag| matches!(flag.kind, FlagKind::Data | FlagKind::Binary))
        .last()
    {
        Some(flag) => Some(decode_body(flag, &headers)?),
        None => None,
    };

    let method = explicit_method.unwrap_or_else(|| {
        if body.is_some() {
            "POST".to_string()
        } else {
            "GET".to_string()
        }
    });

    debug!(
        %method,
        url = url.as_deref().unwrap_or("<none>"),
        headers = headers.len(),
        has_body = body.is_some(),
        "interpreted curl command"
    );

    Ok(CurlDescriptor {
        method,
        url,
        headers,
        body,
    })
}

fn scan_flags(text: &str) -> Vec<FlagValue> {
    FLAG_PATTERN
        .captures_iter(text)
        .filter_map(|captures| {
            let flag = captures.name("short").or_else(|| captures.name("long"))?;
            let value = captures.name("value")?;
            Some(FlagValue {
                kind: FlagKind::from_flag(flag.as_str()),
                value: unquote(value.as_str()),
                span: value.range(),
            })
        })
        .collect()
}

fn find_url(text: &str, flags: &[FlagValue]) -> Option<String> {
    URL_PATTERN
        .find_iter(text)
        .find(|candidate| {
            !flags
                .iter()
                .any(|flag| flag.span.contains(&candidate.start()))
        })
        .map(|candidate| candidate.as_str().to_string())
}

fn parse_header(value: &str) -> Option<(String, String)> {
    let (name, val) = value.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), val.trim().to_string()))
}

fn decode_body(flag: &FlagValue, headers: &[(String, String)]) -> Result<CurlBody> {
    if flag.kind == FlagKind::Binary {
        return Ok(CurlBody::Text(flag.value.clone()));
    }

    let content_type = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.to_ascii_lowercase());

    match content_type {
        Some(kind) if !kind.contains("json") => Ok(CurlBody::Text(flag.value.clone())),
        _ => serde_json::from_str(&flag.value)
            .map(CurlBody::Json)
            .map_err(|err| CurlhopError::MalformedBody(err.to_string())),
    }
}

fn unquote(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix("$'").and_then(|s| s.strip_suffix('\'')) {
        return unescape_ansi_c(inner);
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].replace("'\\''", "'");
    }
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return unescape_double_quoted(&raw[1..raw.len() - 1]);
    }
    raw.to_string()
}

fn unescape_double_quoted(inner: &str) -> String {
    let mut output = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some(&next @ ('"' | '\\' | '$' | '`')) => {
                    output.push(next);
                    chars.next();
                    continue;
                }
                _ => {}
            }
        }
        output.push(ch);
    }
    output
}

fn unescape_ansi_c(inner: &str) -> String {
    let mut output = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some('r') => output.push('\r'),
            Some('u') => {
                let code: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&code, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => output.push(decoded),
                    None => {
                        output.push_str("\\u");
                        output.push_str(&code);
                    }
                }
            }
            Some(other @ ('\\' | '\'' | '"')) => output.push(other),
            Some(other) => {
                output.push('\\');
                output.push(other);
            }
            None => output.push('\\'),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn header_value_keeps_colons_after_the_first() {
        let parsed =
            parse_curl("curl 'https://api.example.com/x' -H 'Authorization: Bearer a:b'").unwrap();
        assert_eq!(
            parsed.headers,
            vec![("Authorization".to_string(), "Bearer a:b".to_string())]
        );
    }

    #[test]
    fn data_raw_defaults_method_to_post() {
        let parsed = parse_curl(r#"curl 'https://api.example.com/x' --data-raw '{"a":1}'"#).unwrap();
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.body, Some(CurlBody::Json(json!({"a": 1}))));
    }

    #[test]
    fn no_method_and_no_body_is_get() {
        let parsed = parse_curl("curl https://api.example.com/items?page=2").unwrap();
        assert_eq!(parsed.method, "GET");
        assert_eq!(
            parsed.url.as_deref(),
            Some("https://api.example.com/items?page=2")
        );
        assert!(parsed.body.is_none());
    }

    #[test]
    fn multi_line_body_parses_as_one_value() {
        let text = "curl 'https://api.example.com/x' \\\n  -H 'Content-Type: application/json' \\\n  --data-raw '{\n\"a\":1,\n\"b\": [1, 2]\n}' \\\n  --compressed";
        let parsed = parse_curl(text).unwrap();
        assert_eq!(parsed.body, Some(CurlBody::Json(json!({"a": 1, "b": [1, 2]}))));
        assert_eq!(parsed.headers.len(), 1);
    }

    #[test]
    fn explicit_method_wins_over_body_default() {
        let parsed =
            parse_curl(r#"curl -X 'GET' 'https://api.example.com/x' -d '{"q":true}'"#).unwrap();
        assert_eq!(parsed.method, "GET");
        assert!(parsed.body.is_some());

        let lower = parse_curl("curl --request=delete https://api.example.com/x/1").unwrap();
        assert_eq!(lower.method, "DELETE");
    }

    #[test]
    fn malformed_json_body_is_reported() {
        let err = parse_curl("curl https://api.example.com/x --data-raw '{\"a\":'").unwrap_err();
        assert!(matches!(err, CurlhopError::MalformedBody(_)));
    }

    #[test]
    fn non_json_content_type_keeps_text_body() {
        let parsed = parse_curl(
            "curl https://api.example.com/login -H 'Content-Type: application/x-www-form-urlencoded' -d 'user=a&pass=b'",
        )
        .unwrap();
        assert_eq!(parsed.body, Some(CurlBody::Text("user=a&pass=b".to_string())));
    }

    #[test]
    fn data_binary_is_never_json_parsed() {
        let parsed =
            parse_curl("curl https://api.example.com/upload --data-binary '{not json'").unwrap();
        assert_eq!(parsed.body, Some(CurlBody::Text("{not json".to_string())));
        assert_eq!(parsed.method, "POST");
    }

    #[test]
    fn missing_url_still_fills_other_fields() {
        let parsed = parse_curl("curl -X PUT -H 'Accept: application/json' -d '[1]'").unwrap();
        assert!(parsed.url.is_none());
        assert_eq!(parsed.method, "PUT");
        assert_eq!(parsed.header("accept"), Some("application/json"));
        assert_eq!(parsed.body, Some(CurlBody::Json(json!([1]))));
    }

    #[test]
    fn header_without_colon_is_skipped() {
        let parsed =
            parse_curl("curl https://api.example.com -H 'broken header' -H 'X-Ok: 1'").unwrap();
        assert_eq!(parsed.headers, vec![("X-Ok".to_string(), "1".to_string())]);
    }

    #[test]
    fn repeated_header_last_write_wins() {
        let parsed =
            parse_curl("curl https://api.example.com -H 'Accept: text/html' -H 'accept: */*'")
                .unwrap();
        assert_eq!(parsed.headers, vec![("accept".to_string(), "*/*".to_string())]);
    }

    #[test]
    fn url_inside_header_value_is_not_taken() {
        let parsed = parse_curl(
            "curl -H 'Referer: https://portal.example.com/page' 'https://api.example.com/api/v1/items'",
        )
        .unwrap();
        assert_eq!(
            parsed.url.as_deref(),
            Some("https://api.example.com/api/v1/items")
        );
    }

    #[test]
    fn escaped_single_quotes_survive() {
        let parsed =
            parse_curl(r#"curl https://api.example.com -d '{"name":"O'\''Brien"}'"#).unwrap();
        assert_eq!(
            parsed.body,
            Some(CurlBody::Json(json!({"name": "O'Brien"})))
        );
    }

    #[test]
    fn ansi_c_and_double_quoted_values_are_unescaped() {
        let parsed = parse_curl(
            r#"curl "https://api.example.com/x" -H "X-Quote: say \"hi\"" --data-raw $'{"text":"line\\none"}'"#,
        )
        .unwrap();
        assert_eq!(parsed.header("x-quote"), Some(r#"say "hi""#));
        assert_eq!(
            parsed.body,
            Some(CurlBody::Json(json!({"text": "line\none"})))
        );
    }

    #[test]
    fn unknown_data_flags_are_ignored() {
        let parsed =
            parse_curl("curl https://api.example.com/x --data-urlencode 'q=1' --compressed")
                .unwrap();
        assert!(parsed.body.is_none());
        assert_eq!(parsed.method, "GET");
    }
}
