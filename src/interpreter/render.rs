use shell_words::quote;

use super::model::{CurlBody, CurlDescriptor};

/// Renders a descriptor as a single-line curl command using POSIX quoting.
pub fn to_curl_command(descriptor: &CurlDescriptor) -> String {
    let mut parts = vec!["curl".to_string()];
    if let Some(url) = &descriptor.url {
        parts.push(quote(url).into_owned());
    }
    parts.push("-X".to_string());
    parts.push(quote(&descriptor.method).into_owned());

    for (name, value) in &descriptor.headers {
        parts.push("-H".to_string());
        parts.push(quote(&format!("{name}: {value}")).into_owned());
    }

    match &descriptor.body {
        Some(CurlBody::Json(value)) => {
            parts.push("--data-raw".to_string());
            parts.push(quote(&value.to_string()).into_owned());
        }
        Some(CurlBody::Text(text)) => {
            parts.push("--data-binary".to_string());
            parts.push(quote(text).into_owned());
        }
        None => {}
    }

    parts.join(" ")
}
