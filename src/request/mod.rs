mod builder;
mod headers;
mod url_parts;

pub use builder::{build_request, RequestDescriptor};
pub use headers::{apply_header_rules, HeaderRules};
pub use url_parts::{is_absolute_url, is_origin, split_url, UrlParts};
