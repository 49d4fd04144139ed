mod curl_parser;
mod model;
mod render;

pub use curl_parser::parse_curl;
pub use model::{upsert_header, CurlBody, CurlDescriptor};
pub use render::to_curl_command;
