use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CurlhopError {
    #[error("Unable to parse the curl command and determine the request URL")]
    UnparsableCurl,

    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("Cannot determine server address from {0:?}")]
    InvalidUrl(String),

    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Server {
        message: String,
        status_text: Option<String>,
    },

    #[error("Fetching request logs failed: {0}")]
    LogFetch(String),

    #[error("A request is already in flight")]
    Busy,

    #[error("Result discarded: a newer request superseded it")]
    Stale,
}

pub type Result<T> = std::result::Result<T, CurlhopError>;
