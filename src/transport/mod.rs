mod reqwest_transport;

use async_trait::async_trait;

use crate::error::Result;
use crate::request::RequestDescriptor;

pub use reqwest_transport::ReqwestTransport;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a request and returns whatever the server answered. Only failures
/// where no response arrived at all (DNS, connect, timeout) are errors;
/// non-2xx statuses are ordinary responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<TransportResponse>;
}
