use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Method};
use tracing::debug;

use super::{Transport, TransportResponse};
use crate::error::{CurlhopError, Result};
use crate::interpreter::CurlBody;
use crate::request::RequestDescriptor;

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("building HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<TransportResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| CurlhopError::Transport(format!("invalid HTTP method {}", request.method)))?;
        let mut request_builder = self.client.request(method, &request.url);

        let mut headers = request.headers.clone();
        match &request.body {
            Some(CurlBody::Json(value)) => {
                ensure_json_header(&mut headers);
                request_builder = request_builder.body(value.to_string());
            }
            Some(CurlBody::Text(text)) => {
                request_builder = request_builder.body(text.clone());
            }
            None => {}
        }
        for (name, value) in &headers {
            request_builder = request_builder.header(name, value);
        }

        debug!(method = %request.method, url = %request.url, "dispatching request");
        let response = request_builder
            .send()
            .await
            .map_err(|err| CurlhopError::Transport(err.to_string()))?;

        let status = response.status();
        let headers = collect_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|err| CurlhopError::Transport(err.to_string()))?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
        })
    }
}

fn ensure_json_header(headers: &mut Vec<(String, String)>) {
    if !headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
    {
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
    }
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}
