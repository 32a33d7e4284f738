use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{AppError, AppResult, HttpError, TransportError};

use super::HttpMethod;
use super::transport::{HttpTransport, OutboundRequest, TransportResponse};

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("loadflow/", env!("CARGO_PKG_VERSION"));

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a client whose calls are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut request_builder = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        for (key, value) in &headers {
            request_builder = request_builder.header(key, value);
        }
        if let Some(body) = body {
            request_builder = request_builder.body(body);
        }

        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return Err(TransportError::Timeout { url, source: err });
            }
            Err(err) => return Err(TransportError::Request { url, source: err }),
        };
        let status = response.status().as_u16();
        let raw_body = response
            .text()
            .await
            .map_err(|err| TransportError::Body {
                url: url.clone(),
                source: err,
            })?;
        debug!("{} {} -> {}", method, url, status);
        Ok(TransportResponse::new(status, raw_body))
    }
}
