use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::auth::AuthToken;
use crate::context::Context;
use crate::error::{ConfigError, HttpError};
use crate::extract::extract_overlay;
use crate::metrics::{MetricsCollector, RequestMetric};

use super::builders::{RequestParts, build_request};
use super::{EndpointDescriptor, HttpTransport, OutboundRequest, TransportResponse};

/// Executes endpoint descriptors for one virtual user.
///
/// The client owns the user's context: every call may extend it and only
/// [`ExecutionClient::reset_context`] clears it.
pub struct ExecutionClient {
    base_url: String,
    token: Option<AuthToken>,
    default_headers: Vec<(String, String)>,
    context: Context,
    transport: Arc<dyn HttpTransport>,
    metrics: Arc<MetricsCollector>,
}

impl ExecutionClient {
    pub fn new<B>(
        base_url: B,
        transport: Arc<dyn HttpTransport>,
        metrics: Arc<MetricsCollector>,
    ) -> Self
    where
        B: Into<String>,
    {
        Self {
            base_url: base_url.into(),
            token: None,
            default_headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
            context: Context::new(),
            transport,
            metrics,
        }
    }

    /// Installs a token in its tagged string form.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MalformedToken` or
    /// `ConfigError::InvalidApiKeyLocation` when an `apiKey:` token cannot be
    /// parsed; the previous token is kept in that case.
    pub fn set_token(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.token = Some(raw.parse()?);
        Ok(())
    }

    pub fn set_auth_token(&mut self, token: AuthToken) {
        self.token = Some(token);
    }

    #[must_use]
    pub const fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    pub const fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn reset_context(&mut self) {
        self.context = Context::new();
    }

    /// Composes the request `execute` would send, without sending it.
    #[must_use]
    pub fn build_request(&self, endpoint: &EndpointDescriptor) -> OutboundRequest {
        build_request(
            endpoint,
            &RequestParts {
                base_url: &self.base_url,
                default_headers: &self.default_headers,
                token: self.token.as_ref(),
                context: &self.context,
            },
        )
    }

    /// Sends one call and records its metric.
    ///
    /// Every response is recorded, whatever its status. Values named by the
    /// endpoint's extract mapping are copied into the context when the body
    /// is JSON.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Transport` when no response was received; nothing
    /// is recorded then.
    pub async fn execute(
        &mut self,
        endpoint: &EndpointDescriptor,
    ) -> Result<TransportResponse, HttpError> {
        let request = self.build_request(endpoint);
        debug!("{}: {} {}", endpoint.name(), request.method, request.url);

        let started_at_ms = Utc::now().timestamp_millis();
        let started = Instant::now();
        let result = self.transport.send(request).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let response = result.map_err(|source| {
            warn!("{}: no response: {}", endpoint.name(), source);
            HttpError::Transport {
                endpoint: endpoint.name().to_owned(),
                source,
            }
        })?;

        self.metrics.record(RequestMetric::new(
            endpoint.name(),
            endpoint.method(),
            response.status,
            duration_ms,
            started_at_ms,
        ));

        if !endpoint.extract().is_empty() {
            match response.body.as_ref() {
                Some(body) => {
                    let overlay = extract_overlay(body, endpoint.extract(), endpoint.name());
                    self.context.overlay(overlay);
                }
                None => warn!(
                    "{}: response is not JSON, nothing extracted",
                    endpoint.name()
                ),
            }
        }

        Ok(response)
    }
}
