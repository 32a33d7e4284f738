use serde_json::Value;
use tracing::debug;

use crate::context::Context;
use crate::error::{AuthError, TransportError};
use crate::extract::{extract_overlay, extract_str};
use crate::http::{HttpMethod, HttpTransport, OutboundRequest, TransportResponse, join_url};

use super::{AuthResult, AuthState, AuthStep};

/// Single POST login. Only status 200 counts as success.
pub async fn authenticate_single(
    base_url: &str,
    login_path: &str,
    payload: &Value,
    token_path: &str,
    transport: &dyn HttpTransport,
) -> AuthResult {
    let response = match post_json(transport, base_url, login_path, payload).await {
        Ok(response) => response,
        Err(err) => {
            return AuthResult::failed(
                AuthError::Transport {
                    stage: "login".to_owned(),
                    message: err.to_string(),
                },
                None,
            );
        }
    };

    if response.status != 200 {
        return AuthResult::failed(
            AuthError::LoginStatus {
                status: response.status,
                body: response.raw_body,
            },
            None,
        );
    }
    let Some(body) = response.body.as_ref() else {
        return AuthResult::failed(AuthError::LoginUnparseable, None);
    };
    match extract_str(body, token_path).filter(|token| !token.is_empty()) {
        Some(token) => AuthResult::succeeded(Some(token.to_owned()), None),
        None => AuthResult::failed(
            AuthError::TokenNotFound {
                path: token_path.to_owned(),
            },
            None,
        ),
    }
}

/// A sequence of login POSTs threading one context.
///
/// Each step's payload is resolved against everything extracted so far; the
/// final token is read from the last response.
pub struct MultiStepFlow<'flow> {
    steps: &'flow [AuthStep],
    token_path: &'flow str,
    base_url: &'flow str,
    transport: &'flow dyn HttpTransport,
    state: AuthState,
    context: Context,
}

impl<'flow> MultiStepFlow<'flow> {
    #[must_use]
    pub fn new(
        steps: &'flow [AuthStep],
        token_path: &'flow str,
        base_url: &'flow str,
        transport: &'flow dyn HttpTransport,
    ) -> Self {
        Self {
            steps,
            token_path,
            base_url,
            transport,
            state: AuthState::Idle,
            context: Context::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    pub async fn run(&mut self) -> AuthResult {
        let steps = self.steps;
        if steps.is_empty() {
            return self.fail(AuthError::NoSteps);
        }

        let mut last_body = Value::Null;
        for (index, step) in steps.iter().enumerate() {
            self.state = AuthState::Executing { step: index };
            let position = index.saturating_add(1);
            debug!("Auth step {}/{}: {}", position, steps.len(), step.name);

            let payload = step.payload.resolve(&self.context);
            let response =
                match post_json(self.transport, self.base_url, &step.endpoint, &payload).await {
                    Ok(response) => response,
                    Err(err) => {
                        return self.fail(AuthError::Transport {
                            stage: format!("step {} ({})", position, step.name),
                            message: err.to_string(),
                        });
                    }
                };

            if !response.is_2xx() {
                return self.fail(AuthError::StepStatus {
                    step: position,
                    name: step.name.clone(),
                    status: response.status,
                    body: response.raw_body,
                });
            }
            let Some(body) = response.body else {
                return self.fail(AuthError::StepUnparseable {
                    step: position,
                    name: step.name.clone(),
                });
            };

            let overlay = extract_overlay(&body, &step.extract, &step.name);
            self.context.overlay(overlay);
            last_body = body;
        }

        match extract_str(&last_body, self.token_path).filter(|token| !token.is_empty()) {
            Some(token) => {
                self.state = AuthState::Success;
                AuthResult::succeeded(Some(token.to_owned()), Some(self.context.clone()))
            }
            None => self.fail(AuthError::TokenNotFound {
                path: self.token_path.to_owned(),
            }),
        }
    }

    fn fail(&mut self, error: AuthError) -> AuthResult {
        self.state = AuthState::Failed;
        AuthResult::failed(error, Some(self.context.clone()))
    }
}

async fn post_json(
    transport: &dyn HttpTransport,
    base_url: &str,
    path: &str,
    payload: &Value,
) -> Result<TransportResponse, TransportError> {
    let request = OutboundRequest {
        method: HttpMethod::Post,
        url: join_url(base_url, path),
        headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
        body: Some(payload.to_string()),
    };
    transport.send(request).await
}
