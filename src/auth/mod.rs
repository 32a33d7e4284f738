//! One-shot authentication performed before any virtual user starts.
mod jwt;
mod token;


use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, warn};

use crate::context::Context;
use crate::dynamic::DynamicValue;
use crate::error::{AppError, AuthError};
use crate::http::HttpTransport;

pub use jwt::{MultiStepFlow, authenticate_single};
pub use token::{ApiKeyLocation, AuthToken};

/// How a project obtains its credential.
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    ApiKey {
        key: String,
        value: String,
        location: ApiKeyLocation,
    },
    JwtSingleStep {
        login_path: String,
        payload: Value,
        token_path: String,
    },
    JwtMultiStep {
        steps: Vec<AuthStep>,
        token_path: String,
    },
}

impl AuthConfig {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::ApiKey { .. } => "api_key",
            AuthConfig::JwtSingleStep { .. } => "jwt",
            AuthConfig::JwtMultiStep { .. } => "jwt (multi-step)",
        }
    }
}

/// One POST of a multi-step login.
#[derive(Debug, Clone)]
pub struct AuthStep {
    pub name: String,
    pub endpoint: String,
    pub payload: DynamicValue<Value>,
    /// Context key to response path, applied after a successful step.
    pub extract: BTreeMap<String, String>,
}

/// Progress of a multi-step login. `step` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    Executing { step: usize },
    Success,
    Failed,
}

/// Outcome of one authentication attempt.
///
/// Multi-step attempts carry the context they accumulated, on failure too.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResult {
    pub success: bool,
    pub token: Option<String>,
    pub error: Option<AuthError>,
    pub context: Option<Context>,
}

impl AuthResult {
    #[must_use]
    pub const fn succeeded(token: Option<String>, context: Option<Context>) -> Self {
        Self {
            success: true,
            token,
            error: None,
            context,
        }
    }

    #[must_use]
    pub const fn failed(error: AuthError, context: Option<Context>) -> Self {
        Self {
            success: false,
            token: None,
            error: Some(error),
            context,
        }
    }

    /// Converts the result into the token handed to virtual users.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` when the attempt failed.
    pub fn into_token(self) -> Result<Option<String>, AppError> {
        if self.success {
            return Ok(self.token);
        }
        Err(AppError::auth(self.error.unwrap_or_else(|| {
            AuthError::Transport {
                stage: "authentication".to_owned(),
                message: "failed without a reason".to_owned(),
            }
        })))
    }
}

/// Runs the configured authentication once against `base_url`.
///
/// None, basic and API key auth never touch the network.
pub async fn authenticate(
    config: &AuthConfig,
    base_url: &str,
    transport: &dyn HttpTransport,
) -> AuthResult {
    info!("Authenticating with {} auth", config.kind());
    let result = match config {
        AuthConfig::None => AuthResult::succeeded(None, None),
        AuthConfig::Basic { username, password } => {
            AuthResult::succeeded(Some(AuthToken::basic(username, password).encode()), None)
        }
        AuthConfig::ApiKey {
            key,
            value,
            location,
        } => {
            let token = AuthToken::ApiKey {
                location: *location,
                key: key.clone(),
                value: value.clone(),
            };
            AuthResult::succeeded(Some(token.encode()), None)
        }
        AuthConfig::JwtSingleStep {
            login_path,
            payload,
            token_path,
        } => authenticate_single(base_url, login_path, payload, token_path, transport).await,
        AuthConfig::JwtMultiStep { steps, token_path } => {
            MultiStepFlow::new(steps, token_path, base_url, transport)
                .run()
                .await
        }
    };

    match &result.error {
        None => info!("Authentication succeeded"),
        Some(error) => warn!("Authentication failed: {}", error),
    }
    result
}
