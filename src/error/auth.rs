use thiserror::Error;

/// Reasons an authentication attempt ends in the failed state.
///
/// Step positions are 1-based so they match what an operator reads in the
/// project config.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Login failed with status {status}: {body}")]
    LoginStatus { status: u16, body: String },
    #[error("Failed to parse login response as JSON")]
    LoginUnparseable,
    #[error("Token not found at path: {path}")]
    TokenNotFound { path: String },
    #[error("Multi-step authentication has no steps")]
    NoSteps,
    #[error("Step {step} ({name}) failed with status {status}: {body}")]
    StepStatus {
        step: usize,
        name: String,
        status: u16,
        body: String,
    },
    #[error("Step {step} ({name}) returned a response that is not valid JSON")]
    StepUnparseable { step: usize, name: String },
    #[error("No response during {stage}: {message}")]
    Transport { stage: String, message: String },
}
