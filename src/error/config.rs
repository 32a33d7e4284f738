use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("No project config found (pass --config or create loadflow.toml).")]
    NoConfigFound,
    #[error("Unsupported HTTP method '{method}'. Use GET, POST, PUT, PATCH, or DELETE.")]
    UnsupportedMethod { method: String },
    #[error("Malformed auth token: {reason}")]
    MalformedToken { reason: &'static str },
    #[error("Invalid API key location '{value}'. Use 'header' or 'query'.")]
    InvalidApiKeyLocation { value: String },
    #[error("JWT auth requires either 'login_path' or 'steps'.")]
    JwtMissingLoginOrSteps,
    #[error("JWT auth cannot define both 'login_path' and 'steps'.")]
    JwtLoginAndStepsConflict,
    #[error("Load profile must use at least one virtual user.")]
    VirtualUsersZero,
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
}
