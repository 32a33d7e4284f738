use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::auth::ApiKeyLocation;
use crate::error::ConfigError;
use crate::http::HttpMethod;

use super::parse::{parse_duration_value, parse_pause_value};

/// A project file as written on disk, before validation.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub name: String,
    #[serde(alias = "baseURL", alias = "baseUrl")]
    pub base_url: String,
    #[serde(default)]
    pub load: LoadConfig,
    pub auth: Option<AuthFileConfig>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadConfig {
    #[serde(alias = "vus")]
    pub virtual_users: Option<usize>,
    pub duration: Option<DurationValue>,
    pub think_time: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
    pub scenario: Option<ScenarioKind>,
}

/// Which sequencer each virtual user runs per iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    #[default]
    Simple,
    Flow,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthFileConfig {
    None,
    Basic {
        username: String,
        password: String,
    },
    #[serde(alias = "apiKey")]
    ApiKey {
        key: String,
        value: String,
        #[serde(alias = "in", default = "default_api_key_location")]
        location: ApiKeyLocation,
    },
    Jwt {
        #[serde(alias = "login_endpoint", alias = "loginEndpoint")]
        login_path: Option<String>,
        payload: Option<Value>,
        steps: Option<Vec<AuthStepConfig>>,
        #[serde(alias = "tokenPath")]
        token_path: String,
    },
}

const fn default_api_key_location() -> ApiKeyLocation {
    ApiKeyLocation::Header
}

#[derive(Debug, Deserialize)]
pub struct AuthStepConfig {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub extract: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub path_params: BTreeMap<String, Value>,
    #[serde(default)]
    pub query_params: BTreeMap<String, Value>,
    pub body: Option<Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub extract: BTreeMap<String, String>,
    /// Pause after this endpoint in flow runs.
    pub think_time: Option<DurationValue>,
    /// Flow runs stop unless the response has a value at this path.
    pub require: Option<String>,
}

/// Report destinations. Loaded and carried as data; rendering happens
/// outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub output: Vec<ReportOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportOutput {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Console,
    Json,
    Html,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// A strictly positive duration, for run lengths and timeouts.
    pub(crate) fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ConfigError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }

    /// A pause, where zero means no pause.
    pub(crate) fn to_pause(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_pause_value(text),
        }
    }
}
