use std::time::Duration;

use serde_json::Value;

use crate::auth::{AuthConfig, AuthStep};
use crate::dynamic::DynamicValue;
use crate::error::ConfigError;
use crate::extract::extract;
use crate::http::EndpointDescriptor;
use crate::scenario::{DEFAULT_THINK_TIME, FlowScenario, FlowStep, SimpleScenario};

use super::types::{
    AuthFileConfig, AuthStepConfig, ConfigFile, DurationValue, EndpointConfig, LoadConfig,
    ReportConfig, ScenarioKind,
};

const DEFAULT_VIRTUAL_USERS: usize = 1;
const DEFAULT_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How hard and how long to push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProfile {
    pub virtual_users: usize,
    pub duration: Duration,
    pub think_time: Duration,
    pub timeout: Duration,
    pub scenario: ScenarioKind,
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            virtual_users: DEFAULT_VIRTUAL_USERS,
            duration: DEFAULT_DURATION,
            think_time: DEFAULT_THINK_TIME,
            timeout: DEFAULT_TIMEOUT,
            scenario: ScenarioKind::Simple,
        }
    }
}

/// A validated project, ready to run.
///
/// Each endpoint is kept as a flow step so the same list serves both
/// scenario kinds.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub name: String,
    pub base_url: String,
    pub load: LoadProfile,
    pub auth: AuthConfig,
    pub report: ReportConfig,
    pub steps: Vec<FlowStep>,
}

impl ProjectConfig {
    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.steps.iter().map(|step| &step.endpoint)
    }

    #[must_use]
    pub fn simple_scenario(&self) -> SimpleScenario {
        SimpleScenario::new(self.endpoints().cloned().collect())
            .with_think_time(self.load.think_time)
    }

    #[must_use]
    pub fn flow_scenario(&self) -> FlowScenario {
        FlowScenario::new(self.steps.clone()).with_default_think_time(self.load.think_time)
    }
}

impl TryFrom<ConfigFile> for ProjectConfig {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let load = load_profile(&file.load)?;
        let auth = file.auth.map(auth_config).transpose()?.unwrap_or_default();
        let steps = file
            .endpoints
            .into_iter()
            .map(flow_step)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: file.name,
            base_url: file.base_url,
            load,
            auth,
            report: file.report,
            steps,
        })
    }
}

fn load_profile(config: &LoadConfig) -> Result<LoadProfile, ConfigError> {
    let defaults = LoadProfile::default();
    let virtual_users = config.virtual_users.unwrap_or(defaults.virtual_users);
    if virtual_users == 0 {
        return Err(ConfigError::VirtualUsersZero);
    }
    Ok(LoadProfile {
        virtual_users,
        duration: config
            .duration
            .as_ref()
            .map(DurationValue::to_duration)
            .transpose()?
            .unwrap_or(defaults.duration),
        think_time: config
            .think_time
            .as_ref()
            .map(DurationValue::to_pause)
            .transpose()?
            .unwrap_or(defaults.think_time),
        timeout: config
            .timeout
            .as_ref()
            .map(DurationValue::to_duration)
            .transpose()?
            .unwrap_or(defaults.timeout),
        scenario: config.scenario.unwrap_or(defaults.scenario),
    })
}

fn auth_config(config: AuthFileConfig) -> Result<AuthConfig, ConfigError> {
    match config {
        AuthFileConfig::None => Ok(AuthConfig::None),
        AuthFileConfig::Basic { username, password } => {
            Ok(AuthConfig::Basic { username, password })
        }
        AuthFileConfig::ApiKey {
            key,
            value,
            location,
        } => Ok(AuthConfig::ApiKey {
            key,
            value,
            location,
        }),
        AuthFileConfig::Jwt {
            login_path,
            payload,
            steps,
            token_path,
        } => match (login_path, steps) {
            (Some(_), Some(_)) => Err(ConfigError::JwtLoginAndStepsConflict),
            (None, None) => Err(ConfigError::JwtMissingLoginOrSteps),
            (Some(login_path), None) => Ok(AuthConfig::JwtSingleStep {
                login_path,
                payload: payload.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
                token_path,
            }),
            (None, Some(steps)) => Ok(AuthConfig::JwtMultiStep {
                steps: steps.into_iter().map(auth_step).collect(),
                token_path,
            }),
        },
    }
}

fn auth_step(config: AuthStepConfig) -> AuthStep {
    AuthStep {
        name: config.name,
        endpoint: config.endpoint,
        payload: DynamicValue::json_template(config.payload),
        extract: config.extract,
    }
}

fn flow_step(config: EndpointConfig) -> Result<FlowStep, ConfigError> {
    let mut builder = EndpointDescriptor::builder(
        config.name,
        config.method,
        DynamicValue::template(&config.url),
    );
    for (key, value) in config.path_params {
        builder = builder.path_param(key, DynamicValue::json_template(value));
    }
    for (key, value) in config.query_params {
        builder = builder.query_param(key, DynamicValue::json_template(value));
    }
    if let Some(body) = config.body {
        builder = builder.body(DynamicValue::json_template(body));
    }
    for (key, value) in config.headers {
        builder = builder.header(key, value);
    }
    for (key, path) in config.extract {
        builder = builder.extract(key, path);
    }

    let mut step = FlowStep::new(builder.build());
    if let Some(think_time) = config.think_time {
        step = step.with_think_time(think_time.to_pause()?);
    }
    if let Some(path) = config.require {
        step = step.with_condition(move |body: &Value| extract(body, &path).is_some());
    }
    Ok(step)
}
