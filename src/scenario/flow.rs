use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::error::HttpError;
use crate::http::{EndpointDescriptor, ExecutionClient};

use super::{DEFAULT_THINK_TIME, think};

const LOGIN_THINK_TIME: Duration = Duration::from_millis(500);
const PROTECTED_THINK_TIME: Duration = Duration::from_secs(1);
const CRUD_THINK_TIME: Duration = Duration::from_millis(500);

/// Decides from a response body whether the flow goes on.
pub type Condition = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct FlowStep {
    pub endpoint: EndpointDescriptor,
    /// Falls back to the scenario default when unset.
    pub think_time: Option<Duration>,
    pub condition: Option<Condition>,
}

impl FlowStep {
    #[must_use]
    pub const fn new(endpoint: EndpointDescriptor) -> Self {
        Self {
            endpoint,
            think_time: None,
            condition: None,
        }
    }

    #[must_use]
    pub const fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = Some(think_time);
        self
    }

    #[must_use]
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }
}

impl fmt::Debug for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowStep")
            .field("endpoint", &self.endpoint.name())
            .field("think_time", &self.think_time)
            .field("condition", &self.condition.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A user journey: ordered steps sharing the client's context.
#[derive(Debug, Clone)]
pub struct FlowScenario {
    pub steps: Vec<FlowStep>,
    pub default_think_time: Duration,
}

impl FlowScenario {
    #[must_use]
    pub const fn new(steps: Vec<FlowStep>) -> Self {
        Self {
            steps,
            default_think_time: DEFAULT_THINK_TIME,
        }
    }

    #[must_use]
    pub const fn with_default_think_time(mut self, think_time: Duration) -> Self {
        self.default_think_time = think_time;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed,
    /// A condition rejected the response of the named step.
    Stopped { step: String },
}

/// Runs the steps in order. A step whose condition rejects its response
/// ends the flow without its think time.
///
/// # Errors
///
/// Returns `HttpError::Transport` when a call gets no response.
pub async fn run_flow_scenario(
    client: &mut ExecutionClient,
    scenario: &FlowScenario,
) -> Result<FlowOutcome, HttpError> {
    for step in &scenario.steps {
        let response = client.execute(&step.endpoint).await?;

        if let Some(condition) = &step.condition
            && !condition(&response.body_or_raw())
        {
            info!("Flow stopped: condition failed at {}", step.endpoint.name());
            return Ok(FlowOutcome::Stopped {
                step: step.endpoint.name().to_owned(),
            });
        }

        think(step.think_time.unwrap_or(scenario.default_think_time)).await;
    }
    Ok(FlowOutcome::Completed)
}

/// Login, then each protected endpoint. The flow stops when
/// `token_extractor` finds no token in the login response.
#[must_use]
pub fn login_flow<F>(
    login: EndpointDescriptor,
    protected: Vec<EndpointDescriptor>,
    token_extractor: F,
) -> FlowScenario
where
    F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
{
    let mut steps = Vec::with_capacity(protected.len().saturating_add(1));
    steps.push(
        FlowStep::new(login)
            .with_think_time(LOGIN_THINK_TIME)
            .with_condition(move |body| token_extractor(body).is_some()),
    );
    steps.extend(
        protected
            .into_iter()
            .map(|endpoint| FlowStep::new(endpoint).with_think_time(PROTECTED_THINK_TIME)),
    );
    FlowScenario::new(steps).with_default_think_time(PROTECTED_THINK_TIME)
}

/// Create, read, update and delete in that order.
#[must_use]
pub fn crud_flow(
    create: EndpointDescriptor,
    read: EndpointDescriptor,
    update: EndpointDescriptor,
    delete: EndpointDescriptor,
) -> FlowScenario {
    let steps = [create, read, update, delete]
        .into_iter()
        .map(|endpoint| FlowStep::new(endpoint).with_think_time(CRUD_THINK_TIME))
        .collect();
    FlowScenario::new(steps).with_default_think_time(CRUD_THINK_TIME)
}
