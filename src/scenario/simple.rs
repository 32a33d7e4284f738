use std::time::Duration;

use crate::error::HttpError;
use crate::http::{EndpointDescriptor, ExecutionClient};

use super::{DEFAULT_THINK_TIME, think};

/// Every endpoint in order, with the same pause after each call.
#[derive(Debug, Clone)]
pub struct SimpleScenario {
    pub endpoints: Vec<EndpointDescriptor>,
    pub think_time: Duration,
}

impl SimpleScenario {
    #[must_use]
    pub const fn new(endpoints: Vec<EndpointDescriptor>) -> Self {
        Self {
            endpoints,
            think_time: DEFAULT_THINK_TIME,
        }
    }

    #[must_use]
    pub const fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }
}

/// Runs one pass over the scenario. Non-2xx responses do not stop the pass.
///
/// # Errors
///
/// Returns `HttpError::Transport` when a call gets no response; the rest of
/// the pass is skipped.
pub async fn run_simple_scenario(
    client: &mut ExecutionClient,
    scenario: &SimpleScenario,
) -> Result<(), HttpError> {
    for endpoint in &scenario.endpoints {
        run_single_endpoint(client, endpoint, scenario.think_time).await?;
    }
    Ok(())
}

/// Executes one endpoint, then pauses for `think_time`.
///
/// # Errors
///
/// Returns `HttpError::Transport` when the call gets no response.
pub async fn run_single_endpoint(
    client: &mut ExecutionClient,
    endpoint: &EndpointDescriptor,
    think_time: Duration,
) -> Result<(), HttpError> {
    client.execute(endpoint).await?;
    think(think_time).await;
    Ok(())
}
