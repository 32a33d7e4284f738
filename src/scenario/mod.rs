//! Sequencers that drive one virtual user through a list of endpoints.
mod flow;
mod simple;

#[cfg(test)]
mod tests;

use std::time::Duration;

pub use flow::{
    Condition, FlowOutcome, FlowScenario, FlowStep, crud_flow, login_flow, run_flow_scenario,
};
pub use simple::{SimpleScenario, run_simple_scenario, run_single_endpoint};

/// Pause after each call unless configured otherwise.
pub const DEFAULT_THINK_TIME: Duration = Duration::from_secs(1);

async fn think(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
