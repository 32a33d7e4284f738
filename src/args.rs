//! Command-line arguments of the `loadflow` binary.
use std::num::NonZeroUsize;
use std::time::Duration;

use clap::Parser;

use loadflow::config::{LoadProfile, ScenarioKind, parse_duration_value};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Load-testing orchestration in Rust - declarative endpoints, chained request context, multi-step auth flows, and per-endpoint latency statistics."
)]
pub struct CliArgs {
    /// Project config (.toml or .json). Defaults to loadflow.toml, then loadflow.json
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Number of virtual users (overrides the config)
    #[arg(long = "vus", short = 'u')]
    pub vus: Option<NonZeroUsize>,

    /// Test duration, supports ms/s/m/h (overrides the config)
    #[arg(long, short = 'd', value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Scenario each virtual user repeats (overrides the config)
    #[arg(long, value_enum)]
    pub scenario: Option<ScenarioKind>,

    /// Enable verbose logging (sets log level to debug unless overridden by LOADFLOW_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl CliArgs {
    /// Applies command-line overrides on top of the configured profile.
    pub fn apply_overrides(&self, load: &mut LoadProfile) {
        if let Some(vus) = self.vus {
            load.virtual_users = vus.get();
        }
        if let Some(duration) = self.duration {
            load.duration = duration;
        }
        if let Some(scenario) = self.scenario {
            load.scenario = scenario;
        }
    }
}

fn parse_duration_arg(value: &str) -> Result<Duration, String> {
    parse_duration_value(value).map_err(|err| err.to_string())
}
