//! Project configuration files and their validation.
mod loader;
mod parse;
mod project;
pub mod types;


pub use loader::{load_config, load_config_file};
pub use project::{LoadProfile, ProjectConfig};
pub use types::{ConfigFile, ReportConfig, ReportKind, ReportOutput, ScenarioKind};

pub use parse::parse_duration_value;
