use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Default project files, checked in order when no path is given.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["loadflow.toml", "loadflow.json"];

/// Loads a project file from the provided path or default locations.
///
/// # Errors
///
/// Returns an error when no file is found or the file cannot be read or
/// parsed.
pub fn load_config(path: Option<&str>) -> AppResult<ConfigFile> {
    if let Some(path) = path {
        return load_config_file(Path::new(path));
    }

    for candidate in DEFAULT_CONFIG_FILES {
        let candidate_path = PathBuf::from(candidate);
        if candidate_path.exists() {
            return load_config_file(&candidate_path);
        }
    }

    Err(AppError::config(ConfigError::NoConfigFound))
}

/// Parses one file, choosing TOML or JSON by extension.
///
/// # Errors
///
/// Returns an error when the file cannot be read, has an unsupported
/// extension, or does not match the schema.
pub fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
