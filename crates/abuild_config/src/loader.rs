//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{AbuildConfig, Settings};
use std::path::Path;

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE: &str = "abuild.toml";

/// Loads and validates the configuration of a project directory.
///
/// A missing `abuild.toml` is not an error: the defaults are returned.
pub fn load_config(project_dir: &Path) -> Result<AbuildConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AbuildConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: config_path,
                source,
            })
        }
    };
    load_config_from_str(&content)
}

/// Parses and validates an `abuild.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<AbuildConfig, ConfigError> {
    let config: AbuildConfig =
        toml::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))?;
    validate_settings(&config.settings)?;
    Ok(config)
}

/// Checks that extensions carry their leading dot and that directory names
/// are single, non-empty path segments.
fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    for ext in settings
        .cpp_source_extensions
        .iter()
        .chain(&settings.cpp_header_extensions)
    {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "extension '{ext}' must start with '.'"
            )));
        }
    }
    for dir in settings
        .ignore_directories
        .iter()
        .chain(&settings.squash_directories)
        .chain(&settings.skip_directories)
        .chain(&settings.test_directories)
    {
        if dir.is_empty() || dir.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "directory name '{dir}' must be a single path segment"
            )));
        }
    }
    Ok(())
}
