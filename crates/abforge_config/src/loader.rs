//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "abforge.toml";

/// Loads and validates an `abforge.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates an `abforge.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.build.roots.is_empty() {
        return Err(ConfigError::MissingField("build.roots".to_string()));
    }
    if config.build.root_extensions.iter().any(|e| e.starts_with('.')) {
        return Err(ConfigError::ValidationError(
            "build.root_extensions must not start with '.'".to_string(),
        ));
    }
    if config
        .output
        .dependency_file
        .contains(|c: char| c == '/' || c == '\\')
    {
        return Err(ConfigError::ValidationError(
            "output.dependency_file must be a plain file name".to_string(),
        ));
    }
    if let Some(platform) = &config.build.default_platform {
        if !config.platforms.is_empty() && !config.platforms.contains_key(platform) {
            return Err(ConfigError::UnknownPlatform(platform.clone()));
        }
    }
    Ok(())
}
