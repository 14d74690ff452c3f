//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating an `abforge.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A referenced platform name is not declared in the configuration.
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_platform() {
        let err = ConfigError::UnknownPlatform("switch".to_string());
        assert_eq!(format!("{err}"), "unknown platform 'switch'");
    }

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("build.roots".to_string());
        assert_eq!(format!("{err}"), "missing required field: build.roots");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let display = format!("{}", ConfigError::IoError(io_err));
        assert!(display.starts_with("failed to read configuration:"));
    }
}
