//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{MockConfig, DEFAULT_DB_ROOT};
use crate::config::validation::{validate_config, ValidationError};

/// Config file read when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "http.server.conf";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MockConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: MockConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Configuration to start with.
///
/// A missing file is fine as long as the default document root exists; then
/// every setting takes its default. `Ok(None)` means there is nothing to serve.
pub fn load_startup_config(path: &Path) -> Result<Option<MockConfig>, ConfigError> {
    if path.exists() {
        return load_config(path).map(Some);
    }
    if Path::new(DEFAULT_DB_ROOT).is_dir() {
        return Ok(Some(MockConfig::default()));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [[routes]]
            path = "/users"
            id = ["id"]
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.routes.len(), 1);
    }

    #[test]
    fn test_load_reports_parse_and_validation_errors() {
        let mut broken = tempfile::NamedTempFile::new().unwrap();
        writeln!(broken, "[[routes]\npath = ").unwrap();
        assert!(matches!(load_config(broken.path()), Err(ConfigError::Parse(_))));

        let mut invalid = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            invalid,
            r#"
            [[routes]]
            path = "/a"
            [[routes]]
            path = "a"
            "#
        )
        .unwrap();
        let err = load_config(invalid.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("duplicate route GET /a"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
