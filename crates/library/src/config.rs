use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors loading a library configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Construction parameters for a keyword library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory screenshots are written under. Should be the host's output
    /// directory so embedded images resolve in its report.
    pub output_dir: PathBuf,
    /// Default timeout in seconds, used when a keyword's TimeOut is unset.
    pub timeout: i64,
    /// Capture the screen whenever a wait keyword fails.
    pub capture_screen_on_error: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            timeout: 60,
            capture_screen_on_error: false,
        }
    }
}

impl LibraryConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout < 0 {
            return Err(ConfigError::Invalid(format!(
                "timeout must be zero or more seconds, got {}",
                self.timeout
            )));
        }
        Ok(())
    }
}
