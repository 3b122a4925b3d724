//! Configuration loading from files.

use std::path::Path;

use super::{Config, ConfigError};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "kbdmark.yaml";

impl Config {
    /// Load the config from the command line argument.
    ///
    /// An explicitly named file must exist. Without one, `kbdmark.yaml` in the
    /// working directory is used if present, and the defaults otherwise.
    pub async fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CwdFailure)?;

        match config_file {
            Some(path) => Self::load_from_file(&cwd.join(path)).await,
            None => {
                let path = cwd.join(DEFAULT_CONFIG_FILE);
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    Self::load_from_file(&path).await
                } else {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load and validate the config from a file path.
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;

        let config = Self::from_yaml(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse a config from YAML text. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Check settings serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.annotations
            .rule()
            .map_err(|e| ConfigError::Validation(format!("invalid annotations section: {e}")))?;

        if self.annotations.class.trim().is_empty() {
            return Err(ConfigError::Validation(
                "invalid annotations section: 'class' must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
