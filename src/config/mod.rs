//! Configuration loading and types for kbdmark.
//!
//! - Type definitions for config structures (`types`)
//! - Loading configs from files (`load`)

mod load;
mod types;

pub use load::DEFAULT_CONFIG_FILE;
pub use types::{Config, MarkdownConfig};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("failed to read config file {0}: {1}")]
    Read(std::path::PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(std::path::PathBuf, serde_yaml::Error),

    #[error("{0}")]
    Validation(String),
}
