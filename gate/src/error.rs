//! Error types for the request gate.

use thiserror::Error;

/// Errors raised while loading or validating the gate configuration.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid {name} value: {value}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, GateError>;
