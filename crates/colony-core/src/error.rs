//! Error Types
//!
//! Only configuration, setup and output can fail. Anything that goes wrong
//! inside a tick ends the affected task or mission instead.

use thiserror::Error;

/// Errors that can occur while loading or saving the tuning file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Error serializing config to TOML
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value is outside its allowed range
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised while building a colony or writing simulation output.
#[derive(Debug, Error)]
pub enum ColonyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown settlement: {0}")]
    UnknownSettlement(String),
    #[error("unknown vehicle: {0}")]
    UnknownVehicle(String),
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
