//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$GEOGIG_PORCELAIN_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/geogig-porcelain/config.toml`
//! 3. `~/.geogig-porcelain/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `<repo>/.geogig/porcelain.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing: transport and timestamp
//! names must be known, and names must be usable on the engine command line.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;
use crate::parse::TimestampMode;
use crate::transport::TransportKind;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// engine = "/opt/geogig/bin/geogig"
/// transport = "gateway"
/// timestamps = "offset"
///
/// [gateway]
/// host = "127.0.0.1"
/// port = 25333
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Engine executable used by the process transport
    pub engine: Option<String>,

    /// Transport realization ("process" or "gateway")
    pub transport: Option<String>,

    /// How commit timestamps are interpreted ("offset" or "epoch")
    pub timestamps: Option<String>,

    /// Gateway endpoint
    pub gateway: Option<GatewayConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(engine) = &self.engine {
            if engine.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "engine cannot be empty".to_string(),
                ));
            }
        }

        if let Some(transport) = &self.transport {
            if TransportKind::parse(transport).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid transport '{}', must be one of: {}",
                    transport,
                    TransportKind::names().join(", ")
                )));
            }
        }

        validate_timestamps(self.timestamps.as_deref())?;

        if let Some(gateway) = &self.gateway {
            gateway.validate()?;
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// remote = "upstream"
/// timestamps = "epoch"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Remote name (default: "origin")
    pub remote: Option<String>,

    /// Per-repository override of the timestamp interpretation
    pub timestamps: Option<String>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.remote {
            if remote.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
            BranchName::new(remote)
                .map_err(|e| ConfigError::InvalidValue(format!("invalid remote name: {}", e)))?;
        }

        validate_timestamps(self.timestamps.as_deref())
    }
}

/// Gateway endpoint settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host the gateway listens on
    pub host: Option<String>,

    /// Port the gateway listens on
    pub port: Option<u16>,
}

impl GatewayConfig {
    /// Validate the gateway configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "gateway host cannot be empty".to_string(),
                ));
            }
        }
        if self.port == Some(0) {
            return Err(ConfigError::InvalidValue(
                "gateway port cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_timestamps(value: Option<&str>) -> Result<(), ConfigError> {
    match value {
        Some(mode) if TimestampMode::parse(mode).is_none() => {
            Err(ConfigError::InvalidValue(format!(
                "invalid timestamps '{}', must be one of: offset, epoch",
                mode
            )))
        }
        _ => Ok(()),
    }
}
