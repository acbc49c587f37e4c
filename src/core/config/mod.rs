//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! There are two configuration scopes:
//! - **Global**: user-level settings (engine executable, transport, timestamps)
//! - **Repo**: per-repository overrides, stored next to the engine's own
//!   control directory
//!
//! A repo value beats a global one, which beats the built-in default.
//!
//! The global file is the first of these that exists:
//! `$GEOGIG_PORCELAIN_CONFIG`, `$XDG_CONFIG_HOME/geogig-porcelain/config.toml`,
//! `~/.geogig-porcelain/config.toml`. Only the last is ever written.
//!
//! # Example
//!
//! ```no_run
//! use geogig_porcelain::core::config::Config;
//! use geogig_porcelain::repo::Repository;
//! use std::path::Path;
//!
//! let path = Path::new("/data/parks");
//! let config = Config::load(Some(path)).unwrap().config;
//!
//! let repo = Repository::open_with(path, config.transport().unwrap(), config.settings()).unwrap();
//! println!("Remote: {}", config.remote());
//! ```

pub mod schema;

pub use schema::{GatewayConfig, GlobalConfig, RepoConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::parse::TimestampMode;
use crate::repo::RepoSettings;
use crate::transport::{self, Transport, TransportKind};

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "GEOGIG_PORCELAIN_CONFIG";

/// Default engine executable.
pub const DEFAULT_ENGINE: &str = "geogig";

/// Default gateway endpoint.
pub const DEFAULT_GATEWAY_HOST: &str = "127.0.0.1";
pub const DEFAULT_GATEWAY_PORT: u16 = 25333;

const HOME_CONFIG: &str = ".geogig-porcelain/config.toml";
const XDG_CONFIG: &str = "geogig-porcelain/config.toml";
const REPO_CONFIG: &str = ".geogig/porcelain.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules: repo config overrides global
/// config, which overrides the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if a repository was given)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load the global file and, for `repo_path`, the repository file.
    ///
    /// A file that is missing is skipped. A file that exists but does not
    /// parse or validate is an error.
    pub fn load(repo_path: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = global_candidates()
            .into_iter()
            .find(|p| p.is_file())
            .map(|p| read_config::<GlobalConfig>(&p).map(|c| (c, Some(p))))
            .transpose()?
            .unwrap_or_default();
        global.validate()?;

        let (repo, repo_path) = match repo_path.map(Self::repo_config_path) {
            Some(p) if p.is_file() => {
                let repo: RepoConfig = read_config(&p)?;
                repo.validate()?;
                (Some(repo), Some(p))
            }
            _ => (None, None),
        };

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path,
            },
        })
    }

    /// `~/.geogig-porcelain/config.toml`, where `write_global` puts the file.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(HOME_CONFIG))
            .ok_or(ConfigError::NoHomeDir)
    }

    /// `<repo>/.geogig/porcelain.toml`.
    pub fn repo_config_path(repo_path: &Path) -> PathBuf {
        repo_path.join(REPO_CONFIG)
    }

    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        write_atomic(&path, config)?;
        Ok(path)
    }

    pub fn write_repo(repo_path: &Path, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::repo_config_path(repo_path);
        write_atomic(&path, config)?;
        Ok(path)
    }

    /// Engine executable for the process transport.
    ///
    /// Defaults to `geogig` (looked up on `PATH`).
    pub fn engine(&self) -> &str {
        self.global.engine.as_deref().unwrap_or(DEFAULT_ENGINE)
    }

    /// Selected transport realization.
    ///
    /// Defaults to the process transport.
    pub fn transport_kind(&self) -> TransportKind {
        self.global
            .transport
            .as_deref()
            .and_then(TransportKind::parse)
            .unwrap_or(TransportKind::Process)
    }

    pub fn gateway_host(&self) -> &str {
        self.global
            .gateway
            .as_ref()
            .and_then(|g| g.host.as_deref())
            .unwrap_or(DEFAULT_GATEWAY_HOST)
    }

    pub fn gateway_port(&self) -> u16 {
        self.global
            .gateway
            .as_ref()
            .and_then(|g| g.port)
            .unwrap_or(DEFAULT_GATEWAY_PORT)
    }

    /// How commit timestamps are interpreted.
    ///
    /// The repo setting wins over the global one. Defaults to
    /// [`TimestampMode::Offset`].
    pub fn timestamps(&self) -> TimestampMode {
        self.repo
            .as_ref()
            .and_then(|r| r.timestamps.as_deref())
            .or(self.global.timestamps.as_deref())
            .and_then(TimestampMode::parse)
            .unwrap_or_default()
    }

    /// Get the remote name.
    ///
    /// Defaults to "origin" if not configured.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .unwrap_or(crate::core::types::ORIGIN)
    }

    /// Build the configured transport.
    ///
    /// # Errors
    ///
    /// Fails when the gateway transport is selected and the session cannot
    /// be opened.
    pub fn transport(&self) -> Result<Arc<dyn Transport>, transport::TransportError> {
        transport::create_transport(self)
    }

    /// Settings a [`Repository`](crate::repo::Repository) is opened with.
    pub fn settings(&self) -> RepoSettings {
        RepoSettings {
            timestamps: self.timestamps(),
            remote: self.remote().to_string(),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

/// Global config locations, most specific first.
fn global_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        candidates.push(PathBuf::from(explicit));
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        candidates.push(PathBuf::from(xdg).join(XDG_CONFIG));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(HOME_CONFIG));
    }
    candidates
}

fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Serialize `config` into a temp file next to `path` and move it into place.
fn write_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let contents = toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(contents.as_bytes()).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_files() {
        let config = Config::default();

        assert_eq!(config.engine(), "geogig");
        assert_eq!(config.transport_kind(), TransportKind::Process);
        assert_eq!(config.timestamps(), TimestampMode::Offset);
        assert_eq!(config.remote(), "origin");
        assert_eq!(config.gateway_port(), DEFAULT_GATEWAY_PORT);
    }

    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        fs::write(
            &config_path,
            r#"
            engine = "/opt/geogig/bin/geogig"
            timestamps = "epoch"
            "#,
        )
        .unwrap();

        std::env::set_var(CONFIG_ENV, config_path.to_str().unwrap());
        let result = Config::load(None);
        std::env::remove_var(CONFIG_ENV);

        let config = result.unwrap().config;
        assert_eq!(config.engine(), "/opt/geogig/bin/geogig");
        assert_eq!(config.timestamps(), TimestampMode::Epoch);
        assert_eq!(config.global_config_loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".geogig")).unwrap();
        fs::write(
            Config::repo_config_path(temp.path()),
            r#"
            remote = "upstream"
            "#,
        )
        .unwrap();

        let config = Config::load(Some(temp.path())).unwrap().config;
        assert_eq!(config.remote(), "upstream");
        assert!(config.repo_config_loaded_from().is_some());
    }

    #[test]
    fn missing_repo_config_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(Some(temp.path())).unwrap().config;
        assert!(config.repo.is_none());
    }

    #[test]
    fn write_repo_config_atomic() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig {
            remote: Some("mirror".to_string()),
            timestamps: Some("epoch".to_string()),
        };

        let path = Config::write_repo(temp.path(), &config).unwrap();

        assert!(path.exists());
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
        let loaded = Config::load(Some(temp.path())).unwrap().config;
        assert_eq!(loaded.remote(), "mirror");
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".geogig")).unwrap();
        fs::write(
            Config::repo_config_path(temp.path()),
            r#"
            remote = "origin"
            unknown_field = true
            "#,
        )
        .unwrap();

        assert!(Config::load(Some(temp.path())).is_err());
    }

    #[test]
    fn repo_timestamps_override_global() {
        let config = Config {
            global: GlobalConfig {
                timestamps: Some("offset".to_string()),
                ..Default::default()
            },
            repo: Some(RepoConfig {
                timestamps: Some("epoch".to_string()),
                ..Default::default()
            }),
            global_path: None,
            repo_path: None,
        };

        assert_eq!(config.timestamps(), TimestampMode::Epoch);
        assert_eq!(config.settings().timestamps, TimestampMode::Epoch);
    }
}
