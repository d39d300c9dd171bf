//! Configuration loading and resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ENV_DATABASE: &str = "TUTORMATCH_DATABASE";
pub const ENV_BIND: &str = "TUTORMATCH_BIND";
pub const ENV_PORT: &str = "TUTORMATCH_PORT";
pub const ENV_TOKEN_SECRET: &str = "TUTORMATCH_TOKEN_SECRET";
pub const ENV_CONFIG: &str = "TUTORMATCH_CONFIG";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub token_secret: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "tutormatch_api=info,tutormatch_common=info,tower_http=info".to_string()
}

/// Values supplied on the command line (tier 1)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub token_secret: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    /// `None` means "load or generate from the settings table"
    pub token_secret: Option<String>,
    pub log_filter: String,
}

impl ServiceConfig {
    /// Resolve configuration from CLI overrides, environment, TOML and defaults
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = match config_file_path(overrides) {
            ConfigFile::Explicit(path) => load_toml_config(&path)?,
            ConfigFile::Default(Some(path)) if path.exists() => load_toml_config(&path)?,
            ConfigFile::Default(_) => {
                debug!("No config file found, using defaults");
                TomlConfig::default()
            }
        };

        let database_path = overrides
            .database_path
            .clone()
            .or_else(|| env_var(ENV_DATABASE).map(PathBuf::from))
            .or_else(|| toml_config.database_path.clone())
            .unwrap_or_else(default_database_path);

        let bind_address = overrides
            .bind_address
            .clone()
            .or_else(|| env_var(ENV_BIND))
            .or_else(|| toml_config.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let port = match overrides.port {
            Some(port) => port,
            None => match env_var(ENV_PORT) {
                Some(raw) => raw.parse::<u16>().map_err(|e| {
                    Error::Config(format!("{} must be a port number: {}", ENV_PORT, e))
                })?,
                None => toml_config.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let token_secret = overrides
            .token_secret
            .clone()
            .or_else(|| env_var(ENV_TOKEN_SECRET))
            .or_else(|| toml_config.token_secret.clone())
            .filter(|secret| !secret.trim().is_empty());

        Ok(Self {
            database_path,
            bind_address,
            port,
            token_secret,
            log_filter: toml_config.logging.filter,
        })
    }

    /// `host:port` string suitable for `TcpListener::bind`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

enum ConfigFile {
    /// Named on the command line or in the environment; must exist
    Explicit(PathBuf),
    /// Platform default; silently skipped when absent
    Default(Option<PathBuf>),
}

fn config_file_path(overrides: &ConfigOverrides) -> ConfigFile {
    if let Some(path) = &overrides.config_file {
        return ConfigFile::Explicit(path.clone());
    }
    if let Some(path) = env_var(ENV_CONFIG) {
        return ConfigFile::Explicit(PathBuf::from(path));
    }
    ConfigFile::Default(default_config_file())
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Platform config file: `<config dir>/tutormatch/config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tutormatch").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tutormatch"))
        .unwrap_or_else(|| PathBuf::from("./tutormatch_data"))
        .join("tutormatch.db")
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
