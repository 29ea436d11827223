use crate::export::DEFAULT_EXPORT_FILE;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_HTTP_ADDR: &str = "ROSTER_HTTP_ADDR";
pub const ENV_DB_PATH: &str = "ROSTER_DB_PATH";
pub const ENV_EXPORT_FILE: &str = "ROSTER_EXPORT_FILE";
pub const ENV_LOG: &str = "ROSTER_LOG";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DB_PATH: &str = "roster.sqlite3";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var} '{value}': {source}")]
    InvalidAddr {
        var: &'static str,
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_path: PathBuf,
    pub export_file_name: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            export_file_name: DEFAULT_EXPORT_FILE.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from any variable source; unset or blank variables
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let raw_addr = get(ENV_HTTP_ADDR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidAddr {
                var: ENV_HTTP_ADDR,
                value: raw_addr.clone(),
                source,
            })?;

        Ok(Self {
            http_addr,
            database_path: get(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            export_file_name: get(ENV_EXPORT_FILE)
                .unwrap_or_else(|| DEFAULT_EXPORT_FILE.to_string()),
            log_filter: get(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
