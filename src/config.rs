//! Environment-driven configuration for the indexer.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

use crate::pipeline::DEFAULT_LINE_TOLERANCE;

const DEFAULT_CODE_PREFIX: &str = "SOP-ULT";
const DEFAULT_UNIT_NAME: &str = "Unit Layanan Terpadu";
const DEFAULT_UNIT_DESCRIPTION: &str = "Unit Layanan Terpadu Universitas Sumatera Utara";
const DEFAULT_FILE_URL_PREFIX: &str = "storage/dokumen/sop";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required setting was provided neither by the environment nor by a flag.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the SOP indexer.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// SQLite file backing the record store; `index` requires it unless given on the command line.
    pub database_path: Option<PathBuf>,
    /// First page (1-based, inclusive) scanned by default.
    pub start_page: usize,
    /// Last page (1-based, inclusive) scanned by default; `None` scans to the end.
    pub end_page: Option<usize>,
    /// Prefix of generated record codes (`<prefix>-NNN`).
    pub code_prefix: String,
    /// Name of the service unit that owns every indexed record.
    pub unit_name: String,
    /// Description stored when the owning unit is created.
    pub unit_description: String,
    /// Vertical tolerance used when grouping words into lines.
    pub line_tolerance: f64,
    /// Prefix of the `file_url` stored on each record.
    pub file_url_prefix: String,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_path: load_env_optional("SOP_DATABASE_PATH").map(PathBuf::from),
            start_page: load_parsed_optional("SOP_START_PAGE")?.unwrap_or(1),
            end_page: load_parsed_optional("SOP_END_PAGE")?,
            code_prefix: load_env_optional("SOP_CODE_PREFIX")
                .unwrap_or_else(|| DEFAULT_CODE_PREFIX.to_string()),
            unit_name: load_env_optional("SOP_UNIT_NAME")
                .unwrap_or_else(|| DEFAULT_UNIT_NAME.to_string()),
            unit_description: load_env_optional("SOP_UNIT_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_UNIT_DESCRIPTION.to_string()),
            line_tolerance: load_parsed_optional("SOP_LINE_TOLERANCE")?
                .unwrap_or(DEFAULT_LINE_TOLERANCE),
            file_url_prefix: load_env_optional("SOP_FILE_URL_PREFIX")
                .unwrap_or_else(|| DEFAULT_FILE_URL_PREFIX.to_string()),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_parsed_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl Config {
    /// Database path, preferring `flag` over the environment.
    pub fn database_path_or(&self, flag: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        flag.or_else(|| self.database_path.clone())
            .ok_or_else(|| ConfigError::MissingVariable("SOP_DATABASE_PATH".to_string()))
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// Callers load `.env` beforehand so logging and configuration see the same variables.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    let config = Config::from_env()?;
    tracing::debug!(
        database = ?config.database_path,
        start_page = config.start_page,
        end_page = ?config.end_page,
        code_prefix = %config.code_prefix,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
