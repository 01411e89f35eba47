//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Load a `.env` file into the process environment, if one exists
//! 2. Build the config from environment variables
//! 3. If `TIMECLOCK_API_BASE_URL` is unset, fall back to a config file; once
//!    it is set, any invalid environment variable is reported as-is
//! 4. Config files are JSON or TOML, detected by extension
//!
//! ## Environment Variables
//! - `TIMECLOCK_API_BASE_URL` (required): attendance API base URL
//! - `TIMECLOCK_API_TIMEOUT_SECS`: per-request timeout, default 30
//! - `TIMECLOCK_API_TOKEN`: bearer token for the attendance API
//! - `TIMECLOCK_STORAGE_PATH`: SQLite file, default `timeclock.db`
//! - `TIMECLOCK_DEVICE_ID`: fixed device identifier
//! - `TIMECLOCK_DEVICE_MODEL`: device model reported with clock actions
//! - `TIMECLOCK_LOG_LEVEL`: default log filter when `RUST_LOG` is unset
//! - `TIMECLOCK_LOG_JSON`: emit JSON log lines (true/false)
//!
//! ## File Locations
//! `config.{json,toml}` and `timeclock.{json,toml}` in the working directory,
//! its parent and grandparent, then the same names next to the executable.

use std::path::{Path, PathBuf};

use timeclock_domain::{
    ApiConfig, Config, DeviceConfig, LoggingConfig, Result, StorageConfig, TimeclockError,
};

const BASE_URL_VAR: &str = "TIMECLOCK_API_BASE_URL";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "timeclock.json", "timeclock.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `TimeclockError::Config` when the environment is configured but
/// invalid, or when neither the environment nor any config file yields a
/// valid configuration.
pub fn load() -> Result<Config> {
    load_dotenv();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) if optional_env(BASE_URL_VAR).is_some() => Err(e),
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Merge a `.env` file into the process environment. Existing variables
/// are never overwritten.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!(path = %path.display(), "Loaded .env file");
            Some(path)
        }
        Err(e) => {
            tracing::debug!(error = %e, "No .env file loaded");
            None
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `TimeclockError::Config` if `TIMECLOCK_API_BASE_URL` is missing or
/// a numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var(BASE_URL_VAR)?;
    let defaults = Config::default();

    let timeout_secs = match optional_env("TIMECLOCK_API_TIMEOUT_SECS") {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| TimeclockError::Config(format!("Invalid API timeout: {}", e)))?,
        None => defaults.api.timeout_secs,
    };

    let device = DeviceConfig {
        device_id: optional_env("TIMECLOCK_DEVICE_ID"),
        model: optional_env("TIMECLOCK_DEVICE_MODEL").unwrap_or(defaults.device.model),
        ..defaults.device
    };

    Ok(Config {
        api: ApiConfig {
            base_url,
            timeout_secs,
            access_token: optional_env("TIMECLOCK_API_TOKEN"),
        },
        storage: StorageConfig {
            path: optional_env("TIMECLOCK_STORAGE_PATH").unwrap_or(defaults.storage.path),
        },
        device,
        logging: LoggingConfig {
            level: optional_env("TIMECLOCK_LOG_LEVEL").unwrap_or(defaults.logging.level),
            json: env_bool("TIMECLOCK_LOG_JSON", defaults.logging.json),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations with
/// [`find_config_file`].
///
/// # Errors
/// Returns `TimeclockError::Config` if the file is missing, unreadable, in an
/// unsupported format, or missing required fields.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TimeclockError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => find_config_file().ok_or_else(|| {
            TimeclockError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TimeclockError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TimeclockError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TimeclockError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(TimeclockError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file among the standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.extend([exe_dir.clone(), exe_dir.join("..")]);
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|candidate| candidate.exists())
}

fn env_var(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| {
        TimeclockError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Set and non-blank
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
