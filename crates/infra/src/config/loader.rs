//! Configuration loader
//!
//! Loads pipeline configuration from environment variables or files. All
//! values are fixed for the process lifetime; there is no hot reload.
//!
//! ## Loading Strategy
//! 1. If `SYNCLINE_UPSTREAM_BASE_URL` is set, builds the configuration from
//!    environment variables (unset variables keep their defaults)
//! 2. Otherwise probes standard locations for a config file
//! 3. Otherwise falls back to the built-in defaults
//!
//! ## Environment Variables
//! - `SYNCLINE_UPSTREAM_BASE_URL`: Base URL of the upstream service
//! - `SYNCLINE_UPSTREAM_RESOURCE_PATH`: Resource path (default `/products`)
//! - `SYNCLINE_UPSTREAM_TIMEOUT_SECS`: Per-request timeout
//! - `SYNCLINE_CB_WINDOW_SIZE`: Breaker sliding window size
//! - `SYNCLINE_CB_FAILURE_RATE`: Breaker failure-rate threshold (percent)
//! - `SYNCLINE_CB_WAIT_SECS`: Breaker open-state wait
//! - `SYNCLINE_CB_HALF_OPEN_CALLS`: Breaker half-open probe budget
//! - `SYNCLINE_RETRY_MAX_ATTEMPTS`: Read retry attempt budget
//! - `SYNCLINE_RETRY_BACKOFF_MS`: Read retry backoff
//! - `SYNCLINE_SCHED_PROPAGATE_SECS`: Propagate scheduler period
//! - `SYNCLINE_SCHED_REPROCESS_SECS`: Reprocess scheduler period
//!
//! ## File Locations
//! The loader probes (in order): `./syncline.toml`, `./config.toml`,
//! `./syncline.json`, `./config.json`, the same names one directory up,
//! and finally relative to the executable location.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use syncline_domain::{Config, ConfigError};

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns [`ConfigError`] if a present source cannot be parsed or the
/// resulting configuration fails validation.
pub fn load() -> Result<Config, ConfigError> {
    let config = if std::env::var("SYNCLINE_UPSTREAM_BASE_URL").is_ok() {
        tracing::info!("Loading configuration from environment variables");
        load_from_env()?
    } else if let Some(path) = probe_config_paths() {
        load_from_file(Some(path))?
    } else {
        tracing::info!("No configuration source found, using built-in defaults");
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables, overlaying any set
/// `SYNCLINE_*` variables on the defaults.
///
/// # Errors
/// Returns [`ConfigError`] if a set variable has an unparseable value.
pub fn load_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();

    if let Ok(url) = std::env::var("SYNCLINE_UPSTREAM_BASE_URL") {
        config.upstream.base_url = url;
    }
    if let Ok(path) = std::env::var("SYNCLINE_UPSTREAM_RESOURCE_PATH") {
        config.upstream.resource_path = path;
    }
    overlay(&mut config.upstream.request_timeout_secs, "SYNCLINE_UPSTREAM_TIMEOUT_SECS")?;
    overlay(&mut config.breaker.window_size, "SYNCLINE_CB_WINDOW_SIZE")?;
    overlay(&mut config.breaker.failure_rate_threshold, "SYNCLINE_CB_FAILURE_RATE")?;
    overlay(&mut config.breaker.wait_duration_in_open_secs, "SYNCLINE_CB_WAIT_SECS")?;
    overlay(&mut config.breaker.permitted_calls_in_half_open, "SYNCLINE_CB_HALF_OPEN_CALLS")?;
    overlay(&mut config.retry.max_attempts, "SYNCLINE_RETRY_MAX_ATTEMPTS")?;
    overlay(&mut config.retry.backoff_ms, "SYNCLINE_RETRY_BACKOFF_MS")?;
    overlay(&mut config.schedulers.propagate_interval_secs, "SYNCLINE_SCHED_PROPAGATE_SECS")?;
    overlay(&mut config.schedulers.reprocess_interval_secs, "SYNCLINE_SCHED_REPROCESS_SECS")?;

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. Supports TOML and
/// JSON, detected by extension.
///
/// # Errors
/// Returns [`ConfigError`] if the file is missing, unreadable, or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::Invalid {
                    message: format!("Config file not found: {}", p.display()),
                });
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| ConfigError::Invalid {
            message: "No config file found in any of the standard locations".to_string(),
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Invalid {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format by file
/// extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConfigError::Invalid { message: format!("Invalid TOML format: {e}") }),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConfigError::Invalid { message: format!("Invalid JSON format: {e}") }),
        _ => {
            Err(ConfigError::Invalid { message: format!("Unsupported config format: {extension}") })
        }
    }
}

/// Probe the standard locations for a configuration file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let names = ["syncline.toml", "config.toml", "syncline.json", "config.json"];
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for name in names {
            candidates.push(cwd.join(name));
        }
        for name in names {
            candidates.push(cwd.join("..").join(name));
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in names {
                candidates.push(exe_dir.join(name));
            }
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Overlay an environment variable onto a default, if set.
fn overlay<T>(slot: &mut T, key: &str) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(key) {
        *slot = raw
            .parse()
            .map_err(|e| ConfigError::Invalid { message: format!("Invalid value for {key}: {e}") })?;
    }
    Ok(())
}
