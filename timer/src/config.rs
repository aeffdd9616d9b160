//! Configuration module for the Pomodoro Timer.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `POMODORO_DATA_DIR` | No | `~/.pomodoro-timer` | Directory holding the cycle state and logs |
//! | `POMODORO_TICK_INTERVAL_MS` | No | 1000 | Countdown tick interval in milliseconds |
//! | `POMODORO_DEFAULT_MINUTES` | No | 25 | Minutes pre-filled in the new-cycle form |
//! | `POMODORO_MAX_MINUTES` | No | 60 | Largest minutes amount accepted for a cycle |
//!
//! # Example
//!
//! ```no_run
//! use pomodoro_timer::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Data directory: {}", config.data_dir.display());
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use thiserror::Error;

use crate::types::{DEFAULT_MAX_MINUTES_AMOUNT, MIN_MINUTES_AMOUNT};

/// Default data directory name relative to home.
const DEFAULT_DATA_DIR: &str = ".pomodoro-timer";

/// Default countdown tick interval (in milliseconds).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Default minutes pre-filled in the new-cycle form.
pub const DEFAULT_MINUTES_AMOUNT: u32 = 25;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the Pomodoro Timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the persisted cycle state and the TUI log file.
    pub data_dir: PathBuf,

    /// Interval between countdown ticks.
    pub tick_interval: Duration,

    /// Minutes pre-filled in the new-cycle form.
    pub default_minutes: u32,

    /// Largest minutes amount accepted for a new cycle.
    pub max_minutes: u32,
}

impl Config {
    /// Creates a configuration with default settings rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            default_minutes: DEFAULT_MINUTES_AMOUNT,
            max_minutes: DEFAULT_MAX_MINUTES_AMOUNT,
        }
    }

    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - a numeric variable is set but cannot be parsed as a positive integer
    /// - `POMODORO_DEFAULT_MINUTES` is larger than `POMODORO_MAX_MINUTES`
    /// - `POMODORO_DATA_DIR` is unset and the home directory cannot be
    ///   determined
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pomodoro_timer::config::Config;
    ///
    /// std::env::set_var("POMODORO_MAX_MINUTES", "90");
    /// let config = Config::from_env().unwrap();
    /// assert_eq!(config.max_minutes, 90);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        // Optional: POMODORO_DATA_DIR (default: ~/.pomodoro-timer)
        let data_dir = match env::var("POMODORO_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => {
                let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
                base_dirs.home_dir().join(DEFAULT_DATA_DIR)
            }
        };

        // Optional: POMODORO_TICK_INTERVAL_MS (default: 1000, must be > 0)
        let tick_interval_ms = match env::var("POMODORO_TICK_INTERVAL_MS") {
            Ok(val) => {
                let ms = val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: "POMODORO_TICK_INTERVAL_MS".to_string(),
                    message: format!("expected positive integer, got '{val}'"),
                })?;
                if ms == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "POMODORO_TICK_INTERVAL_MS".to_string(),
                        message: "tick interval must be greater than 0".to_string(),
                    });
                }
                ms
            }
            Err(_) => DEFAULT_TICK_INTERVAL_MS,
        };

        // Optional: POMODORO_MAX_MINUTES (default: 60, must be >= 1)
        let max_minutes = parse_minutes("POMODORO_MAX_MINUTES", DEFAULT_MAX_MINUTES_AMOUNT)?;

        // Optional: POMODORO_DEFAULT_MINUTES (default: 25, must be within 1..=max)
        let default_minutes = parse_minutes(
            "POMODORO_DEFAULT_MINUTES",
            DEFAULT_MINUTES_AMOUNT.min(max_minutes),
        )?;
        if default_minutes > max_minutes {
            return Err(ConfigError::InvalidValue {
                key: "POMODORO_DEFAULT_MINUTES".to_string(),
                message: format!(
                    "default minutes must not exceed the maximum of {max_minutes}, got {default_minutes}"
                ),
            });
        }

        Ok(Self {
            data_dir,
            tick_interval: Duration::from_millis(tick_interval_ms),
            default_minutes,
            max_minutes,
        })
    }

    /// Replaces the data directory, e.g. from a command-line flag.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Path of the log file written while the TUI owns the terminal.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("pomodoro-timer.log")
    }
}

/// Parses a minutes amount from `key`, falling back to `default` when unset.
fn parse_minutes(key: &str, default: u32) -> Result<u32, ConfigError> {
    let Ok(val) = env::var(key) else {
        return Ok(default);
    };
    let minutes = val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected positive integer, got '{val}'"),
    })?;
    if minutes < MIN_MINUTES_AMOUNT {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("minutes must be at least {MIN_MINUTES_AMOUNT}"),
        });
    }
    Ok(minutes)
}
