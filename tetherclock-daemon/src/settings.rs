//! Runtime settings from environment variables.
//!
//! | variable             | meaning                                | default |
//! |----------------------|----------------------------------------|---------|
//! | `DISCOVERY_INTERVAL` | poll period before the first success   | 5 s     |
//! | `STARTUP_WINDOW`     | give-up deadline without a success     | 900 s   |
//! | `REFRESH_INTERVAL`   | steady-state period after a success    | 600 s   |
//! | `DRIFT_THRESHOLD`    | minimum drift that triggers a clock set| 1 s     |
//! | `ADB_CONNECT`        | host:port to connect before each poll  | unset   |
//! | `LOG_FILE`           | append log lines to this file          | unset   |
//!
//! Unset, empty or unparseable values fall back to the defaults.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DISCOVERY_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_STARTUP_WINDOW_SECS: u64 = 900;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_DRIFT_THRESHOLD_SECS: i64 = 1;

/// Effective daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub discovery_interval: Duration,
    pub startup_window: Duration,
    pub refresh_interval: Duration,
    pub drift_threshold: i64,
    pub connect_target: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discovery_interval: Duration::from_secs(DEFAULT_DISCOVERY_INTERVAL_SECS),
            startup_window: Duration::from_secs(DEFAULT_STARTUP_WINDOW_SECS),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            drift_threshold: DEFAULT_DRIFT_THRESHOLD_SECS,
            connect_target: None,
            log_file: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup; the seam tests use.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let seconds = |name: &str, default: u64| {
            get(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let non_empty = |name: &str| {
            get(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        Self {
            discovery_interval: Duration::from_secs(seconds(
                "DISCOVERY_INTERVAL",
                DEFAULT_DISCOVERY_INTERVAL_SECS,
            )),
            startup_window: Duration::from_secs(seconds(
                "STARTUP_WINDOW",
                DEFAULT_STARTUP_WINDOW_SECS,
            )),
            refresh_interval: Duration::from_secs(seconds(
                "REFRESH_INTERVAL",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )),
            drift_threshold: get("DRIFT_THRESHOLD")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_DRIFT_THRESHOLD_SECS),
            connect_target: non_empty("ADB_CONNECT"),
            log_file: non_empty("LOG_FILE").map(PathBuf::from),
        }
    }
}
