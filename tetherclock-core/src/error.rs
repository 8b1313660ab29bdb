//! Error types for tetherclock-core.

use thiserror::Error;

/// All errors that can arise from selection-config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error on the save path.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// `dirs::config_dir()` returned `None` — cannot locate the config root.
    #[error("cannot determine config directory; set $XDG_CONFIG_HOME or equivalent")]
    ConfigDirNotFound,
}
