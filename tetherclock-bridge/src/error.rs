//! Error types for tetherclock-bridge.

use thiserror::Error;

/// All errors that can arise from bridge invocations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge tool is not on PATH. Fatal: every operation depends on it,
    /// so the process exits with a distinguished status (127).
    #[error("'{tool}' not found on PATH; install platform-tools and put {tool} on PATH")]
    ToolMissing { tool: &'static str },

    /// The tool was present but could not be spawned or waited on.
    #[error("failed to invoke `{command}`: {source}")]
    Invoke {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A cancellation token fired while waiting for authorization.
    #[error("cancelled while waiting for device authorization")]
    Cancelled,
}
