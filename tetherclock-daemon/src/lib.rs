//! Boot-cycle scheduler: discovery window, refresh loop, signals, logging.

pub mod logging;
pub mod scheduler;
pub mod settings;

mod error;
mod runtime;

pub use error::DaemonError;
pub use runtime::{run_loop, start_blocking, LoopExit, RunMode, SyncDeps};
pub use settings::Settings;
