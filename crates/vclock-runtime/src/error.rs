//! Error types for the runtime crate.

use thiserror::Error;
use vclock_core::{ChannelError, ChannelMisuseError, ConfigurationError, ProcessId};

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, RunError>;

/// Errors that end a single process. They never leave the process's own
/// task except through logging.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A clock operation or channel lookup was invalid.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A receive failed.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Errors that prevent a run from starting or finishing.
#[derive(Debug, Error)]
pub enum RunError {
    /// The topology is invalid.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A channel could not be wired.
    #[error("channel misuse: {0}")]
    ChannelMisuse(#[from] ChannelMisuseError),

    /// The bounded join gave up on the listed processes.
    #[error("deadline of {waited_ms}ms exceeded, still running: {pending:?}")]
    DeadlineExceeded {
        /// Processes that had not completed.
        pending: Vec<ProcessId>,
        /// The configured bound.
        waited_ms: u64,
    },
}
