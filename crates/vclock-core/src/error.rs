//! Error types shared by the clock, channel and topology layers.
//!
//! This module provides error types using `thiserror`. Configuration errors
//! are meant to be raised before any process is spawned; channel errors can
//! only surface while a process is running.

use crate::ids::{ChannelId, ProcessId};
use thiserror::Error;

/// Errors in the description of a run: unknown processes, unowned channel
/// endpoints, mismatched process sets, malformed actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A clock operation named a process the clock has no entry for.
    #[error("unknown process: {0}")]
    UnknownProcess(ProcessId),

    /// A clock handed to `merge` lacks an entry the receiving clock has.
    #[error("clock is missing an entry for process {0}")]
    MissingEntry(ProcessId),

    /// The same process was declared twice.
    #[error("duplicate process: {0}")]
    DuplicateProcess(ProcessId),

    /// The same channel was declared twice.
    #[error("duplicate channel: {0}")]
    DuplicateChannel(ChannelId),

    /// A channel names an endpoint that is not a declared process.
    #[error("channel {channel} names unknown endpoint {process}")]
    UnknownEndpoint {
        /// The channel being declared.
        channel: ChannelId,
        /// The endpoint that is not a declared process.
        process: ProcessId,
    },

    /// A script references a channel that was never declared.
    #[error("script of {process} references unknown channel {channel}")]
    UnknownChannel {
        /// The process owning the script.
        process: ProcessId,
        /// The channel that does not exist.
        channel: ChannelId,
    },

    /// A script uses a channel the process is not an endpoint of.
    #[error("process {process} is not an endpoint of channel {channel}")]
    UnownedEndpoint {
        /// The process owning the script.
        process: ProcessId,
        /// The channel it has no end of.
        channel: ChannelId,
    },

    /// The processes seeding the clocks and the scripted processes differ.
    #[error("process set mismatch: unscripted {unscripted:?}, undeclared {undeclared:?}")]
    ProcessSetMismatch {
        /// Declared processes that have no script.
        unscripted: Vec<ProcessId>,
        /// Scripts whose owner was never declared.
        undeclared: Vec<ProcessId>,
    },

    /// The topology has no processes.
    #[error("topology has no processes")]
    EmptyTopology,

    /// An action could not be parsed from its text form.
    #[error("invalid action {input:?}: {reason}")]
    InvalidAction {
        /// The text that failed to parse.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Binding an endpoint role more than once, or a channel looping back to
/// a single process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelMisuseError {
    /// Both ends of the channel belong to the same process.
    #[error("channel {channel} connects process {process} to itself")]
    SelfLoop {
        /// The offending channel.
        channel: ChannelId,
        /// The process named on both ends.
        process: ProcessId,
    },

    /// The endpoint was already handed out.
    #[error("endpoint of {process} on channel {channel} is already bound")]
    EndpointAlreadyBound {
        /// The channel.
        channel: ChannelId,
        /// The process whose end was claimed twice.
        process: ProcessId,
    },

    /// The process is not one of the two ends of the channel.
    #[error("process {process} has no endpoint on channel {channel}")]
    NotAnEndpoint {
        /// The channel.
        channel: ChannelId,
        /// The process that asked for an end.
        process: ProcessId,
    },
}

/// Errors raised by a channel endpoint at run time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The peer lane is gone; only possible once the channel itself was dropped.
    #[error("channel {0} is disconnected")]
    Disconnected(ChannelId),

    /// A bounded receive gave up.
    #[error("receive on channel {channel} timed out after {waited_ms}ms")]
    TimedOut {
        /// The channel that stayed empty.
        channel: ChannelId,
        /// How long the receiver waited.
        waited_ms: u64,
    },
}

impl ConfigurationError {
    /// Creates a new invalid action error.
    pub fn invalid_action(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
