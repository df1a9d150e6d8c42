//! Vclock Core - logical time for scripted causal-ordering runs.
//!
//! This crate provides the value types every other crate in the workspace
//! builds on:
//!
//! - [`ids`]: `ProcessId` and `ChannelId`
//! - [`clock`]: `VectorClock` with increment, merge and causal comparison
//! - [`message`]: the clock snapshot carried over a channel
//! - [`action`]: the closed set of script steps (`Event`, `Send`, `Receive`)
//! - [`log`]: the shared, append-only `EventLog`
//! - [`error`]: configuration and channel error types
//!
//! # Example
//!
//! ```
//! use vclock_core::{ActionKind, EventLog, ProcessId, VectorClock};
//!
//! let a = ProcessId::new("a");
//! let mut clock = VectorClock::zeroed([a.clone(), ProcessId::new("b")]);
//! clock.increment(&a).unwrap();
//!
//! let log = EventLog::default();
//! let entry = log.append(a, ActionKind::LocalEvent, None, clock);
//! assert_eq!(entry.to_string(), "Event happened in process a: [1, 0]");
//! ```

pub mod action;
pub mod clock;
pub mod error;
pub mod ids;
pub mod log;
pub mod message;

pub use action::{Action, ActionKind};
pub use clock::VectorClock;
pub use error::{ChannelError, ChannelMisuseError, ConfigurationError};
pub use ids::{ChannelId, ProcessId};
pub use log::{EventLog, LogEntry};
pub use message::Message;
