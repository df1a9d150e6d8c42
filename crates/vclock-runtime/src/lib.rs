//! Vclock Runtime - concurrent execution of scripted vector-clock runs.
//!
//! This crate turns a description of processes, channels and scripts into
//! a running system:
//!
//! - [`topology`]: validated description of a run (builder and serde form)
//! - [`channel`]: duplex point-to-point channels with FIFO lanes
//! - [`process`]: the per-process script interpreter and state tracking
//! - [`orchestrator`]: wiring, spawning and joining
//! - [`config`]: pacing and timeout knobs
//! - [`report`]: what a finished run returns
//!
//! # Example
//!
//! ```
//! use vclock_core::{Action, ProcessId};
//! use vclock_runtime::{Orchestrator, RuntimeConfig, Topology};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let topology = Topology::builder()
//!     .processes(["a", "b"])
//!     .channel("ab", "a", "b")
//!     .script("a", vec![Action::send("ab")])
//!     .script("b", vec![Action::receive("ab")])
//!     .build()?;
//!
//! let report = Orchestrator::new(topology, RuntimeConfig::default()).run().await?;
//! assert_eq!(report.clock_of(&ProcessId::new("b")).unwrap().to_string(), "[1, 1]");
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod process;
pub mod report;
pub mod topology;

pub use channel::{Channel, ChannelSpec, Endpoint};
pub use config::RuntimeConfig;
pub use error::{ProcessError, Result, RunError};
pub use orchestrator::Orchestrator;
pub use process::{Process, ProcessOutcome, ProcessState, ProcessStates};
pub use report::{RunId, RunReport};
pub use topology::{Topology, TopologyBuilder, TopologySpec};
