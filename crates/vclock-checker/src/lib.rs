//! Vclock Checker - post-run verification of event logs.
//!
//! A finished run leaves behind an [`EventLog`](vclock_core::EventLog).
//! The checkers in this crate replay it and verify the properties vector
//! clocks are supposed to guarantee:
//!
//! - [`ClockProgressChecker`]: each action bumps its owner's entry by one;
//!   foreign entries only move on a receive, and never backwards
//! - [`MessageCausalityChecker`]: every receive is paired with a send and
//!   its clock dominates the snapshot that was sent
//! - [`HappensBeforeChecker`]: clock order coincides with causal order,
//!   and causally unrelated events are concurrent
//!
//! Sends and receives are paired per channel in FIFO order, so a log is
//! checkable on its own, without the topology that produced it.

mod graph;
pub mod happens_before;
pub mod messages;
pub mod progress;
pub mod result;
pub mod traits;

pub use happens_before::HappensBeforeChecker;
pub use messages::MessageCausalityChecker;
pub use progress::ClockProgressChecker;
pub use result::{CheckResult, CheckStats, CheckStatus, Violation, ViolationKind};
pub use traits::Checker;

use tracing::{info, warn};
use vclock_core::LogEntry;

/// Returns one instance of every checker, in the order `check_all` runs them.
pub fn default_checkers() -> Vec<Box<dyn Checker>> {
    vec![
        Box::new(ClockProgressChecker::new()),
        Box::new(MessageCausalityChecker::new()),
        Box::new(HappensBeforeChecker::new()),
    ]
}

/// Runs every checker over the log.
pub fn check_all(log: &[LogEntry]) -> Vec<CheckResult> {
    default_checkers()
        .iter()
        .map(|checker| {
            let result = checker.check(log);
            if result.is_pass() {
                info!(checker = checker.name(), "{}", result);
            } else {
                warn!(checker = checker.name(), "{}", result);
                for violation in &result.violations {
                    warn!(checker = checker.name(), "{}", violation);
                }
            }
            result
        })
        .collect()
}
