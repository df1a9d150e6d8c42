//! Core trait for log checkers.

use vclock_core::LogEntry;

use crate::result::CheckResult;

/// A property that can be verified over a finished run's log.
///
/// Checkers only read the log; they can be run in any order and any number
/// of times.
pub trait Checker: Send + Sync {
    /// Returns the name of this checker.
    fn name(&self) -> &str;

    /// Returns a description of what this checker verifies.
    fn description(&self) -> &str;

    /// Checks the log, given in observation order.
    fn check(&self, log: &[LogEntry]) -> CheckResult;
}
