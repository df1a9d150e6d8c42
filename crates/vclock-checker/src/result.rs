//! Result types for log checkers.

use std::fmt;
use std::time::Duration;

/// The result of running one checker over a log.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the checker that produced this result.
    pub checker: String,
    /// The overall status of the check.
    pub status: CheckStatus,
    /// Every violation found (empty for passing checks).
    pub violations: Vec<Violation>,
    /// Time taken to perform the check.
    pub duration: Option<Duration>,
    /// Statistics about the checked log.
    pub stats: CheckStats,
}

impl CheckResult {
    /// Creates a result from the violations found; no violations means pass.
    pub fn from_violations(checker: impl Into<String>, violations: Vec<Violation>) -> Self {
        let status = if violations.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        Self {
            checker: checker.into(),
            status,
            violations,
            duration: None,
            stats: CheckStats::default(),
        }
    }

    /// Add the duration to this result.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Add statistics to this result.
    pub fn with_stats(mut self, stats: CheckStats) -> Self {
        self.stats = stats;
        self
    }

    /// Check if this result indicates the log passed.
    pub fn is_pass(&self) -> bool {
        matches!(self.status, CheckStatus::Pass)
    }

    /// Check if this result indicates a failure.
    pub fn is_fail(&self) -> bool {
        matches!(self.status, CheckStatus::Fail)
    }

    /// Returns true if any violation has the given kind.
    pub fn has_violation(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.checker, self.status)?;
        if let Some(duration) = self.duration {
            write!(f, " in {:?}", duration)?;
        }
        if !self.violations.is_empty() {
            write!(f, " ({} violations)", self.violations.len())?;
        }
        Ok(())
    }
}

/// The status of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// The log satisfies the property.
    Pass,
    /// The log violates the property.
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// The property a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The owner's entry did not rise by exactly one.
    OwnEntryNotAdvanced,
    /// A foreign entry changed outside a receive.
    ForeignEntryChanged,
    /// An entry went down.
    ClockRegressed,
    /// A receive has no send to pair with.
    UnmatchedReceive,
    /// A receive clock does not dominate the snapshot it received.
    ReceiveNotDominating,
    /// Causally ordered events whose clocks are not ordered.
    MissingOrder,
    /// Clocks ordered although the events are causally unrelated.
    SpuriousOrder,
}

/// A single broken property, pointing at the log entries involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// What was broken.
    pub kind: ViolationKind,
    /// Human-readable explanation.
    pub description: String,
    /// Sequence numbers of the entries involved.
    pub sequences: Vec<u64>,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, description: impl Into<String>, sequences: Vec<u64>) -> Self {
        Self {
            kind,
            description: description.into(),
            sequences,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {} (entries {:?})", self.kind, self.description, self.sequences)
    }
}

/// Statistics about a checked log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckStats {
    /// Number of log entries examined.
    pub entries: usize,
    /// Number of distinct processes in the log.
    pub processes: usize,
    /// Number of send/receive pairs matched.
    pub messages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_violations() {
        assert!(CheckResult::from_violations("x", vec![]).is_pass());

        let failed = CheckResult::from_violations(
            "x",
            vec![Violation::new(ViolationKind::ClockRegressed, "b went down", vec![3])],
        );
        assert!(failed.is_fail());
        assert!(failed.has_violation(ViolationKind::ClockRegressed));
        assert!(!failed.has_violation(ViolationKind::MissingOrder));
    }

    #[test]
    fn test_display() {
        let result = CheckResult::from_violations(
            "clock-progress",
            vec![Violation::new(ViolationKind::OwnEntryNotAdvanced, "a stalled", vec![1])],
        );
        assert_eq!(result.to_string(), "clock-progress: FAIL (1 violations)");
        assert_eq!(
            result.violations[0].to_string(),
            "OwnEntryNotAdvanced: a stalled (entries [1])"
        );
    }
}
