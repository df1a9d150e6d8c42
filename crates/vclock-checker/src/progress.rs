//! Per-process clock progress.
//!
//! Within one process every action advances the owner's entry by exactly
//! one. Foreign entries never move except on a receive, and then only
//! upwards. This is also what keeps two processes isolated from each
//! other: nothing leaks into a clock except through a merge.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use vclock_core::{ActionKind, LogEntry, ProcessId, VectorClock};

use crate::result::{CheckResult, CheckStats, Violation, ViolationKind};
use crate::traits::Checker;

/// Checks that every process clock moves the way the update protocol says.
#[derive(Debug, Clone, Default)]
pub struct ClockProgressChecker;

impl ClockProgressChecker {
    /// Create a new clock progress checker.
    pub fn new() -> Self {
        Self
    }
}

impl Checker for ClockProgressChecker {
    fn name(&self) -> &str {
        "clock-progress"
    }

    fn description(&self) -> &str {
        "Checks that each action advances its owner's entry by one and foreign entries only on receive"
    }

    fn check(&self, log: &[LogEntry]) -> CheckResult {
        let start = Instant::now();
        let mut violations = Vec::new();
        let mut previous: HashMap<&ProcessId, &VectorClock> = HashMap::new();

        for entry in log {
            let owner = &entry.process;
            let prev_own = previous.get(owner).map_or(0, |clock| clock.get(owner));
            let own = entry.clock.get(owner);
            if own != prev_own + 1 {
                violations.push(Violation::new(
                    ViolationKind::OwnEntryNotAdvanced,
                    format!("{} went from {} to {} on its own entry", owner, prev_own, own),
                    vec![entry.sequence],
                ));
            }

            // A process starts from all zeros.
            let prev = previous.get(owner).copied();
            for (id, &value) in entry.clock.iter().filter(|(id, _)| *id != owner) {
                let before = prev.map_or(0, |clock| clock.get(id));
                if value < before {
                    violations.push(Violation::new(
                        ViolationKind::ClockRegressed,
                        format!("{}'s view of {} went down from {} to {}", owner, id, before, value),
                        vec![entry.sequence],
                    ));
                } else if value > before && entry.kind != ActionKind::Receive {
                    violations.push(Violation::new(
                        ViolationKind::ForeignEntryChanged,
                        format!(
                            "{}'s view of {} moved on a {} from {} to {}",
                            owner, id, entry.kind, before, value
                        ),
                        vec![entry.sequence],
                    ));
                }
            }

            previous.insert(owner, &entry.clock);
        }

        let processes: BTreeSet<&ProcessId> = log.iter().map(|e| &e.process).collect();
        CheckResult::from_violations(self.name(), violations)
            .with_duration(start.elapsed())
            .with_stats(CheckStats {
                entries: log.len(),
                processes: processes.len(),
                messages: 0,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vclock_core::{ChannelId, EventLog};

    fn append(log: &EventLog, process: &str, kind: ActionKind, clock: [(&str, u64); 2]) {
        let channel = (kind != ActionKind::LocalEvent).then(|| ChannelId::new("ab"));
        log.append(ProcessId::new(process), kind, channel, VectorClock::from(clock));
    }

    #[test]
    fn test_well_formed_log_passes() {
        let log = EventLog::default();
        append(&log, "a", ActionKind::LocalEvent, [("a", 1), ("b", 0)]);
        append(&log, "a", ActionKind::Send, [("a", 2), ("b", 0)]);
        append(&log, "b", ActionKind::Receive, [("a", 2), ("b", 1)]);

        let result = ClockProgressChecker::new().check(&log.entries());

        assert!(result.is_pass(), "{:?}", result.violations);
        assert_eq!(result.stats.entries, 3);
        assert_eq!(result.stats.processes, 2);
    }

    #[test]
    fn test_skipped_own_entry() {
        let log = EventLog::default();
        append(&log, "a", ActionKind::LocalEvent, [("a", 1), ("b", 0)]);
        append(&log, "a", ActionKind::LocalEvent, [("a", 3), ("b", 0)]);

        let result = ClockProgressChecker::new().check(&log.entries());

        assert!(result.has_violation(ViolationKind::OwnEntryNotAdvanced));
        assert_eq!(result.violations[0].sequences, vec![1]);
    }

    #[test]
    fn test_foreign_entry_moving_without_receive() {
        let log = EventLog::default();
        append(&log, "a", ActionKind::Send, [("a", 1), ("b", 2)]);

        let result = ClockProgressChecker::new().check(&log.entries());

        assert!(result.has_violation(ViolationKind::ForeignEntryChanged));
    }

    #[test]
    fn test_regression() {
        let log = EventLog::default();
        append(&log, "b", ActionKind::Receive, [("a", 3), ("b", 1)]);
        append(&log, "b", ActionKind::Receive, [("a", 2), ("b", 2)]);

        let result = ClockProgressChecker::new().check(&log.entries());

        assert!(result.has_violation(ViolationKind::ClockRegressed));
    }
}
