//! Happens-before characterization.
//!
//! Vector clocks characterize causality exactly: `e` reaches `f` in the
//! causal graph if and only if `clock(e) < clock(f)`, and causally
//! unrelated events have concurrent clocks.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::debug;
use vclock_core::{LogEntry, ProcessId};

use crate::graph::CausalGraph;
use crate::result::{CheckResult, CheckStats, Violation, ViolationKind};
use crate::traits::Checker;

/// Compares clock order with causal-graph reachability for every pair of
/// log entries.
#[derive(Debug, Clone, Default)]
pub struct HappensBeforeChecker;

impl HappensBeforeChecker {
    /// Create a new happens-before checker.
    pub fn new() -> Self {
        Self
    }
}

impl Checker for HappensBeforeChecker {
    fn name(&self) -> &str {
        "happens-before"
    }

    fn description(&self) -> &str {
        "Checks that clock order matches causal order for every pair of events"
    }

    fn check(&self, log: &[LogEntry]) -> CheckResult {
        let start = Instant::now();
        let graph = CausalGraph::build(log);
        let reach: Vec<_> = (0..log.len()).map(|i| graph.successors(i)).collect();
        let mut violations = Vec::new();

        for (i, e) in log.iter().enumerate() {
            for (j, f) in log.iter().enumerate().skip(i + 1) {
                let forward = reach[i].contains(&j);
                let backward = reach[j].contains(&i);

                let (before, after, ordered) = if forward {
                    (e, f, true)
                } else if backward {
                    (f, e, true)
                } else {
                    (e, f, false)
                };

                if ordered && !before.clock.happened_before(&after.clock) {
                    violations.push(Violation::new(
                        ViolationKind::MissingOrder,
                        format!(
                            "{} at {:#} causally precedes {} at {:#} but the clocks are not ordered",
                            before.process, before.clock, after.process, after.clock
                        ),
                        vec![before.sequence, after.sequence],
                    ));
                } else if !ordered && !e.clock.concurrent_with(&f.clock) {
                    violations.push(Violation::new(
                        ViolationKind::SpuriousOrder,
                        format!(
                            "{} at {:#} and {} at {:#} are causally unrelated but the clocks are ordered",
                            e.process, e.clock, f.process, f.clock
                        ),
                        vec![e.sequence, f.sequence],
                    ));
                }
            }
        }

        debug!(
            entries = log.len(),
            violations = violations.len(),
            "Compared clock order with causal order"
        );

        let processes: BTreeSet<&ProcessId> = log.iter().map(|e| &e.process).collect();
        CheckResult::from_violations(self.name(), violations)
            .with_duration(start.elapsed())
            .with_stats(CheckStats {
                entries: log.len(),
                processes: processes.len(),
                messages: graph.messages.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vclock_core::{ActionKind, ChannelId, EventLog, VectorClock};

    fn append(log: &EventLog, process: &str, kind: ActionKind, clock: [(&str, u64); 2]) {
        let channel = (kind != ActionKind::LocalEvent).then(|| ChannelId::new("ab"));
        log.append(ProcessId::new(process), kind, channel, VectorClock::from(clock));
    }

    #[test]
    fn test_causal_and_concurrent_events() {
        let log = EventLog::default();
        append(&log, "a", ActionKind::Send, [("a", 1), ("b", 0)]);
        append(&log, "b", ActionKind::LocalEvent, [("a", 0), ("b", 1)]);
        append(&log, "b", ActionKind::Receive, [("a", 1), ("b", 2)]);

        let result = HappensBeforeChecker::new().check(&log.entries());

        assert!(result.is_pass(), "{:?}", result.violations);
        assert_eq!(result.stats.messages, 1);
    }

    #[test]
    fn test_missing_order() {
        let log = EventLog::default();
        append(&log, "a", ActionKind::Send, [("a", 1), ("b", 0)]);
        // The receive forgot to merge.
        append(&log, "b", ActionKind::Receive, [("a", 0), ("b", 1)]);

        let result = HappensBeforeChecker::new().check(&log.entries());

        assert!(result.has_violation(ViolationKind::MissingOrder));
    }

    #[test]
    fn test_spurious_order() {
        let log = EventLog::default();
        append(&log, "a", ActionKind::LocalEvent, [("a", 1), ("b", 0)]);
        // b claims to have seen a's event without any message.
        append(&log, "b", ActionKind::LocalEvent, [("a", 1), ("b", 1)]);

        let result = HappensBeforeChecker::new().check(&log.entries());

        assert!(result.has_violation(ViolationKind::SpuriousOrder));
        assert_eq!(result.violations[0].sequences, vec![0, 1]);
    }
}
