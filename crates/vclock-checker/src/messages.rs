//! Message causality: every receive dominates the snapshot it consumed.

use std::collections::BTreeSet;
use std::time::Instant;

use vclock_core::{LogEntry, ProcessId};

use crate::graph::CausalGraph;
use crate::result::{CheckResult, CheckStats, Violation, ViolationKind};
use crate::traits::Checker;

/// Pairs sends with receives and checks each receive clock dominates the
/// clock logged at the matching send.
#[derive(Debug, Clone, Default)]
pub struct MessageCausalityChecker;

impl MessageCausalityChecker {
    /// Create a new message causality checker.
    pub fn new() -> Self {
        Self
    }
}

impl Checker for MessageCausalityChecker {
    fn name(&self) -> &str {
        "message-causality"
    }

    fn description(&self) -> &str {
        "Checks that every receive is matched by a send and dominates the sent snapshot"
    }

    fn check(&self, log: &[LogEntry]) -> CheckResult {
        let start = Instant::now();
        let graph = CausalGraph::build(log);
        let mut violations = Vec::new();

        for &i in &graph.unmatched {
            let entry = &log[i];
            violations.push(Violation::new(
                ViolationKind::UnmatchedReceive,
                format!(
                    "{} received on {} with no matching send",
                    entry.process,
                    entry.channel.as_ref().map(|c| c.as_str()).unwrap_or("?")
                ),
                vec![entry.sequence],
            ));
        }

        for &(s, r) in &graph.messages {
            let (sent, received) = (&log[s], &log[r]);
            if !received.clock.dominates(&sent.clock) {
                violations.push(Violation::new(
                    ViolationKind::ReceiveNotDominating,
                    format!(
                        "{} received {:#} from {} but ended at {:#}",
                        received.process, sent.clock, sent.process, received.clock
                    ),
                    vec![sent.sequence, received.sequence],
                ));
            }
        }

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
