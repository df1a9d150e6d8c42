//! What a finished run hands back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use vclock_core::{EventLog, LogEntry, ProcessId, VectorClock};

/// Unique identifier for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new unique RunId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a run whose join returned.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The run.
    pub run_id: RunId,
    /// Final clock of every process that completed its script.
    pub final_clocks: BTreeMap<ProcessId, VectorClock>,
    /// Everything the processes logged.
    pub log: EventLog,
    /// Wall time from spawn to join.
    pub elapsed: Duration,
}

impl RunReport {
    /// Returns the final clock of a process, if it completed.
    pub fn clock_of(&self, process: &ProcessId) -> Option<&VectorClock> {
        self.final_clocks.get(process)
    }

    /// Returns true if `process` completed its script.
    pub fn completed(&self, process: &ProcessId) -> bool {
        self.final_clocks.contains_key(process)
    }

    /// Returns every log entry in observation order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.log.entries()
    }
}
