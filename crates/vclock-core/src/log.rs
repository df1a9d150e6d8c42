//! Event log - the ordered, append-only record of a run.
//!
//! Processes append concurrently through cloned [`EventLog`] handles. Each
//! append takes the inner lock once, so an entry is assigned its sequence
//! number and stored atomically; no ordering is promised across processes
//! beyond the order in which appends were observed.
//!
//! Live observers can [`subscribe`](EventLog::subscribe) to a broadcast of
//! new entries. A subscriber that falls behind the buffer loses the oldest
//! broadcasts (`RecvError::Lagged`); the log itself keeps everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::info;

use crate::action::ActionKind;
use crate::clock::VectorClock;
use crate::ids::{ChannelId, ProcessId};

/// One observed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in observation order, starting at 0.
    pub sequence: u64,
    /// The process that performed the action.
    pub process: ProcessId,
    /// What kind of action it was.
    pub kind: ActionKind,
    /// The channel used by a send or receive.
    pub channel: Option<ChannelId>,
    /// The process clock right after the action.
    pub clock: VectorClock,
    /// Wall-clock time of the append. Informational only.
    pub recorded_at: DateTime<Utc>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ActionKind::LocalEvent => {
                write!(f, "Event happened in process {}: {}", self.process, self.clock)
            }
            ActionKind::Send => write!(
                f,
                "Message has been sent from process {}: {}",
                self.process, self.clock
            ),
            ActionKind::Receive => write!(
                f,
                "Message has been received at process {}: {}",
                self.process, self.clock
            ),
        }
    }
}

/// Shared, append-only event log.
#[derive(Clone)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    tx: broadcast::Sender<LogEntry>,
}

impl EventLog {
    /// Creates an empty log whose live broadcast buffers `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            tx,
        }
    }

    /// Appends an entry and returns it with its sequence number.
    pub fn append(
        &self,
        process: ProcessId,
        kind: ActionKind,
        channel: Option<ChannelId>,
        clock: VectorClock,
    ) -> LogEntry {
        let entry = {
            let mut entries = self.lock();
            let entry = LogEntry {
                sequence: entries.len() as u64,
                process,
                kind,
                channel,
                clock,
                recorded_at: Utc::now(),
            };
            entries.push(entry.clone());
            entry
        };

        info!(
            sequence = entry.sequence,
            process = %entry.process,
            kind = %entry.kind,
            "{}",
            entry
        );

        // No subscribers is fine.
        let _ = self.tx.send(entry.clone());
        entry
    }

    /// Subscribes to entries appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }

    /// Returns a copy of every entry in observation order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Returns the entries of one process, in its program order.
    pub fn for_process(&self, process: &ProcessId) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|entry| &entry.process == process)
            .cloned()
            .collect()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing was logged yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serializes every entry as a pretty JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        // A panicking appender cannot leave a half-written entry behind.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(values: [(&str, u64); 3]) -> VectorClock {
        VectorClock::from(values)
    }

    #[test]
    fn test_append_assigns_sequence_numbers() {
        let log = EventLog::default();

        let first = log.append(
            ProcessId::new("a"),
            ActionKind::LocalEvent,
            None,
            clock([("a", 1), ("b", 0), ("c", 0)]),
        );
        let second = log.append(
            ProcessId::new("b"),
            ActionKind::Send,
            Some(ChannelId::new("bc")),
            clock([("a", 0), ("b", 1), ("c", 0)]),
        );

        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.for_process(&ProcessId::new("b")), vec![second]);
    }

    #[test]
    fn test_entry_display_lines() {
        let log = EventLog::default();
        let values = clock([("a", 1), ("b", 0), ("c", 0)]);

        let event = log.append(ProcessId::new("a"), ActionKind::LocalEvent, None, values.clone());
        let sent = log.append(
            ProcessId::new("a"),
            ActionKind::Send,
            Some(ChannelId::new("ab")),
            values.clone(),
        );
        let received = log.append(
            ProcessId::new("a"),
            ActionKind::Receive,
            Some(ChannelId::new("ab")),
            values,
        );

        assert_eq!(event.to_string(), "Event happened in process a: [1, 0, 0]");
        assert_eq!(sent.to_string(), "Message has been sent from process a: [1, 0, 0]");
        assert_eq!(
            received.to_string(),
            "Message has been received at process a: [1, 0, 0]"
        );
    }

    #[test]
    fn test_concurrent_appends_keep_every_entry() {
        let log = EventLog::new(8);
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        log.append(
                            ProcessId::new(format!("p{t}")),
                            ActionKind::LocalEvent,
                            None,
                            VectorClock::default(),
                        );
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 1000);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.sequence, i as u64);
        }
    }

    #[tokio::test]
    async fn test_subscribe_sees_new_entries() {
        let log = EventLog::new(16);
        let mut rx = log.subscribe();

        log.append(ProcessId::new("c"), ActionKind::LocalEvent, None, VectorClock::default());

        let entry = rx.recv().await.expect("entry should be broadcast");
        assert_eq!(entry.process, ProcessId::new("c"));
        assert_eq!(entry.kind, ActionKind::LocalEvent);
    }

    #[test]
    fn test_to_json() {
        let log = EventLog::default();
        log.append(
            ProcessId::new("a"),
            ActionKind::Send,
            Some(ChannelId::new("ab")),
            VectorClock::from([("a", 1)]),
        );

        let json = log.to_json().unwrap();
        let decoded: Vec<LogEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, log.entries());
        assert!(json.contains("\"kind\": \"send\""));
    }
}
