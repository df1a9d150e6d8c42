//! Causal graph of a logged run.
//!
//! Nodes are log entries. Edges come from program order (consecutive
//! entries of one process) and from messages (a send to the receive that
//! consumed it). Messages are paired per channel in FIFO order: the k-th
//! receive of process p on channel c consumed the k-th send on c made by
//! the other end.

use std::collections::{HashMap, HashSet, VecDeque};

use vclock_core::{ActionKind, ChannelId, LogEntry, ProcessId};

/// Causal graph over log indices.
pub(crate) struct CausalGraph {
    /// Direct causal edges: entry index -> entries it causally precedes.
    edges: Vec<Vec<usize>>,
    /// Matched (send, receive) pairs.
    pub(crate) messages: Vec<(usize, usize)>,
    /// Receives without a send to pair with.
    pub(crate) unmatched: Vec<usize>,
}

impl CausalGraph {
    /// Build a causal graph from log entries.
    pub(crate) fn build(log: &[LogEntry]) -> Self {
        let mut edges = vec![Vec::new(); log.len()];

        let mut last_of: HashMap<&ProcessId, usize> = HashMap::new();
        for (i, entry) in log.iter().enumerate() {
            if let Some(prev) = last_of.insert(&entry.process, i) {
                edges[prev].push(i);
            }
        }

        let mut sends: HashMap<&ChannelId, Vec<usize>> = HashMap::new();
        for (i, entry) in log.iter().enumerate() {
            if let (ActionKind::Send, Some(channel)) = (entry.kind, &entry.channel) {
                sends.entry(channel).or_default().push(i);
            }
        }

        let mut consumed: HashMap<(&ChannelId, &ProcessId), usize> = HashMap::new();
        let mut messages = Vec::new();
        let mut unmatched = Vec::new();
        for (i, entry) in log.iter().enumerate() {
            let (ActionKind::Receive, Some(channel)) = (entry.kind, &entry.channel) else {
                continue;
            };
            let taken = consumed.entry((channel, &entry.process)).or_insert(0);
            let send = sends
                .get(channel)
                .into_iter()
                .flatten()
                .filter(|&&s| log[s].process != entry.process)
                .nth(*taken);
            match send {
                Some(&s) => {
                    *taken += 1;
                    edges[s].push(i);
                    messages.push((s, i));
                }
                None => unmatched.push(i),
            }
        }

        Self {
            edges,
            messages,
            unmatched,
        }
    }

    /// Every entry reachable from `start`, excluding `start` itself.
    pub(crate) fn successors(&self, start: usize) -> HashSet<usize> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for &next in &self.edges[current] {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// Check if `from` causally precedes `to` (direct or transitive).
    #[cfg(test)]
    pub(crate) fn precedes(&self, from: usize, to: usize) -> bool {
        from != to && self.successors(from).contains(&to)
    }
}
