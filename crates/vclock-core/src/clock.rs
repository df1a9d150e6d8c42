//! Vector Clock - Logical time for causality tracking.
//!
//! A `VectorClock` is created with a fixed set of participants and keeps
//! exactly one counter per participant for its whole lifetime. A process
//! only ever increments its own entry; every other entry moves only through
//! `merge` with a clock received in a message.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigurationError;
use crate::ids::ProcessId;

/// A vector clock over a fixed set of processes.
///
/// # Causality Relationships
///
/// Given two clocks A and B:
/// - A **dominates** B if every entry of A is >= the matching entry of B
/// - A **happened-before** B if B dominates A and they differ
/// - A and B are **concurrent** if neither dominates the other
///
/// # Example
///
/// ```
/// use vclock_core::{ProcessId, VectorClock};
///
/// let a = ProcessId::new("a");
/// let b = ProcessId::new("b");
/// let mut clock_a = VectorClock::zeroed([a.clone(), b.clone()]);
/// let mut clock_b = clock_a.clone();
///
/// // A sends: increment, then ship a snapshot
/// clock_a.increment(&a).unwrap();
/// let sent = clock_a.clone();
///
/// // B receives: increment first, then merge
/// clock_b.increment(&b).unwrap();
/// clock_b.merge(&sent).unwrap();
///
/// assert_eq!(clock_b.to_string(), "[1, 1]");
/// assert!(sent.happened_before(&clock_b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    entries: BTreeMap<ProcessId, u64>,
}

impl VectorClock {
    /// Creates the all-zero clock with one entry per process.
    pub fn zeroed<I>(processes: I) -> Self
    where
        I: IntoIterator<Item = ProcessId>,
    {
        VectorClock {
            entries: processes.into_iter().map(|id| (id, 0)).collect(),
        }
    }

    /// Creates a vector clock from an iterator of (ProcessId, u64) pairs.
    pub fn from_entries<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (ProcessId, u64)>,
    {
        VectorClock {
            entries: iter.into_iter().collect(),
        }
    }

    /// Returns the counter for a process, or 0 if the clock does not track it.
    #[inline]
    pub fn get(&self, process: &ProcessId) -> u64 {
        self.entries.get(process).copied().unwrap_or(0)
    }

    /// Returns true if the clock has an entry for the process.
    #[inline]
    pub fn contains(&self, process: &ProcessId) -> bool {
        self.entries.contains_key(process)
    }

    /// Advances the owner's entry by exactly one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownProcess`] if the clock has no
    /// entry for `owner`; the clock is left untouched.
    pub fn increment(&mut self, owner: &ProcessId) -> Result<&VectorClock, ConfigurationError> {
        let counter = self
            .entries
            .get_mut(owner)
            .ok_or_else(|| ConfigurationError::UnknownProcess(owner.clone()))?;
        *counter = counter.saturating_add(1);
        Ok(self)
    }

    /// Takes the elementwise maximum with `other` over this clock's entries.
    ///
    /// Entries `other` tracks but this clock does not are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingEntry`] if `other` lacks any
    /// entry this clock has. Nothing is modified in that case.
    pub fn merge(&mut self, other: &VectorClock) -> Result<&VectorClock, ConfigurationError> {
        if let Some(missing) = self.entries.keys().find(|id| !other.contains(id)) {
            return Err(ConfigurationError::MissingEntry(missing.clone()));
        }

        for (id, value) in self.entries.iter_mut() {
            *value = (*value).max(other.get(id));
        }
        Ok(self)
    }

    /// Returns true if every entry of this clock is >= the matching entry of
    /// `other`. Entries absent on either side count as 0.
    pub fn dominates(&self, other: &VectorClock) -> bool {
        other
            .entries
            .iter()
            .all(|(id, &value)| self.get(id) >= value)
            && self.entries.iter().all(|(id, &value)| value >= other.get(id))
    }

    /// Returns true if this clock happened-before `other`: `other` dominates
    /// it and the two differ.
    #[inline]
    pub fn happened_before(&self, other: &VectorClock) -> bool {
        other.dominates(self) && !self.dominates(other)
    }

    /// Returns true if neither clock dominates the other.
    #[inline]
    pub fn concurrent_with(&self, other: &VectorClock) -> bool {
        !self.dominates(other) && !other.dominates(self)
    }

    /// Compares two clocks.
    ///
    /// Returns:
    /// - `Some(Ordering::Less)` if self happened-before other
    /// - `Some(Ordering::Greater)` if other happened-before self
    /// - `Some(Ordering::Equal)` if each dominates the other
    /// - `None` if the clocks are concurrent
    pub fn compare(&self, other: &VectorClock) -> Option<Ordering> {
        match (self.dominates(other), other.dominates(self)) {
            (true, true) => Some(Ordering::Equal),
            (false, true) => Some(Ordering::Less),
            (true, false) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }

    /// Returns the number of processes tracked by this clock.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if this clock tracks no process.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all (ProcessId, value) pairs in id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&ProcessId, &u64)> {
        self.entries.iter()
    }

    /// Returns the processes tracked by this clock in id order.
    #[inline]
    pub fn processes(&self) -> impl Iterator<Item = &ProcessId> {
        self.entries.keys()
    }

    /// Returns the counters in id order.
    pub fn values(&self) -> Vec<u64> {
        self.entries.values().copied().collect()
    }
}

impl PartialOrd for VectorClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

/// `[1, 0, 0]` by default, `{a:1, b:0, c:0}` with `{:#}`.
impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = if f.alternate() { ("{", "}") } else { ("[", "]") };
        f.write_str(open)?;
        for (i, (id, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if f.alternate() {
                write!(f, "{}:{}", id, value)?;
            } else {
                write!(f, "{}", value)?;
            }
        }
        f.write_str(close)
    }
}

impl<const N: usize> From<[(&str, u64); N]> for VectorClock {
    fn from(arr: [(&str, u64); N]) -> Self {
        VectorClock::from_entries(arr.into_iter().map(|(id, v)| (ProcessId::from(id), v)))
    }
}
