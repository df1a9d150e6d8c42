//! Messages exchanged over channels.

use serde::{Deserialize, Serialize};

use crate::clock::VectorClock;

/// An immutable snapshot of the sender's clock taken at the instant of
/// sending. Timing metadata is the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    clock: VectorClock,
}

impl Message {
    /// Snapshots a clock.
    pub fn snapshot(clock: &VectorClock) -> Self {
        Self {
            clock: clock.clone(),
        }
    }

    /// Returns the carried clock.
    #[inline]
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Consumes the message, returning the carried clock.
    #[inline]
    pub fn into_clock(self) -> VectorClock {
        self.clock
    }
}
