//! Runtime configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Knobs for a run. Every default reproduces the unbounded behavior: no
/// pacing, receives wait forever, the join waits forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Pause between two actions of a process, in milliseconds (0 = none).
    ///
    /// Only makes interleavings easier to watch; results never depend on it.
    pub action_delay_ms: u64,

    /// Give up on a single receive after this many milliseconds.
    pub receive_timeout_ms: Option<u64>,

    /// Stop waiting for processes after this many milliseconds.
    pub join_timeout_ms: Option<u64>,

    /// Capacity of the live event broadcast.
    pub event_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            action_delay_ms: 0,
            receive_timeout_ms: None,
            join_timeout_ms: None,
            event_buffer: 1024,
        }
    }
}

impl RuntimeConfig {
    /// Returns the pause between actions, if any.
    pub fn action_delay(&self) -> Option<Duration> {
        (self.action_delay_ms > 0).then(|| Duration::from_millis(self.action_delay_ms))
    }

    /// Returns the bound on a single receive, if any.
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the bound on the final join, if any.
    pub fn join_timeout(&self) -> Option<Duration> {
        self.join_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_unbounded() {
        let config = RuntimeConfig::default();

        assert_eq!(config.action_delay(), None);
        assert_eq!(config.receive_timeout(), None);
        assert_eq!(config.join_timeout(), None);
        assert_eq!(config.event_buffer, 1024);
    }

    #[test]
    fn test_durations() {
        let config = RuntimeConfig {
            action_delay_ms: 10,
            receive_timeout_ms: Some(250),
            join_timeout_ms: Some(5_000),
            event_buffer: 16,
        };

        assert_eq!(config.action_delay(), Some(Duration::from_millis(10)));
        assert_eq!(config.receive_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.join_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RuntimeConfig = toml::from_str("join_timeout_ms = 100").unwrap();

        assert_eq!(config.join_timeout_ms, Some(100));
        assert_eq!(config.action_delay_ms, 0);
        assert_eq!(config.event_buffer, 1024);
    }
}
