//! Process and channel identification types.
//!
//! Both identifiers are plain names chosen by whoever describes the
//! topology (`"a"`, `"b"`, `"ab"`, ...). They order lexically, which is the
//! order vector clock entries are stored and printed in.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a process taking part in a run.
///
/// Every process owns exactly one entry in every vector clock of the run.
///
/// # Examples
///
/// ```
/// use vclock_core::ProcessId;
///
/// let process = ProcessId::new("a");
/// assert_eq!(process.as_str(), "a");
/// assert_eq!(process.to_string(), "a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    /// Creates a new ProcessId from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name of the process.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ProcessId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for ProcessId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a point-to-point channel.
///
/// # Examples
///
/// ```
/// use vclock_core::ChannelId;
///
/// let channel = ChannelId::new("ab");
/// assert_eq!(channel.to_string(), "ab");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Creates a new ChannelId from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name of the channel.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for ChannelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
