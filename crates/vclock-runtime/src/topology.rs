//! Run topology: the processes, the channels between them and the script
//! each process executes.
//!
//! A [`Topology`] can only be obtained through validation, either from the
//! [`TopologyBuilder`] or from a deserialized [`TopologySpec`], so a run
//! never starts from a description that references unknown processes or
//! channels a process has no end of.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use vclock_core::{Action, ChannelId, ConfigurationError, ProcessId, VectorClock};

use crate::channel::ChannelSpec;

/// Serializable description of a run, as found in configuration files.
///
/// ```toml
/// processes = ["a", "b"]
///
/// [[channels]]
/// id = "ab"
/// endpoints = ["a", "b"]
///
/// [scripts]
/// a = ["send ab"]
/// b = ["receive ab"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySpec {
    /// Participating processes, in declaration order.
    pub processes: Vec<ProcessId>,

    /// Channel declarations.
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,

    /// Script of each process.
    #[serde(default)]
    pub scripts: BTreeMap<ProcessId, Vec<Action>>,
}

impl TopologySpec {
    /// Validates the description and turns it into a [`Topology`].
    pub fn build(self) -> Result<Topology, ConfigurationError> {
        if self.processes.is_empty() {
            return Err(ConfigurationError::EmptyTopology);
        }

        let mut declared = BTreeSet::new();
        for process in &self.processes {
            if !declared.insert(process.clone()) {
                return Err(ConfigurationError::DuplicateProcess(process.clone()));
            }
        }

        let mut channels: BTreeMap<ChannelId, &ChannelSpec> = BTreeMap::new();
        for channel in &self.channels {
            if channels.insert(channel.id.clone(), channel).is_some() {
                return Err(ConfigurationError::DuplicateChannel(channel.id.clone()));
            }
            if let Some(unknown) = channel.endpoints.iter().find(|end| !declared.contains(*end)) {
                return Err(ConfigurationError::UnknownEndpoint {
                    channel: channel.id.clone(),
                    process: unknown.clone(),
                });
            }
        }

        let scripted: BTreeSet<ProcessId> = self.scripts.keys().cloned().collect();
        if scripted != declared {
            return Err(ConfigurationError::ProcessSetMismatch {
                unscripted: declared.difference(&scripted).cloned().collect(),
                undeclared: scripted.difference(&declared).cloned().collect(),
            });
        }

        for (process, script) in &self.scripts {
            for channel_id in script.iter().filter_map(Action::channel) {
                let channel =
                    channels
                        .get(channel_id)
                        .ok_or_else(|| ConfigurationError::UnknownChannel {
                            process: process.clone(),
                            channel: channel_id.clone(),
                        })?;
                if !channel.connects(process) {
                    return Err(ConfigurationError::UnownedEndpoint {
                        process: process.clone(),
                        channel: channel_id.clone(),
                    });
                }
            }
        }

        Ok(Topology {
            processes: self.processes,
            channels: self.channels,
            scripts: self.scripts,
        })
    }
}

/// A validated topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    processes: Vec<ProcessId>,
    channels: Vec<ChannelSpec>,
    scripts: BTreeMap<ProcessId, Vec<Action>>,
}

impl Topology {
    /// Creates a new topology builder.
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::default()
    }

    /// Returns the processes in declaration order.
    pub fn processes(&self) -> &[ProcessId] {
        &self.processes
    }

    /// Returns the channel declarations.
    pub fn channels(&self) -> &[ChannelSpec] {
        &self.channels
    }

    /// Returns the script of a process.
    pub fn script(&self, process: &ProcessId) -> Option<&[Action]> {
        self.scripts.get(process).map(Vec::as_slice)
    }

    /// Returns the channels that have `process` as one of their ends.
    pub fn channels_of<'a>(
        &'a self,
        process: &'a ProcessId,
    ) -> impl Iterator<Item = &'a ChannelSpec> + 'a {
        self.channels.iter().filter(move |c| c.connects(process))
    }

    /// Returns the all-zero clock every process starts from.
    pub fn initial_clock(&self) -> VectorClock {
        VectorClock::zeroed(self.processes.iter().cloned())
    }

    /// Returns the total number of scripted actions.
    pub fn action_count(&self) -> usize {
        self.scripts.values().map(Vec::len).sum()
    }

    /// Converts back into the serializable description.
    pub fn to_spec(&self) -> TopologySpec {
        TopologySpec {
            processes: self.processes.clone(),
            channels: self.channels.clone(),
            scripts: self.scripts.clone(),
        }
    }
}

/// Builder for [`Topology`].
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    spec: TopologySpec,
}

impl TopologyBuilder {
    /// Declares a process.
    pub fn process(mut self, id: impl Into<ProcessId>) -> Self {
        self.spec.processes.push(id.into());
        self
    }

    /// Declares several processes.
    pub fn processes<I, P>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProcessId>,
    {
        self.spec.processes.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Declares a channel between two processes.
    pub fn channel(
        mut self,
        id: impl Into<ChannelId>,
        first: impl Into<ProcessId>,
        second: impl Into<ProcessId>,
    ) -> Self {
        self.spec.channels.push(ChannelSpec::new(id, first, second));
        self
    }

    /// Sets the script of a process, replacing any earlier one.
    pub fn script(mut self, id: impl Into<ProcessId>, actions: Vec<Action>) -> Self {
        self.spec.scripts.insert(id.into(), actions);
        self
    }

    /// Validates and builds the topology.
    pub fn build(self) -> Result<Topology, ConfigurationError> {
        self.spec.build()
    }
}
