//! Orchestrator: wires the channels, spawns one task per process and waits
//! for all of them.
//!
//! Everything that can be rejected is rejected before the first task is
//! spawned: the topology is already validated, channels are opened and
//! every endpoint is claimed up front. After that, failures stay inside the
//! process that hit them. The join waits unconditionally unless
//! [`RuntimeConfig::join_timeout_ms`] is set, so a receive nobody ever
//! sends to keeps the run hanging.

use std::collections::BTreeMap;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

use vclock_core::{ChannelId, ConfigurationError, EventLog, ProcessId, VectorClock};

use crate::channel::Channel;
use crate::config::RuntimeConfig;
use crate::error::{ProcessError, Result, RunError};
use crate::process::{Process, ProcessOutcome, ProcessStates};
use crate::report::{RunId, RunReport};
use crate::topology::Topology;

type ProcessHandle = JoinHandle<std::result::Result<ProcessOutcome, ProcessError>>;

/// Runs a validated [`Topology`].
#[derive(Debug)]
pub struct Orchestrator {
    topology: Topology,
    config: RuntimeConfig,
    log: EventLog,
    states: ProcessStates,
}

impl Orchestrator {
    /// Creates an orchestrator with its own event log.
    pub fn new(topology: Topology, config: RuntimeConfig) -> Self {
        let log = EventLog::new(config.event_buffer);
        let states = ProcessStates::new(topology.processes());
        Self {
            topology,
            config,
            log,
            states,
        }
    }

    /// Returns a handle on the event log, usable while the run is going.
    pub fn event_log(&self) -> EventLog {
        self.log.clone()
    }

    /// Returns a handle on the process state table.
    pub fn states(&self) -> ProcessStates {
        self.states.clone()
    }

    /// Returns the topology being run.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Runs every process to completion.
    pub async fn run(self) -> Result<RunReport> {
        let run_id = RunId::new();
        let (channels, processes) = self.wire()?;

        info!(
            run_id = %run_id,
            processes = processes.len(),
            channels = channels.len(),
            "Starting run"
        );
        let started = Instant::now();

        let handles: Vec<(ProcessId, ProcessHandle)> = processes
            .into_iter()
            .map(|process| {
                let id = process.id().clone();
                let span = info_span!("process", id = %id);
                (id, tokio::spawn(process.run().instrument(span)))
            })
            .collect();

        let final_clocks = self.join(handles).await?;

        // Channels live until every process is done with them.
        drop(channels);

        let elapsed = started.elapsed();
        info!(
            run_id = %run_id,
            completed = final_clocks.len(),
            entries = self.log.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Run finished"
        );

        Ok(RunReport {
            run_id,
            final_clocks,
            log: self.log,
            elapsed,
        })
    }

    /// Opens every channel and builds every process with its endpoints.
    fn wire(&self) -> Result<(BTreeMap<ChannelId, Channel>, Vec<Process>)> {
        let mut channels = BTreeMap::new();
        for spec in self.topology.channels() {
            channels.insert(spec.id.clone(), Channel::open(spec.clone())?);
        }

        let initial = self.topology.initial_clock();
        let mut processes = Vec::with_capacity(self.topology.processes().len());
        for id in self.topology.processes() {
            let script = self.topology.script(id).unwrap_or_default().to_vec();
            // Each process gets its own copy of the starting clock.
            let mut process = Process::new(id.clone(), initial.clone(), script, self.log.clone())
                .with_states(self.states.clone())
                .with_action_delay(self.config.action_delay())
                .with_receive_timeout(self.config.receive_timeout());

            for spec in self.topology.channels_of(id) {
                let channel = channels
                    .get_mut(&spec.id)
                    .ok_or_else(|| ConfigurationError::UnknownChannel {
                        process: id.clone(),
                        channel: spec.id.clone(),
                    })?;
                process = process.with_endpoint(channel.claim(id)?);
            }
            processes.push(process);
        }

        Ok((channels, processes))
    }

    /// Joins the processes in declaration order.
    async fn join(
        &self,
        handles: Vec<(ProcessId, ProcessHandle)>,
    ) -> Result<BTreeMap<ProcessId, VectorClock>> {
        let deadline = self
            .config
            .join_timeout()
            .map(|limit| tokio::time::Instant::now() + limit);

        let mut final_clocks = BTreeMap::new();
        let mut handles = handles.into_iter();

        while let Some((id, mut handle)) = handles.next() {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        handle.abort();
                        let mut pending = vec![id];
                        for (id, handle) in handles {
                            if !handle.is_finished() {
                                pending.push(id);
                            }
                            handle.abort();
                        }
                        warn!(pending = ?pending, "Join deadline exceeded, aborting");
                        return Err(RunError::DeadlineExceeded {
                            pending,
                            waited_ms: self.config.join_timeout_ms.unwrap_or_default(),
                        });
                    }
                },
                None => handle.await,
            };

            match joined {
                Ok(Ok(outcome)) => {
                    final_clocks.insert(outcome.process, outcome.clock);
                }
                Ok(Err(e)) => {
                    error!(process = %id, error = %e, "Process aborted");
                }
                Err(e) => {
                    error!(process = %id, error = %e, "Process task panicked");
                }
            }
        }

        Ok(final_clocks)
    }
}
