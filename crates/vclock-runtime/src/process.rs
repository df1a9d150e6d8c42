//! Processes: sequential interpreters of a script over a private clock.
//!
//! A process owns its [`VectorClock`] outright. It was seeded from a copy
//! of the run's initial clock, nobody else holds a reference to it, and
//! foreign entries only change when a received snapshot is merged in.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use vclock_core::{
    Action, ChannelId, ConfigurationError, EventLog, LogEntry, Message, ProcessId, VectorClock,
};

use crate::channel::Endpoint;
use crate::error::ProcessError;

/// Lifecycle of a process. A process whose script fails stays `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessState {
    /// Created, not yet scheduled.
    NotStarted,
    /// Executing its script.
    Running,
    /// Every action executed.
    Completed,
}

/// Shared table of process states, observable while a run is in flight.
#[derive(Debug, Clone, Default)]
pub struct ProcessStates {
    inner: Arc<RwLock<BTreeMap<ProcessId, ProcessState>>>,
}

impl ProcessStates {
    /// Creates a table with every process `NotStarted`.
    pub fn new<'a>(processes: impl IntoIterator<Item = &'a ProcessId>) -> Self {
        let table = processes
            .into_iter()
            .map(|id| (id.clone(), ProcessState::NotStarted))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    /// Records a state change.
    pub async fn set(&self, process: &ProcessId, state: ProcessState) {
        self.inner.write().await.insert(process.clone(), state);
    }

    /// Returns the state of one process.
    pub async fn get(&self, process: &ProcessId) -> Option<ProcessState> {
        self.inner.read().await.get(process).copied()
    }

    /// Returns a copy of the whole table.
    pub async fn snapshot(&self) -> BTreeMap<ProcessId, ProcessState> {
        self.inner.read().await.clone()
    }

    /// Returns the processes that have not completed.
    pub async fn pending(&self) -> Vec<ProcessId> {
        self.inner
            .read()
            .await
            .iter()
            .filter(|(_, state)| **state != ProcessState::Completed)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// What a completed process leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// The process.
    pub process: ProcessId,
    /// Its clock after the last action.
    pub clock: VectorClock,
    /// How many actions it executed.
    pub actions: usize,
}

/// A process ready to run its script.
#[derive(Debug)]
pub struct Process {
    id: ProcessId,
    clock: VectorClock,
    script: Vec<Action>,
    endpoints: HashMap<ChannelId, Endpoint>,
    log: EventLog,
    states: ProcessStates,
    action_delay: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl Process {
    /// Creates a process starting from `initial`, which it takes ownership of.
    pub fn new(id: ProcessId, initial: VectorClock, script: Vec<Action>, log: EventLog) -> Self {
        Self {
            id,
            clock: initial,
            script,
            endpoints: HashMap::new(),
            log,
            states: ProcessStates::default(),
            action_delay: None,
            receive_timeout: None,
        }
    }

    /// Gives the process its end of a channel.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.insert(endpoint.channel().clone(), endpoint);
        self
    }

    /// Publishes lifecycle changes to a shared table.
    pub fn with_states(mut self, states: ProcessStates) -> Self {
        self.states = states;
        self
    }

    /// Pauses between actions.
    pub fn with_action_delay(mut self, delay: Option<Duration>) -> Self {
        self.action_delay = delay;
        self
    }

    /// Bounds every receive.
    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Returns the process id.
    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    /// Returns the current clock.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Runs the whole script, one action at a time.
    ///
    /// An error ends the process where it stands; its state is left at
    /// `Running`.
    pub async fn run(mut self) -> Result<ProcessOutcome, ProcessError> {
        self.states.set(&self.id, ProcessState::Running).await;
        info!(process = %self.id, "Process {} is running...", self.id);

        let script = std::mem::take(&mut self.script);
        for (i, action) in script.iter().enumerate() {
            if i > 0 {
                if let Some(delay) = self.action_delay {
                    tokio::time::sleep(delay).await;
                }
            }
            self.execute(action).await?;
        }

        info!(process = %self.id, clock = %self.clock, "Process {}: {}", self.id, self.clock);
        self.states.set(&self.id, ProcessState::Completed).await;

        Ok(ProcessOutcome {
            process: self.id,
            clock: self.clock,
            actions: script.len(),
        })
    }

    /// Executes a single action and logs its result.
    pub async fn execute(&mut self, action: &Action) -> Result<LogEntry, ProcessError> {
        match action {
            Action::Event => {
                self.clock.increment(&self.id)?;
            }
            Action::Send(channel) => {
                let endpoint = self.endpoints.get(channel).ok_or_else(|| {
                    ConfigurationError::UnownedEndpoint {
                        process: self.id.clone(),
                        channel: channel.clone(),
                    }
                })?;
                self.clock.increment(&self.id)?;
                endpoint.send(Message::snapshot(&self.clock));
            }
            Action::Receive(channel) => {
                let endpoint = self.endpoints.get_mut(channel).ok_or_else(|| {
                    ConfigurationError::UnownedEndpoint {
                        process: self.id.clone(),
                        channel: channel.clone(),
                    }
                })?;
                self.clock.increment(&self.id)?;

                debug!(process = %self.id, channel = %channel, "waiting for message");
                let message = match self.receive_timeout {
                    Some(limit) => endpoint.receive_timeout(limit).await?,
                    None => endpoint.receive().await?,
                };

                let own = self.clock.get(&self.id);
                let reported = message.clock().get(&self.id);
                if reported > own {
                    warn!(
                        process = %self.id,
                        channel = %channel,
                        own,
                        reported,
                        "received snapshot is ahead of the receiver's own entry"
                    );
                }
                self.clock.merge(message.clock())?;
            }
        }

        Ok(self.log.append(
            self.id.clone(),
            action.kind(),
            action.channel().cloned(),
            self.clock.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Channel, ChannelSpec};
    use vclock_core::ActionKind;

    fn pid(name: &str) -> ProcessId {
        ProcessId::new(name)
    }

    fn initial() -> VectorClock {
        VectorClock::zeroed([pid("a"), pid("b"), pid("c")])
    }

    #[tokio::test]
    async fn test_local_events_only_advance_owner() {
        let log = EventLog::default();
        let process = Process::new(pid("c"), initial(), vec![Action::Event; 3], log.clone());

        let outcome = process.run().await.unwrap();

        assert_eq!(outcome.clock, VectorClock::from([("a", 0), ("b", 0), ("c", 3)]));
        assert_eq!(outcome.actions, 3);
        let owned: Vec<u64> = log
            .entries()
            .iter()
            .map(|e| e.clock.get(&pid("c")))
            .collect();
        assert_eq!(owned, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_send_then_receive_merges() {
        let log = EventLog::default();
        let mut channel = Channel::open(ChannelSpec::new("ab", "a", "b")).unwrap();
        let seed = VectorClock::zeroed([pid("a"), pid("b")]);

        let sender = Process::new(pid("a"), seed.clone(), vec![Action::send("ab")], log.clone())
            .with_endpoint(channel.claim(&pid("a")).unwrap());
        let receiver = Process::new(pid("b"), seed, vec![Action::receive("ab")], log.clone())
            .with_endpoint(channel.claim(&pid("b")).unwrap());

        let sent = sender.run().await.unwrap();
        let received = receiver.run().await.unwrap();

        assert_eq!(sent.clock, VectorClock::from([("a", 1), ("b", 0)]));
        assert_eq!(received.clock, VectorClock::from([("a", 1), ("b", 1)]));

        let kinds: Vec<ActionKind> = log.entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Send, ActionKind::Receive]);
    }

    #[tokio::test]
    async fn test_receive_increments_before_waiting() {
        let mut channel = Channel::open(ChannelSpec::new("ab", "a", "b")).unwrap();
        let peer = channel.claim(&pid("a")).unwrap();
        let seed = VectorClock::zeroed([pid("a"), pid("b")]);
        let mut receiver = Process::new(pid("b"), seed, vec![], EventLog::default())
            .with_endpoint(channel.claim(&pid("b")).unwrap());

        // Sender is far ahead; the receiver's own entry still advances by one.
        peer.send(Message::snapshot(&VectorClock::from([("a", 5), ("b", 0)])));
        let entry = receiver.execute(&Action::receive("ab")).await.unwrap();

        assert_eq!(entry.clock, VectorClock::from([("a", 5), ("b", 1)]));
    }

    #[tokio::test]
    async fn test_merge_adopts_larger_foreign_view_of_own_entry() {
        let mut channel = Channel::open(ChannelSpec::new("ab", "a", "b")).unwrap();
        let peer = channel.claim(&pid("a")).unwrap();
        let seed = VectorClock::zeroed([pid("a"), pid("b")]);
        let mut receiver = Process::new(pid("b"), seed, vec![], EventLog::default())
            .with_endpoint(channel.claim(&pid("b")).unwrap());

        peer.send(Message::snapshot(&VectorClock::from([("a", 1), ("b", 4)])));
        let entry = receiver.execute(&Action::receive("ab")).await.unwrap();

        assert_eq!(entry.clock.get(&pid("b")), 4);
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_configuration_error() {
        let mut process = Process::new(pid("a"), initial(), vec![], EventLog::default());

        let err = process.execute(&Action::send("ab")).await.unwrap_err();

        assert!(matches!(
            err,
            ProcessError::Configuration(ConfigurationError::UnownedEndpoint { .. })
        ));
        // Nothing happened to the clock.
        assert_eq!(process.clock(), &initial());
    }

    #[tokio::test]
    async fn test_unknown_owner_is_configuration_error() {
        let mut process = Process::new(pid("z"), initial(), vec![], EventLog::default());

        let err = process.execute(&Action::Event).await.unwrap_err();

        assert!(matches!(
            err,
            ProcessError::Configuration(ConfigurationError::UnknownProcess(_))
        ));
    }

    #[tokio::test]
    async fn test_receive_timeout_ends_process() {
        let mut channel = Channel::open(ChannelSpec::new("ab", "a", "b")).unwrap();
        let states = ProcessStates::new([&pid("b")]);
        let process = Process::new(
            pid("b"),
            VectorClock::zeroed([pid("a"), pid("b")]),
            vec![Action::receive("ab")],
            EventLog::default(),
        )
        .with_endpoint(channel.claim(&pid("b")).unwrap())
        .with_states(states.clone())
        .with_receive_timeout(Some(Duration::from_millis(20)));

        let err = process.run().await.unwrap_err();

        assert!(matches!(err, ProcessError::Channel(_)));
        assert_eq!(states.get(&pid("b")).await, Some(ProcessState::Running));
    }

    #[tokio::test]
    async fn test_states_follow_lifecycle() {
        let states = ProcessStates::new([&pid("a")]);
        assert_eq!(states.get(&pid("a")).await, Some(ProcessState::NotStarted));

        Process::new(pid("a"), initial(), vec![Action::Event], EventLog::default())
            .with_states(states.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(states.get(&pid("a")).await, Some(ProcessState::Completed));
        assert!(states.pending().await.is_empty());
    }
}
