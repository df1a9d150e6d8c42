//! Point-to-point channels.
//!
//! A channel joins exactly two processes. Like a pipe, it hands out one
//! [`Endpoint`] per side and each side can both send and receive; every
//! direction is its own unbounded FIFO lane, so order is preserved per
//! direction and `send` never waits.
//!
//! The [`Channel`] value keeps a sender for each lane alive. While it
//! exists a receive on an empty lane simply waits, even after the peer has
//! finished, which is how an unmatched receive stays blocked for the whole
//! run instead of failing.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use vclock_core::{ChannelError, ChannelId, ChannelMisuseError, Message, ProcessId};

/// Declaration of a channel and its two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Channel name.
    pub id: ChannelId,
    /// The two processes joined by the channel.
    pub endpoints: [ProcessId; 2],
}

impl ChannelSpec {
    /// Creates a channel declaration.
    pub fn new(
        id: impl Into<ChannelId>,
        first: impl Into<ProcessId>,
        second: impl Into<ProcessId>,
    ) -> Self {
        Self {
            id: id.into(),
            endpoints: [first.into(), second.into()],
        }
    }

    /// Returns true if the process is one of the two ends.
    pub fn connects(&self, process: &ProcessId) -> bool {
        self.endpoints.contains(process)
    }

    /// Returns the other end, if `process` is one of the ends.
    pub fn peer_of(&self, process: &ProcessId) -> Option<&ProcessId> {
        match &self.endpoints {
            [first, second] if first == process => Some(second),
            [first, second] if second == process => Some(first),
            _ => None,
        }
    }
}

/// One process's end of a channel.
#[derive(Debug)]
pub struct Endpoint {
    channel: ChannelId,
    owner: ProcessId,
    peer: ProcessId,
    outbound: mpsc::UnboundedSender<Message>,
    inbound: mpsc::UnboundedReceiver<Message>,
}

impl Endpoint {
    /// Returns the channel this endpoint belongs to.
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Returns the process holding this endpoint.
    pub fn owner(&self) -> &ProcessId {
        &self.owner
    }

    /// Returns the process at the other end.
    pub fn peer(&self) -> &ProcessId {
        &self.peer
    }

    /// Queues a message for the peer. Never waits.
    ///
    /// If the peer's endpoint is already gone, nobody can ever read the
    /// message and it is discarded.
    pub fn send(&self, message: Message) {
        if self.outbound.send(message).is_err() {
            debug!(
                channel = %self.channel,
                from = %self.owner,
                to = %self.peer,
                "peer endpoint dropped, message discarded"
            );
        }
    }

    /// Waits for the next message from the peer, in send order.
    pub async fn receive(&mut self) -> Result<Message, ChannelError> {
        self.inbound
            .recv()
            .await
            .ok_or_else(|| ChannelError::Disconnected(self.channel.clone()))
    }

    /// Like [`receive`](Self::receive), but gives up after `limit`.
    pub async fn receive_timeout(&mut self, limit: Duration) -> Result<Message, ChannelError> {
        match tokio::time::timeout(limit, self.receive()).await {
            Ok(result) => result,
            Err(_) => Err(ChannelError::TimedOut {
                channel: self.channel.clone(),
                waited_ms: limit.as_millis() as u64,
            }),
        }
    }
}

/// An open channel whose endpoints have not all been claimed yet.
#[derive(Debug)]
pub struct Channel {
    spec: ChannelSpec,
    ends: [Option<Endpoint>; 2],
    // Keeps both lanes open for as long as the channel lives.
    _lanes: [mpsc::UnboundedSender<Message>; 2],
}

impl Channel {
    /// Opens the two lanes of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelMisuseError::SelfLoop`] if both ends name the same
    /// process.
    pub fn open(spec: ChannelSpec) -> Result<Self, ChannelMisuseError> {
        let [first, second] = spec.endpoints.clone();
        if first == second {
            return Err(ChannelMisuseError::SelfLoop {
                channel: spec.id,
                process: first,
            });
        }

        // Lane i carries messages addressed to endpoint i.
        let (to_first, first_inbound) = mpsc::unbounded_channel();
        let (to_second, second_inbound) = mpsc::unbounded_channel();

        let lanes = [to_first.clone(), to_second.clone()];
        let first_end = Endpoint {
            channel: spec.id.clone(),
            owner: first.clone(),
            peer: second.clone(),
            outbound: to_second,
            inbound: first_inbound,
        };
        let second_end = Endpoint {
            channel: spec.id.clone(),
            owner: second,
            peer: first,
            outbound: to_first,
            inbound: second_inbound,
        };

        Ok(Self {
            spec,
            ends: [Some(first_end), Some(second_end)],
            _lanes: lanes,
        })
    }

    /// Returns the channel name.
    pub fn id(&self) -> &ChannelId {
        &self.spec.id
    }

    /// Returns the declaration this channel was opened from.
    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    /// Hands out the endpoint belonging to `process`. Each end can be
    /// claimed once.
    pub fn claim(&mut self, process: &ProcessId) -> Result<Endpoint, ChannelMisuseError> {
        let index = self
            .spec
            .endpoints
            .iter()
            .position(|end| end == process)
            .ok_or_else(|| ChannelMisuseError::NotAnEndpoint {
                channel: self.spec.id.clone(),
                process: process.clone(),
            })?;

        self.ends[index]
            .take()
            .ok_or_else(|| ChannelMisuseError::EndpointAlreadyBound {
                channel: self.spec.id.clone(),
                process: process.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vclock_core::VectorClock;

    fn message(a: u64, b: u64) -> Message {
        Message::snapshot(&VectorClock::from([("a", a), ("b", b)]))
    }

    fn open_ab() -> (Channel, Endpoint, Endpoint) {
        let mut channel = Channel::open(ChannelSpec::new("ab", "a", "b")).unwrap();
        let a = channel.claim(&ProcessId::new("a")).unwrap();
        let b = channel.claim(&ProcessId::new("b")).unwrap();
        (channel, a, b)
    }

    #[test]
    fn test_spec_peer_of() {
        let spec = ChannelSpec::new("ab", "a", "b");

        assert_eq!(spec.peer_of(&ProcessId::new("a")), Some(&ProcessId::new("b")));
        assert_eq!(spec.peer_of(&ProcessId::new("b")), Some(&ProcessId::new("a")));
        assert_eq!(spec.peer_of(&ProcessId::new("c")), None);
        assert!(spec.connects(&ProcessId::new("a")));
    }

    #[tokio::test]
    async fn test_fifo_per_direction() {
        let (_channel, a, mut b) = open_ab();

        a.send(message(1, 0));
        a.send(message(2, 0));
        a.send(message(3, 0));

        for expected in 1..=3 {
            let received = b.receive().await.unwrap();
            assert_eq!(received.clock().get(&ProcessId::new("a")), expected);
        }
    }

    #[tokio::test]
    async fn test_both_directions_are_independent() {
        let (_channel, mut a, mut b) = open_ab();

        a.send(message(1, 0));
        b.send(message(0, 1));

        assert_eq!(b.receive().await.unwrap(), message(1, 0));
        assert_eq!(a.receive().await.unwrap(), message(0, 1));
        assert_eq!(a.peer(), &ProcessId::new("b"));
        assert_eq!(b.owner(), &ProcessId::new("b"));
    }

    #[tokio::test]
    async fn test_receive_waits_while_channel_lives() {
        let (_channel, a, mut b) = open_ab();
        drop(a);

        let waited = tokio::time::timeout(Duration::from_millis(50), b.receive()).await;
        assert!(waited.is_err(), "receive should still be waiting");
    }

    #[tokio::test]
    async fn test_receive_after_channel_dropped_is_disconnected() {
        let (channel, a, mut b) = open_ab();
        drop(a);
        drop(channel);

        assert_eq!(
            b.receive().await.unwrap_err(),
            ChannelError::Disconnected(ChannelId::new("ab"))
        );
    }

    #[tokio::test]
    async fn test_send_to_dropped_peer_is_discarded() {
        let (_channel, a, b) = open_ab();
        drop(b);

        a.send(message(1, 0));
    }

    #[tokio::test]
    async fn test_receive_timeout() {
        let (_channel, _a, mut b) = open_ab();

        let err = b.receive_timeout(Duration::from_millis(20)).await.unwrap_err();
        assert_eq!(
            err,
            ChannelError::TimedOut {
                channel: ChannelId::new("ab"),
                waited_ms: 20,
            }
        );
    }

    #[test]
    fn test_claim_twice_is_misuse() {
        let mut channel = Channel::open(ChannelSpec::new("ab", "a", "b")).unwrap();
        let _a = channel.claim(&ProcessId::new("a")).unwrap();

        let err = channel.claim(&ProcessId::new("a")).unwrap_err();
        assert!(matches!(err, ChannelMisuseError::EndpointAlreadyBound { .. }));

        let err = channel.claim(&ProcessId::new("c")).unwrap_err();
        assert!(matches!(err, ChannelMisuseError::NotAnEndpoint { .. }));
    }

    #[test]
    fn test_self_loop_is_misuse() {
        let err = Channel::open(ChannelSpec::new("aa", "a", "a")).unwrap_err();
        assert_eq!(
            err,
            ChannelMisuseError::SelfLoop {
                channel: ChannelId::new("aa"),
                process: ProcessId::new("a"),
            }
        );
    }
}
