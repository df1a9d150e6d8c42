//! Script actions.
//!
//! A process script is an ordered `Vec<Action>`. Configuration files use the
//! text form: `event`, `send <channel>`, `receive <channel>` (or `recv`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;
use crate::ids::ChannelId;

/// One step of a process script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    /// A local event: only the owner's counter advances.
    Event,
    /// Advance, then ship a snapshot of the clock over the channel.
    Send(ChannelId),
    /// Advance, wait for the next message on the channel, then merge it.
    Receive(ChannelId),
}

impl Action {
    /// Creates a send action.
    pub fn send(channel: impl Into<ChannelId>) -> Self {
        Self::Send(channel.into())
    }

    /// Creates a receive action.
    pub fn receive(channel: impl Into<ChannelId>) -> Self {
        Self::Receive(channel.into())
    }

    /// Returns the kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Event => ActionKind::LocalEvent,
            Action::Send(_) => ActionKind::Send,
            Action::Receive(_) => ActionKind::Receive,
        }
    }

    /// Returns the channel this action uses, if any.
    pub fn channel(&self) -> Option<&ChannelId> {
        match self {
            Action::Event => None,
            Action::Send(channel) | Action::Receive(channel) => Some(channel),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Event => f.write_str("event"),
            Action::Send(channel) => write!(f, "send {}", channel),
            Action::Receive(channel) => write!(f, "receive {}", channel),
        }
    }
}

impl FromStr for Action {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts
            .next()
            .ok_or_else(|| ConfigurationError::invalid_action(s, "empty action"))?;
        let channel = parts.next();
        if parts.next().is_some() {
            return Err(ConfigurationError::invalid_action(s, "too many words"));
        }

        match (verb.to_ascii_lowercase().as_str(), channel) {
            ("event", None) => Ok(Action::Event),
            ("event", Some(_)) => Err(ConfigurationError::invalid_action(
                s,
                "event takes no channel",
            )),
            ("send", Some(channel)) => Ok(Action::send(channel)),
            ("receive" | "recv", Some(channel)) => Ok(Action::receive(channel)),
            ("send" | "receive" | "recv", None) => Err(ConfigurationError::invalid_action(
                s,
                "missing channel",
            )),
            _ => Err(ConfigurationError::invalid_action(s, "unknown action kind")),
        }
    }
}

impl TryFrom<String> for Action {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.to_string()
    }
}

/// The kind of a logged action, without its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Local event.
    LocalEvent,
    /// Message sent.
    Send,
    /// Message received.
    Receive,
}

impl ActionKind {
    /// Returns the human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::LocalEvent => "local event",
            ActionKind::Send => "send",
            ActionKind::Receive => "receive",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!("event".parse::<Action>().unwrap(), Action::Event);
        assert_eq!("send ab".parse::<Action>().unwrap(), Action::send("ab"));
        assert_eq!("receive bc".parse::<Action>().unwrap(), Action::receive("bc"));
        assert_eq!("  RECV  bc ".parse::<Action>().unwrap(), Action::receive("bc"));
    }

    #[test]
    fn test_parse_rejects_malformed_actions() {
        for input in ["", "send", "event ab", "jump ab", "send ab extra"] {
            let err = input.parse::<Action>().unwrap_err();
            assert!(
                matches!(err, ConfigurationError::InvalidAction { .. }),
                "{input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_kind_and_channel() {
        assert_eq!(Action::Event.kind(), ActionKind::LocalEvent);
        assert_eq!(Action::Event.channel(), None);
        assert_eq!(Action::send("ab").kind(), ActionKind::Send);
        assert_eq!(Action::receive("ab").channel(), Some(&ChannelId::new("ab")));
    }

    #[test]
    fn test_serde_uses_text_form() {
        let script = vec![Action::send("ab"), Action::Event, Action::receive("ab")];
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, r#"["send ab","event","receive ab"]"#);

        let decoded: Vec<Action> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, script);

        assert!(serde_json::from_str::<Action>("\"fly\"").is_err());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ActionKind::LocalEvent.to_string(), "local event");
        assert_eq!(ActionKind::Send.to_string(), "send");
        assert_eq!(ActionKind::Receive.to_string(), "receive");
    }
}
