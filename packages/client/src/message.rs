//! Chat message value type.

use serde::{Deserialize, Serialize};

/// Author used for messages synthesized from undecodable payloads.
pub const SYSTEM_AUTHOR: &str = "System";

/// Body carried by outbound heartbeats.
pub const PING_BODY: &str = "ping";

/// Kind of a chat message, as carried in the wire `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Chat,
    Join,
    Leave,
    Error,
    UserCount,
    Ping,
    Pong,
}

impl MessageKind {
    /// Keep-alive control messages that never reach the message log.
    pub fn is_heartbeat(self) -> bool {
        matches!(self, MessageKind::Ping | MessageKind::Pong)
    }
}

/// A chat message.
///
/// Produced either by the local user (outbound) or by the classifier
/// (inbound). Messages are never mutated after construction; the session log
/// only hands out clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub author: String,
    pub body: String,
    /// ISO-8601 timestamp
    pub timestamp: String,
    pub kind: MessageKind,
}

impl Message {
    pub fn new(
        author: impl Into<String>,
        body: impl Into<String>,
        timestamp: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            timestamp: timestamp.into(),
            kind,
        }
    }

    pub fn chat(author: &str, body: impl Into<String>, timestamp: String) -> Self {
        Self::new(author, body, timestamp, MessageKind::Chat)
    }

    /// Announcement of `username`, sent on open and after a rename.
    pub fn join(username: &str, timestamp: String) -> Self {
        Self::new(
            username,
            format!("{} joined the chat", username),
            timestamp,
            MessageKind::Join,
        )
    }

    pub fn ping(username: &str, timestamp: String) -> Self {
        Self::new(username, PING_BODY, timestamp, MessageKind::Ping)
    }

    /// Fallback for payloads that are not valid wire messages.
    pub fn system(raw: impl Into<String>, timestamp: String) -> Self {
        Self::new(SYSTEM_AUTHOR, raw, timestamp, MessageKind::Chat)
    }
}
