//! Session state fed by classified inbound messages.

use crate::{classifier::Inbound, event::ClientEvent, message::Message};

/// Per-connection session state.
///
/// `message_log` is append-only in arrival order; `user_count` is only ever
/// overwritten by `USER_COUNT` messages.
#[derive(Debug, Clone, Default)]
pub struct Session {
    username: String,
    user_count: u64,
    message_log: Vec<Message>,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Replace the username. Returns `false` (and keeps the old name) when
    /// the trimmed name is empty.
    pub fn rename(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.username = name.to_string();
        true
    }

    pub fn user_count(&self) -> u64 {
        self.user_count
    }

    pub fn message_log(&self) -> &[Message] {
        &self.message_log
    }

    /// Apply a classified inbound message, returning the event to emit.
    pub fn apply(&mut self, inbound: Inbound) -> Option<ClientEvent> {
        match inbound {
            Inbound::Heartbeat(kind) => {
                tracing::trace!("Received heartbeat {:?}", kind);
                None
            }
            Inbound::UserCount(count) => {
                self.user_count = count;
                Some(ClientEvent::UserCountChanged(count))
            }
            Inbound::Append(message) => {
                self.message_log.push(message.clone());
                Some(ClientEvent::Message(message))
            }
        }
    }
}
