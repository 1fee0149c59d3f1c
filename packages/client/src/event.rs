//! Observable connection status and the events emitted to the UI layer.

use std::fmt;

use crate::message::Message;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Disconnected,
    /// Transport created, handshake pending
    Connecting,
    Connected,
    /// Terminal until the next explicit `connect()`
    ManuallyClosed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Disconnected => "disconnected",
            Status::Connecting => "connecting",
            Status::Connected => "connected",
            Status::ManuallyClosed => "closed",
        };
        f.write_str(label)
    }
}

/// Events delivered to the surrounding UI, in the order they occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    StatusChanged(Status),
    /// A message was appended to the message log
    Message(Message),
    UserCountChanged(u64),
}
