//! Inbound message classification.
//!
//! Every text frame is classified synchronously, in arrival order, into one
//! of three actions. Decoding never fails hard: anything that is not a wire
//! message becomes a visible `System` chat message.

use tsunagu_shared::time::Clock;

use crate::{
    dto::WireMessage,
    message::{Message, MessageKind},
};

/// What the session should do with an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// PING/PONG from the peer; diagnostic only
    Heartbeat(MessageKind),
    /// Replaces the user count wholesale
    UserCount(u64),
    /// Appended to the message log unchanged
    Append(Message),
}

/// Classify a raw inbound payload.
///
/// `clock` stamps the System fallback message; decoded messages keep the
/// timestamp they arrived with.
pub fn classify(raw: &str, clock: &dyn Clock) -> Inbound {
    let wire = match WireMessage::decode(raw) {
        Ok(wire) => wire,
        Err(e) => {
            tracing::debug!("{}; showing payload as a system message", e);
            return Inbound::Append(Message::system(raw, clock.now_iso8601()));
        }
    };

    match wire.r#type {
        kind if kind.is_heartbeat() => Inbound::Heartbeat(kind),
        MessageKind::UserCount => Inbound::UserCount(parse_user_count(&wire.message)),
        _ => Inbound::Append(wire.into()),
    }
}

/// Reads the leading integer of the body (`"5 users"` is 5). Bodies without
/// one, and negative counts, are 0.
fn parse_user_count(body: &str) -> u64 {
    let trimmed = body.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    unsigned[..digits_end].parse().unwrap_or_else(|_| {
        tracing::debug!("Invalid user count '{}', treating as 0", body);
        0
    })
}
