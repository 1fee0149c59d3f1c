//! JSON wire format exchanged over WebSocket text frames.
//!
//! ```json
//! { "name": "alice", "message": "hi", "timestamp": "2023-01-01T00:00:00.000Z", "type": "CHAT" }
//! ```
//!
//! Older servers send a bare `{"type": 0}` heartbeat; it decodes as a `PING`.

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{
    error::ClientError,
    message::{Message, MessageKind},
};

/// Numeric `type` used by the legacy heartbeat.
const LEGACY_PING_TYPE: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(deserialize_with = "deserialize_kind")]
    pub r#type: MessageKind,
}

impl WireMessage {
    /// Decode a raw text frame.
    pub fn decode(raw: &str) -> Result<Self, ClientError> {
        serde_json::from_str(raw).map_err(|e| ClientError::MalformedPayload(e.to_string()))
    }

    pub fn encode(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(|e| ClientError::MalformedPayload(e.to_string()))
    }
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<MessageKind, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawKind {
        Named(MessageKind),
        Legacy(u64),
    }

    match RawKind::deserialize(deserializer)? {
        RawKind::Named(kind) => Ok(kind),
        RawKind::Legacy(LEGACY_PING_TYPE) => Ok(MessageKind::Ping),
        RawKind::Legacy(other) => Err(de::Error::custom(format!(
            "unknown legacy message type {}",
            other
        ))),
    }
}

// ========================================
// DTO → Domain
// ========================================

impl From<WireMessage> for Message {
    fn from(dto: WireMessage) -> Self {
        Self {
            author: dto.name,
            body: dto.message,
            timestamp: dto.timestamp,
            kind: dto.r#type,
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            name: message.author.clone(),
            message: message.body.clone(),
            timestamp: message.timestamp.clone(),
            r#type: message.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_chat_message() {
        // テスト項目: CHAT メッセージがデコードされる
        // given (前提条件):
        let raw = r#"{"name":"alice","message":"hi","timestamp":"2023-01-01T00:00:00.000Z","type":"CHAT"}"#;

        // when (操作):
        let result = WireMessage::decode(raw);

        // then (期待する結果):
        let wire = result.unwrap();
        assert_eq!(wire.name, "alice");
        assert_eq!(wire.message, "hi");
        assert_eq!(wire.timestamp, "2023-01-01T00:00:00.000Z");
        assert_eq!(wire.r#type, MessageKind::Chat);
    }

    #[test]
    fn test_decode_user_count_type_name() {
        // テスト項目: USER_COUNT の type 名が正しく解釈される
        // given (前提条件):
        let raw = r#"{"name":"server","message":"5","timestamp":"","type":"USER_COUNT"}"#;

        // when (操作):
        let wire = WireMessage::decode(raw).unwrap();

        // then (期待する結果):
        assert_eq!(wire.r#type, MessageKind::UserCount);
    }

    #[test]
    fn test_decode_legacy_heartbeat() {
        // テスト項目: レガシー形式 {"type": 0} が PING としてデコードされる
        // given (前提条件):
        let raw = r#"{"type":0}"#;

        // when (操作):
        let wire = WireMessage::decode(raw).unwrap();

        // then (期待する結果):
        assert_eq!(wire.r#type, MessageKind::Ping);
        assert_eq!(wire.name, "");
        assert_eq!(wire.message, "");
    }

    #[test]
    fn test_decode_unknown_legacy_type_fails() {
        // テスト項目: 未知の数値 type はデコードエラーになる
        // given (前提条件):
        let raw = r#"{"type":7}"#;

        // when (操作):
        let result = WireMessage::decode(raw);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_unknown_type_name_fails() {
        // テスト項目: 未知の type 名はデコードエラーになる
        // given (前提条件):
        let raw = r#"{"name":"a","message":"b","timestamp":"","type":"SHOUT"}"#;

        // when (操作):
        let result = WireMessage::decode(raw);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_missing_type_fails() {
        // テスト項目: type フィールドがない JSON はデコードエラーになる
        // given (前提条件):
        let raw = r#"{"name":"alice","message":"hi"}"#;

        // when (操作):
        let result = WireMessage::decode(raw);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_plain_text_fails() {
        // テスト項目: JSON でない文字列はデコードエラーになる
        // given (前提条件):
        let raw = "hello";

        // when (操作):
        let result = WireMessage::decode(raw);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::MalformedPayload(_))));
    }

    #[test]
    fn test_encode_uses_wire_field_names() {
        // テスト項目: エンコード結果が name / message / timestamp / type を持つ
        // given (前提条件):
        let message = Message::chat("alice", "hi", "2023-01-01T00:00:00.000Z".to_string());

        // when (操作):
        let json = WireMessage::from(&message).encode().unwrap();

        // then (期待する結果):
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "alice");
        assert_eq!(value["message"], "hi");
        assert_eq!(value["timestamp"], "2023-01-01T00:00:00.000Z");
        assert_eq!(value["type"], "CHAT");
    }

    #[test]
    fn test_wire_message_to_domain() {
        // テスト項目: WireMessage がドメインの Message に変換される
        // given (前提条件):
        let wire = WireMessage {
            name: "bob".to_string(),
            message: "bye".to_string(),
            timestamp: "2023-01-01T00:00:00.000Z".to_string(),
            r#type: MessageKind::Leave,
        };

        // when (操作):
        let message: Message = wire.into();

        // then (期待する結果):
        assert_eq!(message.author, "bob");
        assert_eq!(message.body, "bye");
        assert_eq!(message.kind, MessageKind::Leave);
    }
}
