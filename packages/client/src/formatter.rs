//! Message formatting utilities for terminal display.

use tsunagu_shared::time::iso8601_to_local_time;

use crate::{
    error::ClientError,
    event::Status,
    message::{Message, MessageKind},
};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a logged message
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    /// * `current_username` - The local username (to mark own messages as "me")
    pub fn format_message(message: &Message, current_username: &str) -> String {
        let time = iso8601_to_local_time(&message.timestamp);
        match message.kind {
            MessageKind::Chat => {
                let me_suffix = if message.author == current_username {
                    " (me)"
                } else {
                    ""
                };
                format!(
                    "\n[{}] @{}{}: {}\n",
                    time, message.author, me_suffix, message.body
                )
            }
            MessageKind::Join => format!("\n+ {} ({})\n", message.body, time),
            MessageKind::Leave => format!("\n- {} ({})\n", message.body, time),
            MessageKind::Error => format!("\n! {}: {}\n", message.author, message.body),
            // Control messages never reach the log; shown raw if they do.
            MessageKind::UserCount | MessageKind::Ping | MessageKind::Pong => {
                format!("\n← {:?}: {}\n", message.kind, message.body)
            }
        }
    }

    pub fn format_status(status: Status) -> String {
        let hint = match status {
            Status::Connecting => " ...",
            Status::Disconnected => " (retrying shortly)",
            Status::Connected | Status::ManuallyClosed => "",
        };
        format!("\n[{}{}]\n", status, hint)
    }

    pub fn format_user_count(count: u64) -> String {
        let noun = if count == 1 { "user" } else { "users" };
        format!("\n{} {} online\n", count, noun)
    }

    pub fn format_send_error(error: &ClientError) -> String {
        format!("\n✗ Message not sent: {}\n", error)
    }

    pub fn format_help() -> String {
        [
            "",
            "Commands:",
            "  /name <new name>  change your username",
            "  /users            show how many users are online",
            "  /connect          reconnect after /disconnect",
            "  /disconnect       close the connection",
            "  /help             show this help",
            "  /quit             exit",
            "",
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(author: &str, body: &str, kind: MessageKind) -> Message {
        Message::new(author, body, "2023-01-01T00:00:00.000Z", kind)
    }

    #[test]
    fn test_format_chat_message_from_other() {
        // テスト項目: 他者のチャットメッセージが正しくフォーマットされる
        // given (前提条件):
        let msg = message("bob", "Hello, world!", MessageKind::Chat);

        // when (操作):
        let result = MessageFormatter::format_message(&msg, "alice");

        // then (期待する結果):
        assert!(result.contains("@bob: Hello, world!"));
        assert!(!result.contains("(me)"));
    }

    #[test]
    fn test_format_own_chat_message_is_marked() {
        // テスト項目: 自分のチャットメッセージには (me) が付く
        // given (前提条件):
        let msg = message("alice", "hi", MessageKind::Chat);

        // when (操作):
        let result = MessageFormatter::format_message(&msg, "alice");

        // then (期待する結果):
        assert!(result.contains("@alice (me): hi"));
    }

    #[test]
    fn test_format_join_and_leave() {
        // テスト項目: 参加・退出通知が + / - で表示される
        // given (前提条件):
        let joined = message("bob", "bob joined the chat", MessageKind::Join);
        let left = message("bob", "bob left the chat", MessageKind::Leave);

        // when (操作):
        let joined_result = MessageFormatter::format_message(&joined, "alice");
        let left_result = MessageFormatter::format_message(&left, "alice");

        // then (期待する結果):
        assert!(joined_result.contains("+ bob joined the chat"));
        assert!(left_result.contains("- bob left the chat"));
    }

    #[test]
    fn test_format_error_message() {
        // テスト項目: ERROR メッセージが ! 付きで表示される
        // given (前提条件):
        let msg = message("server", "name taken", MessageKind::Error);

        // when (操作):
        let result = MessageFormatter::format_message(&msg, "alice");

        // then (期待する結果):
        assert!(result.contains("! server: name taken"));
    }

    #[test]
    fn test_format_message_with_unparseable_timestamp() {
        // テスト項目: タイムスタンプが不正でもそのまま表示される
        // given (前提条件):
        let msg = Message::new("bob", "hi", "sometime", MessageKind::Chat);

        // when (操作):
        let result = MessageFormatter::format_message(&msg, "alice");

        // then (期待する結果):
        assert!(result.contains("[sometime]"));
    }

    #[test]
    fn test_format_status() {
        // テスト項目: 接続状態が表示される
        // given (前提条件):

        // when (操作):
        let connected = MessageFormatter::format_status(Status::Connected);
        let disconnected = MessageFormatter::format_status(Status::Disconnected);

        // then (期待する結果):
        assert!(connected.contains("[connected]"));
        assert!(disconnected.contains("disconnected"));
        assert!(disconnected.contains("retrying"));
    }

    #[test]
    fn test_format_user_count_pluralizes() {
        // テスト項目: ユーザー数に応じて単数形・複数形が切り替わる
        // given (前提条件):

        // when (操作):
        let one = MessageFormatter::format_user_count(1);
        let many = MessageFormatter::format_user_count(5);

        // then (期待する結果):
        assert!(one.contains("1 user online"));
        assert!(many.contains("5 users online"));
    }

    #[test]
    fn test_format_send_error() {
        // テスト項目: 送信エラーの内容が表示される
        // given (前提条件):
        let error = ClientError::ConnectionTimeout { attempts: 10 };

        // when (操作):
        let result = MessageFormatter::format_send_error(&error);

        // then (期待する結果):
        assert!(result.contains("not sent"));
        assert!(result.contains("10 attempts"));
    }
}
