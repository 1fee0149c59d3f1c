//! Interactive terminal client.

use std::sync::{Arc, RwLock};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    connection::ChatClient,
    event::ClientEvent,
    formatter::MessageFormatter,
    input::{Input, parse_input},
    transport::websocket::WebSocketConnector,
    ui::{prompt, redisplay_prompt},
};

/// Username shared between the async side and the readline thread.
type SharedName = Arc<RwLock<String>>;

fn current_name(name: &SharedName) -> String {
    name.read().map(|name| name.clone()).unwrap_or_default()
}

/// Run the interactive chat client until the user quits.
pub async fn run_client(config: ClientConfig, url: String) -> Result<(), Box<dyn std::error::Error>> {
    let name: SharedName = Arc::new(RwLock::new(config.username.clone()));
    let (client, mut events) = ChatClient::start(config, url, Arc::new(WebSocketConnector));
    client.connect()?;

    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Type /help for commands.\n",
        current_name(&name)
    );

    // Print connection events as they arrive
    let name_for_events = name.clone();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let username = current_name(&name_for_events);
            let formatted = match event {
                ClientEvent::StatusChanged(status) => MessageFormatter::format_status(status),
                ClientEvent::Message(message) => {
                    MessageFormatter::format_message(&message, &username)
                }
                ClientEvent::UserCountChanged(count) => MessageFormatter::format_user_count(count),
            };
            print!("{}", formatted);
            redisplay_prompt(&username);
        }
    });

    // Chat lines are sent one at a time, in the order they were typed. A send may
    // wait for the handshake while input keeps being read.
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel::<String>();
    let sender = tokio::spawn(send_chat_lines(client.clone(), outgoing_rx, name.clone()));

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let name_for_prompt = name.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt(&current_name(&name_for_prompt))) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                        if input_tx.send(line).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        let Some(input) = parse_input(&line) else {
            continue;
        };

        match input {
            Input::Chat(text) => {
                if outgoing_tx.send(text).is_err() {
                    break;
                }
            }
            Input::Rename(new_name) => {
                client.rename(new_name.as_str())?;
                if let Ok(mut name) = name.write() {
                    *name = new_name;
                }
            }
            Input::Users => {
                let snapshot = client.snapshot().await?;
                println!(
                    "{}[{}]",
                    MessageFormatter::format_user_count(snapshot.user_count),
                    snapshot.status
                );
            }
            Input::Connect => client.connect()?,
            Input::Disconnect => client.disconnect()?,
            Input::Help => println!("{}", MessageFormatter::format_help()),
            Input::Quit => break,
            Input::Invalid(reason) => println!("{}", reason),
        }
    }

    client.disconnect()?;
    sender.abort();
    printer.abort();
    tracing::info!("Client session ended");

    Ok(())
}

async fn send_chat_lines(
    client: ChatClient,
    mut lines: mpsc::UnboundedReceiver<String>,
    name: SharedName,
) {
    while let Some(text) = lines.recv().await {
        if let Err(e) = client.send(text).await {
            print!("{}", MessageFormatter::format_send_error(&e));
            redisplay_prompt(&current_name(&name));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{message::MessageKind, transport::fake::FakeConnector};

    #[tokio::test(start_paused = true)]
    async fn test_chat_lines_are_sent_in_typed_order() {
        // テスト項目: ハンドシェイク待ちの間に入力された複数行が、入力順に JOIN の後で送信される
        // given (前提条件):
        let connector = FakeConnector::default();
        let (client, _events) = ChatClient::start(
            ClientConfig::new("alice"),
            "ws://chat.test/ws",
            Arc::new(connector.clone()),
        );
        client.connect().unwrap();
        client.snapshot().await.unwrap();
        let socket = connector.last();
        let name: SharedName = Arc::new(RwLock::new("alice".to_string()));
        let (lines_tx, lines_rx) = mpsc::unbounded_channel();
        let sender = tokio::spawn(send_chat_lines(client.clone(), lines_rx, name));

        // when (操作):
        for line in ["one", "two", "three"] {
            lines_tx.send(line.to_string()).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
        socket.accept();
        drop(lines_tx);
        sender.await.unwrap();

        // then (期待する結果):
        let sent = socket.sent();
        let kinds: Vec<MessageKind> = sent.iter().map(|m| m.r#type).collect();
        let bodies: Vec<&str> = sent[1..].iter().map(|m| m.message.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                MessageKind::Join,
                MessageKind::Chat,
                MessageKind::Chat,
                MessageKind::Chat
            ]
        );
        assert_eq!(bodies, vec!["one", "two", "three"]);
    }
}
