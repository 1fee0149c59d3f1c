//! WebSocket を使った Connector 実装
//!
//! ## 責務
//!
//! - tokio-tungstenite による接続の確立
//! - 受信フレームを `TransportEvent::Frame` として通知
//! - `UnboundedSender` 経由で受け取った送信テキストを WebSocket へ書き込み
//!
//! 1 つのトランスポートにつき 1 つのタスクが接続から切断までを担当し、
//! 終了時には必ず `TransportEvent::Closed` を通知する。

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::error::ClientError;

use super::{Connector, EventSink, ReadyState, SharedReadyState, TransportEvent, TransportHandle};

/// Opens transports with tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn open(&self, url: &str, events: EventSink) -> Box<dyn TransportHandle> {
        let state = SharedReadyState::new();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();

        tokio::spawn(socket_loop(
            url.to_string(),
            state.clone(),
            outgoing_rx,
            close_rx,
            events,
        ));

        Box::new(WebSocketTransport {
            state,
            outgoing: outgoing_tx,
            close: Some(close_tx),
        })
    }
}

/// Handle to a socket driven by [`socket_loop`].
pub struct WebSocketTransport {
    state: SharedReadyState,
    outgoing: mpsc::UnboundedSender<String>,
    close: Option<oneshot::Sender<()>>,
}

impl TransportHandle for WebSocketTransport {
    fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    fn send_text(&self, text: String) -> Result<(), ClientError> {
        if self.state.get() != ReadyState::Open {
            return Err(ClientError::TransportError(format!(
                "cannot send while {:?}",
                self.state.get()
            )));
        }
        self.outgoing
            .send(text)
            .map_err(|e| ClientError::TransportError(e.to_string()))
    }

    fn close(&mut self) {
        if let Some(close) = self.close.take() {
            if self.state.get() != ReadyState::Closed {
                self.state.set(ReadyState::Closing);
            }
            // The socket task may already have finished.
            let _ = close.send(());
        }
    }
}

async fn socket_loop(
    url: String,
    state: SharedReadyState,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    mut close: oneshot::Receiver<()>,
    events: EventSink,
) {
    let connected = tokio::select! {
        result = connect_async(url.as_str()) => result,
        _ = &mut close => {
            tracing::debug!("Transport to {} closed during handshake", url);
            state.set(ReadyState::Closed);
            events.emit(TransportEvent::Closed);
            return;
        }
    };

    let ws_stream = match connected {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            state.set(ReadyState::Closed);
            events.emit(TransportEvent::Error(e.to_string()));
            events.emit(TransportEvent::Closed);
            return;
        }
    };

    state.set(ReadyState::Open);
    events.emit(TransportEvent::Open);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    events.emit(TransportEvent::Frame(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!("Ignoring {} bytes of binary data", data.len());
                }
                Some(Ok(Message::Close(_))) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                // Control frames are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    events.emit(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            },
            text = outgoing.recv() => match text {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        events.emit(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => break,
            },
            _ = &mut close => {
                state.set(ReadyState::Closing);
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!("Failed to send close frame: {}", e);
                }
                break;
            }
        }
    }

    state.set(ReadyState::Closed);
    events.emit(TransportEvent::Closed);
}
