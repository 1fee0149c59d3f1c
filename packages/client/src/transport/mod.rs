//! Transport abstraction around the platform WebSocket.
//!
//! ## 責務
//!
//! - `Connector`: 新しいトランスポートを生成する（接続は非同期に進行する）
//! - `TransportHandle`: 生成されたトランスポートへの送信・切断・状態確認
//! - `EventSink`: トランスポートのライフサイクルイベントを接続マネージャーへ通知
//!
//! ## 設計ノート
//!
//! `open` はブラウザの `new WebSocket(url)` と同様に即座にハンドルを返し、
//! ハンドシェイクの完了は `TransportEvent::Open` として後から届く。
//! イベントは生成時の世代番号付きで届くため、置き換え済みの古いトランスポート
//! からのイベントは接続マネージャー側で破棄できる。

use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use tokio::sync::mpsc;

use crate::error::ClientError;

#[cfg(test)]
pub(crate) mod fake;
pub mod websocket;

/// Readiness of a transport, mirroring the WebSocket `readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

/// Ready state shared between a handle and the task driving its socket.
#[derive(Debug, Clone)]
pub(crate) struct SharedReadyState(Arc<AtomicU8>);

impl SharedReadyState {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ReadyState::Connecting as u8)))
    }

    pub(crate) fn get(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: ReadyState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// Lifecycle events reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Open,
    /// Inbound text frame
    Frame(String),
    /// Transport fault; a `Closed` event normally follows
    Error(String),
    Closed,
}

/// Transport event tagged with the generation of the transport that produced it.
pub type TaggedTransportEvent = (u64, TransportEvent);

/// Channel through which a transport reports its lifecycle events.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<TaggedTransportEvent>,
}

impl EventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<TaggedTransportEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report an event. Returns `false` once the connection manager is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }
}

/// Creates transports.
#[cfg_attr(test, mockall::automock)]
pub trait Connector: Send + Sync {
    /// Start opening a transport to `url`.
    ///
    /// Must return immediately; the outcome of the handshake is reported
    /// through `events`.
    fn open(&self, url: &str, events: EventSink) -> Box<dyn TransportHandle>;
}

/// A single transport owned by the connection manager.
pub trait TransportHandle: Send {
    fn ready_state(&self) -> ReadyState;

    /// Queue a text frame for sending. Only valid while `Open`.
    fn send_text(&self, text: String) -> Result<(), ClientError>;

    /// Start closing the transport; `TransportEvent::Closed` follows.
    fn close(&mut self);
}
