//! Connection manager.
//!
//! ## 責務
//!
//! - トランスポートを 1 つだけ所有し、状態遷移を管理する
//!   (Disconnected → Connecting → Connected → ManuallyClosed | Disconnected)
//! - 接続中のハートビート送信、予期しない切断後の再接続
//! - 送信時のレディネス待ち（一定間隔のポーリングを上限回数まで）
//!
//! ## 設計ノート
//!
//! 状態はすべて 1 つのタスク (`ConnectionManager::run`) が所有する。
//! ユーザーコマンド・トランスポートイベント・タイマー発火はそれぞれチャネル経由で届き、
//! 1 件ずつ最後まで処理される。ロックは不要。
//!
//! タイマーは世代番号（トランスポート）またはトークン（再接続）付きで発火するため、
//! 置き換え済みの接続に属する古いタイマーは現在の状態に影響しない。

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};
use tsunagu_shared::time::{Clock, SystemClock};

use crate::{
    classifier::classify,
    config::ClientConfig,
    dto::WireMessage,
    error::ClientError,
    event::{ClientEvent, Status},
    message::Message,
    session::Session,
    transport::{
        Connector, EventSink, ReadyState, TaggedTransportEvent, TransportEvent, TransportHandle,
    },
};

/// `tokio::time::interval` rejects a zero period.
const MIN_HEARTBEAT_PERIOD: Duration = Duration::from_millis(1);

enum Command {
    Connect,
    Disconnect,
    Rename(String),
    /// Stamp a chat message with the current username and time
    Compose {
        text: String,
        reply: oneshot::Sender<Message>,
    },
    /// One readiness check of the send gate
    Deliver {
        message: Message,
        reply: oneshot::Sender<Delivery>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

enum Timer {
    Heartbeat { generation: u64 },
    Reconnect { token: u64 },
}

enum Delivery {
    Sent,
    NotReady,
    NoTransport,
}

/// Point-in-time view of the connection and session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: Status,
    pub url: String,
    pub username: String,
    pub user_count: u64,
    pub messages: Vec<Message>,
    pub heartbeat_active: bool,
    pub reconnect_pending: bool,
}

/// Handle to a connection manager task.
///
/// Cloning the handle shares the same connection. When every handle is
/// dropped the manager stops and closes its transport.
///
/// # Example
///
/// ```ignore
/// let (client, mut events) = ChatClient::start(
///     ClientConfig::new("alice"),
///     "ws://127.0.0.1:8080/ws",
///     Arc::new(WebSocketConnector),
/// );
/// client.connect()?;
/// client.send("hello").await?;
///
/// while let Some(event) = events.recv().await {
///     match event {
///         ClientEvent::Message(message) => println!("{}: {}", message.author, message.body),
///         ClientEvent::UserCountChanged(count) => println!("{} online", count),
///         ClientEvent::StatusChanged(status) => println!("[{}]", status),
///     }
/// }
/// ```
#[derive(Clone)]
pub struct ChatClient {
    commands: mpsc::UnboundedSender<Command>,
    /// Serializes readiness waits so queued sends go out in call order
    send_gate: Arc<Mutex<()>>,
    connection_interval: Duration,
    connection_attempts: u32,
}

impl ChatClient {
    /// Spawn a connection manager for `url`. Must be called inside a tokio runtime.
    ///
    /// The manager starts `Disconnected`; call [`ChatClient::connect`] to open the
    /// transport.
    pub fn start(
        config: ClientConfig,
        url: impl Into<String>,
        connector: Arc<dyn Connector>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        Self::start_with_clock(config, url, connector, Arc::new(SystemClock))
    }

    pub fn start_with_clock(
        config: ClientConfig,
        url: impl Into<String>,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let client = Self {
            commands: commands_tx,
            send_gate: Arc::new(Mutex::new(())),
            connection_interval: config.connection_interval,
            connection_attempts: config.connection_attempts,
        };

        let (manager, inbox) =
            ConnectionManager::new(config, url.into(), connector, clock, events_tx);
        tokio::spawn(manager.run(commands_rx, inbox));

        (client, events_rx)
    }

    /// Open a transport. No-op while connecting or connected.
    pub fn connect(&self) -> Result<(), ClientError> {
        self.command(Command::Connect)
    }

    /// Close the transport without reconnecting.
    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.command(Command::Disconnect)
    }

    /// Change the username and re-announce it. Blank names are ignored.
    pub fn rename(&self, name: impl Into<String>) -> Result<(), ClientError> {
        self.command(Command::Rename(name.into()))
    }

    /// Send a chat message.
    ///
    /// The message is stamped immediately. If the transport is still
    /// handshaking, readiness is polled every `connection_interval` up to
    /// `connection_attempts` times before giving up with
    /// [`ClientError::ConnectionTimeout`]. Without any transport the call fails
    /// with [`ClientError::NotInitialized`].
    pub async fn send(&self, text: impl Into<String>) -> Result<(), ClientError> {
        let text = text.into();
        let message = self
            .request(|reply| Command::Compose { text, reply })
            .await?;

        let _turn = self.send_gate.lock().await;
        let mut polls = 0;
        loop {
            let delivery = self
                .request(|reply| Command::Deliver {
                    message: message.clone(),
                    reply,
                })
                .await?;

            match delivery {
                Delivery::Sent => return Ok(()),
                Delivery::NoTransport => return Err(ClientError::NotInitialized),
                Delivery::NotReady if polls < self.connection_attempts => {
                    polls += 1;
                    tokio::time::sleep(self.connection_interval).await;
                }
                Delivery::NotReady => {
                    tracing::warn!("Connection not ready after {} attempts, message dropped", polls);
                    return Err(ClientError::ConnectionTimeout { attempts: polls });
                }
            }
        }
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, ClientError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    fn command(&self, command: Command) -> Result<(), ClientError> {
        self.commands
            .send(command)
            .map_err(|_| ClientError::Shutdown)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ClientError> {
        let (reply, response) = oneshot::channel();
        self.command(command(reply))?;
        response.await.map_err(|_| ClientError::Shutdown)
    }
}

/// Receivers for events produced on behalf of the manager itself.
struct Inbox {
    transport: mpsc::UnboundedReceiver<TaggedTransportEvent>,
    timers: mpsc::UnboundedReceiver<Timer>,
}

struct ConnectionManager {
    url: String,
    heartbeat_period: Duration,
    reconnect_delay: Duration,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    session: Session,
    status: Status,
    /// Incremented for every transport; tags its events and heartbeat ticks
    generation: u64,
    transport: Option<Box<dyn TransportHandle>>,
    heartbeat: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
    reconnect_token: u64,
    events: mpsc::UnboundedSender<ClientEvent>,
    transport_tx: mpsc::UnboundedSender<TaggedTransportEvent>,
    timers_tx: mpsc::UnboundedSender<Timer>,
}

impl ConnectionManager {
    fn new(
        config: ClientConfig,
        url: String,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> (Self, Inbox) {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (timers_tx, timers_rx) = mpsc::unbounded_channel();

        let manager = Self {
            url,
            heartbeat_period: config.heartbeat_period.max(MIN_HEARTBEAT_PERIOD),
            reconnect_delay: config.reconnect_delay,
            connector,
            clock,
            session: Session::new(config.username),
            status: Status::Disconnected,
            generation: 0,
            transport: None,
            heartbeat: None,
            reconnect: None,
            reconnect_token: 0,
            events,
            transport_tx,
            timers_tx,
        };
        let inbox = Inbox {
            transport: transport_rx,
            timers: timers_rx,
        };
        (manager, inbox)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, mut inbox: Inbox) {
        loop {
            tokio::select! {
                biased;
                Some((generation, event)) = inbox.transport.recv() => {
                    self.on_transport_event(generation, event);
                }
                Some(timer) = inbox.timers.recv() => self.on_timer(timer),
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }

        tracing::debug!("All client handles dropped, shutting down connection to {}", self.url);
        self.stop_heartbeat();
        self.cancel_reconnect();
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Connect => self.connect(),
            Command::Disconnect => self.disconnect(),
            Command::Rename(name) => self.rename(&name),
            Command::Compose { text, reply } => {
                let message =
                    Message::chat(self.session.username(), text, self.clock.now_iso8601());
                let _ = reply.send(message);
            }
            Command::Deliver { message, reply } => {
                let _ = reply.send(self.deliver(&message));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn on_transport_event(&mut self, generation: u64, event: TransportEvent) {
        if generation != self.generation {
            tracing::debug!(
                "Ignoring {:?} from superseded transport (generation {}, current {})",
                event,
                generation,
                self.generation
            );
            return;
        }

        match event {
            TransportEvent::Open => self.on_open(),
            TransportEvent::Frame(raw) => {
                let inbound = classify(&raw, self.clock.as_ref());
                if let Some(event) = self.session.apply(inbound) {
                    self.emit(event);
                }
            }
            TransportEvent::Error(reason) => {
                // The close event that follows drives recovery.
                tracing::warn!("{}", ClientError::TransportError(reason));
            }
            TransportEvent::Closed => self.on_closed(),
        }
    }

    fn on_open(&mut self) {
        if self.status != Status::Connecting {
            tracing::debug!("Ignoring open event while {}", self.status);
            return;
        }
        tracing::info!("Connected to {}", self.url);
        self.set_status(Status::Connected);
        self.start_heartbeat();
        self.announce();
    }

    fn on_closed(&mut self) {
        match self.status {
            Status::ManuallyClosed => {
                tracing::info!("Connection to {} closed", self.url);
            }
            Status::Connected | Status::Connecting => {
                tracing::warn!(
                    "Connection to {} lost, reconnecting in {:?}",
                    self.url,
                    self.reconnect_delay
                );
                self.stop_heartbeat();
                self.set_status(Status::Disconnected);
                self.schedule_reconnect();
            }
            Status::Disconnected => {
                tracing::debug!("Ignoring close event while already disconnected");
            }
        }
    }

    fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::Heartbeat { generation } => {
                if generation != self.generation {
                    return;
                }
                if self.status != Status::Connected {
                    self.stop_heartbeat();
                    return;
                }
                tracing::debug!("Sending heartbeat");
                let ping = Message::ping(self.session.username(), self.clock.now_iso8601());
                self.transmit(&ping);
            }
            Timer::Reconnect { token } => {
                if token != self.reconnect_token {
                    return;
                }
                self.reconnect = None;
                if self.status == Status::Disconnected {
                    tracing::info!("Reconnecting to {}", self.url);
                    self.connect();
                } else {
                    tracing::debug!("Reconnect suppressed while {}", self.status);
                }
            }
        }
    }

    fn connect(&mut self) {
        if matches!(self.status, Status::Connecting | Status::Connected) {
            tracing::debug!("connect() ignored while {}", self.status);
            return;
        }

        self.cancel_reconnect();
        if let Some(mut previous) = self.transport.take() {
            previous.close();
        }

        self.generation += 1;
        tracing::info!(
            "Connecting to {} as '{}'",
            self.url,
            self.session.username()
        );
        self.set_status(Status::Connecting);
        let events = EventSink::new(self.generation, self.transport_tx.clone());
        self.transport = Some(self.connector.open(&self.url, events));
    }

    fn disconnect(&mut self) {
        if self.status == Status::ManuallyClosed {
            tracing::debug!("disconnect() ignored, connection already closed");
            return;
        }

        // Must precede close(): the close handler reads the status to decide
        // whether to reconnect.
        self.set_status(Status::ManuallyClosed);
        self.stop_heartbeat();
        self.cancel_reconnect();
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        tracing::info!("Disconnected from {}", self.url);
    }

    fn rename(&mut self, name: &str) {
        if !self.session.rename(name) {
            tracing::debug!("Ignoring blank username");
            return;
        }
        tracing::info!("Username changed to '{}'", self.session.username());
        if self.status == Status::Connected {
            self.announce();
        }
    }

    fn announce(&self) {
        let join = Message::join(self.session.username(), self.clock.now_iso8601());
        self.transmit(&join);
    }

    /// A transport counts as ready only once its open event has been handled,
    /// so queued chat never overtakes the JOIN announcement.
    fn deliver(&self, message: &Message) -> Delivery {
        match &self.transport {
            None => Delivery::NoTransport,
            Some(transport)
                if self.status == Status::Connected
                    && transport.ready_state() == ReadyState::Open =>
            {
                self.transmit(message);
                Delivery::Sent
            }
            Some(_) => Delivery::NotReady,
        }
    }

    /// Fire-and-forget write; failures are logged only.
    fn transmit(&self, message: &Message) {
        let Some(transport) = &self.transport else {
            tracing::debug!("No transport, dropping {:?} message", message.kind);
            return;
        };

        let result = WireMessage::from(message)
            .encode()
            .and_then(|json| transport.send_text(json));
        if let Err(e) = result {
            tracing::warn!("Failed to send {:?} message: {}", message.kind, e);
        }
    }

    fn start_heartbeat(&mut self) {
        self.stop_heartbeat();

        let period = self.heartbeat_period;
        let generation = self.generation;
        let timers = self.timers_tx.clone();
        self.heartbeat = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if timers.send(Timer::Heartbeat { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_heartbeat(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
    }

    fn schedule_reconnect(&mut self) {
        self.cancel_reconnect();

        let token = self.reconnect_token;
        let delay = self.reconnect_delay;
        let timers = self.timers_tx.clone();
        self.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = timers.send(Timer::Reconnect { token });
        }));
    }

    /// Invalidates any reconnect timer, including one whose fire is already queued.
    fn cancel_reconnect(&mut self) {
        self.reconnect_token += 1;
        if let Some(reconnect) = self.reconnect.take() {
            reconnect.abort();
        }
    }

    fn set_status(&mut self, status: Status) {
        if self.status == status {
            return;
        }
        tracing::debug!("Status {} -> {}", self.status, status);
        self.status = status;
        self.emit(ClientEvent::StatusChanged(status));
    }

    fn emit(&self, event: ClientEvent) {
        // The UI may have stopped listening; the connection keeps running.
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            url: self.url.clone(),
            username: self.session.username().to_string(),
            user_count: self.session.user_count(),
            messages: self.session.message_log().to_vec(),
            heartbeat_active: self.heartbeat.is_some(),
            reconnect_pending: self.reconnect.is_some(),
        }
    }
}
