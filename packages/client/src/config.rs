//! Client configuration and connection URL resolution.

use std::{fmt, time::Duration};

pub const DEFAULT_USERNAME: &str = "Anonymous";
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_millis(10_000);
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5_000);
pub const DEFAULT_CONNECTION_INTERVAL: Duration = Duration::from_millis(200);
pub const DEFAULT_CONNECTION_ATTEMPTS: u32 = 10;

/// Ports omitted from integrated-mode URLs.
const DEFAULT_WEB_PORTS: [u16; 2] = [80, 443];

/// Session and timing options for a [`ChatClient`](crate::ChatClient).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tsunagu_client::ClientConfig;
///
/// let config = ClientConfig::new("alice").with_reconnect_delay(Duration::from_secs(1));
/// assert_eq!(config.username, "alice");
/// assert_eq!(config.heartbeat_period, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Initial username announced on JOIN
    pub username: String,
    /// Interval between PING messages while connected
    pub heartbeat_period: Duration,
    /// Delay before reconnecting after an unexpected close
    pub reconnect_delay: Duration,
    /// Poll interval of the send readiness wait
    pub connection_interval: Duration,
    /// Maximum polls of the send readiness wait
    pub connection_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connection_interval: DEFAULT_CONNECTION_INTERVAL,
            connection_attempts: DEFAULT_CONNECTION_ATTEMPTS,
        }
    }
}

impl ClientConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }

    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the readiness wait used by `send` while the handshake is pending.
    #[must_use]
    pub fn with_connection_wait(mut self, interval: Duration, attempts: u32) -> Self {
        self.connection_interval = interval;
        self.connection_attempts = attempts;
        self
    }
}

/// WebSocket URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Ws,
    Wss,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Ws => f.write_str("ws"),
            Scheme::Wss => f.write_str("wss"),
        }
    }
}

/// Location of the page (or process) hosting the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Served over a secure scheme (https); selects `wss`
    pub secure: bool,
    pub host: String,
    pub port: Option<u16>,
}

impl PageLocation {
    pub fn scheme(&self) -> Scheme {
        if self.secure { Scheme::Wss } else { Scheme::Ws }
    }
}

/// Where the chat server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub host: String,
    pub port: Option<u16>,
    /// Path of the WebSocket endpoint, e.g. `/ws`
    pub endpoint: String,
    /// Served from the same origin as the page
    pub integrated: bool,
}

impl EndpointConfig {
    /// Resolve the WebSocket URL.
    ///
    /// - integrated: `{scheme}://{page host}[:{page port unless 80/443}]{endpoint}`
    /// - standalone: `{scheme}://{host}[:{port}]{endpoint}`
    pub fn resolve_url(&self, page: &PageLocation) -> String {
        let (host, port) = if self.integrated {
            let port = page.port.filter(|port| !DEFAULT_WEB_PORTS.contains(port));
            (page.host.as_str(), port)
        } else {
            (self.host.as_str(), self.port)
        };

        let authority = match port {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        format!("{}://{}{}", page.scheme(), authority, normalize_endpoint(&self.endpoint))
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.is_empty() || endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{}", endpoint)
    }
}
