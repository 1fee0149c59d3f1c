//! WebSocket chat client core.
//!
//! [`ChatClient`] owns a single WebSocket, drives its lifecycle (connect,
//! heartbeat, reconnect, manual close) and classifies inbound frames into
//! session state. The rendering layer only consumes [`ClientEvent`]s and
//! [`SessionSnapshot`]s and issues commands on the handle.

pub mod classifier;
pub mod config;
pub mod connection;
pub mod dto;
pub mod error;
pub mod event;
pub mod formatter;
pub mod input;
pub mod message;
pub mod runner;
pub mod session;
pub mod transport;

mod ui;

pub use config::{ClientConfig, EndpointConfig, PageLocation};
pub use connection::{ChatClient, SessionSnapshot};
pub use error::ClientError;
pub use event::{ClientEvent, Status};
pub use message::{Message, MessageKind};
pub use transport::websocket::WebSocketConnector;
