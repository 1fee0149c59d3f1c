//! In-memory transport used by the connection manager tests.

use std::sync::{Arc, Mutex};

use crate::{dto::WireMessage, error::ClientError};

use super::{Connector, EventSink, ReadyState, SharedReadyState, TransportEvent, TransportHandle};

/// Records every transport it opens; tests drive them through [`FakeSocket`].
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    sockets: Arc<Mutex<Vec<FakeSocket>>>,
}

impl FakeConnector {
    pub(crate) fn opened(&self) -> usize {
        self.sockets.lock().unwrap().len()
    }

    pub(crate) fn last(&self) -> FakeSocket {
        self.sockets
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no transport opened")
    }
}

impl Connector for FakeConnector {
    fn open(&self, url: &str, events: EventSink) -> Box<dyn TransportHandle> {
        let socket = FakeSocket {
            url: url.to_string(),
            events,
            state: SharedReadyState::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
            close_calls: Arc::new(Mutex::new(0)),
        };
        self.sockets.lock().unwrap().push(socket.clone());
        Box::new(socket)
    }
}

/// Test-side view of a fake transport.
#[derive(Clone)]
pub(crate) struct FakeSocket {
    pub(crate) url: String,
    events: EventSink,
    state: SharedReadyState,
    sent: Arc<Mutex<Vec<String>>>,
    close_calls: Arc<Mutex<usize>>,
}

impl FakeSocket {
    /// Complete the handshake.
    pub(crate) fn accept(&self) {
        self.mark_open();
        self.report_open();
    }

    /// Flip the ready state without delivering the open event yet.
    pub(crate) fn mark_open(&self) {
        self.state.set(ReadyState::Open);
    }

    pub(crate) fn report_open(&self) {
        self.events.emit(TransportEvent::Open);
    }

    pub(crate) fn receive(&self, raw: &str) {
        self.events.emit(TransportEvent::Frame(raw.to_string()));
    }

    pub(crate) fn fail(&self, reason: &str) {
        self.events.emit(TransportEvent::Error(reason.to_string()));
    }

    /// Report the close event, as the platform does after `close()` or a drop.
    pub(crate) fn report_closed(&self) {
        self.state.set(ReadyState::Closed);
        self.events.emit(TransportEvent::Closed);
    }

    pub(crate) fn sent(&self) -> Vec<WireMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|raw| WireMessage::decode(raw).unwrap())
            .collect()
    }

    pub(crate) fn close_calls(&self) -> usize {
        *self.close_calls.lock().unwrap()
    }
}

impl TransportHandle for FakeSocket {
    fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    fn send_text(&self, text: String) -> Result<(), ClientError> {
        if self.state.get() != ReadyState::Open {
            return Err(ClientError::TransportError("not open".to_string()));
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&mut self) {
        *self.close_calls.lock().unwrap() += 1;
        if self.state.get() != ReadyState::Closed {
            self.state.set(ReadyState::Closing);
        }
    }
}
