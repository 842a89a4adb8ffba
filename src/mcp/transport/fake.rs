//! Scripted in-process transport for MCP unit tests
//!
//! [`FakeTransport`] replays queued responses in order and records every
//! message the client sent, so tests can assert call counts, ordering, and
//! request ids without any network I/O.
//!
//! # Example
//!
//! ```text
//! let transport = FakeTransport::new();
//! transport.push_response(TransportResponse { status: 200, .. });
//! client.invoke(..).await;
//! assert_eq!(transport.sent().len(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{Result, ToolregError};
use crate::mcp::transport::{Transport, TransportResponse};
use crate::session::SessionToken;

/// In-process fake transport for use in tests.
#[derive(Debug, Default)]
pub struct FakeTransport {
    /// Scripted outcomes, consumed front to back by `post`.
    script: Mutex<VecDeque<std::result::Result<TransportResponse, ToolregError>>>,
    /// Every message passed to `post`, in order.
    sent: Mutex<Vec<String>>,
    /// Session tokens seen by `post`, in order.
    sessions: Mutex<Vec<Option<String>>>,
    /// Status returned by `probe`; `None` simulates a connection failure.
    probe_status: Mutex<Option<u16>>,
}

impl FakeTransport {
    /// Create an empty fake. `post` fails until responses are queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful exchange.
    pub fn push_response(&self, response: TransportResponse) {
        self.script.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a failed exchange.
    pub fn push_error(&self, error: ToolregError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Set the status `probe` reports.
    pub fn set_probe_status(&self, status: Option<u16>) {
        *self.probe_status.lock().unwrap() = status;
    }

    /// Raw messages sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages sent so far, parsed as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .iter()
            .map(|m| serde_json::from_str(m).unwrap())
            .collect()
    }

    /// Session token values attached to each sent message.
    pub fn sessions(&self) -> Vec<Option<String>> {
        self.sessions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn post(
        &self,
        message: String,
        session: Option<&SessionToken>,
    ) -> Result<TransportResponse> {
        self.sent.lock().unwrap().push(message);
        self.sessions
            .lock()
            .unwrap()
            .push(session.map(|s| s.as_str().to_string()));
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(error)) => Err(error.into()),
            None => Err(ToolregError::McpTransport("no scripted response".into()).into()),
        }
    }

    async fn probe(&self, _session: Option<&SessionToken>) -> Result<u16> {
        match *self.probe_status.lock().unwrap() {
            Some(status) => Ok(status),
            None => Err(ToolregError::McpTransport("connection refused".into()).into()),
        }
    }
}
