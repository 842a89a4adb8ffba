//! MCP session handshake
//!
//! Before tools are called the remote server expects the `initialize` /
//! `notifications/initialized` exchange. [`ProtocolSession`] owns the
//! connection state and drives that exchange at most once successfully per
//! client instance.
//!
//! # Design
//!
//! The handshake is advisory. A failed or rejected `initialize` leaves the
//! state at [`ConnectionState::Uninitialized`] and the triggering call goes
//! ahead anyway; the next call retries.
//!
//! Concurrent first calls are single-flighted through an async mutex: one
//! caller performs the handshake while the others wait, then re-check the
//! flag. Once [`ConnectionState::Initialized`] is reached the state never
//! goes back. The remote server must still tolerate a repeated `initialize`
//! (e.g. from several processes, or after a failed attempt).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Result, ToolregError};
use crate::mcp::sse::extract_payload;
use crate::mcp::transport::Transport;
use crate::mcp::types::{
    InitializeParams, JsonRpcNotification, JsonRpcRequest, METHOD_INITIALIZE, METHOD_INITIALIZED,
};
use crate::session::SessionToken;

/// Whether the handshake has completed against the remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No successful `initialize` yet.
    Uninitialized,
    /// `initialize` returned a result and `notifications/initialized` was sent.
    Initialized,
}

/// Monotonic JSON-RPC request id source.
///
/// Clones share the same counter, so every request sent through any clone
/// of a client gets a distinct id.
///
/// # Examples
///
/// ```
/// use toolreg::mcp::protocol::RequestIds;
///
/// let ids = RequestIds::default();
/// let other = ids.clone();
/// assert_eq!(ids.next_id(), 1);
/// assert_eq!(other.next_id(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RequestIds(Arc<AtomicU64>);

impl Default for RequestIds {
    fn default() -> Self {
        Self(Arc::new(AtomicU64::new(1)))
    }
}

impl RequestIds {
    /// Allocate the next id.
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`RequestIds::next_id`] will return.
    pub fn peek(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handshake state owned by one client instance.
#[derive(Debug, Default)]
pub struct ProtocolSession {
    initialized: AtomicBool,
    /// Held for the duration of a handshake attempt.
    in_flight: Mutex<()>,
}

impl ProtocolSession {
    /// Create a session in [`ConnectionState::Uninitialized`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        if self.initialized.load(Ordering::Acquire) {
            ConnectionState::Initialized
        } else {
            ConnectionState::Uninitialized
        }
    }

    /// Run the handshake if it has not yet succeeded.
    ///
    /// Never fails: handshake errors are logged and reported only through
    /// the returned state.
    pub async fn ensure_initialized(
        &self,
        transport: &dyn Transport,
        ids: &RequestIds,
        session: &SessionToken,
    ) -> ConnectionState {
        if self.state() == ConnectionState::Initialized {
            return ConnectionState::Initialized;
        }

        let _guard = self.in_flight.lock().await;
        // Another caller may have finished the handshake while we waited.
        if self.state() == ConnectionState::Initialized {
            return ConnectionState::Initialized;
        }

        match handshake(transport, ids, session).await {
            Ok(true) => {
                self.initialized.store(true, Ordering::Release);
                tracing::info!("MCP session initialized");
            }
            Ok(false) => {
                tracing::warn!("MCP initialize returned no result; will retry on next call");
            }
            Err(e) => {
                tracing::warn!(error = %e, "MCP initialize failed; will retry on next call");
            }
        }

        self.state()
    }
}

/// Send `initialize`; on a `result`, follow up with `notifications/initialized`.
///
/// Returns whether the server answered `initialize` with a result.
async fn handshake(
    transport: &dyn Transport,
    ids: &RequestIds,
    session: &SessionToken,
) -> Result<bool> {
    let request = JsonRpcRequest::new(
        ids.next_id(),
        METHOD_INITIALIZE,
        serde_json::to_value(InitializeParams::default())?,
    );
    tracing::debug!(request_id = request.id, "sending MCP initialize");

    let response = transport
        .post(serde_json::to_string(&request)?, Some(session))
        .await?;
    let payload = extract_payload(&response.body, &response.content_type)?;
    let envelope: serde_json::Value = serde_json::from_str(&payload).map_err(|e| {
        ToolregError::McpProtocol(format!("initialize response is not JSON: {}", e))
    })?;

    if envelope.get("result").is_none() {
        return Ok(false);
    }

    // One-way: the acknowledgement (usually 202) is not inspected.
    let notification = JsonRpcNotification::new(METHOD_INITIALIZED);
    if let Err(e) = transport
        .post(serde_json::to_string(&notification)?, Some(session))
        .await
    {
        tracing::debug!(error = %e, "notifications/initialized was not accepted");
    }

    Ok(true)
}
