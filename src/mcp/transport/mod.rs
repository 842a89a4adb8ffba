//! MCP transport abstraction and implementations
//!
//! This module defines the [`Transport`] trait that performs one HTTP
//! exchange with the remote MCP server. Concrete implementations live in
//! submodules:
//!
//! - [`http::HttpTransport`] -- `reqwest`-backed POST/GET against the
//!   configured endpoint.
//! - `fake::FakeTransport` -- scripted in-process fake used in unit tests
//!   (cfg(test) only).
//!
//! # Design
//!
//! One call to [`Transport::post`] is one request/response exchange: there
//! is no background reader and no response correlation by JSON-RPC id.
//! Statuses other than 200 and 202 are reported as
//! [`crate::error::ToolregError::HttpStatus`] by the implementation, so a
//! returned [`TransportResponse`] always holds an accepted body.

use crate::error::Result;
use crate::session::SessionToken;

/// Session headers written on every outbound request.
///
/// Both names carry the same value. The remote server's precedence between
/// them is unspecified, so neither is treated as canonical.
pub const SESSION_HEADER_NAMES: &[&str] = &["windsessionid", "wind.sessionid"];

/// Header identifying the calling client.
pub const CLIENT_NAME_HEADER: &str = "X-Client-Name";

/// Client identity sent when no name is configured.
pub const DEFAULT_CLIENT_NAME: &str = "toolreg-mcp-client";

/// An accepted (200 or 202) HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code, 200 or 202.
    pub status: u16,
    /// Declared `Content-Type`, empty when absent.
    pub content_type: String,
    /// Response body as read. For event streams this may stop at the first
    /// terminal frame rather than the end of the stream.
    pub body: String,
}

/// Abstraction over a single-exchange MCP transport.
///
/// Implementations must attach the session headers (when a token is
/// given), the client-identity header, and the JSON/SSE content negotiation
/// headers to every request.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// POST a serialized JSON-RPC message and return the accepted response.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ToolregError::McpTransport`] on connection
    /// failure or timeout, and [`crate::error::ToolregError::HttpStatus`]
    /// for any status other than 200 or 202.
    async fn post(&self, message: String, session: Option<&SessionToken>)
        -> Result<TransportResponse>;

    /// Issue a lightweight GET with the same headers and return the status.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ToolregError::McpTransport`] when no response
    /// was received at all.
    async fn probe(&self, session: Option<&SessionToken>) -> Result<u16>;
}

pub mod http;

#[cfg(test)]
pub mod fake;
