//! MCP (Model Context Protocol) client support for toolreg
//!
//! This module calls tools on a remote MCP server over JSON-RPC 2.0 on HTTP.
//! Responses arrive either as a JSON body or as a Server-Sent Events stream.
//!
//! The implementation declares protocol revision **2024-11-05**.
//!
//! # Module Layout
//!
//! - `types`     -- JSON-RPC primitives and the MCP types this client sends
//!   and receives
//! - `transport` -- `Transport` trait and the `reqwest` implementation
//! - `sse`       -- JSON payload extraction from SSE bodies
//! - `protocol`  -- `initialize` handshake and request ids
//! - `decoder`   -- `tools/call` result and business payload decoding
//! - `client`    -- `McpClient`, the invocation entry point

pub mod client;
pub mod decoder;
pub mod protocol;
pub mod sse;
pub mod transport;
pub mod types;

pub use client::McpClient;
pub use decoder::InvocationResult;
pub use protocol::ConnectionState;
