//! Error types for toolreg
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for ergonomic error handling. Variants line up with the
//! failure categories of a tool invocation: precondition, transport,
//! protocol, and tool-not-found.

use thiserror::Error;

/// Main error type for toolreg operations
///
/// Business errors reported by a remote tool are not represented here:
/// they travel inside a successful JSON-RPC envelope and are surfaced on
/// [`crate::mcp::InvocationResult`] instead.
#[derive(Error, Debug)]
pub enum ToolregError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No session token could be resolved for the caller
    #[error("missing session")]
    MissingSession,

    /// The caller-supplied tool identifier is absent or not numeric
    #[error("invalid tool identifier: {0}")]
    InvalidToolIdentifier(String),

    /// Tool arguments are not a JSON object
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Neither lookup-by-number nor lookup-by-id found the tool
    #[error("tool not found: {0}")]
    ToolNotFound(i64),

    /// Connection failures, timeouts and unreadable bodies
    #[error("MCP transport error: {0}")]
    McpTransport(String),

    /// The remote server answered with a status other than 200 or 202
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned by the server
        status: u16,
        /// The error body, read as text
        body: String,
    },

    /// The response carried no extractable JSON payload
    #[error("empty response")]
    EmptyResponse,

    /// The response body is not a well-formed JSON-RPC envelope
    #[error("MCP protocol error: {0}")]
    McpProtocol(String),

    /// The JSON-RPC envelope carried an `error` member
    #[error("MCP error: {0}")]
    Mcp(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for toolreg operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
