//! toolreg - tool registry gateway library
//!
//! This library invokes registered tools on a remote MCP server: it resolves
//! a caller-supplied tool number to a tool name, performs the MCP handshake,
//! sends `tools/call` over HTTP, and decodes the JSON or SSE response into
//! an [`mcp::InvocationResult`].
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `mcp`: MCP client, transport, SSE extraction, handshake and decoding
//! - `registry`: tool lookup trait and by-number/by-id resolution
//! - `session`: caller session token and its resolution from requests
//! - `server`: inbound HTTP invoke endpoint
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli` / `commands`: command-line interface and its handlers
//!
//! # Example
//!
//! ```no_run
//! use toolreg::{Config, McpClient, SessionToken};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("config/config.yaml")?;
//!     config.validate()?;
//!
//!     let client = McpClient::from_config(&config)?;
//!     let mut args = serde_json::Map::new();
//!     args.insert("city".into(), "Oslo".into());
//!     let result = client.invoke(1001, args, SessionToken::new("abc123")).await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, ToolregError};
pub use mcp::{InvocationResult, McpClient};
pub use registry::{ToolLookup, ToolRecord};
pub use session::SessionToken;
