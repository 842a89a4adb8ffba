/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `serve` — Run the HTTP invoke endpoint
- `call`  — Invoke one tool and print the result
- `ping`  — Probe the MCP endpoint
*/

/// HTTP endpoint command handler
pub mod serve {
    use std::net::SocketAddr;

    use crate::config::Config;
    use crate::error::{Result, ToolregError};
    use crate::mcp::McpClient;
    use crate::server::{self, AppState};

    /// Serve the invoke endpoint on `config.server.bind_address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the address cannot
    /// be bound.
    pub async fn run_serve(config: Config) -> Result<()> {
        let addr: SocketAddr = config.server.bind_address.parse().map_err(|e| {
            ToolregError::Config(format!(
                "invalid bind address {}: {}",
                config.server.bind_address, e
            ))
        })?;
        let client = McpClient::from_config(&config)?;
        tracing::info!(
            endpoint = %config.mcp.endpoint,
            tools = config.tools.len(),
            "starting toolreg server"
        );
        server::serve(addr, AppState { client }).await
    }
}

/// Single tool invocation command handler
pub mod call {
    use serde_json::{Map, Value};

    use crate::config::Config;
    use crate::error::{Result, ToolregError};
    use crate::mcp::{InvocationResult, McpClient};
    use crate::registry::parse_tool_key;
    use crate::session::SessionToken;

    /// Parse `--args` into an argument object. Absent means empty.
    ///
    /// # Errors
    ///
    /// Returns [`ToolregError::InvalidArguments`] if the text is not a JSON
    /// object.
    pub fn parse_arguments(args: Option<&str>) -> Result<Map<String, Value>> {
        let Some(text) = args.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(Map::new());
        };
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ToolregError::InvalidArguments("expected a JSON object".to_string()).into()),
            Err(e) => Err(ToolregError::InvalidArguments(e.to_string()).into()),
        }
    }

    /// Invoke one tool and print the result as pretty JSON on stdout.
    ///
    /// Returns the result so the caller can pick the exit status.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-numeric tool identifier, malformed
    /// arguments, or a client that cannot be built. Invocation failures are
    /// not errors; they are printed with `isError: true`.
    pub async fn run_call(
        config: Config,
        tool: String,
        args: Option<String>,
        session: Option<String>,
    ) -> Result<InvocationResult> {
        let tool_key = parse_tool_key(&Value::String(tool))?;
        let arguments = parse_arguments(args.as_deref())?;
        let client = McpClient::from_config(&config)?;

        let result = client
            .invoke(tool_key, arguments, session.and_then(SessionToken::new))
            .await;

        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(result)
    }
}

/// Reachability command handler
pub mod ping {
    use crate::config::Config;
    use crate::error::Result;
    use crate::mcp::McpClient;
    use crate::session::SessionToken;

    /// Probe the MCP endpoint and print `reachable` or `unreachable`.
    ///
    /// Returns whether the endpoint answered 200.
    ///
    /// # Errors
    ///
    /// Returns an error only if the client cannot be built.
    pub async fn run_ping(config: Config, session: Option<String>) -> Result<bool> {
        let client = McpClient::from_config(&config)?;
        let session = session.and_then(SessionToken::new);
        let connected = client.is_connected(session.as_ref()).await;
        if connected {
            println!("reachable: {}", config.mcp.endpoint);
        } else {
            println!("unreachable: {}", config.mcp.endpoint);
        }
        Ok(connected)
    }
}
