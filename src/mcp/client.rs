//! Tool invocation client
//!
//! [`McpClient`] is the entry point for calling a registered tool on the
//! remote MCP server. One [`McpClient::invoke`] call runs the whole
//! pipeline:
//!
//! 1. require a caller session
//! 2. run the `initialize` handshake if this client has not completed one
//! 3. resolve the tool key to a tool name through [`ToolLookup`]
//! 4. POST a `tools/call` request through the [`Transport`]
//! 5. extract the JSON payload (plain or SSE) and decode it
//!
//! # Design
//!
//! `invoke` never returns `Err`. Every failure, from a missing session to a
//! malformed envelope, is folded into an [`InvocationResult`] with
//! `is_error == true`, so callers handle one shape. Business errors reported
//! by the tool itself surface the same way with `error_code` and
//! `error_message` filled in.
//!
//! The client holds no per-caller state. Clones share the transport, the
//! handshake state, and the request id counter.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{Result, ToolregError};
use crate::mcp::decoder::{decode_envelope, InvocationResult};
use crate::mcp::protocol::{ConnectionState, ProtocolSession, RequestIds};
use crate::mcp::sse::extract_payload;
use crate::mcp::transport::http::HttpTransport;
use crate::mcp::transport::Transport;
use crate::mcp::types::{CallToolParams, JsonRpcRequest, JsonRpcResponse, METHOD_TOOLS_CALL};
use crate::registry::{resolve_tool_name, InMemoryToolLookup, ToolLookup};
use crate::session::SessionToken;

/// Invokes registered tools on a remote MCP server.
///
/// # Examples
///
/// ```no_run
/// use toolreg::config::Config;
/// use toolreg::mcp::McpClient;
/// use toolreg::session::SessionToken;
///
/// # async fn run() -> anyhow::Result<()> {
/// let config = Config::from_file("config/config.yaml")?;
/// let client = McpClient::from_config(&config)?;
/// let result = client
///     .invoke(1001, serde_json::Map::new(), SessionToken::new("abc123"))
///     .await;
/// if result.is_error {
///     eprintln!("{}", result.error.unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct McpClient {
    transport: Arc<dyn Transport>,
    lookup: Arc<dyn ToolLookup>,
    protocol: Arc<ProtocolSession>,
    ids: RequestIds,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("transport", &self.transport)
            .field("state", &self.protocol.state())
            .field("next_id", &self.ids.peek())
            .finish_non_exhaustive()
    }
}

impl McpClient {
    /// Create a client over an explicit transport and tool lookup.
    pub fn new(transport: Arc<dyn Transport>, lookup: Arc<dyn ToolLookup>) -> Self {
        Self {
            transport,
            lookup,
            protocol: Arc::new(ProtocolSession::new()),
            ids: RequestIds::default(),
        }
    }

    /// Create a client from configuration: an [`HttpTransport`] against
    /// `mcp.endpoint` and an [`InMemoryToolLookup`] over `tools`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the tool table
    /// contains duplicate ids.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.mcp)?;
        let lookup = InMemoryToolLookup::new(config.tools.clone())?;
        tracing::debug!(
            endpoint = %transport.endpoint(),
            tools = lookup.len(),
            "MCP client configured"
        );
        Ok(Self::new(Arc::new(transport), Arc::new(lookup)))
    }

    /// Current handshake state.
    pub fn connection_state(&self) -> ConnectionState {
        self.protocol.state()
    }

    /// Invoke the tool identified by `tool_key`.
    ///
    /// `tool_key` is tried as a tool number first, then as a tool id.
    /// `arguments` are forwarded to the tool unchanged.
    ///
    /// Without a session no network traffic happens and the result carries
    /// `"missing session"`.
    pub async fn invoke(
        &self,
        tool_key: i64,
        arguments: Map<String, Value>,
        session: Option<SessionToken>,
    ) -> InvocationResult {
        let Some(session) = session else {
            tracing::warn!(tool_key, "tool call rejected: missing session");
            return InvocationResult::failure(ToolregError::MissingSession.to_string());
        };

        match self.call_tool(tool_key, arguments, &session).await {
            Ok(result) => {
                if result.is_error {
                    tracing::info!(
                        tool_key,
                        error = result.error.as_deref().unwrap_or_default(),
                        "tool call returned an error"
                    );
                } else {
                    tracing::info!(tool_key, "tool call succeeded");
                }
                result
            }
            Err(e) => {
                tracing::warn!(tool_key, error = %e, "tool call failed");
                InvocationResult::failure(e.to_string())
            }
        }
    }

    async fn call_tool(
        &self,
        tool_key: i64,
        arguments: Map<String, Value>,
        session: &SessionToken,
    ) -> Result<InvocationResult> {
        self.protocol
            .ensure_initialized(self.transport.as_ref(), &self.ids, session)
            .await;

        let tool_name = resolve_tool_name(self.lookup.as_ref(), tool_key).await?;

        let params = CallToolParams {
            name: tool_name.clone(),
            arguments,
        };
        let request =
            JsonRpcRequest::new(self.ids.next_id(), METHOD_TOOLS_CALL, serde_json::to_value(params)?);
        tracing::debug!(request_id = request.id, tool_name = %tool_name, "sending tools/call");

        let response = self
            .transport
            .post(serde_json::to_string(&request)?, Some(session))
            .await?;
        let payload = extract_payload(&response.body, &response.content_type)?;
        let envelope: JsonRpcResponse = serde_json::from_str(&payload).map_err(|e| {
            ToolregError::McpProtocol(format!("response is not a JSON-RPC envelope: {}", e))
        })?;

        decode_envelope(envelope)
    }

    /// Report whether the remote server answers a GET with 200.
    ///
    /// Never fails; any transport error reads as "not connected".
    pub async fn is_connected(&self, session: Option<&SessionToken>) -> bool {
        match self.transport.probe(session).await {
            Ok(status) => {
                tracing::debug!(status, "MCP reachability probe");
                status == 200
            }
            Err(e) => {
                tracing::debug!(error = %e, "MCP reachability probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::transport::fake::FakeTransport;
    use crate::mcp::transport::TransportResponse;
    use crate::registry::{MockToolLookup, ToolRecord};
    use serde_json::json;

    fn tools() -> Arc<dyn ToolLookup> {
        Arc::new(
            InMemoryToolLookup::new(vec![
                ToolRecord {
                    id: 1,
                    num: 1001,
                    name: "weather_query".to_string(),
                    valid: true,
                },
                ToolRecord {
                    id: 2,
                    num: 1002,
                    name: "current_time".to_string(),
                    valid: true,
                },
            ])
            .unwrap(),
        )
    }

    fn json_response(body: &str) -> TransportResponse {
        TransportResponse {
            status: 200,
            content_type: "application/json".to_string(),
            body: body.to_string(),
        }
    }

    fn accepted() -> TransportResponse {
        TransportResponse {
            status: 202,
            content_type: String::new(),
            body: String::new(),
        }
    }

    fn script_handshake(transport: &FakeTransport) {
        transport.push_response(json_response(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#));
        transport.push_response(accepted());
    }

    fn tool_text(id: u64, text: &str) -> TransportResponse {
        json_response(
            &json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {"content": [{"type": "text", "text": text}]}
            })
            .to_string(),
        )
    }

    fn token() -> Option<SessionToken> {
        SessionToken::new("abc123")
    }

    #[tokio::test]
    async fn test_missing_session_sends_nothing() {
        let transport = Arc::new(FakeTransport::new());
        let client = McpClient::new(transport.clone(), tools());

        let result = client.invoke(1001, Map::new(), None).await;

        assert!(result.is_error);
        assert_eq!(result.error.as_deref(), Some("missing session"));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_full_call_decodes_business_data() {
        let transport = Arc::new(FakeTransport::new());
        script_handshake(&transport);
        transport.push_response(tool_text(
            2,
            r#"{"mcp_tool_error_code":0,"mcp_tool_data":"2024-01-01 10:00:00"}"#,
        ));
        let client = McpClient::new(transport.clone(), tools());

        let mut args = Map::new();
        args.insert("tz".to_string(), json!("UTC"));
        let result = client.invoke(1002, args, token()).await;

        assert!(!result.is_error, "{:?}", result.error);
        assert_eq!(
            result.business_data,
            Some(json!({"currentTime": "2024-01-01 10:00:00"}))
        );

        let sent = transport.sent_json();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2]["method"], "tools/call");
        assert_eq!(sent[2]["params"]["name"], "current_time");
        assert_eq!(sent[2]["params"]["arguments"], json!({"tz": "UTC"}));
        assert!(transport
            .sessions()
            .iter()
            .all(|s| s.as_deref() == Some("abc123")));
        assert_eq!(client.connection_state(), ConnectionState::Initialized);
    }

    #[tokio::test]
    async fn test_handshake_runs_once_and_ids_are_distinct() {
        let transport = Arc::new(FakeTransport::new());
        script_handshake(&transport);
        transport.push_response(tool_text(2, r#"{"mcp_tool_data":{"a":1}}"#));
        transport.push_response(tool_text(3, r#"{"mcp_tool_data":{"a":2}}"#));
        let client = McpClient::new(transport.clone(), tools());

        client.invoke(1001, Map::new(), token()).await;
        client.clone().invoke(1001, Map::new(), token()).await;

        let sent = transport.sent_json();
        let methods: Vec<&str> = sent.iter().filter_map(|m| m["method"].as_str()).collect();
        assert_eq!(
            methods,
            ["initialize", "notifications/initialized", "tools/call", "tools/call"]
        );
        assert_ne!(sent[2]["id"], sent[3]["id"]);
        assert_ne!(sent[0]["id"], sent[2]["id"]);
    }

    #[tokio::test]
    async fn test_failed_handshake_does_not_block_the_call() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_error(ToolregError::McpTransport("connection reset".into()));
        transport.push_response(tool_text(2, r#"{"mcp_tool_data":{"ok":true}}"#));
        let client = McpClient::new(transport.clone(), tools());

        let result = client.invoke(1001, Map::new(), token()).await;

        assert!(!result.is_error);
        assert_eq!(client.connection_state(), ConnectionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported_without_decoding() {
        let transport = Arc::new(FakeTransport::new());
        script_handshake(&transport);
        transport.push_error(ToolregError::HttpStatus {
            status: 500,
            body: "boom".to_string(),
        });
        let client = McpClient::new(transport.clone(), tools());

        let result = client.invoke(1001, Map::new(), token()).await;

        assert!(result.is_error);
        assert_eq!(result.error.as_deref(), Some("HTTP 500: boom"));
        assert!(result.raw_content.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_reports_original_key() {
        let transport = Arc::new(FakeTransport::new());
        script_handshake(&transport);
        let client = McpClient::new(transport.clone(), tools());

        let result = client.invoke(777, Map::new(), token()).await;

        assert!(result.is_error);
        assert_eq!(result.error.as_deref(), Some("tool not found: 777"));
        // Handshake only; no tools/call for an unresolved tool.
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_by_id_fallback_is_used() {
        let mut lookup = MockToolLookup::new();
        lookup
            .expect_find_valid_by_number()
            .returning(|_, _| Ok(vec![]));
        lookup.expect_find_by_id().returning(|id| {
            Ok(Some(ToolRecord {
                id,
                num: 9000 + id,
                name: "stock_quote".to_string(),
                valid: true,
            }))
        });
        let transport = Arc::new(FakeTransport::new());
        script_handshake(&transport);
        transport.push_response(tool_text(2, r#"{"mcp_tool_data":{"p":1}}"#));
        let client = McpClient::new(transport.clone(), Arc::new(lookup));

        let result = client.invoke(5, Map::new(), token()).await;

        assert!(!result.is_error);
        assert_eq!(transport.sent_json()[2]["params"]["name"], "stock_quote");
    }

    #[tokio::test]
    async fn test_sse_response_is_decoded() {
        let transport = Arc::new(FakeTransport::new());
        script_handshake(&transport);
        let frame = json!({
            "jsonrpc": "2.0", "id": 2,
            "result": {"content": [{"type": "text", "text": "{\"mcp_tool_error_code\":7,\"mcp_tool_error_msg\":\"bad input\"}"}]}
        });
        transport.push_response(TransportResponse {
            status: 200,
            content_type: "text/event-stream".to_string(),
            body: format!("event: message\ndata: {}\n\n", frame),
        });
        let client = McpClient::new(transport.clone(), tools());

        let result = client.invoke(1001, Map::new(), token()).await;

        assert!(result.is_error);
        assert_eq!(result.error.as_deref(), Some("bad input (code 7)"));
        assert_eq!(result.error_code, Some(json!(7)));
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_response_error() {
        let transport = Arc::new(FakeTransport::new());
        script_handshake(&transport);
        transport.push_response(json_response("  "));
        let client = McpClient::new(transport.clone(), tools());

        let result = client.invoke(1001, Map::new(), token()).await;

        assert!(result.is_error);
        assert_eq!(result.error.as_deref(), Some("empty response"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_protocol_error() {
        let transport = Arc::new(FakeTransport::new());
        script_handshake(&transport);
        transport.push_response(json_response("<html>gateway</html>"));
        let client = McpClient::new(transport.clone(), tools());

        let result = client.invoke(1001, Map::new(), token()).await;

        assert!(result.is_error);
        assert!(result
            .error
            .unwrap()
            .starts_with("MCP protocol error: response is not a JSON-RPC envelope"));
    }

    #[tokio::test]
    async fn test_is_connected_requires_200() {
        let transport = Arc::new(FakeTransport::new());
        let client = McpClient::new(transport.clone(), tools());

        transport.set_probe_status(Some(200));
        assert!(client.is_connected(None).await);
        transport.set_probe_status(Some(405));
        assert!(!client.is_connected(None).await);
        transport.set_probe_status(None);
        assert!(!client.is_connected(token().as_ref()).await);
    }
}
