//! JSON-RPC 2.0 primitives and the MCP wire types used by the tool client
//!
//! Only the subset of the Model Context Protocol needed to invoke a tool is
//! modelled here: the `initialize` handshake, the `notifications/initialized`
//! notification and `tools/call`. Struct fields are `camelCase` on the wire
//! via `#[serde(rename_all = "camelCase")]`, and `Option<>` fields omit their
//! key from JSON when `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// Protocol revision declared in the `initialize` request.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `clientInfo` during the handshake.
pub const CLIENT_INFO_NAME: &str = "toolreg-mcp-client";

/// Version reported in `clientInfo` during the handshake.
pub const CLIENT_INFO_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lifecycle: client sends `initialize` to open a session.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Lifecycle: client sends `notifications/initialized` after the server ACKs.
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
/// Invoke a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// JSON-RPC protocol marker carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 wire types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request object.
///
/// # Examples
///
/// ```
/// use toolreg::mcp::types::JsonRpcRequest;
///
/// let req = JsonRpcRequest::new(7, "tools/call", serde_json::json!({}));
/// assert_eq!(req.jsonrpc, "2.0");
/// assert_eq!(req.id, 7);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Request correlation identifier, taken from the client's shared counter.
    pub id: u64,
    /// The method name to invoke.
    pub method: String,
    /// Method parameters.
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    /// Build a request with the `"2.0"` marker filled in.
    pub fn new(id: u64, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification (a request with no `id`).
///
/// # Examples
///
/// ```
/// use toolreg::mcp::types::JsonRpcNotification;
///
/// let n = JsonRpcNotification::new("notifications/initialized");
/// let json = serde_json::to_value(&n).unwrap();
/// assert!(json.get("id").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// The notification method name.
    pub method: String,
    /// Optional notification parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcNotification {
    /// Build a parameterless notification.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: None,
        }
    }
}

/// A JSON-RPC 2.0 response envelope.
///
/// Exactly one of `result` or `error` must be present. Deserialization does
/// not enforce this; [`JsonRpcResponse::into_outcome`] does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version identifier.
    #[serde(default)]
    pub jsonrpc: String,
    /// Mirrors the `id` from the corresponding request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Successful result value; mutually exclusive with `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error object; mutually exclusive with `result`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// The two legal shapes of a response envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// The envelope carried `result`.
    Result(serde_json::Value),
    /// The envelope carried `error`.
    Error(JsonRpcError),
}

impl JsonRpcResponse {
    /// Split the envelope into its result or error member.
    ///
    /// # Errors
    ///
    /// Returns a description of the violation when both or neither of
    /// `result`/`error` are present.
    pub fn into_outcome(self) -> std::result::Result<RpcOutcome, String> {
        match (self.result, self.error) {
            (Some(result), None) => Ok(RpcOutcome::Result(result)),
            (None, Some(error)) => Ok(RpcOutcome::Error(error)),
            (Some(_), Some(_)) => {
                Err("envelope carries both `result` and `error`".to_string())
            }
            (None, None) => Err("envelope carries neither `result` nor `error`".to_string()),
        }
    }
}

/// A JSON-RPC 2.0 error object.
///
/// Implements `Display` as `"JSON-RPC error {code}: {message}"`.
///
/// # Examples
///
/// ```
/// use toolreg::mcp::types::JsonRpcError;
///
/// let e = JsonRpcError { code: -32600, message: "Invalid Request".to_string(), data: None };
/// assert_eq!(e.to_string(), "JSON-RPC error -32600: Invalid Request");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Numeric error code as defined by JSON-RPC 2.0 or the MCP spec.
    #[serde(default)]
    pub code: i64,
    /// Human-readable error description.
    #[serde(default)]
    pub message: String,
    /// Optional additional error context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

// ---------------------------------------------------------------------------
// Initialize types
// ---------------------------------------------------------------------------

/// Identifies a client implementation by name and version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Implementation {
    /// Short name of the implementation.
    pub name: String,
    /// Version string.
    pub version: String,
}

impl Default for Implementation {
    fn default() -> Self {
        Self {
            name: CLIENT_INFO_NAME.to_string(),
            version: CLIENT_INFO_VERSION.to_string(),
        }
    }
}

/// Tool-related client capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// When `true`, the client understands tool-list change notifications.
    pub list_changed: bool,
}

/// The capabilities this client advertises to a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientCapabilities {
    /// Tool capabilities.
    pub tools: ToolsCapability,
}

/// Parameters sent by the client in the `initialize` request.
///
/// # Examples
///
/// ```
/// use toolreg::mcp::types::InitializeParams;
///
/// let json = serde_json::to_value(InitializeParams::default()).unwrap();
/// assert_eq!(json["capabilities"]["tools"]["listChanged"], true);
/// assert_eq!(json["protocolVersion"], "2024-11-05");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// The protocol version the client wishes to use.
    pub protocol_version: String,
    /// Capabilities advertised by this client.
    pub capabilities: ClientCapabilities,
    /// Information identifying this client implementation.
    pub client_info: Implementation,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities {
                tools: ToolsCapability { list_changed: true },
            },
            client_info: Implementation::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool call types
// ---------------------------------------------------------------------------

/// Parameters for a `tools/call` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolParams {
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments to pass to the tool.
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// A single element of `result.content` in a `tools/call` response.
///
/// Only `type == "text"` items carry a decodable business payload; all
/// other fields are preserved verbatim in `extra` so that raw content can be
/// handed back to the caller unchanged.
///
/// # Examples
///
/// ```
/// use toolreg::mcp::types::ContentItem;
///
/// let item: ContentItem = serde_json::from_value(serde_json::json!({
///     "type": "image", "data": "aGk=", "mimeType": "image/png"
/// })).unwrap();
/// assert!(!item.is_text());
/// assert_eq!(item.extra["mimeType"], "image/png");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    /// Content discriminator (`"text"`, `"image"`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Text payload, present on text items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Any other fields sent by the server.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContentItem {
    /// Build a plain text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            extra: serde_json::Map::new(),
        }
    }

    /// Returns `true` for `type == "text"` items.
    pub fn is_text(&self) -> bool {
        self.kind == "text"
    }
}
