//! Decoding `tools/call` responses into an [`InvocationResult`]
//!
//! A tool response is wrapped three times: the JSON-RPC envelope, the MCP
//! `result.content` array, and the tool's own business payload carried as
//! JSON text inside `content[0].text`. The remote tool reports its failures
//! inside a successful envelope, so "the call went through" and "the tool
//! succeeded" are separate facts. [`InvocationResult::is_error`] reflects
//! the tool's outcome; transport failures never reach this module.
//!
//! # Business payload
//!
//! ```text
//! {
//!   "mcp_tool_error_code": 0,              // non-zero means the tool failed
//!   "mcp_tool_error_msg": "...",
//!   "mcp_tool_data": "2024-01-01 10:00:00" // or "{\"k\":1}" or {"k":1}
//! }
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Result, ToolregError};
use crate::mcp::types::{ContentItem, JsonRpcResponse, RpcOutcome};

/// Business payload key carrying the tool's error code.
pub const ERROR_CODE_KEY: &str = "mcp_tool_error_code";
/// Business payload key carrying the tool's error message.
pub const ERROR_MSG_KEY: &str = "mcp_tool_error_msg";
/// Business payload key carrying the tool's data.
pub const DATA_KEY: &str = "mcp_tool_data";

/// Marker stored in `business_data` when an encoded data string is not JSON.
pub const DATA_PARSE_FAILED: &str = "data parse failed";

/// The value handed back for one tool invocation.
///
/// Serializes as camelCase (`rawContent`, `isError`, `businessData`, ...).
///
/// # Examples
///
/// ```
/// use toolreg::mcp::InvocationResult;
///
/// let failed = InvocationResult::failure("missing session");
/// assert!(failed.is_error);
/// assert_eq!(failed.error.as_deref(), Some("missing session"));
/// assert!(failed.raw_content.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    /// `result.content` exactly as the server sent it.
    pub raw_content: Vec<ContentItem>,
    /// `true` when the call or the tool failed.
    pub is_error: bool,
    /// Decoded `mcp_tool_data`, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_data: Option<Value>,
    /// Human-readable failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The tool's own error code, for business errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<Value>,
    /// The tool's own error message, for business errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// The decoded business payload, kept for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_payload: Option<Value>,
}

impl InvocationResult {
    /// A failed invocation carrying only an error description.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            is_error: true,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// A successful invocation with the given raw content and nothing decoded.
    pub fn passthrough(raw_content: Vec<ContentItem>) -> Self {
        Self {
            raw_content,
            ..Self::default()
        }
    }
}

/// The shapes `mcp_tool_data` arrives in, in decoding precedence order.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolData {
    /// A bare `YYYY-MM-DD HH:MM:SS` string, kept verbatim.
    Timestamp(String),
    /// A non-empty string expected to hold a JSON object.
    Encoded(String),
    /// An already-structured JSON object or array.
    Structured(Value),
    /// Missing, null, empty, or a scalar.
    Absent,
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$")
            .expect("timestamp pattern is valid")
    })
}

impl ToolData {
    /// Classify a raw `mcp_tool_data` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use toolreg::mcp::decoder::ToolData;
    ///
    /// let v = json!("2024-01-01 10:00:00");
    /// assert_eq!(ToolData::classify(Some(&v)), ToolData::Timestamp("2024-01-01 10:00:00".into()));
    /// assert_eq!(ToolData::classify(None), ToolData::Absent);
    /// ```
    pub fn classify(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if timestamp_pattern().is_match(s) => {
                ToolData::Timestamp(s.clone())
            }
            Some(Value::String(s)) if !s.is_empty() => ToolData::Encoded(s.clone()),
            Some(v @ (Value::Object(_) | Value::Array(_))) => ToolData::Structured(v.clone()),
            _ => ToolData::Absent,
        }
    }

    /// Turn the classified data into `business_data`.
    ///
    /// An encoded string that is not a JSON object degrades to
    /// `{"error": "data parse failed"}` instead of failing the call.
    pub fn into_business_data(self) -> Option<Value> {
        match self {
            ToolData::Timestamp(ts) => Some(json!({ "currentTime": ts })),
            ToolData::Encoded(text) => match serde_json::from_str::<Value>(&text) {
                Ok(v @ Value::Object(_)) => Some(v),
                Ok(_) | Err(_) => {
                    tracing::debug!("mcp_tool_data is not a JSON object; degrading");
                    Some(json!({ "error": DATA_PARSE_FAILED }))
                }
            },
            ToolData::Structured(v) => Some(v),
            ToolData::Absent => None,
        }
    }
}

/// Decode a `tools/call` response envelope.
///
/// # Errors
///
/// Returns [`ToolregError::McpProtocol`] when the envelope carries both or
/// neither of `result`/`error`, or when `result.content` is not an array of
/// content items. A JSON-RPC `error` member is not an `Err`: it becomes a
/// failed [`InvocationResult`].
pub fn decode_envelope(envelope: JsonRpcResponse) -> Result<InvocationResult> {
    let result = match envelope.into_outcome().map_err(ToolregError::McpProtocol)? {
        RpcOutcome::Error(error) => {
            return Ok(InvocationResult::failure(
                ToolregError::Mcp(error.message).to_string(),
            ));
        }
        RpcOutcome::Result(result) => result,
    };

    let content: Vec<ContentItem> = match result.get("content") {
        None | Some(Value::Null) => Vec::new(),
        Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
            ToolregError::McpProtocol(format!("invalid result.content: {}", e))
        })?,
    };

    Ok(decode_content(content))
}

/// Decode the `result.content` array of a successful envelope.
pub fn decode_content(content: Vec<ContentItem>) -> InvocationResult {
    let text = content
        .first()
        .filter(|item| item.is_text())
        .and_then(|item| item.text.clone())
        .filter(|text| !text.trim().is_empty());
    let Some(text) = text else {
        return InvocationResult::passthrough(content);
    };

    let payload = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return InvocationResult {
                raw_content: content,
                is_error: true,
                error: Some("failed to parse tool response: expected a JSON object".to_string()),
                ..InvocationResult::default()
            };
        }
        Err(e) => {
            return InvocationResult {
                raw_content: content,
                is_error: true,
                error: Some(format!("failed to parse tool response: {}", e)),
                ..InvocationResult::default()
            };
        }
    };

    if let Some(code) = business_error_code(&payload) {
        let message = payload
            .get(ERROR_MSG_KEY)
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("tool reported an error")
            .to_string();
        let code_text = match &code {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return InvocationResult {
            raw_content: content,
            is_error: true,
            error: Some(format!("{} (code {})", message, code_text)),
            error_code: Some(code),
            error_message: Some(message),
            tool_payload: Some(Value::Object(payload)),
            ..InvocationResult::default()
        };
    }

    let business_data = ToolData::classify(payload.get(DATA_KEY)).into_business_data();
    InvocationResult {
        raw_content: content,
        is_error: false,
        business_data,
        tool_payload: Some(Value::Object(payload)),
        ..InvocationResult::default()
    }
}

/// The error code when present and non-zero.
///
/// Numeric codes and numeric strings compare against zero; any other
/// non-empty string counts as an error code.
fn business_error_code(payload: &Map<String, Value>) -> Option<Value> {
    let code = payload.get(ERROR_CODE_KEY)?;
    let failed = match code {
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && s.parse::<i64>().map_or(true, |n| n != 0)
        }
        _ => false,
    };
    failed.then(|| code.clone())
}
