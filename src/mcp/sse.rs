//! SSE frame extraction for MCP responses
//!
//! A `tools/call` or `initialize` POST may be answered either with a plain
//! `application/json` body or with a `text/event-stream` body whose `data:`
//! lines carry the JSON-RPC envelope. [`extract_payload`] turns either shape
//! into the single JSON string the envelope parser expects.
//!
//! # Completion heuristic
//!
//! The remote server does not signal the end of the stream with a framed
//! terminator. Scanning stops at the first `data:` chunk whose text contains
//! the literal `"result"` or `"error"`. This is an approximation: a chunk
//! carrying a partial payload that happens to contain one of those quoted
//! words inside nested text would end the scan early.

use bytes::Bytes;

use crate::error::{Result, ToolregError};

/// Content-type marker for Server-Sent Events bodies.
pub const EVENT_STREAM: &str = "text/event-stream";

/// Returns `true` when `content_type` declares an SSE body.
pub fn is_event_stream(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains(EVENT_STREAM)
}

/// Incremental scanner over an SSE body.
///
/// Feed it text as it arrives with [`SseScanner::push_str`] (or raw chunks
/// with [`SseScanner::push_bytes`]); it reports completion as soon as a
/// terminal `data:` chunk has been seen, letting the transport stop reading
/// a stream the server keeps open.
///
/// # Examples
///
/// ```
/// use toolreg::mcp::sse::SseScanner;
///
/// let mut scanner = SseScanner::default();
/// assert!(!scanner.push_str("data: {\"partial\":1}\n"));
/// assert!(scanner.push_str("data: {\"id\":1,\"result\":{}}\n"));
/// assert_eq!(scanner.finish(), "{\"id\":1,\"result\":{}}");
/// ```
#[derive(Debug, Default)]
pub struct SseScanner {
    /// Text after the last newline, not yet a complete line.
    pending: String,
    /// Undecoded bytes of a UTF-8 sequence split across chunks.
    partial_utf8: Vec<u8>,
    /// Every `data:` chunk seen so far.
    chunks: Vec<String>,
    /// The chunk that satisfied the completion heuristic.
    terminal: Option<String>,
}

impl SseScanner {
    /// Feed a raw body chunk. Returns `true` once a terminal chunk was seen.
    pub fn push_bytes(&mut self, chunk: &Bytes) -> bool {
        self.partial_utf8.extend_from_slice(chunk);
        // Hold back only a truncated trailing sequence; invalid bytes are
        // replaced lossily so they never stall the scan.
        let valid_up_to = match std::str::from_utf8(&self.partial_utf8) {
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            _ => self.partial_utf8.len(),
        };
        let rest = self.partial_utf8.split_off(valid_up_to);
        let text = String::from_utf8_lossy(&self.partial_utf8).into_owned();
        self.partial_utf8 = rest;
        self.push_str(&text)
    }

    /// Feed body text. Returns `true` once a terminal chunk was seen.
    pub fn push_str(&mut self, text: &str) -> bool {
        if self.is_complete() {
            return true;
        }
        self.pending.push_str(text);
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            if self.scan_line(&line) {
                self.pending.clear();
                return true;
            }
        }
        false
    }

    /// Returns `true` once a terminal chunk has been seen.
    pub fn is_complete(&self) -> bool {
        self.terminal.is_some()
    }

    /// Consume the scanner and return the extracted payload.
    ///
    /// When a terminal chunk was seen it is returned on its own. Otherwise
    /// every `data:` chunk (including a trailing line with no newline) is
    /// joined with `\n`, which is how SSE reassembles multi-line data.
    pub fn finish(mut self) -> String {
        if self.terminal.is_none() && !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.scan_line(&line);
        }
        match self.terminal {
            Some(terminal) => terminal,
            None => self.chunks.join("\n"),
        }
    }

    fn scan_line(&mut self, line: &str) -> bool {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(data) = line.trim_start().strip_prefix("data:") else {
            return false;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);
        if is_terminal_chunk(data) {
            self.terminal = Some(data.to_string());
            return true;
        }
        self.chunks.push(data.to_string());
        false
    }
}

/// The completion heuristic applied to each `data:` chunk.
fn is_terminal_chunk(data: &str) -> bool {
    data.contains("\"result\"") || data.contains("\"error\"")
}

/// Extract the JSON-RPC payload from a response body.
///
/// Non-SSE bodies are returned unchanged; SSE bodies are scanned with
/// [`SseScanner`].
///
/// # Errors
///
/// Returns [`ToolregError::EmptyResponse`] when no non-blank payload could be
/// produced.
///
/// # Examples
///
/// ```
/// use toolreg::mcp::sse::extract_payload;
///
/// let body = r#"{"jsonrpc":"2.0","id":1,"result":{}}"#;
/// assert_eq!(extract_payload(body, "application/json").unwrap(), body);
/// ```
pub fn extract_payload(body: &str, content_type: &str) -> Result<String> {
    let payload = if is_event_stream(content_type) {
        let mut scanner = SseScanner::default();
        scanner.push_str(body);
        scanner.finish()
    } else {
        body.to_string()
    };

    if payload.trim().is_empty() {
        return Err(ToolregError::EmptyResponse.into());
    }
    Ok(payload)
}
