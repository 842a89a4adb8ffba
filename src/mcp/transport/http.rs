//! Streamable HTTP transport for the MCP tool client
//!
//! This module implements [`HttpTransport`]. Every JSON-RPC message is sent
//! as an HTTP POST. The server may reply with:
//!
//! - `application/json` -- a direct JSON response body
//! - `text/event-stream` -- an SSE stream; it is read only until the first
//!   terminal `data:` frame (see [`crate::mcp::sse`])
//! - `202 Accepted` -- an acknowledgement, possibly with no body (used for
//!   notifications)
//!
//! Any other status is read as an error body and surfaced as
//! [`ToolregError::HttpStatus`].
//!
//! # Headers
//!
//! Every request carries `Content-Type: application/json`,
//! `Accept: application/json, text/event-stream`, `Cache-Control: no-cache`,
//! the client-identity header, and, when a session token is given, the
//! token under every name in [`SESSION_HEADER_NAMES`].

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};

use crate::config::McpConfig;
use crate::error::{Result, ToolregError};
use crate::mcp::sse::{is_event_stream, SseScanner};
use crate::mcp::transport::{
    Transport, TransportResponse, CLIENT_NAME_HEADER, DEFAULT_CLIENT_NAME, SESSION_HEADER_NAMES,
};
use crate::session::SessionToken;

/// `reqwest`-backed transport targeting one MCP endpoint.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use url::Url;
/// use toolreg::mcp::transport::http::HttpTransport;
///
/// let transport = HttpTransport::new(
///     Url::parse("http://localhost:9000/mcp").unwrap(),
///     None,
///     Duration::from_secs(10),
///     Duration::from_secs(30),
/// )
/// .unwrap();
/// assert_eq!(transport.client_name(), "toolreg-mcp-client");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Underlying reqwest HTTP client.
    http_client: reqwest::Client,
    /// MCP endpoint URL (POST target).
    endpoint: url::Url,
    /// Value of the client-identity header.
    client_name: String,
}

impl HttpTransport {
    /// Construct a new [`HttpTransport`] targeting `endpoint`.
    ///
    /// A blank or absent `client_name` falls back to
    /// [`DEFAULT_CLIENT_NAME`]. `read_timeout` bounds the whole exchange,
    /// `connect_timeout` only the TCP/TLS connect.
    ///
    /// # Errors
    ///
    /// Returns [`ToolregError::McpTransport`] if the HTTP client cannot be
    /// built (TLS backend initialisation failure).
    pub fn new(
        endpoint: url::Url,
        client_name: Option<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .map_err(|e| {
                ToolregError::McpTransport(format!("failed to build HTTP client: {}", e))
            })?;

        let client_name = client_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());

        Ok(Self {
            http_client,
            endpoint,
            client_name,
        })
    }

    /// Build a transport from the `mcp` configuration block.
    ///
    /// # Errors
    ///
    /// Returns [`ToolregError::Config`] if the endpoint is not a valid URL.
    pub fn from_config(config: &McpConfig) -> Result<Self> {
        let endpoint = url::Url::parse(&config.endpoint).map_err(|e| {
            ToolregError::Config(format!("invalid mcp.endpoint '{}': {}", config.endpoint, e))
        })?;
        Self::new(
            endpoint,
            config.client_name.clone(),
            Duration::from_secs(config.connect_timeout_seconds),
            Duration::from_secs(config.read_timeout_seconds),
        )
    }

    /// The endpoint every request targets.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// The effective client-identity header value.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    fn with_headers(
        &self,
        mut req: reqwest::RequestBuilder,
        session: Option<&SessionToken>,
    ) -> reqwest::RequestBuilder {
        req = req
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .header(CLIENT_NAME_HEADER, self.client_name.as_str());
        if let Some(token) = session {
            for name in SESSION_HEADER_NAMES {
                req = req.header(*name, token.as_str());
            }
        }
        req
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        message: String,
        session: Option<&SessionToken>,
    ) -> Result<TransportResponse> {
        let req = self.with_headers(self.http_client.post(self.endpoint.as_str()), session);

        let response = req.body(message).send().await.map_err(|e| {
            anyhow::anyhow!(ToolregError::McpTransport(format!(
                "HTTP POST failed: {}",
                e
            )))
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "MCP server rejected request");
            return Err(ToolregError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = if is_event_stream(&content_type) {
            read_event_stream(response).await?
        } else {
            response.text().await.map_err(|e| {
                anyhow::anyhow!(ToolregError::McpTransport(format!(
                    "failed to read response body: {}",
                    e
                )))
            })?
        };

        tracing::debug!(
            status = status.as_u16(),
            content_type = %content_type,
            body_len = body.len(),
            "MCP response received"
        );

        Ok(TransportResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    async fn probe(&self, session: Option<&SessionToken>) -> Result<u16> {
        let req = self.with_headers(self.http_client.get(self.endpoint.as_str()), session);
        let response = req.send().await.map_err(|e| {
            anyhow::anyhow!(ToolregError::McpTransport(format!(
                "HTTP GET failed: {}",
                e
            )))
        })?;
        Ok(response.status().as_u16())
    }
}

/// Read an SSE body until the first terminal frame or the end of the stream.
///
/// The raw text read so far is returned; frame extraction proper happens in
/// [`crate::mcp::sse::extract_payload`].
async fn read_event_stream(response: reqwest::Response) -> Result<String> {
    let mut scanner = SseScanner::default();
    let mut raw: Vec<u8> = Vec::new();
    let mut byte_stream = response.bytes_stream();

    while let Some(chunk) = byte_stream.next().await {
        let chunk = chunk.map_err(|e| {
            anyhow::anyhow!(ToolregError::McpTransport(format!(
                "failed to read event stream: {}",
                e
            )))
        })?;
        raw.extend_from_slice(&chunk);
        if scanner.push_bytes(&chunk) {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&raw).into_owned())
}
