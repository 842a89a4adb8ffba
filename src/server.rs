//! Inbound HTTP endpoint
//!
//! Exposes the MCP client to HTTP callers:
//!
//! - `POST /api/mcp/tools/invoke` with `{ "toolId": 1001, "arguments": {..}, "sessionId": ".." }`
//! - `GET /api/mcp/status`
//!
//! Invocation outcomes, including tool failures, are answered `200` with a
//! `success` flag. Only a malformed request (unparseable body, bad
//! `toolId`, non-object `arguments`) gets `400`.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{Result, ToolregError};
use crate::mcp::McpClient;
use crate::registry::parse_tool_key;
use crate::session::resolve_session;

/// Route of the invoke endpoint.
pub const INVOKE_PATH: &str = "/api/mcp/tools/invoke";
/// Route of the reachability endpoint.
pub const STATUS_PATH: &str = "/api/mcp/status";

/// Argument key that may carry the caller session; stripped before forwarding.
const ARGUMENT_SESSION_KEY: &str = "sessionId";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client used for every inbound call.
    pub client: McpClient,
}

#[derive(Debug, Deserialize)]
struct InvokeRequest {
    #[serde(rename = "toolId", default)]
    tool_id: Value,
    #[serde(default)]
    arguments: Option<Value>,
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(INVOKE_PATH, post(invoke_tool))
        .route(STATUS_PATH, get(status))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ToolregError::Config(format!("failed to bind {}: {}", addr, e)))?;
    tracing::info!(%addr, "invoke endpoint listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("invoke endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn bad_request(error: String) -> Response {
    tracing::debug!(error = %error, "rejecting invoke request");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": error })),
    )
        .into_response()
}

async fn invoke_tool(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let request: InvokeRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => return bad_request(format!("invalid request body: {}", e)),
    };

    let tool_key = match parse_tool_key(&request.tool_id) {
        Ok(key) => key,
        Err(e) => return bad_request(e.to_string()),
    };

    let mut arguments = match request.arguments {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return bad_request(
                ToolregError::InvalidArguments("expected a JSON object".to_string()).to_string(),
            )
        }
    };

    let argument_session = match arguments.remove(ARGUMENT_SESSION_KEY) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };
    let explicit = [request.session_id.as_deref(), argument_session.as_deref()]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty());
    let session = resolve_session(explicit, &headers);

    let result = state.client.invoke(tool_key, arguments, session).await;
    let body = if result.is_error {
        json!({
            "success": false,
            "error": result.error.clone().unwrap_or_default(),
            "data": result,
        })
    } else {
        json!({ "success": true, "data": result })
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = resolve_session(None, &headers);
    let connected = state.client.is_connected(session.as_ref()).await;
    Json(json!({ "success": true, "data": { "connected": connected } })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::transport::fake::FakeTransport;
    use crate::mcp::transport::TransportResponse;
    use crate::registry::{InMemoryToolLookup, ToolRecord};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(transport: Arc<FakeTransport>) -> Router {
        let lookup = InMemoryToolLookup::new(vec![ToolRecord {
            id: 1,
            num: 1001,
            name: "weather_query".to_string(),
            valid: true,
        }])
        .unwrap();
        router(AppState {
            client: McpClient::new(transport, Arc::new(lookup)),
        })
    }

    fn ok_json(body: Value) -> TransportResponse {
        TransportResponse {
            status: 200,
            content_type: "application/json".to_string(),
            body: body.to_string(),
        }
    }

    fn script_success(transport: &FakeTransport, text: &str) {
        transport.push_response(ok_json(json!({"jsonrpc": "2.0", "id": 1, "result": {}})));
        transport.push_response(TransportResponse {
            status: 202,
            content_type: String::new(),
            body: String::new(),
        });
        transport.push_response(ok_json(json!({
            "jsonrpc": "2.0", "id": 2,
            "result": {"content": [{"type": "text", "text": text}]}
        })));
    }

    fn post_invoke(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(INVOKE_PATH)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let transport = Arc::new(FakeTransport::new());
        script_success(&transport, r#"{"mcp_tool_error_code":0,"mcp_tool_data":{"temp":21}}"#);

        let response = app(transport.clone())
            .oneshot(post_invoke(json!({
                "toolId": "1001",
                "arguments": {"city": "Oslo"},
                "sessionId": "abc"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["businessData"], json!({"temp": 21}));
        assert_eq!(transport.sessions()[2].as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_argument_session_is_used_and_stripped() {
        let transport = Arc::new(FakeTransport::new());
        script_success(&transport, r#"{"mcp_tool_data":{"ok":true}}"#);

        let response = app(transport.clone())
            .oneshot(post_invoke(json!({
                "toolId": 1001,
                "arguments": {"city": "Oslo", "sessionId": "from-args"}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let call = &transport.sent_json()[2];
        assert_eq!(call["params"]["arguments"], json!({"city": "Oslo"}));
        assert_eq!(transport.sessions()[2].as_deref(), Some("from-args"));
    }

    #[tokio::test]
    async fn test_header_session_is_used() {
        let transport = Arc::new(FakeTransport::new());
        script_success(&transport, r#"{"mcp_tool_data":{"ok":true}}"#);

        let request = Request::builder()
            .method("POST")
            .uri(INVOKE_PATH)
            .header("cookie", "windsessionid=cookie-token")
            .body(Body::from(json!({"toolId": 1001}).to_string()))
            .unwrap();
        let response = app(transport.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.sessions()[0].as_deref(), Some("cookie-token"));
    }

    #[tokio::test]
    async fn test_missing_session_is_reported_as_failure() {
        let transport = Arc::new(FakeTransport::new());

        let response = app(transport.clone())
            .oneshot(post_invoke(json!({"toolId": 1001})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "missing session");
        assert_eq!(body["data"]["isError"], true);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_business_error_is_reported_as_failure() {
        let transport = Arc::new(FakeTransport::new());
        script_success(
            &transport,
            r#"{"mcp_tool_error_code":7,"mcp_tool_error_msg":"bad input"}"#,
        );

        let response = app(transport)
            .oneshot(post_invoke(json!({"toolId": 1001, "sessionId": "abc"})))
            .await
            .unwrap();

        let body = read_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "bad input (code 7)");
        assert_eq!(body["data"]["errorCode"], 7);
    }

    #[tokio::test]
    async fn test_invalid_tool_id_is_bad_request() {
        for tool_id in [json!("abc"), json!(null), json!(1.5)] {
            let transport = Arc::new(FakeTransport::new());
            let response = app(transport.clone())
                .oneshot(post_invoke(json!({"toolId": tool_id, "sessionId": "abc"})))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = read_json(response).await;
            assert_eq!(body["success"], false);
            assert!(body["error"]
                .as_str()
                .unwrap()
                .starts_with("invalid tool identifier"));
            assert!(transport.sent().is_empty());
        }
    }

    #[tokio::test]
    async fn test_non_object_arguments_is_bad_request() {
        let response = app(Arc::new(FakeTransport::new()))
            .oneshot(post_invoke(json!({"toolId": 1001, "arguments": [1, 2]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri(INVOKE_PATH)
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(Arc::new(FakeTransport::new()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid request body"));
    }

    #[tokio::test]
    async fn test_status_reports_connectivity() {
        let transport = Arc::new(FakeTransport::new());
        transport.set_probe_status(Some(200));
        let request = Request::builder()
            .uri(STATUS_PATH)
            .body(Body::empty())
            .unwrap();
        let response = app(transport.clone()).oneshot(request).await.unwrap();
        let body = read_json(response).await;
        assert_eq!(body, json!({"success": true, "data": {"connected": true}}));

        transport.set_probe_status(None);
        let request = Request::builder()
            .uri(STATUS_PATH)
            .body(Body::empty())
            .unwrap();
        let response = app(transport).oneshot(request).await.unwrap();
        let body = read_json(response).await;
        assert_eq!(body["data"]["connected"], false);
    }
}
