// mcp-tools-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: MCP server implementations for stdio and HTTP transports.
// Purpose: Expose governed content tools via JSON-RPC 2.0.
// Dependencies: mcp-tools-config, mcp-tools-core, axum, tokio
// ============================================================================

//! ## Overview
//! The MCP server exposes the content tools using JSON-RPC 2.0 over stdio
//! (Content-Length framing) or HTTP (`POST /rpc`). Every call is routed
//! through [`crate::tools::ToolRouter`]. Request headers, query parameters,
//! and the `MCP_SCOPE` environment variable are captured into the
//! [`RequestContext`]; whether they are honored is a scope policy decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use mcp_tools_config::AuditSinkType;
use mcp_tools_config::McpToolsConfig;
use mcp_tools_config::ServerTransport;
use mcp_tools_config::StateStoreType;
use mcp_tools_core::AccessManager;
use mcp_tools_core::AuditLogger;
use mcp_tools_core::AuditSink;
use mcp_tools_core::Clock;
use mcp_tools_core::FileAuditSink;
use mcp_tools_core::InMemoryStateStore;
use mcp_tools_core::NoopAuditSink;
use mcp_tools_core::ProtectedFieldFilter;
use mcp_tools_core::RateLimiter;
use mcp_tools_core::RequestContext;
use mcp_tools_core::ScopeResolver;
use mcp_tools_core::SharedStateStore;
use mcp_tools_core::StderrAuditSink;
use mcp_tools_core::SystemClock;
use mcp_tools_core::core::scope::SCOPE_ENV_VAR;
use mcp_tools_core::core::scope::SCOPE_HEADER;
use mcp_tools_core::runtime::rate_limit::CLIENT_ID_HEADER;
use mcp_tools_migration::InMemoryContentStore;
use mcp_tools_migration::MigrationService;
use mcp_tools_store_sqlite::SqliteStateStore;
use mcp_tools_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::tooling::ToolDefinition;
use crate::tools::ToolError;
use crate::tools::ToolRouter;
use crate::tools::ToolRouterConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Request headers copied into the HTTP request context.
const FORWARDED_HEADERS: [&str; 4] =
    [SCOPE_HEADER, CLIENT_ID_HEADER, "user-agent", "accept-language"];

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server configuration.
    config: McpToolsConfig,
    /// Tool router for request dispatch.
    router: ToolRouter,
}

impl McpServer {
    /// Builds a new MCP server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when initialization fails.
    pub fn from_config(config: McpToolsConfig) -> Result<Self, McpServerError> {
        let router = build_router(&config)?;
        emit_config_warnings(&config);
        Ok(Self {
            config,
            router,
        })
    }

    /// Returns the tool router.
    #[must_use]
    pub const fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the server fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        match self.config.server.transport {
            ServerTransport::Stdio => {
                let context = stdio_context(&self.config);
                serve_stdio(&self.router, &context, self.config.server.max_body_bytes)
            }
            ServerTransport::Http => serve_http(self.config, self.router).await,
        }
    }
}

/// Builds the governed tool router from configuration.
///
/// # Errors
///
/// Returns [`McpServerError`] when configuration is invalid or a backend
/// cannot be opened.
pub fn build_router(config: &McpToolsConfig) -> Result<ToolRouter, McpServerError> {
    config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
    let state = Arc::new(build_state_store(config)?);
    let content = build_content_store(config, clock.now_unix_secs())?;
    let filter = ProtectedFieldFilter::new(&config.protected_field_rules())
        .map_err(|err| McpServerError::Config(err.to_string()))?;
    let audit =
        AuditLogger::new(config.access.audit_logging, build_audit_sink(config)?, clock.clone());
    let migration =
        MigrationService::new(Arc::new(content), state.clone(), Arc::new(filter), clock.clone());
    let router = ToolRouter::new(ToolRouterConfig {
        scopes: ScopeResolver::new(&config.scope_policy()),
        access: AccessManager::new(&config.access_policy()),
        rate_limiter: RateLimiter::new(config.rate_limit_policy(), state, clock),
        audit,
        migration,
    })
    .map_err(|err| McpServerError::Init(err.to_string()))?;
    Ok(router)
}

/// Builds the request context shared by every stdio call.
#[must_use]
pub fn stdio_context(config: &McpToolsConfig) -> RequestContext {
    let context = RequestContext::stdio().with_actor(config.actor());
    match std::env::var(SCOPE_ENV_VAR) {
        Ok(value) => context.with_env_scope(value),
        Err(_) => context,
    }
}

/// Builds the rate-limit and import status store.
fn build_state_store(config: &McpToolsConfig) -> Result<SharedStateStore, McpServerError> {
    let store = match config.state_store.store_type {
        StateStoreType::Memory => SharedStateStore::from_store(InMemoryStateStore::new()),
        StateStoreType::Sqlite => {
            let path = config.state_store.path.clone().ok_or_else(|| {
                McpServerError::Config("sqlite state_store requires path".to_string())
            })?;
            let sqlite_config = SqliteStoreConfig {
                path,
                busy_timeout_ms: config.state_store.busy_timeout_ms,
                journal_mode: config.state_store.journal_mode,
                sync_mode: config.state_store.sync_mode,
            };
            let store = SqliteStateStore::new(&sqlite_config)
                .map_err(|err| McpServerError::Init(err.to_string()))?;
            SharedStateStore::from_store(store)
        }
    };
    Ok(store)
}

/// Builds the content store from the optional seed file.
fn build_content_store(
    config: &McpToolsConfig,
    now: u64,
) -> Result<InMemoryContentStore, McpServerError> {
    match config.content.seed_path.as_deref() {
        Some(path) => InMemoryContentStore::load_seed(Path::new(path), now)
            .map_err(|err| McpServerError::Init(err.to_string())),
        None => Ok(InMemoryContentStore::with_standard_types()),
    }
}

/// Builds the configured audit sink.
fn build_audit_sink(config: &McpToolsConfig) -> Result<Arc<dyn AuditSink>, McpServerError> {
    let sink: Arc<dyn AuditSink> = match config.audit.sink {
        AuditSinkType::Stderr => Arc::new(StderrAuditSink),
        AuditSinkType::None => Arc::new(NoopAuditSink),
        AuditSinkType::File => {
            let path = config.audit.path.as_deref().ok_or_else(|| {
                McpServerError::Config("file audit sink requires path".to_string())
            })?;
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| McpServerError::Init(format!("audit sink: {err}")))?;
            Arc::new(sink)
        }
    };
    Ok(sink)
}

/// Writes configuration warnings to stderr.
fn emit_config_warnings(config: &McpToolsConfig) {
    let mut stderr = std::io::stderr();
    for warning in config.warnings() {
        let _ = writeln!(stderr, "mcp-tools: WARNING: {warning}");
    }
    if config.server.transport == ServerTransport::Http && config.access.trust_scopes_via_header {
        let _ = writeln!(
            stderr,
            "mcp-tools: WARNING: scopes are taken from the {SCOPE_HEADER} header; only expose \
             this server behind a trusted proxy"
        );
    }
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Serves JSON-RPC requests over stdin/stdout until stdin closes.
fn serve_stdio(
    router: &ToolRouter,
    context: &RequestContext,
    max_body_bytes: usize,
) -> Result<(), McpServerError> {
    let mut reader = BufReader::new(std::io::stdin());
    let mut writer = std::io::stdout();
    while let Some(bytes) = read_framed(&mut reader, max_body_bytes)? {
        let response = match serde_json::from_slice::<JsonRpcRequest>(&bytes) {
            Ok(request) => handle_request(router, context, request).1,
            Err(_) => invalid_request(),
        };
        let payload = serde_json::to_vec(&response)
            .map_err(|_| McpServerError::Transport("json-rpc serialization failed".to_string()))?;
        write_framed(&mut writer, &payload)?;
    }
    Ok(())
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Serves JSON-RPC requests over HTTP.
async fn serve_http(config: McpToolsConfig, router: ToolRouter) -> Result<(), McpServerError> {
    let bind = config
        .server
        .bind
        .as_ref()
        .ok_or_else(|| McpServerError::Config("bind address required".to_string()))?;
    let addr: SocketAddr =
        bind.parse().map_err(|_| McpServerError::Config("invalid bind address".to_string()))?;
    let state = Arc::new(ServerState {
        router,
        max_body_bytes: config.server.max_body_bytes,
        base_context: RequestContext::http(None).with_actor(config.actor()),
    });
    let app = http_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|_| McpServerError::Transport("http bind failed".to_string()))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|_| McpServerError::Transport("http server failed".to_string()))
}

/// Builds the HTTP application with the configured body limit.
fn http_app(state: Arc<ServerState>) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route("/rpc", post(handle_http))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Shared server state for HTTP handlers.
#[derive(Clone)]
struct ServerState {
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Context template carrying the configured actor.
    base_context: RequestContext,
}

/// Handles HTTP JSON-RPC requests.
async fn handle_http(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> impl IntoResponse {
    let context = http_request_context(&state.base_context, peer, &headers, query);
    let response = parse_request(&state, &context, &bytes);
    (response.0, axum::Json(response.1))
}

/// Builds the request context of one HTTP call.
fn http_request_context(
    base: &RequestContext,
    peer: SocketAddr,
    headers: &HeaderMap,
    query: BTreeMap<String, String>,
) -> RequestContext {
    let mut context = base.clone();
    context.peer_ip = Some(peer.ip());
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(name).and_then(|value| value.to_str().ok()) {
            context = context.with_header(name, value);
        }
    }
    for (name, value) in query {
        context = context.with_query(name, value);
    }
    context
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier.
    #[serde(default)]
    id: Value,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a successful response.
    const fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Registered tool definitions.
    tools: Vec<ToolDefinition>,
}

/// Tool call response payload.
#[derive(Debug, Serialize)]
struct ToolCallResult {
    /// Tool output content.
    content: Vec<ToolContent>,
}

/// Tool output payloads for JSON-RPC responses.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolContent {
    /// JSON tool output.
    Json {
        /// Response envelope.
        json: Value,
    },
}

/// Dispatches a JSON-RPC request to the tool router.
fn handle_request(
    router: &ToolRouter,
    base_context: &RequestContext,
    request: JsonRpcRequest,
) -> (StatusCode, JsonRpcResponse) {
    let context = base_context.clone().with_request_id(request.id.to_string());
    if request.jsonrpc != "2.0" {
        return (
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::error(request.id, -32600, "invalid json-rpc version"),
        );
    }
    let id = request.id;
    match request.method.as_str() {
        "tools/list" => match serde_json::to_value(ToolListResult {
            tools: router.list_tools(),
        }) {
            Ok(value) => (StatusCode::OK, JsonRpcResponse::result(id, value)),
            Err(_) => jsonrpc_error(id, ToolError::Serialization),
        },
        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
                return (
                    StatusCode::BAD_REQUEST,
                    JsonRpcResponse::error(id, -32602, "invalid tool params"),
                );
            };
            let outcome = call_tool_with_blocking(router, &context, &call.name, call.arguments)
                .and_then(|envelope| {
                    serde_json::to_value(envelope).map_err(|_| ToolError::Serialization)
                })
                .and_then(|envelope| {
                    serde_json::to_value(ToolCallResult {
                        content: vec![ToolContent::Json {
                            json: envelope,
                        }],
                    })
                    .map_err(|_| ToolError::Serialization)
                });
            match outcome {
                Ok(value) => (StatusCode::OK, JsonRpcResponse::result(id, value)),
                Err(err) => jsonrpc_error(id, err),
            }
        }
        _ => (StatusCode::BAD_REQUEST, JsonRpcResponse::error(id, -32601, "method not found")),
    }
}

/// Executes a tool call, shifting to a blocking context when available.
fn call_tool_with_blocking(
    router: &ToolRouter,
    context: &RequestContext,
    name: &str,
    arguments: Value,
) -> Result<mcp_tools_core::ToolResponse, ToolError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| router.handle_tool_call(context, name, arguments))
        }
        _ => router.handle_tool_call(context, name, arguments),
    }
}

/// Parses and validates a JSON-RPC request payload.
fn parse_request(
    state: &ServerState,
    context: &RequestContext,
    bytes: &Bytes,
) -> (StatusCode, JsonRpcResponse) {
    if bytes.len() > state.max_body_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            JsonRpcResponse::error(Value::Null, -32070, "request body too large"),
        );
    }
    serde_json::from_slice::<JsonRpcRequest>(bytes.as_ref()).map_or_else(
        |_| (StatusCode::BAD_REQUEST, invalid_request()),
        |request| handle_request(&state.router, context, request),
    )
}

/// Builds the response for an unparseable request.
fn invalid_request() -> JsonRpcResponse {
    JsonRpcResponse::error(Value::Null, -32600, "invalid json-rpc request")
}

/// Builds a JSON-RPC error response for a routing failure.
fn jsonrpc_error(id: Value, error: ToolError) -> (StatusCode, JsonRpcResponse) {
    let (status, code) = match &error {
        ToolError::UnknownTool(_) => (StatusCode::BAD_REQUEST, -32601),
        ToolError::Internal(_) => (StatusCode::OK, -32050),
        ToolError::Serialization => (StatusCode::OK, -32060),
    };
    (status, JsonRpcResponse::error(id, code, error.to_string()))
}

// ============================================================================
// SECTION: Framing Helpers
// ============================================================================

/// Reads a framed stdio payload using MCP Content-Length headers.
///
/// Returns `Ok(None)` when the stream ends between messages.
fn read_framed(
    reader: &mut BufReader<impl Read>,
    max_body_bytes: usize,
) -> Result<Option<Vec<u8>>, McpServerError> {
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if bytes == 0 {
            if saw_header {
                return Err(McpServerError::Transport("stdio closed mid-frame".to_string()));
            }
            return Ok(None);
        }
        if line.trim().is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;
        if let Some(value) = line.strip_prefix("Content-Length:") {
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| McpServerError::Transport("invalid content length".to_string()))?;
            content_length = Some(parsed);
        }
    }
    let len = content_length
        .ok_or_else(|| McpServerError::Transport("missing content length".to_string()))?;
    if len > max_body_bytes {
        return Err(McpServerError::Transport("payload too large".to_string()));
    }
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
    Ok(Some(buf))
}

/// Writes a framed stdio payload using MCP Content-Length headers.
fn write_framed(writer: &mut impl Write, payload: &[u8]) -> Result<(), McpServerError> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer
        .write_all(header.as_bytes())
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer
        .write_all(payload)
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer.flush().map_err(|_| McpServerError::Transport("stdio write failed".to_string()))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only framing assertions."
    )]

    use std::io::BufReader;
    use std::io::Cursor;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use mcp_tools_config::McpToolsConfig;
    use mcp_tools_core::RequestContext;
    use serde_json::Value;
    use serde_json::json;
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::net::TcpStream;

    use super::JsonRpcRequest;
    use super::ServerState;
    use super::build_router;
    use super::handle_request;
    use super::http_app;
    use super::read_framed;
    use super::write_framed;

    const LIST_REQUEST: &[u8] = br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut framed = Vec::new();
        write_framed(&mut framed, payload).unwrap();
        framed
    }

    fn request(value: Value) -> JsonRpcRequest {
        serde_json::from_value(value).unwrap()
    }

    /// Posts a raw body to `/rpc` and returns the response status line.
    async fn post_status_line(addr: SocketAddr, body: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let head = format!(
            "POST /rpc HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).lines().next().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn http_body_limit_follows_configured_maximum() {
        let state = Arc::new(ServerState {
            router: build_router(&McpToolsConfig::default()).unwrap(),
            max_body_bytes: 4 * 1024 * 1024,
            base_context: RequestContext::http(None),
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, http_app(state).into_make_service_with_connect_info::<SocketAddr>())
                .await
        });
        let body = vec![b' '; 3 * 1024 * 1024];
        assert_eq!(post_status_line(addr, &body).await, "HTTP/1.1 400 Bad Request");
    }

    #[test]
    fn read_framed_rejects_payload_over_limit() {
        let mut reader = BufReader::new(Cursor::new(frame(LIST_REQUEST)));
        let result = read_framed(&mut reader, LIST_REQUEST.len() - 1);
        assert!(result.is_err());
    }

    #[test]
    fn read_framed_accepts_payload_at_limit() {
        let mut reader = BufReader::new(Cursor::new(frame(LIST_REQUEST)));
        let bytes = read_framed(&mut reader, LIST_REQUEST.len()).unwrap().expect("payload read");
        assert_eq!(bytes, LIST_REQUEST);
    }

    #[test]
    fn read_framed_reports_clean_end_of_stream() {
        let mut stream = frame(LIST_REQUEST);
        stream.extend_from_slice(b"\r\n");
        let mut reader = BufReader::new(Cursor::new(stream));
        assert!(read_framed(&mut reader, 1024).unwrap().is_some());
        assert!(read_framed(&mut reader, 1024).unwrap().is_none());
    }

    #[test]
    fn read_framed_rejects_truncated_header() {
        let mut reader = BufReader::new(Cursor::new(b"Content-Length: 10\r\n".to_vec()));
        assert!(read_framed(&mut reader, 1024).is_err());
    }

    #[test]
    fn tools_list_returns_every_tool() {
        let router = build_router(&McpToolsConfig::default()).unwrap();
        let (status, response) = handle_request(
            &router,
            &RequestContext::stdio(),
            request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
        );
        assert_eq!(status, StatusCode::OK);
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["result"]["tools"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn tools_call_wraps_envelope_as_json_content() {
        let router = build_router(&McpToolsConfig::default()).unwrap();
        let (status, response) = handle_request(
            &router,
            &RequestContext::stdio(),
            request(json!({
                "jsonrpc": "2.0",
                "id": "a",
                "method": "tools/call",
                "params": {"name": "get_field_mapping", "arguments": {"content_type": "page"}}
            })),
        );
        assert_eq!(status, StatusCode::OK);
        let value = serde_json::to_value(response).unwrap();
        let content = &value["result"]["content"][0];
        assert_eq!(content["type"], "json");
        assert_eq!(content["json"]["success"], true);
        assert_eq!(content["json"]["data"]["content_type"], "page");
    }

    #[test]
    fn unknown_tool_and_method_map_to_method_not_found() {
        let router = build_router(&McpToolsConfig::default()).unwrap();
        let context = RequestContext::stdio();
        let (status, response) = handle_request(
            &router,
            &context,
            request(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "drop_tables", "arguments": {}}
            })),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(serde_json::to_value(response).unwrap()["error"]["code"], -32601);

        let (_, response) = handle_request(
            &router,
            &context,
            request(json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"})),
        );
        assert_eq!(serde_json::to_value(response).unwrap()["error"]["code"], -32601);
    }

    #[test]
    fn rejects_wrong_version_and_bad_params() {
        let router = build_router(&McpToolsConfig::default()).unwrap();
        let context = RequestContext::stdio();
        let (status, response) = handle_request(
            &router,
            &context,
            request(json!({"jsonrpc": "1.0", "id": 1, "method": "tools/list"})),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(serde_json::to_value(response).unwrap()["error"]["code"], -32600);

        let (_, response) = handle_request(
            &router,
            &context,
            request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": 7})),
        );
        assert_eq!(serde_json::to_value(response).unwrap()["error"]["code"], -32602);
    }
}
