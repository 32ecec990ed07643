//! HTTP transports: SSE sessions and streamable HTTP

use crate::config::{ServerConfig, Transport};
use crate::error::ServerError;
use crate::server::McpServer;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Responses queued per SSE session before senders wait
const SESSION_BUFFER: usize = 64;

type Sessions = Arc<RwLock<HashMap<Uuid, mpsc::Sender<String>>>>;

#[derive(Clone)]
struct AppState {
    server: Arc<McpServer>,
    sessions: Sessions,
    message_path: Arc<str>,
    keep_alive: std::time::Duration,
}

/// Removes an SSE session once its event stream is dropped
struct SessionGuard {
    id: Uuid,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(&self.id);
        info!(session_id = %self.id, "SSE session closed");
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: Option<String>,
}

/// Build the axum router for the configured HTTP transport
///
/// `/mcp` and `/health` are always mounted; the SSE stream and message
/// endpoint only in SSE mode.
pub fn router(server: Arc<McpServer>, config: &ServerConfig) -> Router {
    let state = AppState {
        server,
        sessions: Arc::new(RwLock::new(HashMap::new())),
        message_path: Arc::from(config.message_path.as_str()),
        keep_alive: config.keep_alive(),
    };

    let mut app = Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health));

    if config.transport == Transport::Sse {
        app = app
            .route(&config.sse_path, get(sse_handler))
            .route(&config.message_path, post(message_handler));

        // Accept the message path with or without its trailing slash
        let alternate = config.message_path.trim_end_matches('/');
        if !alternate.is_empty() && alternate != config.message_path {
            app = app.route(alternate, post(message_handler));
        }
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the HTTP transports until Ctrl+C
pub async fn serve_http(server: Arc<McpServer>, config: &ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("Serving MCP over {} on http://{}", config.transport, addr);
    if config.transport == Transport::Sse {
        info!(
            "SSE endpoint {} with messages at {}",
            config.sse_path, config.message_path
        );
    }

    axum::serve(listener, router(server, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// GET /sse: open a session and stream its responses
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel::<String>(SESSION_BUFFER);
    state
        .sessions
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(session_id, tx);
    info!(session_id = %session_id, "SSE session opened");

    let guard = SessionGuard {
        id: session_id,
        sessions: state.sessions.clone(),
    };
    let endpoint = format!("{}?session_id={}", state.message_path, session_id.simple());

    let messages = ReceiverStream::new(rx).map(move |payload| {
        let _session = &guard;
        Ok::<_, Infallible>(Event::default().event("message").data(payload))
    });
    let endpoint_event = Event::default().event("endpoint").data(endpoint);
    let stream = stream::once(async move { Ok::<_, Infallible>(endpoint_event) }).chain(messages);

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive).text("ping"))
}

/// POST /messages/?session_id=: accept a message for an SSE session
async fn message_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let Some(raw_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };
    let Ok(session_id) = Uuid::parse_str(&raw_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response();
    };

    let sender = state
        .sessions
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&session_id)
        .cloned();
    let Some(sender) = sender else {
        warn!(session_id = %session_id, "Message for unknown session");
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    let server = state.server.clone();
    tokio::spawn(async move {
        let Some(response) = server.handle_message(&body).await else {
            return;
        };
        match serde_json::to_string(&response) {
            Ok(payload) => {
                if sender.send(payload).await.is_err() {
                    debug!(session_id = %session_id, "Session closed before response was delivered");
                }
            }
            Err(e) => error!("Failed to encode response: {}", e),
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

/// POST /mcp: one JSON-RPC message per request
async fn mcp_handler(State(state): State<AppState>, body: String) -> Response {
    match state.server.handle_message(&body).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let info = state.server.info();
    Json(json!({
        "status": "ok",
        "name": info.name,
        "version": info.version,
        "tools": state.server.registry().len(),
    }))
}
