// SSE transport for MCP: GET /sse opens a session stream, POST /messages
// feeds JSON-RPC requests into it. The first event on the stream is an
// `endpoint` event telling the client where to POST.

use crate::api::ErrorResponse;
use crate::config::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::Stream;
use futures::StreamExt;
use nexonco_mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

/// Queued responses per session before the sender backpressures.
const SESSION_BUFFER: usize = 32;

/// Registry of live SSE sessions, keyed by the id handed out in the
/// `endpoint` event.
#[derive(Clone, Default)]
pub struct SseSessions {
    inner: Arc<RwLock<HashMap<Uuid, mpsc::Sender<JsonRpcResponse>>>>,
}

impl SseSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session, returning its id and the response receiver.
    pub fn open(&self) -> (Uuid, mpsc::Receiver<JsonRpcResponse>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.inner
            .write()
            .expect("session lock poisoned")
            .insert(id, tx);
        (id, rx)
    }

    /// Sender for a session, if it is still connected.
    pub fn sender(&self, id: &Uuid) -> Option<mpsc::Sender<JsonRpcResponse>> {
        self.inner
            .read()
            .expect("session lock poisoned")
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &Uuid) {
        self.inner
            .write()
            .expect("session lock poisoned")
            .remove(id);
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("session lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes the session from the registry when the client disconnects.
struct SessionGuard {
    sessions: SseSessions,
    id: Uuid,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        tracing::debug!(session_id = %self.id, "SSE session closed");
        self.sessions.remove(&self.id);
    }
}

/// GET /sse - open an SSE session.
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session_id, rx) = state.sessions.open();
    tracing::info!(session_id = %session_id, "SSE session opened");

    let endpoint_event = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={session_id}"));

    let guard = SessionGuard {
        sessions: state.sessions.clone(),
        id: session_id,
    };

    let messages = ReceiverStream::new(rx).map(|response| {
        Event::default()
            .event("message")
            .json_data(&response)
            // JsonRpcResponse serialization is infallible in practice.
            .unwrap_or_else(|_| Event::default().event("message").data("{}"))
    });

    let stream = futures::stream::once(async move { endpoint_event })
        .chain(messages)
        .map(move |event| {
            // Keep the guard alive for the lifetime of the stream.
            let _ = &guard;
            Ok(event)
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub session_id: Uuid,
}

/// POST /messages?session_id= - dispatch a JSON-RPC request for a session.
/// The response travels back over the session's SSE stream.
pub async fn messages_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let Some(sender) = state.sessions.sender(&query.session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Unknown session: {}",
                query.session_id
            ))),
        )
            .into_response();
    };

    let response = state.service.handle(request).await;

    if let Some(response) = response {
        if sender.send(response).await.is_err() {
            tracing::warn!(session_id = %query.session_id, "session closed mid-dispatch");
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Session closed")),
            )
                .into_response();
        }
    }

    StatusCode::ACCEPTED.into_response()
}
