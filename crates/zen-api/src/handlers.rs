//! Route handler functions for all API endpoints.
//!
//! `/api/chat` streams `text/plain` frames from a spawned pump task; the
//! remaining handlers return JSON.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use zen_chat::{forward, ChatRequest, Frame};

use crate::error::ApiError;
use crate::state::AppState;

/// Frames buffered between the pump task and the response body.
const FRAME_BUFFER: usize = 8;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Largest chat body that is parsed. Anything bigger is treated like an
/// unparseable body.
pub const MAX_CHAT_BODY: usize = 1024 * 1024;

/// Current UTC time as an RFC 3339 string with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatTestResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnvStatus {
    #[serde(rename = "hasOpenAIKey")]
    pub has_openai_key: bool,
    #[serde(rename = "keyLength")]
    pub key_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TestStatusResponse {
    pub message: String,
    pub timestamp: String,
    pub env: EnvStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EchoResponse {
    pub message: String,
    pub body: Value,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub mock_mode: bool,
}

// =============================================================================
// Chat
// =============================================================================

/// POST /api/chat - stream a reply to the last user turn.
///
/// A body that is too large or does not parse is treated as an empty
/// conversation, so the client still receives a general reply. The pump
/// task stops as soon as the client drops the connection.
pub async fn chat(State(state): State<AppState>, body: Body) -> Response {
    let request = read_chat_request(body).await;
    tracing::info!(
        turns = request.messages.len(),
        last = %request.last_content(),
        "Chat request received"
    );

    let frames = state.workflow.respond(&request.messages).await;

    let (tx, rx) = mpsc::channel::<Frame>(FRAME_BUFFER);
    tokio::spawn(async move {
        let outcome = forward(frames, tx).await;
        tracing::debug!(
            frames_sent = outcome.frames_sent,
            completed = outcome.completed,
            "Chat stream finished"
        );
    });

    let body = Body::from_stream(
        ReceiverStream::new(rx).map(|frame| Ok::<_, Infallible>(frame.into_string())),
    );

    ([(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)], body).into_response()
}

async fn read_chat_request(body: Body) -> ChatRequest {
    let bytes = match axum::body::to_bytes(body, MAX_CHAT_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable chat body; treating as empty conversation");
            return ChatRequest::default();
        }
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unparseable chat request; treating as empty conversation");
        ChatRequest::default()
    })
}

/// POST /api/chat-test - non-streaming upstream round trip.
///
/// Fails with 500 when no upstream model is configured or the call fails;
/// there is no template fallback here.
pub async fn chat_test(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatTestResponse>, ApiError> {
    let request: ChatRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::Upstream(e.to_string()))?;

    let message = state.workflow.complete(&request.messages).await.map_err(|e| {
        tracing::error!(error = %e, "Chat test failed");
        ApiError::from(e)
    })?;

    Ok(Json(ChatTestResponse {
        success: true,
        message,
        timestamp: timestamp(),
    }))
}

// =============================================================================
// Diagnostics
// =============================================================================

/// GET /api/test - liveness plus whether a credential is present.
///
/// Only the key length is reported, never the key.
pub async fn test_get(State(state): State<AppState>) -> Json<TestStatusResponse> {
    let key_length = state
        .config
        .upstream
        .api_key
        .as_deref()
        .map(|k| k.chars().count())
        .unwrap_or(0);

    Json(TestStatusResponse {
        message: "API is working".to_string(),
        timestamp: timestamp(),
        env: EnvStatus {
            has_openai_key: key_length > 0,
            key_length,
        },
    })
}

/// POST /api/test - echo a JSON body back.
pub async fn test_post(body: Bytes) -> Result<Json<EchoResponse>, ApiError> {
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Test endpoint received invalid JSON");
        ApiError::BadRequest("Invalid JSON".to_string())
    })?;

    Ok(Json(EchoResponse {
        message: "POST request received".to_string(),
        body,
        timestamp: timestamp(),
    }))
}

/// GET /health - service health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        mock_mode: state.workflow.is_mock(),
    })
}
