//! services/bot/src/web/rest.rs
//!
//! Contains the Axum handlers for the webhook endpoints, the router that wires
//! them together, and the master definition for the OpenAPI specification.

use crate::web::{
    dispatch::DocumentUpload,
    middleware::require_secret,
    protocol::{BotResponse, Button, Keyboard, Reply, Update},
    state::AppState,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderMap, StatusCode},
    middleware as axum_middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use pdf_reader_core::UserId;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;
use utoipa::OpenApi;

pub const CHAT_ID_HEADER: &str = "x-chat-id";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        update_handler,
        document_handler,
        health_handler,
    ),
    components(
        schemas(Update, Reply, Keyboard, Button, BotResponse)
    ),
    tags(
        (name = "PDF Reader Bot", description = "Webhook endpoints for the chat-based PDF reader.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the web router. Webhook routes sit behind the shared-secret middleware.
pub fn router(app_state: Arc<AppState>) -> Router {
    let webhook_routes = Router::new()
        .route("/updates", post(update_handler))
        .route("/updates/document", post(document_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_secret,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(webhook_routes)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

//=========================================================================================
// Webhook Handlers
//=========================================================================================

/// Handle a command, text message or button press.
#[utoipa::path(
    post,
    path = "/updates",
    request_body = Update,
    responses(
        (status = 200, description = "Replies to render in the chat", body = BotResponse),
        (status = 401, description = "Missing or wrong webhook secret"),
        (status = 422, description = "Malformed update")
    )
)]
pub async fn update_handler(
    State(app_state): State<Arc<AppState>>,
    Json(update): Json<Update>,
) -> Json<BotResponse> {
    let replies = app_state.dispatcher.handle_update(update).await;
    Json(BotResponse { replies })
}

/// Handle a document upload.
///
/// Accepts a multipart/form-data request with a single file part.
/// A `x-chat-id` header is required to associate the document with a user.
#[utoipa::path(
    post,
    path = "/updates/document",
    request_body(content_type = "multipart/form-data", description = "The PDF document to load."),
    responses(
        (status = 200, description = "Replies to render in the chat", body = BotResponse),
        (status = 400, description = "Bad request (e.g., missing header or file)"),
        (status = 401, description = "Missing or wrong webhook secret"),
        (status = 413, description = "File too large")
    ),
    params(
        ("x-chat-id" = i64, Header, description = "The chat the document was sent in.")
    )
)]
pub async fn document_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<BotResponse>, (StatusCode, String)> {
    let chat_id = headers
        .get(CHAT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "x-chat-id header is required".to_string(),
            )
        })?
        .trim()
        .parse::<i64>()
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "Invalid x-chat-id format".to_string(),
            )
        })?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            error!("Failed to read multipart data: {}", e);
            (e.status(), format!("Failed to read multipart data: {}", e))
        })?
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Multipart form must include a file".to_string(),
            )
        })?;

    let file_name = field
        .file_name()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("untitled.pdf")
        .to_string();
    let mime_type = field.content_type().map(str::to_string);
    let data = field.bytes().await.map_err(|e| {
        error!("Failed to read file bytes: {}", e);
        (e.status(), format!("Failed to read file bytes: {}", e))
    })?;

    let upload = DocumentUpload {
        file_name,
        mime_type,
        data,
    };
    let replies = app_state
        .dispatcher
        .handle_document(UserId(chat_id), upload)
        .await;
    Ok(Json(BotResponse { replies }))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up"))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}
