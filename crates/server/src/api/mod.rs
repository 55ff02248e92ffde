//! # Stylist API
//!
//! Thin HTTP layer over `Orchestrator::handle_turn`, thread memory, and
//! the wardrobe store.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::{get, post},
    Router,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, sync::Arc};
use utoipa::{OpenApi, ToSchema};

use stylist_core::orchestrator::{StylistRuntime, TurnOutcome};
use stylist_core::state::{ConversationThread, Diagnostic, Outfit, WeatherData};

pub type SharedState = Arc<StylistRuntime>;

/// Seconds between SSE heartbeats when no turn events arrive
const HEARTBEAT_SECS: u64 = 15;

// === API Types ===

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Omit to start a new thread
    thread_id: Option<String>,
    message: String,
    /// Overrides any location found in the message
    location: Option<String>,
    /// Overrides any occasion found in the message
    context: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    success: bool,
    thread_id: String,
    reply: String,
    routing_action: String,
    #[schema(value_type = Option<Object>)]
    weather_data: Option<WeatherData>,
    #[schema(value_type = Option<Object>)]
    final_outfit: Option<Outfit>,
    #[schema(value_type = Vec<Object>)]
    diagnostics: Vec<Diagnostic>,
    elapsed_ms: u64,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            success: outcome.success,
            thread_id: outcome.thread_id,
            reply: outcome.reply,
            routing_action: outcome.routing_action.to_string(),
            weather_data: outcome.weather_data,
            final_outfit: outcome.final_outfit,
            diagnostics: outcome.diagnostics,
            elapsed_ms: outcome.elapsed_ms,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse {
    success: bool,
    message: String,
}

impl ApiResponse {
    fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiResponse>) {
        (
            status,
            Json(ApiResponse {
                success: false,
                message: message.into(),
            }),
        )
    }
}

type ApiError = (StatusCode, Json<ApiResponse>);

// === OpenAPI Definition ===

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stylist API",
        version = "1.0.0",
        description = "Weather-aware outfit recommendations over a conversational thread"
    ),
    paths(
        health,
        chat,
        recommend,
        get_thread,
        delete_thread,
        get_config,
        wardrobe_stats
    ),
    components(schemas(ChatRequest, ChatResponse, ApiResponse)),
    tags(
        (name = "turns", description = "Conversation turns"),
        (name = "threads", description = "Conversation memory"),
        (name = "config", description = "Runtime configuration"),
        (name = "wardrobe", description = "Wardrobe store")
    )
)]
struct ApiDoc;

pub fn router(state: SharedState) -> Router {
    let thread_routes = Router::new().route("/:id", get(get_thread).delete(delete_thread));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/recommend", post(recommend))
        .nest("/api/v1/threads", thread_routes)
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/wardrobe/stats", get(wardrobe_stats))
        .route("/api/v1/events", get(events))
        .route("/api/v1/openapi.json", get(serve_openapi))
        .with_state(state)
}

// === Handlers ===

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = ApiResponse))
)]
async fn health() -> Json<ApiResponse> {
    Json(ApiResponse {
        success: true,
        message: "ok".to_string(),
    })
}

/// Handle one message on a thread
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "turns",
    request_body = ChatRequest,
    responses(
        (
            status = 200,
            description = "Turn outcome; `success` is false when the turn failed",
            body = ChatResponse
        ),
        (status = 400, description = "Empty message", body = ApiResponse)
    )
)]
async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let thread_id = req
        .thread_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(new_thread_id);
    run_turn(&state, &thread_id, req).await
}

/// One-shot recommendation on a fresh thread
#[utoipa::path(
    post,
    path = "/api/v1/recommend",
    tag = "turns",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Turn outcome", body = ChatResponse),
        (status = 400, description = "Empty message", body = ApiResponse)
    )
)]
async fn recommend(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    run_turn(&state, &new_thread_id(), req).await
}

async fn run_turn(
    state: &StylistRuntime,
    thread_id: &str,
    req: ChatRequest,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiResponse::error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    let outcome = state
        .orchestrator
        .handle_turn(
            thread_id,
            &req.message,
            req.location.as_deref(),
            req.context.as_deref(),
        )
        .await;
    Ok(Json(outcome.into()))
}

fn new_thread_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Conversation history for a thread
#[utoipa::path(
    get,
    path = "/api/v1/threads/{id}",
    tag = "threads",
    params(("id" = String, Path, description = "Thread id")),
    responses(
        (status = 200, description = "Thread history", body = Object),
        (status = 404, description = "Unknown thread", body = ApiResponse)
    )
)]
async fn get_thread(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationThread>, ApiError> {
    match state.orchestrator.threads().history(&id).await {
        Ok(Some(thread)) => Ok(Json(thread)),
        Ok(None) => Err(ApiResponse::error(
            StatusCode::NOT_FOUND,
            format!("thread {} not found", id),
        )),
        Err(e) => {
            tracing::error!(error = %e, thread_id = %id, "Thread lookup failed");
            Err(ApiResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "conversation memory is unavailable",
            ))
        }
    }
}

/// Forget a thread
#[utoipa::path(
    delete,
    path = "/api/v1/threads/{id}",
    tag = "threads",
    params(("id" = String, Path, description = "Thread id")),
    responses(
        (status = 200, description = "Thread removed", body = ApiResponse),
        (status = 404, description = "Unknown thread", body = ApiResponse)
    )
)]
async fn delete_thread(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    match state.orchestrator.threads().clear(&id).await {
        Ok(true) => Ok(Json(ApiResponse {
            success: true,
            message: format!("Thread {} deleted", id),
        })),
        Ok(false) => Err(ApiResponse::error(
            StatusCode::NOT_FOUND,
            format!("thread {} not found", id),
        )),
        Err(e) => {
            tracing::error!(error = %e, thread_id = %id, "Thread delete failed");
            Err(ApiResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "conversation memory is unavailable",
            ))
        }
    }
}

/// Effective settings with secrets reported as set / unset
#[utoipa::path(
    get,
    path = "/api/v1/config",
    tag = "config",
    responses((status = 200, description = "Redacted configuration", body = Object))
)]
async fn get_config(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(state.config.redacted())
}

/// Item counts per category, color, and material
#[utoipa::path(
    get,
    path = "/api/v1/wardrobe/stats",
    tag = "wardrobe",
    responses(
        (status = 200, description = "Wardrobe statistics", body = Object),
        (status = 500, description = "Store unavailable", body = ApiResponse)
    )
)]
async fn wardrobe_stats(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.wardrobe.stats().map_err(|e| {
        tracing::error!(error = %e, "Wardrobe stats failed");
        ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "wardrobe store is unavailable")
    })?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}

/// SSE stream of turn events with heartbeat
async fn events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            let next = tokio::time::timeout(
                std::time::Duration::from_secs(HEARTBEAT_SECS),
                rx.recv(),
            )
            .await;

            match next {
                Ok(Ok(event)) => {
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    return Some((Ok(Event::default().event("turn").data(json)), rx));
                }
                Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "SSE subscriber lagged");
                    continue;
                }
                Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => return None,
                Err(_) => return Some((Ok(Event::default().comment("heartbeat")), rx)),
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn serve_openapi() -> impl IntoResponse {
    let spec = ApiDoc::openapi().to_json().unwrap_or_default();
    Response::builder()
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(spec))
        .unwrap_or_default()
}
