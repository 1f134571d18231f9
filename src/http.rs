//! HTTP surface for the accepted-answer endpoints.
//!
//! Mirrors the forum's `/solution` mount point. Identity comes from the
//! fronting application in the `x-solved-user` header; this layer never
//! authenticates.
//!
//! Prometheus metrics are served separately by [`run_metrics_server`].

use crate::db::DbError;
use crate::error::SolvedError;
use crate::solved::{Actor, SolvedService};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tracing::{Instrument, warn};

/// Header carrying the upstream-authenticated user id.
pub const ACTOR_HEADER: &str = "x-solved-user";

#[derive(Clone)]
struct AppState {
    service: SolvedService,
}

#[derive(Debug, Deserialize)]
struct PostIdBody {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct AnnotateBody {
    topic_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct CategoryBody {
    name: Option<String>,
    accepts_answers: bool,
}

impl IntoResponse for SolvedError {
    fn into_response(self) -> Response {
        if let SolvedError::StorageFailure(ref e) = self {
            tracing::error!(error = %e, "Storage failure");
        }
        (self.status(), Json(json!({ "error": self.error_code() }))).into_response()
    }
}

fn success() -> Json<serde_json::Value> {
    Json(json!({ "success": "OK" }))
}

/// Build the `/solution` router around `service`.
pub fn router(service: SolvedService) -> Router {
    Router::new()
        .route("/solution/accept", post(accept_handler))
        .route("/solution/unaccept", post(unaccept_handler))
        .route("/t/:topic_id/accepted_answer", get(accepted_answer_handler))
        .route("/t/:topic_id/post_actions", get(post_actions_handler))
        .route("/topics/annotate", post(annotate_handler))
        .route("/categories/:category_id", put(category_handler))
        .with_state(AppState { service })
}

/// Resolve the request's actor. Unknown or malformed ids are anonymous.
async fn resolve_actor(service: &SolvedService, headers: &HeaderMap) -> Result<Actor, DbError> {
    let Some(raw) = headers.get(ACTOR_HEADER) else {
        return Ok(Actor::Anonymous);
    };
    let Some(user_id) = raw.to_str().ok().and_then(|s| s.trim().parse::<i64>().ok()) else {
        warn!(header = ?raw, "Malformed actor header, treating as anonymous");
        return Ok(Actor::Anonymous);
    };
    match service.database().users().find(user_id).await? {
        Some(user) => Ok(Actor::from(user)),
        None => {
            warn!(user_id, "Unknown actor id, treating as anonymous");
            Ok(Actor::Anonymous)
        }
    }
}

async fn accept_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PostIdBody>,
) -> Result<Json<serde_json::Value>, SolvedError> {
    let service = &state.service;
    async {
        let actor = resolve_actor(service, &headers).await?;
        let topic_id = service.topic_of_post(body.id).await?;
        service.accept(topic_id, body.id, &actor).await?;
        Ok::<_, SolvedError>(success())
    }
    .instrument(crate::telemetry::spans::request("POST", "/solution/accept"))
    .await
}

async fn unaccept_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PostIdBody>,
) -> Result<Json<serde_json::Value>, SolvedError> {
    let service = &state.service;
    async {
        let actor = resolve_actor(service, &headers).await?;
        let topic_id = service.topic_of_post(body.id).await?;
        service.unaccept(topic_id, body.id, &actor).await?;
        Ok::<_, SolvedError>(success())
    }
    .instrument(crate::telemetry::spans::request("POST", "/solution/unaccept"))
    .await
}

async fn accepted_answer_handler(
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> Result<Json<serde_json::Value>, SolvedError> {
    let answer = state.service.accepted_answer(topic_id).await?;
    Ok(Json(json!({ "accepted_answer": answer })))
}

async fn post_actions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(topic_id): Path<i64>,
) -> Result<Json<serde_json::Value>, SolvedError> {
    let actor = resolve_actor(&state.service, &headers).await?;
    let actions = state.service.post_actions(&actor, topic_id).await?;
    Ok(Json(json!({ "post_actions": actions })))
}

async fn annotate_handler(
    State(state): State<AppState>,
    Json(body): Json<AnnotateBody>,
) -> Result<Json<serde_json::Value>, SolvedError> {
    let marks = state.service.annotate_topics(&body.topic_ids).await?;
    let topics: Vec<_> = body
        .topic_ids
        .iter()
        .map(|id| json!({ "id": id, "has_accepted_answer": marks.get(id).copied().unwrap_or(false) }))
        .collect();
    Ok(Json(json!({ "topics": topics })))
}

/// Category configuration edit. Staff only.
async fn category_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(category_id): Path<i64>,
    Json(body): Json<CategoryBody>,
) -> Result<Response, SolvedError> {
    let service = &state.service;
    let actor = resolve_actor(service, &headers).await?;
    if !actor.is_staff() {
        return Ok((StatusCode::FORBIDDEN, Json(json!({ "error": "not_authorized" }))).into_response());
    }

    let mut category = service
        .database()
        .categories()
        .find(category_id)
        .await?
        .ok_or_else(|| SolvedError::NotFound(format!("category {category_id}")))?;
    if let Some(name) = body.name {
        category.name = name;
    }
    category.accepts_answers = body.accepts_answers;
    service.save_category(&category).await?;

    Ok(success().into_response())
}

/// Run the `/solution` HTTP server on `addr`.
pub async fn run_http_server(addr: SocketAddr, service: SolvedService) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, router(service)).await
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Run the HTTP server for Prometheus metrics.
///
/// Binds to `0.0.0.0:port` and serves the `/metrics` endpoint.
/// This is a long-running task that should be spawned in the background.
pub async fn run_metrics_server(port: u16) {
    let app = Router::new().route("/metrics", get(metrics_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Prometheus HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("HTTP server error: {}", e);
    }
}
