//! HTTP routes.
//!
//! [`router`] wires every endpoint onto an [`AppState`] holding the shared
//! database handle and both pipelines.

pub mod error;
pub mod params;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::{self, SharedConnection};
use crate::graph::{transcripts, users, view};
use crate::pipeline::{AnswerEngine, Ingestor};
use error::ApiError;
use params::{
    required, CreateUserBody, SearchParams, TranscriptSummary, UserParams, WebhookParams,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    db: SharedConnection,
    ingestor: Arc<Ingestor>,
    answers: Arc<AnswerEngine>,
    started: Instant,
}

impl AppState {
    pub fn new(db: SharedConnection, ingestor: Arc<Ingestor>, answers: Arc<AnswerEngine>) -> Self {
        Self {
            db,
            ingestor,
            answers,
            started: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/transcript", post(transcript_webhook))
        .route("/transcripts", get(list_transcripts))
        .route("/graph", get(graph))
        .route("/search", get(search))
        .route("/users", post(create_user).get(list_users))
        .route("/users/{id}", get(get_user))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": state.started.elapsed().as_secs_f64(),
    }))
}

async fn transcript_webhook(
    State(state): State<AppState>,
    Query(params): Query<WebhookParams>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = required(params.uid.as_deref()).ok_or_else(|| {
        ApiError::BadRequest("User ID (uid) is required as a query parameter".into())
    })?;
    let Json(payload) = body.map_err(|e| {
        tracing::debug!(error = %e, "rejected transcript body");
        ApiError::BadRequest("Invalid transcript data".into())
    })?;

    let report = state
        .ingestor
        .ingest(uid, payload)
        .await
        .map_err(ApiError::from_ingest)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Transcript stored successfully",
            "transcriptId": report.transcript_id,
            "report": report,
        })),
    ))
}

async fn list_transcripts(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<Vec<TranscriptSummary>>, ApiError> {
    let user_id = required(params.user_id.as_deref()).map(str::to_string);
    let records = db::with_conn(&state.db, move |conn| {
        transcripts::list_transcripts(conn, user_id.as_deref())
    })
    .await
    .map_err(|e| ApiError::internal("Failed to fetch transcripts", format!("{e:#}")))?;

    Ok(Json(records.into_iter().map(TranscriptSummary::from).collect()))
}

async fn graph(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = required(params.user_id.as_deref())
        .ok_or_else(|| ApiError::BadRequest("userId is required".into()))?
        .to_string();

    let view = db::with_conn(&state.db, move |conn| view::list_graph(conn, &user_id))
        .await
        .map_err(|e| ApiError::internal("Failed to fetch graph", format!("{e:#}")))?;

    Ok(Json(view))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(query), Some(user_id)) = (
        required(params.query.as_deref()),
        required(params.user_id.as_deref()),
    ) else {
        return Err(ApiError::BadRequest("query and userId are required".into()));
    };

    let answer = state
        .answers
        .answer(user_id, query)
        .await
        .map_err(ApiError::from_answer)?;

    Ok(Json(answer))
}

async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let missing = || ApiError::BadRequest("Name and email are required".into());
    let Json(body) = body.map_err(|_| missing())?;
    let (Some(name), Some(email)) = (required(body.name.as_deref()), required(body.email.as_deref()))
    else {
        return Err(missing());
    };

    let (name, email) = (name.to_string(), email.to_string());
    let user = db::with_conn(&state.db, move |conn| users::create_user(conn, &name, &email))
        .await
        .map_err(|e| ApiError::internal("Failed to create user", format!("{e:#}")))?;

    tracing::info!(user_id = %user.id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User created successfully",
            "userId": user.id,
        })),
    ))
}

async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let all = db::with_conn(&state.db, |conn| users::list_users(conn))
        .await
        .map_err(|e| ApiError::internal("Failed to fetch users", format!("{e:#}")))?;
    Ok(Json(all))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lookup = id.clone();
    let user = db::with_conn(&state.db, move |conn| users::get_user(conn, &lookup))
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user", format!("{e:#}")))?;

    user.map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {id}")))
}
