use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::classes::{self, ClassError, ClassInfo};
use crate::config::AppConfig;
use crate::prediction::{ClassIndex, RawPrediction};
use crate::session::Session;
use crate::stabilizer::METRIC_PASSTHROUGH;

/// Shared state: one session, frames serialized through its mutex.
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(Session::from_config(cfg))
    }

    // History stays bounded even after a panicked frame; keep serving.
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/predict", post(predict))
        .route("/classes", get(list_classes).post(add_class))
        .route(
            "/classes/{index}/examples",
            post(record_example).delete(delete_examples),
        )
        .route("/classes/{index}/emoji", get(emoji_choices).put(set_emoji))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

pub struct ApiError(ClassError);

impl From<ClassError> for ApiError {
    fn from(e: ClassError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ClassError::UnknownClass(_) => StatusCode::NOT_FOUND,
            ClassError::LimitReached(_) | ClassError::NamesExhausted => StatusCode::CONFLICT,
            ClassError::EmptyEmoji => StatusCode::UNPROCESSABLE_ENTITY,
        };
        tracing::debug!(error = %self.0, %status, "class request rejected");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Malformed frames come back exactly as they were sent, including bodies
/// that are not JSON at all.
async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(value) = serde_json::from_slice::<Value>(&body) else {
        counter!(METRIC_PASSTHROUGH).increment(1);
        tracing::debug!(len = body.len(), "unparsable prediction body, passing through");
        return (StatusCode::OK, body).into_response();
    };

    let mut session = state.session();
    match RawPrediction::from_value(&value) {
        Some(raw) => {
            let outcome = session.on_frame(&raw);
            Json(serde_json::to_value(&outcome).unwrap_or(Value::Null)).into_response()
        }
        None => Json(session.stabilizer_mut().ingest_value(value)).into_response(),
    }
}

async fn list_classes(State(state): State<AppState>) -> Json<Value> {
    let session = state.session();
    Json(json!({
        "classes": session.classes().snapshot(),
        "maxClasses": session.classes().max_classes(),
        "outputEnabled": session.output_enabled(),
    }))
}

async fn add_class(State(state): State<AppState>) -> Result<(StatusCode, Json<ClassInfo>), ApiError> {
    let info = state.session().add_class()?;
    Ok((StatusCode::CREATED, Json(info)))
}

async fn record_example(
    State(state): State<AppState>,
    Path(index): Path<ClassIndex>,
) -> Result<Json<Value>, ApiError> {
    let mut session = state.session();
    let examples = session.record_example(index)?;
    Ok(Json(json!({
        "index": index,
        "examples": examples,
        "outputEnabled": session.output_enabled(),
    })))
}

async fn delete_examples(
    State(state): State<AppState>,
    Path(index): Path<ClassIndex>,
) -> Result<StatusCode, ApiError> {
    state.session().delete_class_data(index)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(serde::Deserialize)]
struct EmojiReq {
    emoji: String,
}

async fn set_emoji(
    State(state): State<AppState>,
    Path(index): Path<ClassIndex>,
    Json(body): Json<EmojiReq>,
) -> Result<Json<ClassInfo>, ApiError> {
    let mut session = state.session();
    session.set_emoji(index, &body.emoji)?;
    Ok(Json(session.classes().get(index)?.clone()))
}

async fn emoji_choices(
    State(state): State<AppState>,
    Path(index): Path<ClassIndex>,
) -> Result<Json<Value>, ApiError> {
    let session = state.session();
    let current = session.classes().get(index)?.emoji.clone();
    Ok(Json(json!({
        "current": current,
        "choices": classes::emoji_choices(index),
    })))
}
