/// Mock generator webhooks plus the stub topic/script endpoints.
/// Every handler logs what it received so a client can be debugged from
/// the server output alone.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::models::*;
use crate::storage::ScriptStore;

/// API error type
pub enum ApiError {
    /// Body was not the JSON the route expects; carries the route's failure message.
    Malformed(&'static str),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Malformed(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Ack::failed(message)),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

pub fn router(store: Arc<ScriptStore>) -> Router {
    Router::new()
        .route("/api/submitTopic", post(submit_topic))
        .route("/api/approveScript", post(approve_script))
        .route("/api/getScript", get(get_script))
        .route("/webhook/frontend", post(generate))
        .route("/webhook/approve", post(decide))
        .route("/webhook/approve-video", post(approve_video))
        .route("/webhook/reject-video", post(reject_video))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(store)
}

fn parse_body(body: &str, failure: &'static str) -> Result<Value, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        warn!("{}: {}", failure, e);
        ApiError::Malformed(failure)
    })
}

fn parse_typed<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::BadRequest(format!("Invalid body: {}", e)))
}

/// POST /api/submitTopic - Log the submission and acknowledge
pub async fn submit_topic(body: String) -> Result<Json<Ack>, ApiError> {
    let body = parse_body(&body, "Failed to submit topic")?;
    info!("Received topic submission: {}", body);
    Ok(Json(Ack::ok("Topic submitted successfully")))
}

/// POST /api/approveScript - Log the approval and acknowledge
pub async fn approve_script(body: String) -> Result<Json<Ack>, ApiError> {
    let body = parse_body(&body, "Failed to approve script")?;
    info!("Received script approval: {}", body);
    Ok(Json(Ack::ok("Script approved successfully")))
}

/// GET /api/getScript - Fixed sample script with production notes
pub async fn get_script() -> Json<MockScript> {
    Json(MockScript {
        script: "Welcome to our video on how to bake a cake! First, gather ingredients:\n\
                 - 2 cups of flour\n\
                 - 1 cup of sugar\n\
                 - 3 eggs\n\
                 - 1 cup of milk\n\
                 - 1/2 cup of butter\n\n\
                 Let's start by preheating the oven to 350°F (175°C). While that's heating up, \
                 we'll mix our dry ingredients together."
            .to_string(),
        media_notes: vec![
            "Show close-up of measuring cups".to_string(),
            "Display oven temperature setting".to_string(),
            "Show mixing bowl with dry ingredients".to_string(),
            "Include text overlay with ingredient measurements".to_string(),
        ],
    })
}

/// POST /webhook/frontend - Generate a script for a topic
pub async fn generate(
    State(store): State<Arc<ScriptStore>>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let req: GenerateBody = parse_typed(&body)?;
    if req.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("Topic is required".to_string()));
    }

    let tone = req.tone.as_deref().unwrap_or("Professional");
    let genre = req.genre.as_deref().unwrap_or("Educational");
    let record = store.create(req.topic.trim());
    info!(
        "Generated script {} for '{}' ({}, {}), request {:?} at {:?}",
        record.response_id, record.topic, tone, genre, req.id, req.timestamp
    );

    let text = format!(
        "[{genre} | {tone}]\n\nToday we're talking about {topic}.\n\n\
         Here's what you need to know about {topic}, and why it matters to you.\n\n\
         Thanks for watching!",
        topic = record.topic,
    );
    Ok(Json(json!({
        "content": { "text": text },
        "videoUrl": record.video_url,
        "responseId": record.response_id,
        "timestamp": record.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}

/// POST /webhook/approve - Approve a script or return a refined version
pub async fn decide(
    State(store): State<Arc<ScriptStore>>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let req: DecisionBody = parse_typed(&body)?;
    let response_id = match &req.response_id {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    match req.status.as_str() {
        "approved" => {
            if !store.mark_approved(&response_id) {
                warn!("Approval for unknown script {:?}", req.response_id);
            }
            info!("Script {} approved", response_id);
            Ok(Json(json!(Ack::ok("Script approved successfully"))))
        }
        "refine" => {
            let revision = store.record_revision(&response_id);
            info!(
                "Refining script {} (revision {}): {}",
                response_id, revision, req.feedback
            );
            let text = format!(
                "{}\n\n[Revision {}: {}]",
                req.content.text.trim_end(),
                revision,
                req.feedback.trim()
            );
            Ok(Json(json!({
                "text": text,
                "responseId": req.response_id,
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            })))
        }
        other => Err(ApiError::BadRequest(format!("Unknown status '{}'", other))),
    }
}

/// POST /webhook/approve-video
pub async fn approve_video(
    State(store): State<Arc<ScriptStore>>,
    body: String,
) -> Result<Json<Ack>, ApiError> {
    record_video(&store, &body, "Video approved")
}

/// POST /webhook/reject-video
pub async fn reject_video(
    State(store): State<Arc<ScriptStore>>,
    body: String,
) -> Result<Json<Ack>, ApiError> {
    record_video(&store, &body, "Video rejected")
}

fn record_video(store: &ScriptStore, body: &str, message: &str) -> Result<Json<Ack>, ApiError> {
    let req: VideoDecisionBody = parse_typed(body)?;
    if !store.record_video_decision(&req.video_url, &req.status) {
        warn!("Video decision for unknown video {}", req.video_url);
    }
    info!("{}: {}", message, req.video_url);
    Ok(Json(Ack::ok(message)))
}
