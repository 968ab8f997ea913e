// NLP routes.
//
// POST /nlp/process   — normalize a single text
// POST /nlp/sentiment — run the clean and score stages
// POST /nlp/topics    — run the embed and topics stages

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::run_stages;
use crate::pipeline::Stage;
use crate::web::AppState;

#[derive(Deserialize)]
pub struct TextIn {
    pub text: String,
}

/// POST /nlp/process — the normalizer's working text for `text`.
pub async fn process_text(
    State(state): State<AppState>,
    Json(payload): Json<TextIn>,
) -> impl IntoResponse {
    let normalized = state.resources.normalizer.normalize(Some(&payload.text));
    Json(serde_json::json!({ "processed_text": normalized.aliased }))
}

/// POST /nlp/sentiment — clean raw_data.csv and score every document.
pub async fn run_sentiment(State(state): State<AppState>) -> Response {
    match run_stages(&state, &[Stage::Clean, Stage::Score]).await {
        Ok(reports) => {
            let processed = reports.last().map(|r| r.documents).unwrap_or(0);
            Json(serde_json::json!({ "status": "ok", "processed": processed })).into_response()
        }
        Err(response) => response,
    }
}

/// POST /nlp/topics — embed the cleaned corpus and assign topics.
///
/// The count excludes the outlier label.
pub async fn run_topics(State(state): State<AppState>) -> Response {
    match run_stages(&state, &[Stage::Embed, Stage::Topics]).await {
        Ok(reports) => {
            let topics = reports.last().and_then(|r| r.groups).unwrap_or(0);
            Json(serde_json::json!({ "topics": topics })).into_response()
        }
        Err(response) => response,
    }
}
