// Read-only insight routes over the final tables.
//
// GET /insights/        — per-topic dashboard from results.csv
// GET /insights/summary — counts and a sample from clusters.csv

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::insights;
use crate::store::DataDir;
use crate::web::{pipeline_error, AppState};

pub async fn get_insights(State(state): State<AppState>) -> Response {
    let data = DataDir::new(&state.config.data_dir);
    match insights::generate(&data, state.config.top_keywords) {
        Ok(view) => Json(view).into_response(),
        Err(e) => pipeline_error(&e),
    }
}

pub async fn get_summary(State(state): State<AppState>) -> Response {
    let data = DataDir::new(&state.config.data_dir);
    match insights::summary(&data) {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => pipeline_error(&e),
    }
}
