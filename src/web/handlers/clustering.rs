// Clustering routes.
//
// POST /clustering/cluster — count the items in a JSON array
// POST /clustering/run     — run the cluster stage over topics.csv

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::run_stages;
use crate::pipeline::Stage;
use crate::web::AppState;

#[derive(Deserialize)]
pub struct DataIn {
    pub data: Vec<serde_json::Value>,
}

pub async fn count_items(Json(payload): Json<DataIn>) -> impl IntoResponse {
    Json(serde_json::json!({ "n_items": payload.data.len() }))
}

pub async fn run_clusters(State(state): State<AppState>) -> Response {
    match run_stages(&state, &[Stage::Cluster]).await {
        Ok(reports) => {
            let clusters = reports.last().and_then(|r| r.groups).unwrap_or(0);
            Json(serde_json::json!({ "clusters": clusters })).into_response()
        }
        Err(response) => response,
    }
}
