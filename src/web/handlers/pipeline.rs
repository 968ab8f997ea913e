// Background pipeline runs.
//
// POST /pipeline/run    — start every stage in a background task (202),
//                         or 409 if a run is already active
// GET  /pipeline/status — live run status plus the artifact checklist

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::status::next_stage;
use crate::store::{Artifact, DataDir};
use crate::web::run_job::launch_run;
use crate::web::{busy, AppState};

pub async fn trigger_run(State(state): State<AppState>) -> Response {
    let Ok(guard) = state.run_lock.clone().try_lock_owned() else {
        return busy();
    };

    {
        let mut status = state.run_status.write().await;
        status.running = true;
        status.progress_message = "Starting run…".to_string();
    }
    launch_run(state, guard);

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "message": "Pipeline run started" })),
    )
        .into_response()
}

pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.run_status.read().await.clone();
    let data = DataDir::new(&state.config.data_dir);

    let artifacts: serde_json::Map<String, serde_json::Value> = Artifact::ALL
        .iter()
        .map(|a| (a.file_name().to_string(), data.exists(*a).into()))
        .collect();

    Json(serde_json::json!({
        "running": status.running,
        "started_at": status.started_at,
        "finished_at": status.finished_at,
        "progress_message": status.progress_message,
        "last_error": status.last_error,
        "next_stage": next_stage(&data).map(|s| s.name()),
        "artifacts": artifacts,
    }))
}
