// Web server — Axum JSON API over the pipeline artifacts.
//
// Read routes aggregate the CSV tables on each request. Trigger routes run
// pipeline stages in-process against the shared `Resources`; only one run
// may be active at a time, and a trigger that finds one in progress gets
// 409 Conflict.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{find_pipeline_error, PipelineError};
use crate::pipeline::Resources;

pub mod handlers;
pub mod run_job;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resources: Arc<Resources>,
    /// Held for the duration of any stage run started from the API.
    pub run_lock: Arc<Mutex<()>>,
    pub run_status: Arc<RwLock<run_job::RunStatus>>,
}

impl AppState {
    pub fn new(config: Config, resources: Resources) -> Self {
        Self {
            config: Arc::new(config),
            resources: Arc::new(resources),
            run_lock: Arc::new(Mutex::new(())),
            run_status: Arc::new(RwLock::new(run_job::RunStatus::default())),
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: Config, resources: Resources) -> Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let app = build_router(AppState::new(config, resources));

    info!("transit-insight API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/nlp/process", post(handlers::nlp::process_text))
        .route("/nlp/sentiment", post(handlers::nlp::run_sentiment))
        .route("/nlp/topics", post(handlers::nlp::run_topics))
        .route("/clustering/cluster", post(handlers::clustering::count_items))
        .route("/clustering/run", post(handlers::clustering::run_clusters))
        .route("/geo/locate", get(handlers::geo::locate))
        .route("/insights", get(handlers::insights::get_insights))
        .route("/insights/", get(handlers::insights::get_insights))
        .route("/insights/summary", get(handlers::insights::get_summary))
        .route("/pipeline/run", post(handlers::pipeline::trigger_run))
        .route("/pipeline/status", get(handlers::pipeline::get_status))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// Map a pipeline failure to a status code and `{error}` body.
pub fn pipeline_error(err: &anyhow::Error) -> Response {
    let status = match find_pipeline_error(err) {
        Some(PipelineError::Busy { .. }) => StatusCode::CONFLICT,
        Some(PipelineError::EmptyCorpus { .. }) | Some(PipelineError::MalformedRow { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Some(PipelineError::ExternalService { .. }) => StatusCode::BAD_GATEWAY,
        Some(PipelineError::MissingInput { .. })
        | Some(PipelineError::Misaligned { .. })
        | None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %format!("{err:#}"), "Request failed");
    }
    api_error(status, &format!("{err:#}"))
}

/// Response for a trigger that found another run in progress.
pub fn busy() -> Response {
    api_error(
        StatusCode::CONFLICT,
        "A pipeline run is already in progress",
    )
}
