// Background pipeline run, triggered by POST /pipeline/run.
//
// The trigger takes the run lock before spawning, so the 409 check and the
// start of the run can't race. The task owns the guard and releases it when
// the run finishes, successfully or not. All stages run under one
// data-directory lock, so a CLI run can't start between them.

use chrono::Utc;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info};

use crate::pipeline::{PipelineRunner, Stage};
use crate::web::AppState;

/// Live status of the background run, exposed via GET /pipeline/status.
#[derive(Debug, Clone, Default)]
pub struct RunStatus {
    pub running: bool,
    /// RFC 3339 start time of the current or last run.
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    /// Stage currently running, or a summary once finished.
    pub progress_message: String,
    pub last_error: Option<String>,
}

/// Spawn the full pipeline. Returns immediately; callers poll the status.
pub fn launch_run(state: AppState, guard: OwnedMutexGuard<()>) {
    tokio::spawn(async move {
        let _guard = guard;
        run(state).await;
    });
}

async fn run(state: AppState) {
    {
        let mut status = state.run_status.write().await;
        status.running = true;
        status.started_at = Some(Utc::now().to_rfc3339());
        status.finished_at = None;
        status.last_error = None;
    }

    let runner = PipelineRunner::new(&state.config, &state.resources);
    let progress = state.run_status.clone();
    let outcome = runner
        .run_with_progress(&Stage::ALL, |stage| {
            let progress = progress.clone();
            async move {
                progress.write().await.progress_message = format!("Running {stage}…");
            }
        })
        .await;

    let (processed, failure) = match outcome {
        Ok(reports) => (reports.last().map(|r| r.documents).unwrap_or(0), None),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Background run failed");
            (0, Some(format!("{e:#}")))
        }
    };

    let mut status = state.run_status.write().await;
    status.running = false;
    status.finished_at = Some(Utc::now().to_rfc3339());
    match failure {
        None => {
            info!(documents = processed, "Background run completed");
            status.progress_message = format!("Completed: {processed} documents");
        }
        Some(message) => {
            status.progress_message = "Run failed — see server logs".to_string();
            status.last_error = Some(message);
        }
    }
}
