// Route handlers, one module per API area.

pub mod clustering;
pub mod geo;
pub mod insights;
pub mod nlp;
pub mod pipeline;

use axum::response::Response;

use crate::pipeline::{PipelineRunner, Stage, StageReport};
use crate::web::{busy, pipeline_error, AppState};

/// Run `stages` inline for a trigger route, or answer 409 if a run is active.
async fn run_stages(state: &AppState, stages: &[Stage]) -> Result<Vec<StageReport>, Response> {
    let Ok(_guard) = state.run_lock.try_lock() else {
        return Err(busy());
    };
    PipelineRunner::new(&state.config, &state.resources)
        .run(stages)
        .await
        .map_err(|e| pipeline_error(&e))
}
