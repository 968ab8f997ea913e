// GET /geo/locate?q= — resolve free text to a gazetteer place name.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::web::AppState;

#[derive(Deserialize)]
pub struct LocateQuery {
    pub q: String,
}

/// `location` is the canonical place name, or null when nothing matches.
pub async fn locate(
    State(state): State<AppState>,
    Query(params): Query<LocateQuery>,
) -> impl IntoResponse {
    let location = state.resources.gazetteer.lookup(&params.q);
    Json(serde_json::json!({ "query": params.q, "location": location }))
}
