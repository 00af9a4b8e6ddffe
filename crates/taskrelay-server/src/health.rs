use axum::{extract::State, Json};
use serde::Serialize;
use taskrelay_core::QueueStats;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub queue: QueueStats,
}

/// GET /health - liveness probe with enrichment queue counters
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let queue = state.relay.queue();
    Json(HealthResponse {
        status: if queue.is_closed() { "draining" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        queue: queue.stats(),
    })
}
