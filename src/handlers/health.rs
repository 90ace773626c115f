use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub chain_rpc: bool,
    pub timestamp: chrono::DateTime<Utc>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let chain_ok = state.chain.network_id().await.is_ok();

    let status = if chain_ok { "healthy" } else { "degraded" };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_rpc: chain_ok,
        timestamp: Utc::now(),
    })
}
