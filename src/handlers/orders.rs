use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::models::{EvidenceInput, Order, OrderProof};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CompleteOrderRequest {
    pub actor_id: u64,
    pub evidence: EvidenceInput,
}

#[derive(Debug, Serialize)]
pub struct CompleteOrderResponse {
    pub order: Order,
    pub proof_hash: String,
}

pub async fn complete_order(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
    Json(request): Json<CompleteOrderRequest>,
) -> Result<Json<CompleteOrderResponse>, ServiceError> {
    let (order, proof_hash) = state
        .completion
        .complete_order(order_id, request.actor_id, request.evidence)
        .await?;
    Ok(Json(CompleteOrderResponse { order, proof_hash }))
}

#[derive(Debug, Deserialize)]
pub struct ProofQuery {
    pub requester_id: u64,
}

pub async fn get_order_proof(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
    Query(query): Query<ProofQuery>,
) -> Result<Json<OrderProof>, ServiceError> {
    let proof = state
        .completion
        .get_order_proof(order_id, query.requester_id)
        .await?;
    Ok(Json(proof))
}
