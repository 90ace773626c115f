use axum::{
    extract::{Path, State},
    Json,
};
use ethers::types::TransactionReceipt;
use serde::Deserialize;

use crate::error::ServiceError;
use crate::models::Invoice;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub tx_hash: String,
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Path((order_id, payment_id)): Path<(u64, u64)>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<Invoice>, ServiceError> {
    let invoice = state
        .payments
        .verify_and_complete_payment(order_id, payment_id, &request.tx_hash)
        .await?;
    Ok(Json(invoice))
}

#[derive(Debug, Deserialize)]
pub struct VerifyFromReceiptRequest {
    pub tx_hash: String,
    pub receipt: TransactionReceipt,
}

/// Operator/test endpoint; the service rejects it in production.
pub async fn verify_payment_from_receipt(
    State(state): State<AppState>,
    Path((order_id, payment_id)): Path<(u64, u64)>,
    Json(request): Json<VerifyFromReceiptRequest>,
) -> Result<Json<Invoice>, ServiceError> {
    let invoice = state
        .payments
        .verify_and_complete_payment_from_receipt(
            order_id,
            payment_id,
            &request.tx_hash,
            request.receipt,
        )
        .await?;
    Ok(Json(invoice))
}
