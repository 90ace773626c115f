use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// One variant per machine-readable verification error code, so callers can
/// match exhaustively instead of sniffing message strings.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("Payment {0} not found")]
    PaymentNotFound(u64),

    #[error("Order {0} not found")]
    OrderNotFound(u64),

    #[error("Payment {payment_id} does not belong to order {order_id}")]
    OrderMismatch { payment_id: u64, order_id: u64 },

    #[error("Chain RPC unavailable: {0}")]
    RpcUnavailable(String),

    #[error("Connected to chain {actual}, expected {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Timed out waiting for transaction {0} to confirm")]
    TxTimeout(String),

    #[error("Transaction {0} failed on-chain")]
    TxFailed(String),

    #[error("Transferred amount {actual} does not match expected {expected}")]
    AmountMismatch { expected: String, actual: String },

    #[error("Transfer destination {actual} does not match platform address {expected}")]
    DestMismatch { expected: String, actual: String },

    #[error("No completion proof recorded for order {0}")]
    ProofNotFound(u64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Stable machine-readable code, mirrored into the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidTxHash(_) => "INVALID_TX_HASH",
            ServiceError::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            ServiceError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            ServiceError::OrderMismatch { .. } => "ORDER_MISMATCH",
            ServiceError::RpcUnavailable(_) => "RPC_UNAVAILABLE",
            ServiceError::ChainMismatch { .. } => "CHAIN_MISMATCH",
            ServiceError::TxTimeout(_) => "TX_TIMEOUT",
            ServiceError::TxFailed(_) => "TX_FAILED",
            ServiceError::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            ServiceError::DestMismatch { .. } => "DEST_MISMATCH",
            ServiceError::ProofNotFound(_) => "PROOF_NOT_FOUND",
            ServiceError::ConfigError(_) => "CONFIG_ERROR",
            ServiceError::StorageError(_) => "STORAGE_ERROR",
            ServiceError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidTxHash(_) => StatusCode::BAD_REQUEST,
            ServiceError::PaymentNotFound(_)
            | ServiceError::OrderNotFound(_)
            | ServiceError::ProofNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::OrderMismatch { .. } => StatusCode::CONFLICT,
            ServiceError::RpcUnavailable(_) => StatusCode::BAD_GATEWAY,
            ServiceError::TxTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::TxFailed(_)
            | ServiceError::AmountMismatch { .. }
            | ServiceError::DestMismatch { .. } => StatusCode::PAYMENT_REQUIRED,
            ServiceError::ChainMismatch { .. }
            | ServiceError::ConfigError(_)
            | ServiceError::StorageError(_)
            | ServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let error_code = self.code();

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
        };

        tracing::error!(
            error = ?self,
            error_code = error_code,
            "Request failed"
        );

        (self.http_status(), Json(body)).into_response()
    }
}
