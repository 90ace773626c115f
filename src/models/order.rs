use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timeline event label appended when a payment is verified and completed.
pub const PAYMENT_COMPLETED_EVENT: &str = "payment.completed";
/// Timeline event label appended when verification permanently fails a payment.
pub const PAYMENT_FAILED_EVENT: &str = "payment.failed";
/// Timeline event label carrying the completion proof for an order.
pub const ORDER_COMPLETED_EVENT: &str = "order.completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    InProgress,
    /// Terminal: physical work done and proof recorded.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub customer_id: u64,
    pub status: OrderStatus,
}

/// Append-only audit entry. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub order_id: u64,
    pub event: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TimelineEntry {
    pub fn new(order_id: u64, event: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            order_id,
            event: event.into(),
            details,
            created_at: Utc::now(),
        }
    }
}
