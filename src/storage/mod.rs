pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::H256;

use crate::error::ServiceError;
use crate::models::{Amount, Invoice, Order, PaymentProvider, TimelineEntry};

/// Row-level persistence consumed by the verification core. Each mutating
/// method is one atomic unit of work; the `*_if_pending` transitions are
/// compare-and-swap, applying only while the invoice is still Pending and
/// returning the post-operation row either way, so two concurrent
/// verifications cannot both commit.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn invoice(&self, payment_id: u64) -> Result<Option<Invoice>, ServiceError>;

    async fn order(&self, order_id: u64) -> Result<Option<Order>, ServiceError>;

    async fn create_order(&self, customer_id: u64) -> Result<Order, ServiceError>;

    async fn create_invoice(
        &self,
        order_id: u64,
        amount: Amount,
        provider: PaymentProvider,
    ) -> Result<Invoice, ServiceError>;

    /// Marks the invoice Completed with the hash and timestamp, and appends
    /// the payment timeline entry, in one atomic step.
    async fn complete_if_pending(
        &self,
        payment_id: u64,
        tx_hash: H256,
        completed_at: DateTime<Utc>,
        entry: TimelineEntry,
    ) -> Result<Invoice, ServiceError>;

    /// Marks the invoice Failed, keeping the hash for audit, and appends the
    /// failure timeline entry in the same atomic step. Like the completion
    /// path, the entry is only written when the transition actually applies.
    async fn fail_if_pending(
        &self,
        payment_id: u64,
        tx_hash: H256,
        entry: TimelineEntry,
    ) -> Result<Invoice, ServiceError>;

    async fn set_receipt_ref(
        &self,
        payment_id: u64,
        receipt_ref: String,
    ) -> Result<(), ServiceError>;

    /// Closes the order and appends the proof timeline entry atomically.
    async fn close_order_with_proof(
        &self,
        order_id: u64,
        entry: TimelineEntry,
    ) -> Result<Order, ServiceError>;

    async fn latest_timeline_entry(
        &self,
        order_id: u64,
        event: &str,
    ) -> Result<Option<TimelineEntry>, ServiceError>;

    async fn timeline(&self, order_id: u64) -> Result<Vec<TimelineEntry>, ServiceError>;
}
