use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::H256;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::ServiceError;
use crate::models::{
    Amount, Invoice, InvoiceStatus, Order, OrderStatus, PaymentProvider, TimelineEntry,
};

use super::PaymentStore;

#[derive(Debug, Default)]
struct StoreData {
    orders: HashMap<u64, Order>,
    invoices: HashMap<u64, Invoice>,
    timeline: Vec<TimelineEntry>,
    next_order_id: u64,
    next_invoice_id: u64,
}

/// In-memory store. One lock guards all tables, so every mutating method is
/// a single atomic unit of work, matching what the relational backend does
/// with a transaction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn invoice(&self, payment_id: u64) -> Result<Option<Invoice>, ServiceError> {
        Ok(self.data.read().await.invoices.get(&payment_id).cloned())
    }

    async fn order(&self, order_id: u64) -> Result<Option<Order>, ServiceError> {
        Ok(self.data.read().await.orders.get(&order_id).cloned())
    }

    async fn create_order(&self, customer_id: u64) -> Result<Order, ServiceError> {
        let mut data = self.data.write().await;
        data.next_order_id += 1;
        let order = Order {
            id: data.next_order_id,
            customer_id,
            status: OrderStatus::Open,
        };
        data.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn create_invoice(
        &self,
        order_id: u64,
        amount: Amount,
        provider: PaymentProvider,
    ) -> Result<Invoice, ServiceError> {
        let mut data = self.data.write().await;
        if !data.orders.contains_key(&order_id) {
            return Err(ServiceError::OrderNotFound(order_id));
        }
        data.next_invoice_id += 1;
        let invoice = Invoice::pending(data.next_invoice_id, order_id, amount, provider);
        data.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn complete_if_pending(
        &self,
        payment_id: u64,
        tx_hash: H256,
        completed_at: DateTime<Utc>,
        entry: TimelineEntry,
    ) -> Result<Invoice, ServiceError> {
        let mut data = self.data.write().await;
        let invoice = data
            .invoices
            .get_mut(&payment_id)
            .ok_or(ServiceError::PaymentNotFound(payment_id))?;

        if invoice.status != InvoiceStatus::Pending {
            return Ok(invoice.clone());
        }

        invoice.status = InvoiceStatus::Completed;
        invoice.tx_hash = Some(tx_hash);
        invoice.completed_at = Some(completed_at);
        let updated = invoice.clone();
        data.timeline.push(entry);
        Ok(updated)
    }

    async fn fail_if_pending(
        &self,
        payment_id: u64,
        tx_hash: H256,
        entry: TimelineEntry,
    ) -> Result<Invoice, ServiceError> {
        let mut data = self.data.write().await;
        let invoice = data
            .invoices
            .get_mut(&payment_id)
            .ok_or(ServiceError::PaymentNotFound(payment_id))?;

        if invoice.status != InvoiceStatus::Pending {
            return Ok(invoice.clone());
        }

        invoice.status = InvoiceStatus::Failed;
        invoice.tx_hash = Some(tx_hash);
        let updated = invoice.clone();
        data.timeline.push(entry);
        Ok(updated)
    }

    async fn set_receipt_ref(
        &self,
        payment_id: u64,
        receipt_ref: String,
    ) -> Result<(), ServiceError> {
        let mut data = self.data.write().await;
        let invoice = data
            .invoices
            .get_mut(&payment_id)
            .ok_or(ServiceError::PaymentNotFound(payment_id))?;
        invoice.receipt_ref = Some(receipt_ref);
        Ok(())
    }

    async fn close_order_with_proof(
        &self,
        order_id: u64,
        entry: TimelineEntry,
    ) -> Result<Order, ServiceError> {
        let mut data = self.data.write().await;
        let order = data
            .orders
            .get_mut(&order_id)
            .ok_or(ServiceError::OrderNotFound(order_id))?;
        order.status = OrderStatus::Closed;
        let updated = order.clone();
        data.timeline.push(entry);
        Ok(updated)
    }

    async fn latest_timeline_entry(
        &self,
        order_id: u64,
        event: &str,
    ) -> Result<Option<TimelineEntry>, ServiceError> {
        let data = self.data.read().await;
        Ok(data
            .timeline
            .iter()
            .rev()
            .find(|entry| entry.order_id == order_id && entry.event == event)
            .cloned())
    }

    async fn timeline(&self, order_id: u64) -> Result<Vec<TimelineEntry>, ServiceError> {
        let data = self.data.read().await;
        Ok(data
            .timeline
            .iter()
            .filter(|entry| entry.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PAYMENT_COMPLETED_EVENT, PAYMENT_FAILED_EVENT};
    use serde_json::json;

    async fn seed() -> (MemoryStore, Order, Invoice) {
        let store = MemoryStore::new();
        let order = store.create_order(10).await.unwrap();
        let invoice = store
            .create_invoice(
                order.id,
                Amount::new(5000, "USDC"),
                PaymentProvider::OnChain,
            )
            .await
            .unwrap();
        (store, order, invoice)
    }

    #[tokio::test]
    async fn complete_is_compare_and_swap() {
        let (store, order, invoice) = seed().await;
        let hash = H256::from_low_u64_be(1);
        let entry = TimelineEntry::new(order.id, PAYMENT_COMPLETED_EVENT, json!({"payment_id": invoice.id}));

        let first = store
            .complete_if_pending(invoice.id, hash, Utc::now(), entry.clone())
            .await
            .unwrap();
        assert_eq!(first.status, InvoiceStatus::Completed);

        // Second attempt with a different hash must not re-apply.
        let second = store
            .complete_if_pending(invoice.id, H256::from_low_u64_be(2), Utc::now(), entry)
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(store.timeline(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_invoice_stays_failed() {
        let (store, order, invoice) = seed().await;
        let entry = TimelineEntry::new(order.id, PAYMENT_FAILED_EVENT, json!({"code": "TX_FAILED"}));
        let failed = store
            .fail_if_pending(invoice.id, H256::from_low_u64_be(1), entry)
            .await
            .unwrap();
        assert_eq!(failed.status, InvoiceStatus::Failed);
        assert_eq!(failed.tx_hash, Some(H256::from_low_u64_be(1)));
        assert_eq!(store.timeline(order.id).await.unwrap().len(), 1);

        let entry = TimelineEntry::new(invoice.order_id, PAYMENT_COMPLETED_EVENT, json!({}));
        let after = store
            .complete_if_pending(invoice.id, H256::from_low_u64_be(2), Utc::now(), entry)
            .await
            .unwrap();
        assert_eq!(after.status, InvoiceStatus::Failed);
        // Entry from the no-op completion attempt must not be appended.
        assert_eq!(store.timeline(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn latest_entry_wins() {
        let (store, order, _invoice) = seed().await;
        store
            .close_order_with_proof(order.id, TimelineEntry::new(order.id, "order.completed", json!({"n": 1})))
            .await
            .unwrap();
        store
            .close_order_with_proof(order.id, TimelineEntry::new(order.id, "order.completed", json!({"n": 2})))
            .await
            .unwrap();

        let latest = store
            .latest_timeline_entry(order.id, "order.completed")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.details["n"], 2);
    }
}
