use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::Invoice;

/// Event pushed to the order's owner after a payment completes. Delivery is
/// best effort; the payment outcome is already committed when this fires.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentNotification {
    pub order_id: u64,
    pub payment_id: u64,
    pub customer_id: u64,
    pub amount: String,
    pub tx_hash: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_payment_completed(
        &self,
        notification: PaymentNotification,
    ) -> Result<(), ServiceError>;
}

/// Posts notifications to a configured webhook endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_payment_completed(
        &self,
        notification: PaymentNotification,
    ) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(&self.url)
            .json(&notification)
            .send()
            .await
            .map_err(|e| ServiceError::InternalError(format!("Notification send: {}", e)))?;

        if response.status().is_success() {
            tracing::debug!(
                "Payment notification delivered for order {}",
                notification.order_id
            );
        } else {
            tracing::warn!(
                "Notification endpoint rejected event: {}",
                response.status()
            );
        }
        Ok(())
    }
}

/// Logs the event without delivering it anywhere. Used when no webhook is
/// configured, and in tests.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_payment_completed(
        &self,
        notification: PaymentNotification,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            order_id = notification.order_id,
            payment_id = notification.payment_id,
            "Payment completed notification"
        );
        Ok(())
    }
}

#[async_trait]
pub trait ReceiptGenerator: Send + Sync {
    /// Renders a receipt artifact for a completed invoice and returns an
    /// opaque reference to it.
    async fn generate(&self, invoice: &Invoice) -> Result<String, ServiceError>;
}

/// Placeholder renderer standing in for the PDF pipeline: mints a stable
/// artifact reference without producing a document.
#[derive(Debug, Default)]
pub struct StubReceiptGenerator;

#[async_trait]
impl ReceiptGenerator for StubReceiptGenerator {
    async fn generate(&self, invoice: &Invoice) -> Result<String, ServiceError> {
        let artifact = format!("receipt-{}-{}", invoice.id, Uuid::new_v4());
        tracing::info!(
            payment_id = invoice.id,
            artifact = %artifact,
            "Receipt artifact generated"
        );
        Ok(artifact)
    }
}
