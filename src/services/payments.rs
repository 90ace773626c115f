use chrono::Utc;
use ethers::types::{TransactionReceipt, H256};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{Config, Environment};
use crate::error::ServiceError;
use crate::models::{
    Invoice, InvoiceStatus, Order, TimelineEntry, PAYMENT_COMPLETED_EVENT, PAYMENT_FAILED_EVENT,
};
use crate::storage::PaymentStore;

use super::amount::check_transfer;
use super::chain::ChainClient;
use super::notify::{Notifier, PaymentNotification, ReceiptGenerator};
use super::transfer::{find_token_transfer, native_transfer, ObservedTransfer};

/// Drives the verification of a submitted transaction hash against a pending
/// invoice and applies the outcome. Collaborators are injected at
/// construction; nothing here is process-global.
pub struct PaymentService {
    config: Config,
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn PaymentStore>,
    receipts: Arc<dyn ReceiptGenerator>,
    notifier: Arc<dyn Notifier>,
}

impl PaymentService {
    pub fn new(
        config: Config,
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn PaymentStore>,
        receipts: Arc<dyn ReceiptGenerator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            chain,
            store,
            receipts,
            notifier,
        }
    }

    /// Live verification path: confirms the transaction on-chain, checks it
    /// against the invoice and commits the resulting state transition.
    pub async fn verify_and_complete_payment(
        &self,
        order_id: u64,
        payment_id: u64,
        raw_tx_hash: &str,
    ) -> Result<Invoice, ServiceError> {
        let tx_hash = parse_tx_hash(raw_tx_hash)?;
        let (order, invoice) = self.load_checked(order_id, payment_id).await?;

        // Already settled: idempotent, return the stored record untouched.
        if invoice.status != InvoiceStatus::Pending {
            return Ok(invoice);
        }

        // Guard against a misconfigured or substituted RPC endpoint before
        // trusting anything it returns.
        let network_id = self.chain.network_id().await?;
        if network_id != self.config.chain_id {
            return Err(ServiceError::ChainMismatch {
                expected: self.config.chain_id,
                actual: network_id,
            });
        }

        let receipt = self
            .chain
            .wait_for_receipt(tx_hash, self.config.confirmations, self.config.receipt_timeout)
            .await?
            .ok_or_else(|| ServiceError::TxTimeout(format!("{:?}", tx_hash)))?;

        self.settle(order, invoice, tx_hash, receipt).await
    }

    /// Operator/test variant: accepts a pre-supplied receipt verbatim and
    /// skips the confirmation wait. Refused in production.
    pub async fn verify_and_complete_payment_from_receipt(
        &self,
        order_id: u64,
        payment_id: u64,
        raw_tx_hash: &str,
        receipt: TransactionReceipt,
    ) -> Result<Invoice, ServiceError> {
        if self.config.environment == Environment::Production {
            return Err(ServiceError::ConfigError(
                "Receipt injection is disabled in production".to_string(),
            ));
        }

        let tx_hash = parse_tx_hash(raw_tx_hash)?;
        let (order, invoice) = self.load_checked(order_id, payment_id).await?;
        if invoice.status != InvoiceStatus::Pending {
            return Ok(invoice);
        }

        self.settle(order, invoice, tx_hash, receipt).await
    }

    async fn load_checked(
        &self,
        order_id: u64,
        payment_id: u64,
    ) -> Result<(Order, Invoice), ServiceError> {
        let invoice = self
            .store
            .invoice(payment_id)
            .await?
            .ok_or(ServiceError::PaymentNotFound(payment_id))?;
        // Defense against replaying a hash against some other order's invoice.
        if invoice.order_id != order_id {
            return Err(ServiceError::OrderMismatch {
                payment_id,
                order_id,
            });
        }
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;
        Ok((order, invoice))
    }

    async fn settle(
        &self,
        order: Order,
        invoice: Invoice,
        tx_hash: H256,
        receipt: TransactionReceipt,
    ) -> Result<Invoice, ServiceError> {
        // A reverted transaction can never satisfy the invoice; the hash is
        // kept on the failed record for dispute handling.
        if receipt.status != Some(1.into()) {
            let err = ServiceError::TxFailed(format!("{:?}", tx_hash));
            self.fail(&invoice, tx_hash, &err).await?;
            return Err(err);
        }

        let observed = self.observe_transfer(tx_hash, &receipt).await?;

        if let Err(err) = check_transfer(
            &observed,
            &invoice.amount,
            self.config.token.decimals,
            self.config.platform_address,
            self.config.enforce_amount,
        ) {
            match err {
                // The transaction is mined and immutable, so these mismatches
                // are permanent: fail closed instead of leaving the invoice
                // retryable.
                ServiceError::AmountMismatch { .. } | ServiceError::DestMismatch { .. } => {
                    self.fail(&invoice, tx_hash, &err).await?;
                    return Err(err);
                }
                other => return Err(other),
            }
        }

        let asset = if observed.native {
            self.config.native_symbol.clone()
        } else {
            self.config.token.symbol.clone()
        };
        let completed_at = Utc::now();
        let entry = TimelineEntry::new(
            invoice.order_id,
            PAYMENT_COMPLETED_EVENT,
            json!({
                "payment_id": invoice.id,
                "tx_hash": format!("{:?}", tx_hash),
                "network": self.config.chain_id,
                "amount": observed.amount.to_string(),
                "asset": asset,
            }),
        );

        let updated = self
            .store
            .complete_if_pending(invoice.id, tx_hash, completed_at, entry)
            .await?;

        // Only the attempt whose write actually applied schedules the
        // side effects; a racing verification that lost the CAS skips them.
        if updated.status == InvoiceStatus::Completed
            && updated.completed_at == Some(completed_at)
        {
            self.schedule_side_effects(&order, &updated, tx_hash);
        }

        Ok(updated)
    }

    /// Marks the invoice Failed with an audit entry recording why. Every
    /// payment-state transition lands on the timeline, failures included.
    async fn fail(
        &self,
        invoice: &Invoice,
        tx_hash: H256,
        err: &ServiceError,
    ) -> Result<Invoice, ServiceError> {
        let entry = TimelineEntry::new(
            invoice.order_id,
            PAYMENT_FAILED_EVENT,
            json!({
                "payment_id": invoice.id,
                "tx_hash": format!("{:?}", tx_hash),
                "code": err.code(),
            }),
        );
        self.store.fail_if_pending(invoice.id, tx_hash, entry).await
    }

    async fn observe_transfer(
        &self,
        tx_hash: H256,
        receipt: &TransactionReceipt,
    ) -> Result<ObservedTransfer, ServiceError> {
        if let Some(token) = self.config.token.address {
            if let Some(observed) =
                find_token_transfer(receipt, token, self.config.platform_address)
            {
                return Ok(observed);
            }
        }

        // No token configured, or no qualifying Transfer log: treat the
        // transaction itself as a native-coin transfer.
        let tx = self
            .chain
            .transaction(tx_hash)
            .await?
            .ok_or_else(|| {
                ServiceError::RpcUnavailable(format!("Transaction {:?} not found", tx_hash))
            })?;
        Ok(native_transfer(&tx))
    }

    /// Post-commit, best-effort work. Failures are logged and swallowed; the
    /// payment itself is already durably completed.
    fn schedule_side_effects(&self, order: &Order, invoice: &Invoice, tx_hash: H256) {
        let receipts = self.receipts.clone();
        let notifier = self.notifier.clone();
        let store = self.store.clone();
        let invoice = invoice.clone();
        let notification = PaymentNotification {
            order_id: order.id,
            payment_id: invoice.id,
            customer_id: order.customer_id,
            amount: invoice.amount.to_string(),
            tx_hash: format!("{:?}", tx_hash),
        };

        tokio::spawn(async move {
            match receipts.generate(&invoice).await {
                Ok(artifact) => {
                    if let Err(e) = store.set_receipt_ref(invoice.id, artifact).await {
                        tracing::warn!("Storing receipt reference failed: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Receipt generation failed: {}", e),
            }

            if let Err(e) = notifier.notify_payment_completed(notification).await {
                tracing::warn!("Payment notification failed: {}", e);
            }
        });
    }
}

fn parse_tx_hash(raw: &str) -> Result<H256, ServiceError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ServiceError::InvalidTxHash(raw.to_string()));
    }
    H256::from_str(digits).map_err(|_| ServiceError::InvalidTxHash(raw.to_string()))
}
