use serde_json::json;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::models::{
    CompletionEvidence, EvidenceInput, Order, OrderProof, TimelineEntry, ORDER_COMPLETED_EVENT,
};
use crate::storage::PaymentStore;

/// Records and retrieves tamper-evident completion proofs. Shares the
/// timeline-append pattern with payment settlement but is otherwise
/// independent of the payment path.
pub struct CompletionService {
    store: Arc<dyn PaymentStore>,
}

impl CompletionService {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    /// Canonicalizes the evidence, hashes it, and atomically closes the
    /// order while appending the proof to its timeline.
    pub async fn complete_order(
        &self,
        order_id: u64,
        actor_id: u64,
        input: EvidenceInput,
    ) -> Result<(Order, String), ServiceError> {
        self.store
            .order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;

        let evidence = CompletionEvidence::new(order_id, input);
        let proof_hash = evidence.proof_hash()?;

        let entry = TimelineEntry::new(
            order_id,
            ORDER_COMPLETED_EVENT,
            json!({
                "proof_hash": proof_hash,
                "evidence": evidence,
                "actor_id": actor_id,
            }),
        );
        let order = self.store.close_order_with_proof(order_id, entry).await?;

        tracing::info!(
            order_id,
            actor_id,
            proof_hash = %proof_hash,
            "Order completed with proof"
        );

        Ok((order, proof_hash))
    }

    /// Returns the most recent completion proof for the order. Access control
    /// sits with the caller; `requester_id` is recorded for audit only.
    pub async fn get_order_proof(
        &self,
        order_id: u64,
        requester_id: u64,
    ) -> Result<OrderProof, ServiceError> {
        let entry = self
            .store
            .latest_timeline_entry(order_id, ORDER_COMPLETED_EVENT)
            .await?
            .ok_or(ServiceError::ProofNotFound(order_id))?;

        let proof_hash = entry.details["proof_hash"]
            .as_str()
            .ok_or_else(|| {
                ServiceError::StorageError(format!("Malformed proof entry for order {}", order_id))
            })?
            .to_string();
        let evidence: CompletionEvidence =
            serde_json::from_value(entry.details["evidence"].clone()).map_err(|e| {
                ServiceError::StorageError(format!(
                    "Malformed proof evidence for order {}: {}",
                    order_id, e
                ))
            })?;

        tracing::debug!(order_id, requester_id, "Completion proof retrieved");

        Ok(OrderProof {
            proof_hash,
            evidence,
            created_at: entry.created_at,
        })
    }
}
