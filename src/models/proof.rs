use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Evidence as submitted by staff when closing out an order.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceInput {
    pub photos: Vec<u64>,
    pub coords: Coordinates,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

/// Canonical completion evidence. Field order is the canonical key order;
/// photo ids are sorted ascending on construction. Serializing this struct
/// compactly yields the exact byte sequence that is hashed, so the stored
/// object always re-hashes to the stored proof hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvidence {
    pub order_id: u64,
    pub completed_at: DateTime<Utc>,
    pub coords: Coordinates,
    pub photos: Vec<u64>,
    pub notes: String,
}

impl CompletionEvidence {
    pub fn new(order_id: u64, input: EvidenceInput) -> Self {
        let mut photos = input.photos;
        photos.sort_unstable();
        Self {
            order_id,
            completed_at: input.completed_at.unwrap_or_else(Utc::now),
            coords: input.coords,
            photos,
            notes: input.notes,
        }
    }

    /// Deterministic compact serialization of the evidence.
    pub fn canonical_json(&self) -> Result<String, ServiceError> {
        serde_json::to_string(self)
            .map_err(|e| ServiceError::InternalError(format!("Evidence serialization: {}", e)))
    }

    /// SHA-256 over the canonical bytes, as a lowercase hex string.
    pub fn proof_hash(&self) -> Result<String, ServiceError> {
        let canonical = self.canonical_json()?;
        let digest = Sha256::digest(canonical.as_bytes());
        Ok(hex::encode(digest))
    }
}

/// Proof record returned to callers, reconstructed from the order timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProof {
    pub proof_hash: String,
    pub evidence: CompletionEvidence,
    pub created_at: DateTime<Utc>,
}
