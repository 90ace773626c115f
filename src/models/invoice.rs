use chrono::{DateTime, Utc};
use ethers::types::H256;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::ServiceError;

/// Monetary amount in minor units (cents), fixed 2-decimal display precision.
/// Stored as an integer so conversions to token base units never go through
/// floating point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub cents: u64,
    pub currency: String,
}

impl Amount {
    pub fn new(cents: u64, currency: impl Into<String>) -> Self {
        Self {
            cents,
            currency: currency.into(),
        }
    }

    /// Parses a major-unit decimal string ("19.99") with one or two
    /// fractional digits, or none at all.
    pub fn from_major_str(raw: &str, currency: impl Into<String>) -> Result<Self, ServiceError> {
        let raw = raw.trim();
        let invalid = || ServiceError::InternalError(format!("Invalid amount: {}", raw));

        let (whole, frac) = match raw.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (raw, None),
        };
        if whole.is_empty() {
            return Err(invalid());
        }
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let frac_cents: u64 = match frac {
            // A trailing dot with nothing behind it is malformed.
            Some(f) if f.is_empty() || f.len() > 2 => return Err(invalid()),
            Some(f) => {
                let parsed: u64 = f.parse().map_err(|_| invalid())?;
                if f.len() == 1 {
                    parsed * 10
                } else {
                    parsed
                }
            }
            None => 0,
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(invalid)?;
        Ok(Self::new(cents, currency))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.cents / 100,
            self.cents % 100,
            self.currency
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Pending,
    Completed,
    Failed,
}

/// Which rail the customer pays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentProvider {
    /// Off-chain card processor; settled outside this service.
    Processor,
    /// On-chain stablecoin or native-coin transfer, verified here.
    OnChain,
}

/// One request for payment against an order. Financial record: created once,
/// mutated exactly once by verification, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: u64,
    pub order_id: u64,
    pub amount: Amount,
    pub provider: PaymentProvider,
    pub status: InvoiceStatus,
    pub tx_hash: Option<H256>,
    pub completed_at: Option<DateTime<Utc>>,
    pub receipt_ref: Option<String>,
}

impl Invoice {
    pub fn pending(id: u64, order_id: u64, amount: Amount, provider: PaymentProvider) -> Self {
        Self {
            id,
            order_id,
            amount,
            provider,
            status: InvoiceStatus::Pending,
            tx_hash: None,
            completed_at: None,
            receipt_ref: None,
        }
    }
}
