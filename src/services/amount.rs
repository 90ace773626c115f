use ethers::types::{Address, U256};

use crate::error::ServiceError;
use crate::models::Amount;

use super::transfer::ObservedTransfer;

pub const NATIVE_DECIMALS: u32 = 18;

/// Scales an invoice amount (integer cents, 2 decimal places) into the
/// token's base-unit representation. Pure integer arithmetic.
pub fn to_base_units(amount: &Amount, decimals: u32) -> Result<U256, ServiceError> {
    if decimals < 2 {
        return Err(ServiceError::ConfigError(format!(
            "Token with {} decimals cannot represent cent amounts",
            decimals
        )));
    }
    Ok(U256::from(amount.cents) * U256::exp10((decimals - 2) as usize))
}

/// Decides whether an observed transfer satisfies the invoice.
///
/// With enforcement off any successful, confirmed transaction is accepted.
/// With it on, the destination (native path) and the exact base-unit amount
/// must both match. A mismatch against a mined transaction is permanent, so
/// failures here must mark the invoice FAILED, never leave it PENDING.
pub fn check_transfer(
    observed: &ObservedTransfer,
    expected_amount: &Amount,
    token_decimals: u32,
    platform_address: Address,
    enforce: bool,
) -> Result<(), ServiceError> {
    if !enforce {
        return Ok(());
    }

    if observed.native && observed.to != platform_address {
        return Err(ServiceError::DestMismatch {
            expected: format!("{:?}", platform_address),
            actual: format!("{:?}", observed.to),
        });
    }

    let decimals = if observed.native {
        NATIVE_DECIMALS
    } else {
        token_decimals
    };
    let expected = to_base_units(expected_amount, decimals)?;
    if observed.amount != expected {
        return Err(ServiceError::AmountMismatch {
            expected: expected.to_string(),
            actual: observed.amount.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc(cents: u64) -> Amount {
        Amount::new(cents, "USDC")
    }

    #[test]
    fn scales_cents_to_six_decimals() {
        assert_eq!(
            to_base_units(&usdc(10000), 6).unwrap(),
            U256::from(100_000_000u64)
        );
        assert_eq!(
            to_base_units(&usdc(1999), 6).unwrap(),
            U256::from(19_990_000u64)
        );
    }

    #[test]
    fn scales_cents_to_eighteen_decimals() {
        assert_eq!(
            to_base_units(&usdc(10000), 18).unwrap(),
            U256::from_dec_str("100000000000000000000").unwrap()
        );
    }

    #[test]
    fn two_decimal_token_is_identity() {
        assert_eq!(to_base_units(&usdc(1999), 2).unwrap(), U256::from(1999u64));
    }

    #[test]
    fn rejects_sub_cent_precision() {
        assert!(to_base_units(&usdc(1999), 1).is_err());
    }

    #[test]
    fn enforcement_off_accepts_anything() {
        let observed = ObservedTransfer {
            to: Address::zero(),
            amount: U256::from(1u64),
            native: true,
        };
        assert!(check_transfer(&observed, &usdc(99999), 6, Address::from([0xbb; 20]), false).is_ok());
    }

    #[test]
    fn exact_amount_required() {
        let platform = Address::from([0xbb; 20]);
        let observed = ObservedTransfer {
            to: platform,
            amount: U256::from(19_990_001u64),
            native: false,
        };
        let err = check_transfer(&observed, &usdc(1999), 6, platform, true).unwrap_err();
        assert!(matches!(err, ServiceError::AmountMismatch { .. }));
    }

    #[test]
    fn native_destination_checked() {
        let platform = Address::from([0xbb; 20]);
        let observed = ObservedTransfer {
            to: Address::from([0xcc; 20]),
            amount: U256::exp10(18),
            native: true,
        };
        let amount = Amount::from_major_str("1.00", "MATIC").unwrap();
        let err = check_transfer(&observed, &amount, 6, platform, true).unwrap_err();
        assert!(matches!(err, ServiceError::DestMismatch { .. }));
    }
}
