use ethers::types::{Address, TransactionReceipt, H256, U256};
use std::str::FromStr;

use super::chain::TxInfo;

/// keccak256("Transfer(address,address,uint256)")
const TRANSFER_TOPIC: &str = "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// What was observed moving on-chain, normalized across the token and
/// native-coin paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedTransfer {
    pub to: Address,
    /// Integer amount in the asset's smallest unit.
    pub amount: U256,
    /// Native-coin transfer (18 decimals) rather than a token transfer.
    pub native: bool,
}

/// Scans the receipt for a Transfer event emitted by `token` whose recipient
/// topic is `platform`. When a receipt carries several qualifying transfers
/// the first one in log order wins.
pub fn find_token_transfer(
    receipt: &TransactionReceipt,
    token: Address,
    platform: Address,
) -> Option<ObservedTransfer> {
    let transfer_topic = H256::from_str(TRANSFER_TOPIC).expect("static topic");

    receipt
        .logs
        .iter()
        .filter(|log| log.address == token)
        .filter(|log| log.topics.first() == Some(&transfer_topic) && log.topics.len() >= 3)
        // A Transfer amount is exactly one word; anything else is malformed
        // (receipts reach here unvalidated via the operator endpoint).
        .filter(|log| log.data.len() == 32)
        .find(|log| Address::from(log.topics[2]) == platform)
        .map(|log| ObservedTransfer {
            to: Address::from(log.topics[2]),
            amount: U256::from_big_endian(&log.data),
            native: false,
        })
}

/// Native-coin fallback: the transfer is the transaction itself.
pub fn native_transfer(tx: &TxInfo) -> ObservedTransfer {
    ObservedTransfer {
        to: tx.to.unwrap_or_default(),
        amount: tx.value,
        native: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Bytes, Log};

    fn transfer_log(token: Address, from: Address, to: Address, amount: U256) -> Log {
        let mut data = [0u8; 32];
        amount.to_big_endian(&mut data);
        Log {
            address: token,
            topics: vec![
                H256::from_str(TRANSFER_TOPIC).unwrap(),
                H256::from(from),
                H256::from(to),
            ],
            data: Bytes::from(data.to_vec()),
            ..Default::default()
        }
    }

    fn receipt_with(logs: Vec<Log>) -> TransactionReceipt {
        TransactionReceipt {
            logs,
            ..Default::default()
        }
    }

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    #[test]
    fn finds_matching_transfer() {
        let token = addr(0xaa);
        let platform = addr(0xbb);
        let receipt = receipt_with(vec![transfer_log(
            token,
            addr(0x01),
            platform,
            U256::from(19_990_000u64),
        )]);

        let observed = find_token_transfer(&receipt, token, platform).unwrap();
        assert_eq!(observed.to, platform);
        assert_eq!(observed.amount, U256::from(19_990_000u64));
        assert!(!observed.native);
    }

    #[test]
    fn ignores_other_contracts_and_recipients() {
        let token = addr(0xaa);
        let platform = addr(0xbb);
        let receipt = receipt_with(vec![
            // right event, wrong emitting contract
            transfer_log(addr(0xcc), addr(0x01), platform, U256::from(1u64)),
            // right contract, wrong recipient
            transfer_log(token, addr(0x01), addr(0xdd), U256::from(2u64)),
        ]);

        assert!(find_token_transfer(&receipt, token, platform).is_none());
    }

    #[test]
    fn malformed_data_word_is_skipped() {
        let token = addr(0xaa);
        let platform = addr(0xbb);
        let mut oversized = transfer_log(token, addr(0x01), platform, U256::from(1u64));
        oversized.data = Bytes::from(vec![0xffu8; 64]);
        let valid = transfer_log(token, addr(0x02), platform, U256::from(42u64));
        let receipt = receipt_with(vec![oversized, valid]);

        let observed = find_token_transfer(&receipt, token, platform).unwrap();
        assert_eq!(observed.amount, U256::from(42u64));
    }

    #[test]
    fn first_qualifying_log_wins() {
        let token = addr(0xaa);
        let platform = addr(0xbb);
        let receipt = receipt_with(vec![
            transfer_log(token, addr(0x01), platform, U256::from(100u64)),
            transfer_log(token, addr(0x02), platform, U256::from(200u64)),
        ]);

        let observed = find_token_transfer(&receipt, token, platform).unwrap();
        assert_eq!(observed.amount, U256::from(100u64));
    }

    #[test]
    fn native_fallback_reads_transaction_value() {
        let tx = TxInfo {
            to: Some(addr(0xbb)),
            value: U256::from(5u64) * U256::exp10(18),
        };
        let observed = native_transfer(&tx);
        assert_eq!(observed.to, addr(0xbb));
        assert!(observed.native);
        assert_eq!(observed.amount, U256::from(5u64) * U256::exp10(18));
    }
}
