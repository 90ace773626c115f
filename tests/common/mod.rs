#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::{Address, Bytes, Log, TransactionReceipt, H256, U256};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shoplane::config::{Config, Environment, TokenConfig};
use shoplane::error::ServiceError;
use shoplane::models::{Amount, Invoice, Order, PaymentProvider};
use shoplane::services::{
    ChainClient, CompletionService, LogNotifier, PaymentService, StubReceiptGenerator, TxInfo,
};
use shoplane::storage::{MemoryStore, PaymentStore};

pub const CHAIN_ID: u64 = 137;
pub const TRANSFER_TOPIC: &str =
    "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

pub fn addr(byte: u8) -> Address {
    Address::from([byte; 20])
}

pub fn platform() -> Address {
    addr(0xbb)
}

pub fn token() -> Address {
    addr(0xaa)
}

pub fn tx_hash_str() -> String {
    format!("0x{}", "cd".repeat(32))
}

/// Chain double that replays a scripted view of the network.
#[derive(Default)]
pub struct ScriptedChain {
    pub network_id: u64,
    pub rpc_down: bool,
    /// `None` simulates a confirmation-wait timeout.
    pub receipt: Option<TransactionReceipt>,
    pub tx: Option<TxInfo>,
    pub calls: AtomicUsize,
}

impl ScriptedChain {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn network_id(&self) -> Result<u64, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rpc_down {
            return Err(ServiceError::RpcUnavailable("connection refused".into()));
        }
        Ok(self.network_id)
    }

    async fn transaction(&self, _tx_hash: H256) -> Result<Option<TxInfo>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rpc_down {
            return Err(ServiceError::RpcUnavailable("connection refused".into()));
        }
        Ok(self.tx.clone())
    }

    async fn wait_for_receipt(
        &self,
        _tx_hash: H256,
        _confirmations: u64,
        _timeout: Duration,
    ) -> Result<Option<TransactionReceipt>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rpc_down {
            return Err(ServiceError::RpcUnavailable("connection refused".into()));
        }
        Ok(self.receipt.clone())
    }
}

pub fn test_config(token_address: Option<Address>, enforce: bool) -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        rpc_url: "http://localhost:8545".to_string(),
        chain_id: CHAIN_ID,
        confirmations: 1,
        receipt_timeout: Duration::from_millis(100),
        receipt_poll_interval: Duration::from_millis(10),
        platform_address: platform(),
        token: TokenConfig {
            address: token_address,
            symbol: "USDC".to_string(),
            decimals: 6,
        },
        native_symbol: "MATIC".to_string(),
        enforce_amount: enforce,
        notify_webhook_url: None,
    }
}

pub fn transfer_log(token: Address, from: Address, to: Address, amount: U256) -> Log {
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

pub fn successful_receipt(logs: Vec<Log>) -> TransactionReceipt {
    TransactionReceipt {
        status: Some(1.into()),
        block_number: Some(100.into()),
        logs,
        ..Default::default()
    }
}

pub fn failed_receipt() -> TransactionReceipt {
    TransactionReceipt {
        status: Some(0.into()),
        block_number: Some(100.into()),
        ..Default::default()
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub chain: Arc<ScriptedChain>,
    pub payments: PaymentService,
    pub completion: CompletionService,
    pub order: Order,
    pub invoice: Invoice,
}

pub async fn harness(config: Config, chain: ScriptedChain, amount: Amount) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let chain = Arc::new(chain);
    let order = store.create_order(42).await.unwrap();
    let invoice = store
        .create_invoice(order.id, amount, PaymentProvider::OnChain)
        .await
        .unwrap();

    let payments = PaymentService::new(
        config,
        chain.clone(),
        store.clone(),
        Arc::new(StubReceiptGenerator),
        Arc::new(LogNotifier),
    );
    let completion = CompletionService::new(store.clone());

    Harness {
        store,
        chain,
        payments,
        completion,
        order,
        invoice,
    }
}

/// Polls until `check` passes or ~1s elapses; spawned side effects run on
/// the yields in between.
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
