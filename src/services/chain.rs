use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{Address, TransactionReceipt, H256, U256},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::ServiceError;

/// The slice of a native-coin transaction verification cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct TxInfo {
    pub to: Option<Address>,
    pub value: U256,
}

/// Read-only access to a single configured JSON-RPC endpoint. No state is
/// cached between calls.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn network_id(&self) -> Result<u64, ServiceError>;

    async fn transaction(&self, tx_hash: H256) -> Result<Option<TxInfo>, ServiceError>;

    /// Waits until `tx_hash` is mined with at least `confirmations` blocks on
    /// top (the mined block counts as one). Returns `None` on timeout.
    async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        confirmations: u64,
        timeout: Duration,
    ) -> Result<Option<TransactionReceipt>, ServiceError>;
}

pub struct RpcChainClient {
    provider: Arc<Provider<Http>>,
    poll_interval: Duration,
}

impl RpcChainClient {
    pub async fn new(rpc_url: &str, poll_interval: Duration) -> Result<Self, ServiceError> {
        let provider = Arc::new(
            Provider::<Http>::try_from(rpc_url)
                .map_err(|e| ServiceError::ConfigError(format!("Invalid RPC URL: {}", e)))?,
        );

        // Test connection
        let block_number = provider
            .get_block_number()
            .await
            .map_err(|e| ServiceError::RpcUnavailable(e.to_string()))?;
        tracing::info!("Chain RPC connected, current block: {}", block_number);

        Ok(Self {
            provider,
            poll_interval,
        })
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn network_id(&self) -> Result<u64, ServiceError> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| ServiceError::RpcUnavailable(e.to_string()))?;
        Ok(chain_id.as_u64())
    }

    async fn transaction(&self, tx_hash: H256) -> Result<Option<TxInfo>, ServiceError> {
        let tx = self
            .provider
            .get_transaction(tx_hash)
            .await
            .map_err(|e| ServiceError::RpcUnavailable(e.to_string()))?;
        Ok(tx.map(|tx| TxInfo {
            to: tx.to,
            value: tx.value,
        }))
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        confirmations: u64,
        timeout: Duration,
    ) -> Result<Option<TransactionReceipt>, ServiceError> {
        let deadline = Instant::now() + timeout;

        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ServiceError::RpcUnavailable(e.to_string()))?;

            if let Some(receipt) = receipt {
                if let Some(mined_in) = receipt.block_number {
                    let head = self
                        .provider
                        .get_block_number()
                        .await
                        .map_err(|e| ServiceError::RpcUnavailable(e.to_string()))?;
                    let confirmed = head.saturating_sub(mined_in).as_u64() + 1;
                    if confirmed >= confirmations {
                        return Ok(Some(receipt));
                    }
                    tracing::debug!(
                        "Transaction {:?} at {}/{} confirmations",
                        tx_hash,
                        confirmed,
                        confirmations
                    );
                }
            }

            if Instant::now() + self.poll_interval > deadline {
                return Ok(None);
            }
            sleep(self.poll_interval).await;
        }
    }
}
