use anyhow::{bail, Context, Result};
use ethers::types::Address;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

/// Verification parameters for a single token, read from environment.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// ERC-20 contract address; `None` means payments arrive as native coin.
    pub address: Option<Address>,
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Chain access
    pub rpc_url: String,
    pub chain_id: u64,
    pub confirmations: u64,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,

    // Payment policy
    pub platform_address: Address,
    pub token: TokenConfig,
    pub native_symbol: String,
    pub enforce_amount: bool,

    // Customer notifications (optional webhook sink)
    pub notify_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;

        let config = Self {
            environment: environment.clone(),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            rpc_url: std::env::var("CHAIN_RPC_URL").context("CHAIN_RPC_URL required")?,
            chain_id: std::env::var("CHAIN_ID")
                .context("CHAIN_ID required")?
                .parse()
                .context("Invalid CHAIN_ID")?,
            confirmations: std::env::var("CHAIN_CONFIRMATIONS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("Invalid CHAIN_CONFIRMATIONS")?,
            receipt_timeout: Duration::from_millis(
                std::env::var("CHAIN_RECEIPT_TIMEOUT_MS")
                    .unwrap_or_else(|_| "120000".to_string())
                    .parse()
                    .context("Invalid CHAIN_RECEIPT_TIMEOUT_MS")?,
            ),
            receipt_poll_interval: Duration::from_millis(
                std::env::var("CHAIN_RECEIPT_POLL_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()
                    .context("Invalid CHAIN_RECEIPT_POLL_MS")?,
            ),

            platform_address: Self::parse_address("PLATFORM_ADDRESS")?,
            token: TokenConfig {
                address: match std::env::var("TOKEN_ADDRESS") {
                    Ok(raw) if !raw.is_empty() => Some(
                        Address::from_str(&raw).context("Invalid address for TOKEN_ADDRESS")?,
                    ),
                    _ => None,
                },
                symbol: std::env::var("TOKEN_SYMBOL").unwrap_or_else(|_| "USDC".to_string()),
                decimals: std::env::var("TOKEN_DECIMALS")
                    .unwrap_or_else(|_| "6".to_string())
                    .parse()
                    .context("Invalid TOKEN_DECIMALS")?,
            },
            native_symbol: std::env::var("NATIVE_SYMBOL").unwrap_or_else(|_| "MATIC".to_string()),
            enforce_amount: std::env::var("ENFORCE_PAYMENT_AMOUNT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid ENFORCE_PAYMENT_AMOUNT")?,

            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_address(var: &str) -> Result<Address> {
        let addr_str = std::env::var(var).with_context(|| format!("{} required", var))?;
        Address::from_str(&addr_str).with_context(|| format!("Invalid address for {}", var))
    }

    fn validate(&self) -> Result<()> {
        if !self.rpc_url.starts_with("http") {
            bail!("CHAIN_RPC_URL must be HTTP(S) URL");
        }
        // Invoice amounts carry 2 decimal places; a token with fewer cannot
        // represent them exactly.
        if self.token.decimals < 2 {
            bail!("TOKEN_DECIMALS must be at least 2");
        }
        if let Some(url) = &self.notify_webhook_url {
            if !url.starts_with("http") {
                bail!("NOTIFY_WEBHOOK_URL must be HTTP(S) URL");
            }
        }

        tracing::info!(
            "Configuration validated for {:?} environment (chain {})",
            self.environment,
            self.chain_id
        );

        Ok(())
    }
}
