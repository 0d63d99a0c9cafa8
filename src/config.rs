use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::env;

use crate::strategy::StrategyMode;

const DEFAULT_CLOB_URL: &str = "https://clob.polymarket.com";
const POLYGON_CHAIN_ID: u64 = 137;

#[derive(Debug, Clone)]
pub struct Config {
    // Wallet
    pub private_key: String,
    pub funder_address: Option<String>,
    pub signature_type: u8,

    // Trading Parameters
    pub strategy: StrategyMode,
    pub order_size_usd: Decimal,

    // Mode
    pub dry_run: bool,
    pub log_level: String,

    // Endpoints
    pub clob_url: String,
    pub chain_id: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production)
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let order_size_usd: Decimal = var("ORDER_SIZE_USD")
            .unwrap_or_else(|| "1".to_string())
            .parse()
            .context("Invalid ORDER_SIZE_USD")?;
        if order_size_usd <= Decimal::ZERO {
            anyhow::bail!("ORDER_SIZE_USD must be positive, got {}", order_size_usd);
        }

        Ok(Config {
            // Wallet
            private_key: var("PRIVATE_KEY").context("PRIVATE_KEY not set")?,
            funder_address: var("FUNDER_ADDRESS").filter(|a| !a.is_empty()),
            signature_type: var("SIGNATURE_TYPE")
                .unwrap_or_else(|| "0".to_string())
                .parse()
                .context("Invalid SIGNATURE_TYPE")?,

            // Trading Parameters
            strategy: var("STRATEGY")
                .unwrap_or_else(|| "underdog".to_string())
                .parse()
                .context("Invalid STRATEGY")?,
            order_size_usd,

            // Mode
            dry_run: var("DRY_RUN")
                .unwrap_or_else(|| "true".to_string())
                .parse()
                .unwrap_or(true),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            // Endpoints
            clob_url: var("CLOB_URL").unwrap_or_else(|| DEFAULT_CLOB_URL.to_string()),
            chain_id: var("CHAIN_ID")
                .map(|c| c.parse::<u64>())
                .transpose()
                .context("Invalid CHAIN_ID")?
                .unwrap_or(POLYGON_CHAIN_ID),
        })
    }
}
