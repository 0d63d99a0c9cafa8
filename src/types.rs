use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One page of `/sampling-markets`. Records stay undecoded so a bad one can
/// be dropped without losing the rest of the page.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsPage {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    pub next_cursor: String,
}

/// Market record as the CLOB returns it. Every field is optional so a
/// malformed record can be reported instead of failing the whole page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMarket {
    pub condition_id: Option<String>,
    pub question: Option<String>,
    pub tokens: Option<Vec<RawToken>>,
    pub minimum_order_size: Option<Decimal>,
    pub minimum_tick_size: Option<Decimal>,
    pub active: Option<bool>,
    pub neg_risk: Option<bool>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub start_date_iso: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub end_date_iso: Option<DateTime<Utc>>,
}

// Timestamps are informational; an empty or odd value reads as absent.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc))))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawToken {
    pub token_id: Option<String>,
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketRecordError {
    #[error("malformed market record: {0}")]
    Malformed(String),
    #[error("market record has no condition_id")]
    MissingConditionId,
    #[error("market {0} has no tokens")]
    MissingTokens(String),
    #[error("market {0} has a token without token_id")]
    MissingTokenId(String),
    #[error("market {0} has no minimum_order_size")]
    MissingMinimumOrderSize(String),
}

/// Validated market snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    pub condition_id: String,
    pub question: String,
    pub tokens: Vec<Token>,
    pub minimum_order_size: Decimal,
    pub minimum_tick_size: Decimal,
    pub active: bool,
    pub neg_risk: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_id: String,
    pub outcome: String,
}

impl Market {
    /// YES and NO tokens, in record order, when the market has exactly two outcomes
    pub fn binary_tokens(&self) -> Option<(&Token, &Token)> {
        match self.tokens.as_slice() {
            [yes, no] => Some((yes, no)),
            _ => None,
        }
    }

    pub fn is_tradeable(&self) -> bool {
        self.active && self.binary_tokens().is_some()
    }
}

impl TryFrom<RawMarket> for Market {
    type Error = MarketRecordError;

    fn try_from(raw: RawMarket) -> Result<Self, Self::Error> {
        let condition_id = raw
            .condition_id
            .filter(|id| !id.is_empty())
            .ok_or(MarketRecordError::MissingConditionId)?;

        let raw_tokens = raw
            .tokens
            .ok_or_else(|| MarketRecordError::MissingTokens(condition_id.clone()))?;

        let tokens = raw_tokens
            .into_iter()
            .map(|t| {
                let token_id = t
                    .token_id
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| MarketRecordError::MissingTokenId(condition_id.clone()))?;
                Ok(Token {
                    token_id,
                    outcome: t.outcome.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, MarketRecordError>>()?;

        let minimum_order_size = raw
            .minimum_order_size
            .ok_or_else(|| MarketRecordError::MissingMinimumOrderSize(condition_id.clone()))?;

        Ok(Market {
            question: raw.question.unwrap_or_default(),
            tokens,
            minimum_order_size,
            minimum_tick_size: raw.minimum_tick_size.unwrap_or(dec!(0.01)),
            active: raw.active.unwrap_or(false),
            neg_risk: raw.neg_risk.unwrap_or(false),
            start_date: raw.start_date_iso,
            end_date: raw.end_date_iso,
            condition_id,
        })
    }
}

impl TryFrom<serde_json::Value> for Market {
    type Error = MarketRecordError;

    fn try_from(record: serde_json::Value) -> Result<Self, Self::Error> {
        let raw: RawMarket = serde_json::from_value(record)
            .map_err(|e| MarketRecordError::Malformed(e.to_string()))?;
        Market::try_from(raw)
    }
}

/// Which side of a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Yes,
    No,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Yes => f.pad("YES"),
            Outcome::No => f.pad("NO"),
        }
    }
}

/// Orderbook from CLOB
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Orderbook {
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// L2 API credentials
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

/// Order to submit to CLOB
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order: SignedOrder,
    pub owner: String,
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    pub salt: String,
    pub maker: String,
    pub signer: String,
    pub taker: String,
    pub token_id: String,
    pub maker_amount: String,
    pub taker_amount: String,
    pub expiration: String,
    pub nonce: String,
    pub fee_rate_bps: String,
    pub side: Side,
    pub signature_type: u8,
    pub signature: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Gtc, // Good til cancelled
    Gtd, // Good til date
    Fok, // Fill or kill
}
