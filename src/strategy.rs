//! Side selection for a single binary market.
//!
//! A run uses one [`StrategyMode`] for every market. The selector only sees
//! prices, probabilities and liquidity; fetching and sizing inputs is the
//! pipeline's job (see `trader`).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::pricing::TradeMetrics;
use crate::types::Outcome;

/// Exclusive lower bound of a tradeable price
pub const MIN_TRADEABLE_PRICE: Decimal = dec!(0.001);
/// Exclusive upper bound of a tradeable price
pub const MAX_TRADEABLE_PRICE: Decimal = dec!(1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyMode {
    /// Back the higher-priced (more likely) outcome
    Favorite,
    /// Back the lower-priced (less likely) outcome
    Underdog,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy {0:?} (expected \"favorite\" or \"underdog\")")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyMode {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "favorite" | "likely" => Ok(StrategyMode::Favorite),
            "underdog" | "unlikely" => Ok(StrategyMode::Underdog),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyMode::Favorite => f.pad("favorite"),
            StrategyMode::Underdog => f.pad("underdog"),
        }
    }
}

/// Everything the selector needs about one market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketQuote {
    pub yes_price: Decimal,
    pub no_price: Decimal,
    pub yes_probability: Decimal,
    pub no_probability: Decimal,
    pub yes_liquidity: Decimal,
    pub no_liquidity: Decimal,
    pub minimum_order_size: Decimal,
}

impl MarketQuote {
    fn side(&self, outcome: Outcome) -> (Decimal, Decimal, Decimal) {
        match outcome {
            Outcome::Yes => (self.yes_price, self.yes_probability, self.yes_liquidity),
            Outcome::No => (self.no_price, self.no_probability, self.no_liquidity),
        }
    }
}

/// Side and size chosen for a market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub outcome: Outcome,
    pub price: Decimal,
    pub win_probability: Decimal,
    pub size: Decimal,
}

/// Why a market produced no trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    NotBinary { outcomes: usize },
    MissingPrice { outcome: Outcome },
    InvalidPrices(String),
    NoOrderBook { token_id: String },
    Tie { price: Decimal },
    PriceOutOfRange { outcome: Outcome, price: Decimal },
    InsufficientLiquidity { outcome: Outcome, available: Decimal, required: Decimal },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Inactive => write!(f, "market is not active"),
            SkipReason::NotBinary { outcomes } => {
                write!(f, "market has {} outcomes, not 2", outcomes)
            }
            SkipReason::MissingPrice { outcome } => write!(f, "no {} price quoted", outcome),
            SkipReason::InvalidPrices(msg) => write!(f, "{}", msg),
            SkipReason::NoOrderBook { token_id } => {
                write!(f, "no orderbook for token {}", token_id)
            }
            SkipReason::Tie { price } => write!(f, "YES and NO both priced at {}", price),
            SkipReason::PriceOutOfRange { outcome, price } => {
                write!(f, "{} price {} outside tradeable range", outcome, price)
            }
            SkipReason::InsufficientLiquidity { outcome, available, required } => write!(
                f,
                "{} liquidity {} below minimum order size {}",
                outcome, available, required
            ),
        }
    }
}

/// Last state a market reached in the evaluation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetched,
    Priced,
    Normalized,
    LiquidityChecked,
}

/// Trade chosen for a market, with its economics and what is needed to sign it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeDecision {
    pub condition_id: String,
    pub token_id: String,
    pub outcome: Outcome,
    pub price: Decimal,
    pub win_probability: Decimal,
    pub size: Decimal,
    pub metrics: TradeMetrics,
    pub tick_size: Decimal,
    pub neg_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Trade(TradeDecision),
    Skip { stage: Stage, reason: SkipReason },
}

impl Decision {
    pub fn trade(&self) -> Option<&TradeDecision> {
        match self {
            Decision::Trade(t) => Some(t),
            Decision::Skip { .. } => None,
        }
    }
}

pub fn is_tradeable_price(price: Decimal) -> bool {
    price > MIN_TRADEABLE_PRICE && price < MAX_TRADEABLE_PRICE
}

/// Pick the side to back under `mode`, or say why nothing is taken.
///
/// The bet spends `order_size_usd` unless that buys fewer shares than the
/// market minimum, in which case the minimum is bought.
pub fn select_side(
    mode: StrategyMode,
    quote: &MarketQuote,
    order_size_usd: Decimal,
) -> Result<Selection, SkipReason> {
    let (yes, no) = (quote.yes_price, quote.no_price);

    let preferred = match mode {
        StrategyMode::Favorite if yes > no => Outcome::Yes,
        StrategyMode::Favorite if no > yes => Outcome::No,
        StrategyMode::Underdog if yes < no => Outcome::Yes,
        StrategyMode::Underdog if no < yes => Outcome::No,
        _ => return Err(SkipReason::Tie { price: yes }),
    };

    let (price, win_probability, liquidity) = quote.side(preferred);

    if !is_tradeable_price(price) {
        return Err(SkipReason::PriceOutOfRange { outcome: preferred, price });
    }

    if liquidity < quote.minimum_order_size {
        return Err(SkipReason::InsufficientLiquidity {
            outcome: preferred,
            available: liquidity,
            required: quote.minimum_order_size,
        });
    }

    let size = (order_size_usd / price).max(quote.minimum_order_size);

    Ok(Selection {
        outcome: preferred,
        price,
        win_probability,
        size,
    })
}
