//! Price-to-probability normalization and per-trade economics.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Normalize a YES/NO price pair into win probabilities that sum to 1.
///
/// Each side is weighted by the inverse of its price, so the cheaper side
/// gets the larger weight. Prices are not checked against the upper bound
/// of 1; callers gate the tradeable range themselves.
pub fn normalize_probabilities(
    yes_price: Decimal,
    no_price: Decimal,
) -> Result<(Decimal, Decimal), PricingError> {
    if yes_price.is_zero() || no_price.is_zero() {
        return Err(PricingError::InvalidInput(format!(
            "cannot normalize probabilities with a zero price (yes={}, no={})",
            yes_price, no_price
        )));
    }

    let yes_weight = Decimal::ONE / yes_price;
    let no_weight = Decimal::ONE / no_price;
    let total = yes_weight + no_weight;

    Ok((yes_weight / total, no_weight / total))
}

/// Profit, loss, risk/reward and expected value of a single bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeMetrics {
    pub potential_profit: Decimal,
    /// Whole stake is lost when the bet fails
    pub potential_loss: Decimal,
    pub risk_reward_ratio: Decimal,
    pub expected_value: Decimal,
}

pub fn calculate_trade_metrics(
    size: Decimal,
    price: Decimal,
    win_probability: Decimal,
) -> TradeMetrics {
    let potential_profit = size * (Decimal::ONE - price);
    let potential_loss = size;
    let risk_reward_ratio = if potential_loss.is_zero() {
        Decimal::ZERO
    } else {
        potential_profit / potential_loss
    };
    let expected_value =
        win_probability * potential_profit - (Decimal::ONE - win_probability) * potential_loss;

    TradeMetrics {
        potential_profit,
        potential_loss,
        risk_reward_ratio,
        expected_value,
    }
}
