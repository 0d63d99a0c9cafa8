//! Per-market evaluation and the scan loop that drives it.
//!
//! Markets are evaluated one at a time:
//! `Fetched -> Priced -> Normalized -> LiquidityChecked -> Decided`.
//! A market that cannot go further is decided as a skip at the stage it
//! reached; only transport failures escape as errors and end the run.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::clob::Exchange;
use crate::executor::{ExecutionReport, OrderExecutor};
use crate::market::{fetch_all_markets, tradeable_markets};
use crate::orderbook::get_liquidity;
use crate::pricing::{calculate_trade_metrics, normalize_probabilities};
use crate::report::{RunAccumulator, RunSummary};
use crate::strategy::{
    select_side, Decision, MarketQuote, SkipReason, Stage, StrategyMode, TradeDecision,
};
use crate::types::{Market, Outcome, Side};

/// Fixed per-run trading parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeSettings {
    pub mode: StrategyMode,
    /// Notional spent per trade before the minimum-order-size floor
    pub order_size_usd: Decimal,
}

fn skip(stage: Stage, reason: SkipReason) -> Decision {
    Decision::Skip { stage, reason }
}

fn missing_price(outcome: Outcome) -> Decision {
    skip(Stage::Fetched, SkipReason::MissingPrice { outcome })
}

/// Take one market to a decision
pub async fn evaluate_market<E: Exchange + ?Sized>(
    exchange: &E,
    market: &Market,
    settings: &TradeSettings,
) -> Result<Decision> {
    if !market.active {
        return Ok(skip(Stage::Fetched, SkipReason::Inactive));
    }
    let Some((yes_token, no_token)) = market.binary_tokens() else {
        return Ok(skip(Stage::Fetched, SkipReason::NotBinary { outcomes: market.tokens.len() }));
    };

    let yes_price = exchange
        .get_price(&yes_token.token_id, Side::Buy)
        .await
        .with_context(|| format!("Failed to price YES token {}", yes_token.token_id))?;
    let no_price = exchange
        .get_price(&no_token.token_id, Side::Sell)
        .await
        .with_context(|| format!("Failed to price NO token {}", no_token.token_id))?;

    let (yes_price, no_price) = match (yes_price, no_price) {
        (Some(y), Some(n)) => (y, n),
        (None, _) => return Ok(missing_price(Outcome::Yes)),
        (_, None) => return Ok(missing_price(Outcome::No)),
    };

    let (yes_probability, no_probability) = match normalize_probabilities(yes_price, no_price) {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Skipping market {} due to error: {}", market.condition_id, e);
            return Ok(skip(Stage::Priced, SkipReason::InvalidPrices(e.to_string())));
        }
    };

    // Both sides are read off the YES book: resting bids back YES, resting asks back NO
    let liquidity = get_liquidity(exchange, &yes_token.token_id)
        .await
        .with_context(|| format!("Failed to fetch orderbook for token {}", yes_token.token_id))?;
    let Some(liquidity) = liquidity else {
        return Ok(skip(
            Stage::Normalized,
            SkipReason::NoOrderBook { token_id: yes_token.token_id.clone() },
        ));
    };

    debug!(
        "Yes Liquidity: {} tokens (${:.2} USD), No Liquidity: {} tokens (${:.2} USD), Yes Price: {}, No Price: {}",
        liquidity.bid_size,
        liquidity.bid_usd,
        liquidity.ask_size,
        liquidity.ask_usd,
        yes_price,
        no_price
    );

    let quote = MarketQuote {
        yes_price,
        no_price,
        yes_probability,
        no_probability,
        yes_liquidity: liquidity.bid_size,
        no_liquidity: liquidity.ask_size,
        minimum_order_size: market.minimum_order_size,
    };

    let selection = match select_side(settings.mode, &quote, settings.order_size_usd) {
        Ok(selection) => selection,
        Err(reason) => return Ok(skip(Stage::LiquidityChecked, reason)),
    };

    let token = match selection.outcome {
        Outcome::Yes => yes_token,
        Outcome::No => no_token,
    };

    Ok(Decision::Trade(TradeDecision {
        condition_id: market.condition_id.clone(),
        token_id: token.token_id.clone(),
        outcome: selection.outcome,
        price: selection.price,
        win_probability: selection.win_probability,
        size: selection.size,
        metrics: calculate_trade_metrics(
            selection.size,
            selection.price,
            selection.win_probability,
        ),
        tick_size: market.minimum_tick_size,
        neg_risk: market.neg_risk,
    }))
}

/// One full pass: fetch every market, decide each, execute the trades
pub async fn run_scan<E, X>(
    exchange: &E,
    executor: &X,
    settings: &TradeSettings,
) -> Result<RunSummary>
where
    E: Exchange + ?Sized,
    X: OrderExecutor + ?Sized,
{
    let markets = fetch_all_markets(exchange)
        .await
        .context("Failed to fetch markets")?;
    info!(
        "Total number of available markets: {} ({} active binary)",
        markets.len(),
        tradeable_markets(&markets).count()
    );

    let mut acc = RunAccumulator::new();

    for market in &markets {
        acc.record_market(market.minimum_order_size);

        debug!(
            "Market ID: {} | {} | min order {} | start {:?} end {:?} | active {}",
            market.condition_id,
            market.question,
            market.minimum_order_size,
            market.start_date,
            market.end_date,
            market.active
        );

        match evaluate_market(exchange, market, settings).await? {
            Decision::Trade(trade) => {
                info!(
                    "{} on {} @ {}: bet {:.2}, profit {:.2}, R/R {:.2}, EV {:.2}",
                    trade.outcome,
                    trade.condition_id,
                    trade.price,
                    trade.size,
                    trade.metrics.potential_profit,
                    trade.metrics.risk_reward_ratio,
                    trade.metrics.expected_value
                );
                acc.record_trade(&trade);

                match executor.execute(&trade).await? {
                    ExecutionReport::Signed(_) => acc.orders_signed += 1,
                    ExecutionReport::Submitted { .. } => {
                        acc.orders_signed += 1;
                        acc.orders_submitted += 1;
                    }
                    ExecutionReport::SubmitFailed { .. } => {
                        acc.orders_signed += 1;
                        acc.orders_failed += 1;
                    }
                }
            }
            Decision::Skip { stage, reason } => {
                debug!("Skipping market {} at {:?}: {}", market.condition_id, stage, reason);
                acc.record_skip();
            }
        }
    }

    Ok(acc.summary())
}
