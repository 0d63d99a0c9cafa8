use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::clob::ClobClient;
use crate::signer::OrderSigner;
use crate::strategy::TradeDecision;
use crate::types::{Order, Side};

/// What happened to a decided trade
#[derive(Debug, Clone)]
pub enum ExecutionReport {
    /// Signed, not sent
    Signed(Order),
    Submitted { order: Order, response: serde_json::Value },
    /// Signed but the venue refused or could not be reached
    SubmitFailed { order: Order, error: String },
}

/// Turns a trade decision into a (possibly submitted) order
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// An `Err` aborts the run; submission problems come back as `SubmitFailed`.
    async fn execute(&self, decision: &TradeDecision) -> Result<ExecutionReport>;
}

/// Signs every decision as a BUY on the chosen token and posts it unless dry-run
pub struct ClobExecutor {
    signer: OrderSigner,
    clob: ClobClient,
    dry_run: bool,
}

impl ClobExecutor {
    pub fn new(signer: OrderSigner, clob: ClobClient, dry_run: bool) -> Self {
        Self { signer, clob, dry_run }
    }
}

#[async_trait]
impl OrderExecutor for ClobExecutor {
    async fn execute(&self, decision: &TradeDecision) -> Result<ExecutionReport> {
        let order = self
            .signer
            .create_order(
                &decision.token_id,
                decision.price,
                decision.size,
                Side::Buy,
                decision.tick_size,
                decision.neg_risk,
            )
            .await?;

        if self.dry_run {
            info!(
                "[DRY RUN] Signed {} order for market {}: {:.2} shares @ {}",
                decision.outcome, decision.condition_id, decision.size, decision.price
            );
            return Ok(ExecutionReport::Signed(order));
        }

        match self.clob.post_order(&order).await {
            Ok(response) => {
                info!(
                    "Placed {:.2} order on {} outcome for market {} at odds {} - Response: {}",
                    decision.size, decision.outcome, decision.condition_id, decision.price, response
                );
                Ok(ExecutionReport::Submitted { order, response })
            }
            Err(e) => {
                warn!("Order for market {} not placed: {}", decision.condition_id, e);
                Ok(ExecutionReport::SubmitFailed { order, error: e.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculate_trade_metrics;
    use crate::types::Outcome;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn dry_run_executor() -> ClobExecutor {
        let signer = OrderSigner::new(TEST_KEY, 137, None).unwrap();
        let clob = ClobClient::new("https://clob.polymarket.com").unwrap();
        ClobExecutor::new(signer, clob, true)
    }

    fn decision(price: Decimal, size: Decimal) -> TradeDecision {
        TradeDecision {
            condition_id: "0x1".to_string(),
            token_id: "11".to_string(),
            outcome: Outcome::Yes,
            price,
            win_probability: dec!(0.5),
            size,
            metrics: calculate_trade_metrics(size, price, dec!(0.5)),
            tick_size: dec!(0.01),
            neg_risk: false,
        }
    }

    #[tokio::test]
    async fn test_dry_run_signs_without_posting() {
        let report = dry_run_executor().execute(&decision(dec!(0.30), dec!(5))).await.unwrap();
        let ExecutionReport::Signed(order) = report else {
            panic!("dry run must not submit");
        };
        assert_eq!(order.order.side, Side::Buy);
        assert_eq!(order.order.maker_amount, "1500000");
        assert_eq!(order.order.taker_amount, "5000000");
    }

    #[tokio::test]
    async fn test_sub_tick_price_signs_at_one_tick() {
        // 0.005 sits between zero and the first 0.01 tick
        let report = dry_run_executor().execute(&decision(dec!(0.005), dec!(200))).await.unwrap();
        let ExecutionReport::Signed(order) = report else {
            panic!("dry run must not submit");
        };
        assert_eq!(order.order.maker_amount, "2000000");
        assert_eq!(order.order.taker_amount, "200000000");
    }
}
