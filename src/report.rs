use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::info;

use crate::strategy::TradeDecision;

/// Running totals for one scan. Totals are plain sums, so the order in which
/// markets are recorded does not matter and partial accumulators can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunAccumulator {
    pub markets_seen: usize,
    pub markets_skipped: usize,
    pub trade_count: usize,
    pub total_profit: Decimal,
    pub total_stake: Decimal,
    pub total_risk_reward: Decimal,
    pub total_expected_value: Decimal,
    pub markets_by_min_order_size: BTreeMap<Decimal, usize>,
    pub orders_signed: usize,
    pub orders_submitted: usize,
    pub orders_failed: usize,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a market under its minimum order size, whether or not it trades
    pub fn record_market(&mut self, minimum_order_size: Decimal) {
        self.markets_seen += 1;
        // Normalize so 5 and 5.0 share a bucket
        *self
            .markets_by_min_order_size
            .entry(minimum_order_size.normalize())
            .or_insert(0) += 1;
    }

    pub fn record_skip(&mut self) {
        self.markets_skipped += 1;
    }

    pub fn record_trade(&mut self, trade: &TradeDecision) {
        self.trade_count += 1;
        self.total_profit += trade.metrics.potential_profit;
        self.total_stake += trade.metrics.potential_loss;
        self.total_risk_reward += trade.metrics.risk_reward_ratio;
        self.total_expected_value += trade.metrics.expected_value;
    }

    pub fn merge(&mut self, other: RunAccumulator) {
        self.markets_seen += other.markets_seen;
        self.markets_skipped += other.markets_skipped;
        self.trade_count += other.trade_count;
        self.total_profit += other.total_profit;
        self.total_stake += other.total_stake;
        self.total_risk_reward += other.total_risk_reward;
        self.total_expected_value += other.total_expected_value;
        for (size, count) in other.markets_by_min_order_size {
            *self.markets_by_min_order_size.entry(size).or_insert(0) += count;
        }
        self.orders_signed += other.orders_signed;
        self.orders_submitted += other.orders_submitted;
        self.orders_failed += other.orders_failed;
    }

    pub fn average_risk_reward(&self) -> Decimal {
        if self.trade_count == 0 {
            Decimal::ZERO
        } else {
            self.total_risk_reward / Decimal::from(self.trade_count)
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            markets_seen: self.markets_seen,
            markets_skipped: self.markets_skipped,
            trade_count: self.trade_count,
            total_profit: self.total_profit,
            total_stake: self.total_stake,
            average_risk_reward: self.average_risk_reward(),
            total_expected_value: self.total_expected_value,
            markets_by_min_order_size: self.markets_by_min_order_size.clone(),
            orders_signed: self.orders_signed,
            orders_submitted: self.orders_submitted,
            orders_failed: self.orders_failed,
        }
    }
}

/// End-of-run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub markets_seen: usize,
    pub markets_skipped: usize,
    pub trade_count: usize,
    /// Payout if every trade wins
    pub total_profit: Decimal,
    /// Amount lost if every trade fails
    pub total_stake: Decimal,
    pub average_risk_reward: Decimal,
    pub total_expected_value: Decimal,
    pub markets_by_min_order_size: BTreeMap<Decimal, usize>,
    pub orders_signed: usize,
    pub orders_submitted: usize,
    pub orders_failed: usize,
}

impl RunSummary {
    pub fn log(&self) {
        info!("═══════════════════════════════════════");
        info!("Number of markets at each Minimum Order Size:");
        for (size, count) in &self.markets_by_min_order_size {
            info!("  Minimum Order Size: {} - Number of Markets: {}", size, count);
        }
        info!(
            "Markets scanned: {} (skipped: {}, traded: {})",
            self.markets_seen, self.markets_skipped, self.trade_count
        );
        info!(
            "Total Potential Profit if all trades succeed: ${:.2}",
            self.total_profit
        );
        info!(
            "Total Bet Size (Total Potential Loss if all trades fail): ${:.2}",
            self.total_stake
        );
        info!("Average Risk-Reward Ratio: {:.2}", self.average_risk_reward);
        info!("Cumulative Expected Value: ${:.2}", self.total_expected_value);
        info!(
            "Orders signed: {}, submitted: {}, failed: {}",
            self.orders_signed, self.orders_submitted, self.orders_failed
        );
        info!("═══════════════════════════════════════");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculate_trade_metrics;
    use crate::types::Outcome;
    use rust_decimal_macros::dec;

    fn trade(size: Decimal, price: Decimal, wp: Decimal) -> TradeDecision {
        TradeDecision {
            condition_id: "0x1".to_string(),
            token_id: "1".to_string(),
            outcome: Outcome::Yes,
            price,
            win_probability: wp,
            size,
            metrics: calculate_trade_metrics(size, price, wp),
            tick_size: dec!(0.01),
            neg_risk: false,
        }
    }

    #[test]
    fn test_empty_run_has_zero_average() {
        let summary = RunAccumulator::new().summary();
        assert_eq!(summary.trade_count, 0);
        assert_eq!(summary.average_risk_reward, dec!(0));
        assert!(summary.markets_by_min_order_size.is_empty());
    }

    #[test]
    fn test_totals_and_average() {
        let mut acc = RunAccumulator::new();
        acc.record_trade(&trade(dec!(10), dec!(0.30), dec!(0.70)));
        acc.record_trade(&trade(dec!(5), dec!(0.80), dec!(0.20)));

        let s = acc.summary();
        assert_eq!(s.trade_count, 2);
        assert_eq!(s.total_profit, dec!(8));
        assert_eq!(s.total_stake, dec!(15));
        // (0.7 + 0.2) / 2
        assert_eq!(s.average_risk_reward, dec!(0.45));
        // 1.9 + (0.2 * 1 - 0.8 * 5)
        assert_eq!(s.total_expected_value, dec!(-1.9));
    }

    #[test]
    fn test_min_order_size_buckets() {
        let mut acc = RunAccumulator::new();
        for size in [dec!(5), dec!(15), dec!(5.0), dec!(1)] {
            acc.record_market(size);
        }
        let buckets: Vec<(Decimal, usize)> = acc.markets_by_min_order_size.into_iter().collect();
        assert_eq!(buckets, vec![(dec!(1), 1), (dec!(5), 2), (dec!(15), 1)]);
    }

    #[test]
    fn test_order_independent() {
        let trades = [
            trade(dec!(3.3333333333), dec!(0.30), dec!(0.7)),
            trade(dec!(5), dec!(0.95), dec!(0.05)),
            trade(dec!(12.5), dec!(0.08), dec!(0.92)),
            trade(dec!(7), dec!(0.51), dec!(0.49)),
        ];

        let mut forward = RunAccumulator::new();
        for t in &trades {
            forward.record_market(t.size);
            forward.record_trade(t);
        }

        let mut backward = RunAccumulator::new();
        for t in trades.iter().rev() {
            backward.record_market(t.size);
            backward.record_trade(t);
        }

        assert_eq!(forward.summary(), backward.summary());
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let trades = [
            trade(dec!(10), dec!(0.30), dec!(0.70)),
            trade(dec!(5), dec!(0.80), dec!(0.20)),
            trade(dec!(20), dec!(0.10), dec!(0.90)),
        ];

        let mut single = RunAccumulator::new();
        for t in &trades {
            single.record_market(dec!(5));
            single.record_trade(t);
        }

        let mut left = RunAccumulator::new();
        left.record_market(dec!(5));
        left.record_trade(&trades[0]);
        let mut right = RunAccumulator::new();
        for t in &trades[1..] {
            right.record_market(dec!(5));
            right.record_trade(t);
        }
        left.merge(right);

        assert_eq!(left, single);
    }
}
