use rust_decimal::Decimal;
use tracing::info;

use crate::clob::{ClobError, Exchange};
use crate::types::{Orderbook, PriceLevel};

/// Resting depth on one token's book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiquiditySnapshot {
    pub bid_size: Decimal,
    pub ask_size: Decimal,
    pub bid_usd: Decimal,
    pub ask_usd: Decimal,
}

impl LiquiditySnapshot {
    pub fn from_orderbook(book: &Orderbook) -> Self {
        Self {
            bid_size: total_size(&book.bids),
            ask_size: total_size(&book.asks),
            bid_usd: total_usd(&book.bids),
            ask_usd: total_usd(&book.asks),
        }
    }
}

fn total_size(levels: &[PriceLevel]) -> Decimal {
    levels.iter().map(|l| l.size).sum()
}

fn total_usd(levels: &[PriceLevel]) -> Decimal {
    levels.iter().map(|l| l.size * l.price).sum()
}

/// Aggregate the book for `token_id`.
///
/// A token without a book yields `Ok(None)`; any other failure is returned.
pub async fn get_liquidity<E: Exchange + ?Sized>(
    exchange: &E,
    token_id: &str,
) -> Result<Option<LiquiditySnapshot>, ClobError> {
    match exchange.get_order_book(token_id).await {
        Ok(book) => Ok(Some(LiquiditySnapshot::from_orderbook(&book))),
        Err(e) if e.is_not_found() => {
            info!("No orderbook exists for token id {}, skipping.", token_id);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
