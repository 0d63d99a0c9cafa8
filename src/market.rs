use tracing::{debug, info, warn};

use crate::clob::{ClobError, Exchange};
use crate::types::Market;

/// Cursor the CLOB returns once the last page has been served
pub const END_CURSOR: &str = "LTE=";
const START_CURSOR: &str = "";

/// Every market the venue samples, in server order.
///
/// Pages are walked until the end cursor. Records that fail validation are
/// logged and left out. Transport errors abort the walk.
pub async fn fetch_all_markets<E: Exchange + ?Sized>(
    exchange: &E,
) -> Result<Vec<Market>, ClobError> {
    let mut markets = Vec::new();
    let mut rejected = 0usize;
    let mut cursor = START_CURSOR.to_string();
    let mut pages = 0usize;

    loop {
        let page = exchange.get_sampling_markets(&cursor).await?;
        pages += 1;
        debug!("Page {} (cursor {:?}): {} markets", pages, cursor, page.data.len());

        for record in page.data {
            match Market::try_from(record) {
                Ok(market) => markets.push(market),
                Err(e) => {
                    warn!("Dropping malformed market record: {}", e);
                    rejected += 1;
                }
            }
        }

        if page.next_cursor == END_CURSOR {
            break;
        }
        cursor = page.next_cursor;
    }

    info!(
        "Fetched {} markets over {} pages ({} malformed records dropped)",
        markets.len(),
        pages,
        rejected
    );

    Ok(markets)
}

/// Active markets with exactly two outcomes
pub fn tradeable_markets(markets: &[Market]) -> impl Iterator<Item = &Market> {
    markets.iter().filter(|m| m.is_tradeable())
}
