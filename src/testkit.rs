//! In-memory exchange and executor for unit tests.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::clob::{ClobError, Exchange};
use crate::executor::{ExecutionReport, OrderExecutor};
use crate::strategy::TradeDecision;
use crate::types::{
    Market, MarketsPage, Order, OrderType, Orderbook, PriceLevel, RawMarket, RawToken, Side,
    SignedOrder,
};

/// Active two-outcome market with default tick size
pub fn binary_market(
    condition_id: &str,
    yes_token: &str,
    no_token: &str,
    min_order_size: Decimal,
) -> Market {
    let raw = raw_binary_market(condition_id, yes_token, no_token, min_order_size);
    Market::try_from(raw).expect("fixture market is valid")
}

pub fn raw_binary_market(
    condition_id: &str,
    yes_token: &str,
    no_token: &str,
    min_order_size: Decimal,
) -> RawMarket {
    RawMarket {
        condition_id: Some(condition_id.to_string()),
        question: Some(format!("Question for {}", condition_id)),
        tokens: Some(vec![
            RawToken {
                token_id: Some(yes_token.to_string()),
                outcome: Some("Yes".to_string()),
            },
            RawToken {
                token_id: Some(no_token.to_string()),
                outcome: Some("No".to_string()),
            },
        ]),
        minimum_order_size: Some(min_order_size),
        active: Some(true),
        ..Default::default()
    }
}

enum Scripted<T> {
    Value(T),
    Fail,
}

/// Scripted exchange: pages keyed by cursor, prices by (token, side), books by token.
/// Anything not scripted is absent (no quote, no book).
#[derive(Default)]
pub struct FakeExchange {
    pages: HashMap<String, (Vec<serde_json::Value>, String)>,
    prices: HashMap<(String, Side), Scripted<Decimal>>,
    books: HashMap<String, Scripted<Orderbook>>,
    page_requests: Mutex<Vec<String>>,
}

impl FakeExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, cursor: &str, markets: Vec<Market>, next_cursor: &str) -> Self {
        let raw = markets
            .into_iter()
            .map(|m| {
                let (yes, no) = m
                    .binary_tokens()
                    .map(|(y, n)| (y.token_id.clone(), n.token_id.clone()))
                    .unwrap_or_default();
                let mut raw = raw_binary_market(&m.condition_id, &yes, &no, m.minimum_order_size);
                raw.active = Some(m.active);
                raw
            })
            .collect();
        self.with_raw_page(cursor, raw, next_cursor)
    }

    pub fn with_raw_page(self, cursor: &str, markets: Vec<RawMarket>, next_cursor: &str) -> Self {
        let records = markets
            .iter()
            .map(|m| serde_json::to_value(m).expect("raw market serializes"))
            .collect();
        self.with_json_page(cursor, records, next_cursor)
    }

    /// Page served verbatim, for records no typed fixture can express
    pub fn with_json_page(
        mut self,
        cursor: &str,
        records: Vec<serde_json::Value>,
        next_cursor: &str,
    ) -> Self {
        self.pages.insert(cursor.to_string(), (records, next_cursor.to_string()));
        self
    }

    pub fn with_price(mut self, token_id: &str, side: Side, price: Decimal) -> Self {
        self.prices.insert((token_id.to_string(), side), Scripted::Value(price));
        self
    }

    /// Price lookups for this token and side fail with a server error
    pub fn with_failing_price(mut self, token_id: &str, side: Side) -> Self {
        self.prices.insert((token_id.to_string(), side), Scripted::Fail);
        self
    }

    /// Levels are (price, size)
    pub fn with_book(
        mut self,
        token_id: &str,
        bids: &[(Decimal, Decimal)],
        asks: &[(Decimal, Decimal)],
    ) -> Self {
        let levels = |l: &[(Decimal, Decimal)]| {
            l.iter().map(|&(price, size)| PriceLevel { price, size }).collect::<Vec<_>>()
        };
        let book = Orderbook {
            market: String::new(),
            asset_id: token_id.to_string(),
            bids: levels(bids),
            asks: levels(asks),
        };
        self.books.insert(token_id.to_string(), Scripted::Value(book));
        self
    }

    /// Book lookups for this token fail with a server error
    pub fn with_failing_book(mut self, token_id: &str) -> Self {
        self.books.insert(token_id.to_string(), Scripted::Fail);
        self
    }

    pub fn page_requests(&self) -> Vec<String> {
        self.page_requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

fn server_error() -> ClobError {
    ClobError::Api {
        status: 500,
        body: "internal error".to_string(),
    }
}

#[async_trait]
impl Exchange for FakeExchange {
    async fn get_sampling_markets(&self, cursor: &str) -> Result<MarketsPage, ClobError> {
        if let Ok(mut requests) = self.page_requests.lock() {
            requests.push(cursor.to_string());
        }
        match self.pages.get(cursor) {
            Some((data, next_cursor)) => Ok(MarketsPage {
                data: data.clone(),
                next_cursor: next_cursor.clone(),
            }),
            None => Err(ClobError::Api {
                status: 400,
                body: format!("unknown cursor {:?}", cursor),
            }),
        }
    }

    async fn get_price(&self, token_id: &str, side: Side) -> Result<Option<Decimal>, ClobError> {
        match self.prices.get(&(token_id.to_string(), side)) {
            Some(Scripted::Value(price)) => Ok(Some(*price)),
            Some(Scripted::Fail) => Err(server_error()),
            None => Ok(None),
        }
    }

    async fn get_order_book(&self, token_id: &str) -> Result<Orderbook, ClobError> {
        match self.books.get(token_id) {
            Some(Scripted::Value(book)) => Ok(book.clone()),
            Some(Scripted::Fail) => Err(server_error()),
            None => Err(ClobError::NotFound(format!(
                "No orderbook exists for the requested token id {}",
                token_id
            ))),
        }
    }
}

/// Records which markets were executed; never signs anything
#[derive(Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OrderExecutor for RecordingExecutor {
    async fn execute(&self, decision: &TradeDecision) -> Result<ExecutionReport> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(decision.condition_id.clone());
        }
        Ok(ExecutionReport::Signed(Order {
            order: SignedOrder {
                salt: "0".to_string(),
                maker: String::new(),
                signer: String::new(),
                taker: String::new(),
                token_id: decision.token_id.clone(),
                maker_amount: String::new(),
                taker_amount: String::new(),
                expiration: "0".to_string(),
                nonce: "0".to_string(),
                fee_rate_bps: "0".to_string(),
                side: Side::Buy,
                signature_type: 0,
                signature: String::new(),
            },
            owner: String::new(),
            order_type: OrderType::Gtc,
        }))
    }
}
