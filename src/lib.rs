//! Odds scanner for Polymarket binary markets
//!
//! Walks every sampled market on the CLOB, turns the YES/NO quotes into
//! normalized win probabilities, and backs either the favorite or the
//! underdog of each market with a fixed notional, provided the price is
//! tradeable and the book is deep enough. Totals for the whole pass
//! (potential profit, stake at risk, risk/reward, expected value) are
//! reported at the end. Orders are signed for every decision and only
//! posted when dry-run is off.

pub mod auth;
pub mod clob;
pub mod config;
pub mod executor;
pub mod market;
pub mod orderbook;
pub mod pricing;
pub mod report;
pub mod signer;
pub mod strategy;
pub mod trader;
pub mod types;

#[cfg(test)]
mod testkit;
