//! USD price lookup used to gate the profit threshold.
//!
//! The static table is a known placeholder for a real price feed; prices
//! are fixed at startup and go stale as the market moves.

use std::collections::HashMap;

use crate::config::{SOL_MINT, USDC_MINT};

const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

pub trait PriceProvider: Send + Sync {
    /// USD price of one whole token of `mint`, if known.
    fn usd_price(&self, mint: &str) -> Option<f64>;
}

/// Fixed per-mint price table, seeded from configuration at startup.
pub struct StaticPriceTable {
    prices: HashMap<String, f64>,
}

impl StaticPriceTable {
    pub fn new(sol_price_usd: f64) -> Self {
        let mut prices = HashMap::new();
        prices.insert(SOL_MINT.to_string(), sol_price_usd);
        prices.insert(USDC_MINT.to_string(), 1.0);
        prices.insert(USDT_MINT.to_string(), 1.0);
        Self { prices }
    }

    pub fn with_price(mut self, mint: &str, price: f64) -> Self {
        self.prices.insert(mint.to_string(), price);
        self
    }
}

impl PriceProvider for StaticPriceTable {
    fn usd_price(&self, mint: &str) -> Option<f64> {
        self.prices.get(mint).copied()
    }
}
