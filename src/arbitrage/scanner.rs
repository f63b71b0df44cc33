//! Round-trip opportunity detection for one configured pair.

use log::{debug, info, warn};
use std::sync::Arc;

use crate::{
    arbitrage::types::Opportunity,
    config::PairConfig,
    jupiter::QuoteSource,
    price::PriceProvider,
    utils::{to_smallest_units, to_ui_amount},
};

pub struct OpportunityScanner {
    quote_source: Arc<dyn QuoteSource>,
    price_provider: Arc<dyn PriceProvider>,
    min_profit_threshold_usd: f64,
    slippage_bps: u16,
}

impl OpportunityScanner {
    pub fn new(
        quote_source: Arc<dyn QuoteSource>,
        price_provider: Arc<dyn PriceProvider>,
        min_profit_threshold_usd: f64,
        slippage_bps: u16,
    ) -> Self {
        Self {
            quote_source,
            price_provider,
            min_profit_threshold_usd,
            slippage_bps,
        }
    }

    /// Quotes A->B for the configured amount, then B->A for the exact
    /// amount of B the forward quote produced, and returns an
    /// Opportunity only when the estimated USD profit clears the
    /// threshold. Any quote failure ends the scan for this pair.
    pub async fn scan_pair(&self, pair: &PairConfig) -> Option<Opportunity> {
        let amount_a_initial = to_smallest_units(pair.trade_amount_ui, pair.input_decimals);

        let quote_a_to_b = match self
            .quote_source
            .get_quote(
                &pair.input_mint,
                &pair.output_mint,
                amount_a_initial,
                self.slippage_bps,
            )
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                warn!("[{}] forward quote unavailable: {}", pair.name, e);
                return None;
            }
        };

        let amount_b_received = match quote_a_to_b.out_amount_units() {
            Ok(amount) => amount,
            Err(e) => {
                warn!("[{}] forward quote rejected: {}", pair.name, e);
                return None;
            }
        };

        // The reverse leg quotes the exact output of the forward leg,
        // modelling a true round trip. A zero amount is passed through
        // and expected to fail cleanly at the aggregator.
        let quote_b_to_a = match self
            .quote_source
            .get_quote(
                &pair.output_mint,
                &pair.input_mint,
                amount_b_received,
                self.slippage_bps,
            )
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                warn!("[{}] reverse quote unavailable: {}", pair.name, e);
                return None;
            }
        };

        let amount_a_returned = match quote_b_to_a.out_amount_units() {
            Ok(amount) => amount,
            Err(e) => {
                warn!("[{}] reverse quote rejected: {}", pair.name, e);
                return None;
            }
        };

        let profit_units = amount_a_returned as i64 - amount_a_initial as i64;
        let profit_ui = to_ui_amount(profit_units, pair.input_decimals);

        let price_usd = match self.price_provider.usd_price(&pair.input_mint) {
            Some(price) => price,
            None => {
                warn!(
                    "[{}] no USD price for mint {}, cannot apply threshold",
                    pair.name, pair.input_mint
                );
                return None;
            }
        };
        let profit_usd = profit_ui * price_usd;

        debug!(
            "[{}] round trip: {} -> {} -> {} ({:+} units, ~${:.4})",
            pair.name, amount_a_initial, amount_b_received, amount_a_returned, profit_units, profit_usd
        );

        if profit_usd > self.min_profit_threshold_usd {
            info!(
                "[{}] opportunity: profit {:.9} token A (~${:.4})",
                pair.name, profit_ui, profit_usd
            );
            Some(Opportunity {
                pair_name: pair.name.clone(),
                profit_token_a_units: profit_units,
                profit_token_a_ui: profit_ui,
                profit_usd_estimate: profit_usd,
                quote_a_to_b,
                quote_b_to_a,
            })
        } else {
            None
        }
    }
}
