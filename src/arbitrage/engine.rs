//! Scan loop: drives repeated round-trip scans across all configured
//! pairs, isolating per-pair failures and pacing outbound requests.

use log::{error, info, warn};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::{
    advisor::{AdvisoryGate, Decision},
    arbitrage::{executor::TradeExecutor, scanner::OpportunityScanner},
    config::PairConfig,
    error::BotError,
};

pub struct Engine {
    pairs: Vec<PairConfig>,
    scanner: OpportunityScanner,
    gate: AdvisoryGate,
    executor: TradeExecutor,
    /// Courtesy delay between pairs, for aggregator rate limits.
    pair_delay: Duration,
    /// Delay between full scan cycles.
    scan_interval: Duration,
}

impl Engine {
    pub fn new(
        pairs: Vec<PairConfig>,
        scanner: OpportunityScanner,
        gate: AdvisoryGate,
        executor: TradeExecutor,
        pair_delay: Duration,
        scan_interval: Duration,
    ) -> Self {
        Self {
            pairs,
            scanner,
            gate,
            executor,
            pair_delay,
            scan_interval,
        }
    }

    /// Runs scan cycles until the shutdown signal flips. Pairs are
    /// scanned sequentially; no two pairs in flight at once, by design.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut cycle_count: u64 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            cycle_count += 1;
            info!("Starting scan cycle #{}", cycle_count);
            self.run_cycle().await;

            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender means nobody can ever signal us;
                    // stop rather than spin without the interval sleep.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = sleep(self.scan_interval) => {}
            }
        }

        info!("Scan loop stopped after {} cycle(s)", cycle_count);
    }

    /// One pass over all configured pairs. Per-pair failures are logged
    /// and never abort the cycle or the other pairs.
    pub async fn run_cycle(&self) {
        for (i, pair) in self.pairs.iter().enumerate() {
            self.process_pair(pair).await;

            if i + 1 < self.pairs.len() {
                sleep(self.pair_delay).await;
            }
        }
    }

    async fn process_pair(&self, pair: &PairConfig) {
        let opportunity = match self.scanner.scan_pair(pair).await {
            Some(opportunity) => opportunity,
            None => return,
        };

        match self.gate.assess(&opportunity).await {
            Decision::Hold => {
                info!("[{}] advisory says HOLD, skipping execution", pair.name);
            }
            Decision::Execute => {
                if !self.executor.can_execute() {
                    info!(
                        "[{}] opportunity (~${:.4}) detected in scan-only mode",
                        pair.name, opportunity.profit_usd_estimate
                    );
                    return;
                }

                match self.executor.execute_round_trip(&opportunity).await {
                    Ok(round_trip) => {
                        info!(
                            "[{}] round trip confirmed: {:?} / {:?}",
                            pair.name, round_trip.leg1.signature, round_trip.leg2.signature
                        );
                    }
                    Err(BotError::PartialFill { signature, reason }) => {
                        // The one failure that changed our position; keep
                        // it loud and distinct.
                        error!(
                            "[{}] PARTIAL FILL: holding token B after leg 1 {} ({})",
                            pair.name, signature, reason
                        );
                    }
                    Err(BotError::ConfirmationTimeout(reason)) => {
                        warn!(
                            "[{}] confirmation timed out, position state unknown: {}",
                            pair.name, reason
                        );
                    }
                    Err(e) => {
                        warn!("[{}] execution failed, no position change: {}", pair.name, e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::types::test_fixtures::quote_fixture;
    use crate::config::{SOL_MINT, USDC_MINT};
    use crate::jupiter::{QuoteResponse, QuoteSource};
    use crate::price::StaticPriceTable;
    use crate::solana::TransactionBroadcaster;
    use async_trait::async_trait;
    use solana_sdk::signature::{Keypair, Signature};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    /// Aggregator mock covering both quoting and swap building.
    struct MockAggregator {
        quotes: HashMap<(String, u64), Result<QuoteResponse, BotError>>,
        built: Mutex<usize>,
    }

    impl MockAggregator {
        fn new() -> Self {
            Self {
                quotes: HashMap::new(),
                built: Mutex::new(0),
            }
        }

        fn quote(
            mut self,
            input_mint: &str,
            amount: u64,
            response: Result<QuoteResponse, BotError>,
        ) -> Self {
            self.quotes.insert((input_mint.to_string(), amount), response);
            self
        }

        fn swaps_built(&self) -> usize {
            *self.built.lock().unwrap()
        }
    }

    #[async_trait]
    impl QuoteSource for MockAggregator {
        async fn get_quote(
            &self,
            input_mint: &str,
            _output_mint: &str,
            amount: u64,
            _slippage_bps: u16,
        ) -> Result<QuoteResponse, BotError> {
            self.quotes
                .get(&(input_mint.to_string(), amount))
                .cloned()
                .unwrap_or_else(|| Err(BotError::QuoteUnavailable("no route".to_string())))
        }

        async fn get_swap_transaction(
            &self,
            _user_public_key: &str,
            _quote: &QuoteResponse,
        ) -> Result<String, BotError> {
            *self.built.lock().unwrap() += 1;
            Ok("dHg=".to_string())
        }
    }

    struct AlwaysConfirms;

    #[async_trait]
    impl TransactionBroadcaster for AlwaysConfirms {
        async fn sign_and_send(
            &self,
            _encoded_transaction: &str,
            _wallet: &Keypair,
            _description: &str,
        ) -> Result<Signature, BotError> {
            Ok(Signature::new_unique())
        }
    }

    fn pair(name: &str, input_mint: &str) -> PairConfig {
        PairConfig {
            name: name.to_string(),
            input_mint: input_mint.to_string(),
            input_decimals: 9,
            output_mint: USDC_MINT.to_string(),
            output_decimals: 6,
            trade_amount_ui: 0.1,
        }
    }

    #[tokio::test]
    async fn test_rate_limited_pair_does_not_abort_cycle() {
        // First pair's quote endpoint answers HTTP 429; the second pair
        // is profitable and still executes within the same cycle.
        let aggregator = Arc::new(
            MockAggregator::new()
                .quote(
                    BONK_MINT,
                    100_000_000,
                    Err(BotError::QuoteUnavailable("HTTP 429".to_string())),
                )
                .quote(
                    SOL_MINT,
                    100_000_000,
                    Ok(quote_fixture(SOL_MINT, 100_000_000, USDC_MINT, 13_000_000)),
                )
                .quote(
                    USDC_MINT,
                    13_000_000,
                    Ok(quote_fixture(USDC_MINT, 13_000_000, SOL_MINT, 100_500_000)),
                ),
        );

        let scanner = OpportunityScanner::new(
            aggregator.clone(),
            Arc::new(StaticPriceTable::new(130.0).with_price(BONK_MINT, 130.0)),
            0.05,
            50,
        );
        let executor = TradeExecutor::new(
            aggregator.clone(),
            Arc::new(AlwaysConfirms),
            Some(Arc::new(Keypair::new())),
            Duration::ZERO,
        );
        let engine = Engine::new(
            vec![pair("BONK/USDC", BONK_MINT), pair("SOL/USDC", SOL_MINT)],
            scanner,
            AdvisoryGate::new(None),
            executor,
            Duration::ZERO,
            Duration::from_secs(30),
        );

        engine.run_cycle().await;

        // Both legs of the SOL/USDC round trip were built and sent.
        assert_eq!(aggregator.swaps_built(), 2);
    }

    #[tokio::test]
    async fn test_scan_only_mode_never_builds_swaps() {
        let aggregator = Arc::new(
            MockAggregator::new()
                .quote(
                    SOL_MINT,
                    100_000_000,
                    Ok(quote_fixture(SOL_MINT, 100_000_000, USDC_MINT, 13_000_000)),
                )
                .quote(
                    USDC_MINT,
                    13_000_000,
                    Ok(quote_fixture(USDC_MINT, 13_000_000, SOL_MINT, 100_500_000)),
                ),
        );

        let scanner = OpportunityScanner::new(
            aggregator.clone(),
            Arc::new(StaticPriceTable::new(130.0)),
            0.05,
            50,
        );
        let executor = TradeExecutor::new(
            aggregator.clone(),
            Arc::new(AlwaysConfirms),
            None, // no wallet
            Duration::ZERO,
        );
        let engine = Engine::new(
            vec![pair("SOL/USDC", SOL_MINT)],
            scanner,
            AdvisoryGate::new(None),
            executor,
            Duration::ZERO,
            Duration::from_secs(30),
        );

        engine.run_cycle().await;
        assert_eq!(aggregator.swaps_built(), 0);
    }

    #[tokio::test]
    async fn test_run_honors_shutdown_signal() {
        let aggregator = Arc::new(MockAggregator::new());
        let scanner = OpportunityScanner::new(
            aggregator.clone(),
            Arc::new(StaticPriceTable::new(130.0)),
            0.05,
            50,
        );
        let executor = TradeExecutor::new(
            aggregator,
            Arc::new(AlwaysConfirms),
            None,
            Duration::ZERO,
        );
        let engine = Engine::new(
            vec![pair("SOL/USDC", SOL_MINT)],
            scanner,
            AdvisoryGate::new(None),
            executor,
            Duration::ZERO,
            Duration::from_secs(3600),
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { engine.run(rx).await });

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("engine stops promptly on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_shutdown_sender_dropped() {
        let aggregator = Arc::new(MockAggregator::new());
        let scanner = OpportunityScanner::new(
            aggregator.clone(),
            Arc::new(StaticPriceTable::new(130.0)),
            0.05,
            50,
        );
        let executor = TradeExecutor::new(
            aggregator,
            Arc::new(AlwaysConfirms),
            None,
            Duration::ZERO,
        );
        let engine = Engine::new(
            vec![pair("SOL/USDC", SOL_MINT)],
            scanner,
            AdvisoryGate::new(None),
            executor,
            Duration::ZERO,
            Duration::from_secs(3600),
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { engine.run(rx).await });

        // No shutdown signal is ever sent; the loop must still exit
        // instead of spinning cycles back to back.
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("engine stops once the sender is gone")
            .unwrap();
    }
}
