// src/main.rs
use jupiter_cycle_bot::{
    advisor::{AdvisoryGate, OpenRouterAdvisor, TradeAdvisor},
    arbitrage::{Engine, OpportunityScanner, TradeExecutor},
    config,
    error::{BotError, RetryPolicy},
    jupiter::JupiterClient,
    price::{PriceProvider, StaticPriceTable},
    solana::{RpcBroadcaster, TransactionBroadcaster},
    utils::{load_keypair, setup_logging},
};
use log::{info, warn};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), BotError> {
    setup_logging().expect("Failed to initialize logging");
    info!("Jupiter round-trip arbitrage bot starting...");

    let app_config = config::load_config()?;

    // Wallet is optional: without one the bot runs in scan-only mode.
    let wallet = match &app_config.trader_wallet_keypair_path {
        Some(path) => match load_keypair(path) {
            Ok(keypair) => {
                use solana_sdk::signer::Signer;
                info!("Loaded trading wallet: {}", keypair.pubkey());
                Some(Arc::new(keypair))
            }
            Err(e) => {
                warn!("{}. Execution will be disabled.", e);
                None
            }
        },
        None => {
            warn!("No trader wallet configured. Execution will be disabled.");
            None
        }
    };

    let jupiter = Arc::new(JupiterClient::new(app_config.slippage_bps)?);

    let price_provider: Arc<dyn PriceProvider> =
        Arc::new(StaticPriceTable::new(app_config.sol_price_usd));

    let advisor: Option<Arc<dyn TradeAdvisor>> = match &app_config.openrouter_api_key {
        Some(key) => {
            info!("Advisory gating enabled (model: {})", app_config.openrouter_model);
            Some(Arc::new(OpenRouterAdvisor::new(
                key,
                &app_config.openrouter_model,
            )?))
        }
        None => {
            info!("No advisory service configured; opportunities execute ungated.");
            None
        }
    };

    let broadcaster: Arc<dyn TransactionBroadcaster> = Arc::new(RpcBroadcaster::new(
        &app_config.rpc_url,
        RetryPolicy::new(
            app_config.rpc_max_retries as u32,
            Duration::from_millis(app_config.rpc_retry_delay_ms),
            Duration::from_secs(5),
        ),
        Duration::from_secs(app_config.confirm_timeout_secs),
        Duration::from_millis(app_config.confirm_poll_ms),
    ));

    let scanner = OpportunityScanner::new(
        jupiter.clone(),
        price_provider,
        app_config.min_profit_threshold_usd,
        app_config.slippage_bps,
    );
    let executor = TradeExecutor::new(
        jupiter,
        broadcaster,
        wallet,
        Duration::from_secs(app_config.settle_delay_secs),
    );
    let engine = Engine::new(
        app_config.monitored_pairs.clone(),
        scanner,
        AdvisoryGate::new(advisor),
        executor,
        Duration::from_millis(app_config.pair_delay_ms),
        Duration::from_secs(app_config.scan_interval_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine_handle = tokio::spawn(async move { engine.run(shutdown_rx).await });

    info!("Bot is running. Press CTRL-C to exit.");
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl-c");

    info!("Shutting down gracefully...");
    shutdown_tx
        .send(true)
        .map_err(|e| BotError::ConfigError(format!("shutdown channel closed: {}", e)))?;

    engine_handle
        .await
        .map_err(|e| BotError::RpcError(format!("engine task failed: {}", e)))?;

    info!("Shutdown complete.");
    Ok(())
}
