use std::env;

use crate::error::BotError;

pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Immutable description of one monitored pair.
#[derive(Debug, Clone)]
pub struct PairConfig {
    pub name: String,
    pub input_mint: String,
    pub input_decimals: u8,
    pub output_mint: String,
    pub output_decimals: u8,
    /// Notional amount of token A to test with, in UI units.
    pub trade_amount_ui: f64,
}

impl PairConfig {
    /// Parses one `name|mintA|decA|mintB|decB|amount` entry.
    fn parse(entry: &str) -> Result<Self, BotError> {
        let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
        if parts.len() != 6 {
            return Err(BotError::ConfigError(format!(
                "pair entry '{}' must have 6 '|'-separated fields",
                entry
            )));
        }

        let parse_err = |field: &str, e: &dyn std::fmt::Display| {
            BotError::ConfigError(format!("pair '{}': bad {}: {}", parts[0], field, e))
        };

        Ok(PairConfig {
            name: parts[0].to_string(),
            input_mint: parts[1].to_string(),
            input_decimals: parts[2]
                .parse()
                .map_err(|e| parse_err("input decimals", &e))?,
            output_mint: parts[3].to_string(),
            output_decimals: parts[4]
                .parse()
                .map_err(|e| parse_err("output decimals", &e))?,
            trade_amount_ui: parts[5]
                .parse()
                .map_err(|e| parse_err("trade amount", &e))?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub rpc_max_retries: usize,
    pub rpc_retry_delay_ms: u64,
    pub trader_wallet_keypair_path: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub monitored_pairs: Vec<PairConfig>,
    pub min_profit_threshold_usd: f64,
    pub slippage_bps: u16,
    pub sol_price_usd: f64,
    pub scan_interval_secs: u64,
    pub pair_delay_ms: u64,
    pub settle_delay_secs: u64,
    pub confirm_timeout_secs: u64,
    pub confirm_poll_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, BotError> {
        let monitored_pairs = match env::var("MONITORED_PAIRS") {
            Ok(raw) => raw
                .split(';')
                .filter(|s| !s.trim().is_empty())
                .map(PairConfig::parse)
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => vec![PairConfig {
                name: "SOL/USDC".to_string(),
                input_mint: SOL_MINT.to_string(),
                input_decimals: 9,
                output_mint: USDC_MINT.to_string(),
                output_decimals: 6,
                trade_amount_ui: 0.1,
            }],
        };

        Ok(Config {
            rpc_url: env::var("RPC_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string()),
            rpc_max_retries: env::var("RPC_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            rpc_retry_delay_ms: env::var("RPC_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            trader_wallet_keypair_path: env::var("TRADER_WALLET_KEYPAIR_PATH")
                .ok()
                .filter(|p| !p.is_empty()),
            openrouter_api_key: env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            openrouter_model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "openai/gpt-3.5-turbo".to_string()),
            monitored_pairs,
            min_profit_threshold_usd: env::var("MIN_PROFIT_THRESHOLD_USD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.05),
            slippage_bps: env::var("SLIPPAGE_BPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            sol_price_usd: env::var("SOL_PRICE_USD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(130.0),
            scan_interval_secs: env::var("SCAN_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            pair_delay_ms: env::var("PAIR_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            settle_delay_secs: env::var("SETTLE_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            confirm_timeout_secs: env::var("CONFIRM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            confirm_poll_ms: env::var("CONFIRM_POLL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
        })
    }

    pub fn validate_and_log(&self) -> Result<(), BotError> {
        if self.rpc_url.is_empty() {
            return Err(BotError::ConfigError("RPC_URL cannot be empty".to_string()));
        }
        if self.monitored_pairs.is_empty() {
            return Err(BotError::ConfigError(
                "MONITORED_PAIRS cannot be empty".to_string(),
            ));
        }
        for pair in &self.monitored_pairs {
            if pair.trade_amount_ui <= 0.0 {
                return Err(BotError::ConfigError(format!(
                    "pair '{}': trade amount must be positive",
                    pair.name
                )));
            }
        }
        log::info!(
            "Configuration loaded: {} pair(s), threshold ${:.2}, slippage {} bps, cycle every {}s",
            self.monitored_pairs.len(),
            self.min_profit_threshold_usd,
            self.slippage_bps,
            self.scan_interval_secs
        );
        Ok(())
    }
}
