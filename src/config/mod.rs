pub mod settings;

pub use settings::{Config, PairConfig, SOL_MINT, USDC_MINT};

use crate::error::BotError;
use std::sync::Arc;

/// Loads and returns the application configuration as an `Arc<Config>`.
/// Centralizes `.env` loading and validation.
pub fn load_config() -> Result<Arc<Config>, BotError> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors

    let config = Config::from_env()?;
    config.validate_and_log()?;

    Ok(Arc::new(config))
}
