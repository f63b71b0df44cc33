//! Jupiter V6 aggregator integration.

pub mod api;
pub mod client;

use async_trait::async_trait;

use crate::error::BotError;
pub use api::{QuoteRequest, QuoteResponse, SwapRequest, SwapResponse};
pub use client::JupiterClient;

/// Read access to the aggregator's quote and swap-build endpoints.
///
/// Scanner and executor depend on this trait rather than the concrete
/// HTTP client so tests can swap in mock backends.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Quote `amount` of `input_mint` (smallest units) into `output_mint`.
    async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<QuoteResponse, BotError>;

    /// Build an unsigned, aggregator-routed swap transaction for `quote`,
    /// returned base64-encoded.
    async fn get_swap_transaction(
        &self,
        user_public_key: &str,
        quote: &QuoteResponse,
    ) -> Result<String, BotError>;
}
