use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    error::BotError,
    jupiter::api::{QuoteRequest, QuoteResponse, SwapRequest, SwapResponse},
    jupiter::QuoteSource,
};

/// Jupiter API v6 endpoints
const JUPITER_API_BASE: &str = "https://quote-api.jup.ag/v6";
const JUPITER_QUOTE_ENDPOINT: &str = "quote";
const JUPITER_SWAP_ENDPOINT: &str = "swap";

/// Jupiter API rate limits (conservative)
const JUPITER_REQUESTS_PER_SECOND: u32 = 10;
const JUPITER_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Rate limiter for Jupiter API calls
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(requests_per_second: u32) -> Self {
        Self {
            last_request: Instant::now() - Duration::from_secs(1),
            min_interval: Duration::from_millis(1000 / requests_per_second as u64),
        }
    }

    async fn wait_if_needed(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Jupiter aggregator client for quotes and swap-transaction building.
pub struct JupiterClient {
    client: Client,
    base_url: String,
    slippage_bps: u16,
    rate_limiter: Arc<tokio::sync::Mutex<RateLimiter>>,
}

impl JupiterClient {
    /// Create a new Jupiter client with an explicit request timeout.
    /// Quote staleness bounds the whole round-trip invariant, so the
    /// transport default is not enough.
    pub fn new(slippage_bps: u16) -> Result<Self, BotError> {
        Self::with_base_url(JUPITER_API_BASE, slippage_bps)
    }

    pub fn with_base_url(base_url: &str, slippage_bps: u16) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(JUPITER_REQUEST_TIMEOUT_MS))
            .user_agent("jupiter-cycle-bot/0.1")
            .build()
            .map_err(|e| BotError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            slippage_bps,
            rate_limiter: Arc::new(tokio::sync::Mutex::new(RateLimiter::new(
                JUPITER_REQUESTS_PER_SECOND,
            ))),
        })
    }

    pub fn slippage_bps(&self) -> u16 {
        self.slippage_bps
    }
}

#[async_trait]
impl QuoteSource for JupiterClient {
    async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<QuoteResponse, BotError> {
        self.rate_limiter.lock().await.wait_if_needed().await;

        let request = QuoteRequest {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount,
            slippage_bps,
            only_direct_routes: false, // consider all routes
        };

        let url = format!("{}/{}", self.base_url, JUPITER_QUOTE_ENDPOINT);
        debug!(
            "Requesting Jupiter quote: {} {} -> {}",
            amount, input_mint, output_mint
        );

        let response = self
            .client
            .get(&url)
            .query(&request)
            .send()
            .await
            .map_err(|e| BotError::QuoteUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::QuoteUnavailable(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let quote: QuoteResponse = response
            .json()
            .await
            .map_err(|e| BotError::QuoteUnavailable(format!("unparseable response: {}", e)))?;

        debug!(
            "Jupiter quote received: {} -> {}",
            quote.in_amount, quote.out_amount
        );

        Ok(quote)
    }

    async fn get_swap_transaction(
        &self,
        user_public_key: &str,
        quote: &QuoteResponse,
    ) -> Result<String, BotError> {
        if user_public_key.is_empty() {
            return Err(BotError::InvalidUserKey(
                "no user public key supplied for swap build".to_string(),
            ));
        }

        self.rate_limiter.lock().await.wait_if_needed().await;

        let swap_request = SwapRequest {
            user_public_key: user_public_key.to_string(),
            quote_response: quote.clone(),
            wrap_and_unwrap_sol: true,
            compute_unit_price_micro_lamports: "auto".to_string(),
        };

        let url = format!("{}/{}", self.base_url, JUPITER_SWAP_ENDPOINT);

        let response = self
            .client
            .post(&url)
            .json(&swap_request)
            .send()
            .await
            .map_err(|e| BotError::SwapBuildFailed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::SwapBuildFailed(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let swap: SwapResponse = response
            .json()
            .await
            .map_err(|e| BotError::SwapBuildFailed(format!("unparseable response: {}", e)))?;

        if swap.swap_transaction.is_empty() {
            return Err(BotError::SwapBuildFailed(
                "response contained no swapTransaction".to_string(),
            ));
        }

        Ok(swap.swap_transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_interval() {
        let limiter = RateLimiter::new(10);
        assert_eq!(limiter.min_interval, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_swap_build_requires_user_key() {
        let client = JupiterClient::new(50).unwrap();
        let quote: QuoteResponse = serde_json::from_str(
            r#"{"inputMint":"a","inAmount":"1","outputMint":"b","outAmount":"2"}"#,
        )
        .unwrap();

        let result = client.get_swap_transaction("", &quote).await;
        assert!(matches!(result, Err(BotError::InvalidUserKey(_))));
    }
}
