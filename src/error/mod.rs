use log::{debug, error, info, warn};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Clone, Error)]
pub enum BotError {
    /// Quote endpoint returned non-2xx, transport failed, or the
    /// response was missing an output amount.
    #[error("Quote Unavailable: {0}")]
    QuoteUnavailable(String),

    /// Swap-build endpoint failed or returned no transaction.
    #[error("Swap Build Failed: {0}")]
    SwapBuildFailed(String),

    /// No public key supplied for the swap-build request.
    #[error("Invalid User Key: {0}")]
    InvalidUserKey(String),

    /// No signing key loaded; execution is disabled.
    #[error("No wallet loaded, running in scan-only mode")]
    NoWallet,

    /// Transaction was rejected before or during submission; funds untouched.
    #[error("Submission Failed: {0}")]
    SubmissionFailed(String),

    /// Transaction was submitted but never reached the target commitment.
    #[error("Confirmation Timeout: {0}")]
    ConfirmationTimeout(String),

    /// Leg 1 confirmed but leg 2 did not; position is left in token B.
    #[error("Partial Fill: leg 1 confirmed ({signature}) but leg 2 failed: {reason}")]
    PartialFill { signature: String, reason: String },

    /// Advisory service request or response parsing failed.
    #[error("Advisory Service Error: {0}")]
    AdvisoryServiceError(String),

    /// Configuration errors
    #[error("Config Error: {0}")]
    ConfigError(String),

    /// RPC/Solana network errors
    #[error("RPC Error: {0}")]
    RpcError(String),

    /// Parsing errors for wire data
    #[error("Parse Error: {0}")]
    ParseError(String),
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::ParseError(format!("JSON serialization/deserialization error: {}", err))
    }
}

impl From<solana_client::client_error::ClientError> for BotError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        BotError::RpcError(format!("Solana client error: {}", err))
    }
}

impl BotError {
    /// Determines if an error is recoverable by retrying on a later cycle.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BotError::QuoteUnavailable(_) => true,
            BotError::SwapBuildFailed(_) => true,
            BotError::InvalidUserKey(_) => false,
            BotError::NoWallet => false,
            BotError::SubmissionFailed(_) => true,
            BotError::ConfirmationTimeout(_) => true,
            // A partial fill changed our position; retrying the same
            // round trip would not correct it.
            BotError::PartialFill { .. } => false,
            BotError::AdvisoryServiceError(_) => true,
            BotError::ConfigError(_) => false,
            BotError::RpcError(_) => true,
            BotError::ParseError(_) => false,
        }
    }

    /// Determines if an operation should be retried immediately rather
    /// than waiting for the next scan cycle.
    pub fn should_retry(&self) -> bool {
        self.is_recoverable()
            && matches!(
                self,
                BotError::QuoteUnavailable(_)
                    | BotError::RpcError(_)
                    | BotError::SubmissionFailed(_)
            )
    }
}

/// Retry policy with exponential backoff. Replaces the unbounded
/// recursive reconnect pattern with a bounded loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Calculate delay for a given attempt (exponential backoff with jitter).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let delay_ms = self.base_delay.as_millis() * (2_u128.pow(attempt - 1));
        let mut delay_ms = delay_ms.min(self.max_delay.as_millis()) as u64;
        if delay_ms > 0 {
            use rand::Rng;
            delay_ms += rand::thread_rng().gen_range(0..(delay_ms / 4).max(1));
        }

        let delay = Duration::from_millis(delay_ms);
        debug!("Retry attempt {}: delay = {:?}", attempt, delay);
        delay
    }

    /// Execute operation with retry logic.
    pub async fn execute<F, T, E, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
        E: Into<BotError>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                sleep(self.delay_for_attempt(attempt)).await;
            }

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!("Operation succeeded after {} retries", attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    let bot_error: BotError = e.into();

                    if !bot_error.should_retry() {
                        warn!(
                            "Non-retryable error on attempt {}: {}",
                            attempt + 1,
                            bot_error
                        );
                        return Err(bot_error);
                    }

                    warn!("Attempt {} failed: {} (retrying...)", attempt + 1, bot_error);
                    last_error = Some(bot_error);
                }
            }
        }

        error!("All {} retry attempts failed", self.max_attempts);
        Err(last_error
            .unwrap_or_else(|| BotError::RpcError("Max retries exceeded".to_string())))
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
