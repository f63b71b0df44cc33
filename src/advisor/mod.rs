//! Advisory gating for detected opportunities.
//!
//! The advisor is a pluggable capability: an absent advisor means the
//! operator opted out of gating and every opportunity executes; a
//! configured advisor that errors holds the trade. That asymmetry is
//! intentional.

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::arbitrage::types::Opportunity;
use crate::error::BotError;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const ADVISORY_REQUEST_TIMEOUT_MS: u64 = 10_000;

const SYSTEM_PROMPT: &str = "You are a trading risk assessor for a Solana round-trip arbitrage bot. \
     Reply with a single word on the first line: EXECUTE to approve the trade, HOLD to reject it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Execute,
    Hold,
}

impl Decision {
    /// Parses an advisory response: the first non-empty line, compared
    /// case-insensitively against the literal token EXECUTE. Anything
    /// else holds.
    pub fn from_response(content: &str) -> Decision {
        let first_line = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");

        if first_line.to_ascii_uppercase().starts_with("EXECUTE") {
            Decision::Execute
        } else {
            Decision::Hold
        }
    }
}

#[async_trait]
pub trait TradeAdvisor: Send + Sync {
    async fn assess(&self, opportunity: &Opportunity) -> Result<Decision, BotError>;
}

/// Gate in front of the executor. Holds an optional advisor and applies
/// the fail-open / fail-closed policy.
pub struct AdvisoryGate {
    advisor: Option<Arc<dyn TradeAdvisor>>,
}

impl AdvisoryGate {
    pub fn new(advisor: Option<Arc<dyn TradeAdvisor>>) -> Self {
        Self { advisor }
    }

    pub async fn assess(&self, opportunity: &Opportunity) -> Decision {
        match &self.advisor {
            // No advisory service configured: fail open.
            None => Decision::Execute,
            Some(advisor) => match advisor.assess(opportunity).await {
                Ok(decision) => {
                    debug!(
                        "Advisory decision for {}: {:?}",
                        opportunity.pair_name, decision
                    );
                    decision
                }
                // Service error: fail closed.
                Err(e) => {
                    warn!(
                        "Advisory service failed for {}, holding: {}",
                        opportunity.pair_name, e
                    );
                    Decision::Hold
                }
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Chat-completion advisor backed by OpenRouter.
pub struct OpenRouterAdvisor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterAdvisor {
    pub fn new(api_key: &str, model: &str) -> Result<Self, BotError> {
        Self::with_base_url(OPENROUTER_API_BASE, api_key, model)
    }

    pub fn with_base_url(base_url: &str, api_key: &str, model: &str) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(ADVISORY_REQUEST_TIMEOUT_MS))
            .build()
            .map_err(|e| {
                BotError::ConfigError(format!("Failed to create advisory HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn build_prompt(opportunity: &Opportunity) -> String {
        format!(
            "Pair: {}\nEstimated profit: ${:.4} ({:.9} of token A)\n\
             Forward quote: {}\nReverse quote: {}",
            opportunity.pair_name,
            opportunity.profit_usd_estimate,
            opportunity.profit_token_a_ui,
            serde_json::to_string(&opportunity.quote_a_to_b).unwrap_or_default(),
            serde_json::to_string(&opportunity.quote_b_to_a).unwrap_or_default(),
        )
    }
}

#[async_trait]
impl TradeAdvisor for OpenRouterAdvisor {
    async fn assess(&self, opportunity: &Opportunity) -> Result<Decision, BotError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::build_prompt(opportunity),
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::AdvisoryServiceError(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::AdvisoryServiceError(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| BotError::AdvisoryServiceError(format!("unparseable response: {}", e)))?;

        let content = chat
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| {
                BotError::AdvisoryServiceError("response contained no choices".to_string())
            })?;

        Ok(Decision::from_response(content))
    }
}
