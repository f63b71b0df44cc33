//! Two-leg trade execution with partial-fill accounting.

use log::{info, warn};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::{
    arbitrage::types::{Opportunity, RoundTrip, TradeResult},
    error::BotError,
    jupiter::QuoteSource,
    solana::TransactionBroadcaster,
};

pub struct TradeExecutor {
    quote_source: Arc<dyn QuoteSource>,
    broadcaster: Arc<dyn TransactionBroadcaster>,
    wallet: Option<Arc<Keypair>>,
    /// Coarse substitute for a balance check: leg 2 waits this long for
    /// leg 1's output to settle.
    settle_delay: Duration,
}

impl TradeExecutor {
    pub fn new(
        quote_source: Arc<dyn QuoteSource>,
        broadcaster: Arc<dyn TransactionBroadcaster>,
        wallet: Option<Arc<Keypair>>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            quote_source,
            broadcaster,
            wallet,
            settle_delay,
        }
    }

    pub fn can_execute(&self) -> bool {
        self.wallet.is_some()
    }

    /// Runs both legs of the round trip. A failure anywhere before leg 1
    /// confirms leaves balances unchanged (each leg is a single atomic
    /// transaction) and surfaces the underlying error. A failure after
    /// leg 1 confirmed leaves the position in token B and is reported as
    /// `PartialFill`, never as a generic failure.
    pub async fn execute_round_trip(
        &self,
        opportunity: &Opportunity,
    ) -> Result<RoundTrip, BotError> {
        let wallet = self.wallet.as_ref().ok_or(BotError::NoWallet)?;
        let user_public_key = wallet.pubkey().to_string();

        info!(
            "[{}] executing round trip, estimated profit ${:.4}",
            opportunity.pair_name, opportunity.profit_usd_estimate
        );

        // Leg 1 (A -> B). Build failure means no funds have moved.
        let leg1_tx = self
            .quote_source
            .get_swap_transaction(&user_public_key, &opportunity.quote_a_to_b)
            .await?;

        let leg1_signature = self
            .broadcaster
            .sign_and_send(&leg1_tx, wallet, "leg 1 (A->B)")
            .await?;

        let leg1 = TradeResult::confirmed(leg1_signature, "leg 1 (A->B)");

        // From here on the position is in token B; any failure is a
        // partial fill and must not look like "nothing happened".
        sleep(self.settle_delay).await;

        let leg2_tx = match self
            .quote_source
            .get_swap_transaction(&user_public_key, &opportunity.quote_b_to_a)
            .await
        {
            Ok(tx) => tx,
            Err(e) => return Err(self.partial_fill(opportunity, &leg1, e)),
        };

        let leg2_signature = match self
            .broadcaster
            .sign_and_send(&leg2_tx, wallet, "leg 2 (B->A)")
            .await
        {
            Ok(signature) => signature,
            Err(e) => return Err(self.partial_fill(opportunity, &leg1, e)),
        };

        let leg2 = TradeResult::confirmed(leg2_signature, "leg 2 (B->A)");

        info!(
            "[{}] round trip complete: {} / {}",
            opportunity.pair_name, leg1_signature, leg2_signature
        );

        Ok(RoundTrip { leg1, leg2 })
    }

    fn partial_fill(
        &self,
        opportunity: &Opportunity,
        leg1: &TradeResult,
        cause: BotError,
    ) -> BotError {
        let signature = leg1
            .signature
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        warn!(
            "[{}] PARTIAL FILL: leg 1 confirmed ({}) but leg 2 failed; position held in token B. \
             Manual remediation required. Cause: {}",
            opportunity.pair_name, signature, cause
        );
        BotError::PartialFill {
            signature,
            reason: cause.to_string(),
        }
    }
}
