// src/solana/rpc.rs
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use log::{debug, info, warn};
use solana_client::{
    nonblocking::rpc_client::RpcClient as NonBlockingRpcClient,
    rpc_config::RpcSendTransactionConfig,
};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    signature::{Keypair, Signature},
    transaction::VersionedTransaction,
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::error::{BotError, RetryPolicy};

const DEFAULT_COMMITMENT: CommitmentConfig = CommitmentConfig::confirmed();

/// Outcome of one signature status poll.
enum SignaturePoll {
    Pending,
    Confirmed,
    FailedOnChain(String),
}

/// Polls a submitted transaction until it confirms, fails on-chain, or
/// the deadline passes. The transaction is already in flight here, so a
/// failing poll call is transient: log it and keep polling. Only an
/// on-chain error is `SubmissionFailed`; everything else at the
/// deadline is `ConfirmationTimeout`.
async fn poll_until_confirmed<F, Fut>(
    mut poll: F,
    signature: &Signature,
    description: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), BotError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SignaturePoll, BotError>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        match poll().await {
            Ok(SignaturePoll::Confirmed) => return Ok(()),
            Ok(SignaturePoll::FailedOnChain(err)) => {
                return Err(BotError::SubmissionFailed(format!(
                    "{} failed on-chain: {}",
                    description, err
                )));
            }
            Ok(SignaturePoll::Pending) => {}
            Err(e) => {
                warn!("{} status poll failed, will retry: {}", description, e);
            }
        }

        if Instant::now() >= deadline {
            return Err(BotError::ConfirmationTimeout(format!(
                "{} ({}) not confirmed within {:?}",
                description, signature, timeout
            )));
        }

        sleep(poll_interval).await;
    }
}

/// Signs and submits aggregator-built transactions. Behind a trait so
/// the executor can be driven against a mock chain in tests.
#[async_trait]
pub trait TransactionBroadcaster: Send + Sync {
    /// Decode, sign, submit with preflight and bounded retries, then
    /// poll for confirmation up to a bounded wait.
    ///
    /// `SubmissionFailed` means the transaction never landed (or was
    /// rejected on-chain); `ConfirmationTimeout` means it went out but
    /// its status is unknown.
    async fn sign_and_send(
        &self,
        encoded_transaction: &str,
        wallet: &Keypair,
        description: &str,
    ) -> Result<Signature, BotError>;
}

pub struct RpcBroadcaster {
    client: Arc<NonBlockingRpcClient>,
    retry_policy: RetryPolicy,
    confirm_timeout: Duration,
    confirm_poll_interval: Duration,
}

impl RpcBroadcaster {
    pub fn new(
        rpc_url: &str,
        retry_policy: RetryPolicy,
        confirm_timeout: Duration,
        confirm_poll_interval: Duration,
    ) -> Self {
        let client = Arc::new(NonBlockingRpcClient::new_with_commitment(
            rpc_url.to_string(),
            DEFAULT_COMMITMENT,
        ));
        Self {
            client,
            retry_policy,
            confirm_timeout,
            confirm_poll_interval,
        }
    }

    /// Deserializes the base64 transaction template and signs it with
    /// the trading wallet.
    fn decode_and_sign(
        encoded_transaction: &str,
        wallet: &Keypair,
    ) -> Result<VersionedTransaction, BotError> {
        let transaction_bytes = general_purpose::STANDARD
            .decode(encoded_transaction)
            .map_err(|e| {
                BotError::SubmissionFailed(format!("failed to decode base64 transaction: {}", e))
            })?;

        let unsigned: VersionedTransaction =
            bincode::deserialize(&transaction_bytes).map_err(|e| {
                BotError::SubmissionFailed(format!("failed to deserialize transaction: {}", e))
            })?;

        VersionedTransaction::try_new(unsigned.message, &[wallet])
            .map_err(|e| BotError::SubmissionFailed(format!("failed to sign transaction: {}", e)))
    }

    async fn await_confirmation(
        &self,
        signature: &Signature,
        description: &str,
    ) -> Result<(), BotError> {
        let client = Arc::clone(&self.client);

        poll_until_confirmed(
            || {
                let client = Arc::clone(&client);
                async move {
                    let statuses = client
                        .get_signature_statuses(&[*signature])
                        .await
                        .map_err(|e| BotError::RpcError(format!("status poll failed: {}", e)))?;

                    Ok(match statuses.value.first() {
                        Some(Some(status)) => {
                            if let Some(err) = &status.err {
                                SignaturePoll::FailedOnChain(format!("{:?}", err))
                            } else if status.satisfies_commitment(DEFAULT_COMMITMENT) {
                                SignaturePoll::Confirmed
                            } else {
                                SignaturePoll::Pending
                            }
                        }
                        _ => SignaturePoll::Pending,
                    })
                }
            },
            signature,
            description,
            self.confirm_timeout,
            self.confirm_poll_interval,
        )
        .await
    }
}

#[async_trait]
impl TransactionBroadcaster for RpcBroadcaster {
    async fn sign_and_send(
        &self,
        encoded_transaction: &str,
        wallet: &Keypair,
        description: &str,
    ) -> Result<Signature, BotError> {
        let transaction = Self::decode_and_sign(encoded_transaction, wallet)?;

        let send_config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(CommitmentLevel::Confirmed),
            max_retries: Some(2),
            ..Default::default()
        };

        debug!("Submitting {}...", description);
        let client = Arc::clone(&self.client);
        let signature = self
            .retry_policy
            .execute(|| {
                let client = Arc::clone(&client);
                let transaction = transaction.clone();
                let send_config = send_config.clone();
                async move {
                    client
                        .send_transaction_with_config(&transaction, send_config)
                        .await
                }
            })
            .await
            .map_err(|e| BotError::SubmissionFailed(format!("{}: {}", description, e)))?;

        info!("{} submitted: {}", description, signature);

        match self.await_confirmation(&signature, description).await {
            Ok(()) => {
                info!("{} confirmed: {}", description, signature);
                Ok(signature)
            }
            Err(e) => {
                warn!("{} did not confirm: {}", description, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcaster() -> RpcBroadcaster {
        RpcBroadcaster::new(
            "http://127.0.0.1:8899",
            RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(2)),
            Duration::from_millis(10),
            Duration::from_millis(1),
        )
    }

    #[tokio::test]
    async fn test_invalid_base64_never_goes_out() {
        let result = broadcaster()
            .sign_and_send("not-base64!!", &Keypair::new(), "leg 1")
            .await;
        assert!(matches!(result, Err(BotError::SubmissionFailed(_))));
    }

    #[tokio::test]
    async fn test_undeserializable_transaction_never_goes_out() {
        let garbage = general_purpose::STANDARD.encode([0u8; 8]);
        let result = broadcaster()
            .sign_and_send(&garbage, &Keypair::new(), "leg 1")
            .await;
        assert!(matches!(result, Err(BotError::SubmissionFailed(_))));
    }

    #[tokio::test]
    async fn test_poll_errors_end_in_confirmation_timeout() {
        // The transaction is already out; RPC blips while polling must
        // not surface as anything other than a timeout.
        let sig = Signature::new_unique();
        let result = poll_until_confirmed(
            || async { Err(BotError::RpcError("connection reset".to_string())) },
            &sig,
            "leg 1",
            Duration::from_millis(5),
            Duration::from_millis(1),
        )
        .await;
        assert!(matches!(result, Err(BotError::ConfirmationTimeout(_))));
    }

    #[tokio::test]
    async fn test_polling_survives_transient_error() {
        let sig = Signature::new_unique();
        let mut calls = 0;
        let result = poll_until_confirmed(
            || {
                calls += 1;
                let attempt = calls;
                async move {
                    match attempt {
                        1 => Err(BotError::RpcError("HTTP 503".to_string())),
                        2 => Ok(SignaturePoll::Pending),
                        _ => Ok(SignaturePoll::Confirmed),
                    }
                }
            },
            &sig,
            "leg 2",
            Duration::from_secs(5),
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_on_chain_failure_is_submission_failed() {
        let sig = Signature::new_unique();
        let result = poll_until_confirmed(
            || async { Ok(SignaturePoll::FailedOnChain("InstructionError".to_string())) },
            &sig,
            "leg 1",
            Duration::from_secs(5),
            Duration::from_millis(1),
        )
        .await;
        assert!(matches!(result, Err(BotError::SubmissionFailed(_))));
    }
}
