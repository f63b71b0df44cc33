//! Jupiter API V6 Data Structures
//!
//! Request and response structures for the Jupiter V6 /quote and /swap
//! endpoints. Quote responses carry unknown routing fields through a
//! flattened map so they can be returned to /swap byte-for-byte in meaning.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::BotError;

/// Request structure for Jupiter V6 /quote endpoint
#[derive(Debug, Clone, Serialize)]
pub struct QuoteRequest {
    /// Input token mint address
    #[serde(rename = "inputMint")]
    pub input_mint: String,

    /// Output token mint address
    #[serde(rename = "outputMint")]
    pub output_mint: String,

    /// Amount of input token (in smallest unit)
    pub amount: u64,

    /// Slippage tolerance in basis points (e.g., 100 = 1%)
    #[serde(rename = "slippageBps")]
    pub slippage_bps: u16,

    /// Only use direct routes; false considers all routes
    #[serde(rename = "onlyDirectRoutes")]
    pub only_direct_routes: bool,
}

/// Response structure for Jupiter V6 /quote endpoint.
///
/// Only the fields the bot inspects are typed; everything else Jupiter
/// sends (route plan internals, context slot, price impact, ...) is kept
/// in `extra` and serialized back unchanged when building the swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    /// Input token mint
    #[serde(rename = "inputMint")]
    pub input_mint: String,

    /// Input amount
    #[serde(rename = "inAmount")]
    pub in_amount: String,

    /// Output token mint
    #[serde(rename = "outputMint")]
    pub output_mint: String,

    /// Output amount (estimated), string-encoded integer
    #[serde(rename = "outAmount")]
    pub out_amount: String,

    /// Opaque routing data, passed through unmodified
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl QuoteResponse {
    /// The quoted output amount in smallest units.
    pub fn out_amount_units(&self) -> Result<u64, BotError> {
        self.out_amount.parse::<u64>().map_err(|e| {
            BotError::QuoteUnavailable(format!(
                "unparseable outAmount '{}': {}",
                self.out_amount, e
            ))
        })
    }
}

/// Request structure for Jupiter V6 /swap endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SwapRequest {
    /// User's public key
    #[serde(rename = "userPublicKey")]
    pub user_public_key: String,

    /// Quote response from /quote endpoint
    #[serde(rename = "quoteResponse")]
    pub quote_response: QuoteResponse,

    /// Wrap and unwrap SOL automatically
    #[serde(rename = "wrapAndUnwrapSol")]
    pub wrap_and_unwrap_sol: bool,

    /// Priority fee selection; "auto" lets Jupiter pick
    #[serde(rename = "computeUnitPriceMicroLamports")]
    pub compute_unit_price_micro_lamports: String,
}

/// Response structure for Jupiter V6 /swap endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SwapResponse {
    /// Base64 encoded transaction template
    #[serde(rename = "swapTransaction")]
    pub swap_transaction: String,

    /// Last valid block height
    #[serde(rename = "lastValidBlockHeight")]
    pub last_valid_block_height: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE_JSON: &str = r#"{
        "inputMint": "So11111111111111111111111111111111111111112",
        "inAmount": "100000000",
        "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        "outAmount": "13000000",
        "otherAmountThreshold": "12870000",
        "slippageBps": 50,
        "priceImpactPct": "0.01",
        "routePlan": [{"swapInfo": {"ammKey": "abc", "label": "Orca"}, "percent": 100}],
        "contextSlot": 12345
    }"#;

    #[test]
    fn test_quote_parses_out_amount() {
        let quote: QuoteResponse = serde_json::from_str(QUOTE_JSON).unwrap();
        assert_eq!(quote.out_amount_units().unwrap(), 13_000_000);
    }

    #[test]
    fn test_quote_round_trips_opaque_fields() {
        let quote: QuoteResponse = serde_json::from_str(QUOTE_JSON).unwrap();
        // Routing data the bot never interprets must survive re-serialization.
        assert!(quote.extra.contains_key("routePlan"));
        assert!(quote.extra.contains_key("contextSlot"));

        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["routePlan"][0]["swapInfo"]["ammKey"], "abc");
        assert_eq!(value["otherAmountThreshold"], "12870000");
        assert_eq!(value["outAmount"], "13000000");
    }

    #[test]
    fn test_quote_missing_out_amount_is_error() {
        let json = r#"{"inputMint": "a", "inAmount": "1", "outputMint": "b"}"#;
        assert!(serde_json::from_str::<QuoteResponse>(json).is_err());
    }

    #[test]
    fn test_unparseable_out_amount_is_error() {
        let json = r#"{"inputMint":"a","inAmount":"1","outputMint":"b","outAmount":"n/a"}"#;
        let quote: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            quote.out_amount_units(),
            Err(BotError::QuoteUnavailable(_))
        ));
    }

    #[test]
    fn test_swap_request_wire_format() {
        let quote: QuoteResponse = serde_json::from_str(QUOTE_JSON).unwrap();
        let request = SwapRequest {
            user_public_key: "7xKX…user".to_string(),
            quote_response: quote,
            wrap_and_unwrap_sol: true,
            compute_unit_price_micro_lamports: "auto".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["wrapAndUnwrapSol"], true);
        assert_eq!(value["computeUnitPriceMicroLamports"], "auto");
        assert_eq!(value["quoteResponse"]["outAmount"], "13000000");
    }
}
