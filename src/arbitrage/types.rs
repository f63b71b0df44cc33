use solana_sdk::signature::Signature;

use crate::jupiter::QuoteResponse;

/// Derived, ephemeral record of a profitable round trip. Lives for one
/// scan cycle; the embedded quotes expire quickly and are not
/// re-validated before execution.
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub pair_name: String,
    /// Profit in token-A smallest units (can only be positive here; the
    /// scanner filters losses out).
    pub profit_token_a_units: i64,
    /// Profit in token-A UI units.
    pub profit_token_a_ui: f64,
    pub profit_usd_estimate: f64,
    pub quote_a_to_b: QuoteResponse,
    pub quote_b_to_a: QuoteResponse,
}

/// Outcome of one signed-and-submitted transaction.
#[derive(Debug, Clone)]
pub struct TradeResult {
    pub success: bool,
    pub signature: Option<Signature>,
    pub description: String,
}

impl TradeResult {
    pub fn confirmed(signature: Signature, description: impl Into<String>) -> Self {
        Self {
            success: true,
            signature: Some(signature),
            description: description.into(),
        }
    }
}

/// A fully confirmed two-leg round trip.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub leg1: TradeResult,
    pub leg2: TradeResult,
}

#[cfg(test)]
pub mod test_fixtures {
    use super::*;

    pub fn quote_fixture(
        input_mint: &str,
        in_amount: u64,
        output_mint: &str,
        out_amount: u64,
    ) -> QuoteResponse {
        serde_json::from_value(serde_json::json!({
            "inputMint": input_mint,
            "inAmount": in_amount.to_string(),
            "outputMint": output_mint,
            "outAmount": out_amount.to_string(),
            "otherAmountThreshold": out_amount.to_string(),
            "slippageBps": 50,
            "routePlan": [],
        }))
        .expect("fixture quote is valid")
    }

    pub fn opportunity_fixture() -> Opportunity {
        Opportunity {
            pair_name: "SOL/USDC".to_string(),
            profit_token_a_units: 500_000,
            profit_token_a_ui: 0.0005,
            profit_usd_estimate: 0.065,
            quote_a_to_b: quote_fixture("solMint", 100_000_000, "usdcMint", 13_000_000),
            quote_b_to_a: quote_fixture("usdcMint", 13_000_000, "solMint", 100_500_000),
        }
    }
}
