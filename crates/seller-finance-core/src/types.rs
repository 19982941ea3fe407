use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::SellerFinanceResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Ratios expressed as decimals (0.07 = 7%).
pub type Rate = Decimal;

/// Percentages as entered on a term sheet (5 = 5%). Convert with [`percent_to_rate`].
pub type Percent = Decimal;

/// Convert a whole-number percentage into a decimal ratio.
pub fn percent_to_rate(pct: Percent) -> Rate {
    pct / Decimal::ONE_HUNDRED
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Parse a JSON request body into an input struct.
pub fn from_json<T: DeserializeOwned>(json: &str) -> SellerFinanceResult<T> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize an output envelope to a JSON string.
pub fn to_json<T: Serialize>(value: &T) -> SellerFinanceResult<String> {
    Ok(serde_json::to_string(value)?)
}
