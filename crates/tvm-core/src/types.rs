use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.015 = 1.5%). Never as percentages.
pub type Rate = Decimal;

/// When each level payment falls within its period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTiming {
    /// End of period (annuity in arrears, "vencida").
    #[default]
    #[serde(alias = "end", alias = "vencida", alias = "normal")]
    Ordinary,
    /// Beginning of period (annuity due, "anticipada").
    #[serde(alias = "begin", alias = "anticipada", alias = "anticipado")]
    Due,
}

impl PaymentTiming {
    pub fn is_due(&self) -> bool {
        matches!(self, PaymentTiming::Due)
    }
}

impl std::fmt::Display for PaymentTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentTiming::Ordinary => write!(f, "ordinary"),
            PaymentTiming::Due => write!(f, "due"),
        }
    }
}

/// Whether a known amount is the present or the future value of the payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTarget {
    #[default]
    #[serde(alias = "pv")]
    PresentValue,
    #[serde(alias = "fv")]
    FutureValue,
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
