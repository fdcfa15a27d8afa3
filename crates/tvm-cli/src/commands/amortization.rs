use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use tvm_core::amortization::{self, AmortizationInput};
use tvm_core::Periodicity;

use super::{BasisArg, TargetArg};
use crate::input;

/// Arguments for a French amortization schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AmortizeArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal, or the amount to accumulate with `--target fv`
    #[arg(long)]
    pub value: Option<Decimal>,

    /// Whether `--value` is a present or a future value
    #[arg(long, value_enum, default_value = "pv")]
    pub target: TargetArg,

    /// Quoted rate (e.g. 0.24 for 24%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long, value_enum, default_value = "nominal")]
    pub rate_basis: BasisArg,

    /// Periodicity the rate is quoted at (defaults to the payment periodicity)
    #[arg(long)]
    pub rate_periodicity: Option<Periodicity>,

    #[arg(long, default_value = "monthly")]
    pub payment_periodicity: Periodicity,

    /// Number of payments
    #[arg(long, alias = "n")]
    pub periods: Option<Decimal>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amortization_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        AmortizationInput {
            value: args.value,
            target: args.target.into(),
            rate: args.rate,
            rate_basis: args.rate_basis.into(),
            rate_periodicity: args.rate_periodicity,
            payment_periodicity: args.payment_periodicity,
            period_count: args.periods,
        }
    };

    let result = amortization::amortize(&amortization_input)?;
    Ok(serde_json::to_value(result)?)
}
