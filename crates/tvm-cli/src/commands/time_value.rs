use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tvm_core::time_value;
use tvm_core::ValueTarget;

use super::TargetArg;

/// Arguments for moving a single amount through time
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LumpSumArgs {
    /// Known amount
    #[arg(long)]
    pub amount: Decimal,

    /// Whether the amount is a present value (compound it forward) or a
    /// future value (discount it back)
    #[arg(long, value_enum, default_value = "pv")]
    pub known: TargetArg,

    /// Effective rate per period
    #[arg(long)]
    pub rate: Decimal,

    /// Number of periods
    #[arg(long, alias = "n")]
    pub periods: Decimal,
}

/// Arguments for the number of payments
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NperArgs {
    /// Effective rate per period
    #[arg(long)]
    pub rate: Decimal,

    /// Level payment per period
    #[arg(long)]
    pub payment: Decimal,

    /// Amount to repay
    #[arg(long, alias = "pv")]
    pub present_value: Decimal,
}

/// Arguments for the implied periodic rate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RateArgs {
    #[arg(long, alias = "pv")]
    pub present_value: Decimal,

    #[arg(long, alias = "fv")]
    pub future_value: Decimal,

    /// Number of periods
    #[arg(long, alias = "n")]
    pub periods: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct LumpSumOutput {
    known: ValueTarget,
    amount: Decimal,
    rate: Decimal,
    periods: u32,
    value: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct NperOutput {
    periods: Decimal,
    whole_periods: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct RateOutput {
    rate: Decimal,
}

pub fn run_lump_sum(args: LumpSumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let periods = time_value::period_count(args.periods)?;
    let known: ValueTarget = args.known.into();
    let value = match known {
        ValueTarget::PresentValue => time_value::lump_sum_future_value(args.amount, args.rate, periods)?,
        ValueTarget::FutureValue => time_value::lump_sum_present_value(args.amount, args.rate, periods)?,
    };
    let output = LumpSumOutput {
        known,
        amount: args.amount,
        rate: args.rate,
        periods,
        value,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_nper(args: NperArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let periods = time_value::number_of_periods(args.rate, args.payment, args.present_value)?;
    let output = NperOutput {
        periods,
        whole_periods: periods.ceil(),
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_rate(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let periods = time_value::period_count(args.periods)?;
    let rate = time_value::periodic_rate(args.present_value, args.future_value, periods)?;
    Ok(serde_json::to_value(RateOutput { rate })?)
}
