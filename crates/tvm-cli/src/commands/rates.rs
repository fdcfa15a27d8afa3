use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tvm_core::periodicity::{self, Periodicity};

/// Arguments for converting an effective rate between periodicities
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ConvertRateArgs {
    /// Known rate per origin period (e.g. 0.24 for 24%)
    #[arg(long)]
    pub rate: Decimal,

    /// Periodicity the rate is known at (monthly, bimonthly, quarterly,
    /// four_monthly, semiannual, annual, or codes 1-6)
    #[arg(long)]
    pub from: Periodicity,

    /// Periodicity to convert to
    #[arg(long)]
    pub to: Periodicity,
}

/// Arguments for nominal to periodic rate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NominalRateArgs {
    /// Nominal annual rate (e.g. 0.12 for 12%)
    #[arg(long)]
    pub rate: Decimal,

    /// Compounding periodicity
    #[arg(long, default_value = "monthly")]
    pub periodicity: Periodicity,
}

/// Direction of an advance-rate conversion
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceDirection {
    /// Rate in arrears to rate in advance
    ToAdvance,
    /// Rate in advance to rate in arrears
    ToArrears,
}

/// Arguments for advance/arrears rate conversion
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AdvanceRateArgs {
    /// Rate to convert (e.g. 0.02 for 2%)
    #[arg(long)]
    pub rate: Decimal,

    #[arg(long, value_enum, default_value = "to-advance")]
    pub direction: AdvanceDirection,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConvertRateOutput {
    rate: Decimal,
    from: Periodicity,
    to: Periodicity,
    converted_rate: Decimal,
    effective_annual_rate: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct NominalRateOutput {
    nominal_annual_rate: Decimal,
    periodicity: Periodicity,
    periodic_rate: Decimal,
    effective_annual_rate: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct AdvanceRateOutput {
    rate: Decimal,
    direction: AdvanceDirection,
    converted_rate: Decimal,
}

pub fn run_convert_rate(args: ConvertRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let converted_rate = periodicity::convert_rate(args.rate, args.from, args.to)?;
    let effective_annual_rate = periodicity::effective_annual_rate(converted_rate, args.to)?;
    let output = ConvertRateOutput {
        rate: args.rate,
        from: args.from,
        to: args.to,
        converted_rate,
        effective_annual_rate,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_nominal_rate(args: NominalRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let periodic_rate = periodicity::nominal_to_periodic_rate(args.rate, args.periodicity)?;
    let effective_annual_rate = periodicity::effective_annual_rate(periodic_rate, args.periodicity)?;
    let output = NominalRateOutput {
        nominal_annual_rate: args.rate,
        periodicity: args.periodicity,
        periodic_rate,
        effective_annual_rate,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_advance_rate(args: AdvanceRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let converted_rate = match args.direction {
        AdvanceDirection::ToAdvance => periodicity::arrears_to_advance_rate(args.rate)?,
        AdvanceDirection::ToArrears => periodicity::advance_to_arrears_rate(args.rate)?,
    };
    let output = AdvanceRateOutput {
        rate: args.rate,
        direction: args.direction,
        converted_rate,
    };
    Ok(serde_json::to_value(output)?)
}
