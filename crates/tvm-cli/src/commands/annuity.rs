use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tvm_core::annuity::{self, AnnuityParameters, AnnuityStreamInput, AnnuityTerms};
use tvm_core::Periodicity;

use super::{BasisArg, TimingArg};
use crate::input;

/// Rate, horizon and timing flags shared by the annuity commands
#[derive(Args)]
pub struct TermsArgs {
    /// Quoted rate (e.g. 0.24 for 24%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Whether the rate is nominal annual or effective per rate period
    #[arg(long, value_enum, default_value = "nominal")]
    pub rate_basis: BasisArg,

    /// Periodicity the rate is quoted at (defaults to the payment periodicity)
    #[arg(long)]
    pub rate_periodicity: Option<Periodicity>,

    /// How often payments are made
    #[arg(long, default_value = "monthly")]
    pub payment_periodicity: Periodicity,

    /// Number of payments
    #[arg(long, alias = "n")]
    pub periods: Option<Decimal>,

    /// Payment timing within each period
    #[arg(long, value_enum, default_value = "ordinary")]
    pub timing: TimingArg,

    /// Periods without payment before the first one
    #[arg(long, default_value = "0")]
    pub deferred: u32,
}

impl From<&TermsArgs> for AnnuityTerms {
    fn from(args: &TermsArgs) -> Self {
        AnnuityTerms {
            rate: args.rate,
            rate_basis: args.rate_basis.into(),
            rate_periodicity: args.rate_periodicity,
            payment_periodicity: args.payment_periodicity,
            period_count: args.periods,
            payment_timing: args.timing.into(),
            deferred_periods: args.deferred,
        }
    }
}

/// Arguments for valuing a level payment stream
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnnuityValueArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Level payment per period
    #[arg(long)]
    pub payment: Option<Decimal>,

    #[command(flatten)]
    pub terms: TermsArgs,
}

/// Arguments for solving the level payment
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnnuityPaymentArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Target present value (loan amount)
    #[arg(long, alias = "pv")]
    pub present_value: Option<Decimal>,

    /// Target future value (savings goal)
    #[arg(long, alias = "fv")]
    pub future_value: Option<Decimal>,

    #[command(flatten)]
    pub terms: TermsArgs,
}

/// File first, then piped stdin, then the flag-built fallback.
fn resolve_input<T: DeserializeOwned>(
    path: Option<&str>,
    from_flags: impl FnOnce() -> T,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Ok(from_flags())
    }
}

fn stream_input(args: &AnnuityValueArgs) -> Result<AnnuityStreamInput, Box<dyn std::error::Error>> {
    resolve_input(args.input.as_deref(), || AnnuityStreamInput {
        payment: args.payment,
        terms: AnnuityTerms::from(&args.terms),
    })
}

pub fn run_present_value(args: AnnuityValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stream = stream_input(&args)?;
    let result = annuity::annuity_present_value(&stream)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_future_value(args: AnnuityValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stream = stream_input(&args)?;
    let result = annuity::annuity_future_value(&stream)?;
    Ok(serde_json::to_value(result)?)
}

/// Dispatches on whichever target value is present. When neither or both
/// are set the present-value solver reports the problem.
pub fn run_annuity_payment(args: AnnuityPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: AnnuityParameters = resolve_input(args.input.as_deref(), || AnnuityParameters {
        present_value: args.present_value,
        future_value: args.future_value,
        terms: AnnuityTerms::from(&args.terms),
    })?;

    let result = if params.present_value.is_none() && params.future_value.is_some() {
        serde_json::to_value(annuity::solve_future_value_annuity(&params)?)?
    } else {
        serde_json::to_value(annuity::solve_present_value_annuity(&params)?)?
    };
    Ok(result)
}
