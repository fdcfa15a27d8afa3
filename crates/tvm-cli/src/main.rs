mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortization::AmortizeArgs;
use commands::annuity::{AnnuityPaymentArgs, AnnuityValueArgs};
use commands::rates::{AdvanceRateArgs, ConvertRateArgs, NominalRateArgs};
use commands::time_value::{LumpSumArgs, NperArgs, RateArgs};

/// Time value of money, annuity and amortization calculations
#[derive(Parser)]
#[command(
    name = "tvm",
    version,
    about = "Time value of money, annuity and amortization calculations",
    long_about = "A CLI for time-value-of-money calculations with decimal precision. \
                  Supports rate conversion between periodicities, nominal and advance \
                  rates, annuity present/future values and payments, lump sums, and \
                  French amortization schedules."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an effective rate between periodicities
    ConvertRate(ConvertRateArgs),
    /// Periodic rate from a nominal annual rate
    NominalRate(NominalRateArgs),
    /// Convert between rates charged in arrears and in advance
    AdvanceRate(AdvanceRateArgs),
    /// Present value of a level payment stream
    Pv(AnnuityValueArgs),
    /// Future value of a level payment stream
    Fv(AnnuityValueArgs),
    /// Level payment for a target present or future value
    AnnuityPayment(AnnuityPaymentArgs),
    /// French amortization schedule
    Amortize(AmortizeArgs),
    /// Present or future value of a single amount
    LumpSum(LumpSumArgs),
    /// Number of payments needed to repay a present value
    Nper(NperArgs),
    /// Periodic rate that grows a present value into a future value
    Rate(RateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ConvertRate(args) => commands::rates::run_convert_rate(args),
        Commands::NominalRate(args) => commands::rates::run_nominal_rate(args),
        Commands::AdvanceRate(args) => commands::rates::run_advance_rate(args),
        Commands::Pv(args) => commands::annuity::run_present_value(args),
        Commands::Fv(args) => commands::annuity::run_future_value(args),
        Commands::AnnuityPayment(args) => commands::annuity::run_annuity_payment(args),
        Commands::Amortize(args) => commands::amortization::run_amortize(args),
        Commands::LumpSum(args) => commands::time_value::run_lump_sum(args),
        Commands::Nper(args) => commands::time_value::run_nper(args),
        Commands::Rate(args) => commands::time_value::run_rate(args),
        Commands::Version => {
            println!("tvm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
