pub mod amortization;
pub mod annuity;
pub mod rates;
pub mod time_value;

use clap::ValueEnum;
use tvm_core::{PaymentTiming, RateBasis, ValueTarget};

/// Payment timing flag
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TimingArg {
    /// End of period
    Ordinary,
    /// Beginning of period
    Due,
}

impl From<TimingArg> for PaymentTiming {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Ordinary => PaymentTiming::Ordinary,
            TimingArg::Due => PaymentTiming::Due,
        }
    }
}

/// Rate basis flag
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BasisArg {
    /// Annual rate divided evenly by the rate periodicity
    Nominal,
    /// Rate already effective over one rate period
    Effective,
}

impl From<BasisArg> for RateBasis {
    fn from(arg: BasisArg) -> Self {
        match arg {
            BasisArg::Nominal => RateBasis::Nominal,
            BasisArg::Effective => RateBasis::Effective,
        }
    }
}

/// Which value a known amount represents
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TargetArg {
    Pv,
    Fv,
}

impl From<TargetArg> for ValueTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Pv => ValueTarget::PresentValue,
            TargetArg::Fv => ValueTarget::FutureValue,
        }
    }
}
