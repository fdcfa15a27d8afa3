//! Time-value-of-money engine: rate conversion across periodicities,
//! closed-form annuity relations, annuity payment solving and French
//! (constant-payment) amortization schedules. All arithmetic is done in
//! `rust_decimal::Decimal`.

pub mod error;
pub mod periodicity;
pub mod time_value;
pub mod types;

#[cfg(feature = "annuity")]
pub mod annuity;

#[cfg(feature = "amortization")]
pub mod amortization;

pub use error::TvmError;
pub use periodicity::{Periodicity, QuotedRate, RateBasis};
pub use types::*;

/// Standard result type for all engine operations
pub type TvmResult<T> = Result<T, TvmError>;
