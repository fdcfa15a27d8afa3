use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::MathematicalOps;

use crate::error::TvmError;
use crate::periodicity::{checked_pow, checked_product, checked_quotient, nth_root, validate_rate};
use crate::types::{Money, PaymentTiming, Rate};
use crate::TvmResult;

/// Present value annuity factor: `(1 - (1+i)^-n) / i`, times `(1+i)` when due.
/// Degenerates to `n` at a zero rate.
pub fn present_value_factor(rate: Rate, periods: u32, timing: PaymentTiming) -> TvmResult<Decimal> {
    validate_rate(rate)?;
    validate_periods(periods)?;

    if rate.is_zero() {
        return Ok(Decimal::from(periods));
    }

    let factor = checked_pow(Decimal::ONE + rate, periods, "present value factor")?;
    let discounted = discount(Decimal::ONE, factor, "present value factor")?;
    let annuity_factor = checked_quotient(Decimal::ONE - discounted, rate, "present value factor")?;
    apply_timing(annuity_factor, rate, timing)
}

/// Future value annuity factor: `((1+i)^n - 1) / i`, times `(1+i)` when due.
/// Degenerates to `n` at a zero rate.
pub fn future_value_factor(rate: Rate, periods: u32, timing: PaymentTiming) -> TvmResult<Decimal> {
    validate_rate(rate)?;
    validate_periods(periods)?;

    if rate.is_zero() {
        return Ok(Decimal::from(periods));
    }

    let factor = checked_pow(Decimal::ONE + rate, periods, "future value factor")?;
    let annuity_factor = checked_quotient(factor - Decimal::ONE, rate, "future value factor")?;
    apply_timing(annuity_factor, rate, timing)
}

/// Future Value of a level payment stream
pub fn future_value(
    rate: Rate,
    periods: u32,
    payment: Money,
    timing: PaymentTiming,
) -> TvmResult<Money> {
    checked_product(payment, future_value_factor(rate, periods, timing)?, "future value")
}

/// Present Value of a level payment stream
pub fn present_value(
    rate: Rate,
    periods: u32,
    payment: Money,
    timing: PaymentTiming,
) -> TvmResult<Money> {
    checked_product(payment, present_value_factor(rate, periods, timing)?, "present value")
}

/// Payment (PMT)
///
/// Level payment whose stream is worth `present_value` today, or accumulates
/// to `future_value` at the last period. Callers pass one target and zero
/// for the other. Positive targets give a positive payment.
pub fn payment(
    rate: Rate,
    periods: u32,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> TvmResult<Money> {
    validate_rate(rate)?;
    validate_periods(periods)?;

    if rate.is_zero() {
        return Ok((present_value + future_value) / Decimal::from(periods));
    }

    let discounted_fv = if future_value.is_zero() {
        Decimal::ZERO
    } else {
        lump_sum_present_value(future_value, rate, periods)?
    };

    let annuity_factor = present_value_factor(rate, periods, timing)?;
    let pmt = checked_quotient(present_value + discounted_fv, annuity_factor, "PMT annuity factor")?;
    tracing::debug!(%rate, periods, %timing, %pmt, "level payment computed");
    Ok(pmt)
}

/// Scale a present-value annuity factor for a deferral of `deferred_periods`.
///
/// Only due annuities are discounted, by `(1+rate)^-k`; ordinary factors and
/// zero deferrals come back unchanged.
pub fn deferred_adjustment(
    base_factor: Decimal,
    rate: Rate,
    deferred_periods: u32,
    timing: PaymentTiming,
) -> TvmResult<Decimal> {
    validate_rate(rate)?;

    if !timing.is_due() || deferred_periods == 0 {
        return Ok(base_factor);
    }

    let growth = checked_pow(Decimal::ONE + rate, deferred_periods, "deferral factor")?;
    discount(base_factor, growth, "deferral factor")
}

/// Future value of a single amount: `pv * (1+i)^n`.
pub fn lump_sum_future_value(present_value: Money, rate: Rate, periods: u32) -> TvmResult<Money> {
    validate_rate(rate)?;
    validate_periods(periods)?;
    let factor = checked_pow(Decimal::ONE + rate, periods, "lump sum future value")?;
    checked_product(present_value, factor, "lump sum future value")
}

/// Present value of a single amount: `fv * (1+i)^-n`.
pub fn lump_sum_present_value(future_value: Money, rate: Rate, periods: u32) -> TvmResult<Money> {
    validate_rate(rate)?;
    validate_periods(periods)?;
    let factor = checked_pow(Decimal::ONE + rate, periods, "lump sum present value")?;
    discount(future_value, factor, "lump sum present value")
}

/// Per-period rate that grows `present_value` into `future_value` over
/// `periods`: `(fv / pv)^(1/n) - 1`.
pub fn periodic_rate(present_value: Money, future_value: Money, periods: u32) -> TvmResult<Rate> {
    validate_periods(periods)?;
    if present_value <= Decimal::ZERO {
        return Err(TvmError::InvalidInput {
            field: "present_value".into(),
            reason: "Present value must be positive".into(),
        });
    }
    if future_value <= Decimal::ZERO {
        return Err(TvmError::InvalidInput {
            field: "future_value".into(),
            reason: "Future value must be positive".into(),
        });
    }

    let growth = checked_quotient(future_value, present_value, "implied rate")?;
    Ok(nth_root(growth, periods)? - Decimal::ONE)
}

/// Number of ordinary-annuity payments needed to repay `present_value`:
/// `-ln(1 - pv*i/pmt) / ln(1+i)`. May be fractional.
pub fn number_of_periods(rate: Rate, payment: Money, present_value: Money) -> TvmResult<Decimal> {
    validate_rate(rate)?;
    if payment <= Decimal::ZERO {
        return Err(TvmError::InvalidInput {
            field: "payment".into(),
            reason: "Payment must be positive".into(),
        });
    }
    if present_value <= Decimal::ZERO {
        return Err(TvmError::InvalidInput {
            field: "present_value".into(),
            reason: "Present value must be positive".into(),
        });
    }

    if rate.is_zero() {
        return checked_quotient(present_value, payment, "NPER");
    }

    let first_interest = checked_product(present_value, rate, "NPER")?;
    let remaining = Decimal::ONE - checked_quotient(first_interest, payment, "NPER")?;
    if remaining <= Decimal::ZERO {
        return Err(TvmError::FinancialImpossibility(format!(
            "Payment of {payment} does not cover the first period's interest of {first_interest}"
        )));
    }

    let numerator = remaining.checked_ln().ok_or_else(|| TvmError::InvalidInput {
        field: "payment".into(),
        reason: "Logarithm undefined for the given payment".into(),
    })?;
    let denominator = (Decimal::ONE + rate)
        .checked_ln()
        .ok_or_else(|| TvmError::InvalidRate {
            rate: rate.to_string(),
            reason: "Logarithm undefined for the given rate".into(),
        })?;
    if denominator.is_zero() {
        return Err(TvmError::DivisionByZero {
            context: "NPER log growth".into(),
        });
    }

    Ok(-numerator / denominator)
}

/// Validate a user-entered period count: a positive whole number that fits `u32`.
pub fn period_count(value: Decimal) -> TvmResult<u32> {
    let invalid = |reason: &str| TvmError::InvalidPeriods {
        periods: value.to_string(),
        reason: reason.into(),
    };
    if value <= Decimal::ZERO {
        return Err(invalid("Number of periods must be > 0"));
    }
    if !value.fract().is_zero() {
        return Err(invalid("Number of periods must be a whole number"));
    }
    value
        .to_u32()
        .ok_or_else(|| invalid("Number of periods is too large"))
}

/// Presence check for a user-entered field. Zero counts as not entered,
/// with a reason that tells the two cases apart.
pub fn required(value: Option<Decimal>, field: &str) -> TvmResult<Decimal> {
    match value {
        None => Err(TvmError::IncompleteInput {
            field: field.into(),
            reason: "Value is missing".into(),
        }),
        Some(v) if v.is_zero() => Err(TvmError::IncompleteInput {
            field: field.into(),
            reason: "Zero is not accepted; enter a non-zero value".into(),
        }),
        Some(v) => Ok(v),
    }
}

pub(crate) fn validate_periods(periods: u32) -> TvmResult<()> {
    if periods == 0 {
        return Err(TvmError::InvalidPeriods {
            periods: "0".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    Ok(())
}

fn apply_timing(factor: Decimal, rate: Rate, timing: PaymentTiming) -> TvmResult<Decimal> {
    match timing {
        PaymentTiming::Ordinary => Ok(factor),
        PaymentTiming::Due => checked_product(factor, Decimal::ONE + rate, "annuity due factor"),
    }
}

/// `value / growth`. Growth only reaches zero when a rate near -100%
/// underflows Decimal's scale, so the true quotient is out of range.
fn discount(value: Decimal, growth: Decimal, context: &str) -> TvmResult<Decimal> {
    if growth.is_zero() {
        return Err(TvmError::ArithmeticOverflow {
            context: format!("{context}: discount factor out of range"),
        });
    }
    checked_quotient(value, growth, context)
}
