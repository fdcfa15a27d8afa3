//! Annuity calculator: level payment for a target present or future value,
//! and the present or future value of a given payment stream.
//!
//! Inputs arrive as entered by the user. Every field is optional so that a
//! missing value and a zero are told apart, although both are rejected as
//! incomplete for the rate, the period count and monetary amounts. The
//! quoted rate is normalized to the payment periodicity (nominal division,
//! then effective conversion) before any annuity relation is applied.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TvmError;
use crate::periodicity::{self, checked_product, checked_quotient, Periodicity, QuotedRate, RateBasis};
use crate::time_value::{self, required};
use crate::types::{with_metadata, ComputationOutput, Money, PaymentTiming, Rate};
use crate::TvmResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Rate, horizon and timing terms shared by every annuity calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnuityTerms {
    /// Quoted rate as a decimal fraction (0.24 = 24%).
    #[serde(default)]
    pub rate: Option<Rate>,
    /// Whether `rate` is nominal annual or effective per `rate_periodicity`.
    #[serde(default)]
    pub rate_basis: RateBasis,
    /// Periodicity the rate is quoted at. Defaults to the payment periodicity.
    #[serde(default)]
    pub rate_periodicity: Option<Periodicity>,
    /// How often payments are made.
    #[serde(default)]
    pub payment_periodicity: Periodicity,
    /// Number of payments.
    #[serde(default)]
    pub period_count: Option<Decimal>,
    #[serde(default)]
    pub payment_timing: PaymentTiming,
    /// Periods without payment before the first one.
    #[serde(default)]
    pub deferred_periods: u32,
}

/// Parameters for solving the level payment.
///
/// Exactly one of `present_value` / `future_value` is the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnuityParameters {
    #[serde(default)]
    pub present_value: Option<Money>,
    #[serde(default)]
    pub future_value: Option<Money>,
    #[serde(flatten)]
    pub terms: AnnuityTerms,
}

/// Parameters for valuing a known level payment stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnuityStreamInput {
    #[serde(default)]
    pub payment: Option<Money>,
    #[serde(flatten)]
    pub terms: AnnuityTerms,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Level payment solved from a present or future value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityPaymentOutput {
    pub payment: Money,
    /// Rate per payment period after normalization.
    pub periodic_rate: Rate,
    pub effective_annual_rate: Rate,
    pub period_count: u32,
    pub total_paid: Money,
    /// Interest component of the stream: paid minus PV, or FV minus paid.
    pub total_interest: Money,
}

/// Present or future value of a payment stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityValueOutput {
    pub value: Money,
    pub periodic_rate: Rate,
    pub effective_annual_rate: Rate,
    pub period_count: u32,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// Rate and horizon after validation and normalization.
struct ResolvedTerms {
    periodic_rate: Rate,
    effective_annual_rate: Rate,
    periods: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Level payment that amortizes a target present value.
///
/// Due annuities with a deferral have their annuity factor discounted over
/// the deferral; ordinary annuities ignore it.
pub fn solve_present_value_annuity(
    params: &AnnuityParameters,
) -> TvmResult<ComputationOutput<AnnuityPaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if params.future_value.is_some() {
        return Err(TvmError::InvalidInput {
            field: "future_value".into(),
            reason: "A present-value annuity takes a present value target only".into(),
        });
    }
    let present_value = required(params.present_value, "present_value")?;
    let terms = resolve_terms(&params.terms)?;
    deferral_warnings(&params.terms, true, &mut warnings);

    let factor = present_value_factor_with_deferral(&params.terms, &terms)?;
    let payment = checked_quotient(present_value, factor, "present value annuity factor")?;
    let total_paid = sum_of_payments(payment, terms.periods)?;

    tracing::debug!(
        %present_value,
        %payment,
        periodic_rate = %terms.periodic_rate,
        periods = terms.periods,
        "present value annuity solved"
    );

    let output = AnnuityPaymentOutput {
        payment,
        periodic_rate: terms.periodic_rate,
        effective_annual_rate: terms.effective_annual_rate,
        period_count: terms.periods,
        total_paid,
        total_interest: total_paid - present_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &methodology("Level payment from present value", &params.terms),
        params,
        warnings,
        elapsed,
        output,
    ))
}

/// Level payment that accumulates to a target future value.
pub fn solve_future_value_annuity(
    params: &AnnuityParameters,
) -> TvmResult<ComputationOutput<AnnuityPaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if params.present_value.is_some() {
        return Err(TvmError::InvalidInput {
            field: "present_value".into(),
            reason: "A future-value annuity takes a future value target only".into(),
        });
    }
    let future_value = required(params.future_value, "future_value")?;
    let terms = resolve_terms(&params.terms)?;
    deferral_warnings(&params.terms, false, &mut warnings);

    let factor = time_value::future_value_factor(
        terms.periodic_rate,
        terms.periods,
        params.terms.payment_timing,
    )?;
    let payment = checked_quotient(future_value, factor, "future value annuity factor")?;
    let total_paid = sum_of_payments(payment, terms.periods)?;

    tracing::debug!(
        %future_value,
        %payment,
        periodic_rate = %terms.periodic_rate,
        periods = terms.periods,
        "future value annuity solved"
    );

    let output = AnnuityPaymentOutput {
        payment,
        periodic_rate: terms.periodic_rate,
        effective_annual_rate: terms.effective_annual_rate,
        period_count: terms.periods,
        total_paid,
        total_interest: future_value - total_paid,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &methodology("Level payment from future value", &params.terms),
        params,
        warnings,
        elapsed,
        output,
    ))
}

/// Present value of a level payment stream.
pub fn annuity_present_value(
    input: &AnnuityStreamInput,
) -> TvmResult<ComputationOutput<AnnuityValueOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let payment = required(input.payment, "payment")?;
    let terms = resolve_terms(&input.terms)?;
    deferral_warnings(&input.terms, true, &mut warnings);

    let factor = present_value_factor_with_deferral(&input.terms, &terms)?;
    let value = checked_product(payment, factor, "present value of payments")?;
    let total_paid = sum_of_payments(payment, terms.periods)?;

    let output = AnnuityValueOutput {
        value,
        periodic_rate: terms.periodic_rate,
        effective_annual_rate: terms.effective_annual_rate,
        period_count: terms.periods,
        total_paid,
        total_interest: total_paid - value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &methodology("Present value of level payments", &input.terms),
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Future value of a level payment stream.
pub fn annuity_future_value(
    input: &AnnuityStreamInput,
) -> TvmResult<ComputationOutput<AnnuityValueOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let payment = required(input.payment, "payment")?;
    let terms = resolve_terms(&input.terms)?;
    deferral_warnings(&input.terms, false, &mut warnings);

    let value = time_value::future_value(
        terms.periodic_rate,
        terms.periods,
        payment,
        input.terms.payment_timing,
    )?;
    let total_paid = sum_of_payments(payment, terms.periods)?;

    let output = AnnuityValueOutput {
        value,
        periodic_rate: terms.periodic_rate,
        effective_annual_rate: terms.effective_annual_rate,
        period_count: terms.periods,
        total_paid,
        total_interest: value - total_paid,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &methodology("Future value of level payments", &input.terms),
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn resolve_terms(terms: &AnnuityTerms) -> TvmResult<ResolvedTerms> {
    let rate = required(terms.rate, "rate")?;
    let periods = time_value::period_count(required(terms.period_count, "period_count")?)?;

    let quoted = QuotedRate {
        rate,
        basis: terms.rate_basis,
        periodicity: terms.rate_periodicity.unwrap_or(terms.payment_periodicity),
    };
    let periodic_rate = periodicity::normalize_rate(&quoted, terms.payment_periodicity)?;
    let effective_annual_rate =
        periodicity::effective_annual_rate(periodic_rate, terms.payment_periodicity)?;

    Ok(ResolvedTerms {
        periodic_rate,
        effective_annual_rate,
        periods,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn present_value_factor_with_deferral(
    terms: &AnnuityTerms,
    resolved: &ResolvedTerms,
) -> TvmResult<Decimal> {
    let base = time_value::present_value_factor(
        resolved.periodic_rate,
        resolved.periods,
        terms.payment_timing,
    )?;
    time_value::deferred_adjustment(
        base,
        resolved.periodic_rate,
        terms.deferred_periods,
        terms.payment_timing,
    )
}

fn sum_of_payments(payment: Money, periods: u32) -> TvmResult<Money> {
    checked_product(payment, Decimal::from(periods), "total paid")
}

fn deferral_warnings(terms: &AnnuityTerms, present_value_side: bool, warnings: &mut Vec<String>) {
    if terms.deferred_periods == 0 {
        return;
    }
    if !present_value_side {
        warnings.push(format!(
            "Deferral of {} periods does not change a future value and was ignored",
            terms.deferred_periods
        ));
    } else if !terms.payment_timing.is_due() {
        warnings.push(format!(
            "Deferral of {} periods is only applied to annuities due; ordinary annuity left undeferred",
            terms.deferred_periods
        ));
    }
}

fn methodology(label: &str, terms: &AnnuityTerms) -> String {
    let deferral = if terms.payment_timing.is_due() && terms.deferred_periods > 0 {
        format!(", deferred {} periods", terms.deferred_periods)
    } else {
        String::new()
    };
    format!(
        "{label} ({} annuity, {} payments{deferral})",
        terms.payment_timing, terms.payment_periodicity
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn monthly_terms() -> AnnuityTerms {
        AnnuityTerms {
            rate: Some(dec!(0.12)),
            rate_basis: RateBasis::Nominal,
            rate_periodicity: None,
            payment_periodicity: Periodicity::Monthly,
            period_count: Some(dec!(12)),
            payment_timing: PaymentTiming::Ordinary,
            deferred_periods: 0,
        }
    }

    #[test]
    fn test_pv_annuity_payment_nominal_monthly() {
        let params = AnnuityParameters {
            present_value: Some(dec!(100000)),
            future_value: None,
            terms: monthly_terms(),
        };
        let out = solve_present_value_annuity(&params).unwrap();
        assert_eq!(out.result.periodic_rate, dec!(0.01));
        // 100000 * 0.01 / (1 - 1.01^-12) = 8884.88
        assert!((out.result.payment - dec!(8884.88)).abs() < dec!(0.01));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_fv_annuity_payment() {
        let params = AnnuityParameters {
            present_value: None,
            future_value: Some(dec!(315.25)),
            terms: AnnuityTerms {
                rate: Some(dec!(0.05)),
                rate_basis: RateBasis::Effective,
                rate_periodicity: Some(Periodicity::Annual),
                payment_periodicity: Periodicity::Annual,
                period_count: Some(dec!(3)),
                ..Default::default()
            },
        };
        let out = solve_future_value_annuity(&params).unwrap();
        assert!((out.result.payment - dec!(100)).abs() < dec!(0.0000001));
        assert!((out.result.total_interest - dec!(15.25)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_due_payment_is_smaller_than_ordinary() {
        let ordinary = AnnuityParameters {
            present_value: Some(dec!(100000)),
            future_value: None,
            terms: monthly_terms(),
        };
        let mut due = ordinary.clone();
        due.terms.payment_timing = PaymentTiming::Due;

        let p_ord = solve_present_value_annuity(&ordinary).unwrap().result.payment;
        let p_due = solve_present_value_annuity(&due).unwrap().result.payment;
        assert!((p_due * dec!(1.01) - p_ord).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_deferred_due_annuity_payment_grows() {
        let mut params = AnnuityParameters {
            present_value: Some(dec!(100000)),
            future_value: None,
            terms: monthly_terms(),
        };
        params.terms.payment_timing = PaymentTiming::Due;
        let undeferred = solve_present_value_annuity(&params).unwrap().result.payment;

        params.terms.deferred_periods = 3;
        let deferred = solve_present_value_annuity(&params).unwrap().result.payment;
        assert!((deferred - undeferred * dec!(1.030301)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_deferred_ordinary_annuity_unchanged_with_warning() {
        let mut params = AnnuityParameters {
            present_value: Some(dec!(100000)),
            future_value: None,
            terms: monthly_terms(),
        };
        let plain = solve_present_value_annuity(&params).unwrap().result.payment;
        params.terms.deferred_periods = 3;
        let out = solve_present_value_annuity(&params).unwrap();
        assert_eq!(out.result.payment, plain);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_zero_rate_is_incomplete() {
        let mut params = AnnuityParameters {
            present_value: Some(dec!(100000)),
            future_value: None,
            terms: monthly_terms(),
        };
        params.terms.rate = Some(Decimal::ZERO);
        let err = solve_present_value_annuity(&params).unwrap_err();
        match err {
            TvmError::IncompleteInput { field, reason } => {
                assert_eq!(field, "rate");
                assert!(reason.contains("Zero"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_period_count_is_incomplete() {
        let mut params = AnnuityParameters {
            present_value: Some(dec!(100000)),
            future_value: None,
            terms: monthly_terms(),
        };
        params.terms.period_count = None;
        let err = solve_present_value_annuity(&params).unwrap_err();
        match err {
            TvmError::IncompleteInput { field, reason } => {
                assert_eq!(field, "period_count");
                assert!(reason.contains("missing"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_zero_target_is_incomplete() {
        let params = AnnuityParameters {
            present_value: Some(Decimal::ZERO),
            future_value: None,
            terms: monthly_terms(),
        };
        assert!(matches!(
            solve_present_value_annuity(&params).unwrap_err(),
            TvmError::IncompleteInput { .. }
        ));
    }

    #[test]
    fn test_future_value_target_zero_or_missing_is_incomplete() {
        let mut params = AnnuityParameters {
            present_value: None,
            future_value: Some(Decimal::ZERO),
            terms: monthly_terms(),
        };
        match solve_future_value_annuity(&params).unwrap_err() {
            TvmError::IncompleteInput { field, reason } => {
                assert_eq!(field, "future_value");
                assert!(reason.contains("Zero"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        params.future_value = None;
        match solve_future_value_annuity(&params).unwrap_err() {
            TvmError::IncompleteInput { field, reason } => {
                assert_eq!(field, "future_value");
                assert!(reason.contains("missing"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_future_value_solve_ignores_deferral_with_warning() {
        let mut terms = monthly_terms();
        terms.payment_timing = PaymentTiming::Due;
        let undeferred = AnnuityParameters {
            present_value: None,
            future_value: Some(dec!(50000)),
            terms: terms.clone(),
        };
        terms.deferred_periods = 3;
        let deferred = AnnuityParameters {
            terms,
            ..undeferred.clone()
        };

        let base = solve_future_value_annuity(&undeferred).unwrap();
        let out = solve_future_value_annuity(&deferred).unwrap();
        assert_eq!(out.result.payment, base.result.payment);
        assert!(base.warnings.is_empty());
        assert!(out.warnings.iter().any(|w| w.contains("was ignored")));
    }

    #[test]
    fn test_stream_value_overflow_is_an_error() {
        let input = AnnuityStreamInput {
            payment: Some(dec!(1000000)),
            terms: AnnuityTerms {
                rate: Some(dec!(1.0)),
                rate_basis: RateBasis::Effective,
                rate_periodicity: None,
                payment_periodicity: Periodicity::Annual,
                period_count: Some(dec!(90)),
                ..Default::default()
            },
        };
        assert!(matches!(
            annuity_future_value(&input).unwrap_err(),
            TvmError::ArithmeticOverflow { .. }
        ));
    }

    #[test]
    fn test_both_targets_rejected() {
        let params = AnnuityParameters {
            present_value: Some(dec!(1000)),
            future_value: Some(dec!(2000)),
            terms: monthly_terms(),
        };
        assert!(matches!(
            solve_present_value_annuity(&params).unwrap_err(),
            TvmError::InvalidInput { .. }
        ));
        assert!(matches!(
            solve_future_value_annuity(&params).unwrap_err(),
            TvmError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_fractional_period_count_rejected() {
        let mut params = AnnuityParameters {
            present_value: Some(dec!(1000)),
            future_value: None,
            terms: monthly_terms(),
        };
        params.terms.period_count = Some(dec!(10.5));
        assert!(matches!(
            solve_present_value_annuity(&params).unwrap_err(),
            TvmError::InvalidPeriods { .. }
        ));
    }

    #[test]
    fn test_stream_values() {
        let input = AnnuityStreamInput {
            payment: Some(dec!(100000)),
            terms: AnnuityTerms {
                rate: Some(dec!(0.02)),
                rate_basis: RateBasis::Effective,
                rate_periodicity: None,
                payment_periodicity: Periodicity::Monthly,
                period_count: Some(dec!(10)),
                ..Default::default()
            },
        };
        let pv = annuity_present_value(&input).unwrap();
        assert!((pv.result.value - dec!(898258.50)).abs() < dec!(0.01));

        let fv = annuity_future_value(&input).unwrap();
        // 100000 * (1.02^10 - 1) / 0.02
        assert!((fv.result.value - dec!(1094972.10)).abs() < dec!(0.01));
    }
}
