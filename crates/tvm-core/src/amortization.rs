//! French (constant-payment) amortization schedules.
//!
//! Rows are built strictly in period order. Each row is rounded to cents
//! and the rounded balance is what the next period accrues interest on, so
//! every row reconciles on its own; the final period settles whatever the
//! rounding left outstanding so the schedule always closes at 0.00.

use std::time::Instant;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TvmError;
use crate::periodicity::{self, checked_product, validate_rate, Periodicity, QuotedRate, RateBasis};
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, PaymentTiming, Rate, ValueTarget};
use crate::TvmResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Balances below this are floating drift and are cleared to zero.
const BALANCE_EPSILON: Decimal = dec!(0.00000001);

/// Display precision for every row figure.
const MONEY_DP: u32 = 2;

/// Longest schedule built row by row: a century of monthly payments.
pub const MAX_SCHEDULE_PERIODS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One period of the schedule. Period 0 is the opening state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    /// Outstanding balance after this period's payment.
    pub balance: Money,
    pub interest: Money,
    pub payment: Money,
    /// Portion of the payment that reduces the balance.
    pub principal: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Unrounded level payment.
    pub payment: Money,
    /// Balance at period 0: the principal, or the present equivalent of a
    /// future value target.
    pub opening_balance: Money,
    pub rows: Vec<AmortizationRow>,
}

impl AmortizationSchedule {
    pub fn final_balance(&self) -> Money {
        self.rows.last().map(|r| r.balance).unwrap_or(Decimal::ZERO)
    }

    pub fn total_payments(&self) -> TvmResult<Money> {
        self.column_total(|r| r.payment, "total payments")
    }

    pub fn total_interest(&self) -> TvmResult<Money> {
        self.column_total(|r| r.interest, "total interest")
    }

    pub fn total_principal(&self) -> TvmResult<Money> {
        self.column_total(|r| r.principal, "total principal")
    }

    fn column_total(
        &self,
        column: impl Fn(&AmortizationRow) -> Money,
        context: &str,
    ) -> TvmResult<Money> {
        self.rows.iter().try_fold(Decimal::ZERO, |acc, row| {
            acc.checked_add(column(row))
                .ok_or_else(|| TvmError::ArithmeticOverflow {
                    context: context.to_string(),
                })
        })
    }
}

/// User-level amortization request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmortizationInput {
    /// Loan principal, or the future value to reach when `target` is
    /// `future_value`.
    #[serde(default)]
    pub value: Option<Money>,
    #[serde(default)]
    pub target: ValueTarget,
    /// Quoted rate as a decimal fraction.
    #[serde(default)]
    pub rate: Option<Rate>,
    #[serde(default)]
    pub rate_basis: RateBasis,
    /// Defaults to the payment periodicity.
    #[serde(default)]
    pub rate_periodicity: Option<Periodicity>,
    #[serde(default)]
    pub payment_periodicity: Periodicity,
    #[serde(default)]
    pub period_count: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    /// Level payment rounded to cents.
    pub payment: Money,
    pub periodic_rate: Rate,
    pub effective_annual_rate: Rate,
    pub opening_balance: Money,
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub schedule: Vec<AmortizationRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build a fixed-payment schedule for `period_count` periods.
///
/// With a `FutureValue` target the opening balance is `principal`
/// discounted over the term; its level payment is the sinking-fund payment
/// for that future value.
pub fn build_schedule(
    principal: Money,
    periodic_rate: Rate,
    period_count: u32,
    target: ValueTarget,
) -> TvmResult<AmortizationSchedule> {
    validate_schedule_input(principal, periodic_rate, period_count)?;

    let (pv, fv) = match target {
        ValueTarget::PresentValue => (principal, Decimal::ZERO),
        ValueTarget::FutureValue => (Decimal::ZERO, principal),
    };
    let payment = time_value::payment(
        periodic_rate,
        period_count,
        pv,
        fv,
        PaymentTiming::Ordinary,
    )?
    .abs();

    let opening_balance = match target {
        ValueTarget::PresentValue => principal,
        ValueTarget::FutureValue => {
            time_value::lump_sum_present_value(principal, periodic_rate, period_count)?
        }
    };

    let mut rows = Vec::with_capacity(period_count as usize + 1);
    let mut balance = round_money(opening_balance);
    rows.push(AmortizationRow {
        period: 0,
        balance,
        interest: Decimal::ZERO,
        payment: Decimal::ZERO,
        principal: Decimal::ZERO,
    });

    for period in 1..=period_count {
        let interest = checked_product(balance, periodic_rate, "period interest")?;
        let mut principal_part = payment - interest;

        let settles = period == period_count || principal_part > balance;
        if settles {
            if (principal_part - balance).abs() > dec!(0.01) {
                tracing::warn!(
                    period,
                    scheduled = %principal_part,
                    outstanding = %balance,
                    "payment adjusted to settle outstanding balance"
                );
            }
            principal_part = balance;
        }
        let row_payment = if settles {
            interest
                .checked_add(principal_part)
                .ok_or_else(|| TvmError::ArithmeticOverflow {
                    context: "settling payment".into(),
                })?
        } else {
            payment
        };

        let mut next_balance = balance - principal_part;
        if next_balance < BALANCE_EPSILON {
            next_balance = Decimal::ZERO;
        }

        let row = AmortizationRow {
            period,
            balance: round_money(next_balance),
            interest: round_money(interest),
            payment: round_money(row_payment),
            principal: round_money(principal_part),
        };
        tracing::trace!(
            period,
            balance = %row.balance,
            interest = %row.interest,
            principal = %row.principal,
            "amortization row"
        );

        balance = row.balance;
        rows.push(row);
    }

    tracing::debug!(
        %principal,
        %periodic_rate,
        period_count,
        %payment,
        "amortization schedule built"
    );

    Ok(AmortizationSchedule {
        payment,
        opening_balance,
        rows,
    })
}

/// Normalize the quoted rate, validate the request and build its schedule.
pub fn amortize(input: &AmortizationInput) -> TvmResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let value = input.value.ok_or_else(|| TvmError::IncompleteInput {
        field: "value".into(),
        reason: "Value is missing".into(),
    })?;
    let rate = input.rate.ok_or_else(|| TvmError::IncompleteInput {
        field: "rate".into(),
        reason: "Value is missing".into(),
    })?;
    let periods = input
        .period_count
        .ok_or_else(|| TvmError::IncompleteInput {
            field: "period_count".into(),
            reason: "Value is missing".into(),
        })
        .and_then(time_value::period_count)?;

    let quoted = QuotedRate {
        rate,
        basis: input.rate_basis,
        periodicity: input.rate_periodicity.unwrap_or(input.payment_periodicity),
    };
    let periodic_rate = periodicity::normalize_rate(&quoted, input.payment_periodicity)?;
    let effective_annual_rate =
        periodicity::effective_annual_rate(periodic_rate, input.payment_periodicity)?;

    if periodic_rate.is_zero() {
        warnings.push("Zero interest rate: payments only repay principal".into());
    }

    let schedule = build_schedule(value, periodic_rate, periods, input.target)?;

    let output = AmortizationOutput {
        payment: round_money(schedule.payment),
        periodic_rate,
        effective_annual_rate,
        opening_balance: round_money(schedule.opening_balance),
        total_payments: schedule.total_payments()?,
        total_interest: schedule.total_interest()?,
        total_principal: schedule.total_principal()?,
        schedule: schedule.rows,
    };

    let methodology = match input.target {
        ValueTarget::PresentValue => "French amortization (constant payment, present value known)",
        ValueTarget::FutureValue => "French amortization (constant payment, future value known)",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_schedule_input(principal: Money, rate: Rate, period_count: u32) -> TvmResult<()> {
    if principal <= Decimal::ZERO {
        return Err(TvmError::InvalidPrincipal {
            principal: principal.to_string(),
        });
    }
    if period_count == 0 {
        return Err(TvmError::InvalidPeriods {
            periods: period_count.to_string(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if period_count > MAX_SCHEDULE_PERIODS {
        return Err(TvmError::InvalidPeriods {
            periods: period_count.to_string(),
            reason: format!("A schedule is limited to {MAX_SCHEDULE_PERIODS} periods"),
        });
    }
    validate_rate(rate)
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
