//! Periodicity table and interest-rate conversion.
//!
//! One canonical periods-per-year table is shared by every component.
//! Rates are converted between compounding frequencies through effective
//! rate equivalence, `(1 + r_dest)^n_dest = (1 + r_origin)^n_origin`, with
//! fractional powers taken as exact rational exponents (integer power, then
//! Newton root) so that conversions round-trip in `Decimal`.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TvmError;
use crate::types::Rate;
use crate::TvmResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const NEWTON_ITERATIONS: u32 = 100;
const NEWTON_TOLERANCE: Decimal = dec!(0.00000000000000000001);

// ---------------------------------------------------------------------------
// Periodicity
// ---------------------------------------------------------------------------

/// How many payment or compounding periods fit in one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    /// 12 periods per year
    #[default]
    #[serde(alias = "mensual")]
    Monthly,
    /// 6 periods per year
    #[serde(alias = "bimestral")]
    Bimonthly,
    /// 4 periods per year
    #[serde(alias = "trimestral")]
    Quarterly,
    /// 3 periods per year
    #[serde(alias = "cuatrimestral")]
    FourMonthly,
    /// 2 periods per year
    #[serde(alias = "semestral", alias = "semi_annual")]
    Semiannual,
    /// 1 period per year
    #[serde(alias = "anual")]
    Annual,
}

impl Periodicity {
    pub const ALL: [Periodicity; 6] = [
        Periodicity::Monthly,
        Periodicity::Bimonthly,
        Periodicity::Quarterly,
        Periodicity::FourMonthly,
        Periodicity::Semiannual,
        Periodicity::Annual,
    ];

    /// Number of periods in one year.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Periodicity::Monthly => 12,
            Periodicity::Bimonthly => 6,
            Periodicity::Quarterly => 4,
            Periodicity::FourMonthly => 3,
            Periodicity::Semiannual => 2,
            Periodicity::Annual => 1,
        }
    }

    /// Form code, `1` (monthly) through `6` (annual).
    pub fn code(&self) -> u8 {
        match self {
            Periodicity::Monthly => 1,
            Periodicity::Bimonthly => 2,
            Periodicity::Quarterly => 3,
            Periodicity::FourMonthly => 4,
            Periodicity::Semiannual => 5,
            Periodicity::Annual => 6,
        }
    }

    pub fn from_periods_per_year(periods: u32) -> TvmResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.periods_per_year() == periods)
            .ok_or_else(|| TvmError::UnknownPeriodicity(format!("{periods} periods per year")))
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Periodicity::Monthly => "monthly",
            Periodicity::Bimonthly => "bimonthly",
            Periodicity::Quarterly => "quarterly",
            Periodicity::FourMonthly => "four_monthly",
            Periodicity::Semiannual => "semiannual",
            Periodicity::Annual => "annual",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Periodicity {
    type Err = TvmError;

    /// Accepts English names, the Spanish form labels and form codes `1`..`6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "1" | "monthly" | "mensual" => Ok(Periodicity::Monthly),
            "2" | "bimonthly" | "bimestral" => Ok(Periodicity::Bimonthly),
            "3" | "quarterly" | "trimestral" => Ok(Periodicity::Quarterly),
            "4" | "four_monthly" | "fourmonthly" | "cuatrimestral" => {
                Ok(Periodicity::FourMonthly)
            }
            "5" | "semiannual" | "semi_annual" | "semestral" => Ok(Periodicity::Semiannual),
            "6" | "annual" | "anual" => Ok(Periodicity::Annual),
            _ => Err(TvmError::UnknownPeriodicity(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Quoted rates
// ---------------------------------------------------------------------------

/// How a quoted rate relates to its periodicity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    /// Annual rate convertible `periodicity` times a year; the periodic rate
    /// is the annual figure divided evenly.
    #[default]
    Nominal,
    /// Rate already effective over one `periodicity` period
    /// (`Effective` + `Annual` is the usual "EA" quote).
    Effective,
}

/// A rate as the user entered it, with its basis and periodicity kept
/// alongside the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedRate {
    pub rate: Rate,
    #[serde(default)]
    pub basis: RateBasis,
    pub periodicity: Periodicity,
}

impl QuotedRate {
    pub fn nominal(rate: Rate, periodicity: Periodicity) -> Self {
        Self {
            rate,
            basis: RateBasis::Nominal,
            periodicity,
        }
    }

    pub fn effective(rate: Rate, periodicity: Periodicity) -> Self {
        Self {
            rate,
            basis: RateBasis::Effective,
            periodicity,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Equivalent per-period rate at `destination` for a rate known at `origin`.
///
/// `r_dest = (1 + r_origin)^(n_origin / n_destination) - 1`. Returns the
/// input unchanged when both periodicities are the same.
pub fn convert_rate(
    known_rate: Rate,
    origin: Periodicity,
    destination: Periodicity,
) -> TvmResult<Rate> {
    validate_rate(known_rate)?;
    if origin == destination {
        return Ok(known_rate);
    }

    let n_origin = origin.periods_per_year();
    let n_destination = destination.periods_per_year();
    let g = gcd(n_origin, n_destination);

    let base = Decimal::ONE + known_rate;
    let raised = checked_pow(base, n_origin / g, "rate conversion")?;
    let converted = nth_root(raised, n_destination / g)? - Decimal::ONE;

    tracing::debug!(
        %known_rate,
        %origin,
        %destination,
        %converted,
        "rate converted between periodicities"
    );
    Ok(converted)
}

/// String-coded variant of [`convert_rate`] for presentation layers that
/// hold periodicities as form codes or labels.
pub fn convert_rate_codes(known_rate: Rate, origin: &str, destination: &str) -> TvmResult<Rate> {
    let origin: Periodicity = origin.parse()?;
    let destination: Periodicity = destination.parse()?;
    convert_rate(known_rate, origin, destination)
}

/// Nominal annual rate divided evenly by periods per year.
pub fn nominal_to_periodic_rate(annual_nominal_rate: Rate, periodicity: Periodicity) -> TvmResult<Rate> {
    let periodic = annual_nominal_rate / Decimal::from(periodicity.periods_per_year());
    validate_rate(periodic)?;
    Ok(periodic)
}

/// Per-period rate at `payment_periodicity` for a quoted rate.
///
/// Nominal quotes are first divided down to their own compounding period,
/// then converted to the payment period.
pub fn normalize_rate(quoted: &QuotedRate, payment_periodicity: Periodicity) -> TvmResult<Rate> {
    let periodic = match quoted.basis {
        RateBasis::Nominal => nominal_to_periodic_rate(quoted.rate, quoted.periodicity)?,
        RateBasis::Effective => quoted.rate,
    };
    convert_rate(periodic, quoted.periodicity, payment_periodicity)
}

/// Effective annual rate implied by a per-period rate.
pub fn effective_annual_rate(periodic_rate: Rate, periodicity: Periodicity) -> TvmResult<Rate> {
    convert_rate(periodic_rate, periodicity, Periodicity::Annual)
}

/// Nominal annual rate implied by a per-period rate.
pub fn nominal_annual_rate(periodic_rate: Rate, periodicity: Periodicity) -> Rate {
    periodic_rate * Decimal::from(periodicity.periods_per_year())
}

/// Rate charged in advance equivalent to a rate charged in arrears:
/// `ia = i / (1 + i)`.
pub fn arrears_to_advance_rate(rate: Rate) -> TvmResult<Rate> {
    validate_rate(rate)?;
    Ok(rate / (Decimal::ONE + rate))
}

/// Rate charged in arrears equivalent to a rate charged in advance:
/// `i = ia / (1 - ia)`. Advance rates must be below 100%.
pub fn advance_to_arrears_rate(advance_rate: Rate) -> TvmResult<Rate> {
    validate_rate(advance_rate)?;
    if advance_rate >= Decimal::ONE {
        return Err(TvmError::InvalidRate {
            rate: advance_rate.to_string(),
            reason: "An advance rate must be below 100%".into(),
        });
    }
    Ok(advance_rate / (Decimal::ONE - advance_rate))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub(crate) fn validate_rate(rate: Rate) -> TvmResult<()> {
    if rate <= dec!(-1) {
        return Err(TvmError::InvalidRate {
            rate: rate.to_string(),
            reason: "Rate must be greater than -100%".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Math helpers
// ---------------------------------------------------------------------------

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Integer power by repeated squaring, failing instead of panicking on overflow.
pub(crate) fn checked_pow(base: Decimal, exp: u32, context: &str) -> TvmResult<Decimal> {
    let overflow = || TvmError::ArithmeticOverflow {
        context: context.to_string(),
    };
    let mut result = Decimal::ONE;
    let mut factor = base;
    let mut remaining = exp;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result.checked_mul(factor).ok_or_else(overflow)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            factor = factor.checked_mul(factor).ok_or_else(overflow)?;
        }
    }
    Ok(result)
}

/// `a * b`, or `ArithmeticOverflow` when the product leaves Decimal range.
pub(crate) fn checked_product(a: Decimal, b: Decimal, context: &str) -> TvmResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| TvmError::ArithmeticOverflow {
        context: context.to_string(),
    })
}

/// `a / b`: `DivisionByZero` for a zero divisor, `ArithmeticOverflow` when
/// the quotient leaves Decimal range.
pub(crate) fn checked_quotient(a: Decimal, b: Decimal, context: &str) -> TvmResult<Decimal> {
    if b.is_zero() {
        return Err(TvmError::DivisionByZero {
            context: context.to_string(),
        });
    }
    a.checked_div(b).ok_or_else(|| TvmError::ArithmeticOverflow {
        context: context.to_string(),
    })
}

/// Newton's method for the nth root of A.
/// x_{k+1} = ((n-1)*x_k + A / x_k^(n-1)) / n
pub(crate) fn nth_root(a: Decimal, n: u32) -> TvmResult<Decimal> {
    if n == 0 {
        return Err(TvmError::InvalidPeriods {
            periods: "0".into(),
            reason: "Root index must be greater than zero".into(),
        });
    }
    if a <= Decimal::ZERO {
        return Err(TvmError::InvalidInput {
            field: "root base".into(),
            reason: "Base of a fractional power must be positive".into(),
        });
    }
    if n == 1 || a == Decimal::ONE {
        return Ok(a);
    }

    let n_dec = Decimal::from(n);
    let n_minus_1 = n_dec - Decimal::ONE;

    // exp(ln(a)/n) lands close enough that x^(n-1) cannot overflow.
    let mut x = a
        .checked_ln()
        .and_then(|ln| (ln / n_dec).checked_exp())
        .unwrap_or(Decimal::ONE + (a - Decimal::ONE) / n_dec);

    for _ in 0..NEWTON_ITERATIONS {
        let x_pow = checked_pow(x, n - 1, "nth root")?;
        if x_pow.is_zero() {
            return Err(TvmError::DivisionByZero {
                context: "nth root iteration".into(),
            });
        }
        let x_new = (n_minus_1 * x + a / x_pow) / n_dec;
        if (x_new - x).abs() < NEWTON_TOLERANCE {
            return Ok(x_new);
        }
        x = x_new;
    }
    Ok(x)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_periods_per_year_table() {
        let table: Vec<u32> = Periodicity::ALL
            .iter()
            .map(|p| p.periods_per_year())
            .collect();
        assert_eq!(table, vec![12, 6, 4, 3, 2, 1]);
    }

    #[test]
    fn test_bimonthly_code_maps_to_six_periods() {
        let p: Periodicity = "2".parse().unwrap();
        assert_eq!(p, Periodicity::Bimonthly);
        assert_eq!(p.periods_per_year(), 6);
        assert_eq!("bimestral".parse::<Periodicity>().unwrap(), p);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Mensual".parse::<Periodicity>().unwrap(), Periodicity::Monthly);
        assert_eq!(
            "cuatrimestral".parse::<Periodicity>().unwrap(),
            Periodicity::FourMonthly
        );
        assert_eq!(
            "semi-annual".parse::<Periodicity>().unwrap(),
            Periodicity::Semiannual
        );
        assert_eq!("6".parse::<Periodicity>().unwrap(), Periodicity::Annual);
    }

    #[test]
    fn test_unknown_periodicity_rejected() {
        let err = "8".parse::<Periodicity>().unwrap_err();
        assert!(matches!(err, TvmError::UnknownPeriodicity(_)));
        let err = convert_rate_codes(dec!(0.1), "weekly", "annual").unwrap_err();
        assert!(matches!(err, TvmError::UnknownPeriodicity(_)));
    }

    #[test]
    fn test_from_periods_per_year() {
        assert_eq!(
            Periodicity::from_periods_per_year(4).unwrap(),
            Periodicity::Quarterly
        );
        assert!(Periodicity::from_periods_per_year(8).is_err());
    }

    #[test]
    fn test_serde_accepts_spanish_labels() {
        let p: Periodicity = serde_json::from_str("\"trimestral\"").unwrap();
        assert_eq!(p, Periodicity::Quarterly);
        assert_eq!(
            serde_json::to_string(&Periodicity::FourMonthly).unwrap(),
            "\"four_monthly\""
        );
    }

    #[test]
    fn test_identity_conversion_is_exact() {
        let r = dec!(0.0123456789123456789);
        for p in Periodicity::ALL {
            assert_eq!(convert_rate(r, p, p).unwrap(), r);
        }
    }

    #[test]
    fn test_effective_annual_to_monthly() {
        let monthly = convert_rate(dec!(0.24), Periodicity::Annual, Periodicity::Monthly).unwrap();
        assert!((monthly - dec!(0.0180875824835107)).abs() < dec!(0.0000000000001));
    }

    #[test]
    fn test_monthly_to_effective_annual() {
        let annual = convert_rate(dec!(0.01), Periodicity::Monthly, Periodicity::Annual).unwrap();
        // 1.01^12 - 1 computed by repeated multiplication is exact in Decimal
        assert_eq!(annual, dec!(0.126825030131969720661201));
    }

    #[test]
    fn test_round_trip_all_pairs() {
        let rates = [dec!(0.015), dec!(0.24), dec!(-0.02), dec!(0.5)];
        for r in rates {
            for a in Periodicity::ALL {
                for b in Periodicity::ALL {
                    let there = convert_rate(r, a, b).unwrap();
                    let back = convert_rate(there, b, a).unwrap();
                    assert!(
                        (back - r).abs() < dec!(0.000000001),
                        "round trip {a} -> {b} drifted: {r} vs {back}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_non_integer_ratio_conversion() {
        // Bimonthly (6) to quarterly (4): exponent 3/2
        let q = convert_rate(dec!(0.02), Periodicity::Bimonthly, Periodicity::Quarterly).unwrap();
        let expected = dec!(0.030149);
        assert!((q - expected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_convert_rejects_rate_at_minus_one() {
        let err = convert_rate(dec!(-1), Periodicity::Annual, Periodicity::Monthly).unwrap_err();
        assert!(matches!(err, TvmError::InvalidRate { .. }));
    }

    #[test]
    fn test_same_periodicity_still_validates_rate() {
        for rate in [dec!(-1), dec!(-2)] {
            let err = convert_rate(rate, Periodicity::Monthly, Periodicity::Monthly).unwrap_err();
            assert!(matches!(err, TvmError::InvalidRate { .. }));
        }
        assert_eq!(
            convert_rate(dec!(-0.5), Periodicity::Monthly, Periodicity::Monthly).unwrap(),
            dec!(-0.5)
        );
    }

    #[test]
    fn test_checked_helpers_report_typed_errors() {
        let big = Decimal::MAX;
        assert!(matches!(
            checked_product(big, dec!(2), "test").unwrap_err(),
            TvmError::ArithmeticOverflow { .. }
        ));
        assert!(matches!(
            checked_quotient(big, dec!(0.5), "test").unwrap_err(),
            TvmError::ArithmeticOverflow { .. }
        ));
        assert!(matches!(
            checked_quotient(Decimal::ONE, Decimal::ZERO, "test").unwrap_err(),
            TvmError::DivisionByZero { .. }
        ));
        assert_eq!(checked_product(dec!(1.5), dec!(2), "test").unwrap(), dec!(3.0));
    }

    #[test]
    fn test_nominal_to_periodic() {
        let r = nominal_to_periodic_rate(dec!(0.12), Periodicity::Monthly).unwrap();
        assert_eq!(r, dec!(0.01));
        let r = nominal_to_periodic_rate(dec!(0.12), Periodicity::Bimonthly).unwrap();
        assert_eq!(r, dec!(0.02));
    }

    #[test]
    fn test_normalize_nominal_then_convert() {
        // 12% nominal compounded monthly, paid quarterly: 1.01^3 - 1
        let quoted = QuotedRate::nominal(dec!(0.12), Periodicity::Monthly);
        let r = normalize_rate(&quoted, Periodicity::Quarterly).unwrap();
        assert_eq!(r, dec!(0.030301));
    }

    #[test]
    fn test_normalize_effective_annual() {
        let quoted = QuotedRate::effective(dec!(0.24), Periodicity::Annual);
        let r = normalize_rate(&quoted, Periodicity::Monthly).unwrap();
        assert!((r - dec!(0.018088)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_advance_rate_conversions() {
        let ia = arrears_to_advance_rate(dec!(0.25)).unwrap();
        assert_eq!(ia, dec!(0.2));
        let i = advance_to_arrears_rate(dec!(0.2)).unwrap();
        assert_eq!(i, dec!(0.25));
    }

    #[test]
    fn test_advance_rate_must_be_below_one() {
        let err = advance_to_arrears_rate(dec!(1)).unwrap_err();
        assert!(matches!(err, TvmError::InvalidRate { .. }));
    }

    #[test]
    fn test_nth_root_matches_integer_power() {
        let root = nth_root(dec!(1.26247696), 4).unwrap();
        assert!((root - dec!(1.06)).abs() < dec!(0.0000000001));
    }
}
