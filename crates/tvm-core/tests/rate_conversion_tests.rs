use tvm_core::periodicity::{
    self, advance_to_arrears_rate, arrears_to_advance_rate, convert_rate, nominal_to_periodic_rate,
    normalize_rate,
};
use tvm_core::{Periodicity, QuotedRate, TvmError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Effective rate conversion
// ===========================================================================

#[test]
fn test_round_trip_within_tolerance_for_every_pair() {
    let tolerance = dec!(0.000000001);
    for r in [dec!(0.0001), dec!(0.015), dec!(0.24), dec!(1.5)] {
        for a in Periodicity::ALL {
            for b in Periodicity::ALL {
                let there = convert_rate(r, a, b).unwrap();
                let back = convert_rate(there, b, a).unwrap();
                assert!((back - r).abs() < tolerance, "{a}->{b}: {r} came back as {back}");
            }
        }
    }
}

#[test]
fn test_same_periodicity_is_identity() {
    let r = dec!(0.018087582483510674);
    assert_eq!(
        convert_rate(r, Periodicity::Monthly, Periodicity::Monthly).unwrap(),
        r
    );
}

#[test]
fn test_scenario_effective_annual_24_to_monthly() {
    // (1.24)^(1/12) - 1
    let monthly = convert_rate(dec!(0.24), Periodicity::Annual, Periodicity::Monthly).unwrap();
    assert!((monthly - dec!(0.018088)).abs() < dec!(0.000001));
}

#[test]
fn test_semiannual_to_quarterly() {
    // (1.08)^(1/2) - 1
    let q = convert_rate(dec!(0.08), Periodicity::Semiannual, Periodicity::Quarterly).unwrap();
    assert!((q - dec!(0.0392304845)).abs() < dec!(0.0000000001));
}

#[test]
fn test_compounding_more_often_gives_higher_effective_rate() {
    let ea_monthly = periodicity::effective_annual_rate(dec!(0.01), Periodicity::Monthly).unwrap();
    let ea_quarterly =
        periodicity::effective_annual_rate(dec!(0.03), Periodicity::Quarterly).unwrap();
    assert!(ea_monthly > ea_quarterly);
    assert!(ea_quarterly > dec!(0.12));
}

#[test]
fn test_codes_resolve_through_one_table() {
    let via_code = periodicity::convert_rate_codes(dec!(0.02), "2", "6").unwrap();
    let via_enum = convert_rate(dec!(0.02), Periodicity::Bimonthly, Periodicity::Annual).unwrap();
    assert_eq!(via_code, via_enum);
    // 1.02^6 - 1
    assert_eq!(via_enum, dec!(0.126162419264));
}

#[test]
fn test_unknown_code_rejected() {
    let err = periodicity::convert_rate_codes(dec!(0.02), "bimonthly", "weekly").unwrap_err();
    assert!(matches!(err, TvmError::UnknownPeriodicity(code) if code == "weekly"));
}

// ===========================================================================
// Nominal rates
// ===========================================================================

#[test]
fn test_scenario_nominal_12_monthly_is_one_percent() {
    let r = nominal_to_periodic_rate(dec!(0.12), Periodicity::Monthly).unwrap();
    assert_eq!(r, dec!(0.01));
}

#[test]
fn test_nominal_annual_view() {
    assert_eq!(
        periodicity::nominal_annual_rate(dec!(0.01), Periodicity::Monthly),
        dec!(0.12)
    );
}

#[test]
fn test_nominal_quarterly_paid_monthly() {
    // 8% nominal compounded quarterly = 2% per quarter; monthly = 1.02^(1/3) - 1
    let quoted = QuotedRate::nominal(dec!(0.08), Periodicity::Quarterly);
    let r = normalize_rate(&quoted, Periodicity::Monthly).unwrap();
    assert!((r - dec!(0.0066227096)).abs() < dec!(0.0000000001));
}

#[test]
fn test_quoted_rate_deserializes_with_default_basis() {
    let quoted: QuotedRate =
        serde_json::from_str(r#"{"rate": "0.12", "periodicity": "mensual"}"#).unwrap();
    assert_eq!(quoted, QuotedRate::nominal(dec!(0.12), Periodicity::Monthly));
}

// ===========================================================================
// Advance rates
// ===========================================================================

#[test]
fn test_advance_and_arrears_are_inverse() {
    for i in [dec!(0.01), dec!(0.05), dec!(0.3)] {
        let ia = arrears_to_advance_rate(i).unwrap();
        assert!(ia < i);
        let back = advance_to_arrears_rate(ia).unwrap();
        assert!((back - i).abs() < dec!(0.0000000001));
    }
}

#[test]
fn test_advance_rate_of_one_hundred_percent_rejected() {
    assert!(matches!(
        advance_to_arrears_rate(dec!(1.2)).unwrap_err(),
        TvmError::InvalidRate { .. }
    ));
    assert!(matches!(
        arrears_to_advance_rate(Decimal::NEGATIVE_ONE).unwrap_err(),
        TvmError::InvalidRate { .. }
    ));
}
