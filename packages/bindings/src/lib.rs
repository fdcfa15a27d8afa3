use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tvm_core::{periodicity, time_value, Periodicity, ValueTarget};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<'a, T: Deserialize<'a>>(input_json: &'a str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ConvertRateRequest {
    rate: Decimal,
    from: Periodicity,
    to: Periodicity,
}

#[derive(Deserialize)]
struct NominalRateRequest {
    rate: Decimal,
    #[serde(default)]
    periodicity: Periodicity,
}

#[derive(Deserialize)]
struct SingleRateRequest {
    rate: Decimal,
}

#[derive(Serialize)]
struct RateResponse {
    rate: Decimal,
}

#[napi]
pub fn convert_rate(input_json: String) -> NapiResult<String> {
    let req: ConvertRateRequest = parse(&input_json)?;
    let rate = periodicity::convert_rate(req.rate, req.from, req.to).map_err(to_napi_error)?;
    render(&RateResponse { rate })
}

#[napi]
pub fn nominal_to_periodic_rate(input_json: String) -> NapiResult<String> {
    let req: NominalRateRequest = parse(&input_json)?;
    let rate =
        periodicity::nominal_to_periodic_rate(req.rate, req.periodicity).map_err(to_napi_error)?;
    render(&RateResponse { rate })
}

#[napi]
pub fn arrears_to_advance_rate(input_json: String) -> NapiResult<String> {
    let req: SingleRateRequest = parse(&input_json)?;
    let rate = periodicity::arrears_to_advance_rate(req.rate).map_err(to_napi_error)?;
    render(&RateResponse { rate })
}

#[napi]
pub fn advance_to_arrears_rate(input_json: String) -> NapiResult<String> {
    let req: SingleRateRequest = parse(&input_json)?;
    let rate = periodicity::advance_to_arrears_rate(req.rate).map_err(to_napi_error)?;
    render(&RateResponse { rate })
}

// ---------------------------------------------------------------------------
// Annuities
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_present_value_annuity(input_json: String) -> NapiResult<String> {
    let input: tvm_core::annuity::AnnuityParameters = parse(&input_json)?;
    let output =
        tvm_core::annuity::solve_present_value_annuity(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn solve_future_value_annuity(input_json: String) -> NapiResult<String> {
    let input: tvm_core::annuity::AnnuityParameters = parse(&input_json)?;
    let output = tvm_core::annuity::solve_future_value_annuity(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn annuity_present_value(input_json: String) -> NapiResult<String> {
    let input: tvm_core::annuity::AnnuityStreamInput = parse(&input_json)?;
    let output = tvm_core::annuity::annuity_present_value(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn annuity_future_value(input_json: String) -> NapiResult<String> {
    let input: tvm_core::annuity::AnnuityStreamInput = parse(&input_json)?;
    let output = tvm_core::annuity::annuity_future_value(&input).map_err(to_napi_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    let input: tvm_core::amortization::AmortizationInput = parse(&input_json)?;
    let output = tvm_core::amortization::amortize(&input).map_err(to_napi_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Single amounts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LumpSumRequest {
    amount: Decimal,
    #[serde(default)]
    known: ValueTarget,
    rate: Decimal,
    periods: Decimal,
}

#[derive(Deserialize)]
struct NperRequest {
    rate: Decimal,
    payment: Decimal,
    present_value: Decimal,
}

#[derive(Deserialize)]
struct ImpliedRateRequest {
    present_value: Decimal,
    future_value: Decimal,
    periods: Decimal,
}

#[derive(Serialize)]
struct ValueResponse {
    value: Decimal,
}

#[derive(Serialize)]
struct PeriodsResponse {
    periods: Decimal,
}

/// Compounds a known present value forward, or discounts a known future
/// value back, depending on `known`.
#[napi]
pub fn lump_sum(input_json: String) -> NapiResult<String> {
    let req: LumpSumRequest = parse(&input_json)?;
    let periods = time_value::period_count(req.periods).map_err(to_napi_error)?;
    let value = match req.known {
        ValueTarget::PresentValue => time_value::lump_sum_future_value(req.amount, req.rate, periods),
        ValueTarget::FutureValue => time_value::lump_sum_present_value(req.amount, req.rate, periods),
    }
    .map_err(to_napi_error)?;
    render(&ValueResponse { value })
}

#[napi]
pub fn number_of_periods(input_json: String) -> NapiResult<String> {
    let req: NperRequest = parse(&input_json)?;
    let periods = time_value::number_of_periods(req.rate, req.payment, req.present_value)
        .map_err(to_napi_error)?;
    render(&PeriodsResponse { periods })
}

#[napi]
pub fn implied_rate(input_json: String) -> NapiResult<String> {
    let req: ImpliedRateRequest = parse(&input_json)?;
    let periods = time_value::period_count(req.periods).map_err(to_napi_error)?;
    let rate = time_value::periodic_rate(req.present_value, req.future_value, periods)
        .map_err(to_napi_error)?;
    render(&RateResponse { rate })
}
