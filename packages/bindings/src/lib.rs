use napi::Result as NapiResult;
use napi_derive::napi;

use seller_finance_core::amortization::{balloon, schedule};
use seller_finance_core::optimizer::terms_search;
use seller_finance_core::{from_json, to_json};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_amortization(input_json: String) -> NapiResult<String> {
    let spec: schedule::LoanSpec = from_json(&input_json).map_err(to_napi_error)?;
    let output = schedule::compute_amortization(&spec).map_err(to_napi_error)?;
    to_json(&output).map_err(to_napi_error)
}

#[napi]
pub fn balloon_balance(input_json: String) -> NapiResult<String> {
    let input: balloon::BalloonInput = from_json(&input_json).map_err(to_napi_error)?;
    let output = balloon::balloon_balance(&input).map_err(to_napi_error)?;
    to_json(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Terms search
// ---------------------------------------------------------------------------

#[napi]
pub fn find_optimal_terms(input_json: String) -> NapiResult<String> {
    let constraints: terms_search::SearchConstraints =
        from_json(&input_json).map_err(to_napi_error)?;
    let output = terms_search::find_optimal_terms(&constraints).map_err(to_napi_error)?;
    to_json(&output).map_err(to_napi_error)
}
