use std::path::Path;

use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use vendor_savings_core::bank::{BankConfig, ClientBaseInput};
use vendor_savings_core::vc::calculator::{SavingsCalculator, SavingsInput};
use vendor_savings_core::vc::VcConfig;
use vendor_savings_core::BankSavingsAnalyzer;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct VcRequest<T> {
    #[serde(flatten)]
    input: T,
    #[serde(default)]
    config: VcConfig,
}

#[derive(Deserialize)]
struct AdminRequest {
    num_companies: i64,
}

#[derive(Deserialize)]
struct BankRequest {
    #[serde(flatten)]
    client_base: ClientBaseInput,
    #[serde(default)]
    config: BankConfig,
}

#[derive(Deserialize)]
struct DataRequest<T> {
    data_dir: String,
    #[serde(flatten)]
    input: T,
    #[serde(default)]
    config: BankConfig,
}

#[derive(Deserialize)]
struct NoInput {}

fn load_analyzer(data_dir: &str, config: BankConfig) -> NapiResult<BankSavingsAnalyzer> {
    BankSavingsAnalyzer::load(Path::new(data_dir), config).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// VC portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_savings(input_json: String) -> NapiResult<String> {
    let request: VcRequest<SavingsInput> =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = SavingsCalculator::new(request.config)
        .calculate(&request.input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn allocate(input_json: String) -> NapiResult<String> {
    let request: VcRequest<SavingsInput> =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = vendor_savings_core::vc::allocation::allocate(
        request.input.num_companies,
        &request.input.selected_levels,
        &request.config.distribution,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn admin_savings(input_json: String) -> NapiResult<String> {
    let request: VcRequest<AdminRequest> =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output: Decimal = vendor_savings_core::vc::admin::admin_savings(
        request.input.num_companies,
        &request.config.admin,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Bank clients
// ---------------------------------------------------------------------------

#[napi]
pub fn predict_annual_savings(input_json: String) -> NapiResult<String> {
    let request: BankRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = vendor_savings_core::bank::prediction::predict_annual_savings(
        request.client_base.num_clients,
        &request.client_base.company_types,
        request.client_base.engagement,
        &request.config.prediction,
        &request.config.mix,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn get_top_offers(input_json: String) -> NapiResult<String> {
    let request: DataRequest<ClientBaseInput> =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let analyzer = load_analyzer(&request.data_dir, request.config)?;
    let output = analyzer
        .get_top_offers(
            request.input.num_clients,
            &request.input.company_types,
            request.input.engagement,
        )
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn get_all_stats(input_json: String) -> NapiResult<String> {
    let request: DataRequest<NoInput> =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let analyzer = load_analyzer(&request.data_dir, request.config)?;
    serde_json::to_string(&analyzer.get_all_stats()).map_err(to_napi_error)
}
