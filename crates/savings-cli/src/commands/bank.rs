use clap::{Args, ValueEnum};
use serde_json::Value;
use std::path::Path;

use vendor_savings_core::bank::offers::OfferShareBasis;
use vendor_savings_core::bank::prediction::{predict_annual_savings, PredictionStrategy};
use vendor_savings_core::bank::{BankConfig, ClientBaseInput};
use vendor_savings_core::types::{CompanyType, EngagementTier};
use vendor_savings_core::BankSavingsAnalyzer;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    WeightedBaseline,
    SingleBankRate,
    EngagedClients,
}

impl From<StrategyArg> for PredictionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::WeightedBaseline => PredictionStrategy::WeightedBaseline,
            StrategyArg::SingleBankRate => PredictionStrategy::SingleBankRate,
            StrategyArg::EngagedClients => PredictionStrategy::EngagedClients,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShareBasisArg {
    TopOffers,
    AllOffers,
}

/// Client base shared by `predict` and `top-offers`
#[derive(Args)]
pub struct ClientBaseArgs {
    /// Number of bank clients
    #[arg(long)]
    pub clients: Option<u64>,

    /// Client segments (comma separated: startup,sme)
    #[arg(long, value_delimiter = ',', default_value = "startup")]
    pub company_types: Vec<CompanyType>,

    /// Engagement level: rarely, often, frequently
    #[arg(long)]
    pub engagement: Option<EngagementTier>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

impl ClientBaseArgs {
    fn read(&self) -> Result<ClientBaseInput, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            input::file::read_json(path)
        } else if let Some(data) = input::stdin::read_stdin()? {
            Ok(data)
        } else {
            Ok(ClientBaseInput {
                num_clients: self.clients.ok_or("--clients is required (or provide --input)")?,
                company_types: self.company_types.clone(),
                engagement: self.engagement.unwrap_or_default(),
            })
        }
    }
}

/// Arguments for annual savings prediction
#[derive(Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub client_base: ClientBaseArgs,

    /// Prediction strategy (overrides the calibration file)
    #[arg(long)]
    pub strategy: Option<StrategyArg>,
}

/// Arguments for top offer ranking
#[derive(Args)]
pub struct TopOffersArgs {
    #[command(flatten)]
    pub client_base: ClientBaseArgs,

    /// Offer names to leave out (comma separated, case-insensitive substrings)
    #[arg(long, value_delimiter = ',')]
    pub exclude_offers: Vec<String>,

    /// Maximum offers returned
    #[arg(long)]
    pub limit: Option<usize>,

    /// Denominator of the percentage column
    #[arg(long)]
    pub share_basis: Option<ShareBasisArg>,
}

/// Arguments for historical statistics
#[derive(Args)]
pub struct BankStatsArgs {
    /// Only report this bank
    #[arg(long)]
    pub bank: Option<String>,

    /// Offer names to leave out (comma separated, case-insensitive substrings)
    #[arg(long, value_delimiter = ',')]
    pub exclude_offers: Vec<String>,
}

pub fn run_predict(args: PredictArgs, config: &BankConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.client_base.read()?;
    let mut prediction = config.prediction.clone();
    if let Some(strategy) = args.strategy {
        prediction.strategy = strategy.into();
    }
    let result = predict_annual_savings(
        request.num_clients,
        &request.company_types,
        request.engagement,
        &prediction,
        &config.mix,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_top_offers(
    args: TopOffersArgs,
    config: BankConfig,
    data_dir: &Path,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.client_base.read()?;
    let mut config = config.exclude_offers(&args.exclude_offers);
    if let Some(limit) = args.limit {
        config.offers.limit = limit;
    }
    if let Some(basis) = args.share_basis {
        config.offers.share_basis = match basis {
            ShareBasisArg::TopOffers => OfferShareBasis::TopOffers,
            ShareBasisArg::AllOffers => OfferShareBasis::AllOffers,
        };
    }
    let analyzer = BankSavingsAnalyzer::load(data_dir, config)?;
    let result = analyzer.get_top_offers(
        request.num_clients,
        &request.company_types,
        request.engagement,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bank_stats(
    args: BankStatsArgs,
    config: BankConfig,
    data_dir: &Path,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config = config.exclude_offers(&args.exclude_offers);
    if let Some(ref bank) = args.bank {
        config.sources.retain(|s| s.name.eq_ignore_ascii_case(bank));
        if config.sources.is_empty() {
            return Err(format!("No configured bank named '{bank}'").into());
        }
    }
    let analyzer = BankSavingsAnalyzer::load(data_dir, config)?;
    Ok(serde_json::to_value(analyzer.get_all_stats())?)
}
