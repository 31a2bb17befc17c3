//! Annual savings projection for a bank's client base.
//!
//! Three calibrations have been used over time; each is a named
//! [`PredictionStrategy`] with its own coefficient block so that the active
//! one is an explicit configuration choice.

use rust_decimal::MathematicalOps;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SavingsError;
use crate::types::{CompanyType, EngagementTier, Money, Multiplier, Rate, TierTable};
use crate::SavingsResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStrategy {
    /// Client-weighted blend of every benchmark bank, lifted to the
    /// "frequently" baseline.
    #[default]
    WeightedBaseline,
    /// Per-client rate of a single benchmark bank.
    SingleBankRate,
    /// Fixed dollars per active client, with a tier-dependent active share.
    EngagedClients,
}

/// Observed annual savings of a partner bank's client base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankBenchmark {
    pub name: String,
    pub clients: u64,
    pub annual_savings: Money,
    /// Factor lifting the bank's observed engagement to the "frequently" tier
    pub frequent_adjustment: Multiplier,
}

impl BankBenchmark {
    pub fn annual_per_client(&self) -> Money {
        if self.clients == 0 {
            return Decimal::ZERO;
        }
        self.annual_savings / Decimal::from(self.clients)
    }

    fn svb() -> Self {
        // 41,000 clients, $7.7M a year, observed at "often"
        BankBenchmark {
            name: "SVB".into(),
            clients: 41_000,
            annual_savings: dec!(7_700_000),
            frequent_adjustment: dec!(1.5),
        }
    }

    fn jpm() -> Self {
        // 5,000 clients, $1.7M a month, observed at "frequently"
        BankBenchmark {
            name: "JPM".into(),
            clients: 5_000,
            annual_savings: dec!(20_400_000),
            frequent_adjustment: dec!(1.0),
        }
    }
}

/// Logarithmic diminishing returns above a reference client count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DampingParams {
    pub reference_clients: u64,
}

impl Default for DampingParams {
    fn default() -> Self {
        DampingParams {
            reference_clients: 1_000,
        }
    }
}

impl DampingParams {
    /// `1 / (1 + log10(n / reference))` for n above the reference, else 1.
    pub fn factor(&self, num_clients: u64) -> Multiplier {
        if self.reference_clients == 0 || num_clients <= self.reference_clients {
            return Decimal::ONE;
        }
        let ratio = Decimal::from(num_clients) / Decimal::from(self.reference_clients);
        match ratio.checked_log10() {
            Some(log) => Decimal::ONE / (Decimal::ONE + log),
            None => Decimal::ONE,
        }
    }
}

/// Startup/SME blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMix {
    /// SME savings as a fraction of startup savings
    pub sme_factor: Multiplier,
    /// Startup share of a mixed client base
    pub startup_share: Rate,
}

impl Default for CompanyMix {
    fn default() -> Self {
        CompanyMix {
            sme_factor: dec!(0.7),
            startup_share: dec!(0.5),
        }
    }
}

impl CompanyMix {
    /// Savings multiplier for the requested client segments.
    pub fn factor(&self, company_types: &[CompanyType]) -> SavingsResult<Multiplier> {
        let startup = company_types.contains(&CompanyType::Startup);
        let sme = company_types.contains(&CompanyType::Sme);
        match (startup, sme) {
            (true, true) => Ok(self.startup_share + (Decimal::ONE - self.startup_share) * self.sme_factor),
            (true, false) => Ok(Decimal::ONE),
            (false, true) => Ok(self.sme_factor),
            (false, false) => Err(SavingsError::InvalidInput {
                field: "company_types".into(),
                reason: "Select at least one company type".into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedBaselineParams {
    pub benchmarks: Vec<BankBenchmark>,
    /// Multipliers relative to the "frequently" baseline
    pub engagement: TierTable,
    pub damping: Option<DampingParams>,
}

impl Default for WeightedBaselineParams {
    fn default() -> Self {
        WeightedBaselineParams {
            benchmarks: vec![BankBenchmark::svb(), BankBenchmark::jpm()],
            engagement: TierTable {
                rarely: dec!(0.33),
                often: dec!(0.67),
                frequently: dec!(1.0),
            },
            damping: Some(DampingParams::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleBankRateParams {
    pub benchmark: BankBenchmark,
    /// Multipliers relative to the benchmark's observed engagement
    pub engagement: TierTable,
    pub damping: Option<DampingParams>,
}

impl Default for SingleBankRateParams {
    fn default() -> Self {
        SingleBankRateParams {
            benchmark: BankBenchmark::svb(),
            engagement: TierTable {
                rarely: dec!(0.5),
                often: dec!(1.0),
                frequently: dec!(1.5),
            },
            damping: Some(DampingParams::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagedClientsParams {
    /// Annual savings of one active client at the lowest tier
    pub base_savings_per_active_client: Money,
    /// Share of clients that actively redeem
    pub active_share: TierTable,
    /// Per-active-client uplift
    pub per_client_uplift: TierTable,
}

impl Default for EngagedClientsParams {
    fn default() -> Self {
        EngagedClientsParams {
            base_savings_per_active_client: dec!(17858),
            active_share: TierTable {
                rarely: dec!(0.01),
                often: dec!(0.03),
                frequently: dec!(0.05),
            },
            per_client_uplift: TierTable {
                rarely: dec!(1.0),
                often: dec!(1.03),
                frequently: dec!(1.05),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default)]
    pub strategy: PredictionStrategy,
    #[serde(default)]
    pub weighted_baseline: WeightedBaselineParams,
    #[serde(default)]
    pub single_bank: SingleBankRateParams,
    #[serde(default)]
    pub engaged_clients: EngagedClientsParams,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSavingsPrediction {
    pub total_annual_savings: Money,
    pub monthly_savings: Money,
    pub avg_savings_per_company: Money,
    pub strategy: PredictionStrategy,
    /// Clients expected to redeem (engaged-clients strategy only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_clients: Option<u64>,
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Project annual savings for `num_clients` using the configured strategy.
pub fn predict_annual_savings(
    num_clients: u64,
    company_types: &[CompanyType],
    engagement: EngagementTier,
    config: &PredictionConfig,
    mix: &CompanyMix,
) -> SavingsResult<AnnualSavingsPrediction> {
    let type_factor = mix.factor(company_types)?;
    let n = Decimal::from(num_clients);
    let mut active_clients = None;

    let total = match config.strategy {
        PredictionStrategy::WeightedBaseline => {
            let p = &config.weighted_baseline;
            let weighted_clients: u64 = p.benchmarks.iter().map(|b| b.clients).sum();
            if weighted_clients == 0 {
                return Err(SavingsError::InsufficientData(
                    "Weighted baseline needs at least one benchmark bank with clients".into(),
                ));
            }
            let frequent_savings: Money = p
                .benchmarks
                .iter()
                .map(|b| b.annual_savings * b.frequent_adjustment)
                .sum();
            let per_client = frequent_savings / Decimal::from(weighted_clients);
            let damping = p.damping.as_ref().map_or(Decimal::ONE, |d| d.factor(num_clients));
            per_client * n * p.engagement.get(engagement) * type_factor * damping
        }
        PredictionStrategy::SingleBankRate => {
            let p = &config.single_bank;
            let damping = p.damping.as_ref().map_or(Decimal::ONE, |d| d.factor(num_clients));
            p.benchmark.annual_per_client() * n * p.engagement.get(engagement) * type_factor * damping
        }
        PredictionStrategy::EngagedClients => {
            let p = &config.engaged_clients;
            // Half a client rounds up to one
            let active = (n * p.active_share.get(engagement))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            active_clients = Some(u64::try_from(active).unwrap_or(0));
            active
                * p.base_savings_per_active_client
                * type_factor
                * p.per_client_uplift.get(engagement)
        }
    };

    tracing::debug!(
        num_clients,
        %engagement,
        strategy = ?config.strategy,
        %total,
        "predicted annual bank savings"
    );

    let avg = if num_clients > 0 {
        total / n
    } else {
        Decimal::ZERO
    };

    Ok(AnnualSavingsPrediction {
        total_annual_savings: total.round_dp(2),
        monthly_savings: (total / MONTHS_PER_YEAR).round_dp(2),
        avg_savings_per_company: avg.round_dp(2),
        strategy: config.strategy,
        active_clients,
    })
}
