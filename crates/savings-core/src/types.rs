use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SavingsError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.15 = 15%). Never as percentages.
pub type Rate = Decimal;

/// Dimensionless scaling factors (e.g. 0.67x of the "frequently" baseline)
pub type Multiplier = Decimal;

/// Portfolio company stage. Each stage has its own savings growth curve.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentLevel {
    #[serde(alias = "Pre-seed", alias = "Pre seed", alias = "preseed")]
    PreSeed,
    #[serde(alias = "Seed")]
    Seed,
    #[serde(alias = "Series A+", alias = "series_a_plus", alias = "seriesa")]
    SeriesA,
}

impl InvestmentLevel {
    pub const ALL: [InvestmentLevel; 3] = [
        InvestmentLevel::PreSeed,
        InvestmentLevel::Seed,
        InvestmentLevel::SeriesA,
    ];

    /// Label used on dashboards and in table output.
    pub fn display_name(&self) -> &'static str {
        match self {
            InvestmentLevel::PreSeed => "Pre-seed",
            InvestmentLevel::Seed => "Seed",
            InvestmentLevel::SeriesA => "Series A+",
        }
    }
}

impl fmt::Display for InvestmentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for InvestmentLevel {
    type Err = SavingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "preseed" => Ok(InvestmentLevel::PreSeed),
            "seed" => Ok(InvestmentLevel::Seed),
            "seriesa" | "seriesaplus" => Ok(InvestmentLevel::SeriesA),
            _ => Err(SavingsError::InvalidInput {
                field: "investment_level".into(),
                reason: format!("unknown investment level '{s}' (pre-seed, seed, series-a)"),
            }),
        }
    }
}

/// How often portfolio companies are nudged to redeem offers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ReminderFrequency {
    #[default]
    #[serde(alias = "No reminders")]
    None,
    #[serde(alias = "Quarterly reminders")]
    Quarterly,
    #[serde(alias = "Monthly reminders")]
    Monthly,
}

impl ReminderFrequency {
    pub fn display_name(&self) -> &'static str {
        match self {
            ReminderFrequency::None => "No reminders",
            ReminderFrequency::Quarterly => "Quarterly reminders",
            ReminderFrequency::Monthly => "Monthly reminders",
        }
    }
}

impl fmt::Display for ReminderFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ReminderFrequency {
    type Err = SavingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "none" | "no reminders" | "no" => Ok(ReminderFrequency::None),
            "quarterly" | "quarterly reminders" => Ok(ReminderFrequency::Quarterly),
            "monthly" | "monthly reminders" => Ok(ReminderFrequency::Monthly),
            _ => Err(SavingsError::InvalidInput {
                field: "reminder_frequency".into(),
                reason: format!("unknown reminder frequency '{s}' (none, quarterly, monthly)"),
            }),
        }
    }
}

/// How actively a bank's client base uses the platform.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EngagementTier {
    #[default]
    Rarely,
    Often,
    Frequently,
}

impl EngagementTier {
    pub const ALL: [EngagementTier; 3] = [
        EngagementTier::Rarely,
        EngagementTier::Often,
        EngagementTier::Frequently,
    ];
}

impl fmt::Display for EngagementTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngagementTier::Rarely => "rarely",
            EngagementTier::Often => "often",
            EngagementTier::Frequently => "frequently",
        })
    }
}

impl FromStr for EngagementTier {
    type Err = SavingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rarely" | "low" => Ok(EngagementTier::Rarely),
            "often" | "medium" => Ok(EngagementTier::Often),
            "frequently" | "high" => Ok(EngagementTier::Frequently),
            _ => Err(SavingsError::InvalidInput {
                field: "engagement_level".into(),
                reason: format!("unknown engagement level '{s}' (rarely, often, frequently)"),
            }),
        }
    }
}

/// Bank client segment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    Startup,
    Sme,
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompanyType::Startup => "startup",
            CompanyType::Sme => "sme",
        })
    }
}

impl FromStr for CompanyType {
    type Err = SavingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "startup" | "startups" => Ok(CompanyType::Startup),
            "sme" | "smes" => Ok(CompanyType::Sme),
            _ => Err(SavingsError::InvalidInput {
                field: "company_types".into(),
                reason: format!("unknown company type '{s}' (startup, sme)"),
            }),
        }
    }
}

/// One value per reminder frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub none: Decimal,
    pub quarterly: Decimal,
    pub monthly: Decimal,
}

impl FrequencyTable {
    pub fn get(&self, frequency: ReminderFrequency) -> Decimal {
        match frequency {
            ReminderFrequency::None => self.none,
            ReminderFrequency::Quarterly => self.quarterly,
            ReminderFrequency::Monthly => self.monthly,
        }
    }
}

/// One value per engagement tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    pub rarely: Decimal,
    pub often: Decimal,
    pub frequently: Decimal,
}

impl TierTable {
    pub fn get(&self, tier: EngagementTier) -> Decimal {
        match tier {
            EngagementTier::Rarely => self.rarely,
            EngagementTier::Often => self.often,
            EngagementTier::Frequently => self.frequently,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
