pub mod analyzer;
pub mod offers;
pub mod prediction;
pub mod records;
pub mod stats;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use offers::TopOfferParams;
use prediction::{CompanyMix, PredictionConfig};
use records::{BankSource, DateOrder};

use crate::types::{CompanyType, EngagementTier};

/// Client base described by a prediction or top-offers request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientBaseInput {
    pub num_clients: u64,
    pub company_types: Vec<CompanyType>,
    #[serde(default, alias = "engagement_level")]
    pub engagement: EngagementTier,
}

/// Data sources and calibration for the bank savings analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<BankSource>,
    /// Last day of every bank's validity window (inclusive)
    #[serde(default = "default_window_end")]
    pub window_end: NaiveDate,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub offers: TopOfferParams,
    #[serde(default)]
    pub mix: CompanyMix,
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn default_window_end() -> NaiveDate {
    ymd(2025, 2, 6)
}

fn staff_domains() -> Vec<String> {
    vec!["jpmorgan".into(), "chase".into()]
}

fn default_sources() -> Vec<BankSource> {
    vec![
        BankSource {
            name: "JPM".into(),
            file_name: "money_saved_JPM2025.csv".into(),
            date_order: DateOrder::DayFirst,
            window_start: ymd(2025, 1, 1),
            excluded_domains: staff_domains(),
            excluded_offers: Vec::new(),
        },
        BankSource {
            name: "SVB".into(),
            file_name: "money_saved_svb2024.csv".into(),
            date_order: DateOrder::MonthFirst,
            window_start: ymd(2024, 1, 1),
            excluded_domains: staff_domains(),
            excluded_offers: Vec::new(),
        },
    ]
}

impl Default for BankConfig {
    fn default() -> Self {
        BankConfig {
            sources: default_sources(),
            window_end: default_window_end(),
            prediction: PredictionConfig::default(),
            offers: TopOfferParams::default(),
            mix: CompanyMix::default(),
        }
    }
}

impl BankConfig {
    /// Add `patterns` to every source's offer denylist.
    pub fn exclude_offers(mut self, patterns: &[String]) -> Self {
        for source in &mut self.sources {
            source.excluded_offers.extend(patterns.iter().cloned());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources() {
        let config = BankConfig::default();
        let names: Vec<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["JPM", "SVB"]);
        assert_eq!(config.window_end, ymd(2025, 2, 6));
        assert_eq!(config.sources[1].date_order, DateOrder::MonthFirst);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: BankConfig =
            serde_json::from_str(r#"{"window_end": "2025-03-01"}"#).unwrap();
        assert_eq!(config.window_end, ymd(2025, 3, 1));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.mix, CompanyMix::default());
    }

    #[test]
    fn test_client_base_input_defaults_engagement() {
        let input: ClientBaseInput =
            serde_json::from_str(r#"{"num_clients": 500, "company_types": ["startup", "sme"]}"#)
                .unwrap();
        assert_eq!(input.engagement, EngagementTier::Rarely);
        assert_eq!(input.company_types, vec![CompanyType::Startup, CompanyType::Sme]);
    }

    #[test]
    fn test_exclude_offers_applies_to_every_source() {
        let config = BankConfig::default().exclude_offers(&["AWS".to_string()]);
        assert!(config
            .sources
            .iter()
            .all(|s| s.excluded_offers == vec!["AWS".to_string()]));
    }
}
