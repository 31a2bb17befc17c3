use std::path::Path;

use super::offers::{get_top_offers, TopOffer};
use super::prediction::{predict_annual_savings, AnnualSavingsPrediction};
use super::records::{load_redemptions, BankDataset};
use super::stats::{calculate_bank_stats, BankStats};
use super::BankConfig;
use crate::types::{CompanyType, EngagementTier};
use crate::SavingsResult;

/// Loaded bank histories plus the calibration used to query them.
///
/// Datasets are never mutated after construction, so one analyzer can be
/// shared by reference between callers.
#[derive(Debug, Clone)]
pub struct BankSavingsAnalyzer {
    datasets: Vec<BankDataset>,
    config: BankConfig,
}

impl BankSavingsAnalyzer {
    /// Read every configured source from `data_dir`. Any source that cannot
    /// be loaded fails the whole analyzer.
    pub fn load(data_dir: &Path, config: BankConfig) -> SavingsResult<Self> {
        let datasets = config
            .sources
            .iter()
            .map(|source| load_redemptions(data_dir, source, config.window_end))
            .collect::<SavingsResult<Vec<_>>>()?;
        tracing::info!(
            banks = datasets.len(),
            records = datasets.iter().map(BankDataset::len).sum::<usize>(),
            data_dir = %data_dir.display(),
            "bank analyzer ready"
        );
        Ok(Self::from_datasets(datasets, config))
    }

    /// Build from already-loaded datasets. Their order is the order
    /// `get_all_stats` reports in.
    pub fn from_datasets(datasets: Vec<BankDataset>, config: BankConfig) -> Self {
        BankSavingsAnalyzer { datasets, config }
    }

    pub fn datasets(&self) -> &[BankDataset] {
        &self.datasets
    }

    pub fn dataset(&self, bank_name: &str) -> Option<&BankDataset> {
        self.datasets
            .iter()
            .find(|d| d.bank_name.eq_ignore_ascii_case(bank_name))
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    pub fn get_all_stats(&self) -> Vec<BankStats> {
        self.datasets.iter().map(calculate_bank_stats).collect()
    }

    pub fn predict_annual_savings(
        &self,
        num_clients: u64,
        company_types: &[CompanyType],
        engagement: EngagementTier,
    ) -> SavingsResult<AnnualSavingsPrediction> {
        predict_annual_savings(
            num_clients,
            company_types,
            engagement,
            &self.config.prediction,
            &self.config.mix,
        )
    }

    pub fn get_top_offers(
        &self,
        num_clients: u64,
        company_types: &[CompanyType],
        engagement: EngagementTier,
    ) -> SavingsResult<Vec<TopOffer>> {
        get_top_offers(
            &self.datasets,
            num_clients,
            company_types,
            engagement,
            &self.config.offers,
            &self.config.mix,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::records::RedemptionRecord;
    use crate::error::SavingsError;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn analyzer() -> BankSavingsAnalyzer {
        let record = RedemptionRecord {
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            company: Some("Acme".into()),
            offer_name: Some("Slack".into()),
            savings_amount: Some(dec!(250)),
            redeemer_domain: Some("acme.io".into()),
        };
        BankSavingsAnalyzer::from_datasets(
            vec![
                BankDataset::new("JPM", vec![]),
                BankDataset::new("SVB", vec![record]),
            ],
            BankConfig::default(),
        )
    }

    #[test]
    fn test_analyzer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BankSavingsAnalyzer>();
    }

    #[test]
    fn test_stats_follow_dataset_order() {
        let stats = analyzer().get_all_stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].bank_name, "JPM");
        assert_eq!(stats[1].total_savings, dec!(250));
    }

    #[test]
    fn test_dataset_lookup_ignores_case() {
        let a = analyzer();
        assert_eq!(a.dataset("svb").map(BankDataset::len), Some(1));
        assert!(a.dataset("Mercury").is_none());
    }

    #[test]
    fn test_top_offers_use_loaded_records() {
        let offers = analyzer()
            .get_top_offers(10_000, &[CompanyType::Startup], EngagementTier::Often)
            .unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].offer_name, "Slack");
        assert_eq!(offers[0].percentage, dec!(100));
    }

    #[test]
    fn test_missing_data_dir_fails_load() {
        let err = BankSavingsAnalyzer::load(
            Path::new("/nonexistent/vendor-savings"),
            BankConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SavingsError::DataLoad { .. }));
    }
}
