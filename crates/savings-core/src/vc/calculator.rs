use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::admin::admin_savings;
use super::allocation::{allocate, CompanyAllocation};
use super::VcConfig;
use crate::error::SavingsError;
use crate::types::{
    with_metadata, ComputationOutput, InvestmentLevel, Money, Rate, ReminderFrequency,
};
use crate::SavingsResult;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Where admin savings are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminSavingsPolicy {
    /// Once over the whole portfolio; per-level admin savings are zero.
    #[default]
    Aggregate,
    /// Once per level on that level's company count, then summed.
    PerLevel,
}

/// How the reminder success rate enters the curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessRatePolicy {
    /// Evaluate the curve on all companies, then scale the dollars.
    #[default]
    ScaleSavings,
    /// Evaluate the curve on the active (successful) companies only.
    ScaleCompanies,
}

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Request for a portfolio savings estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsInput {
    /// Total portfolio companies
    pub num_companies: u64,
    /// Investment levels present in the portfolio
    pub selected_levels: Vec<InvestmentLevel>,
    #[serde(default)]
    pub reminder_frequency: ReminderFrequency,
}

/// Savings for one investment level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsDetail {
    pub companies: u64,
    /// Companies expected to act on outreach
    pub successful_companies: u64,
    pub savings: Money,
    pub admin_savings: Money,
    pub total_combined_savings: Money,
    pub savings_per_company: Money,
}

/// Portfolio-wide savings estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsReport {
    pub allocation: CompanyAllocation,
    pub per_level: BTreeMap<InvestmentLevel, SavingsDetail>,
    pub success_rate: Rate,
    pub total_savings: Money,
    pub total_admin_savings: Money,
    pub total_combined_savings: Money,
    /// Combined savings divided by allocated companies
    pub combined_savings_per_company: Money,
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

fn signed_count(count: u64) -> SavingsResult<i64> {
    i64::try_from(count).map_err(|_| SavingsError::InvalidInput {
        field: "num_companies".into(),
        reason: format!("{count} companies exceeds the supported maximum of {}", i64::MAX),
    })
}

fn overflow(context: &str) -> SavingsError {
    SavingsError::InvalidInput {
        field: "num_companies".into(),
        reason: format!("{context} overflows the decimal range"),
    }
}

/// Portfolio savings calculator bound to one immutable calibration.
#[derive(Debug, Clone, Default)]
pub struct SavingsCalculator {
    config: VcConfig,
}

impl SavingsCalculator {
    pub fn new(config: VcConfig) -> Self {
        SavingsCalculator { config }
    }

    pub fn config(&self) -> &VcConfig {
        &self.config
    }

    pub fn calculate(&self, input: &SavingsInput) -> SavingsResult<ComputationOutput<SavingsReport>> {
        self.calculate_savings(
            input.num_companies,
            &input.selected_levels,
            input.reminder_frequency,
        )
    }

    /// Split the portfolio, evaluate each level's curve, apply the success
    /// rate and add admin savings.
    pub fn calculate_savings(
        &self,
        total_companies: u64,
        selected_levels: &[InvestmentLevel],
        frequency: ReminderFrequency,
    ) -> SavingsResult<ComputationOutput<SavingsReport>> {
        let start = Instant::now();
        let cfg = &self.config;
        let mut warnings: Vec<String> = Vec::new();
        let signed_total = signed_count(total_companies)?;

        let allocation = allocate(total_companies, selected_levels, &cfg.distribution)?;
        if allocation.total() != total_companies {
            warnings.push(format!(
                "Allocated {} companies for a requested total of {} (independent rounding per level)",
                allocation.total(),
                total_companies
            ));
        }

        let success_rate = cfg.success_rates.get(frequency);
        let mut per_level = BTreeMap::new();

        for (level, count) in allocation.iter() {
            if count == 0 {
                warnings.push(format!("{level} received no companies and is omitted"));
                continue;
            }

            let count_dec = Decimal::from(count);
            let successful = (count_dec * success_rate).round();
            let successful_companies = u64::try_from(successful).unwrap_or(0);

            let spec = cfg.curves.get(level);
            let savings = match cfg.success_rate_policy {
                SuccessRatePolicy::ScaleSavings => spec
                    .evaluate(signed_count(count)?)?
                    .checked_mul(success_rate)
                    .ok_or_else(|| overflow("Scaled curve value"))?,
                SuccessRatePolicy::ScaleCompanies => {
                    spec.evaluate(signed_count(successful_companies)?)?
                }
            };
            if savings < Decimal::ZERO {
                warnings.push(format!(
                    "{level} curve is negative at {count} companies ({savings:.2})"
                ));
            }

            let level_admin = match cfg.admin_policy {
                AdminSavingsPolicy::Aggregate => Decimal::ZERO,
                AdminSavingsPolicy::PerLevel => admin_savings(signed_count(count)?, &cfg.admin),
            };
            let level_combined = savings
                .checked_add(level_admin)
                .ok_or_else(|| overflow("Combined level savings"))?;

            per_level.insert(
                level,
                SavingsDetail {
                    companies: count,
                    successful_companies,
                    savings,
                    admin_savings: level_admin,
                    total_combined_savings: level_combined,
                    savings_per_company: savings / count_dec,
                },
            );
        }

        let total_savings = checked_sum(per_level.values().map(|d| d.savings))
            .ok_or_else(|| overflow("Total savings"))?;
        let total_admin_savings = match cfg.admin_policy {
            AdminSavingsPolicy::Aggregate => admin_savings(signed_total, &cfg.admin),
            AdminSavingsPolicy::PerLevel => per_level.values().map(|d| d.admin_savings).sum(),
        };
        let total_combined_savings = total_savings
            .checked_add(total_admin_savings)
            .ok_or_else(|| overflow("Combined savings"))?;
        let allocated: u64 = per_level.values().map(|d| d.companies).sum();
        let combined_savings_per_company = if allocated > 0 {
            total_combined_savings / Decimal::from(allocated)
        } else {
            Decimal::ZERO
        };

        tracing::debug!(
            total_companies,
            %frequency,
            %total_savings,
            %total_admin_savings,
            "portfolio savings computed"
        );

        let assumptions = serde_json::json!({
            "reminder_frequency": frequency,
            "success_rate": success_rate.to_string(),
            "allocation_strategy": cfg.distribution.strategy,
            "remainder_policy": cfg.distribution.remainder,
            "admin_policy": cfg.admin_policy,
            "success_rate_policy": cfg.success_rate_policy,
            "hourly_rate": cfg.admin.hourly_rate().round_dp(2).to_string(),
        });

        let report = SavingsReport {
            allocation,
            per_level,
            success_rate,
            total_savings,
            total_admin_savings,
            total_combined_savings,
            combined_savings_per_company,
        };

        Ok(with_metadata(
            "Per-level regression curves scaled by reminder success rate, plus admin time savings",
            &assumptions,
            warnings,
            start.elapsed().as_micros() as u64,
            report,
        ))
    }
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Estimate portfolio savings with the current calibration.
pub fn calculate_savings(
    num_companies: u64,
    selected_levels: &[InvestmentLevel],
    reminder_frequency: ReminderFrequency,
) -> SavingsResult<ComputationOutput<SavingsReport>> {
    SavingsCalculator::default().calculate_savings(num_companies, selected_levels, reminder_frequency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vc::admin::AdminTimeParams;
    use crate::vc::segment::ModelSpec;
    use rust_decimal_macros::dec;
    use InvestmentLevel::*;

    #[test]
    fn test_all_levels_no_reminders() {
        let out = calculate_savings(100, &[PreSeed, Seed, SeriesA], ReminderFrequency::None).unwrap();
        let r = &out.result;
        assert_eq!(r.per_level.len(), 3);
        let companies: u64 = r.per_level.values().map(|d| d.companies).sum();
        assert!((companies as i64 - 100).abs() <= 2);

        let sum: Decimal = r.per_level.values().map(|d| d.savings).sum();
        assert_eq!(r.total_savings, sum);
        assert_eq!(r.success_rate, dec!(0.10));

        // Pre-seed: 8 companies on the linear curve
        let pre = &r.per_level[&PreSeed];
        assert_eq!(pre.companies, 8);
        assert_eq!(pre.savings, (dec!(142000.9) * dec!(8) + dec!(-61478.75)) * dec!(0.10));
        assert_eq!(pre.successful_companies, 1);
        assert_eq!(pre.admin_savings, Decimal::ZERO);
        assert_eq!(pre.total_combined_savings, pre.savings);
    }

    #[test]
    fn test_aggregate_admin_uses_total_companies() {
        let out = calculate_savings(100, &[PreSeed, Seed], ReminderFrequency::Monthly).unwrap();
        let expected = admin_savings(100, &AdminTimeParams::default());
        assert_eq!(out.result.total_admin_savings, expected);
        assert_eq!(
            out.result.total_combined_savings,
            out.result.total_savings + expected
        );
    }

    #[test]
    fn test_per_level_admin_sums_levels() {
        let config = VcConfig {
            admin_policy: AdminSavingsPolicy::PerLevel,
            ..VcConfig::default()
        };
        let calc = SavingsCalculator::new(config);
        let out = calc
            .calculate_savings(100, &[PreSeed, Seed, SeriesA], ReminderFrequency::Quarterly)
            .unwrap();
        let r = &out.result;
        let summed: Decimal = r.per_level.values().map(|d| d.admin_savings).sum();
        assert_eq!(r.total_admin_savings, summed);
        for d in r.per_level.values() {
            assert_eq!(d.total_combined_savings, d.savings + d.admin_savings);
            assert!(d.admin_savings > Decimal::ZERO);
        }
        // Fixed overhead is counted once per level, so the per-level sum is larger
        let aggregate = admin_savings(100, &AdminTimeParams::default());
        assert!(r.total_admin_savings > aggregate);
    }

    #[test]
    fn test_reminders_increase_savings() {
        let levels = [PreSeed, Seed, SeriesA];
        let none = calculate_savings(200, &levels, ReminderFrequency::None).unwrap();
        let quarterly = calculate_savings(200, &levels, ReminderFrequency::Quarterly).unwrap();
        let monthly = calculate_savings(200, &levels, ReminderFrequency::Monthly).unwrap();
        assert!(none.result.total_savings < quarterly.result.total_savings);
        assert!(quarterly.result.total_savings < monthly.result.total_savings);
        // Admin savings do not depend on the reminder frequency
        assert_eq!(
            none.result.total_admin_savings,
            monthly.result.total_admin_savings
        );
    }

    #[test]
    fn test_scale_companies_policy_evaluates_active_companies() {
        let config = VcConfig {
            success_rate_policy: SuccessRatePolicy::ScaleCompanies,
            ..VcConfig::default()
        };
        let calc = SavingsCalculator::new(config);
        let out = calc
            .calculate_savings(50, &[Seed], ReminderFrequency::Monthly)
            .unwrap();
        let seed = &out.result.per_level[&Seed];
        assert_eq!(seed.successful_companies, 15);
        let expected = ModelSpec::Quadratic {
            a: dec!(1245.44),
            b: dec!(53613.65),
            c: dec!(220522.93),
        }
        .evaluate(15)
        .unwrap();
        assert_eq!(seed.savings, expected);
    }

    #[test]
    fn test_zero_count_levels_are_omitted() {
        // 2 companies: Pre-seed 0.16 -> 0, Seed 1.8 -> 2, Series A+ 0.04 -> 0
        let out = calculate_savings(2, &[PreSeed, Seed, SeriesA], ReminderFrequency::None).unwrap();
        assert_eq!(out.result.per_level.len(), 1);
        assert!(out.result.per_level.contains_key(&Seed));
        assert!(out.warnings.iter().any(|w| w.contains("Pre-seed")));
    }

    #[test]
    fn test_zero_companies_yields_zero_portfolio_savings() {
        let out = calculate_savings(0, &[Seed], ReminderFrequency::None).unwrap();
        assert!(out.result.per_level.is_empty());
        assert_eq!(out.result.total_savings, Decimal::ZERO);
        assert_eq!(out.result.combined_savings_per_company, Decimal::ZERO);
    }

    #[test]
    fn test_negative_curve_value_is_flagged() {
        let mut config = VcConfig::default();
        config.curves.series_a = ModelSpec::Linear {
            slope: dec!(10),
            intercept: dec!(-1000),
        };
        let out = SavingsCalculator::new(config)
            .calculate_savings(5, &[SeriesA], ReminderFrequency::None)
            .unwrap();
        assert!(out.result.total_savings < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("negative")));
    }

    #[test]
    fn test_seed_curve_overflow_is_an_input_error() {
        let err = calculate_savings(10_000_000_000_000, &[Seed], ReminderFrequency::None).unwrap_err();
        assert!(matches!(err, SavingsError::InvalidInput { ref field, .. } if field == "num_companies"));
    }

    #[test]
    fn test_counts_beyond_i64_are_rejected() {
        for levels in [&[PreSeed][..], &[Seed], &[PreSeed, Seed, SeriesA]] {
            let err = calculate_savings(u64::MAX, levels, ReminderFrequency::None).unwrap_err();
            assert!(matches!(err, SavingsError::InvalidInput { .. }), "{levels:?}");
        }
        let per_level = SavingsCalculator::new(VcConfig {
            admin_policy: AdminSavingsPolicy::PerLevel,
            ..VcConfig::default()
        });
        assert!(per_level
            .calculate_savings(u64::MAX, &[SeriesA], ReminderFrequency::Monthly)
            .is_err());
    }

    #[test]
    fn test_large_linear_portfolio_stays_finite() {
        let out = calculate_savings(1_000_000_000_000, &[PreSeed], ReminderFrequency::None).unwrap();
        let expected = (dec!(142000.9) * Decimal::from(1_000_000_000_000u64) + dec!(-61478.75)) * dec!(0.10);
        assert_eq!(out.result.total_savings, expected);
    }

    #[test]
    fn test_empty_selection_is_an_input_error() {
        assert!(calculate_savings(100, &[], ReminderFrequency::None).is_err());
    }

    #[test]
    fn test_repeat_calls_are_identical() {
        let calc = SavingsCalculator::default();
        let a = calc
            .calculate_savings(321, &[PreSeed, Seed, SeriesA], ReminderFrequency::Quarterly)
            .unwrap();
        let b = calc
            .calculate_savings(321, &[PreSeed, Seed, SeriesA], ReminderFrequency::Quarterly)
            .unwrap();
        assert_eq!(a.result, b.result);
        assert_eq!(a.warnings, b.warnings);
    }
}
