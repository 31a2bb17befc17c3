use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vendor_savings_core::types::{InvestmentLevel, ReminderFrequency};
use vendor_savings_core::vc::admin::{admin_savings, AdminTimeParams};
use vendor_savings_core::vc::allocation::{allocate, DistributionTable, RemainderPolicy};
use vendor_savings_core::vc::segment::{count_range, sample_curve, SegmentCurves};
use vendor_savings_core::vc::VcConfig;
use vendor_savings_core::{calculate_savings, SavingsCalculator, SavingsConfig};

use InvestmentLevel::*;

// ===========================================================================
// Segment curves
// ===========================================================================

#[test]
fn test_presets_monotone_on_sampled_counts() {
    for name in ["current", "linear_only", "web_quadratic", "legacy_quadratic", "proposed"] {
        let curves = SegmentCurves::preset(name).unwrap();
        for level in InvestmentLevel::ALL {
            let spec = curves.get(level);
            if !spec.is_non_decreasing() {
                continue;
            }
            let points = sample_curve(spec, &count_range(0, 500, 25)).unwrap();
            assert!(
                points.windows(2).all(|w| w[0].savings <= w[1].savings),
                "{name} {level} is not monotone"
            );
        }
    }
}

// ===========================================================================
// Allocation
// ===========================================================================

#[test]
fn test_allocation_counts_bounded_by_total() {
    let selections: [&[InvestmentLevel]; 4] = [
        &[PreSeed, Seed],
        &[Seed, SeriesA],
        &[PreSeed, SeriesA],
        &[PreSeed, Seed, SeriesA],
    ];
    for levels in selections {
        for total in [1u64, 3, 17, 100, 999] {
            let alloc = allocate(total, levels, &DistributionTable::default()).unwrap();
            assert_eq!(alloc.len(), levels.len());
            assert!(alloc.iter().all(|(_, n)| n <= total));
        }
    }
}

#[test]
fn test_largest_remainder_is_exact() {
    let table = DistributionTable {
        remainder: RemainderPolicy::LargestRemainder,
        ..DistributionTable::default()
    };
    for total in [1u64, 2, 7, 50, 101, 1234] {
        let alloc = allocate(total, &[PreSeed, Seed, SeriesA], &table).unwrap();
        assert_eq!(alloc.total(), total);
    }
}

// ===========================================================================
// Admin savings
// ===========================================================================

#[test]
fn test_admin_savings_formula() {
    let p = AdminTimeParams::default();
    let n = dec!(100);
    let months = dec!(12);
    let annual_hours = n * p.request_hours_per_company * months
        + n * p.introduction_hours_per_company * months
        + p.vendor_relationship_hours * months
        + p.admin_update_hours * months
        + p.inquiries_per_week * p.hours_per_inquiry * p.weeks_per_year;
    let hours_saved = annual_hours * p.admin_factor * p.automation_reduction;
    let expected = hours_saved * (p.annual_salary / p.working_hours_per_year);
    assert_eq!(admin_savings(100, &p), expected);
}

// ===========================================================================
// Portfolio savings
// ===========================================================================

#[test]
fn test_three_levels_sum_consistently() {
    let out = calculate_savings(100, &[PreSeed, Seed, SeriesA], ReminderFrequency::None).unwrap();
    let r = &out.result;
    assert_eq!(r.per_level.len(), 3);
    let companies: u64 = r.per_level.values().map(|d| d.companies).sum();
    assert!((companies as i64 - 100).abs() <= 2);
    let savings: Decimal = r.per_level.values().map(|d| d.savings).sum();
    assert_eq!(r.total_savings, savings);
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_configured_calculator_matches_default() {
    let config = SavingsConfig::from_json("{}").unwrap();
    let calc = SavingsCalculator::new(config.vc);
    let a = calc
        .calculate_savings(250, &[Seed, SeriesA], ReminderFrequency::Quarterly)
        .unwrap();
    let b = calculate_savings(250, &[Seed, SeriesA], ReminderFrequency::Quarterly).unwrap();
    assert_eq!(a.result, b.result);
}

#[test]
fn test_alternate_curve_preset_changes_result() {
    let config = VcConfig {
        curves: SegmentCurves::linear_only(),
        ..VcConfig::default()
    };
    let linear = SavingsCalculator::new(config)
        .calculate_savings(50, &[Seed], ReminderFrequency::None)
        .unwrap();
    // 212778.2 * 50 - 118202.85, at a 10% success rate
    assert_eq!(linear.result.total_savings, dec!(1052070.715));
}

#[test]
fn test_empty_selection_rejected() {
    let err = calculate_savings(10, &[], ReminderFrequency::Monthly).unwrap_err();
    assert!(err.to_string().contains("selected_levels"));
}
