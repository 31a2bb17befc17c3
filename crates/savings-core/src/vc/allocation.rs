//! Company distribution across investment levels.
//!
//! A VC states only its total portfolio size; the calculator splits that
//! count across the selected stages using either combination-specific
//! ratios or one global weight table renormalised over the selection.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SavingsError;
use crate::types::InvestmentLevel;
use crate::SavingsResult;

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// Which weight source drives the split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// A precomputed table for each pair and for all three levels.
    #[default]
    CombinationSpecific,
    /// One weight per level, renormalised over the selected subset.
    FixedWeights,
}

/// What happens to the units lost or gained by rounding each level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Round every level on its own; the sum may miss the total.
    #[default]
    Independent,
    /// Floor every share and hand leftover units to the largest fractions.
    LargestRemainder,
}

/// A weight per investment level. Levels absent from a table carry zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelWeights {
    #[serde(default)]
    pub pre_seed: Decimal,
    #[serde(default)]
    pub seed: Decimal,
    #[serde(default)]
    pub series_a: Decimal,
}

impl LevelWeights {
    pub fn get(&self, level: InvestmentLevel) -> Decimal {
        match level {
            InvestmentLevel::PreSeed => self.pre_seed,
            InvestmentLevel::Seed => self.seed,
            InvestmentLevel::SeriesA => self.series_a,
        }
    }
}

/// Ratios observed for each combination of selected levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationWeights {
    pub pre_seed_seed: LevelWeights,
    pub seed_series_a: LevelWeights,
    pub pre_seed_series_a: LevelWeights,
    pub all_three: LevelWeights,
}

impl CombinationWeights {
    /// Pick the table for a selection of two or three distinct levels.
    fn for_selection(&self, selected: &[InvestmentLevel]) -> &LevelWeights {
        let has = |level| selected.contains(&level);
        match (
            has(InvestmentLevel::PreSeed),
            has(InvestmentLevel::Seed),
            has(InvestmentLevel::SeriesA),
        ) {
            (true, true, true) => &self.all_three,
            (true, true, false) => &self.pre_seed_seed,
            (false, true, true) => &self.seed_series_a,
            _ => &self.pre_seed_series_a,
        }
    }
}

impl Default for CombinationWeights {
    fn default() -> Self {
        CombinationWeights {
            pre_seed_seed: LevelWeights {
                pre_seed: dec!(0.09),
                seed: dec!(0.91),
                series_a: Decimal::ZERO,
            },
            seed_series_a: LevelWeights {
                pre_seed: Decimal::ZERO,
                seed: dec!(0.94),
                series_a: dec!(0.06),
            },
            pre_seed_series_a: LevelWeights {
                pre_seed: dec!(0.80),
                seed: Decimal::ZERO,
                series_a: dec!(0.20),
            },
            all_three: LevelWeights {
                pre_seed: dec!(0.08),
                seed: dec!(0.90),
                series_a: dec!(0.02),
            },
        }
    }
}

/// Everything the allocator needs to split a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionTable {
    #[serde(default)]
    pub strategy: AllocationStrategy,
    #[serde(default)]
    pub combinations: CombinationWeights,
    #[serde(default = "default_fixed_weights")]
    pub fixed: LevelWeights,
    #[serde(default)]
    pub remainder: RemainderPolicy,
}

fn default_fixed_weights() -> LevelWeights {
    LevelWeights {
        pre_seed: dec!(0.085),
        seed: dec!(0.875),
        series_a: dec!(0.04),
    }
}

impl Default for DistributionTable {
    fn default() -> Self {
        DistributionTable {
            strategy: AllocationStrategy::default(),
            combinations: CombinationWeights::default(),
            fixed: default_fixed_weights(),
            remainder: RemainderPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Number of companies assigned to each selected level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyAllocation {
    pub counts: BTreeMap<InvestmentLevel, u64>,
}

impl CompanyAllocation {
    pub fn get(&self, level: InvestmentLevel) -> u64 {
        self.counts.get(&level).copied().unwrap_or(0)
    }

    /// Sum of allocated companies. May differ from the requested total under
    /// independent rounding.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InvestmentLevel, u64)> + '_ {
        self.counts.iter().map(|(level, count)| (*level, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Sorted, de-duplicated copy of the selection.
pub(crate) fn normalise_selection(selected: &[InvestmentLevel]) -> Vec<InvestmentLevel> {
    let mut levels = selected.to_vec();
    levels.sort();
    levels.dedup();
    levels
}

/// Split `total` companies across `selected` levels.
pub fn allocate(
    total: u64,
    selected: &[InvestmentLevel],
    table: &DistributionTable,
) -> SavingsResult<CompanyAllocation> {
    let levels = normalise_selection(selected);
    if levels.is_empty() {
        return Err(SavingsError::InvalidInput {
            field: "selected_levels".into(),
            reason: "Select at least one investment level".into(),
        });
    }

    if let [only] = levels.as_slice() {
        let mut counts = BTreeMap::new();
        counts.insert(*only, total);
        return Ok(CompanyAllocation { counts });
    }

    let weights = match table.strategy {
        AllocationStrategy::CombinationSpecific => table.combinations.for_selection(&levels),
        AllocationStrategy::FixedWeights => &table.fixed,
    };

    let shares = normalised_shares(&levels, weights)?;
    let total_dec = Decimal::from(total);

    let counts = match table.remainder {
        RemainderPolicy::Independent => shares
            .iter()
            .map(|(level, share)| (*level, to_count((share * total_dec).round())))
            .collect(),
        RemainderPolicy::LargestRemainder => largest_remainder(total, &shares),
    };

    tracing::debug!(
        total,
        strategy = ?table.strategy,
        remainder = ?table.remainder,
        ?counts,
        "allocated portfolio across levels"
    );

    Ok(CompanyAllocation { counts })
}

/// Filter `weights` to `levels` and rescale so the shares sum to one.
fn normalised_shares(
    levels: &[InvestmentLevel],
    weights: &LevelWeights,
) -> SavingsResult<Vec<(InvestmentLevel, Decimal)>> {
    for level in levels {
        if weights.get(*level) < Decimal::ZERO {
            return Err(SavingsError::InvalidInput {
                field: "distribution".into(),
                reason: format!("Weight for {level} must be non-negative"),
            });
        }
    }
    let weight_sum: Decimal = levels.iter().map(|l| weights.get(*l)).sum();
    if weight_sum <= Decimal::ZERO {
        return Err(SavingsError::InvalidInput {
            field: "distribution".into(),
            reason: "Weights of the selected levels sum to zero".into(),
        });
    }
    Ok(levels
        .iter()
        .map(|l| (*l, weights.get(*l) / weight_sum))
        .collect())
}

fn largest_remainder(
    total: u64,
    shares: &[(InvestmentLevel, Decimal)],
) -> BTreeMap<InvestmentLevel, u64> {
    let total_dec = Decimal::from(total);
    let mut counts = BTreeMap::new();
    let mut fractions: Vec<(InvestmentLevel, Decimal)> = Vec::with_capacity(shares.len());
    let mut assigned = 0u64;

    for (level, share) in shares {
        let exact = share * total_dec;
        let floor = exact.floor();
        let count = to_count(floor);
        assigned += count;
        counts.insert(*level, count);
        fractions.push((*level, exact - floor));
    }

    // Largest fraction first; ties go to the earlier stage.
    fractions.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let leftover = total.saturating_sub(assigned) as usize;
    for (level, _) in fractions.iter().cycle().take(leftover) {
        if let Some(count) = counts.get_mut(level) {
            *count += 1;
        }
    }
    counts
}

fn to_count(value: Decimal) -> u64 {
    u64::try_from(value.max(Decimal::ZERO)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use InvestmentLevel::*;

    fn table(strategy: AllocationStrategy, remainder: RemainderPolicy) -> DistributionTable {
        DistributionTable {
            strategy,
            remainder,
            ..DistributionTable::default()
        }
    }

    #[test]
    fn test_single_level_gets_everything() {
        for level in InvestmentLevel::ALL {
            for total in [0u64, 1, 7, 100, 12_345] {
                let alloc = allocate(total, &[level], &DistributionTable::default()).unwrap();
                assert_eq!(alloc.len(), 1);
                assert_eq!(alloc.get(level), total);
            }
        }
    }

    #[test]
    fn test_empty_selection_rejected() {
        let err = allocate(100, &[], &DistributionTable::default()).unwrap_err();
        assert!(matches!(err, SavingsError::InvalidInput { .. }));
    }

    #[test]
    fn test_duplicate_levels_collapse() {
        let alloc = allocate(50, &[Seed, Seed], &DistributionTable::default()).unwrap();
        assert_eq!(alloc.get(Seed), 50);
    }

    #[test]
    fn test_combination_all_three() {
        let alloc = allocate(100, &[PreSeed, Seed, SeriesA], &DistributionTable::default()).unwrap();
        assert_eq!(alloc.get(PreSeed), 8);
        assert_eq!(alloc.get(Seed), 90);
        assert_eq!(alloc.get(SeriesA), 2);
    }

    #[test]
    fn test_combination_pairs() {
        let t = DistributionTable::default();
        let a = allocate(100, &[Seed, PreSeed], &t).unwrap();
        assert_eq!((a.get(PreSeed), a.get(Seed)), (9, 91));

        let b = allocate(100, &[SeriesA, Seed], &t).unwrap();
        assert_eq!((b.get(Seed), b.get(SeriesA)), (94, 6));

        let c = allocate(100, &[PreSeed, SeriesA], &t).unwrap();
        assert_eq!((c.get(PreSeed), c.get(SeriesA)), (80, 20));
    }

    #[test]
    fn test_fixed_weights_renormalise() {
        // Seed 0.875 / 0.915 = 0.9563 -> 96, Series A+ 0.04 / 0.915 = 0.0437 -> 4
        let t = table(AllocationStrategy::FixedWeights, RemainderPolicy::Independent);
        let alloc = allocate(100, &[Seed, SeriesA], &t).unwrap();
        assert_eq!(alloc.get(Seed), 96);
        assert_eq!(alloc.get(SeriesA), 4);
    }

    #[test]
    fn test_independent_rounding_can_miss_total() {
        // 5 companies: 0.4 -> 0, 4.5 -> 4 (half-even), 0.1 -> 0, sum 4.
        let t = DistributionTable::default();
        let alloc = allocate(5, &[PreSeed, Seed, SeriesA], &t).unwrap();
        assert_eq!(alloc.get(Seed), 4);
        assert_eq!(alloc.total(), 4);
    }

    #[test]
    fn test_largest_remainder_hits_total_exactly() {
        let t = table(
            AllocationStrategy::CombinationSpecific,
            RemainderPolicy::LargestRemainder,
        );
        for total in [1u64, 2, 3, 5, 11, 37, 100, 999] {
            let alloc = allocate(total, &[PreSeed, Seed, SeriesA], &t).unwrap();
            assert_eq!(alloc.total(), total, "total {total}");
        }
    }

    #[test]
    fn test_multi_level_counts_bounded_by_total() {
        let selections: [&[InvestmentLevel]; 4] = [
            &[PreSeed, Seed],
            &[Seed, SeriesA],
            &[PreSeed, SeriesA],
            &[PreSeed, Seed, SeriesA],
        ];
        for strategy in [
            AllocationStrategy::CombinationSpecific,
            AllocationStrategy::FixedWeights,
        ] {
            let t = table(strategy, RemainderPolicy::Independent);
            for selected in selections {
                for total in [0u64, 1, 2, 9, 50, 1600] {
                    let alloc = allocate(total, selected, &t).unwrap();
                    for (_, count) in alloc.iter() {
                        assert!(count <= total);
                    }
                    let diff = alloc.total() as i64 - total as i64;
                    assert!(diff.abs() <= 2, "{strategy:?} {selected:?} {total}");
                }
            }
        }
    }

    #[test]
    fn test_zero_weight_selection_rejected() {
        let mut t = table(AllocationStrategy::FixedWeights, RemainderPolicy::Independent);
        t.fixed = LevelWeights {
            pre_seed: Decimal::ZERO,
            seed: Decimal::ZERO,
            series_a: dec!(1),
        };
        assert!(allocate(10, &[PreSeed, Seed], &t).is_err());
    }
}
