//! Per-stage savings growth curves.
//!
//! Each investment level maps a company count to projected annual portfolio
//! savings through either a linear or a quadratic curve. Coefficients were
//! fitted offline against historical redemption data and are carried as
//! configuration, never refitted at request time.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SavingsError;
use crate::types::{InvestmentLevel, Money};
use crate::SavingsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Curve family and coefficients for one investment level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelSpec {
    /// y = slope * x + intercept
    Linear { slope: Decimal, intercept: Decimal },
    /// y = a * x^2 + b * x + c
    #[serde(alias = "polynomial")]
    Quadratic { a: Decimal, b: Decimal, c: Decimal },
}

impl ModelSpec {
    /// Evaluate the curve at `count`. Zero and negative counts are not
    /// rejected; they pass straight through the formula. A count whose
    /// curve value exceeds the `Decimal` range is an input error.
    pub fn evaluate(&self, count: i64) -> SavingsResult<Money> {
        let x = Decimal::from(count);
        let value = match self {
            ModelSpec::Linear { slope, intercept } => {
                slope.checked_mul(x).and_then(|v| v.checked_add(*intercept))
            }
            ModelSpec::Quadratic { a, b, c } => a
                .checked_mul(x)
                .and_then(|ax| ax.checked_mul(x))
                .and_then(|axx| b.checked_mul(x).and_then(|bx| axx.checked_add(bx)))
                .and_then(|v| v.checked_add(*c)),
        };
        value.ok_or_else(|| SavingsError::InvalidInput {
            field: "num_companies".into(),
            reason: format!("{} curve overflows at {count} companies", self.kind()),
        })
    }

    /// True when every growth coefficient is non-negative, i.e. the curve
    /// never decreases for count >= 0.
    pub fn is_non_decreasing(&self) -> bool {
        match self {
            ModelSpec::Linear { slope, .. } => *slope >= Decimal::ZERO,
            ModelSpec::Quadratic { a, b, .. } => *a >= Decimal::ZERO && *b >= Decimal::ZERO,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelSpec::Linear { .. } => "linear",
            ModelSpec::Quadratic { .. } => "quadratic",
        }
    }
}

/// One curve per investment level. Levels left out of a config document
/// keep the current calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentCurves {
    pub pre_seed: ModelSpec,
    pub seed: ModelSpec,
    pub series_a: ModelSpec,
}

impl SegmentCurves {
    pub fn get(&self, level: InvestmentLevel) -> &ModelSpec {
        match level {
            InvestmentLevel::PreSeed => &self.pre_seed,
            InvestmentLevel::Seed => &self.seed,
            InvestmentLevel::SeriesA => &self.series_a,
        }
    }

    /// Current calibration: linear early/late stage, quadratic Seed.
    pub fn current() -> Self {
        SegmentCurves {
            pre_seed: ModelSpec::Linear {
                slope: dec!(142000.9),
                intercept: dec!(-61478.75),
            },
            seed: ModelSpec::Quadratic {
                a: dec!(1245.44),
                b: dec!(53613.65),
                c: dec!(220522.93),
            },
            series_a: ModelSpec::Linear {
                slope: dec!(111347.28),
                intercept: dec!(-72002.51),
            },
        }
    }

    /// First calibration where every stage, Seed included, was a straight line.
    pub fn linear_only() -> Self {
        SegmentCurves {
            seed: ModelSpec::Linear {
                slope: dec!(212778.2),
                intercept: dec!(-118202.85),
            },
            ..Self::current()
        }
    }

    /// Quadratic curves used by the static portfolio calculator page.
    pub fn web_quadratic() -> Self {
        SegmentCurves {
            pre_seed: ModelSpec::Quadratic {
                a: dec!(100),
                b: dec!(35000),
                c: dec!(20000),
            },
            seed: ModelSpec::Quadratic {
                a: dec!(250),
                b: dec!(80000),
                c: dec!(50000),
            },
            series_a: ModelSpec::Quadratic {
                a: dec!(50),
                b: dec!(25000),
                c: dec!(15000),
            },
        }
    }

    /// Original HTML prototype curves (no intercept).
    pub fn legacy_quadratic() -> Self {
        SegmentCurves {
            pre_seed: ModelSpec::Quadratic {
                a: dec!(100),
                b: dec!(2000),
                c: Decimal::ZERO,
            },
            seed: ModelSpec::Quadratic {
                a: dec!(150),
                b: dec!(3000),
                c: Decimal::ZERO,
            },
            series_a: ModelSpec::Quadratic {
                a: dec!(200),
                b: dec!(4000),
                c: Decimal::ZERO,
            },
        }
    }

    /// Flattened recalibration proposed after the model comparison review.
    pub fn proposed() -> Self {
        SegmentCurves {
            pre_seed: ModelSpec::Linear {
                slope: dec!(45000),
                intercept: dec!(-10000),
            },
            seed: ModelSpec::Quadratic {
                a: dec!(200),
                b: dec!(50000),
                c: dec!(100000),
            },
            series_a: ModelSpec::Linear {
                slope: dec!(40000),
                intercept: dec!(-10000),
            },
        }
    }

    /// Look a preset up by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "current" => Some(Self::current()),
            "linear_only" | "linear-only" => Some(Self::linear_only()),
            "web_quadratic" | "web-quadratic" => Some(Self::web_quadratic()),
            "legacy_quadratic" | "legacy-quadratic" => Some(Self::legacy_quadratic()),
            "proposed" => Some(Self::proposed()),
            _ => None,
        }
    }
}

impl Default for SegmentCurves {
    fn default() -> Self {
        Self::current()
    }
}

/// A single sampled point on a savings curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub companies: i64,
    pub savings: Money,
}

/// Evaluate `spec` at each count, in the order given.
pub fn sample_curve(spec: &ModelSpec, counts: &[i64]) -> SavingsResult<Vec<CurvePoint>> {
    counts
        .iter()
        .map(|&companies| {
            Ok(CurvePoint {
                companies,
                savings: spec.evaluate(companies)?,
            })
        })
        .collect()
}

/// `steps` evenly spaced integer counts from `start` to `end` inclusive.
pub fn count_range(start: i64, end: i64, steps: usize) -> Vec<i64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            // Spans the full i64 range without overflowing
            let first = Decimal::from(start);
            let span = Decimal::from(end) - first;
            let last = Decimal::from(steps as u64 - 1);
            (0..steps)
                .map(|i| {
                    let step = Decimal::from(i as u64);
                    let offset = span
                        .checked_mul(step)
                        .map(|v| v / last)
                        .unwrap_or_else(|| span / last * step);
                    i64::try_from((first + offset).round()).unwrap_or(end)
                })
                .collect()
        }
    }
}
