pub mod admin;
pub mod allocation;
pub mod calculator;
pub mod segment;

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::FrequencyTable;
use admin::AdminTimeParams;
use allocation::DistributionTable;
use calculator::{AdminSavingsPolicy, SuccessRatePolicy};
use segment::SegmentCurves;

/// Calibration for the VC portfolio savings calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcConfig {
    #[serde(default)]
    pub curves: SegmentCurves,
    #[serde(default)]
    pub distribution: DistributionTable,
    #[serde(default = "default_success_rates")]
    pub success_rates: FrequencyTable,
    #[serde(default)]
    pub admin: AdminTimeParams,
    #[serde(default)]
    pub admin_policy: AdminSavingsPolicy,
    #[serde(default)]
    pub success_rate_policy: SuccessRatePolicy,
}

fn default_success_rates() -> FrequencyTable {
    FrequencyTable {
        none: dec!(0.10),
        quarterly: dec!(0.15),
        monthly: dec!(0.30),
    }
}

impl Default for VcConfig {
    fn default() -> Self {
        VcConfig {
            curves: SegmentCurves::default(),
            distribution: DistributionTable::default(),
            success_rates: default_success_rates(),
            admin: AdminTimeParams::default(),
            admin_policy: AdminSavingsPolicy::default(),
            success_rate_policy: SuccessRatePolicy::default(),
        }
    }
}
