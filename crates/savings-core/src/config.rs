//! Top-level calibration. Every constant the calculators use lives here, so
//! a recalibration is a config file change.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bank")]
use crate::bank::BankConfig;
#[cfg(feature = "vc")]
use crate::vc::VcConfig;
use crate::SavingsResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsConfig {
    #[cfg(feature = "vc")]
    #[serde(default)]
    pub vc: VcConfig,
    #[cfg(feature = "bank")]
    #[serde(default)]
    pub bank: BankConfig,
}

impl SavingsConfig {
    /// Parse a JSON document. Missing sections and fields keep their defaults.
    pub fn from_json(json: &str) -> SavingsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> SavingsResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SavingsError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(SavingsConfig::from_json("{}").unwrap(), SavingsConfig::default());
    }

    #[cfg(feature = "vc")]
    #[test]
    fn test_override_single_coefficient() {
        use rust_decimal_macros::dec;
        let config = SavingsConfig::from_json(
            r#"{"vc": {"success_rates": {"none": "0.2", "quarterly": "0.25", "monthly": "0.4"}}}"#,
        )
        .unwrap();
        assert_eq!(config.vc.success_rates.none, dec!(0.2));
        assert_eq!(config.vc.curves, crate::vc::segment::SegmentCurves::default());
    }

    #[cfg(feature = "vc")]
    #[test]
    fn test_override_single_level_curve() {
        use crate::vc::segment::{ModelSpec, SegmentCurves};
        use rust_decimal_macros::dec;
        let config = SavingsConfig::from_json(
            r#"{"vc": {"curves": {"seed": {"model": "linear", "slope": "1000", "intercept": "0"}}}}"#,
        )
        .unwrap();
        assert_eq!(
            config.vc.curves.seed,
            ModelSpec::Linear {
                slope: dec!(1000),
                intercept: dec!(0),
            }
        );
        assert_eq!(config.vc.curves.pre_seed, SegmentCurves::current().pre_seed);
        assert_eq!(config.vc.curves.series_a, SegmentCurves::current().series_a);
    }

    #[test]
    fn test_malformed_document_is_serialization_error() {
        let err = SavingsConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, SavingsError::SerializationError(_)));
    }
}
