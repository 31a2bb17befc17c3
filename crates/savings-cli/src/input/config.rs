use std::path::Path;

use vendor_savings_core::SavingsConfig;

use super::file::read_text;

/// Load a calibration file, or the built-in calibration when none is given.
/// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
pub fn load_config(path: Option<&str>) -> Result<SavingsConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(SavingsConfig::default());
    };
    let (canonical, contents) = read_text(path)?;

    let config = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    tracing::debug!(path = %canonical.display(), "loaded calibration");
    Ok(config)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;

    fn write_temp(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("vsave-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_no_path_is_default() {
        assert_eq!(load_config(None).unwrap(), SavingsConfig::default());
    }

    #[test]
    fn test_yaml_config() {
        let path = write_temp(
            "calibration.yaml",
            "vc:\n  success_rates:\n    none: \"0.12\"\n    quarterly: \"0.2\"\n    monthly: \"0.35\"\nbank:\n  prediction:\n    strategy: single_bank_rate\n",
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.vc.success_rates.none, dec!(0.12));
        assert_eq!(
            config.bank.prediction.strategy,
            vendor_savings_core::bank::prediction::PredictionStrategy::SingleBankRate
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_json_config() {
        let path = write_temp("calibration.json", r#"{"vc": {"admin_policy": "per_level"}}"#);
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(
            config.vc.admin_policy,
            vendor_savings_core::vc::calculator::AdminSavingsPolicy::PerLevel
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(load_config(Some("/nonexistent/vsave.yaml")).is_err());
    }
}
