//! Run configuration: scoring parameters and export campaigns

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RfmError};
use crate::segment::Segment;

/// Parameters of the scoring pipeline
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RfmConfig {
    /// Number of equal-population bins per metric
    pub quantiles: usize,
    /// Days added to the latest order date to form the analysis date
    pub anchor_offset_days: i64,
}

impl Default for RfmConfig {
    fn default() -> Self {
        Self {
            quantiles: 5,
            anchor_offset_days: 2,
        }
    }
}

impl RfmConfig {
    /// Scores are written as single digits in the rf code, so the bucket
    /// count stays within 2..=9.
    pub fn validate(&self) -> Result<()> {
        if !(2..=9).contains(&self.quantiles) {
            return Err(RfmError::InvalidConfig(format!(
                "quantiles must be between 2 and 9, got {}",
                self.quantiles
            )));
        }
        if self.anchor_offset_days < 0 {
            return Err(RfmError::InvalidConfig(format!(
                "anchor_offset_days must not be negative, got {}",
                self.anchor_offset_days
            )));
        }
        Ok(())
    }
}

/// A targeted export: customers in any of `segments` whose category
/// interests include any of `any_of_tags`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub segments: Vec<Segment>,
    pub any_of_tags: Vec<String>,
    pub file_name: String,
}

/// Loyal customers interested in the women's category
pub fn womens_launch_campaign() -> Campaign {
    Campaign {
        name: "womens_launch".to_string(),
        segments: vec![Segment::Champions, Segment::LoyalCustomers],
        any_of_tags: vec!["KADIN".to_string()],
        file_name: "target_customers.csv".to_string(),
    }
}

/// Lapsed and new customers interested in men's or children's categories
pub fn mens_kids_discount_campaign() -> Campaign {
    Campaign {
        name: "mens_kids_discount".to_string(),
        segments: vec![
            Segment::CantLoose,
            Segment::AtRisk,
            Segment::Hibernating,
            Segment::NewCustomers,
        ],
        any_of_tags: vec!["ERKEK".to_string(), "COCUK".to_string()],
        file_name: "discount_target_customers.csv".to_string(),
    }
}

/// Everything a run reads from the config file and environment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rfm: RfmConfig,
    pub campaigns: Vec<Campaign>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rfm: RfmConfig::default(),
            campaigns: vec![womens_launch_campaign(), mens_kids_discount_campaign()],
        }
    }
}

/// Read settings from an optional TOML file and `RFM_` environment
/// variables (`RFM_RFM__QUANTILES=4`). Absent values keep their defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(false));
    }
    let settings: Settings = builder
        .add_source(
            config::Environment::with_prefix("RFM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| RfmError::InvalidConfig(e.to_string()))?;

    settings.rfm.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.rfm.quantiles, 5);
        assert_eq!(settings.rfm.anchor_offset_days, 2);
        assert_eq!(settings.campaigns.len(), 2);
        assert!(settings.rfm.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        let too_few = RfmConfig {
            quantiles: 1,
            ..RfmConfig::default()
        };
        assert!(too_few.validate().is_err());

        let too_many = RfmConfig {
            quantiles: 10,
            ..RfmConfig::default()
        };
        assert!(too_many.validate().is_err());

        let negative = RfmConfig {
            anchor_offset_days: -1,
            ..RfmConfig::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[rfm]
quantiles = 4

[[campaigns]]
name = "sleepers"
segments = ["about_to_sleep", "need_attention"]
any_of_tags = ["AKTIFSPOR"]
file_name = "sleepers.csv"
"#
        )
        .unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.rfm.quantiles, 4);
        assert_eq!(settings.rfm.anchor_offset_days, 2);
        assert_eq!(settings.campaigns.len(), 1);
        assert_eq!(
            settings.campaigns[0].segments,
            vec![Segment::AboutToSleep, Segment::NeedAttention]
        );
    }

    #[test]
    fn test_load_settings_rejects_invalid_values() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[rfm]\nquantiles = 12").unwrap();

        let err = load_settings(Some(file.path())).unwrap_err();
        assert!(matches!(err, RfmError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = load_settings(Some(Path::new("/nonexistent/rfm.toml"))).unwrap();
        assert_eq!(settings.rfm, RfmConfig::default());
    }
}
