//! Pipeline configuration.
//!
//! [`PipelineConfig`] is read from YAML with every section optional; missing
//! sections fall back to the defaults tuned for the AirBnB listings export.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    explode::{ExplodeSpec, RulePreset},
    levels::RareLevelRule,
    outlier::OutlierRule,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub load: LoadConfig,
    pub coerce: CoerceConfig,
    pub impute: ImputeConfig,
    pub explode: Vec<ExplodeSpec>,
    pub drop: DropConfig,
    pub levels: Vec<RareLevelRule>,
    pub outliers: Vec<OutlierRule>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoadConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoerceConfig {
    pub currency: Vec<String>,
    pub percent: Vec<String>,
    pub boolean: Vec<String>,
    pub date: Vec<String>,
    pub float: Vec<String>,
    pub integer: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImputeConfig {
    pub skip: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DropConfig {
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_text_cardinality: Option<usize>,
    pub keep: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub with_outliers: String,
    pub without_outliers: String,
    pub report: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            with_outliers: "listings_with_outliers.bin".to_string(),
            without_outliers: "listings_clean.bin".to_string(),
            report: "report.json".to_string(),
        }
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load: LoadConfig::default(),
            coerce: CoerceConfig {
                currency: names(&[
                    "price",
                    "weekly_price",
                    "monthly_price",
                    "security_deposit",
                    "cleaning_fee",
                    "extra_people",
                ]),
                percent: names(&["host_response_rate", "host_acceptance_rate"]),
                boolean: names(&[
                    "host_is_superhost",
                    "host_has_profile_pic",
                    "host_identity_verified",
                    "is_location_exact",
                    "instant_bookable",
                    "require_guest_profile_picture",
                    "require_guest_phone_verification",
                ]),
                date: names(&["host_since", "first_review", "last_review"]),
                float: Vec::new(),
                integer: Vec::new(),
            },
            impute: ImputeConfig::default(),
            explode: vec![
                ExplodeSpec::for_preset("amenities", RulePreset::Amenities),
                ExplodeSpec::for_preset("host_verifications", RulePreset::HostVerifications),
            ],
            drop: DropConfig {
                columns: names(&[
                    "id",
                    "listing_url",
                    "scrape_id",
                    "last_scraped",
                    "name",
                    "summary",
                    "space",
                    "description",
                    "neighborhood_overview",
                    "notes",
                    "transit",
                    "thumbnail_url",
                    "medium_url",
                    "picture_url",
                    "xl_picture_url",
                    "host_id",
                    "host_url",
                    "host_name",
                    "host_about",
                    "host_thumbnail_url",
                    "host_picture_url",
                    "host_listings_count",
                    "street",
                    "city",
                    "state",
                    "market",
                    "smart_location",
                    "country_code",
                    "country",
                    "calendar_last_scraped",
                    "amenities",
                    "host_verifications",
                ]),
                max_text_cardinality: Some(100),
                keep: Vec::new(),
            },
            levels: vec![
                RareLevelRule::new("property_type", 10),
                RareLevelRule::new("bed_type", 10),
                RareLevelRule::new("cancellation_policy", 10),
            ],
            outliers: vec![
                OutlierRule::at_most("price", 1000.0),
                OutlierRule::at_most("minimum_nights", 365.0),
                OutlierRule::at_most("accommodates", 16.0),
            ],
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: PipelineConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing config to YAML")
    }

    pub fn validate(&self) -> Result<()> {
        for spec in &self.explode {
            ensure!(
                !spec.column.trim().is_empty(),
                "Explode entries require a column name"
            );
            spec.normalization()
                .with_context(|| format!("Explode rules for '{}'", spec.column))?;
        }
        for rule in &self.outliers {
            if let (Some(min), Some(max)) = (rule.min, rule.max) {
                ensure!(
                    min <= max,
                    "Outlier rule for '{}' has min {min} above max {max}",
                    rule.column
                );
            }
        }
        ensure!(
            self.output.with_outliers != self.output.without_outliers,
            "Snapshot outputs must use different file names"
        );
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        match self.load.delimiter {
            None => Ok(None),
            Some(c) => {
                ensure!(c.is_ascii(), "Delimiter must be a single ASCII character");
                Ok(Some(c as u8))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explode::{MatchPolicy, TextRule};

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_sections() {
        let yaml = r#"
outliers:
  - column: price
    max: 500
explode:
  - column: amenities
    prefix: "a_"
    match_policy: exact_token
    rules:
      - rule: strip
        chars: "{}"
      - rule: join
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.outliers, vec![OutlierRule::at_most("price", 500.0)]);
        assert_eq!(config.explode[0].match_policy, MatchPolicy::ExactToken);
        assert_eq!(
            config.explode[0].rules[1],
            TextRule::Join {
                extra: "/".into(),
                with: '_'
            }
        );
        assert_eq!(config.coerce, PipelineConfig::default().coerce);
    }

    #[test]
    fn default_config_round_trips_through_yaml() {
        let config = PipelineConfig::default();
        let yaml = config.to_yaml_string().unwrap();
        let parsed: PipelineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut config = PipelineConfig::default();
        config.outliers = vec![OutlierRule {
            column: "price".into(),
            min: Some(10.0),
            max: Some(1.0),
        }];
        assert!(config.validate().is_err());
    }
}
