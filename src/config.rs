use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Bucket name fragments that mark a bucket as ML-related
pub const DEFAULT_BUCKET_KEYWORDS: &[&str] = &["sagemaker", "llm", "model", "finetune"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fallback region when neither the flag nor the AWS environment has one
    pub region: Option<String>,
    pub scan: ScanConfig,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Only buckets whose name contains one of these (case-insensitive) are priced
    pub bucket_keywords: Vec<String>,
    /// Include the API Gateway inventory section
    pub api_gateway: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub storage_per_gb_month: f64,
    /// Hourly USD rates that replace or extend the built-in table
    pub instance_overrides: BTreeMap<String, f64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bucket_keywords: DEFAULT_BUCKET_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            api_gateway: true,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            storage_per_gb_month: crate::resources::pricing::DEFAULT_STORAGE_RATE_PER_GB_MONTH,
            instance_overrides: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .smcost.toml in current dir, then ~/.config/smcost/config.toml
            let local = PathBuf::from(".smcost.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("smcost").join("config.toml"))
                    .unwrap_or(local)
            }
        };

        if !config_path.exists() {
            if path.is_some() {
                tracing::warn!(
                    "Config file not found: {}, using defaults",
                    config_path.display()
                );
            }
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Unreadable {
            path: config_path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", config_path.display(), e)))?;
        config.validate()?;
        tracing::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let rate = self.pricing.storage_per_gb_month;
        if !rate.is_finite() || rate < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "pricing.storage_per_gb_month".to_string(),
                reason: format!("must be a non-negative number, got {}", rate),
            }
            .into());
        }

        for (instance_type, rate) in &self.pricing.instance_overrides {
            if !rate.is_finite() || *rate < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("pricing.instance_overrides.\"{}\"", instance_type),
                    reason: format!("must be a non-negative hourly rate, got {}", rate),
                }
                .into());
            }
        }

        if self.scan.bucket_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "scan.bucket_keywords".to_string(),
                reason: "keywords must not be empty strings".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmcostError;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.region.is_none());
        assert!(config.scan.api_gateway);
        assert_eq!(config.scan.bucket_keywords.len(), 4);
        assert_eq!(config.pricing.storage_per_gb_month, 0.023);
        assert!(config.pricing.instance_overrides.is_empty());
    }

    #[test]
    fn test_config_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
region = "eu-west-1"

[pricing.instance_overrides]
"ml.g6.xlarge" = 1.01
"#,
        )
        .unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.pricing.instance_overrides["ml.g6.xlarge"], 1.01);
        assert_eq!(config.pricing.storage_per_gb_month, 0.023);
        assert!(config.scan.bucket_keywords.contains(&"sagemaker".to_string()));
    }

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("smcost.toml");
        std::fs::write(
            &config_path,
            "[scan]\nbucket_keywords = [\"training-data\"]\napi_gateway = false\n",
        )
        .unwrap();

        let config = Config::load(Some(&config_path)).unwrap();
        assert_eq!(config.scan.bucket_keywords, vec!["training-data".to_string()]);
        assert!(!config.scan.api_gateway);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let fake_path = temp_dir.path().join("nonexistent.toml");

        // Should return default config
        let config = Config::load(Some(&fake_path)).unwrap();
        assert!(config.scan.api_gateway);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "invalid toml content {").unwrap();

        let result = Config::load(Some(&config_path));
        match result {
            Err(SmcostError::Config(ConfigError::ParseError(msg))) => {
                assert!(msg.contains("invalid.toml"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_negative_rates() {
        let result = Config::from_toml("[pricing]\nstorage_per_gb_month = -1.0\n");
        assert!(matches!(
            result,
            Err(SmcostError::Config(ConfigError::InvalidValue { .. }))
        ));

        let result = Config::from_toml("[pricing.instance_overrides]\n\"ml.m5.large\" = -0.5\n");
        assert!(matches!(
            result,
            Err(SmcostError::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
