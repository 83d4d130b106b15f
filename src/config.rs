use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::constants;
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::quality_gate::QualityGateConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub quality: QualityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub per_page: u32,
    pub timeout_seconds: u64,
    /// Upper bound on pages requested in one run; unbounded when unset
    pub max_pages: Option<u32>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_API_URL.to_string(),
            per_page: constants::DEFAULT_PER_PAGE,
            timeout_seconds: constants::DEFAULT_TIMEOUT_SECONDS,
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub raw_table: String,
    pub quality_table: String,
    pub clean_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: constants::DEFAULT_DB_PATH.to_string(),
            raw_table: constants::RAW_TABLE.to_string(),
            quality_table: constants::QUALITY_TABLE.to_string(),
            clean_table: constants::CLEAN_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub accepted_categories: Vec<String>,
    pub category_field: String,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            accepted_categories: constants::default_accepted_categories(),
            category_field: constants::CATEGORY_FIELD.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when the file is absent,
    /// then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                PipelineError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            info!("Loaded configuration from {}", path.display());
            Self::from_toml_str(&content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BREWERY_*` overrides using the given variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BREWERY_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(db_path) = lookup("BREWERY_DB_PATH").filter(|v| !v.trim().is_empty()) {
            self.storage.db_path = db_path;
        }
        if let Some(per_page) = lookup("BREWERY_PER_PAGE") {
            self.api.per_page = per_page.trim().parse().map_err(|e| {
                PipelineError::Config(format!("Invalid BREWERY_PER_PAGE '{}': {}", per_page, e))
            })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.api.per_page == 0 {
            return Err(PipelineError::Config("api.per_page must be greater than zero".into()));
        }
        if self.quality.category_field.trim().is_empty() {
            return Err(PipelineError::Config("quality.category_field must not be empty".into()));
        }
        Ok(())
    }

    pub fn quality_gate_config(&self) -> QualityGateConfig {
        QualityGateConfig::new(
            self.quality.accepted_categories.iter().cloned(),
            self.quality.category_field.clone(),
        )
    }
}
