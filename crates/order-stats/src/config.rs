//! Configuration for the order statistics tool

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::constants;
use crate::fees::FeeSchedule;
use crate::overrides::ProfitModel;
use crate::payload::AcceptancePolicy;

// =============================================================================
// File-based Configuration (order-stats.toml)
// =============================================================================

/// Configuration loaded from order-stats.toml; every section is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub fees: FeeSchedule,
    pub grouping: GroupingConfig,
    pub overrides: OverridesConfig,
    pub submission: SubmissionConfig,
}

/// Similarity clustering settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Keyword overlap required to join a cluster (strictly greater)
    pub similarity_threshold: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: constants::SIMILARITY_THRESHOLD,
        }
    }
}

/// Expected-profit settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OverridesConfig {
    /// Expected profit per order for groups without an override
    pub default_expected_profit: f64,
    /// Display name -> expected profit, e.g. "Widget (¥10)" = 0.5
    pub expected_profit: BTreeMap<String, f64>,
}

impl Default for OverridesConfig {
    fn default() -> Self {
        Self {
            default_expected_profit: constants::DEFAULT_EXPECTED_PROFIT,
            expected_profit: BTreeMap::new(),
        }
    }
}

/// Payload acceptance settings
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub policy: AcceptancePolicy,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| {
            format!(
                "Failed to parse {}. Check for:\n\
                 - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
                 - Incorrect data types (numbers vs strings)\n\
                 - Unknown policy (expected \"all-or-nothing\" or \"valid-only\")",
                path.display()
            )
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Validated settings used by the pipeline
#[derive(Debug, Clone)]
pub struct Config {
    pub fees: FeeSchedule,
    pub similarity_threshold: f64,
    pub default_expected_profit: f64,
    pub policy: AcceptancePolicy,
    /// Display name -> expected profit, applied after aggregation
    pub expected_profit_overrides: BTreeMap<String, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            similarity_threshold: constants::SIMILARITY_THRESHOLD,
            default_expected_profit: constants::DEFAULT_EXPECTED_PROFIT,
            policy: AcceptancePolicy::default(),
            expected_profit_overrides: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Create config from file config and an optional policy override
    pub fn from_file(file_config: &FileConfig, policy: Option<AcceptancePolicy>) -> Result<Self> {
        let fees = file_config.fees;
        if fees.threshold < 0.0 || fees.base_rate < 0.0 || fees.excess_rate < 0.0 {
            anyhow::bail!("Fee threshold and rates must not be negative");
        }

        let similarity_threshold = file_config.grouping.similarity_threshold;
        if !(0.0..=1.0).contains(&similarity_threshold) {
            anyhow::bail!(
                "similarity_threshold must be between 0 and 1 (got {})",
                similarity_threshold
            );
        }

        Ok(Self {
            fees,
            similarity_threshold,
            default_expected_profit: file_config.overrides.default_expected_profit,
            // Command line wins over the file
            policy: policy.unwrap_or(file_config.submission.policy),
            expected_profit_overrides: file_config.overrides.expected_profit.clone(),
        })
    }

    pub fn profit_model(&self) -> ProfitModel {
        ProfitModel {
            fees: self.fees,
            default_expected_profit: self.default_expected_profit,
        }
    }
}
