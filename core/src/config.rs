//! Analysis configuration.
//!
//! Loaded from a single JSON document; every section and every field has a
//! default, so an empty `{}` file is a valid config. Tests use
//! `AnalysisConfig::default_test()`.

use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

/// Upper bound on every day-count setting: one century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub customers:              usize,
    pub min_products_per_category: usize,
    pub max_products_per_category: usize,
    /// Days back from the reference date a purchase may fall on.
    pub history_days:           i64,
    /// Share of sales that lose one random field.
    pub missing_field_rate:     f64,
    /// Share of sales that additionally lose their satisfaction score.
    pub missing_score_rate:     f64,
    /// Probability that a sale's price drifts by up to ±10%.
    pub price_variation_rate:   f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            customers:                 20,
            min_products_per_category: 2,
            max_products_per_category: 4,
            history_days:              365,
            missing_field_rate:        0.05,
            missing_score_rate:        0.15,
            price_variation_rate:      0.30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    /// Rows with more than this share of null fields are purged.
    pub purge_null_ratio:  f64,
    /// Missing purchase dates are drawn from this many days before the
    /// reference date.
    pub date_window_days:  i64,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            purge_null_ratio: 0.5,
            date_window_days: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    /// Allowed deviation band around the category mean, as a fraction.
    pub threshold:        f64,
    /// Category-mean multiplier for products priced below the band.
    pub raise_factor:     f64,
    /// Category-mean multiplier for products priced above the band.
    pub lower_factor:     f64,
    /// Relative nudge applied to in-band products.
    pub nudge_rate:       f64,
    /// Run-wide cap on in-band nudge proposals.
    pub nudge_cap:        usize,
    /// Uplift for the best-selling product when nothing else was proposed.
    pub fallback_uplift:  f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            threshold:       0.2,
            raise_factor:    0.9,
            lower_factor:    1.1,
            nudge_rate:      0.05,
            nudge_cap:       5,
            fallback_uplift: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Neighbours taken per purchased product.
    pub neighbours_per_seed:  usize,
    pub recommendations:      usize,
    /// Drop products the customer already bought from the candidates.
    pub exclude_purchased:    bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            neighbours_per_seed: 5,
            recommendations:     5,
            exclude_purchased:   false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_products:       usize,
    pub recent_window_days: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_products:       10,
            recent_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub generator:   GeneratorConfig,
    pub imputation:  ImputationConfig,
    pub pricing:     PricingPolicy,
    pub recommender: RecommenderConfig,
    pub reports:     ReportConfig,
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalysisConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> AnalysisResult<()> {
        let g = &self.generator;
        if g.min_products_per_category == 0 || g.min_products_per_category > g.max_products_per_category {
            return Err(invalid(format!(
                "generator products per category must satisfy 1 <= min ({}) <= max ({})",
                g.min_products_per_category, g.max_products_per_category
            )));
        }
        check_days("generator.history_days", g.history_days, 0)?;
        if !(0.0..=1.0).contains(&self.imputation.purge_null_ratio) {
            return Err(invalid("imputation.purge_null_ratio must be in [0, 1]".into()));
        }
        check_days("imputation.date_window_days", self.imputation.date_window_days, 1)?;
        if self.pricing.threshold < 0.0 {
            return Err(invalid("pricing.threshold must be non-negative".into()));
        }
        check_days("reports.recent_window_days", self.reports.recent_window_days, 0)?;
        Ok(())
    }

    /// Config with small, hardcoded values for use in tests.
    pub fn default_test() -> Self {
        Self {
            generator: GeneratorConfig {
                customers: 8,
                ..GeneratorConfig::default()
            },
            ..Self::default()
        }
    }
}

fn invalid(message: String) -> AnalysisError {
    AnalysisError::Config { message }
}

fn check_days(name: &str, value: i64, min: i64) -> AnalysisResult<()> {
    if (min..=MAX_WINDOW_DAYS).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be in [{min}, {MAX_WINDOW_DAYS}], got {value}")))
    }
}
