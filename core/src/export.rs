//! Report bundle: every report of one analysis run in a single JSON
//! document, one named section per report.

use crate::{
    error::AnalysisResult,
    imputation::FieldComparison,
    pricing::PriceProposal,
    reports::{
        CategoryPriceStats, CustomerSpend, Demographics, MissingFieldStat, PaymentSummary,
        ProductQuantity, SpendTier,
    },
    snapshot::DataSource,
    types::{CustomerId, ProductName, RunId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub run_id:                     RunId,
    pub generated_on:               NaiveDate,
    pub source:                     DataSource,
    pub top_products:               Vec<ProductQuantity>,
    pub category_prices:            Vec<CategoryPriceStats>,
    pub category_sales:             BTreeMap<String, u64>,
    pub recent_sales:               Vec<ProductQuantity>,
    pub payment_analysis:           Vec<PaymentSummary>,
    /// Measured on the raw table.
    pub missing_data_report:        Vec<MissingFieldStat>,
    pub cleaning_comparison:        Vec<FieldComparison>,
    pub price_updates:              Vec<PriceProposal>,
    pub spend_tiers:                Vec<CustomerSpend>,
    pub spend_tier_counts:          BTreeMap<SpendTier, usize>,
    pub demographics:               Demographics,
    pub price_quantity_correlation: Option<f64>,
    /// Present when the run was asked for one customer's recommendations.
    pub recommendations:            Option<CustomerRecommendations>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecommendations {
    pub customer_id:   CustomerId,
    /// Roster name, when the customer is on the roster.
    #[serde(default)]
    pub customer_name: Option<String>,
    pub products:      Vec<ProductName>,
}

impl ReportBundle {
    pub fn to_json(&self) -> AnalysisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> AnalysisResult<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("export: report bundle written to {}", path.as_ref().display());
        Ok(())
    }
}
