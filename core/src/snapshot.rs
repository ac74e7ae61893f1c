//! Snapshot serialization: a dataset to/from the JSON document the API
//! feed serves.
//!
//! Document shape:
//!   { "products": [SaleRecord...], "customers": [Customer...],
//!     "categories": [{id, name, description}...] }
//!
//! Missing values are `null`, dates are ISO `YYYY-MM-DD`. Loading a source
//! never fails the run: an unreadable or malformed document degrades to the
//! synthetic generator with a warning.

use crate::{
    catalog::{self, CategoryEntry},
    config::GeneratorConfig,
    error::AnalysisResult,
    generator,
    record::{Customer, Dataset, RecordTable, SaleRecord},
    rng::RngBank,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub products:   Vec<SaleRecord>,
    #[serde(default)]
    pub customers:  Vec<Customer>,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

impl DatasetSnapshot {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            products:   dataset.table.records.clone(),
            customers:  dataset.customers.clone(),
            categories: catalog::category_entries(),
        }
    }

    pub fn into_dataset(self) -> Dataset {
        Dataset {
            table:     RecordTable::new(self.products),
            customers: self.customers,
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> AnalysisResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::debug!("snapshot: wrote {} sales to {}", self.products.len(), path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> AnalysisResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let snapshot: DatasetSnapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }
}

/// Where a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Snapshot,
    Synthetic,
}

/// Load the snapshot at `path`; on any read or parse failure fall back to a
/// synthetic dataset drawn from `bank`.
pub fn load_or_generate(
    path: impl AsRef<Path>,
    bank: &RngBank,
    config: &GeneratorConfig,
    reference_date: NaiveDate,
) -> (Dataset, DataSource) {
    let path = path.as_ref();
    match DatasetSnapshot::load(path) {
        Ok(snapshot) => {
            log::info!(
                "snapshot: loaded {} sales, {} customers from {}",
                snapshot.products.len(),
                snapshot.customers.len(),
                path.display()
            );
            (snapshot.into_dataset(), DataSource::Snapshot)
        }
        Err(e) => {
            log::warn!("snapshot: cannot use {} ({e}), using synthetic data", path.display());
            (generator::generate(bank, config, reference_date), DataSource::Synthetic)
        }
    }
}
