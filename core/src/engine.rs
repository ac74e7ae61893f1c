//! The analysis engine: one batch session over one dataset.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Load        synthetic generator or JSON snapshot
//!   2. Clean       imputation cascade on a copy of the raw table
//!   3. Price       pricing advisory over the cleaned table
//!   4. Apply       optional write-back of the proposed prices
//!   5. Report      aggregates, recommendations, report bundle
//!
//! RULES:
//!   - The raw dataset is never modified after loading.
//!   - Stages 3–5 read only the cleaned table; they clean on demand.
//!   - All randomness flows through the RngBank.

use crate::{
    clock::AnalysisClock,
    config::AnalysisConfig,
    error::{AnalysisError, AnalysisResult},
    export::{CustomerRecommendations, ReportBundle},
    generator,
    imputation::{self, ImputationReport},
    pricing::{self, PriceProposal, PriceUpdates},
    recommender,
    record::{Dataset, RecordTable},
    reports,
    rng::{RngBank, StreamSlot},
    snapshot::{self, DataSource, DatasetSnapshot},
    types::{CustomerId, ProductName, RunId},
};
use std::path::Path;

pub struct AnalysisEngine {
    pub run_id:   RunId,
    pub clock:    AnalysisClock,
    pub rng_bank: RngBank,
    pub config:   AnalysisConfig,
    source:       DataSource,
    raw:          Dataset,
    cleaned:      Option<(RecordTable, ImputationReport)>,
}

impl AnalysisEngine {
    pub fn new(
        seed: u64,
        clock: AnalysisClock,
        config: AnalysisConfig,
        raw: Dataset,
        source: DataSource,
    ) -> Self {
        let run_id = uuid::Uuid::new_v4().to_string();
        log::info!(
            "engine: run {run_id} seed={seed} reference_date={} source={source:?}",
            clock.today()
        );
        Self {
            run_id,
            clock,
            rng_bank: RngBank::new(seed),
            config,
            source,
            raw,
            cleaned: None,
        }
    }

    /// Engine over a freshly generated synthetic dataset.
    pub fn synthetic(seed: u64, clock: AnalysisClock, config: AnalysisConfig) -> Self {
        let dataset = generator::generate(&RngBank::new(seed), &config.generator, clock.today());
        Self::new(seed, clock, config, dataset, DataSource::Synthetic)
    }

    /// Engine over the snapshot at `path`, or synthetic data when it cannot
    /// be read.
    pub fn from_snapshot(
        path: impl AsRef<Path>,
        seed: u64,
        clock: AnalysisClock,
        config: AnalysisConfig,
    ) -> Self {
        let (dataset, source) =
            snapshot::load_or_generate(path, &RngBank::new(seed), &config.generator, clock.today());
        Self::new(seed, clock, config, dataset, source)
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn raw(&self) -> &Dataset {
        &self.raw
    }

    /// Cleaned table, if `clean()` has run.
    pub fn cleaned(&self) -> Option<&RecordTable> {
        self.cleaned.as_ref().map(|(table, _)| table)
    }

    pub fn imputation_report(&self) -> Option<&ImputationReport> {
        self.cleaned.as_ref().map(|(_, report)| report)
    }

    /// Run the imputation cascade over a copy of the raw table. Re-running
    /// discards any applied price updates.
    pub fn clean(&mut self) -> AnalysisResult<&ImputationReport> {
        let mut rng = self.rng_bank.for_stream(StreamSlot::DateFill);
        let cleaned = imputation::clean(
            self.raw.table.clone(),
            &mut rng,
            self.clock.today(),
            &self.config.imputation,
        )?;
        let (_, report) = self.cleaned.insert(cleaned);
        Ok(&*report)
    }

    fn cleaned_table(&mut self) -> AnalysisResult<&RecordTable> {
        if self.cleaned.is_none() {
            self.clean()?;
        }
        self.cleaned
            .as_ref()
            .map(|(table, _)| table)
            .ok_or(AnalysisError::EmptyInput)
    }

    pub fn price_advice(&mut self) -> AnalysisResult<Vec<PriceProposal>> {
        let policy = self.config.pricing.clone();
        Ok(pricing::advise(self.cleaned_table()?, &policy))
    }

    pub fn propose_pricing(&mut self) -> AnalysisResult<PriceUpdates> {
        let policy = self.config.pricing.clone();
        Ok(pricing::propose_pricing(self.cleaned_table()?, &policy))
    }

    /// Write proposed prices back onto the cleaned table.
    pub fn apply_prices(&mut self, updates: &PriceUpdates) -> AnalysisResult<()> {
        let repriced = pricing::apply_price_updates(self.cleaned_table()?, updates);
        if let Some((table, _)) = self.cleaned.as_mut() {
            *table = repriced;
        }
        Ok(())
    }

    pub fn recommend(&mut self, customer_id: CustomerId, n: usize) -> AnalysisResult<Vec<ProductName>> {
        let config = self.config.recommender.clone();
        Ok(recommender::recommend(self.cleaned_table()?, customer_id, n, &config))
    }

    /// Save the raw dataset as a snapshot document.
    pub fn write_snapshot(&self, path: impl AsRef<Path>) -> AnalysisResult<()> {
        DatasetSnapshot::from_dataset(&self.raw).save(path)
    }

    /// Every report over the current cleaned table. Recommendations are
    /// included for `customer` when given.
    pub fn bundle(&mut self, customer: Option<CustomerId>) -> AnalysisResult<ReportBundle> {
        self.cleaned_table()?;
        let price_updates = self.price_advice()?;
        let recommendations = match customer {
            Some(customer_id) => {
                let n = self.config.recommender.recommendations;
                let products = self.recommend(customer_id, n)?;
                Some(CustomerRecommendations {
                    customer_id,
                    customer_name: self.raw.customer(customer_id).map(|c| c.name.clone()),
                    products,
                })
            }
            None => None,
        };

        let cleaning_comparison = self
            .imputation_report()
            .map(ImputationReport::comparison)
            .unwrap_or_default();
        let missing_data_report = reports::missing_data_report(&self.raw.table);
        let report_config = &self.config.reports;
        let table = self.cleaned().ok_or(AnalysisError::EmptyInput)?;
        let spend_tiers = reports::spend_tiers(table);

        let bundle = ReportBundle {
            run_id:                     self.run_id.clone(),
            generated_on:               self.clock.today(),
            source:                     self.source,
            top_products:               reports::top_products(table, report_config.top_products),
            category_prices:            reports::category_price_stats(table),
            category_sales:             reports::category_sales(table),
            recent_sales:               reports::recent_sales(table, report_config.recent_window_days),
            payment_analysis:           reports::payment_breakdown(table),
            missing_data_report,
            cleaning_comparison,
            price_updates,
            spend_tier_counts:          reports::spend_tier_counts(&spend_tiers),
            spend_tiers,
            demographics:               reports::demographics(table, &self.raw.customers),
            price_quantity_correlation: reports::price_quantity_correlation(table),
            recommendations,
        };
        log::info!(
            "engine: bundle ready ({} top products, {} price proposals)",
            bundle.top_products.len(),
            bundle.price_updates.len()
        );
        Ok(bundle)
    }
}
