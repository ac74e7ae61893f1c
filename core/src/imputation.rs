//! Imputation engine: brings every sale record to the "no disallowed nulls"
//! invariant.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   0. Orphan drop      rows without a customer_id
//!   1. Row purge        rows with more than half their fields null
//!   2. product_name     category mode  -> global mode
//!   3. category         product mode   -> global mode
//!   4. price            product mean   -> category mean -> global mean
//!   5. quantity         product median -> global median
//!   6. satisfaction     product mean   -> global mean
//!   7. purchase_date    random day in the window before the reference date
//!   8. payment_method   global mode    -> "unspecified"
//!   9. sentinels        shipping_cost, discount_applied, customer_gender
//!
//! RULES:
//!   - Each step sees the values filled by the steps before it.
//!   - Statistics for a step are computed once, before that step fills
//!     anything, from the non-null values present at that point.
//!   - A chain that runs out of resolvers is a data-quality error, never a
//!     made-up 0 or NaN.
//!   - The only randomness is the date fill, drawn from the caller's stream.

use crate::{
    clock::days_before,
    config::ImputationConfig,
    error::{AnalysisError, AnalysisResult},
    record::{Field, Gender, RecordTable, SaleRecord},
    rng::StreamRng,
    stats,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payment method recorded when the feed carries no payment column at all.
pub const UNSPECIFIED_PAYMENT: &str = "unspecified";

// ── Fallback chain ──────────────────────────────────────────────────────────

type Resolver<'a, T> = Box<dyn Fn(&SaleRecord) -> Option<T> + 'a>;

/// Ordered list of named resolvers. The first one that yields a value wins.
pub struct FallbackChain<'a, T> {
    resolvers: Vec<(&'static str, Resolver<'a, T>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new() -> Self {
        Self { resolvers: Vec::new() }
    }

    /// Append a resolver with lower priority than every one already added.
    pub fn then(mut self, name: &'static str, resolver: impl Fn(&SaleRecord) -> Option<T> + 'a) -> Self {
        self.resolvers.push((name, Box::new(resolver)));
        self
    }

    /// Value from the first resolver that produces one, with its name.
    pub fn resolve(&self, record: &SaleRecord) -> Option<(T, &'static str)> {
        self.resolvers
            .iter()
            .find_map(|(name, resolve)| resolve(record).map(|v| (v, *name)))
    }
}

impl<T> Default for FallbackChain<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Report ──────────────────────────────────────────────────────────────────

/// Before/after null counts for observability. Not used for control flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationReport {
    pub rows_before:           usize,
    /// Rows dropped because no customer can be attributed to them.
    #[serde(default)]
    pub rows_missing_customer: usize,
    pub rows_purged:           usize,
    pub rows_after:            usize,
    /// Measured on the input table, before the purge.
    pub nulls_before:          BTreeMap<Field, usize>,
    pub nulls_after:           BTreeMap<Field, usize>,
    /// Fill counts keyed `field.strategy`, e.g. `price.category_mean`.
    pub strategy_hits:         BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field:  Field,
    pub before: usize,
    pub after:  usize,
    /// Nulls removed, whether by a fill or by purging the row.
    pub filled: usize,
}

impl ImputationReport {
    /// One row per field that had any null before cleaning.
    pub fn comparison(&self) -> Vec<FieldComparison> {
        self.nulls_before
            .iter()
            .filter(|(_, before)| **before > 0)
            .map(|(field, before)| {
                let after = self.nulls_after.get(field).copied().unwrap_or(0);
                FieldComparison {
                    field:  *field,
                    before: *before,
                    after,
                    filled: before.saturating_sub(after),
                }
            })
            .collect()
    }

    pub fn total_filled(&self) -> usize {
        self.strategy_hits.values().sum()
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Repair a raw table. Consumes the input and returns the cleaned table;
/// callers that need the raw snapshot keep their own copy.
pub fn clean(
    table: RecordTable,
    rng: &mut StreamRng,
    reference_date: NaiveDate,
    config: &ImputationConfig,
) -> AnalysisResult<(RecordTable, ImputationReport)> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let mut report = ImputationReport {
        rows_before: table.len(),
        nulls_before: table.null_counts(),
        ..ImputationReport::default()
    };

    let attributed = drop_orphan_rows(table.records);
    report.rows_missing_customer = report.rows_before - attributed.len();
    if report.rows_missing_customer > 0 {
        log::warn!(
            "imputation: dropped {} of {} rows with no customer_id",
            report.rows_missing_customer,
            report.rows_before
        );
    }

    let mut records = purge_sparse_rows(attributed, config.purge_null_ratio);
    report.rows_purged = report.rows_before - report.rows_missing_customer - records.len();
    if records.is_empty() {
        log::warn!("imputation: no usable rows left out of {}", report.rows_before);
        return Err(AnalysisError::EmptyInput);
    }

    let hits = &mut report.strategy_hits;
    fill_product_names(&mut records, hits)?;
    fill_categories(&mut records, hits)?;
    fill_prices(&mut records, hits)?;
    fill_quantities(&mut records, hits)?;
    fill_satisfaction_scores(&mut records, hits)?;
    fill_purchase_dates(&mut records, rng, reference_date, config.date_window_days, hits);
    fill_payment_methods(&mut records, hits)?;
    fill_sentinels(&mut records, hits);

    let cleaned = RecordTable::new(records);
    report.rows_after = cleaned.len();
    report.nulls_after = cleaned.null_counts();

    log::info!(
        "imputation: {} rows in, {} purged, {} values filled, {} rows out",
        report.rows_before,
        report.rows_purged,
        report.total_filled(),
        report.rows_after
    );
    Ok((cleaned, report))
}

/// Drop rows that cannot be attributed to a customer.
pub fn drop_orphan_rows(records: Vec<SaleRecord>) -> Vec<SaleRecord> {
    records
        .into_iter()
        .filter(|r| {
            if r.customer_id.is_none() {
                log::debug!("imputation: record {} has no customer_id", r.id);
            }
            r.customer_id.is_some()
        })
        .collect()
}

/// Drop rows whose null count exceeds `ratio` of the field count.
pub fn purge_sparse_rows(records: Vec<SaleRecord>, ratio: f64) -> Vec<SaleRecord> {
    let limit = Field::ALL.len() as f64 * ratio;
    records
        .into_iter()
        .filter(|r| {
            let keep = r.null_count() as f64 <= limit;
            if !keep {
                log::debug!("imputation: purging record {} ({} nulls)", r.id, r.null_count());
            }
            keep
        })
        .collect()
}

// ── Per-field steps ─────────────────────────────────────────────────────────

fn fill_product_names(records: &mut [SaleRecord], hits: &mut BTreeMap<String, usize>) -> AnalysisResult<usize> {
    let by_category = group_modes(records, |r| r.category.clone(), |r| r.product_name.clone());
    let global = stats::mode(records.iter().filter_map(|r| r.product_name.clone()));

    let chain = FallbackChain::new()
        .then("category_mode", |r: &SaleRecord| {
            r.category.as_ref().and_then(|c| by_category.get(c)).cloned()
        })
        .then("global_mode", |_: &SaleRecord| global.clone());

    apply_chain(records, Field::ProductName, &chain, |r, v| r.product_name = Some(v), hits)
}

fn fill_categories(records: &mut [SaleRecord], hits: &mut BTreeMap<String, usize>) -> AnalysisResult<usize> {
    let by_product = group_modes(records, |r| r.product_name.clone(), |r| r.category.clone());
    let global = stats::mode(records.iter().filter_map(|r| r.category.clone()));

    let chain = FallbackChain::new()
        .then("product_mode", |r: &SaleRecord| {
            r.product_name.as_ref().and_then(|p| by_product.get(p)).cloned()
        })
        .then("global_mode", |_: &SaleRecord| global.clone());

    apply_chain(records, Field::Category, &chain, |r, v| r.category = Some(v), hits)
}

fn fill_prices(records: &mut [SaleRecord], hits: &mut BTreeMap<String, usize>) -> AnalysisResult<usize> {
    let by_product = group_means(records, |r| r.product_name.clone(), |r| r.price);
    let by_category = group_means(records, |r| r.category.clone(), |r| r.price);
    let global = stats::mean(records.iter().filter_map(|r| r.price));

    let chain = FallbackChain::new()
        .then("product_mean", |r: &SaleRecord| {
            r.product_name.as_ref().and_then(|p| by_product.get(p)).copied()
        })
        .then("category_mean", |r: &SaleRecord| {
            r.category.as_ref().and_then(|c| by_category.get(c)).copied()
        })
        .then("global_mean", |_: &SaleRecord| global);

    apply_chain(records, Field::Price, &chain, |r, v| r.price = Some(v), hits)
}

fn fill_quantities(records: &mut [SaleRecord], hits: &mut BTreeMap<String, usize>) -> AnalysisResult<usize> {
    let by_product = group_medians(records, |r| r.product_name.clone(), |r| r.quantity.map(f64::from));
    let global = stats::median(records.iter().filter_map(|r| r.quantity.map(f64::from)));

    let chain = FallbackChain::new()
        .then("product_median", |r: &SaleRecord| {
            r.product_name.as_ref().and_then(|p| by_product.get(p)).copied()
        })
        .then("global_median", |_: &SaleRecord| global);

    apply_chain(records, Field::Quantity, &chain, |r, v| r.quantity = Some(round_quantity(v)), hits)
}

fn fill_satisfaction_scores(records: &mut [SaleRecord], hits: &mut BTreeMap<String, usize>) -> AnalysisResult<usize> {
    let by_product = group_means(records, |r| r.product_name.clone(), |r| r.satisfaction_score);
    let global = stats::mean(records.iter().filter_map(|r| r.satisfaction_score));

    let chain = FallbackChain::new()
        .then("product_mean", |r: &SaleRecord| {
            r.product_name.as_ref().and_then(|p| by_product.get(p)).copied()
        })
        .then("global_mean", |_: &SaleRecord| global);

    apply_chain(
        records,
        Field::SatisfactionScore,
        &chain,
        |r, v| r.satisfaction_score = Some(v.clamp(1.0, 5.0)),
        hits,
    )
}

/// The one stochastic fill: a day in `[reference - window + 1, reference]`.
fn fill_purchase_dates(
    records: &mut [SaleRecord],
    rng: &mut StreamRng,
    reference_date: NaiveDate,
    window_days: i64,
    hits: &mut BTreeMap<String, usize>,
) -> usize {
    let window = window_days.max(1) as u64;
    let mut filled = 0;
    for record in records.iter_mut().filter(|r| r.purchase_date.is_none()) {
        let days_back = rng.next_u64_below(window) as i64;
        record.purchase_date = Some(days_before(reference_date, days_back));
        filled += 1;
    }
    if filled > 0 {
        *hits.entry("purchase_date.random_recent".into()).or_insert(0) += filled;
        log::debug!(
            "imputation: drew {filled} purchase dates from the {window} days before {reference_date} (stream={})",
            rng.name
        );
    }
    filled
}

fn fill_payment_methods(records: &mut [SaleRecord], hits: &mut BTreeMap<String, usize>) -> AnalysisResult<usize> {
    let global = stats::mode(records.iter().filter_map(|r| r.payment_method.clone()));
    let chain = FallbackChain::new()
        .then("global_mode", |_: &SaleRecord| global.clone())
        .then("sentinel", |_: &SaleRecord| Some(UNSPECIFIED_PAYMENT.to_string()));
    apply_chain(records, Field::PaymentMethod, &chain, |r, v| r.payment_method = Some(v), hits)
}

/// Optional columns take fixed values rather than computed statistics.
fn fill_sentinels(records: &mut [SaleRecord], hits: &mut BTreeMap<String, usize>) {
    for record in records.iter_mut() {
        if record.shipping_cost.is_none() {
            record.shipping_cost = Some(0.0);
            *hits.entry("shipping_cost.sentinel".into()).or_insert(0) += 1;
        }
        if record.discount_applied.is_none() {
            record.discount_applied = Some(false);
            *hits.entry("discount_applied.sentinel".into()).or_insert(0) += 1;
        }
        if record.customer_gender.is_none() {
            record.customer_gender = Some(Gender::Unspecified);
            *hits.entry("customer_gender.sentinel".into()).or_insert(0) += 1;
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn apply_chain<T>(
    records: &mut [SaleRecord],
    field: Field,
    chain: &FallbackChain<'_, T>,
    assign: impl Fn(&mut SaleRecord, T),
    hits: &mut BTreeMap<String, usize>,
) -> AnalysisResult<usize> {
    let mut filled = 0;
    for record in records.iter_mut() {
        if !field.is_null(record) {
            continue;
        }
        let (value, strategy) = chain
            .resolve(record)
            .ok_or(AnalysisError::DataQuality { field: field.name() })?;
        assign(record, value);
        *hits.entry(format!("{}.{strategy}", field.name())).or_insert(0) += 1;
        filled += 1;
    }
    if filled > 0 {
        log::debug!("imputation: filled {filled} {} values", field.name());
    }
    Ok(filled)
}

fn group_values<K: Ord, V>(
    records: &[SaleRecord],
    key: impl Fn(&SaleRecord) -> Option<K>,
    value: impl Fn(&SaleRecord) -> Option<V>,
) -> BTreeMap<K, Vec<V>> {
    let mut groups: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for record in records {
        if let (Some(k), Some(v)) = (key(record), value(record)) {
            groups.entry(k).or_default().push(v);
        }
    }
    groups
}

fn group_modes<K: Ord, V: Ord>(
    records: &[SaleRecord],
    key: impl Fn(&SaleRecord) -> Option<K>,
    value: impl Fn(&SaleRecord) -> Option<V>,
) -> BTreeMap<K, V> {
    group_values(records, key, value)
        .into_iter()
        .filter_map(|(k, vs)| stats::mode(vs).map(|m| (k, m)))
        .collect()
}

fn group_means<K: Ord>(
    records: &[SaleRecord],
    key: impl Fn(&SaleRecord) -> Option<K>,
    value: impl Fn(&SaleRecord) -> Option<f64>,
) -> BTreeMap<K, f64> {
    group_values(records, key, value)
        .into_iter()
        .filter_map(|(k, vs)| stats::mean(vs).map(|m| (k, m)))
        .collect()
}

fn group_medians<K: Ord>(
    records: &[SaleRecord],
    key: impl Fn(&SaleRecord) -> Option<K>,
    value: impl Fn(&SaleRecord) -> Option<f64>,
) -> BTreeMap<K, f64> {
    group_values(records, key, value)
        .into_iter()
        .filter_map(|(k, vs)| stats::median(vs).map(|m| (k, m)))
        .collect()
}

/// Median quantities round half away from zero and never drop below 1.
fn round_quantity(median: f64) -> u32 {
    median.round().max(1.0) as u32
}
