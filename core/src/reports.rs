//! Report aggregator: descriptive rollups over a cleaned table.
//!
//! Mechanical group-by aggregations. Records missing the grouping key or the
//! aggregated column are skipped, so these also run on raw tables.

use crate::{
    clock::days_before,
    record::{Customer, Field, Gender, RecordTable},
    stats,
    types::{CustomerId, ProductName},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ── Output rows ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub product_name: ProductName,
    pub quantity:     u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPriceStats {
    pub category: String,
    pub mean:     f64,
    pub min:      f64,
    pub max:      f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl SpendTier {
    pub const ALL: [SpendTier; 4] = [SpendTier::Low, SpendTier::Medium, SpendTier::High, SpendTier::VeryHigh];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSpend {
    pub customer_id: CustomerId,
    pub total_spend: f64,
    pub tier:        SpendTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub payment_method:    String,
    pub transaction_count: usize,
    pub total_amount:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeSummary {
    pub count: usize,
    pub mean:  f64,
    pub std:   Option<f64>,
    pub min:   f64,
    pub q25:   f64,
    pub q50:   f64,
    pub q75:   f64,
    pub max:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age:        Option<AgeSummary>,
    /// Label -> customer count, bins (18,25], (25,35], ... (65,100].
    pub age_groups: BTreeMap<String, usize>,
    pub genders:    BTreeMap<Gender, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingFieldStat {
    pub field:         Field,
    pub missing_count: usize,
    pub missing_pct:   f64,
}

// ── Reports ─────────────────────────────────────────────────────────────────

/// Sum of quantity per product, best sellers first (ties by name).
pub fn top_products(table: &RecordTable, n: usize) -> Vec<ProductQuantity> {
    let mut rows = quantity_by_product(table, |_| true);
    rows.truncate(n);
    rows
}

/// Mean/min/max price per category.
pub fn category_price_stats(table: &RecordTable) -> Vec<CategoryPriceStats> {
    let mut prices: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in table.iter() {
        if let (Some(c), Some(p)) = (r.category.as_deref(), r.price) {
            prices.entry(c).or_default().push(p);
        }
    }
    prices
        .into_iter()
        .filter_map(|(category, ps)| {
            let mean = stats::mean(ps.iter().copied())?;
            Some(CategoryPriceStats {
                category: category.to_string(),
                mean,
                min: ps.iter().copied().fold(f64::INFINITY, f64::min),
                max: ps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            })
        })
        .collect()
}

/// Quantity per product over the `window_days` ending at the latest
/// purchase date in the table (inclusive).
pub fn recent_sales(table: &RecordTable, window_days: i64) -> Vec<ProductQuantity> {
    let Some(latest) = table.latest_purchase_date() else {
        return Vec::new();
    };
    let start: NaiveDate = days_before(latest, window_days);
    quantity_by_product(table, |d| d.is_some_and(|d| d >= start))
}

/// Quantity per category.
pub fn category_sales(table: &RecordTable) -> BTreeMap<String, u64> {
    let mut out: BTreeMap<String, u64> = BTreeMap::new();
    for r in table.iter() {
        if let (Some(c), Some(q)) = (r.category.as_ref(), r.quantity) {
            *out.entry(c.clone()).or_insert(0) += u64::from(q);
        }
    }
    out
}

/// Per-customer spend (Σ price × quantity) bucketed into quartile tiers.
/// Quartile edges use linear interpolation; a spend equal to an edge falls
/// into the lower tier.
pub fn spend_tiers(table: &RecordTable) -> Vec<CustomerSpend> {
    let mut spend: BTreeMap<CustomerId, f64> = BTreeMap::new();
    for r in table.iter() {
        if let Some(customer_id) = r.customer_id {
            *spend.entry(customer_id).or_insert(0.0) += r.line_total();
        }
    }
    if spend.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<f64> = spend.values().copied().collect();
    sorted.sort_by(f64::total_cmp);
    let edges = [
        stats::quantile_sorted(&sorted, 0.25),
        stats::quantile_sorted(&sorted, 0.50),
        stats::quantile_sorted(&sorted, 0.75),
    ];

    spend
        .into_iter()
        .map(|(customer_id, total_spend)| {
            let idx = edges.iter().take_while(|e| total_spend > **e).count();
            CustomerSpend {
                customer_id,
                total_spend: stats::round2(total_spend),
                tier: SpendTier::ALL[idx],
            }
        })
        .collect()
}

/// Customers per spend tier, every tier present.
pub fn spend_tier_counts(rows: &[CustomerSpend]) -> BTreeMap<SpendTier, usize> {
    let mut counts: BTreeMap<SpendTier, usize> = SpendTier::ALL.iter().map(|t| (*t, 0)).collect();
    for row in rows {
        *counts.entry(row.tier).or_insert(0) += 1;
    }
    counts
}

/// Transaction count and Σ price × quantity per payment method, busiest first.
pub fn payment_breakdown(table: &RecordTable) -> Vec<PaymentSummary> {
    let mut by_method: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for r in table.iter() {
        if let Some(m) = r.payment_method.as_deref() {
            let entry = by_method.entry(m).or_default();
            entry.0 += 1;
            entry.1 += r.line_total();
        }
    }
    let mut rows: Vec<PaymentSummary> = by_method
        .into_iter()
        .map(|(m, (count, total))| PaymentSummary {
            payment_method:    m.to_string(),
            transaction_count: count,
            total_amount:      stats::round2(total),
        })
        .collect();
    rows.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
    rows
}

pub const AGE_GROUPS: [(u32, u32, &str); 6] = [
    (18, 25, "18-24"),
    (25, 35, "25-34"),
    (35, 45, "35-44"),
    (45, 55, "45-54"),
    (55, 65, "55-64"),
    (65, 100, "65+"),
];

/// Age and gender breakdown of the roster customers who appear in the table.
/// A roster gender of `unspecified` is overridden by a concrete gender on the
/// customer's sale records when one is present.
pub fn demographics(table: &RecordTable, customers: &[Customer]) -> Demographics {
    let buyers: BTreeSet<CustomerId> = table.iter().filter_map(|r| r.customer_id).collect();
    let active: Vec<&Customer> = customers.iter().filter(|c| buyers.contains(&c.id)).collect();

    let ages: Vec<f64> = active.iter().map(|c| f64::from(c.age)).collect();
    let age = summarize_ages(&ages);

    let mut age_groups: BTreeMap<String, usize> = AGE_GROUPS.iter().map(|(_, _, l)| (l.to_string(), 0)).collect();
    for c in &active {
        // Bins are right-inclusive: (lo, hi].
        if let Some((_, _, label)) = AGE_GROUPS.iter().find(|(lo, hi, _)| c.age > *lo && c.age <= *hi) {
            *age_groups.entry(label.to_string()).or_insert(0) += 1;
        }
    }

    let mut genders: BTreeMap<Gender, usize> = BTreeMap::new();
    for c in &active {
        let gender = match c.gender {
            Gender::Unspecified => table
                .for_customer(c.id)
                .filter_map(|r| r.customer_gender)
                .find(|g| *g != Gender::Unspecified)
                .unwrap_or(Gender::Unspecified),
            g => g,
        };
        *genders.entry(gender).or_insert(0) += 1;
    }

    Demographics { age, age_groups, genders }
}

/// Pearson r between per-product mean price and total quantity sold.
pub fn price_quantity_correlation(table: &RecordTable) -> Option<f64> {
    let mut per_product: BTreeMap<&str, (Vec<f64>, u64)> = BTreeMap::new();
    for r in table.iter() {
        if let Some(p) = r.product_name.as_deref() {
            let entry = per_product.entry(p).or_default();
            if let Some(price) = r.price {
                entry.0.push(price);
            }
            entry.1 += u64::from(r.quantity.unwrap_or(0));
        }
    }
    let (prices, quantities): (Vec<f64>, Vec<f64>) = per_product
        .values()
        .filter_map(|(ps, q)| stats::mean(ps.iter().copied()).map(|m| (m, *q as f64)))
        .unzip();
    stats::pearson(&prices, &quantities)
}

/// Null count and share per field, most missing first. Fields with no
/// nulls are included so the report always covers the whole schema.
pub fn missing_data_report(table: &RecordTable) -> Vec<MissingFieldStat> {
    let rows = table.len().max(1) as f64;
    let mut out: Vec<MissingFieldStat> = table
        .null_counts()
        .into_iter()
        .map(|(field, missing_count)| MissingFieldStat {
            field,
            missing_count,
            missing_pct: stats::round2(missing_count as f64 / rows * 100.0),
        })
        .collect();
    out.sort_by(|a, b| b.missing_count.cmp(&a.missing_count).then(a.field.cmp(&b.field)));
    out
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn quantity_by_product(
    table: &RecordTable,
    include: impl Fn(Option<NaiveDate>) -> bool,
) -> Vec<ProductQuantity> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for r in table.iter().filter(|r| include(r.purchase_date)) {
        if let (Some(p), Some(q)) = (r.product_name.as_deref(), r.quantity) {
            *totals.entry(p).or_insert(0) += u64::from(q);
        }
    }
    let mut rows: Vec<ProductQuantity> = totals
        .into_iter()
        .map(|(p, quantity)| ProductQuantity {
            product_name: p.to_string(),
            quantity,
        })
        .collect();
    // Stable sort keeps the name order among equal quantities.
    rows.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    rows
}

fn summarize_ages(ages: &[f64]) -> Option<AgeSummary> {
    let mean = stats::mean(ages.iter().copied())?;
    let mut sorted = ages.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(AgeSummary {
        count: ages.len(),
        mean,
        std: stats::sample_std(ages),
        min: sorted[0],
        q25: stats::quantile_sorted(&sorted, 0.25),
        q50: stats::quantile_sorted(&sorted, 0.50),
        q75: stats::quantile_sorted(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}
