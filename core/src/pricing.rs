//! Pricing advisor: flags products whose average price has drifted from
//! their category norm and proposes a corrective price.
//!
//! Categories are visited in ascending label order and products within a
//! category in ascending name order. The order matters only for the in-band
//! nudge, which stops once `nudge_cap` nudges have been issued run-wide.

use crate::{
    config::PricingPolicy,
    record::RecordTable,
    stats,
    types::ProductName,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Product name -> proposed price. Ephemeral; only `apply_price_updates`
/// writes it back onto records.
pub type PriceUpdates = BTreeMap<ProductName, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalReason {
    /// Average below the band: move up to a fraction of the category mean.
    BelowBand,
    /// Average above the band: move to a multiple of the category mean.
    AboveBand,
    /// Inside the band: small nudge toward the mean.
    Nudge,
    /// Nothing else proposed: uplift the best seller.
    BestSellerUplift,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceProposal {
    pub product_name:   ProductName,
    pub category:       Option<String>,
    pub average_price:  f64,
    pub category_mean:  Option<f64>,
    pub proposed_price: f64,
    pub reason:         ProposalReason,
}

/// All proposals in the order they were made.
pub fn advise(table: &RecordTable, policy: &PricingPolicy) -> Vec<PriceProposal> {
    // category -> product -> prices
    let mut by_category: BTreeMap<&str, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    for record in table.iter() {
        if let (Some(category), Some(product), Some(price)) =
            (record.category.as_deref(), record.product_name.as_deref(), record.price)
        {
            by_category
                .entry(category)
                .or_default()
                .entry(product)
                .or_default()
                .push(price);
        }
    }

    let mut proposals: Vec<PriceProposal> = Vec::new();
    let mut nudges = 0usize;

    for (category, products) in &by_category {
        let Some(mean_price) = stats::mean(products.values().flatten().copied()) else {
            continue;
        };
        let low = mean_price * (1.0 - policy.threshold);
        let high = mean_price * (1.0 + policy.threshold);

        for (product, prices) in products {
            let Some(avg) = stats::mean(prices.iter().copied()) else {
                continue;
            };

            let (proposed, reason) = if avg < low {
                (mean_price * policy.raise_factor, ProposalReason::BelowBand)
            } else if avg > high {
                (mean_price * policy.lower_factor, ProposalReason::AboveBand)
            } else {
                let already = proposals.iter().any(|p| p.product_name == *product);
                if already || nudges >= policy.nudge_cap {
                    continue;
                }
                nudges += 1;
                let factor = if avg > mean_price {
                    1.0 - policy.nudge_rate
                } else {
                    1.0 + policy.nudge_rate
                };
                (avg * factor, ProposalReason::Nudge)
            };

            proposals.push(PriceProposal {
                product_name:   product.to_string(),
                category:       Some(category.to_string()),
                average_price:  avg,
                category_mean:  Some(mean_price),
                proposed_price: stats::round2(proposed),
                reason,
            });
        }
    }

    if proposals.is_empty() {
        if let Some(fallback) = best_seller_uplift(table, policy) {
            log::info!(
                "pricing: no deviations found, uplifting best seller {} to {:.2}",
                fallback.product_name,
                fallback.proposed_price
            );
            proposals.push(fallback);
        }
    }

    log::info!(
        "pricing: {} proposals across {} categories ({} nudges, threshold={:.2})",
        proposals.len(),
        by_category.len(),
        nudges,
        policy.threshold
    );
    proposals
}

/// Product -> proposed price. A product seen in several categories keeps
/// the last proposal made for it.
pub fn propose_pricing(table: &RecordTable, policy: &PricingPolicy) -> PriceUpdates {
    advise(table, policy)
        .into_iter()
        .map(|p| (p.product_name, p.proposed_price))
        .collect()
}

/// New table with every record of an updated product re-priced.
pub fn apply_price_updates(table: &RecordTable, updates: &PriceUpdates) -> RecordTable {
    let mut repriced = 0usize;
    let out: RecordTable = table
        .iter()
        .cloned()
        .map(|mut r| {
            if let Some(new_price) = r.product_name.as_ref().and_then(|p| updates.get(p)) {
                r.price = Some(*new_price);
                repriced += 1;
            }
            r
        })
        .collect();
    log::info!("pricing: applied {} price updates to {repriced} records", updates.len());
    out
}

/// Highest total quantity wins; ties go to the smallest name.
fn best_seller_uplift(table: &RecordTable, policy: &PricingPolicy) -> Option<PriceProposal> {
    let mut totals: BTreeMap<&str, (u64, Vec<f64>)> = BTreeMap::new();
    for record in table.iter() {
        if let Some(product) = record.product_name.as_deref() {
            let entry = totals.entry(product).or_default();
            entry.0 += u64::from(record.quantity.unwrap_or(0));
            if let Some(price) = record.price {
                entry.1.push(price);
            }
        }
    }

    let mut best: Option<(&str, u64, f64)> = None;
    for (product, (quantity, prices)) in &totals {
        let Some(avg) = stats::mean(prices.iter().copied()) else {
            continue;
        };
        if best.map_or(true, |(_, q, _)| *quantity > q) {
            best = Some((*product, *quantity, avg));
        }
    }

    best.map(|(product, _, avg)| PriceProposal {
        product_name:   product.to_string(),
        category:       None,
        average_price:  avg,
        category_mean:  None,
        proposed_price: stats::round2(avg * (1.0 + policy.fallback_uplift)),
        reason:         ProposalReason::BestSellerUplift,
    })
}
