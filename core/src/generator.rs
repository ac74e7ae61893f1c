//! Synthetic dataset generator.
//!
//! Builds a customer roster and a sales table where every customer buys
//! 2–4 distinct products from every category, then degrades it the way a
//! real feed would: a share of sales lose one field, a larger share lose
//! their satisfaction score, and repeat products drift in price.
//!
//! Three independent streams are used (customers, sales, missing values),
//! so tuning the damage pass never changes the clean data underneath it.

use crate::{
    catalog::{CATEGORIES, PAYMENT_METHODS},
    clock::days_before,
    config::GeneratorConfig,
    name_generator::NameGenerator,
    record::{Customer, Dataset, Gender, RecordTable, SaleRecord},
    rng::{RngBank, StreamRng, StreamSlot},
    stats,
    types::RecordId,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Fields the damage pass may blank out (quantity is never touched).
#[derive(Debug, Clone, Copy)]
enum Damage {
    Price,
    ProductName,
    PurchaseDate,
    SatisfactionScore,
}

const DAMAGE_KINDS: [Damage; 4] = [
    Damage::Price,
    Damage::ProductName,
    Damage::PurchaseDate,
    Damage::SatisfactionScore,
];

pub fn generate(bank: &RngBank, config: &GeneratorConfig, reference_date: NaiveDate) -> Dataset {
    let mut customer_rng = bank.for_stream(StreamSlot::Customers);
    let mut sales_rng = bank.for_stream(StreamSlot::Sales);
    let mut damage_rng = bank.for_stream(StreamSlot::MissingValues);

    let customers = generate_customers(&mut customer_rng, config.customers);
    let mut records = generate_sales(&mut sales_rng, &customers, config, reference_date);
    inject_missing_values(&mut damage_rng, &mut records, config);
    vary_prices(&mut damage_rng, &mut records, config.price_variation_rate);

    let table = RecordTable::new(records);
    log::info!(
        "generator: {} customers, {} sales, {} null cells (seed={})",
        customers.len(),
        table.len(),
        table.total_nulls(),
        bank.master_seed()
    );
    Dataset { table, customers }
}

pub fn generate_customers(rng: &mut StreamRng, n: usize) -> Vec<Customer> {
    (1..=n as i64)
        .map(|id| {
            let age = rng.int_between(18, 75) as u32;
            let gender = *rng.pick(&Gender::ALL);
            let name = NameGenerator::full_name(rng, gender);
            let email = NameGenerator::email(&name, id);
            let address = NameGenerator::address(rng);
            Customer { id, name, email, age, gender, address }
        })
        .collect()
}

fn generate_sales(
    rng: &mut StreamRng,
    customers: &[Customer],
    config: &GeneratorConfig,
    reference_date: NaiveDate,
) -> Vec<SaleRecord> {
    let mut records = Vec::new();
    let mut next_id: RecordId = 1;

    for customer in customers {
        for category in CATEGORIES.iter() {
            let k = rng.int_between(
                config.min_products_per_category as i64,
                config.max_products_per_category as i64,
            ) as usize;
            for idx in rng.sample_indices(category.products.len(), k) {
                let days_back = rng.int_between(0, config.history_days.max(0));
                records.push(SaleRecord {
                    id:                 next_id,
                    customer_id:        Some(customer.id),
                    product_name:       Some(category.products[idx].to_string()),
                    category:           Some(category.name.to_string()),
                    price:              Some(stats::round2(rng.uniform(category.min_price, category.max_price))),
                    purchase_date:      Some(days_before(reference_date, days_back)),
                    quantity:           Some(rng.int_between(1, 5) as u32),
                    satisfaction_score: Some((rng.uniform(1.0, 5.0) * 10.0).round() / 10.0),
                    payment_method:     Some(rng.pick(&PAYMENT_METHODS).to_string()),
                    shipping_cost:      Some(stats::round2(rng.uniform(0.0, 50.0))),
                    discount_applied:   Some(rng.chance(0.5)),
                    customer_gender:    Some(customer.gender),
                });
                next_id += 1;
            }
        }
    }
    records
}

fn inject_missing_values(rng: &mut StreamRng, records: &mut [SaleRecord], config: &GeneratorConfig) {
    let n = records.len();

    let damaged = (n as f64 * config.missing_field_rate) as usize;
    for idx in rng.sample_indices(n, damaged) {
        let record = &mut records[idx];
        match *rng.pick(&DAMAGE_KINDS) {
            Damage::Price => record.price = None,
            Damage::ProductName => record.product_name = None,
            Damage::PurchaseDate => record.purchase_date = None,
            Damage::SatisfactionScore => record.satisfaction_score = None,
        }
    }

    let unscored = (n as f64 * config.missing_score_rate) as usize;
    for idx in rng.sample_indices(n, unscored) {
        records[idx].satisfaction_score = None;
    }

    log::debug!("generator: blanked one field on {damaged} sales, score on {unscored} sales");
}

/// Products sold more than once drift by up to ±10% on a share of sales.
fn vary_prices(rng: &mut StreamRng, records: &mut [SaleRecord], rate: f64) {
    let mut by_product: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, r) in records.iter().enumerate() {
        if let Some(p) = &r.product_name {
            by_product.entry(p.clone()).or_default().push(idx);
        }
    }
    for indices in by_product.values().filter(|v| v.len() > 1) {
        for &idx in indices {
            if !rng.chance(rate) {
                continue;
            }
            if let Some(price) = records[idx].price {
                records[idx].price = Some(stats::round2(price * rng.uniform(0.9, 1.1)));
            }
        }
    }
}
