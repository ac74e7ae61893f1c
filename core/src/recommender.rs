//! Affinity recommender: products related to a customer's purchase history,
//! scored by cosine similarity over customer satisfaction vectors.
//!
//! The satisfaction matrix is dense. A customer who never bought a product
//! contributes 0 to that product's column, which reads "no signal" as
//! maximal dissimilarity instead of excluding the pair from the dot product.
//!
//! Both matrices are rebuilt on every request; nothing is cached between
//! calls. Rows (customers) and columns (products) are in ascending order.

use crate::{
    config::RecommenderConfig,
    record::RecordTable,
    stats,
    types::{CustomerId, ProductName},
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// customers × products, cell = mean satisfaction score, 0 when never bought.
#[derive(Debug, Clone, PartialEq)]
pub struct SatisfactionMatrix {
    pub customers: Vec<CustomerId>,
    pub products:  Vec<ProductName>,
    cells:         Vec<f64>,
}

impl SatisfactionMatrix {
    pub fn build(table: &RecordTable) -> Self {
        let mut scores: BTreeMap<(CustomerId, &str), Vec<f64>> = BTreeMap::new();
        let mut customers: BTreeSet<CustomerId> = BTreeSet::new();
        let mut products: BTreeSet<&str> = BTreeSet::new();

        for record in table.iter() {
            let (Some(customer), Some(product), Some(score)) =
                (record.customer_id, record.product_name.as_deref(), record.satisfaction_score)
            else {
                continue;
            };
            customers.insert(customer);
            products.insert(product);
            scores.entry((customer, product)).or_default().push(score);
        }

        let customers: Vec<CustomerId> = customers.into_iter().collect();
        let products: Vec<&str> = products.into_iter().collect();
        let mut cells = vec![0.0; customers.len() * products.len()];
        for (row, customer) in customers.iter().enumerate() {
            for (col, product) in products.iter().enumerate() {
                if let Some(mean) = scores.get(&(*customer, *product)).and_then(|s| stats::mean(s.iter().copied())) {
                    cells[row * products.len() + col] = mean;
                }
            }
        }

        Self {
            customers,
            products: products.into_iter().map(str::to_string).collect(),
            cells,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.products.len() + col]
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.customers.len()).map(|row| self.get(row, col)).collect()
    }
}

/// Cosine of the angle between two vectors; 0 when either has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// products × products, symmetric. The diagonal is exactly 1.0 for any
/// product with a non-zero column and 0.0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    pub products: Vec<ProductName>,
    values:       Vec<f64>,
}

impl SimilarityMatrix {
    pub fn from_satisfaction(matrix: &SatisfactionMatrix) -> Self {
        let n = matrix.products.len();
        let columns: Vec<Vec<f64>> = (0..n).map(|c| matrix.column(c)).collect();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            let non_zero = columns[i].iter().any(|v| *v != 0.0);
            values[i * n + i] = if non_zero { 1.0 } else { 0.0 };
            for j in (i + 1)..n {
                let sim = cosine_similarity(&columns[i], &columns[j]);
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }
        Self {
            products: matrix.products.clone(),
            values,
        }
    }

    pub fn build(table: &RecordTable) -> Self {
        Self::from_satisfaction(&SatisfactionMatrix::build(table))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.products.len() + j]
    }

    pub fn index_of(&self, product: &str) -> Option<usize> {
        self.products.binary_search_by(|p| p.as_str().cmp(product)).ok()
    }

    /// Similarity of two products by name, if both have a column.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.get(self.index_of(a)?, self.index_of(b)?))
    }

    /// Top `k` other products by similarity, descending. Equal scores are
    /// ordered by product name so results are reproducible.
    pub fn neighbours(&self, product: &str, k: usize) -> Vec<(ProductName, f64)> {
        let Some(i) = self.index_of(product) else {
            return Vec::new();
        };
        let mut ranked: Vec<(usize, f64)> = (0..self.len())
            .filter(|&j| j != i)
            .map(|j| (j, self.get(i, j)))
            .collect();
        ranked.sort_by(|(ja, sa), (jb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.products[*ja].cmp(&self.products[*jb]))
        });
        ranked
            .into_iter()
            .take(k)
            .map(|(j, s)| (self.products[j].clone(), s))
            .collect()
    }
}

/// Up to `n` products related to what `customer_id` has bought.
///
/// Purchased products are visited in name order; each contributes its top
/// `neighbours_per_seed` neighbours. Candidates are deduplicated keeping the
/// first occurrence. A product the customer already owns is kept when it is
/// a neighbour of another purchased product, unless `exclude_purchased` is
/// set. An unknown customer or empty history yields an empty list.
pub fn recommend(
    table: &RecordTable,
    customer_id: CustomerId,
    n: usize,
    config: &RecommenderConfig,
) -> Vec<ProductName> {
    let purchased: BTreeSet<&str> = table
        .for_customer(customer_id)
        .filter_map(|r| r.product_name.as_deref())
        .collect();
    if purchased.is_empty() {
        log::debug!("recommender: customer {customer_id} has no purchase history");
        return Vec::new();
    }

    let similarity = SimilarityMatrix::build(table);
    let mut seen: BTreeSet<ProductName> = BTreeSet::new();
    let mut out: Vec<ProductName> = Vec::new();

    for seed in &purchased {
        for (candidate, _) in similarity.neighbours(seed, config.neighbours_per_seed) {
            if config.exclude_purchased && purchased.contains(candidate.as_str()) {
                continue;
            }
            if seen.insert(candidate.clone()) {
                out.push(candidate);
            }
        }
    }
    out.truncate(n);

    log::debug!(
        "recommender: customer {customer_id} -> {} recommendations from {} purchased products",
        out.len(),
        purchased.len()
    );
    out
}
