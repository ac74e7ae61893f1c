//! Record store: the in-memory sales table and the customer roster.
//!
//! Every other stage reads from here. Nullable columns are `Option`s so a
//! raw table can carry exactly what the source delivered; after
//! `imputation::clean` only `Some` values remain.

use crate::types::{CustomerId, RecordId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One purchase event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id:                 RecordId,
    /// Feeds occasionally drop the buyer; such rows never survive cleaning.
    pub customer_id:        Option<CustomerId>,
    pub product_name:       Option<String>,
    pub category:           Option<String>,
    pub price:              Option<f64>,
    pub purchase_date:      Option<NaiveDate>,
    pub quantity:           Option<u32>,
    pub satisfaction_score: Option<f64>,
    pub payment_method:     Option<String>,
    pub shipping_cost:      Option<f64>,
    pub discount_applied:   Option<bool>,
    /// Optional demographic column; API feeds usually leave it out.
    #[serde(default)]
    pub customer_gender:    Option<Gender>,
}

impl SaleRecord {
    /// A record with only its keys set. Tests and adapters fill the rest.
    pub fn empty(id: RecordId, customer_id: CustomerId) -> Self {
        Self {
            id,
            customer_id:        Some(customer_id),
            product_name:       None,
            category:           None,
            price:              None,
            purchase_date:      None,
            quantity:           None,
            satisfaction_score: None,
            payment_method:     None,
            shipping_cost:      None,
            discount_applied:   None,
            customer_gender:    None,
        }
    }

    pub fn null_count(&self) -> usize {
        Field::ALL.iter().filter(|f| f.is_null(self)).count()
    }

    /// price × quantity, or 0 while either is missing.
    pub fn line_total(&self) -> f64 {
        match (self.price, self.quantity) {
            (Some(p), Some(q)) => p * q as f64,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unspecified];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unspecified => "unspecified",
        }
    }
}

/// A customer in the roster. Read-only once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id:      CustomerId,
    pub name:    String,
    pub email:   String,
    pub age:     u32,
    pub gender:  Gender,
    pub address: String,
}

/// Columns of the sales table, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    CustomerId,
    ProductName,
    Category,
    Price,
    PurchaseDate,
    Quantity,
    SatisfactionScore,
    PaymentMethod,
    ShippingCost,
    DiscountApplied,
    CustomerGender,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Id,
        Field::CustomerId,
        Field::ProductName,
        Field::Category,
        Field::Price,
        Field::PurchaseDate,
        Field::Quantity,
        Field::SatisfactionScore,
        Field::PaymentMethod,
        Field::ShippingCost,
        Field::DiscountApplied,
        Field::CustomerGender,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CustomerId => "customer_id",
            Self::ProductName => "product_name",
            Self::Category => "category",
            Self::Price => "price",
            Self::PurchaseDate => "purchase_date",
            Self::Quantity => "quantity",
            Self::SatisfactionScore => "satisfaction_score",
            Self::PaymentMethod => "payment_method",
            Self::ShippingCost => "shipping_cost",
            Self::DiscountApplied => "discount_applied",
            Self::CustomerGender => "customer_gender",
        }
    }

    pub fn is_null(&self, record: &SaleRecord) -> bool {
        match self {
            Self::Id => false,
            Self::CustomerId => record.customer_id.is_none(),
            Self::ProductName => record.product_name.is_none(),
            Self::Category => record.category.is_none(),
            Self::Price => record.price.is_none(),
            Self::PurchaseDate => record.purchase_date.is_none(),
            Self::Quantity => record.quantity.is_none(),
            Self::SatisfactionScore => record.satisfaction_score.is_none(),
            Self::PaymentMethod => record.payment_method.is_none(),
            Self::ShippingCost => record.shipping_cost.is_none(),
            Self::DiscountApplied => record.discount_applied.is_none(),
            Self::CustomerGender => record.customer_gender.is_none(),
        }
    }
}

/// The sales table. Owned by one session at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordTable {
    pub records: Vec<SaleRecord>,
}

impl RecordTable {
    pub fn new(records: Vec<SaleRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SaleRecord> {
        self.records.iter()
    }

    /// Null count per column, every column present (zeros included).
    pub fn null_counts(&self) -> BTreeMap<Field, usize> {
        Field::ALL
            .iter()
            .map(|f| (*f, self.records.iter().filter(|r| f.is_null(r)).count()))
            .collect()
    }

    pub fn total_nulls(&self) -> usize {
        self.records.iter().map(SaleRecord::null_count).sum()
    }

    /// Records belonging to one customer.
    pub fn for_customer(&self, customer_id: CustomerId) -> impl Iterator<Item = &SaleRecord> {
        self.records.iter().filter(move |r| r.customer_id == Some(customer_id))
    }

    /// Latest purchase date in the table.
    pub fn latest_purchase_date(&self) -> Option<NaiveDate> {
        self.records.iter().filter_map(|r| r.purchase_date).max()
    }
}

impl FromIterator<SaleRecord> for RecordTable {
    fn from_iter<I: IntoIterator<Item = SaleRecord>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}

impl IntoIterator for RecordTable {
    type Item = SaleRecord;
    type IntoIter = std::vec::IntoIter<SaleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// A loaded batch: the sales table plus the roster it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub table:     RecordTable,
    pub customers: Vec<Customer>,
}

impl Dataset {
    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }
}
