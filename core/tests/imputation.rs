use chrono::{Duration, NaiveDate};
use shoplens_core::{
    config::{AnalysisConfig, ImputationConfig},
    error::AnalysisError,
    generator,
    imputation::{self, ImputationReport},
    record::{Field, Gender, RecordTable, SaleRecord},
    rng::{RngBank, StreamRng, StreamSlot},
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn date_rng() -> StreamRng {
    RngBank::new(42).for_stream(StreamSlot::DateFill)
}

/// A record with every column populated.
fn sale(id: u64, customer: i64, product: &str, category: &str, price: f64) -> SaleRecord {
    SaleRecord {
        id,
        customer_id:        Some(customer),
        product_name:       Some(product.into()),
        category:           Some(category.into()),
        price:              Some(price),
        purchase_date:      NaiveDate::from_ymd_opt(2024, 5, 1),
        quantity:           Some(2),
        satisfaction_score: Some(4.0),
        payment_method:     Some("Credit Card".into()),
        shipping_cost:      Some(5.0),
        discount_applied:   Some(false),
        customer_gender:    Some(Gender::Female),
    }
}

fn clean(records: Vec<SaleRecord>) -> Result<(RecordTable, ImputationReport), AnalysisError> {
    imputation::clean(
        RecordTable::new(records),
        &mut date_rng(),
        reference_date(),
        &ImputationConfig::default(),
    )
}

fn find(table: &RecordTable, id: u64) -> &SaleRecord {
    table.iter().find(|r| r.id == id).unwrap()
}

// ── Invariants ──────────────────────────────────────────────────────────────

#[test]
fn cleaned_generated_dataset_has_no_nulls() {
    let config = AnalysisConfig::default_test();
    let dataset = generator::generate(&RngBank::new(2024), &config.generator, reference_date());
    assert!(dataset.table.total_nulls() > 0, "generator should inject missing values");

    let (cleaned, report) = imputation::clean(
        dataset.table,
        &mut date_rng(),
        reference_date(),
        &config.imputation,
    )
    .unwrap();

    assert_eq!(cleaned.total_nulls(), 0, "no column may stay null after cleaning");
    assert!(report.nulls_after.values().all(|n| *n == 0));
    assert_eq!(report.rows_after, cleaned.len());
    assert!(report.total_filled() > 0);
}

#[test]
fn cleaning_is_idempotent() {
    let config = AnalysisConfig::default_test();
    let dataset = generator::generate(&RngBank::new(5), &config.generator, reference_date());

    let (once, _) = imputation::clean(dataset.table, &mut date_rng(), reference_date(), &config.imputation).unwrap();
    let (twice, report) =
        imputation::clean(once.clone(), &mut date_rng(), reference_date(), &config.imputation).unwrap();

    assert_eq!(once, twice, "cleaning a clean table must change nothing");
    assert_eq!(report.total_filled(), 0);
    assert_eq!(report.rows_purged, 0);
}

#[test]
fn callers_copy_keeps_its_nulls() {
    let mut sparse = sale(2, 1, "Laptop", "Electronics", 900.0);
    sparse.price = None;
    let raw = RecordTable::new(vec![sale(1, 1, "Laptop", "Electronics", 1000.0), sparse]);

    let (_cleaned, _) = imputation::clean(raw.clone(), &mut date_rng(), reference_date(), &ImputationConfig::default()).unwrap();

    assert_eq!(raw.records[1].price, None, "caller's copy keeps its nulls");
}

// ── Row purge ───────────────────────────────────────────────────────────────

#[test]
fn rows_with_more_than_half_nulls_are_purged() {
    // 6 of 12 nulls: kept.
    let mut half = sale(2, 1, "Laptop", "Electronics", 1.0);
    half.price = None;
    half.purchase_date = None;
    half.quantity = None;
    half.satisfaction_score = None;
    half.payment_method = None;
    half.shipping_cost = None;
    assert_eq!(half.null_count(), 6);

    // 7 of 12 nulls: dropped.
    let mut sparse = half.clone();
    sparse.id = 3;
    sparse.discount_applied = None;
    assert_eq!(sparse.null_count(), 7);

    let (cleaned, report) = clean(vec![sale(1, 1, "Laptop", "Electronics", 1000.0), half, sparse]).unwrap();

    let ids: Vec<u64> = cleaned.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(report.rows_purged, 1);
    assert_eq!(report.rows_before, 3);
}

#[test]
fn purge_ratio_is_configurable() {
    let mut record = sale(1, 1, "Pen", "Stationery", 2.0);
    record.shipping_cost = None;
    record.discount_applied = None;
    let strict = imputation::purge_sparse_rows(vec![record.clone()], 0.1);
    assert!(strict.is_empty(), "2 nulls exceed 10% of 12 fields");
    let lenient = imputation::purge_sparse_rows(vec![record], 0.5);
    assert_eq!(lenient.len(), 1);
}

// ── Fallback chains ─────────────────────────────────────────────────────────

#[test]
fn price_falls_back_to_category_mean_before_global_mean() {
    let mut own_product = sale(5, 1, "Laptop", "Electronics", 0.0);
    own_product.price = None;
    let mut unseen_product = sale(6, 1, "Camera", "Electronics", 0.0);
    unseen_product.price = None;

    let (cleaned, report) = clean(vec![
        sale(1, 1, "Laptop", "Electronics", 100.0),
        sale(2, 2, "Laptop", "Electronics", 200.0),
        sale(3, 2, "Monitor", "Electronics", 1000.0),
        sale(4, 3, "Pen", "Stationery", 10.0),
        own_product,
        unseen_product,
    ])
    .unwrap();

    assert_eq!(find(&cleaned, 5).price, Some(150.0), "product mean comes first");
    let category_mean = (100.0 + 200.0 + 1000.0) / 3.0;
    let filled = find(&cleaned, 6).price.unwrap();
    assert!(
        (filled - category_mean).abs() < 1e-9,
        "expected the Electronics mean {category_mean}, got {filled}"
    );
    assert_eq!(report.strategy_hits.get("price.product_mean"), Some(&1));
    assert_eq!(report.strategy_hits.get("price.category_mean"), Some(&1));
    assert_eq!(report.strategy_hits.get("price.global_mean"), None);
}

#[test]
fn price_falls_back_to_global_mean_for_unknown_category() {
    let mut orphan = sale(3, 1, "Widget", "Gadgets", 0.0);
    orphan.price = None;
    let (cleaned, report) = clean(vec![
        sale(1, 1, "Laptop", "Electronics", 100.0),
        sale(2, 1, "Pen", "Stationery", 10.0),
        orphan,
    ])
    .unwrap();

    assert_eq!(find(&cleaned, 3).price, Some(55.0));
    assert_eq!(report.strategy_hits.get("price.global_mean"), Some(&1));
}

#[test]
fn product_name_takes_category_mode_with_lexicographic_ties() {
    let mut nameless_books = sale(4, 1, "", "Books", 20.0);
    nameless_books.product_name = None;
    let mut nameless_toys = sale(7, 1, "", "Toys", 20.0);
    nameless_toys.product_name = None;

    let (cleaned, _) = clean(vec![
        sale(1, 1, "Novel", "Books", 20.0),
        sale(2, 2, "Novel", "Books", 22.0),
        sale(3, 2, "Atlas", "Books", 25.0),
        nameless_books,
        sale(5, 3, "Puzzle", "Toys", 30.0),
        sale(6, 3, "Doll", "Toys", 40.0),
        nameless_toys,
    ])
    .unwrap();

    assert_eq!(find(&cleaned, 4).product_name.as_deref(), Some("Novel"));
    assert_eq!(find(&cleaned, 7).product_name.as_deref(), Some("Doll"), "tie goes to the smallest name");
}

#[test]
fn category_uses_imputed_product_name() {
    let mut both_missing = sale(3, 1, "", "", 20.0);
    both_missing.product_name = None;
    both_missing.category = None;

    let (cleaned, report) = clean(vec![
        sale(1, 1, "Novel", "Books", 20.0),
        sale(2, 2, "Novel", "Books", 22.0),
        both_missing,
    ])
    .unwrap();

    let filled = find(&cleaned, 3);
    assert_eq!(filled.product_name.as_deref(), Some("Novel"));
    assert_eq!(filled.category.as_deref(), Some("Books"));
    assert_eq!(report.strategy_hits.get("product_name.global_mode"), Some(&1));
    assert_eq!(report.strategy_hits.get("category.product_mode"), Some(&1));
}

#[test]
fn quantity_takes_rounded_product_median() {
    let mut a = sale(1, 1, "Pen", "Stationery", 2.0);
    a.quantity = Some(1);
    let mut b = sale(2, 1, "Pen", "Stationery", 2.0);
    b.quantity = Some(2);
    let mut missing = sale(3, 1, "Pen", "Stationery", 2.0);
    missing.quantity = None;

    let (cleaned, _) = clean(vec![a, b, missing]).unwrap();
    assert_eq!(find(&cleaned, 3).quantity, Some(2), "median 1.5 rounds half away from zero");
}

#[test]
fn satisfaction_takes_product_mean() {
    let mut a = sale(1, 1, "Pen", "Stationery", 2.0);
    a.satisfaction_score = Some(3.0);
    let mut b = sale(2, 2, "Pen", "Stationery", 2.0);
    b.satisfaction_score = Some(5.0);
    let mut missing = sale(3, 3, "Pen", "Stationery", 2.0);
    missing.satisfaction_score = None;

    let (cleaned, _) = clean(vec![a, b, missing, sale(4, 1, "Novel", "Books", 10.0)]).unwrap();
    assert_eq!(find(&cleaned, 3).satisfaction_score, Some(4.0));
}

#[test]
fn missing_dates_fall_inside_the_recent_window() {
    let records: Vec<SaleRecord> = (1..=50)
        .map(|id| {
            let mut r = sale(id, 1, "Pen", "Stationery", 2.0);
            if id % 2 == 0 {
                r.purchase_date = None;
            }
            r
        })
        .collect();

    let (cleaned, report) = clean(records).unwrap();
    let earliest = reference_date() - Duration::days(89);
    for r in cleaned.iter().filter(|r| r.id % 2 == 0) {
        let d = r.purchase_date.unwrap();
        assert!(d >= earliest && d <= reference_date(), "date {d} outside window");
    }
    assert_eq!(report.strategy_hits.get("purchase_date.random_recent"), Some(&25));
}

#[test]
fn payment_method_and_sentinels_are_filled() {
    let mut r = sale(3, 1, "Pen", "Stationery", 2.0);
    r.payment_method = None;
    r.shipping_cost = None;
    r.discount_applied = None;
    r.customer_gender = None;
    let mut other = sale(2, 1, "Pen", "Stationery", 2.0);
    other.payment_method = Some("Mobile Payment".into());

    let (cleaned, _) = clean(vec![sale(1, 1, "Pen", "Stationery", 2.0), other, r]).unwrap();
    let filled = find(&cleaned, 3);
    assert_eq!(filled.payment_method.as_deref(), Some("Credit Card"), "tie broken lexicographically");
    assert_eq!(filled.shipping_cost, Some(0.0));
    assert_eq!(filled.discount_applied, Some(false));
    assert_eq!(filled.customer_gender, Some(Gender::Unspecified));
}

#[test]
fn feed_without_payment_column_takes_the_sentinel() {
    let records: Vec<SaleRecord> = (1..=2)
        .map(|id| {
            let mut r = sale(id, 1, "Pen", "Stationery", 2.0);
            r.payment_method = None;
            r
        })
        .collect();

    let (cleaned, report) = clean(records).unwrap();
    for r in cleaned.iter() {
        assert_eq!(r.payment_method.as_deref(), Some(imputation::UNSPECIFIED_PAYMENT));
    }
    assert_eq!(report.strategy_hits.get("payment_method.sentinel"), Some(&2));
    assert_eq!(cleaned.total_nulls(), 0);
}

#[test]
fn huge_date_window_stays_on_the_calendar() {
    let mut r = sale(2, 1, "Pen", "Stationery", 2.0);
    r.purchase_date = None;
    let config = ImputationConfig { date_window_days: i64::MAX, ..ImputationConfig::default() };

    let (cleaned, _) = imputation::clean(
        RecordTable::new(vec![sale(1, 1, "Pen", "Stationery", 2.0), r]),
        &mut date_rng(),
        reference_date(),
        &config,
    )
    .unwrap();
    let d = find(&cleaned, 2).purchase_date.unwrap();
    assert!(d <= reference_date(), "date {d} after the reference date");
}

// ── Rows without a customer ─────────────────────────────────────────────────

#[test]
fn rows_without_customer_are_dropped_and_counted() {
    let mut orphan = sale(2, 1, "Pen", "Stationery", 2.0);
    orphan.customer_id = None;

    let (cleaned, report) = clean(vec![sale(1, 1, "Pen", "Stationery", 2.0), orphan]).unwrap();
    assert_eq!(cleaned.len(), 1);
    assert_eq!(find(&cleaned, 1).customer_id, Some(1));
    assert_eq!(report.rows_missing_customer, 1);
    assert_eq!(report.rows_purged, 0, "orphans are not counted as sparse rows");
    assert_eq!(report.rows_after, 1);
    assert_eq!(report.nulls_before.get(&Field::CustomerId), Some(&1));
    assert_eq!(report.nulls_after.get(&Field::CustomerId), Some(&0));
}

#[test]
fn table_of_only_orphans_is_empty_input() {
    let mut r = sale(1, 1, "Pen", "Stationery", 2.0);
    r.customer_id = None;
    assert!(matches!(clean(vec![r]), Err(AnalysisError::EmptyInput)));
}

// ── Failures ────────────────────────────────────────────────────────────────

#[test]
fn all_null_prices_are_a_data_quality_error() {
    let records: Vec<SaleRecord> = (1..=4)
        .map(|id| {
            let mut r = sale(id, 1, "Pen", "Stationery", 0.0);
            r.price = None;
            r
        })
        .collect();

    let err = clean(records).unwrap_err();
    assert!(
        matches!(err, AnalysisError::DataQuality { field: "price" }),
        "expected a price data-quality error, got {err:?}"
    );
}

#[test]
fn empty_table_is_empty_input() {
    assert!(matches!(clean(Vec::new()), Err(AnalysisError::EmptyInput)));
}

#[test]
fn fully_purged_table_is_empty_input() {
    let records = vec![SaleRecord::empty(1, 1), SaleRecord::empty(2, 2)];
    assert!(matches!(clean(records), Err(AnalysisError::EmptyInput)));
}

#[test]
fn comparison_lists_only_fields_that_had_nulls() {
    let mut r = sale(2, 1, "Pen", "Stationery", 2.0);
    r.price = None;
    let (_, report) = clean(vec![sale(1, 1, "Pen", "Stationery", 2.0), r]).unwrap();

    let rows = report.comparison();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].field, Field::Price);
    assert_eq!((rows[0].before, rows[0].after, rows[0].filled), (1, 0, 1));
}
