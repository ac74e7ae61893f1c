use shoplens_core::{
    config::PricingPolicy,
    pricing::{self, ProposalReason},
    record::{RecordTable, SaleRecord},
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn sale(id: u64, product: &str, category: &str, price: f64, quantity: u32) -> SaleRecord {
    let mut r = SaleRecord::empty(id, 1);
    r.product_name = Some(product.into());
    r.category = Some(category.into());
    r.price = Some(price);
    r.quantity = Some(quantity);
    r
}

fn table(records: Vec<SaleRecord>) -> RecordTable {
    RecordTable::new(records)
}

// ── Band rules ──────────────────────────────────────────────────────────────

#[test]
fn products_outside_the_band_move_toward_the_category_mean() {
    // Category mean = (100 + 100 + 400) / 3 = 200, band [160, 240].
    let t = table(vec![
        sale(1, "Mouse", "Electronics", 100.0, 1),
        sale(2, "Keyboard", "Electronics", 100.0, 1),
        sale(3, "Laptop", "Electronics", 400.0, 1),
    ]);

    let proposals = pricing::advise(&t, &PricingPolicy::default());
    let updates = pricing::propose_pricing(&t, &PricingPolicy::default());

    assert_eq!(updates.get("Mouse"), Some(&180.0));
    assert_eq!(updates.get("Keyboard"), Some(&180.0));
    assert_eq!(updates.get("Laptop"), Some(&220.0));

    let laptop = proposals.iter().find(|p| p.product_name == "Laptop").unwrap();
    assert_eq!(laptop.reason, ProposalReason::AboveBand);
    assert_eq!(laptop.category_mean, Some(200.0));
    let mouse = proposals.iter().find(|p| p.product_name == "Mouse").unwrap();
    assert_eq!(mouse.reason, ProposalReason::BelowBand);
}

#[test]
fn overpriced_product_is_proposed_below_its_own_average() {
    for threshold in [0.1, 0.2, 0.5] {
        let policy = PricingPolicy { threshold, ..PricingPolicy::default() };
        let t = table(vec![
            sale(1, "Pen", "Stationery", 2.0, 1),
            sale(2, "Notebook", "Stationery", 3.0, 1),
            sale(3, "Calculator", "Stationery", 40.0, 1),
        ]);
        let updates = pricing::propose_pricing(&t, &policy);
        let proposed = updates["Calculator"];
        assert!(proposed < 40.0, "threshold {threshold}: proposed {proposed} not below average 40");
    }
}

#[test]
fn prices_are_rounded_to_cents() {
    let t = table(vec![
        sale(1, "Pen", "Stationery", 1.0, 1),
        sale(2, "Notebook", "Stationery", 1.0, 1),
        sale(3, "Planner", "Stationery", 10.0, 1),
    ]);
    // mean = 4.0, above-band proposal = 4.4
    let updates = pricing::propose_pricing(&t, &PricingPolicy::default());
    for price in updates.values() {
        assert_eq!(*price, (price * 100.0).round() / 100.0, "{price} is not rounded to cents");
    }
    assert_eq!(updates["Planner"], 4.4);
}

// ── Nudges ──────────────────────────────────────────────────────────────────

#[test]
fn in_band_nudges_stop_at_the_cap() {
    let names = ["A", "B", "C", "D", "E", "F", "G"];
    let t = table(
        names
            .iter()
            .enumerate()
            .map(|(i, n)| sale(i as u64 + 1, n, "Toys", 100.0, 1))
            .collect(),
    );

    let proposals = pricing::advise(&t, &PricingPolicy::default());
    assert_eq!(proposals.len(), 5, "nudge cap is 5");
    let nudged: Vec<&str> = proposals.iter().map(|p| p.product_name.as_str()).collect();
    assert_eq!(nudged, vec!["A", "B", "C", "D", "E"], "nudges follow name order");
    assert!(proposals.iter().all(|p| p.reason == ProposalReason::Nudge));
    assert!(proposals.iter().all(|p| p.proposed_price == 105.0), "avg == mean nudges up");
}

#[test]
fn in_band_product_above_mean_is_nudged_down() {
    // mean = 100, band [80, 120]; both in band.
    let t = table(vec![sale(1, "Doll", "Toys", 110.0, 1), sale(2, "Puzzle", "Toys", 90.0, 1)]);
    let updates = pricing::propose_pricing(&t, &PricingPolicy::default());
    assert_eq!(updates["Doll"], 104.5);
    assert_eq!(updates["Puzzle"], 94.5);
}

// ── Fallback ────────────────────────────────────────────────────────────────

#[test]
fn best_seller_is_uplifted_when_nothing_else_is_proposed() {
    let policy = PricingPolicy { nudge_cap: 0, ..PricingPolicy::default() };
    let t = table(vec![
        sale(1, "Doll", "Toys", 100.0, 3),
        sale(2, "Puzzle", "Toys", 100.0, 5),
        sale(3, "Board Game", "Toys", 100.0, 5),
    ]);

    let proposals = pricing::advise(&t, &policy);
    assert_eq!(proposals.len(), 1);
    let p = &proposals[0];
    assert_eq!(p.reason, ProposalReason::BestSellerUplift);
    assert_eq!(p.product_name, "Board Game", "quantity tie goes to the smallest name");
    assert_eq!(p.proposed_price, 110.0);
}

#[test]
fn empty_table_gets_no_proposals() {
    assert!(pricing::propose_pricing(&RecordTable::default(), &PricingPolicy::default()).is_empty());
}

// ── Output map ──────────────────────────────────────────────────────────────

#[test]
fn product_in_two_categories_keeps_the_last_proposal() {
    // Clothing: mean 55 -> Bag below band (49.5). Stationery: mean 6 -> Bag above band (6.6).
    let t = table(vec![
        sale(1, "Bag", "Clothing", 10.0, 1),
        sale(2, "Shirt", "Clothing", 100.0, 1),
        sale(3, "Bag", "Stationery", 10.0, 1),
        sale(4, "Pen", "Stationery", 2.0, 1),
    ]);

    let proposals = pricing::advise(&t, &PricingPolicy::default());
    let bag: Vec<f64> = proposals
        .iter()
        .filter(|p| p.product_name == "Bag")
        .map(|p| p.proposed_price)
        .collect();
    assert_eq!(bag, vec![49.5, 6.6]);

    let updates = pricing::propose_pricing(&t, &PricingPolicy::default());
    assert_eq!(updates["Bag"], 6.6, "Stationery is visited after Clothing");
}

#[test]
fn applying_updates_reprices_every_record_of_the_product() {
    let t = table(vec![
        sale(1, "Laptop", "Electronics", 900.0, 1),
        sale(2, "Laptop", "Electronics", 1100.0, 1),
        sale(3, "Mouse", "Electronics", 20.0, 1),
    ]);
    let mut updates = pricing::PriceUpdates::new();
    updates.insert("Laptop".into(), 950.0);

    let repriced = pricing::apply_price_updates(&t, &updates);

    assert_eq!(repriced.records[0].price, Some(950.0));
    assert_eq!(repriced.records[1].price, Some(950.0));
    assert_eq!(repriced.records[2].price, Some(20.0), "other products untouched");
    assert_eq!(t.records[0].price, Some(900.0), "input table untouched");
}
