//! shoplens-runner: headless batch runner for ShopLens.
//!
//! Usage:
//!   shoplens-runner --seed 12345 --out report.json
//!   shoplens-runner --snapshot data.json --customer 3 --apply-prices
//!   shoplens-runner --seed 7 --write-snapshot data.json --date 2024-06-30 --json

use anyhow::{Context, Result};
use chrono::NaiveDate;
use shoplens_core::{
    clock::AnalysisClock,
    config::AnalysisConfig,
    engine::AnalysisEngine,
    export::ReportBundle,
    imputation::ImputationReport,
    pricing::PriceProposal,
    snapshot::DataSource,
    types::CustomerId,
};
use std::env;

/// Machine-readable end-of-run summary, printed with `--json`.
#[derive(serde::Serialize)]
struct RunSummary<'a> {
    run_id:          &'a str,
    seed:            u64,
    reference_date:  NaiveDate,
    source:          DataSource,
    rows_before:     usize,
    rows_orphaned:   usize,
    rows_purged:     usize,
    rows_after:      usize,
    values_filled:   usize,
    price_proposals: usize,
    applied_prices:  bool,
    recommendations: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let customer = parse_arg(&args, "--customer", 0 as CustomerId);
    let apply_prices = args.iter().any(|a| a == "--apply-prices");
    let json = args.iter().any(|a| a == "--json");
    let config_path = string_arg(&args, "--config");
    let snapshot_path = string_arg(&args, "--snapshot");
    let write_snapshot = string_arg(&args, "--write-snapshot");
    let out = string_arg(&args, "--out");

    let clock = match string_arg(&args, "--date") {
        Some(d) => AnalysisClock::pinned(
            NaiveDate::parse_from_str(d, "%Y-%m-%d").with_context(|| format!("bad --date {d}"))?,
        ),
        None => AnalysisClock::system(),
    };

    let mut config = match config_path {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(t) = string_arg(&args, "--threshold") {
        config.pricing.threshold = t.parse().with_context(|| format!("bad --threshold {t}"))?;
    }
    config.validate()?;

    if !json {
        println!("ShopLens: sales repair & analytics runner");
        println!("  seed:      {seed}");
        println!("  date:      {}", clock.today());
        println!("  config:    {}", config_path.unwrap_or("(defaults)"));
        println!("  source:    {}", snapshot_path.unwrap_or("(synthetic)"));
        println!("  threshold: {:.2}", config.pricing.threshold);
        println!();
    }

    let mut engine = match snapshot_path {
        Some(path) => AnalysisEngine::from_snapshot(path, seed, clock, config),
        None => AnalysisEngine::synthetic(seed, clock, config),
    };

    if let Some(path) = write_snapshot {
        engine.write_snapshot(path)?;
        log::info!("runner: raw dataset written to {path}");
    }

    let report = engine.clean()?.clone();

    // Proposals over the cleaned table, before any write-back.
    let proposals = engine.price_advice()?;
    if apply_prices {
        let updates = engine.propose_pricing()?;
        engine.apply_prices(&updates)?;
    }

    let customer = (customer > 0).then_some(customer);
    let bundle = engine.bundle(customer)?;

    if let Some(path) = out {
        bundle.write_json(path)?;
    }

    if json {
        let summary = RunSummary {
            run_id:          &engine.run_id,
            seed,
            reference_date:  engine.clock.today(),
            source:          engine.source(),
            rows_before:     report.rows_before,
            rows_orphaned:   report.rows_missing_customer,
            rows_purged:     report.rows_purged,
            rows_after:      report.rows_after,
            values_filled:   report.total_filled(),
            price_proposals: proposals.len(),
            applied_prices:  apply_prices,
            recommendations: bundle
                .recommendations
                .as_ref()
                .map(|r| r.products.clone())
                .unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&engine, &report, &bundle, &proposals, apply_prices);
    }

    Ok(())
}

fn print_summary(
    engine: &AnalysisEngine,
    report: &ImputationReport,
    bundle: &ReportBundle,
    proposals: &[PriceProposal],
    applied: bool,
) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", engine.run_id);
    println!("  source:         {:?}", engine.source());
    println!("  customers:      {}", engine.raw().customers.len());
    println!("  rows in:        {}", report.rows_before);
    println!("  no customer:    {}", report.rows_missing_customer);
    println!("  rows purged:    {}", report.rows_purged);
    println!("  rows out:       {}", report.rows_after);
    println!("  values filled:  {}", report.total_filled());

    println!();
    println!("=== CLEANING ===");
    for row in report.comparison() {
        println!("  {:<20} {:>4} -> {:>4}", row.field.name(), row.before, row.after);
    }

    println!();
    println!("=== TOP PRODUCTS ===");
    for (rank, row) in bundle.top_products.iter().enumerate() {
        println!("  {:>2}. {:<24} {:>5}", rank + 1, row.product_name, row.quantity);
    }

    println!();
    println!(
        "=== PRICE UPDATES ({}) ===",
        if applied { "applied" } else { "proposed" }
    );
    if proposals.is_empty() {
        println!("  (no proposals)");
    }
    for p in proposals {
        println!(
            "  {:<24} avg {:>9.2} -> {:>9.2}  ({:?})",
            p.product_name, p.average_price, p.proposed_price, p.reason
        );
    }

    if let Some(recs) = &bundle.recommendations {
        println!();
        match &recs.customer_name {
            Some(name) => println!("=== RECOMMENDATIONS for customer {} ({name}) ===", recs.customer_id),
            None => println!("=== RECOMMENDATIONS for customer {} ===", recs.customer_id),
        }
        if recs.products.is_empty() {
            println!("  (no purchase history)");
        }
        for product in &recs.products {
            println!("  - {product}");
        }
    }

    println!();
    println!("=== CUSTOMERS ===");
    for (gender, count) in &bundle.demographics.genders {
        println!("  {:<12} {count}", gender.label());
    }
    for (tier, count) in &bundle.spend_tier_counts {
        println!("  {:<12} {count}", format!("{tier:?}"));
    }

    if let Some(r) = bundle.price_quantity_correlation {
        println!();
        println!("  price/quantity correlation: {r:.3}");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
