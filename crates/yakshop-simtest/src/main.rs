//! Yak Shop Headless Simulation Harness
//!
//! Validates the herd-yield and order-replay logic without SpacetimeDB.
//! Runs entirely in-process with no DB or networking.
//!
//! Usage:
//!   cargo run -p yakshop-simtest
//!   cargo run -p yakshop-simtest -- --verbose
//!   cargo run -p yakshop-simtest -- --herd data/input_herd.xml --days 13 --print

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use yakshop_logic::growth::{advance, Yak};
use yakshop_logic::herd::{simulate, SimulationMode};
use yakshop_logic::orders::{order_token, Fulfillment, Order, OrderRequest};
use yakshop_logic::replay::{self, Baseline, HerdChange};
use yakshop_logic::roster;
use yakshop_logic::stock::Stock;
use yakshop_logic::ShopError;

// ── Bundled data (same files the server uses) ───────────────────────────
const HERD_XML: &str = include_str!("../../../data/input_herd.xml");
const ORDER_SCRIPT_JSON: &str = include_str!("../../../data/order_script.json");

#[derive(Debug, Parser)]
#[command(
    name = "yakshop-simtest",
    about = "Validate yak shop logic, or report on a herd roster"
)]
struct Cli {
    /// Show every check, not only failures
    #[arg(short, long)]
    verbose: bool,

    /// Report on this roster instead of running the validation sweep
    #[arg(short = 'i', long = "herd")]
    herd: Option<PathBuf>,

    /// Elapsed days for the roster report
    #[arg(short = 'd', long = "days", default_value_t = 13)]
    days: u32,

    /// Print the report in the shop's text format
    #[arg(short = 'p', long = "print")]
    print: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// One order of the scripted scenario and the outcome expected on placement.
#[derive(Debug, Deserialize)]
struct ScriptedOrder {
    day: i64,
    #[serde(flatten)]
    request: OrderRequest,
    expect: Fulfillment,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Some(path) = &cli.herd {
        return run_report(path, cli.days, cli.print, cli.json);
    }

    let verbose = cli.verbose;
    println!("=== Yak Shop Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Bundled roster
    let baseline = match validate_roster(&mut results) {
        Some(b) => b,
        None => {
            report_results(&results, verbose);
            std::process::exit(1);
        }
    };

    // 2. Growth model
    results.extend(validate_growth_model(verbose));

    // 3. Herd yields
    results.extend(validate_herd_yields(&baseline, verbose));

    // 4. Stock ledger
    results.extend(validate_stock_ledger(verbose));

    // 5. Order replay
    results.extend(validate_order_replay(&baseline, verbose));

    // 6. Herd changes
    results.extend(validate_herd_changes(&baseline, verbose));

    if !report_results(&results, verbose) {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the summary. Returns true when everything passed.
fn report_results(results: &[TestResult], verbose: bool) -> bool {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );
    failed == 0
}

// ── Roster report mode ──────────────────────────────────────────────────

fn run_report(path: &Path, days: u32, print: bool, json: bool) -> anyhow::Result<()> {
    let herd = roster::load_herd_file(path)
        .with_context(|| format!("loading herd from {}", path.display()))?;
    log::info!("Loaded {} yaks from {}", herd.len(), path.display());
    let baseline = Baseline::from_herd(herd);
    let report = replay::report_as_of(&baseline, days)
        .with_context(|| format!("simulating {} days", days))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if print {
        print!("{}", report);
    } else {
        println!(
            "Day {}: {:.3} liters of milk, {} skins of wool, {} yaks",
            days,
            report.stock.milk,
            report.stock.skins,
            report.herd.len()
        );
    }
    Ok(())
}

// ── 1. Bundled Roster ───────────────────────────────────────────────────

fn validate_roster(results: &mut Vec<TestResult>) -> Option<Baseline> {
    println!("--- Bundled Roster ---");

    let herd = match roster::herd_from_xml(HERD_XML) {
        Ok(h) => h,
        Err(e) => {
            results.push(check("roster_parse", false, format!("XML error: {}", e)));
            return None;
        }
    };

    results.push(check(
        "roster_not_empty",
        herd.len() == 3,
        format!("{} yaks loaded", herd.len()),
    ));

    let names: Vec<&str> = herd.iter().map(|y| y.name.as_str()).collect();
    results.push(check(
        "roster_names",
        names == ["Betty-1", "Betty-2", "Betty-3"],
        names.join(", "),
    ));

    let all_mature = herd.iter().all(|y| y.age_last_shaved == Some(y.age));
    results.push(check(
        "roster_initial_shave_ages",
        all_mature,
        "mature yaks start as shaved at their own age".into(),
    ));

    let empty = roster::parse_herd_xml("<herd></herd>");
    results.push(check(
        "roster_empty_rejected",
        matches!(empty, Err(roster::RosterError::Empty)),
        "empty roster is an error".into(),
    ));

    Some(Baseline::from_herd(herd))
}

// ── 2. Growth Model ─────────────────────────────────────────────────────

fn validate_growth_model(_verbose: bool) -> Vec<TestResult> {
    println!("--- Growth Model ---");
    let mut results = Vec::new();

    let yak = Yak::new(1, "Probe", "f", 4.0);
    let idle = advance(&yak, 0);
    results.push(check(
        "growth_zero_days_identity",
        idle.yak.age == yak.age && idle.milk == 0.0 && idle.skins == 0,
        format!("age {} → {}", yak.age, idle.yak.age),
    ));

    let mut additive = true;
    for days in [1, 13, 50, 250] {
        let out = advance(&yak, days);
        if !approx(out.yak.age * 100.0 - 400.0, days as f64) {
            additive = false;
        }
    }
    results.push(check(
        "growth_age_additive",
        additive,
        "age grows by exactly one day per simulated day".into(),
    ));

    let mut monotone = true;
    let mut previous = 0;
    for days in 0..300 {
        let skins = advance(&yak, days).skins;
        monotone &= skins >= previous;
        previous = skins;
    }
    results.push(check(
        "growth_skins_monotone",
        monotone,
        format!("{} skins after 299 days", previous),
    ));

    let before = advance(&yak, 13).skins;
    let after = advance(&yak, 14).skins;
    results.push(check(
        "growth_last_day_no_wool",
        before == 0 && after == 1,
        format!("13 days → {} skins, 14 days → {} skins", before, after),
    ));

    results
}

// ── 3. Herd Yields ──────────────────────────────────────────────────────

fn validate_herd_yields(baseline: &Baseline, verbose: bool) -> Vec<TestResult> {
    println!("--- Herd Yields ---");
    let mut results = Vec::new();

    results.push(check(
        "yield_day_zero_seed",
        baseline.stock == Stock::new(0.0, 3),
        format!(
            "{:.3} L, {} skins",
            baseline.stock.milk, baseline.stock.skins
        ),
    ));

    match replay::stock_as_of(baseline, 13) {
        Ok(stock) => results.push(check(
            "yield_stock_day_13",
            approx(stock.milk, 1104.48) && stock.skins == 3,
            format!("{:.3} L, {} skins", stock.milk, stock.skins),
        )),
        Err(e) => results.push(check("yield_stock_day_13", false, e.to_string())),
    }

    let ages: Vec<f64> = match replay::herd_as_of(baseline, 13) {
        Ok(herd) => herd.iter().map(|e| e.age).collect(),
        Err(e) => {
            results.push(check("yield_herd_ages_day_13", false, e.to_string()));
            return results;
        }
    };
    let expected = [4.13, 8.13, 9.63];
    results.push(check(
        "yield_herd_ages_day_13",
        ages.len() == 3 && ages.iter().zip(expected).all(|(a, b)| approx(*a, b)),
        format!("{:?}", ages),
    ));

    let herd_run = simulate(&baseline.herd, 40, SimulationMode::Continuing);
    let per_yak: f64 = baseline.herd.iter().map(|y| advance(y, 40).milk).sum();
    results.push(check(
        "yield_totals_are_sums",
        approx(herd_run.milk, per_yak),
        format!("{:.3} L over 40 days", herd_run.milk),
    ));

    let mixed = [Yak::new(1, "Betty-1", "f", 4.0), Yak::new(2, "Old-Betty", "f", 20.0)];
    let one_day = simulate(&mixed, 1, SimulationMode::Continuing);
    results.push(check(
        "yield_old_yak_subtracts_milk",
        approx(one_day.milk, 28.0),
        format!("{:.3} L from a 4- and a 20-year-old yak", one_day.milk),
    ));

    if verbose {
        println!("  Stock by day:");
        for day in [0, 1, 7, 13, 14, 30, 100] {
            if let Ok(stock) = replay::stock_as_of(baseline, day) {
                println!(
                    "    day {:3}: {:10.3} L  {:3} skins",
                    day, stock.milk, stock.skins
                );
            }
        }
    }

    results
}

// ── 4. Stock Ledger ─────────────────────────────────────────────────────

fn validate_stock_ledger(_verbose: bool) -> Vec<TestResult> {
    println!("--- Stock Ledger ---");
    let mut results = Vec::new();

    let mut stock = Stock::new(1104.48, 3);
    let exact = stock.try_allocate(1104.48, 3);
    results.push(check(
        "stock_exact_amount_granted",
        exact.milk_granted && exact.skins_granted && stock == Stock::new(0.0, 0),
        "requests equal to stock are granted".into(),
    ));

    let mut stock = Stock::new(100.0, 1);
    let split = stock.try_allocate(500.0, 1);
    results.push(check(
        "stock_resources_independent",
        !split.milk_granted && split.skins_granted && stock == Stock::new(100.0, 0),
        format!("left {:.1} L, {} skins", stock.milk, stock.skins),
    ));

    let mut stock = Stock::new(1.0, 1);
    results.push(check(
        "stock_rejects_negative_increment",
        stock.add(-1.0, 0).is_err() && stock == Stock::new(1.0, 1),
        "negative increments leave the ledger untouched".into(),
    ));

    results
}

// ── 5. Order Replay ─────────────────────────────────────────────────────

fn validate_order_replay(baseline: &Baseline, verbose: bool) -> Vec<TestResult> {
    println!("--- Order Replay ---");
    let mut results = Vec::new();

    let script: Vec<ScriptedOrder> = match serde_json::from_str(ORDER_SCRIPT_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(check(
                "replay_script_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return results;
        }
    };

    let mut log: Vec<Order> = Vec::new();
    for (seq, step) in (1_u64..).zip(script) {
        let name = format!("replay_script_order_{}", seq);
        let placed = step
            .request
            .into_order(order_token(seq), step.day)
            .and_then(|order| replay::place_order(baseline, &log, order));
        match placed {
            Ok(p) => {
                results.push(check(
                    &name,
                    p.fulfillment == step.expect,
                    format!(
                        "day {} {}: {:?} (expected {:?})",
                        p.order.day, p.order.customer, p.fulfillment, step.expect
                    ),
                ));
                log = p.orders;
            }
            Err(e) => results.push(check(&name, false, e.to_string())),
        }
    }

    if verbose {
        println!("  Final order log:");
        for o in &log {
            println!(
                "    day {:3} {:10} milk {:?}/{} skins {:?}/{} → {:?}",
                o.day,
                o.customer,
                o.received_milk,
                o.requested_milk,
                o.received_skins,
                o.requested_skins,
                o.fulfillment()
            );
        }
    }

    let first = replay::replay(baseline, &log);
    let second = replay::replay(baseline, &log);
    results.push(check(
        "replay_deterministic",
        matches!((&first, &second), (Ok(a), Ok(b)) if a == b),
        format!("{} orders replayed twice", log.len()),
    ));

    let negative = OrderRequest::new("Medvedev", 1.0, 0).into_order("neg", -1);
    results.push(check(
        "replay_negative_day_rejected",
        matches!(negative, Err(ShopError::NegativeOrderDay(-1))),
        "negative order day is a client error".into(),
    ));

    results
}

// ── 6. Herd Changes ─────────────────────────────────────────────────────

fn validate_herd_changes(baseline: &Baseline, _verbose: bool) -> Vec<TestResult> {
    println!("--- Herd Changes ---");
    let mut results = Vec::new();

    let add = HerdChange::parse(
        "add",
        None,
        Some("Betty-4".into()),
        Some("f".into()),
        Some(0.5),
    )
    .and_then(|change| replay::modify_herd(&baseline.herd, &change));
    results.push(check(
        "herd_add_calf",
        matches!(&add, Ok(b) if b.herd.len() == 4 && b.stock.skins == 3),
        "calf joins without a starting skin".into(),
    ));

    let remove = replay::modify_herd(&baseline.herd, &HerdChange::Remove { id: 1 });
    results.push(check(
        "herd_remove",
        matches!(&remove, Ok(b) if b.herd.len() == 2 && b.stock.skins == 2),
        "removal re-seeds the stock".into(),
    ));

    let unknown = HerdChange::parse("donate", None, None, None, None);
    results.push(check(
        "herd_unknown_action_rejected",
        matches!(&unknown, Err(e) if e.is_client_error()),
        "only add and remove are allowed".into(),
    ));

    results
}
