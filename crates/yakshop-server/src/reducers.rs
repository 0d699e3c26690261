//! Client-facing reducers for orders, herd changes and stock/herd queries.
//!
//! Each reducer reads the canonical state out of the tables, hands plain
//! records to yakshop-logic, and writes the results back. SpacetimeDB runs
//! every reducer as one serialised transaction, and an `Err` return rolls it
//! back, so a failed replay never leaves partial writes behind.

use std::collections::HashMap;

use crate::tables::*;
use spacetimedb::{reducer, ReducerContext, Table};
use yakshop_logic::growth::Yak;
use yakshop_logic::orders::{order_token, Order, OrderRequest};
use yakshop_logic::replay::{self, Baseline, HerdChange};
use yakshop_logic::roster;
use yakshop_logic::stock::Stock;
use yakshop_logic::ShopError;

/// Starting herd bundled with the module.
const HERD_XML: &str = include_str!("../../../data/input_herd.xml");
const HERD_SOURCE: &str = "input_herd.xml";

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Load the starting herd and seed the stock from a day-zero run.
#[reducer(init)]
pub fn init(ctx: &ReducerContext) -> Result<(), String> {
    let herd = roster::herd_from_xml(HERD_XML).map_err(|e| reject(e.into()))?;
    reset_shop(ctx);

    for yak in &herd {
        ctx.db.herd().insert(HerdMember::from(yak));
    }
    let seed = replay::seed_stock(&herd);
    put_stock(ctx, stock_slots::BASELINE, &seed, 0);
    put_stock(ctx, stock_slots::CURRENT, &seed, 0);

    ctx.db.shop_config().insert(ShopConfig {
        id: 0,
        herd_source: HERD_SOURCE.to_string(),
        herd_size: herd.len() as u32,
        next_order_seq: 1,
    });

    log::info!(
        "Yak shop initialised: {} yaks from {}, {} skins in stock",
        herd.len(),
        HERD_SOURCE,
        seed.skins
    );
    Ok(())
}

/// Clear every table so a re-init starts from a clean slate.
fn reset_shop(ctx: &ReducerContext) {
    let herd_ids: Vec<u64> = ctx.db.herd().iter().map(|r| r.id).collect();
    for id in herd_ids {
        ctx.db.herd().id().delete(id);
    }
    let stock_ids: Vec<u32> = ctx.db.stock().iter().map(|r| r.id).collect();
    for id in stock_ids {
        ctx.db.stock().id().delete(id);
    }
    let order_ids: Vec<u64> = ctx.db.customer_order().iter().map(|r| r.id).collect();
    for id in order_ids {
        ctx.db.customer_order().id().delete(id);
    }
    if ctx.db.shop_config().id().find(0).is_some() {
        ctx.db.shop_config().id().delete(0);
    }
}

// ============================================================================
// ORDERS
// ============================================================================

/// Place an order for `day`. The outcome lands on the order's row.
#[reducer]
pub fn place_order(
    ctx: &ReducerContext,
    customer: String,
    day: i64,
    milk: f64,
    skins: u32,
) -> Result<(), String> {
    log::info!("Order from {} placed on day {}", customer, day);
    submit_order(ctx, OrderRequest::new(customer, milk, skins), day)
}

/// Place an order from a JSON payload such as
/// `{"customer":"Medvedev","order":{"milk":1100,"skins":3}}`.
#[reducer]
pub fn place_order_json(ctx: &ReducerContext, day: i64, payload: String) -> Result<(), String> {
    log::info!("Order payload received for day {}", day);
    let request = OrderRequest::from_json(&payload).map_err(reject)?;
    submit_order(ctx, request, day)
}

fn submit_order(ctx: &ReducerContext, request: OrderRequest, day: i64) -> Result<(), String> {
    let mut config = load_config(ctx)?;
    let order = request
        .into_order(order_token(config.next_order_seq), day)
        .map_err(reject)?;

    let baseline = load_baseline(ctx)?;
    let (rows, order_log) = load_order_log(ctx);
    let placement = replay::place_order(&baseline, &order_log, order).map_err(reject)?;

    for resolved in &placement.orders {
        match rows.get(&resolved.token) {
            Some(row) => {
                if row.records(resolved) {
                    continue;
                }
                let outcome = resolved.fulfillment();
                if row.outcome() != outcome {
                    log::info!(
                        "Order {} reclassified from {:?} to {:?}",
                        row.token,
                        row.outcome(),
                        outcome
                    );
                }
                ctx.db
                    .customer_order()
                    .id()
                    .update(CustomerOrder::from_order(row.id, resolved));
            }
            None => {
                ctx.db
                    .customer_order()
                    .insert(CustomerOrder::from_order(0, resolved));
            }
        }
    }
    let last_day = placement.orders.last().map(|o| o.day).unwrap_or(0);
    put_stock(ctx, stock_slots::CURRENT, &placement.stock, last_day);

    config.next_order_seq += 1;
    ctx.db.shop_config().id().update(config);

    log::info!(
        "Order {} for {}: {:?} (status {}), received milk {:?} skins {:?}",
        placement.order.token,
        placement.order.customer,
        placement.fulfillment,
        placement.fulfillment.http_status(),
        placement.order.received_milk,
        placement.order.received_skins
    );
    Ok(())
}

// ============================================================================
// HERD
// ============================================================================

/// Add a yak to or remove a yak from the canonical herd. The baseline stock
/// is re-seeded; recorded order outcomes are not touched.
#[reducer]
pub fn modify_herd(
    ctx: &ReducerContext,
    action: String,
    yak_id: Option<u64>,
    name: Option<String>,
    sex: Option<String>,
    age: Option<f64>,
) -> Result<(), String> {
    log::info!("Request received to modify herd: {}", action);
    let change = HerdChange::parse(&action, yak_id, name, sex, age).map_err(reject)?;

    let baseline = load_baseline(ctx)?;
    let next = replay::modify_herd(&baseline.herd, &change).map_err(reject)?;

    match &change {
        HerdChange::Add { .. } => {
            // The table assigns the id; the logic-side one is provisional.
            if let Some(added) = next.herd.last() {
                let row = ctx.db.herd().insert(HerdMember::from(added));
                log::info!(
                    "Yak {} added with id {} (provisional id {})",
                    row.name,
                    row.id,
                    added.id
                );
            }
        }
        HerdChange::Remove { id } => {
            ctx.db.herd().id().delete(*id);
        }
    }

    put_stock(ctx, stock_slots::BASELINE, &next.stock, 0);
    put_stock(ctx, stock_slots::CURRENT, &next.stock, 0);

    let mut config = load_config(ctx)?;
    config.herd_size = next.herd.len() as u32;
    ctx.db.shop_config().id().update(config);
    Ok(())
}

// ============================================================================
// QUERIES
// ============================================================================

/// Write unallocated stock after `elapsed_days` days to `stock_report`.
#[reducer]
pub fn query_stock(ctx: &ReducerContext, elapsed_days: u32) -> Result<(), String> {
    log::info!("Stock query for {} elapsed days", elapsed_days);
    let baseline = load_baseline(ctx)?;
    let stock = replay::stock_as_of(&baseline, elapsed_days).map_err(reject)?;

    let row = StockReport {
        id: 0,
        day: elapsed_days,
        milk: stock.milk,
        skins: stock.skins,
    };
    if ctx.db.stock_report().id().find(0).is_some() {
        ctx.db.stock_report().id().update(row);
    } else {
        ctx.db.stock_report().insert(row);
    }
    Ok(())
}

/// Replace `herd_report` with the herd as it stands after `elapsed_days` days.
#[reducer]
pub fn query_herd(ctx: &ReducerContext, elapsed_days: u32) -> Result<(), String> {
    log::info!("Herd query for {} elapsed days", elapsed_days);
    let baseline = load_baseline(ctx)?;
    let herd = replay::herd_as_of(&baseline, elapsed_days).map_err(reject)?;

    let stale: Vec<u64> = ctx.db.herd_report().iter().map(|r| r.id).collect();
    for id in stale {
        ctx.db.herd_report().id().delete(id);
    }
    for entry in herd {
        ctx.db.herd_report().insert(HerdReportRow {
            id: 0,
            day: elapsed_days,
            name: entry.name,
            age: entry.age,
            age_last_shaved: entry.age_last_shaved,
        });
    }
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

/// Log a rejected command at the level its error family calls for.
fn reject(err: ShopError) -> String {
    if err.is_client_error() {
        log::warn!("Rejected: {}", err);
    } else {
        log::error!("Replay aborted: {}", err);
    }
    err.to_string()
}

fn load_config(ctx: &ReducerContext) -> Result<ShopConfig, String> {
    ctx.db
        .shop_config()
        .id()
        .find(0)
        .ok_or_else(|| "Yak shop has not been initialised".to_string())
}

fn load_baseline(ctx: &ReducerContext) -> Result<Baseline, String> {
    let stock = ctx
        .db
        .stock()
        .id()
        .find(stock_slots::BASELINE)
        .map(|row| Stock::from(&row))
        .ok_or_else(|| "Baseline stock is missing".to_string())?;

    let mut rows: Vec<HerdMember> = ctx.db.herd().iter().collect();
    rows.sort_by_key(|r| r.id);
    let herd: Vec<Yak> = rows.iter().map(Yak::from).collect();

    Ok(Baseline { herd, stock })
}

/// Order log in arrival order, with the stored rows keyed by token.
fn load_order_log(ctx: &ReducerContext) -> (HashMap<String, CustomerOrder>, Vec<Order>) {
    let mut rows: Vec<CustomerOrder> = ctx.db.customer_order().iter().collect();
    rows.sort_by_key(|r| r.id);

    let order_log = rows.iter().map(Order::from).collect();
    let by_token = rows.into_iter().map(|r| (r.token.clone(), r)).collect();
    (by_token, order_log)
}

fn put_stock(ctx: &ReducerContext, slot: u32, stock: &Stock, day: i64) {
    let row = StockLevel {
        id: slot,
        milk: stock.milk,
        skins: stock.skins,
        day,
    };
    if ctx.db.stock().id().find(slot).is_some() {
        ctx.db.stock().id().update(row);
    } else {
        ctx.db.stock().insert(row);
    }
}
