//! Replay orchestration: the entry points used by the server and harness.
//!
//! Every command starts from the [`Baseline`]: the canonical herd with its
//! day-zero ages and the stock seeded at day zero. Nothing here mutates the
//! baseline; callers get back the full state to persist.

use serde::{Deserialize, Serialize};

use crate::config::GrowthParams;
use crate::constants::{herd_actions, MAX_TIMELINE_DAY};
use crate::error::{ShopError, ShopResult};
use crate::growth::Yak;
use crate::herd::{simulate_with, HerdEntry, HerdReport, SimulationMode};
use crate::orders::{resolve_with, Fulfillment, Order, Resolution};
use crate::stock::Stock;

/// Canonical starting state every replay begins from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub herd: Vec<Yak>,
    pub stock: Stock,
}

impl Baseline {
    /// Baseline for a herd, with the stock seeded from a day-zero run.
    pub fn from_herd(herd: Vec<Yak>) -> Self {
        let stock = seed_stock(&herd);
        Self { herd, stock }
    }
}

/// Day-zero stock: one skin per mature yak, no milk yet.
pub fn seed_stock(herd: &[Yak]) -> Stock {
    let produced = simulate_with(herd, 0, SimulationMode::Starting, &GrowthParams::default());
    Stock::new(produced.milk, produced.skins)
}

/// Result of placing an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// The new order, resolved.
    pub order: Order,
    pub fulfillment: Fulfillment,
    /// Every order in the log, re-resolved, in timeline order.
    pub orders: Vec<Order>,
    /// Stock after the last order on the timeline.
    pub stock: Stock,
}

/// Add `order` to the log and replay the whole timeline from the baseline.
pub fn place_order(baseline: &Baseline, log: &[Order], order: Order) -> ShopResult<Placement> {
    if log.iter().any(|o| o.token == order.token) {
        return Err(ShopError::DuplicateOrder(order.token));
    }
    log::info!(
        "Placing order {} for {} on day {} ({} existing orders)",
        order.token,
        order.customer,
        order.day,
        log.len()
    );

    let token = order.token.clone();
    let mut timeline = log.to_vec();
    timeline.push(order);

    let resolution = replay(baseline, &timeline)?;
    let placed = resolution
        .find(&token)
        .cloned()
        .ok_or_else(|| ShopError::MissingResolvedOrder(token.clone()))?;
    let Resolution { orders, stock, .. } = resolution;
    let fulfillment = placed
        .fulfillment()
        .ok_or(ShopError::MissingResolvedOrder(token))?;

    log::info!(
        "Order {} resolved as {:?}; stock on day {} is {:.3} L, {} skins",
        placed.token,
        fulfillment,
        orders.last().map(|o| o.day).unwrap_or(0),
        stock.milk,
        stock.skins
    );

    Ok(Placement {
        order: placed,
        fulfillment,
        orders,
        stock,
    })
}

/// Re-resolve an existing log without adding anything.
pub fn replay(baseline: &Baseline, log: &[Order]) -> ShopResult<Resolution> {
    resolve_with(&baseline.herd, &baseline.stock, log, &GrowthParams::default())
}

fn check_horizon(days: u32) -> ShopResult<()> {
    if i64::from(days) > MAX_TIMELINE_DAY {
        return Err(ShopError::OrderDayOutOfRange(days.into()));
    }
    Ok(())
}

/// Unallocated stock after `days` days, ignoring the order log.
pub fn stock_as_of(baseline: &Baseline, days: u32) -> ShopResult<Stock> {
    check_horizon(days)?;
    let produced = simulate_with(
        &baseline.herd,
        days,
        SimulationMode::Continuing,
        &GrowthParams::default(),
    );
    let mut stock = baseline.stock;
    stock.add(produced.milk, produced.skins)?;
    Ok(stock)
}

/// Herd view after `days` days.
pub fn herd_as_of(baseline: &Baseline, days: u32) -> ShopResult<Vec<HerdEntry>> {
    check_horizon(days)?;
    let produced = simulate_with(
        &baseline.herd,
        days,
        SimulationMode::Continuing,
        &GrowthParams::default(),
    );
    Ok(produced.herd.iter().map(HerdEntry::from).collect())
}

/// Stock and herd after `days` days from a single simulation run.
pub fn report_as_of(baseline: &Baseline, days: u32) -> ShopResult<HerdReport> {
    check_horizon(days)?;
    let produced = simulate_with(
        &baseline.herd,
        days,
        SimulationMode::Continuing,
        &GrowthParams::default(),
    );
    let mut stock = baseline.stock;
    stock.add(produced.milk, produced.skins)?;
    Ok(HerdReport {
        day: days,
        stock,
        herd: produced.herd.iter().map(HerdEntry::from).collect(),
    })
}

/// A change to the herd roster.
#[derive(Debug, Clone, PartialEq)]
pub enum HerdChange {
    Add { name: String, sex: String, age: f64 },
    Remove { id: u64 },
}

impl HerdChange {
    /// Build a change from loosely-typed command fields.
    pub fn parse(
        action: &str,
        id: Option<u64>,
        name: Option<String>,
        sex: Option<String>,
        age: Option<f64>,
    ) -> ShopResult<Self> {
        match action {
            herd_actions::ADD => {
                let name = name
                    .filter(|n| !n.trim().is_empty())
                    .ok_or(ShopError::MissingField {
                        action: herd_actions::ADD,
                        field: "name",
                    })?;
                let sex = sex.ok_or(ShopError::MissingField {
                    action: herd_actions::ADD,
                    field: "sex",
                })?;
                let age = age.ok_or(ShopError::MissingField {
                    action: herd_actions::ADD,
                    field: "age",
                })?;
                if !age.is_finite() || age < 0.0 {
                    return Err(ShopError::InvalidAge(age));
                }
                Ok(HerdChange::Add { name, sex, age })
            }
            herd_actions::REMOVE => {
                let id = id.ok_or(ShopError::MissingField {
                    action: herd_actions::REMOVE,
                    field: "yak_id",
                })?;
                Ok(HerdChange::Remove { id })
            }
            other => Err(ShopError::UnknownHerdAction(other.to_string())),
        }
    }
}

/// Apply a roster change and re-seed the baseline stock.
///
/// Recorded order outcomes are left alone; they are recomputed by the next
/// replay against the new baseline.
///
/// An added yak gets the provisional id `max + 1`. Stores that key yaks
/// themselves (the server's auto_inc herd table) replace it on insert and
/// re-read the herd before the next replay.
pub fn modify_herd(herd: &[Yak], change: &HerdChange) -> ShopResult<Baseline> {
    let mut herd = herd.to_vec();
    match change {
        HerdChange::Add { name, sex, age } => {
            let id = herd.iter().map(|y| y.id).max().unwrap_or(0) + 1;
            log::info!("Adding yak {} ({}, {} years) as id {}", name, sex, age, id);
            herd.push(Yak::new(id, name.clone(), sex.clone(), *age));
        }
        HerdChange::Remove { id } => {
            let index = herd
                .iter()
                .position(|y| y.id == *id)
                .ok_or(ShopError::UnknownYak(*id))?;
            let removed = herd.remove(index);
            log::info!("Removed yak {} (id {})", removed.name, id);
        }
    }
    Ok(Baseline::from_herd(herd))
}
