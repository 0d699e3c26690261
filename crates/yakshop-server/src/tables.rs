//! SpacetimeDB table definitions for the yak shop.
//!
//! These are the persistence side of the shop: the canonical herd, the stock
//! ledger, and the order log. Rows convert to and from the plain records in
//! yakshop-logic so every replay runs on copies.

use spacetimedb::table;
use yakshop_logic::growth;
use yakshop_logic::orders::{self, Fulfillment};
use yakshop_logic::stock::Stock;

// ============================================================================
// SHOP CONFIGURATION
// ============================================================================

/// Shop configuration singleton (id always 0)
#[table(name = shop_config, public)]
#[derive(Clone)]
pub struct ShopConfig {
    #[primary_key]
    pub id: u32,
    /// Name of the roster the herd was loaded from
    pub herd_source: String,
    pub herd_size: u32,
    /// Sequence used to mint order tokens
    pub next_order_seq: u64,
}

// ============================================================================
// HERD
// ============================================================================

/// Canonical herd member. Ages here are day-zero ages and never advance.
#[table(name = herd, public)]
#[derive(Clone)]
pub struct HerdMember {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub name: String,
    pub sex: String,
    pub age: f64,
    pub age_last_shaved: Option<f64>,
    pub yield_milk: f64,
    pub yield_skins: u32,
}

impl From<&HerdMember> for growth::Yak {
    fn from(row: &HerdMember) -> Self {
        growth::Yak {
            id: row.id,
            name: row.name.clone(),
            sex: row.sex.clone(),
            age: row.age,
            age_last_shaved: row.age_last_shaved,
            yield_milk: row.yield_milk,
            yield_skins: row.yield_skins,
        }
    }
}

impl From<&growth::Yak> for HerdMember {
    /// Id 0 lets auto_inc assign one on insert.
    fn from(yak: &growth::Yak) -> Self {
        HerdMember {
            id: 0,
            name: yak.name.clone(),
            sex: yak.sex.clone(),
            age: yak.age,
            age_last_shaved: yak.age_last_shaved,
            yield_milk: yak.yield_milk,
            yield_skins: yak.yield_skins,
        }
    }
}

// ============================================================================
// STOCK
// ============================================================================

/// Stock ledger rows, keyed by `stock_slots`.
#[table(name = stock, public)]
#[derive(Clone)]
pub struct StockLevel {
    #[primary_key]
    pub id: u32,
    pub milk: f64,
    pub skins: u32,
    /// Day the level applies to
    pub day: i64,
}

impl From<&StockLevel> for Stock {
    fn from(row: &StockLevel) -> Self {
        Stock::new(row.milk, row.skins)
    }
}

// ============================================================================
// ORDERS
// ============================================================================

/// Order log entry with the outcome of the latest replay.
#[table(name = customer_order, public)]
#[derive(Clone)]
pub struct CustomerOrder {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    #[unique]
    pub token: String,
    pub day: i64,
    pub customer: String,
    pub requested_milk: f64,
    pub requested_skins: u32,
    pub received_milk: Option<f64>,
    pub received_skins: Option<u32>,
    /// fulfillment_codes::* once resolved
    pub fulfillment: Option<u8>,
}

impl From<&CustomerOrder> for orders::Order {
    fn from(row: &CustomerOrder) -> Self {
        orders::Order {
            token: row.token.clone(),
            day: row.day,
            customer: row.customer.clone(),
            requested_milk: row.requested_milk,
            requested_skins: row.requested_skins,
            received_milk: row.received_milk,
            received_skins: row.received_skins,
        }
    }
}

impl CustomerOrder {
    /// Row for a resolved order, keeping `id` so it can update in place.
    pub fn from_order(id: u64, order: &orders::Order) -> Self {
        CustomerOrder {
            id,
            token: order.token.clone(),
            day: order.day,
            customer: order.customer.clone(),
            requested_milk: order.requested_milk,
            requested_skins: order.requested_skins,
            received_milk: order.received_milk,
            received_skins: order.received_skins,
            fulfillment: order.fulfillment().map(orders::fulfillment_to_u8),
        }
    }

    /// Classification stored by the latest replay that touched this row.
    pub fn outcome(&self) -> Option<Fulfillment> {
        self.fulfillment.and_then(orders::u8_to_fulfillment)
    }

    /// True when the row already holds `resolved`, so no write is needed.
    pub fn records(&self, resolved: &orders::Order) -> bool {
        orders::Order::from(self) == *resolved && self.outcome() == resolved.fulfillment()
    }
}

// ============================================================================
// QUERY REPORTS
// ============================================================================

/// Latest "stock as of day N" answer (id always 0)
#[table(name = stock_report, public)]
pub struct StockReport {
    #[primary_key]
    pub id: u32,
    pub day: u32,
    pub milk: f64,
    pub skins: u32,
}

/// Latest "herd as of day N" answer, one row per yak
#[table(name = herd_report, public)]
pub struct HerdReportRow {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub day: u32,
    pub name: String,
    pub age: f64,
    pub age_last_shaved: Option<f64>,
}

// ============================================================================
// CONSTANTS
// ============================================================================

pub mod stock_slots {
    /// Day-zero seed every replay starts from.
    pub const BASELINE: u32 = 0;
    /// Stock after the most recent replay, at the last order day.
    pub const CURRENT: u32 = 1;
}
