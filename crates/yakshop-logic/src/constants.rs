//! Shared constants: fulfillment codes, herd actions, response statuses.
//!
//! Stored columns use the u8 codes so server tables stay flat.

pub mod fulfillment_codes {
    pub const FULL: u8 = 0;
    pub const PARTIAL: u8 = 1;
    pub const NONE: u8 = 2;
}

pub mod herd_actions {
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
}

/// Transport status codes for order placement.
pub mod order_statuses {
    pub const CREATED: u16 = 201;
    pub const PARTIAL_CONTENT: u16 = 206;
    pub const NOT_FOUND: u16 = 404;
}

/// Last day an order or query may name: 500 yak years.
pub const MAX_TIMELINE_DAY: i64 = 50_000;
