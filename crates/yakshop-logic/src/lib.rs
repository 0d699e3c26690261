//! Pure herd-yield and order-replay logic for the Yak Shop.
//!
//! This crate contains all shop logic that is independent of any database
//! or transport. Functions take plain data and return results, making them
//! unit-testable and usable from the SpacetimeDB module and native tools.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Growth model constants (yak calendar, milk and wool rates) |
//! | [`constants`] | Fulfillment codes, herd actions, response statuses |
//! | [`error`] | Validation vs. invariant error taxonomy |
//! | [`growth`] | Per-yak day-stepped milk and wool production |
//! | [`herd`] | Whole-herd simulation over a span, herd reports |
//! | [`orders`] | Order requests, order log replay and allocation |
//! | [`replay`] | Baseline-driven entry points: place order, queries, roster changes |
//! | [`roster`] | Herd roster loading from XML |
//! | [`stock`] | Stock ledger with all-or-nothing allocation |

pub mod config;
pub mod constants;
pub mod error;
pub mod growth;
pub mod herd;
pub mod orders;
pub mod replay;
pub mod roster;
pub mod stock;

pub use error::{ShopError, ShopResult};
