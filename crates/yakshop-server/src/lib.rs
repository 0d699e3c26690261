//! Yak Shop Server - SpacetimeDB Module
//!
//! Persists the herd, stock ledger and order log, and exposes orders, herd
//! changes and stock/herd queries as reducers. All simulation and allocation
//! logic lives in yakshop-logic; clients subscribe to the public tables.

mod reducers;
mod tables;

pub use reducers::*;
pub use tables::*;
