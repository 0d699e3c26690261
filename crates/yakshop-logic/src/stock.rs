//! Stock ledger: unallocated milk and skins.
//!
//! Allocation is all-or-nothing per resource and the two resources are
//! independent: an order can get its milk, its skins, both, or neither.
//! A request equal to what is available is granted.

use serde::{Deserialize, Serialize};

use crate::error::{ShopError, ShopResult};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stock {
    /// Unallocated milk in litres.
    pub milk: f64,
    /// Unallocated wool skins.
    pub skins: u32,
}

/// Outcome of one allocation attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub milk: f64,
    pub skins: u32,
    pub milk_granted: bool,
    pub skins_granted: bool,
}

impl Stock {
    pub fn new(milk: f64, skins: u32) -> Self {
        Self { milk, skins }
    }

    /// Add produced goods. Increments must be finite and non-negative.
    pub fn add(&mut self, milk: f64, skins: u32) -> ShopResult<()> {
        if !milk.is_finite() || milk < 0.0 {
            return Err(ShopError::InvalidIncrement { milk, skins });
        }
        self.skins = self
            .skins
            .checked_add(skins)
            .ok_or(ShopError::StockOverflow(skins))?;
        self.milk += milk;
        Ok(())
    }

    /// Grant each resource in full if enough is on hand, otherwise grant none
    /// of it. Denied resources leave the ledger untouched.
    pub fn try_allocate(&mut self, milk: f64, skins: u32) -> Allocation {
        // `<=` also denies NaN requests
        let milk_granted = milk <= self.milk;
        let skins_granted = skins <= self.skins;

        if milk_granted {
            self.milk -= milk;
        }
        if skins_granted {
            self.skins -= skins;
        }

        Allocation {
            milk: if milk_granted { milk } else { 0.0 },
            skins: if skins_granted { skins } else { 0 },
            milk_granted,
            skins_granted,
        }
    }
}
