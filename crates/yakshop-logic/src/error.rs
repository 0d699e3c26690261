//! Error taxonomy for the replay pipeline.
//!
//! Two families matter to callers:
//! - **Validation** errors are raised before any simulation runs and map to
//!   client errors. Nothing has been mutated when one is returned.
//! - **Invariant** errors abort an in-flight replay. They indicate corrupt
//!   input data (e.g. an order log that cannot be laid out on a timeline) and
//!   map to server errors.

use thiserror::Error;

use crate::roster::RosterError;

pub type ShopResult<T> = Result<T, ShopError>;

#[derive(Debug, Error)]
pub enum ShopError {
    // ── Validation ─────────────────────────────────────────────────────
    #[error("'{0}' is not an allowable herd action (expected 'add' or 'remove')")]
    UnknownHerdAction(String),

    #[error("herd action '{action}' requires field '{field}'")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("no yak with id {0} in the herd")]
    UnknownYak(u64),

    #[error("yak age must be a finite, non-negative number of years (got {0})")]
    InvalidAge(f64),

    #[error("order day must be non-negative (got {0})")]
    NegativeOrderDay(i64),

    #[error("day {0} is beyond the simulated horizon")]
    OrderDayOutOfRange(i64),

    #[error("requested milk must be a finite, non-negative quantity (got {0})")]
    InvalidMilkQuantity(f64),

    #[error("order is missing a customer")]
    MissingCustomer,

    #[error("malformed order request: {0}")]
    MalformedRequest(String),

    #[error("order {0} already exists")]
    DuplicateOrder(String),

    #[error(transparent)]
    Roster(#[from] RosterError),

    // ── Invariant violations ───────────────────────────────────────────
    #[error("order {token} on day {day} yields a negative elapsed span of {span} days")]
    NegativeSpan { token: String, day: i64, span: i64 },

    #[error("stock increment must be non-negative (got {milk} litres, {skins} skins)")]
    InvalidIncrement { milk: f64, skins: u32 },

    #[error("stock overflow while adding {0} skins")]
    StockOverflow(u32),

    #[error("order {0} is missing from the resolved order set")]
    MissingResolvedOrder(String),
}

impl ShopError {
    /// True for errors caused by the caller's input rather than corrupt state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ShopError::UnknownHerdAction(_)
                | ShopError::MissingField { .. }
                | ShopError::UnknownYak(_)
                | ShopError::InvalidAge(_)
                | ShopError::NegativeOrderDay(_)
                | ShopError::OrderDayOutOfRange(_)
                | ShopError::InvalidMilkQuantity(_)
                | ShopError::MissingCustomer
                | ShopError::MalformedRequest(_)
                | ShopError::DuplicateOrder(_)
                | ShopError::Roster(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        assert!(ShopError::UnknownHerdAction("kill".into()).is_client_error());
        assert!(ShopError::NegativeOrderDay(-1).is_client_error());
        assert!(ShopError::Roster(RosterError::Empty).is_client_error());
    }

    #[test]
    fn test_invariant_errors_are_server_errors() {
        let err = ShopError::NegativeSpan {
            token: "ord-1".into(),
            day: 3,
            span: -2,
        };
        assert!(!err.is_client_error());
        assert!(!ShopError::MissingResolvedOrder("ord-1".into()).is_client_error());
    }

    #[test]
    fn test_unknown_action_message_names_allowed_actions() {
        let msg = ShopError::UnknownHerdAction("donate".into()).to_string();
        assert!(msg.contains("donate"));
        assert!(msg.contains("'add' or 'remove'"));
    }
}
