//! Order allocation: sequential replay of the order log against the stock.
//!
//! Orders are laid out on the day timeline (stable by arrival for same-day
//! orders). Between consecutive order days the herd is simulated forward and
//! its production added to the stock, then the order is allocated. The whole
//! timeline is replayed from the baseline every time, since an order placed
//! for an earlier day changes the spans of every order after it.

use serde::{Deserialize, Serialize};

use crate::config::GrowthParams;
use crate::constants::{fulfillment_codes, order_statuses, MAX_TIMELINE_DAY};
use crate::error::{ShopError, ShopResult};
use crate::growth::Yak;
use crate::herd::{simulate_with, SimulationMode};
use crate::stock::{Allocation, Stock};

/// How much of an order was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fulfillment {
    /// Both milk and skins delivered.
    Full,
    /// Exactly one of the two delivered.
    Partial,
    /// Nothing delivered.
    None,
}

impl Fulfillment {
    pub fn from_grants(milk_granted: bool, skins_granted: bool) -> Self {
        match (milk_granted, skins_granted) {
            (true, true) => Fulfillment::Full,
            (true, false) | (false, true) => Fulfillment::Partial,
            (false, false) => Fulfillment::None,
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            Fulfillment::Full => order_statuses::CREATED,
            Fulfillment::Partial => order_statuses::PARTIAL_CONTENT,
            Fulfillment::None => order_statuses::NOT_FOUND,
        }
    }
}

/// Convert fulfillment to u8 for storage.
pub fn fulfillment_to_u8(f: Fulfillment) -> u8 {
    match f {
        Fulfillment::Full => fulfillment_codes::FULL,
        Fulfillment::Partial => fulfillment_codes::PARTIAL,
        Fulfillment::None => fulfillment_codes::NONE,
    }
}

/// Convert u8 to fulfillment.
pub fn u8_to_fulfillment(val: u8) -> Option<Fulfillment> {
    match val {
        fulfillment_codes::FULL => Some(Fulfillment::Full),
        fulfillment_codes::PARTIAL => Some(Fulfillment::Partial),
        fulfillment_codes::NONE => Some(Fulfillment::None),
        _ => None,
    }
}

/// Quantities requested by a customer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderQuantities {
    pub milk: f64,
    pub skins: u32,
}

/// Incoming order payload, e.g.
/// `{"customer": "Medvedev", "order": {"milk": 1100, "skins": 3}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer: String,
    pub order: OrderQuantities,
}

impl OrderRequest {
    pub fn new(customer: impl Into<String>, milk: f64, skins: u32) -> Self {
        Self {
            customer: customer.into(),
            order: OrderQuantities { milk, skins },
        }
    }

    pub fn from_json(payload: &str) -> ShopResult<Self> {
        serde_json::from_str(payload).map_err(|e| ShopError::MalformedRequest(e.to_string()))
    }

    pub fn validate(&self) -> ShopResult<()> {
        if self.customer.trim().is_empty() {
            return Err(ShopError::MissingCustomer);
        }
        let milk = self.order.milk;
        if !milk.is_finite() || milk < 0.0 {
            return Err(ShopError::InvalidMilkQuantity(milk));
        }
        Ok(())
    }

    /// Validate and turn the request into an unresolved order for `day`.
    pub fn into_order(self, token: impl Into<String>, day: i64) -> ShopResult<Order> {
        if day < 0 {
            return Err(ShopError::NegativeOrderDay(day));
        }
        if day > MAX_TIMELINE_DAY {
            return Err(ShopError::OrderDayOutOfRange(day));
        }
        self.validate()?;
        Ok(Order {
            token: token.into(),
            day,
            customer: self.customer,
            requested_milk: self.order.milk,
            requested_skins: self.order.skins,
            received_milk: None,
            received_skins: None,
        })
    }
}

/// Opaque order token for the `seq`-th order placed.
pub fn order_token(seq: u64) -> String {
    format!("ord-{seq:08x}")
}

/// One entry of the order log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Opaque unique token.
    pub token: String,
    pub day: i64,
    pub customer: String,
    pub requested_milk: f64,
    pub requested_skins: u32,
    /// `None` until the order has been through a replay.
    pub received_milk: Option<f64>,
    pub received_skins: Option<u32>,
}

impl Order {
    /// Classification of the last replay's outcome, if resolved.
    pub fn fulfillment(&self) -> Option<Fulfillment> {
        let milk = self.received_milk?;
        let skins = self.received_skins?;
        Some(Fulfillment::from_grants(
            milk == self.requested_milk,
            skins == self.requested_skins,
        ))
    }

    fn record(&mut self, allocation: &Allocation) {
        self.received_milk = Some(allocation.milk);
        self.received_skins = Some(allocation.skins);
    }
}

/// Order log after a replay, with the stock and herd at the last order day.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Resolved orders in timeline order.
    pub orders: Vec<Order>,
    pub stock: Stock,
    pub herd: Vec<Yak>,
}

impl Resolution {
    /// The resolved order carrying `token`.
    pub fn find(&self, token: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.token == token)
    }
}

pub fn resolve(herd: &[Yak], stock: &Stock, orders: &[Order]) -> ShopResult<Resolution> {
    resolve_with(herd, stock, orders, &GrowthParams::default())
}

pub fn resolve_with(
    herd: &[Yak],
    stock: &Stock,
    orders: &[Order],
    params: &GrowthParams,
) -> ShopResult<Resolution> {
    let mut timeline = orders.to_vec();
    timeline.sort_by_key(|o| o.day);

    let mut herd = herd.to_vec();
    let mut stock = *stock;
    let mut previous_day = 0_i64;

    for (index, order) in timeline.iter_mut().enumerate() {
        let span = order.day - previous_day;
        let elapsed = u32::try_from(span).map_err(|_| {
            log::error!(
                "Order {} on day {} has elapsed span {}",
                order.token,
                order.day,
                span
            );
            ShopError::NegativeSpan {
                token: order.token.clone(),
                day: order.day,
                span,
            }
        })?;
        previous_day = order.day;

        let produced = simulate_with(&herd, elapsed, SimulationMode::Continuing, params);
        stock.add(produced.milk, produced.skins)?;
        herd = produced.herd;

        let allocation = stock.try_allocate(order.requested_milk, order.requested_skins);
        order.record(&allocation);

        log::debug!(
            "Processed order {}/{} ({}, day {}): milk {} skins {} -> stock {:.3} L, {} skins",
            index + 1,
            orders.len(),
            order.token,
            order.day,
            if allocation.milk_granted { "granted" } else { "denied" },
            if allocation.skins_granted { "granted" } else { "denied" },
            stock.milk,
            stock.skins
        );
        if !allocation.milk_granted || !allocation.skins_granted {
            log::info!(
                "Day {} order {} for {} not fully delivered",
                order.day,
                order.token,
                order.customer
            );
        }
    }

    Ok(Resolution {
        orders: timeline,
        stock,
        herd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bettys() -> Vec<Yak> {
        vec![
            Yak::new(1, "Betty-1", "f", 4.0),
            Yak::new(2, "Betty-2", "f", 8.0),
            Yak::new(3, "Betty-3", "f", 9.5),
        ]
    }

    fn order(token: &str, day: i64, milk: f64, skins: u32) -> Order {
        OrderRequest::new("Medvedev", milk, skins)
            .into_order(token, day)
            .unwrap()
    }

    #[test]
    fn test_fulfillment_from_grants() {
        assert_eq!(Fulfillment::from_grants(true, true), Fulfillment::Full);
        assert_eq!(Fulfillment::from_grants(true, false), Fulfillment::Partial);
        assert_eq!(Fulfillment::from_grants(false, true), Fulfillment::Partial);
        assert_eq!(Fulfillment::from_grants(false, false), Fulfillment::None);
    }

    #[test]
    fn test_http_statuses() {
        assert_eq!(Fulfillment::Full.http_status(), 201);
        assert_eq!(Fulfillment::Partial.http_status(), 206);
        assert_eq!(Fulfillment::None.http_status(), 404);
    }

    #[test]
    fn test_fulfillment_u8_roundtrip() {
        for f in [Fulfillment::Full, Fulfillment::Partial, Fulfillment::None] {
            assert_eq!(u8_to_fulfillment(fulfillment_to_u8(f)), Some(f));
        }
        assert_eq!(u8_to_fulfillment(9), None);
    }

    #[test]
    fn test_request_from_json() {
        let req =
            OrderRequest::from_json(r#"{"customer":"Medvedev","order":{"milk":1100,"skins":3}}"#)
                .unwrap();
        assert_eq!(req, OrderRequest::new("Medvedev", 1100.0, 3));
    }

    #[test]
    fn test_request_from_json_rejects_missing_fields() {
        let err = OrderRequest::from_json(r#"{"customer":"Medvedev","order":{"milk":1}}"#)
            .unwrap_err();
        assert!(matches!(err, ShopError::MalformedRequest(_)));
    }

    #[test]
    fn test_into_order_validates() {
        let req = OrderRequest::new("Medvedev", 10.0, 1);
        assert!(matches!(
            req.clone().into_order("t", -1),
            Err(ShopError::NegativeOrderDay(-1))
        ));
        assert!(matches!(
            req.into_order("t", MAX_TIMELINE_DAY + 1),
            Err(ShopError::OrderDayOutOfRange(_))
        ));
        assert!(matches!(
            OrderRequest::new("", 1.0, 0).into_order("t", 1),
            Err(ShopError::MissingCustomer)
        ));
        assert!(matches!(
            OrderRequest::new("x", -1.0, 0).into_order("t", 1),
            Err(ShopError::InvalidMilkQuantity(_))
        ));
        assert!(matches!(
            OrderRequest::new("x", f64::INFINITY, 0).into_order("t", 1),
            Err(ShopError::InvalidMilkQuantity(_))
        ));
    }

    #[test]
    fn test_order_tokens_are_distinct() {
        assert_eq!(order_token(1), "ord-00000001");
        assert_ne!(order_token(1), order_token(2));
    }

    #[test]
    fn test_new_order_is_unresolved() {
        let o = order("t", 3, 1.0, 1);
        assert_eq!(o.received_milk, None);
        assert_eq!(o.fulfillment(), None);
    }

    #[test]
    fn test_single_order_fully_granted() {
        let herd = bettys();
        let stock = Stock::new(0.0, 3);
        let res = resolve(&herd, &stock, &[order("a", 14, 1100.0, 3)]).unwrap();
        let o = &res.orders[0];
        assert_eq!(o.received_milk, Some(1100.0));
        assert_eq!(o.received_skins, Some(3));
        assert_eq!(o.fulfillment(), Some(Fulfillment::Full));
        // 1188.81 produced over 14 days, 1 skin shaved
        assert!((res.stock.milk - 88.81).abs() < 1e-6);
        assert_eq!(res.stock.skins, 1);
    }

    #[test]
    fn test_milk_denied_skins_granted() {
        let res = resolve(
            &bettys(),
            &Stock::new(0.0, 3),
            &[order("a", 14, 1200.0, 3)],
        )
        .unwrap();
        let o = &res.orders[0];
        assert_eq!(o.received_milk, Some(0.0));
        assert_eq!(o.received_skins, Some(3));
        assert_eq!(o.fulfillment(), Some(Fulfillment::Partial));
        assert!((res.stock.milk - 1188.81).abs() < 1e-6);
    }

    #[test]
    fn test_orders_sorted_by_day_and_stable() {
        let orders = vec![
            order("late", 10, 0.0, 0),
            order("first", 2, 0.0, 0),
            order("second", 2, 0.0, 0),
        ];
        let res = resolve(&bettys(), &Stock::default(), &orders).unwrap();
        let tokens: Vec<&str> = res.orders.iter().map(|o| o.token.as_str()).collect();
        assert_eq!(tokens, ["first", "second", "late"]);
    }

    #[test]
    fn test_same_day_orders_compete_in_arrival_order() {
        let orders = vec![order("first", 13, 1000.0, 0), order("second", 13, 1000.0, 0)];
        let res = resolve(&bettys(), &Stock::default(), &orders).unwrap();
        assert_eq!(res.orders[0].fulfillment(), Some(Fulfillment::Full));
        assert_eq!(res.orders[1].received_milk, Some(0.0));
    }

    #[test]
    fn test_final_herd_is_at_last_order_day() {
        let res = resolve(&bettys(), &Stock::default(), &[order("a", 13, 0.0, 0)]).unwrap();
        assert!((res.herd[0].age - 4.13).abs() < 1e-9);
    }

    #[test]
    fn test_negative_day_is_invariant_violation() {
        let mut bad = order("bad", 1, 0.0, 0);
        bad.day = -3;
        let err = resolve(&bettys(), &Stock::default(), &[bad]).unwrap_err();
        assert!(matches!(err, ShopError::NegativeSpan { span: -3, .. }));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let orders = vec![
            order("a", 5, 100.0, 1),
            order("b", 20, 700.0, 2),
            order("c", 9, 300.0, 1),
        ];
        let stock = Stock::new(0.0, 3);
        let first = resolve(&bettys(), &stock, &orders).unwrap();
        let second = resolve(&bettys(), &stock, &orders).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_log() {
        let stock = Stock::new(0.0, 3);
        let res = resolve(&bettys(), &stock, &[]).unwrap();
        assert!(res.orders.is_empty());
        assert_eq!(res.stock, stock);
        assert_eq!(res.herd, bettys());
    }
}
