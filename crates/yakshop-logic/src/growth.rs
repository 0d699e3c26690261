//! Per-yak growth model: age, milk and wool over a span of days.
//!
//! Age is tracked in yak days while stepping. Each day:
//! 1. milk for the day is produced at the age the day starts with,
//! 2. wool accrues, except on the last day of the span (a shave happens at
//!    the start of a day and the span's last day has no next start),
//! 3. the yak ages one day,
//! 4. if the whole part of the wool accrual went up, the yak was shaved.
//!
//! The accrual restarts at zero for every span.

use serde::{Deserialize, Serialize};

use crate::config::GrowthParams;

/// One member of the herd.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Yak {
    pub id: u64,
    pub name: String,
    pub sex: String,
    /// Age in years.
    pub age: f64,
    /// Age in years at the most recent shave.
    pub age_last_shaved: Option<f64>,
    /// Milk produced during the most recent advance (litres).
    pub yield_milk: f64,
    /// Skins produced during the most recent advance.
    pub yield_skins: u32,
}

impl Yak {
    /// A fresh herd member. Mature yaks count as shaved at their current age.
    pub fn new(id: u64, name: impl Into<String>, sex: impl Into<String>, age: f64) -> Self {
        let params = GrowthParams::default();
        Self {
            id,
            name: name.into(),
            sex: sex.into(),
            age,
            age_last_shaved: params.is_mature(age).then_some(age),
            yield_milk: 0.0,
            yield_skins: 0,
        }
    }
}

/// Result of advancing one yak through a span.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub yak: Yak,
    pub milk: f64,
    pub skins: u32,
}

/// Advance a yak by `elapsed_days` with the default parameters.
pub fn advance(yak: &Yak, elapsed_days: u32) -> Advance {
    advance_with(yak, elapsed_days, &GrowthParams::default())
}

pub fn advance_with(yak: &Yak, elapsed_days: u32, params: &GrowthParams) -> Advance {
    if elapsed_days == 0 {
        return Advance {
            yak: Yak {
                yield_milk: 0.0,
                yield_skins: 0,
                ..yak.clone()
            },
            milk: 0.0,
            skins: 0,
        };
    }

    let mut age_days = params.to_days(yak.age);
    let mut age_last_shaved = yak.age_last_shaved;
    let mut milk = 0.0;
    let mut wool = 0.0_f64;

    for day in 0..elapsed_days {
        milk += params.daily_milk(age_days);

        let shaves_before = wool.floor();
        if day + 1 != elapsed_days {
            wool += params.daily_wool(age_days);
        }
        age_days += 1.0;

        if wool.floor() > shaves_before {
            age_last_shaved = Some(params.to_years(age_days));
        }
    }

    let skins = wool.floor() as u32;
    Advance {
        yak: Yak {
            age: params.to_years(age_days),
            age_last_shaved,
            yield_milk: milk,
            yield_skins: skins,
            ..yak.clone()
        },
        milk,
        skins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn betty(age: f64) -> Yak {
        Yak::new(1, "Betty-1", "f", age)
    }

    #[test]
    fn test_new_mature_yak_counts_as_shaved() {
        assert_eq!(betty(4.0).age_last_shaved, Some(4.0));
        assert_eq!(betty(0.5).age_last_shaved, None);
    }

    #[test]
    fn test_zero_days_is_identity() {
        let yak = betty(0.07);
        let out = advance(&yak, 0);
        assert_eq!(out.yak.age, yak.age);
        assert_eq!(out.yak.age_last_shaved, yak.age_last_shaved);
        assert_eq!(out.milk, 0.0);
        assert_eq!(out.skins, 0);
    }

    #[test]
    fn test_age_advances_by_whole_days() {
        let p = GrowthParams::default();
        for days in [1, 5, 13, 100] {
            let out = advance(&betty(4.0), days);
            let gained = p.to_days(out.yak.age) - p.to_days(4.0);
            assert!((gained - days as f64).abs() < 1e-6, "days={days}");
        }
    }

    #[test]
    fn test_milk_over_thirteen_days() {
        // 13 × 38 − 0.03 × (0 + 1 + … + 12)
        let out = advance(&betty(4.0), 13);
        assert!((out.milk - 491.66).abs() < 1e-9);
        assert_eq!(out.yak.yield_milk, out.milk);
    }

    #[test]
    fn test_single_day_produces_no_wool() {
        let out = advance(&betty(0.0), 1);
        assert_eq!(out.skins, 0);
        assert!((out.milk - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_last_day_does_not_accrue_wool() {
        // A 4-year-old needs just over 12 accruing days for its first shave.
        assert_eq!(advance(&betty(4.0), 13).skins, 0);
        assert_eq!(advance(&betty(4.0), 14).skins, 1);
    }

    #[test]
    fn test_shave_updates_last_shaved_age() {
        let out = advance(&betty(4.0), 14);
        assert_eq!(out.skins, 1);
        let last = out.yak.age_last_shaved.unwrap();
        assert!((last - 4.13).abs() < 1e-9);
    }

    #[test]
    fn test_no_shave_keeps_last_shaved_age() {
        let out = advance(&betty(8.0), 13);
        assert_eq!(out.skins, 0);
        assert_eq!(out.yak.age_last_shaved, Some(8.0));
    }

    #[test]
    fn test_skins_non_decreasing_with_span() {
        let yak = betty(1.5);
        let mut previous = 0;
        for days in 0..200 {
            let skins = advance(&yak, days).skins;
            assert!(skins >= previous, "days={days}");
            previous = skins;
        }
    }

    #[test]
    fn test_calf_first_shave_on_day_nine() {
        // Newborn accrues 1/8, 1/8.01, … and crosses 1.0 on the ninth accrual.
        let out = advance(&betty(0.0), 9);
        assert_eq!(out.skins, 0);
        let out = advance(&betty(0.0), 10);
        assert_eq!(out.skins, 1);
        assert!((out.yak.age_last_shaved.unwrap() - 0.09).abs() < 1e-9);
    }

    #[test]
    fn test_custom_params() {
        let params = GrowthParams {
            milk_base: 10.0,
            milk_decline_per_day: 0.0,
            ..GrowthParams::default()
        };
        let out = advance_with(&betty(4.0), 3, &params);
        assert!((out.milk - 30.0).abs() < 1e-9);
    }
}
