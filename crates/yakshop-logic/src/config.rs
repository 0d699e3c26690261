//! Growth model parameters.
//!
//! The model works on a yak calendar of 100 days per year. Milk output falls
//! linearly with age and the interval between shaves grows linearly with age.
//! All constants live in [`GrowthParams`] so harnesses can tweak them; the
//! server always runs with [`GrowthParams::default`].

use serde::{Deserialize, Serialize};

/// Tunable constants of the per-yak growth model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    /// Days in one yak year.
    pub days_per_year: f64,
    /// Litres of milk per day for a newborn yak.
    pub milk_base: f64,
    /// Litres of daily milk lost per day of age.
    pub milk_decline_per_day: f64,
    /// Days between shaves for a newborn yak.
    pub shave_interval_base: f64,
    /// Additional days between shaves per day of age.
    pub shave_interval_growth: f64,
    /// Age in years from which a yak carries a shaveable coat at startup.
    pub maturity_years: f64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            days_per_year: 100.0,
            milk_base: 50.0,
            milk_decline_per_day: 0.03,
            shave_interval_base: 8.0,
            shave_interval_growth: 0.01,
            maturity_years: 1.0,
        }
    }
}

impl GrowthParams {
    /// Convert an age in years to yak days.
    pub fn to_days(&self, years: f64) -> f64 {
        years * self.days_per_year
    }

    /// Convert an age in yak days to years.
    pub fn to_years(&self, days: f64) -> f64 {
        days / self.days_per_year
    }

    /// Milk produced on a day that starts at `age_days`. Goes negative past
    /// `milk_base / milk_decline_per_day` days of age.
    pub fn daily_milk(&self, age_days: f64) -> f64 {
        self.milk_base - self.milk_decline_per_day * age_days
    }

    /// Fraction of a shave accrued on a day that starts at `age_days`.
    pub fn daily_wool(&self, age_days: f64) -> f64 {
        1.0 / (self.shave_interval_base + self.shave_interval_growth * age_days)
    }

    pub fn is_mature(&self, age_years: f64) -> bool {
        age_years >= self.maturity_years
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_calendar() {
        let p = GrowthParams::default();
        assert_eq!(p.to_days(4.0), 400.0);
        assert_eq!(p.to_years(950.0), 9.5);
    }

    #[test]
    fn test_daily_milk_declines_with_age() {
        let p = GrowthParams::default();
        assert!((p.daily_milk(0.0) - 50.0).abs() < 1e-9);
        assert!((p.daily_milk(400.0) - 38.0).abs() < 1e-9);
        assert!(p.daily_milk(800.0) < p.daily_milk(400.0));
    }

    #[test]
    fn test_daily_milk_is_linear_past_dry_age() {
        let p = GrowthParams::default();
        // 20-year-old yak: 50 - 60
        assert!((p.daily_milk(2000.0) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_wool_interval() {
        let p = GrowthParams::default();
        // 4-year-old yak: one shave every 12 days
        assert!((p.daily_wool(400.0) - 1.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_maturity_threshold_inclusive() {
        let p = GrowthParams::default();
        assert!(p.is_mature(1.0));
        assert!(!p.is_mature(0.99));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let p: GrowthParams = serde_json::from_str(r#"{"milk_base": 60.0}"#).unwrap();
        assert_eq!(p.milk_base, 60.0);
        assert_eq!(p.days_per_year, 100.0);
    }
}
