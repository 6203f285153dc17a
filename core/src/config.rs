//! Simulation configuration.
//!
//! All behavioral constants live here — restock cadence, variances,
//! thresholds, guardrail ratios, seasonality — so behavioral variants
//! are config presets, not code forks. A config is validated once,
//! before any simulation step runs; a config that passes `validate()`
//! cannot produce an arithmetic error mid-run.

use crate::error::{SimError, SimResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Shortage-triggered production boost: once shortage severity reaches
/// `trigger_level`, ingredient restocks are multiplied by
/// `restock_multiplier` for `duration_months`, starting `delay_months`
/// after the trigger (supplier ramp-up time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostPolicy {
    pub trigger_level: u8,
    pub delay_months: u32,
    pub duration_months: u32,
    pub restock_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Fixed seed makes the run fully deterministic. `None` derives a
    /// fresh seed at each `simulate()` call.
    pub random_seed: Option<u64>,
    pub months_to_simulate: u32,
    /// First simulated month. Must be the first day of a month.
    pub start_date: NaiveDate,

    // ── Finished-product stock ─────────────────────────────────
    pub initial_pharma_stock: f64,
    pub max_pharma_stock: f64,

    // ── Demand ─────────────────────────────────────────────────
    pub population: f64,
    pub per_capita_daily_demand: f64,
    pub demand_variance: f64,
    pub demand_spike_probability: f64,
    pub demand_spike_min: f64,
    pub demand_spike_max: f64,
    /// Multiplicative factor per calendar month, January first.
    pub seasonality: [f64; 12],

    // ── Production ─────────────────────────────────────────────
    pub max_production_capacity: f64,
    pub production_variance: f64,
    /// Ingredient units consumed per finished unit produced.
    pub production_cycle_ratio: f64,
    pub production_issue_probability: f64,
    pub production_issue_penalty: f64,

    // ── Raw ingredient (Wirkstoff) ─────────────────────────────
    pub initial_ingredient_stock: f64,
    pub max_ingredient_stock: f64,
    pub ingredient_restock_amount: f64,
    /// Months between scheduled ingredient restocks.
    pub ingredient_restock_interval: u32,
    pub restock_variance: f64,

    // ── Shortage & sales policy ────────────────────────────────
    /// Severity at or above which a month counts as a shortage event.
    pub shortage_threshold: u8,
    /// Sales are capped at this fraction of stock while stock is below
    /// `sales_cap_stock_fraction` of maximum.
    pub sales_cap_ratio: f64,
    pub sales_cap_stock_fraction: f64,
    /// Contractual minimum: this fraction of stock is always sold.
    pub sales_floor_ratio: f64,

    pub production_boost: Option<BoostPolicy>,
}

impl SimulationConfig {
    /// Canonical preset: the most elaborate simulator variant.
    pub fn default_preset() -> Self {
        Self {
            random_seed: None,
            months_to_simulate: 120,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),

            initial_pharma_stock: 3_000_000.0,
            max_pharma_stock: 6_000_000.0,

            population: 1_000_000.0,
            per_capita_daily_demand: 0.007,
            demand_variance: 650_000.0,
            demand_spike_probability: 0.06,
            demand_spike_min: 1.5,
            demand_spike_max: 2.0,
            seasonality: [
                1.2, 1.1, 1.0, 0.9, 0.8, 0.6, // Jan–Jun
                0.7, 0.7, 0.8, 1.0, 1.3, 1.4, // Jul–Dec
            ],

            max_production_capacity: 380_000.0,
            production_variance: 300_000.0,
            production_cycle_ratio: 1.25,
            production_issue_probability: 0.05,
            production_issue_penalty: 0.9,

            initial_ingredient_stock: 2_000_000.0,
            max_ingredient_stock: 6_000_000.0,
            ingredient_restock_amount: 1_400_000.0,
            ingredient_restock_interval: 3,
            restock_variance: 500_000.0,

            shortage_threshold: 7,
            sales_cap_ratio: 0.65,
            sales_cap_stock_fraction: 0.75,
            sales_floor_ratio: 0.02,

            production_boost: Some(BoostPolicy {
                trigger_level: 7,
                delay_months: 3,
                duration_months: 3,
                restock_multiplier: 1.5,
            }),
        }
    }

    /// Small pinned config for unit tests: short run, fixed seed.
    pub fn default_test() -> Self {
        Self {
            random_seed: Some(42),
            months_to_simulate: 24,
            ..Self::default_preset()
        }
    }

    /// Seasonal factor for a calendar date.
    pub fn seasonal_factor(&self, date: NaiveDate) -> f64 {
        self.seasonality[date.month0() as usize]
    }

    /// Fail fast on invalid or inconsistent values. Nothing simulates
    /// until this passes.
    pub fn validate(&self) -> SimResult<()> {
        fn fail(reason: impl Into<String>) -> SimResult<()> {
            Err(SimError::invalid_config(reason))
        }

        if self.months_to_simulate == 0 {
            return fail("months_to_simulate must be positive");
        }
        if self.start_date.day() != 1 {
            return fail(format!(
                "start_date {} must be the first day of a month",
                self.start_date
            ));
        }
        if self.initial_pharma_stock <= 0.0 || self.max_pharma_stock <= 0.0 {
            return fail("pharma stock bounds must be positive");
        }
        if self.max_pharma_stock < self.initial_pharma_stock {
            return fail(format!(
                "max_pharma_stock {} is below initial_pharma_stock {}",
                self.max_pharma_stock, self.initial_pharma_stock
            ));
        }
        if self.population <= 0.0 {
            return fail("population must be positive");
        }
        if self.per_capita_daily_demand <= 0.0 {
            return fail("per_capita_daily_demand must be positive");
        }
        if self.demand_variance < 0.0
            || self.production_variance < 0.0
            || self.restock_variance < 0.0
        {
            return fail("variances must be non-negative");
        }
        for (p, name) in [
            (self.demand_spike_probability, "demand_spike_probability"),
            (
                self.production_issue_probability,
                "production_issue_probability",
            ),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return fail(format!("{name} {p} outside [0, 1]"));
            }
        }
        if self.demand_spike_min <= 0.0 || self.demand_spike_max < self.demand_spike_min {
            return fail("demand spike range must satisfy 0 < min <= max");
        }
        if let Some(factor) = self.seasonality.iter().find(|f| **f <= 0.0) {
            return fail(format!("seasonality factor {factor} must be positive"));
        }
        if self.max_production_capacity < 0.0 {
            return fail("max_production_capacity must be non-negative");
        }
        if self.production_cycle_ratio <= 0.0 {
            return fail("production_cycle_ratio must be positive");
        }
        if !(0.0..=1.0).contains(&self.production_issue_penalty)
            || self.production_issue_penalty == 0.0
        {
            return fail("production_issue_penalty must be in (0, 1]");
        }
        if self.initial_ingredient_stock < 0.0 {
            return fail("initial_ingredient_stock must be non-negative");
        }
        if self.max_ingredient_stock < self.initial_ingredient_stock {
            return fail(format!(
                "max_ingredient_stock {} is below initial_ingredient_stock {}",
                self.max_ingredient_stock, self.initial_ingredient_stock
            ));
        }
        if self.ingredient_restock_amount < 0.0 {
            return fail("ingredient_restock_amount must be non-negative");
        }
        if self.ingredient_restock_interval == 0 {
            return fail("ingredient_restock_interval must be positive");
        }
        if !(1..=10).contains(&self.shortage_threshold) {
            return fail("shortage_threshold must be in [1, 10]");
        }
        if !(0.0..=1.0).contains(&self.sales_cap_ratio) || self.sales_cap_ratio == 0.0 {
            return fail("sales_cap_ratio must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.sales_cap_stock_fraction)
            || self.sales_cap_stock_fraction == 0.0
        {
            return fail("sales_cap_stock_fraction must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.sales_floor_ratio) {
            return fail("sales_floor_ratio must be in [0, 1]");
        }
        if let Some(boost) = &self.production_boost {
            if boost.duration_months == 0 {
                return fail("boost duration_months must be positive");
            }
            if boost.restock_multiplier <= 0.0 {
                return fail("boost restock_multiplier must be positive");
            }
            if !(1..=10).contains(&boost.trigger_level) {
                return fail("boost trigger_level must be in [1, 10]");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_is_valid() {
        SimulationConfig::default_preset().validate().unwrap();
        SimulationConfig::default_test().validate().unwrap();
    }

    #[test]
    fn seasonal_factor_follows_calendar_month() {
        let config = SimulationConfig::default_preset();
        let june = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(config.seasonal_factor(june), 0.6);
        let december = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(config.seasonal_factor(december), 1.4);
    }
}
