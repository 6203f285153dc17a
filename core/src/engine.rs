//! The simulation engine — a month-by-month recurrence over
//! pharmaceutical supply-chain state.
//!
//! EXECUTION ORDER within one month (fixed, documented, never reordered):
//!   1. Demand       (seasonal baseline + noise + spike)
//!   2. Production   (ingredient-constrained, issue penalty)
//!   3. Stock update
//!   4. Shortage classification
//!   5. Boost scheduling
//!   6. Ingredient restock
//!   7. Sales guardrail
//!   8. Derived metrics
//!
//! RULES:
//!   - Each month reads only the prior month's state (first-order
//!     recurrence); months are never parallelized or reordered.
//!   - All randomness flows through the run's SimRng; the draw order
//!     documented in rng.rs is part of the observable contract.
//!   - State is owned exclusively by the engine and never exposed
//!     to callers mid-run. The record sequence is the sole output.
//!   - No I/O happens inside the loop; persistence and export consume
//!     the finished records.

use crate::{
    config::SimulationConfig,
    error::SimResult,
    event::{EventSink, LogSink, SimEvent},
    record::MonthRecord,
    rng::SimRng,
    types::MonthIndex,
};
use chrono::Months;

pub struct SimEngine {
    config: SimulationConfig,
}

/// Mutable per-run state. Lives for exactly one `simulate()` call.
struct SimulationState {
    finished_stock: f64,
    ingredient_stock: f64,
    last_shortage_month: Option<MonthIndex>,
    last_production_issue_month: Option<MonthIndex>,
    last_restock_month: Option<MonthIndex>,
    cumulative_shortages: u32,
    /// Scheduled boost window [start, end), `None` when neither
    /// scheduled nor active.
    boost_window: Option<(MonthIndex, MonthIndex)>,
}

impl SimulationState {
    fn new(config: &SimulationConfig) -> Self {
        Self {
            finished_stock: config.initial_pharma_stock,
            ingredient_stock: config.initial_ingredient_stock,
            last_shortage_month: None,
            last_production_issue_month: None,
            last_restock_month: None,
            cumulative_shortages: 0,
            boost_window: None,
        }
    }

    fn boost_active(&self, month: MonthIndex) -> bool {
        matches!(self.boost_window, Some((start, end)) if month >= start && month < end)
    }
}

impl SimEngine {
    /// Validates the config; a constructed engine cannot fail mid-run.
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run the full simulation, routing events to the log facade.
    pub fn simulate(&self) -> SimResult<Vec<MonthRecord>> {
        self.simulate_with(&mut LogSink)
    }

    /// Run the full simulation with an injected event observer.
    ///
    /// The RNG is reseeded at entry: two calls with the same fixed seed
    /// produce byte-identical record sequences.
    pub fn simulate_with(&self, sink: &mut dyn EventSink) -> SimResult<Vec<MonthRecord>> {
        let seed = self.config.random_seed.unwrap_or_else(entropy_seed);
        let mut rng = SimRng::new(seed);
        sink.record(&SimEvent::RunInitialized { seed });

        let mut state = SimulationState::new(&self.config);
        let months = self.config.months_to_simulate;
        let mut records = Vec::with_capacity(months as usize);
        for month in 0..months {
            records.push(self.month_step(month, &mut state, &mut rng, sink));
        }
        Ok(records)
    }

    /// One step of the recurrence. Infallible: every update is clamped,
    /// every ratio guards its denominator.
    fn month_step(
        &self,
        month: MonthIndex,
        state: &mut SimulationState,
        rng: &mut SimRng,
        sink: &mut dyn EventSink,
    ) -> MonthRecord {
        let cfg = &self.config;
        let date = cfg.start_date + Months::new(month);
        let seasonal = cfg.seasonal_factor(date);

        // 1. Demand
        let base_demand = cfg.population * cfg.per_capita_daily_demand * 30.0 * seasonal;
        let mut demand = (base_demand + rng.normal(0.0, cfg.demand_variance)).max(0.0);
        let mut spiked = false;
        if rng.chance(cfg.demand_spike_probability) {
            let factor = rng.uniform(cfg.demand_spike_min, cfg.demand_spike_max);
            demand *= factor;
            spiked = true;
            sink.record(&SimEvent::DemandSpike { month, factor });
        }

        // 2. Production — ingredient-constrained hard clamp, not an error.
        let mut production = cfg.max_production_capacity;
        let required = production * cfg.production_cycle_ratio;
        if state.ingredient_stock >= required {
            state.ingredient_stock -= required;
        } else {
            production = state.ingredient_stock / cfg.production_cycle_ratio;
            state.ingredient_stock = 0.0;
        }
        if rng.chance(cfg.production_issue_probability) {
            production *= cfg.production_issue_penalty;
            state.last_production_issue_month = Some(month);
            sink.record(&SimEvent::ProductionIssue {
                month,
                penalty: cfg.production_issue_penalty,
            });
        }

        // 3. Stock update
        state.finished_stock =
            (state.finished_stock + production).clamp(0.0, cfg.max_pharma_stock);

        // 4. Shortage classification on post-production, pre-sales stock.
        let level = shortage_level(state.finished_stock, cfg.max_pharma_stock);
        if level >= cfg.shortage_threshold {
            state.cumulative_shortages += 1;
            state.last_shortage_month = Some(month);
            sink.record(&SimEvent::ShortageRecorded {
                month,
                level,
                cumulative: state.cumulative_shortages,
            });
        }

        // 5. Boost scheduling — one window at a time; a new boost can be
        // scheduled only after the previous window expires.
        if let Some(boost) = &cfg.production_boost {
            if let Some((_, end)) = state.boost_window {
                if month >= end {
                    state.boost_window = None;
                }
            }
            if state.boost_window.is_none() && level >= boost.trigger_level {
                let start = month + boost.delay_months;
                let end = start + boost.duration_months;
                state.boost_window = Some((start, end));
                sink.record(&SimEvent::BoostScheduled { month, start, end });
            }
        }

        // 6. Ingredient restock
        let mut restock_amount = 0.0;
        if month % cfg.ingredient_restock_interval == 0 {
            let mut amount =
                (cfg.ingredient_restock_amount + rng.normal(0.0, cfg.restock_variance)).max(0.0);
            let boosted = state.boost_active(month);
            if boosted {
                if let Some(boost) = &cfg.production_boost {
                    amount *= boost.restock_multiplier;
                }
            }
            state.ingredient_stock =
                (state.ingredient_stock + amount).clamp(0.0, cfg.max_ingredient_stock);
            state.last_restock_month = Some(month);
            restock_amount = amount;
            sink.record(&SimEvent::IngredientRestock {
                month,
                amount,
                boosted,
            });
        }

        // 7. Sales guardrail. The floor is at most the full stock, and the
        // capped demand never exceeds it, so stock stays non-negative.
        let cap = if state.finished_stock < cfg.max_pharma_stock * cfg.sales_cap_stock_fraction {
            state.finished_stock * cfg.sales_cap_ratio
        } else {
            state.finished_stock
        };
        let floor = state.finished_stock * cfg.sales_floor_ratio;
        let sales = state.finished_stock.min(demand).min(cap).max(floor);
        state.finished_stock =
            (state.finished_stock - sales).clamp(0.0, cfg.max_pharma_stock);

        // 8. Derived metrics. Zero denominators yield NaN, never a panic.
        let sales_to_stock_ratio = if state.finished_stock > 0.0 {
            sales / state.finished_stock
        } else {
            f64::NAN
        };
        let stock_to_sales_ratio = if sales > 0.0 {
            state.finished_stock / sales
        } else {
            f64::NAN
        };
        let ingredient_stock_percentage = if cfg.max_ingredient_stock > 0.0 {
            state.ingredient_stock / cfg.max_ingredient_stock * 100.0
        } else {
            0.0
        };

        log::debug!(
            "month={month} demand={demand:.0} production={production:.0} stock={:.0} \
             ingredient={:.0} level={level}",
            state.finished_stock,
            state.ingredient_stock,
        );

        MonthRecord {
            date,
            month_name: date.format("%B").to_string(),
            sales,
            stock: state.finished_stock,
            ingredient_stock: state.ingredient_stock,
            demand_spike: spiked as u8,
            stock_to_sales_ratio,
            months_since_last_shortage: state.last_shortage_month.map(|last| month - last),
            months_since_last_production_issue: state
                .last_production_issue_month
                .map(|last| month - last),
            cumulative_shortages: state.cumulative_shortages,
            sales_to_stock_ratio,
            ingredient_stock_percentage,
            shortage_level: level,
            last_restock_amount: restock_amount,
            months_since_last_restock: month - state.last_restock_month.unwrap_or(0),
            trend: None,
            seasonal: None,
            residual: None,
        }
    }
}

/// Linear map from the stock/capacity ratio to a 1–10 severity scale,
/// inverted: lower stock means higher severity.
fn shortage_level(stock: f64, max_stock: f64) -> u8 {
    let ratio = stock / max_stock;
    (((1.0 - ratio) * 9.0).round() as i32 + 1).clamp(1, 10) as u8
}

/// Seed source for runs without a pinned seed. Only reached when the
/// config leaves `random_seed` unset.
fn entropy_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
