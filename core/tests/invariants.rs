//! Run-wide invariants: bounds, monotonicity, length, ratio safety.
//!
//! These hold for every seed — a violation is an ArithmeticDefect in
//! the engine, never an acceptable outcome.

use pharmasim_core::{config::SimulationConfig, engine::SimEngine};

#[test]
fn stocks_and_levels_stay_bounded_for_many_seeds() {
    let _ = env_logger::builder().is_test(true).try_init();
    for seed in [1u64, 7, 42, 1234, 0xDEAD_BEEF] {
        let config = SimulationConfig {
            random_seed: Some(seed),
            months_to_simulate: 60,
            ..SimulationConfig::default_preset()
        };
        let max_stock = config.max_pharma_stock;
        let max_ingredient = config.max_ingredient_stock;
        let engine = SimEngine::new(config).expect("valid config");
        let records = engine.simulate().expect("run");

        for (i, r) in records.iter().enumerate() {
            assert!(
                (0.0..=max_stock).contains(&r.stock),
                "seed {seed} month {i}: stock {} out of [0, {max_stock}]",
                r.stock
            );
            assert!(
                (0.0..=max_ingredient).contains(&r.ingredient_stock),
                "seed {seed} month {i}: ingredient {} out of [0, {max_ingredient}]",
                r.ingredient_stock
            );
            assert!(
                (1..=10).contains(&r.shortage_level),
                "seed {seed} month {i}: shortage level {} out of [1, 10]",
                r.shortage_level
            );
            assert!(r.sales >= 0.0, "seed {seed} month {i}: negative sales");
        }
    }
}

#[test]
fn cumulative_shortages_never_decrease() {
    let engine = SimEngine::new(SimulationConfig {
        random_seed: Some(42),
        months_to_simulate: 120,
        ..SimulationConfig::default_preset()
    })
    .expect("valid config");
    let records = engine.simulate().expect("run");

    let mut previous = 0;
    for (i, r) in records.iter().enumerate() {
        assert!(
            r.cumulative_shortages >= previous,
            "month {i}: cumulative shortages fell from {previous} to {}",
            r.cumulative_shortages
        );
        previous = r.cumulative_shortages;
    }
}

#[test]
fn output_length_equals_months_to_simulate() {
    for months in [1u32, 12, 120] {
        let engine = SimEngine::new(SimulationConfig {
            random_seed: Some(7),
            months_to_simulate: months,
            ..SimulationConfig::default_preset()
        })
        .expect("valid config");
        let records = engine.simulate().expect("run");
        assert_eq!(records.len(), months as usize);
    }
}

#[test]
fn dates_advance_one_calendar_month_at_a_time() {
    let engine = SimEngine::new(SimulationConfig {
        random_seed: Some(7),
        months_to_simulate: 14,
        ..SimulationConfig::default_preset()
    })
    .expect("valid config");
    let records = engine.simulate().expect("run");

    assert_eq!(records[0].date.to_string(), "2024-01-01");
    assert_eq!(records[0].month_name, "January");
    assert_eq!(records[11].month_name, "December");
    assert_eq!(records[12].date.to_string(), "2025-01-01");
    for pair in records.windows(2) {
        assert!(pair[0].date < pair[1].date, "dates out of order");
    }
}

/// Drain the stock completely: a floor ratio of 1.0 sells everything in
/// month 0, and with no production or restock the stock stays at zero.
/// Every zero denominator must surface as NaN, never as a panic or a
/// silent 0.0.
#[test]
fn zero_denominators_yield_nan_markers() {
    let config = SimulationConfig {
        random_seed: Some(42),
        months_to_simulate: 6,
        max_production_capacity: 0.0,
        initial_ingredient_stock: 0.0,
        ingredient_restock_amount: 0.0,
        demand_variance: 0.0,
        restock_variance: 0.0,
        demand_spike_probability: 0.0,
        production_issue_probability: 0.0,
        sales_floor_ratio: 1.0,
        ..SimulationConfig::default_preset()
    };
    let engine = SimEngine::new(config).expect("valid config");
    let records = engine.simulate().expect("run");

    // Month 0: everything sells, stock hits zero.
    assert!(records[0].sales > 0.0);
    assert_eq!(records[0].stock, 0.0);
    assert!(
        records[0].sales_to_stock_ratio.is_nan(),
        "sales/stock with zero stock must be NaN"
    );
    assert!(records[0].stock_to_sales_ratio.is_finite());

    // Later months: no stock, no sales — both ratios undefined.
    for (i, r) in records.iter().enumerate().skip(1) {
        assert_eq!(r.sales, 0.0, "month {i}: sales from empty stock");
        assert!(r.sales_to_stock_ratio.is_nan(), "month {i}");
        assert!(r.stock_to_sales_ratio.is_nan(), "month {i}");
    }
}
