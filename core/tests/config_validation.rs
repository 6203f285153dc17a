//! Configuration errors are fatal and fire before any simulation step.

use pharmasim_core::{
    config::{BoostPolicy, SimulationConfig},
    engine::SimEngine,
    error::SimError,
};

fn assert_rejected(config: SimulationConfig, what: &str) {
    match SimEngine::new(config) {
        Err(SimError::InvalidConfig { reason }) => {
            assert!(!reason.is_empty(), "{what}: empty reason");
        }
        Err(other) => panic!("{what}: wrong error kind: {other}"),
        Ok(_) => panic!("{what}: invalid config was accepted"),
    }
}

#[test]
fn max_stock_below_initial_is_rejected() {
    assert_rejected(
        SimulationConfig {
            initial_pharma_stock: 6_000_000.0,
            max_pharma_stock: 3_000_000.0,
            ..SimulationConfig::default_test()
        },
        "max < initial",
    );
}

#[test]
fn zero_months_is_rejected() {
    assert_rejected(
        SimulationConfig {
            months_to_simulate: 0,
            ..SimulationConfig::default_test()
        },
        "zero months",
    );
}

#[test]
fn zero_restock_interval_is_rejected() {
    assert_rejected(
        SimulationConfig {
            ingredient_restock_interval: 0,
            ..SimulationConfig::default_test()
        },
        "zero restock interval",
    );
}

#[test]
fn negative_variance_is_rejected() {
    assert_rejected(
        SimulationConfig {
            demand_variance: -1.0,
            ..SimulationConfig::default_test()
        },
        "negative variance",
    );
}

#[test]
fn non_positive_seasonality_is_rejected() {
    let mut config = SimulationConfig::default_test();
    config.seasonality[5] = 0.0;
    assert_rejected(config, "zero seasonality factor");
}

#[test]
fn out_of_range_probability_is_rejected() {
    assert_rejected(
        SimulationConfig {
            demand_spike_probability: 1.5,
            ..SimulationConfig::default_test()
        },
        "probability above 1",
    );
}

#[test]
fn inverted_spike_range_is_rejected() {
    assert_rejected(
        SimulationConfig {
            demand_spike_min: 2.0,
            demand_spike_max: 1.5,
            ..SimulationConfig::default_test()
        },
        "inverted spike range",
    );
}

#[test]
fn mid_month_start_date_is_rejected() {
    assert_rejected(
        SimulationConfig {
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            ..SimulationConfig::default_test()
        },
        "mid-month start date",
    );
}

#[test]
fn zero_duration_boost_is_rejected() {
    assert_rejected(
        SimulationConfig {
            production_boost: Some(BoostPolicy {
                trigger_level: 7,
                delay_months: 3,
                duration_months: 0,
                restock_multiplier: 1.5,
            }),
            ..SimulationConfig::default_test()
        },
        "zero-duration boost",
    );
}

#[test]
fn ingredient_max_below_initial_is_rejected() {
    assert_rejected(
        SimulationConfig {
            initial_ingredient_stock: 2_000_000.0,
            max_ingredient_stock: 1_000_000.0,
            ..SimulationConfig::default_test()
        },
        "ingredient max < initial",
    );
}
