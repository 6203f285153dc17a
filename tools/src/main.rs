//! sim-runner: headless simulation runner.
//!
//! Usage:
//!   sim-runner --seed 42 --months 120 --db run.db --csv results.csv
//!   sim-runner --seed 42 --months 120 --eval

use anyhow::Result;
use pharmasim_core::{
    config::SimulationConfig,
    decompose::decompose_sales,
    engine::SimEngine,
    export,
    model::{self, LinearRegression, StandardScaler},
    record::MonthRecord,
    store::{Dataset, SimStore},
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let months = parse_arg(&args, "--months", 120u32);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let csv_out = args
        .windows(2)
        .find(|w| w[0] == "--csv")
        .map(|w| w[1].as_str());
    let eval = args.iter().any(|a| a == "--eval");

    println!("pharmasim — sim-runner");
    println!("  seed:   {seed}");
    println!("  months: {months}");
    println!("  db:     {db}");
    println!();

    let store = SimStore::open(db)?;
    store.migrate()?;

    // Training and testing datasets come from two seeds so the model
    // never sees its evaluation months.
    let training = run_dataset(&store, Dataset::Training, seed, months)?;
    let testing = run_dataset(&store, Dataset::Testing, seed.wrapping_add(1), months)?;

    if let Some(path) = csv_out {
        export::export_csv(path, &training)?;
        println!("Training dataset written to {path}");
    }

    print_summary(&training);

    if eval {
        evaluate(&training, &testing)?;
    }

    Ok(())
}

fn run_dataset(
    store: &SimStore,
    dataset: Dataset,
    seed: u64,
    months: u32,
) -> Result<Vec<MonthRecord>> {
    let expected = months as usize;
    if store.is_complete(dataset, expected)? {
        println!(
            "{} data already complete, loading from database",
            dataset.as_str()
        );
        return Ok(store.load_records(dataset)?);
    }

    log::info!("simulating {} dataset with seed {seed}", dataset.as_str());
    let config = SimulationConfig {
        random_seed: Some(seed),
        months_to_simulate: months,
        ..SimulationConfig::default_preset()
    };
    let engine = SimEngine::new(config)?;
    let mut records = engine.simulate()?;
    decompose_sales(&mut records);

    store.clear(dataset)?;
    store.save_records(dataset, &records)?;
    Ok(records)
}

fn print_summary(records: &[MonthRecord]) {
    let total_sales: f64 = records.iter().map(|r| r.sales).sum();
    let worst = records.iter().map(|r| r.shortage_level).max().unwrap_or(1);

    println!("=== RUN SUMMARY ===");
    println!("  months simulated:  {}", records.len());
    println!("  total sales:       {total_sales:.0}");
    println!("  worst level:       {worst}");
    if let Some(last) = records.last() {
        println!("  final stock:       {:.0}", last.stock);
        println!("  final ingredient:  {:.0}", last.ingredient_stock);
        println!("  shortage months:   {}", last.cumulative_shortages);
    }
}

fn evaluate(training: &[MonthRecord], testing: &[MonthRecord]) -> Result<()> {
    let (train_x_raw, train_y) = model::feature_target_split(training);
    let (test_x_raw, test_y) = model::feature_target_split(testing);

    let scaler = StandardScaler::fit(&train_x_raw);
    let train_x = scaler.transform(&train_x_raw);
    let test_x = scaler.transform(&test_x_raw);

    let regression = LinearRegression::fit(&train_x, &train_y)?;
    let rfo_mse = model::rolling_forecast_origin(&train_x, &train_y, 5)?;

    println!();
    println!("=== SHORTAGE-LEVEL REGRESSION ===");
    for horizon in [3usize, 6, 12] {
        let mse = model::evaluate_horizon(&regression, &test_x, &test_y, horizon);
        println!("  MSE @ {horizon:>2} months: {mse:.4}");
    }
    println!("  RFO MSE (5 folds): {rfo_mse:.4}");
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
