//! Delimited-text export of a finished record sequence.
//!
//! A pure consumer: no influence on simulation semantics. Metric floats
//! are written with two decimal places; undefined values (NaN ratios,
//! never-occurred sentinels) become empty cells.

use crate::{error::SimResult, record::MonthRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const HEADER: &str = "date,month_name,sales,stock,ingredient_stock,demand_spike,\
stock_to_sales_ratio,months_since_last_shortage,months_since_last_production_issue,\
cumulative_shortages,sales_to_stock_ratio,ingredient_stock_percentage,shortage_level,\
last_restock_amount,months_since_last_restock,trend,seasonal,residual";

pub fn write_csv(out: &mut impl Write, records: &[MonthRecord]) -> SimResult<()> {
    writeln!(out, "{HEADER}")?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            r.date.format("%Y-%m-%d"),
            r.month_name,
            float_cell(r.sales),
            float_cell(r.stock),
            float_cell(r.ingredient_stock),
            r.demand_spike,
            float_cell(r.stock_to_sales_ratio),
            optional_cell(r.months_since_last_shortage),
            optional_cell(r.months_since_last_production_issue),
            r.cumulative_shortages,
            float_cell(r.sales_to_stock_ratio),
            float_cell(r.ingredient_stock_percentage),
            r.shortage_level,
            float_cell(r.last_restock_amount),
            r.months_since_last_restock,
            optional_float_cell(r.trend),
            optional_float_cell(r.seasonal),
            optional_float_cell(r.residual),
        )?;
    }
    Ok(())
}

pub fn export_csv(path: impl AsRef<Path>, records: &[MonthRecord]) -> SimResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_csv(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

fn float_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.2}")
    }
}

fn optional_cell(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn optional_float_cell(value: Option<f64>) -> String {
    value.map(float_cell).unwrap_or_default()
}
