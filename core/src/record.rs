//! The per-month output row.

use crate::types::MonthIndex;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of simulation output. Immutable once emitted; the record
/// sequence is ordered by month (insertion order = calendar order).
///
/// Ratio fields hold `f64::NAN` when their denominator was zero — an
/// explicit "undefined" marker, never a silent 0.0. The `months_since_*`
/// sentinels are `None` until the respective event first occurs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthRecord {
    pub date: NaiveDate,
    pub month_name: String,
    pub sales: f64,
    pub stock: f64,
    pub ingredient_stock: f64,
    /// 1 when this month's demand was spiked, else 0.
    pub demand_spike: u8,
    /// stock / sales, NaN when sales is 0.
    pub stock_to_sales_ratio: f64,
    pub months_since_last_shortage: Option<MonthIndex>,
    pub months_since_last_production_issue: Option<MonthIndex>,
    pub cumulative_shortages: u32,
    /// sales / stock, NaN when stock is 0.
    pub sales_to_stock_ratio: f64,
    pub ingredient_stock_percentage: f64,
    /// Severity 1 (full stock) to 10 (empty).
    pub shortage_level: u8,
    /// Ingredient units added this month, 0.0 on non-restock months.
    pub last_restock_amount: f64,
    pub months_since_last_restock: MonthIndex,
    // Filled by the decomposition post-pass.
    pub trend: Option<f64>,
    pub seasonal: Option<f64>,
    pub residual: Option<f64>,
}
