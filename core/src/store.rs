//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database. The engine never sees a
//! connection — it hands the finished record sequence to the store.
//!
//! `dates` is the unique business key: saving a second dataset (or
//! re-running over the same calendar span) upserts dates idempotently
//! and never duplicates a date row. Metric rows are inserted once per
//! simulation run. NaN ratio fields round-trip through SQL NULL.

use crate::{error::SimResult, record::MonthRecord, types::MonthIndex};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

/// Which partition a record sequence belongs to: the training split the
/// regressor fits on, or the held-out testing split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Training,
    Testing,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Testing => "testing",
        }
    }
}

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the simulation database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance (no-op for :memory:).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_schema.sql"))?;
        Ok(())
    }

    /// Insert one metric row per record, upserting the date dimension.
    pub fn save_records(&self, dataset: Dataset, records: &[MonthRecord]) -> SimResult<()> {
        for record in records {
            let date_id = self.upsert_date(record.date, &record.month_name)?;
            self.conn.execute(
                "INSERT INTO simulation_data (
                    dataset, date_id, sales, stock, ingredient_stock, demand_spike,
                    stock_to_sales_ratio, months_since_last_shortage,
                    months_since_last_production_issue, cumulative_shortages,
                    sales_to_stock_ratio, ingredient_stock_percentage, shortage_level,
                    last_restock_amount, months_since_last_restock,
                    trend, seasonal, residual
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                          ?14, ?15, ?16, ?17, ?18)",
                params![
                    dataset.as_str(),
                    date_id,
                    record.sales,
                    record.stock,
                    record.ingredient_stock,
                    record.demand_spike as i64,
                    ratio_to_sql(record.stock_to_sales_ratio),
                    record.months_since_last_shortage.map(|m| m as i64),
                    record.months_since_last_production_issue.map(|m| m as i64),
                    record.cumulative_shortages as i64,
                    ratio_to_sql(record.sales_to_stock_ratio),
                    record.ingredient_stock_percentage,
                    record.shortage_level as i64,
                    record.last_restock_amount,
                    record.months_since_last_restock as i64,
                    record.trend,
                    record.seasonal,
                    record.residual,
                ],
            )?;
        }
        Ok(())
    }

    /// Load a dataset back, in simulation order, unchanged.
    pub fn load_records(&self, dataset: Dataset) -> SimResult<Vec<MonthRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.date, d.month_name, s.sales, s.stock, s.ingredient_stock,
                    s.demand_spike, s.stock_to_sales_ratio, s.months_since_last_shortage,
                    s.months_since_last_production_issue, s.cumulative_shortages,
                    s.sales_to_stock_ratio, s.ingredient_stock_percentage,
                    s.shortage_level, s.last_restock_amount, s.months_since_last_restock,
                    s.trend, s.seasonal, s.residual
             FROM simulation_data s
             JOIN dates d ON d.date_id = s.date_id
             WHERE s.dataset = ?1
             ORDER BY s.id ASC",
        )?;
        let rows = stmt.query_map(params![dataset.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                MonthRecord {
                    date: NaiveDate::MIN, // replaced after parsing column 0
                    month_name: row.get(1)?,
                    sales: row.get(2)?,
                    stock: row.get(3)?,
                    ingredient_stock: row.get(4)?,
                    demand_spike: row.get::<_, i64>(5)? as u8,
                    stock_to_sales_ratio: sql_to_ratio(row.get(6)?),
                    months_since_last_shortage: row
                        .get::<_, Option<i64>>(7)?
                        .map(|m| m as MonthIndex),
                    months_since_last_production_issue: row
                        .get::<_, Option<i64>>(8)?
                        .map(|m| m as MonthIndex),
                    cumulative_shortages: row.get::<_, i64>(9)? as u32,
                    sales_to_stock_ratio: sql_to_ratio(row.get(10)?),
                    ingredient_stock_percentage: row.get(11)?,
                    shortage_level: row.get::<_, i64>(12)? as u8,
                    last_restock_amount: row.get(13)?,
                    months_since_last_restock: row.get::<_, i64>(14)? as MonthIndex,
                    trend: row.get(15)?,
                    seasonal: row.get(16)?,
                    residual: row.get(17)?,
                },
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (date_text, mut record) = row?;
            record.date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("Corrupt date '{date_text}' in store: {e}"))?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn record_count(&self, dataset: Dataset) -> SimResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM simulation_data WHERE dataset = ?1",
            params![dataset.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// True when the dataset already holds a full run of `expected` rows.
    pub fn is_complete(&self, dataset: Dataset, expected: usize) -> SimResult<bool> {
        Ok(expected > 0 && self.record_count(dataset)? == expected)
    }

    pub fn clear(&self, dataset: Dataset) -> SimResult<()> {
        self.conn.execute(
            "DELETE FROM simulation_data WHERE dataset = ?1",
            params![dataset.as_str()],
        )?;
        Ok(())
    }

    pub fn date_count(&self) -> SimResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dates", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn upsert_date(&self, date: NaiveDate, month_name: &str) -> SimResult<i64> {
        let text = date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT OR IGNORE INTO dates (date, month_name) VALUES (?1, ?2)",
            params![text, month_name],
        )?;
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT date_id FROM dates WHERE date = ?1",
                params![text],
                |row| row.get(0),
            )
            .optional()?;
        id.ok_or_else(|| anyhow::anyhow!("Date row vanished after upsert: {text}").into())
    }
}

fn ratio_to_sql(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

fn sql_to_ratio(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}
