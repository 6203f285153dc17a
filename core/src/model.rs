//! Shortage-severity regression — the model-training collaborator.
//!
//! Consumes the finished feature table; irrelevant to simulation
//! correctness. Ordinary least squares with standardized features,
//! evaluated over fixed forecast horizons and with rolling-forecast-
//! origin validation (expanding time-series windows, never shuffled).

use crate::{
    error::{SimError, SimResult},
    record::MonthRecord,
};

/// Feature columns fed to the regressor, in matrix order.
pub const FEATURES: [&str; 7] = [
    "sales",
    "stock",
    "last_restock_amount",
    "months_since_last_restock",
    "ingredient_stock",
    "trend",
    "seasonal",
];

/// Split records into a feature matrix and the `shortage_level` target.
///
/// Undefined values (missing decomposition, NaN ratios) are imputed to
/// 0.0 at this boundary only — the engine itself never substitutes
/// defaults for undefined values.
pub fn feature_target_split(records: &[MonthRecord]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let features = records
        .iter()
        .map(|r| {
            vec![
                r.sales,
                r.stock,
                r.last_restock_amount,
                r.months_since_last_restock as f64,
                r.ingredient_stock,
                r.trend.unwrap_or(0.0),
                r.seasonal.unwrap_or(0.0),
            ]
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v })
            .collect()
        })
        .collect();
    let target = records.iter().map(|r| r.shortage_level as f64).collect();
    (features, target)
}

/// Per-column standardization fitted on the training split.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let n = rows.len().max(1) as f64;
        let mut means = vec![0.0; n_cols];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let mut stds = vec![0.0; n_cols];
        for row in rows {
            for ((s, v), m) in stds.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in &mut stds {
            *s = s.sqrt();
            if *s == 0.0 {
                *s = 1.0; // constant column: leave it centered, not scaled
            }
        }
        Self { means, stds }
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(&self.means)
                    .zip(&self.stds)
                    .map(|((v, m), s)| (v - m) / s)
                    .collect()
            })
            .collect()
    }
}

/// Ordinary least squares via the normal equations.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// coefficients[0] is the intercept.
    pub coefficients: Vec<f64>,
}

impl LinearRegression {
    pub fn fit(rows: &[Vec<f64>], target: &[f64]) -> SimResult<Self> {
        let n_rows = rows.len();
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        let dim = n_features + 1; // leading intercept column
        if n_rows < dim {
            return Err(SimError::Model {
                reason: format!("{n_rows} rows cannot fit {dim} parameters"),
            });
        }

        // Accumulate X'X and X'y with the implicit intercept column.
        let mut xtx = vec![vec![0.0; dim]; dim];
        let mut xty = vec![0.0; dim];
        for (row, y) in rows.iter().zip(target) {
            let design: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
            for i in 0..dim {
                xty[i] += design[i] * y;
                for j in 0..dim {
                    xtx[i][j] += design[i] * design[j];
                }
            }
        }

        let coefficients = solve_linear_system(xtx, xty)?;
        Ok(Self { coefficients })
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        self.coefficients[0]
            + row
                .iter()
                .zip(&self.coefficients[1..])
                .map(|(v, c)| v * c)
                .sum::<f64>()
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_one(row)).collect()
    }
}

pub fn mean_squared_error(truth: &[f64], predicted: &[f64]) -> f64 {
    if truth.is_empty() {
        return f64::NAN;
    }
    truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / truth.len() as f64
}

/// MSE over the first `months` rows of the test split (the 3/6/12-month
/// forecast horizons).
pub fn evaluate_horizon(
    model: &LinearRegression,
    test_rows: &[Vec<f64>],
    test_target: &[f64],
    months: usize,
) -> f64 {
    let horizon = months.min(test_rows.len());
    let predicted = model.predict(&test_rows[..horizon]);
    mean_squared_error(&test_target[..horizon], &predicted)
}

/// Rolling-forecast-origin validation: expanding training window, the
/// next block as the test fold. Returns the mean fold MSE.
pub fn rolling_forecast_origin(
    rows: &[Vec<f64>],
    target: &[f64],
    n_splits: usize,
) -> SimResult<f64> {
    let n = rows.len();
    if n_splits == 0 {
        return Err(SimError::Model {
            reason: "n_splits must be positive".into(),
        });
    }
    let fold_size = n / (n_splits + 1);
    if fold_size == 0 {
        return Err(SimError::Model {
            reason: format!("{n} rows is too few for {n_splits} splits"),
        });
    }

    let mut fold_scores = Vec::with_capacity(n_splits);
    for fold in 0..n_splits {
        let train_end = fold_size * (fold + 1);
        let test_end = (train_end + fold_size).min(n);
        let model = LinearRegression::fit(&rows[..train_end], &target[..train_end])?;
        let predicted = model.predict(&rows[train_end..test_end]);
        fold_scores.push(mean_squared_error(&target[train_end..test_end], &predicted));
    }
    Ok(fold_scores.iter().sum::<f64>() / fold_scores.len() as f64)
}

/// Gaussian elimination with partial pivoting.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> SimResult<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .expect("non-empty pivot range");
        if a[pivot][col].abs() < 1e-12 {
            return Err(SimError::Model {
                reason: "normal equations are singular".into(),
            });
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ols_recovers_a_linear_target() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i * i) as f64]).collect();
        let target: Vec<f64> = rows.iter().map(|r| 1.5 + 2.0 * r[0] - 0.5 * r[1]).collect();
        let model = LinearRegression::fit(&rows, &target).unwrap();

        assert!((model.coefficients[0] - 1.5).abs() < 1e-6);
        assert!((model.coefficients[1] - 2.0).abs() < 1e-6);
        assert!((model.coefficients[2] + 0.5).abs() < 1e-6);

        let predicted = model.predict(&rows);
        assert!(mean_squared_error(&target, &predicted) < 1e-8);
    }

    #[test]
    fn fit_rejects_underdetermined_systems() {
        let rows = vec![vec![1.0, 2.0]];
        let target = vec![3.0];
        assert!(LinearRegression::fit(&rows, &target).is_err());
    }

    #[test]
    fn scaler_centers_and_scales() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform(&rows);

        let mean0: f64 = scaled.iter().map(|r| r[0]).sum::<f64>() / 3.0;
        assert!(mean0.abs() < 1e-10);
        // Constant column stays centered at zero without dividing by zero.
        assert!(scaled.iter().all(|r| r[1] == 0.0));
    }

    #[test]
    fn rolling_forecast_origin_averages_folds() {
        let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let target: Vec<f64> = (0..30).map(|i| 2.0 * i as f64 + 1.0).collect();
        let mse = rolling_forecast_origin(&rows, &target, 4).unwrap();
        assert!(mse < 1e-9, "perfectly linear data should fit exactly: {mse}");
    }

    #[test]
    fn rolling_forecast_origin_rejects_tiny_series() {
        let rows = vec![vec![1.0], vec![2.0]];
        let target = vec![1.0, 2.0];
        assert!(rolling_forecast_origin(&rows, &target, 5).is_err());
    }

    #[test]
    fn split_imputes_undefined_values() {
        use chrono::NaiveDate;
        let record = MonthRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            month_name: "January".into(),
            sales: f64::NAN,
            stock: 100.0,
            ingredient_stock: 50.0,
            demand_spike: 0,
            stock_to_sales_ratio: f64::NAN,
            months_since_last_shortage: None,
            months_since_last_production_issue: None,
            cumulative_shortages: 0,
            sales_to_stock_ratio: f64::NAN,
            ingredient_stock_percentage: 10.0,
            shortage_level: 4,
            last_restock_amount: 0.0,
            months_since_last_restock: 2,
            trend: None,
            seasonal: None,
            residual: None,
        };
        let (features, target) = feature_target_split(&[record]);
        assert_eq!(features[0].len(), FEATURES.len());
        assert_eq!(features[0][0], 0.0, "NaN sales imputed to 0");
        assert_eq!(features[0][5], 0.0, "missing trend imputed to 0");
        assert_eq!(target[0], 4.0);
    }
}
