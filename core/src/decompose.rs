//! Classical additive time-series decomposition.
//!
//! A pure post-pass over the completed `sales` series: centered moving
//! average for trend, per-phase mean of the detrended series for the
//! seasonal component, residual = value − trend − seasonal. Runs once
//! after the recurrence, never interleaved with it.

use crate::record::MonthRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

impl Decomposition {
    fn empty() -> Self {
        Self {
            trend: vec![],
            seasonal: vec![],
            residual: vec![],
        }
    }
}

/// Decompose `data` with the given seasonal `period`. Empty data or a
/// zero period yields an empty result.
pub fn decompose(data: &[f64], period: usize) -> Decomposition {
    let n = data.len();
    if n == 0 || period == 0 {
        return Decomposition::empty();
    }

    // Centered moving average, window shrinking at the edges.
    let half = period / 2;
    let mut trend = vec![0.0; n];
    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        let sum: f64 = data[start..end].iter().sum();
        trend[i] = sum / (end - start) as f64;
    }

    let detrended: Vec<f64> = data.iter().zip(&trend).map(|(d, t)| d - t).collect();

    // Mean detrended value per position in the period.
    let mut seasonal = vec![0.0; n];
    for phase in 0..period.min(n) {
        let values: Vec<f64> = (phase..n).step_by(period).map(|j| detrended[j]).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        for j in (phase..n).step_by(period) {
            seasonal[j] = mean;
        }
    }

    let residual: Vec<f64> = data
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((d, t), s)| d - t - s)
        .collect();

    Decomposition {
        trend,
        seasonal,
        residual,
    }
}

/// Fill the `trend`/`seasonal`/`residual` fields from the records' own
/// `sales` column. Period is 12 months, shortened for shorter runs.
pub fn decompose_sales(records: &mut [MonthRecord]) {
    if records.is_empty() {
        return;
    }
    let sales: Vec<f64> = records.iter().map(|r| r.sales).collect();
    let period = sales.len().min(12);
    let parts = decompose(&sales, period);
    for (i, record) in records.iter_mut().enumerate() {
        record.trend = Some(parts.trend[i]);
        record.seasonal = Some(parts.seasonal[i]);
        record.residual = Some(parts.residual[i]);
    }
}
