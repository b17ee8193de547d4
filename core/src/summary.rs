//! Box-plot and cross-series statistics over collections of amplitude series.

use crate::math::stats::StatsHelper;
use crate::prelude::{SignalError, SignalResult};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxplotStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub outliers: Vec<f64>,
}

/// Quartiles and Tukey fences (1.5 IQR) for one series. Outliers keep their
/// input order. Returns `None` for an empty series.
pub fn boxplot(amplitudes: &[f64]) -> Option<BoxplotStats> {
    if amplitudes.is_empty() {
        return None;
    }

    let sorted = StatsHelper::sorted(amplitudes);
    let q1 = StatsHelper::percentile_sorted(&sorted, 25.0);
    let median = StatsHelper::percentile_sorted(&sorted, 50.0);
    let q3 = StatsHelper::percentile_sorted(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower_bound = q1 - 1.5 * iqr;
    let upper_bound = q3 + 1.5 * iqr;

    let outliers = amplitudes
        .iter()
        .copied()
        .filter(|&v| v < lower_bound || v > upper_bound)
        .collect();

    Some(BoxplotStats {
        q1,
        median,
        q3,
        lower_bound,
        upper_bound,
        outliers,
    })
}

/// One entry per non-empty series; empty series are skipped.
pub fn calculate_boxplot_stats<S: AsRef<[f64]>>(series: &[S]) -> Vec<BoxplotStats> {
    series
        .iter()
        .filter_map(|amplitudes| boxplot(amplitudes.as_ref()))
        .collect()
}

/// Elementwise mean and population standard deviation across a collection
/// of equal-length series.
pub fn calculate_mean_std<S: AsRef<[f64]>>(series: &[S]) -> SignalResult<(Vec<f64>, Vec<f64>)> {
    let first = series
        .first()
        .ok_or(SignalError::EmptyInput("series collection"))?;
    let width = first.as_ref().len();

    let mut flat = Vec::with_capacity(series.len() * width);
    for amplitudes in series {
        let amplitudes = amplitudes.as_ref();
        if amplitudes.len() != width {
            return Err(SignalError::ShapeMismatch {
                expected: width,
                found: amplitudes.len(),
            });
        }
        flat.extend_from_slice(amplitudes);
    }

    let matrix = Array2::from_shape_vec((series.len(), width), flat)
        .map_err(|err| SignalError::Internal(err.to_string()))?;
    let mean = matrix
        .mean_axis(Axis(0))
        .ok_or(SignalError::EmptyInput("series collection"))?;
    let std = matrix.std_axis(Axis(0), 0.0);

    Ok((mean.to_vec(), std.to_vec()))
}
