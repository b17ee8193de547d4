use crate::pipeline::{BatchOutcome, SeriesError};
use crate::summary::{calculate_boxplot_stats, calculate_mean_std, BoxplotStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFailure {
    pub index: usize,
    pub stage: String,
    pub message: String,
}

impl From<&SeriesError> for SeriesFailure {
    fn from(err: &SeriesError) -> Self {
        Self {
            index: err.index,
            stage: err.stage.to_string(),
            message: err.error.to_string(),
        }
    }
}

/// Parallel arrays, one entry per input series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub frequencies: Vec<Vec<f64>>,
    pub processed_amplitudes: Vec<Vec<f64>>,
    pub peaks: Vec<Vec<usize>>,
    pub peaks_values: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SeriesFailure>,
}

impl From<BatchOutcome> for ProcessResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let mut response = ProcessResponse {
            failures: outcome.failures.iter().map(SeriesFailure::from).collect(),
            ..Default::default()
        };
        for processed in outcome.outputs {
            let processed = processed.unwrap_or_default();
            let peaks = processed.peaks.unwrap_or_default();
            response.frequencies.push(processed.frequencies);
            response.processed_amplitudes.push(processed.amplitudes);
            response.peaks.push(peaks.indices);
            response.peaks_values.push(peaks.values);
        }
        response
    }
}

impl ProcessResponse {
    pub fn total_peaks(&self) -> usize {
        self.peaks.iter().map(Vec::len).sum()
    }
}

/// Box plots are always reported. `mean`/`std` are absent when the
/// collection cannot be reduced element-wise, and `mean_std_error` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub boxplot: Vec<BoxplotStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_std_error: Option<String>,
}

impl StatisticsResponse {
    pub fn compute(amplitudes: &[Vec<f64>]) -> Self {
        let boxplot = calculate_boxplot_stats(amplitudes);
        match calculate_mean_std(amplitudes) {
            Ok((mean, std)) => Self {
                boxplot,
                mean: Some(mean),
                std: Some(std),
                mean_std_error: None,
            },
            Err(err) => Self {
                boxplot,
                mean: None,
                std: None,
                mean_std_error: Some(err.to_string()),
            },
        }
    }
}
