use crate::pipeline::PipelineConfig;
use crate::prelude::{Series, SignalError, SignalResult};
use serde::{Deserialize, Serialize};

/// Per-request pipeline settings. Unset fields fall back to the service
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_freq: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_freq: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_baseline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_smoothing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub find_peaks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prominence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lam: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub niter: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyorder: Option<usize>,
}

impl PipelineOverrides {
    pub fn apply(&self, base: &PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            min_freq: self.min_freq.unwrap_or(base.min_freq),
            max_freq: self.max_freq.unwrap_or(base.max_freq),
            remove_baseline: self.remove_baseline.unwrap_or(base.remove_baseline),
            apply_smoothing: self.apply_smoothing.unwrap_or(base.apply_smoothing),
            normalize: self.normalize.unwrap_or(base.normalize),
            find_peaks: self.find_peaks.unwrap_or(base.find_peaks),
            width: self.width.unwrap_or(base.width),
            prominence: self.prominence.unwrap_or(base.prominence),
            lam: self.lam.unwrap_or(base.lam),
            p: self.p.unwrap_or(base.p),
            niter: self.niter.unwrap_or(base.niter),
            window_length: self.window_length.unwrap_or(base.window_length),
            polyorder: self.polyorder.unwrap_or(base.polyorder),
        }
    }
}

/// Body of a processing request: parallel lists of series plus a flat map
/// of pipeline options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub frequencies: Vec<Vec<f64>>,
    pub amplitudes: Vec<Vec<f64>>,
    #[serde(flatten)]
    pub overrides: PipelineOverrides,
}

impl ProcessRequest {
    pub fn series(&self) -> SignalResult<Vec<Series>> {
        if self.frequencies.len() != self.amplitudes.len() {
            return Err(SignalError::ShapeMismatch {
                expected: self.frequencies.len(),
                found: self.amplitudes.len(),
            });
        }
        Ok(self
            .frequencies
            .iter()
            .zip(&self.amplitudes)
            .map(|(f, a)| Series::new(f.clone(), a.clone()))
            .collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRequest {
    pub amplitudes: Vec<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_options_are_read_as_overrides() {
        let request: ProcessRequest = serde_json::from_str(
            r#"{
                "frequencies": [[1, 2, 3]],
                "amplitudes": [[4, 5, 6]],
                "normalize": true,
                "max_freq": 2.5,
                "window_length": 11
            }"#,
        )
        .unwrap();
        let config = request.overrides.apply(&PipelineConfig::default());
        assert!(config.normalize);
        assert!(!config.find_peaks);
        assert_eq!(config.max_freq, 2.5);
        assert_eq!(config.window_length, 11);
        assert_eq!(config.prominence, 1.0);
        assert_eq!(request.series().unwrap()[0].amplitudes, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn unequal_series_lists_are_rejected() {
        let request = ProcessRequest {
            frequencies: vec![vec![1.0], vec![2.0]],
            amplitudes: vec![vec![1.0]],
            overrides: PipelineOverrides::default(),
        };
        assert!(matches!(
            request.series(),
            Err(SignalError::ShapeMismatch { .. })
        ));
    }
}
