use crate::processing::baseline::{BaselineStage, DEFAULT_NITER};
use crate::processing::normalize::NormalizeStage;
use crate::processing::peaks::{PeakResult, PeakStage};
use crate::processing::range::RangeStage;
use crate::processing::smoothing::SmoothingStage;
use crate::prelude::{ProcessingStage, Series, SignalError};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::MetricsRecorder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Options controlling which stages run and with which parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_freq: f64,
    pub max_freq: f64,
    pub remove_baseline: bool,
    pub apply_smoothing: bool,
    pub normalize: bool,
    pub find_peaks: bool,
    pub width: f64,
    pub prominence: f64,
    pub lam: f64,
    pub p: f64,
    pub niter: usize,
    pub window_length: usize,
    pub polyorder: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_freq: 0.0,
            max_freq: 10_000.0,
            remove_baseline: false,
            apply_smoothing: false,
            normalize: false,
            find_peaks: false,
            width: 1.0,
            prominence: 1.0,
            lam: 1000.0,
            p: 0.001,
            niter: DEFAULT_NITER,
            window_length: 25,
            polyorder: 2,
        }
    }
}

impl PipelineConfig {
    /// Same parameters with every optional stage enabled.
    pub fn with_all_stages(self) -> Self {
        Self {
            remove_baseline: true,
            apply_smoothing: true,
            normalize: true,
            find_peaks: true,
            ..self
        }
    }
}

/// How a batch reacts when one of its series fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Stop at the first failing series, in input order.
    #[default]
    FailFast,
    /// Process every series and report failures alongside the successes.
    SkipFailed,
}

/// Result of running one series through the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessedSeries {
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
    pub baseline: Option<Vec<f64>>,
    pub peaks: Option<PeakResult>,
    pub notes: Vec<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("series {index} failed in {stage} stage: {error}")]
pub struct SeriesError {
    pub index: usize,
    pub stage: &'static str,
    pub error: SignalError,
}

/// Outputs stay aligned with the input batch; a failed series leaves `None`.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub outputs: Vec<Option<ProcessedSeries>>,
    pub failures: Vec<SeriesError>,
}

/// Composes range filtering, baseline removal, smoothing, normalization and
/// peak detection in that fixed order.
pub struct Pipeline {
    stages: Vec<Box<dyn ProcessingStage + Send + Sync>>,
    logger: LogManager,
    metrics: Option<Arc<MetricsRecorder>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let mut stages: Vec<Box<dyn ProcessingStage + Send + Sync>> =
            vec![Box::new(RangeStage::new(config.min_freq, config.max_freq))];
        if config.remove_baseline {
            stages.push(Box::new(BaselineStage::new(config.lam, config.p, config.niter)));
        }
        if config.apply_smoothing {
            stages.push(Box::new(SmoothingStage::new(
                config.window_length,
                config.polyorder,
            )));
        }
        if config.normalize {
            stages.push(Box::new(NormalizeStage::new()));
        }
        if config.find_peaks {
            stages.push(Box::new(PeakStage::new(config.width, config.prominence)));
        }

        Self {
            stages,
            logger: LogManager::new(),
            metrics: None,
        }
    }

    /// Counts every series of a batch as processed or failed as it runs.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs a single series; `index` only labels errors and logs.
    pub fn run(&self, index: usize, series: Series) -> Result<ProcessedSeries, SeriesError> {
        let mut current = series;
        let mut processed = ProcessedSeries::default();

        for stage in &self.stages {
            let output = stage.execute(current).map_err(|error| {
                self.logger.record_failure(index, stage.name(), &error);
                SeriesError {
                    index,
                    stage: stage.name(),
                    error,
                }
            })?;
            if output.metadata.baseline.is_some() {
                processed.baseline = output.metadata.baseline;
            }
            if output.metadata.peaks.is_some() {
                processed.peaks = output.metadata.peaks;
            }
            processed.notes.extend(output.metadata.notes);
            current = output.series;
        }

        processed.frequencies = current.frequencies;
        processed.amplitudes = current.amplitudes;
        Ok(processed)
    }

    /// Processes each series independently, in input order.
    pub fn run_batch(
        &self,
        batch: Vec<Series>,
        policy: BatchPolicy,
    ) -> Result<BatchOutcome, SeriesError> {
        let mut outcome = BatchOutcome {
            outputs: Vec::with_capacity(batch.len()),
            failures: Vec::new(),
        };

        for (index, series) in batch.into_iter().enumerate() {
            let result = self.run(index, series);
            if let Some(metrics) = &self.metrics {
                match &result {
                    Ok(processed) => metrics.record_processed(
                        processed.peaks.as_ref().map_or(0, |peaks| peaks.indices.len()),
                    ),
                    Err(_) => metrics.record_error(),
                }
            }
            match result {
                Ok(processed) => outcome.outputs.push(Some(processed)),
                Err(err) if policy == BatchPolicy::FailFast => return Err(err),
                Err(err) => {
                    outcome.outputs.push(None);
                    outcome.failures.push(err);
                }
            }
        }

        self.logger.record(&format!(
            "batch processed: {} series, {} failed, stages {:?}",
            outcome.outputs.len(),
            outcome.failures.len(),
            self.stage_names()
        ));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::stats::StatsHelper;

    fn synthetic_series(points: usize) -> Series {
        let frequencies: Vec<f64> = (0..points).map(|i| 100.0 + i as f64 * 10.0).collect();
        let amplitudes = frequencies
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let x = i as f64;
                0.002 * f + 3.0 * (-((x - 15.0) / 2.0).powi(2)).exp()
                    + 2.0 * (-((x - 35.0) / 3.0).powi(2)).exp()
                    + 0.01 * (x * 1.7).sin()
            })
            .collect();
        Series::new(frequencies, amplitudes)
    }

    #[test]
    fn stages_compose_in_fixed_order() {
        let pipeline = Pipeline::new(PipelineConfig::default().with_all_stages());
        assert_eq!(
            pipeline.stage_names(),
            vec!["range", "baseline", "smoothing", "normalize", "peaks"]
        );
        let minimal = Pipeline::new(PipelineConfig::default());
        assert_eq!(minimal.stage_names(), vec!["range"]);
    }

    #[test]
    fn full_pipeline_on_fifty_points_is_normalized() {
        let pipeline = Pipeline::new(PipelineConfig::default().with_all_stages());
        let processed = pipeline.run(0, synthetic_series(50)).unwrap();
        assert_eq!(processed.frequencies.len(), 50);
        assert_eq!(processed.amplitudes.len(), 50);
        assert!(StatsHelper::mean(&processed.amplitudes).abs() < 1e-9);
        assert!((StatsHelper::population_std(&processed.amplitudes) - 1.0).abs() < 1e-9);
        let peaks = processed.peaks.unwrap();
        assert_eq!(peaks.indices.len(), peaks.values.len());
        assert_eq!(processed.baseline.map(|b| b.len()), Some(50));
    }

    #[test]
    fn range_filter_length_carries_through() {
        let config = PipelineConfig {
            min_freq: 200.0,
            max_freq: 400.0,
            apply_smoothing: true,
            window_length: 5,
            ..Default::default()
        };
        let processed = Pipeline::new(config).run(0, synthetic_series(50)).unwrap();
        assert_eq!(processed.amplitudes.len(), 21);
        assert!(processed.peaks.is_none());
    }

    #[test]
    fn fail_fast_reports_first_failure() {
        let config = PipelineConfig {
            normalize: true,
            ..Default::default()
        };
        let batch = vec![
            synthetic_series(10),
            Series::new(vec![1.0, 2.0], vec![5.0, 5.0]),
            Series::new(vec![], vec![]),
        ];
        let err = Pipeline::new(config)
            .run_batch(batch, BatchPolicy::FailFast)
            .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.stage, "normalize");
        assert_eq!(err.error, SignalError::DegenerateInput);
    }

    #[test]
    fn fail_fast_counts_series_completed_before_the_failure() {
        let metrics = Arc::new(MetricsRecorder::new());
        let batch = vec![
            synthetic_series(10),
            synthetic_series(12),
            Series::new(vec![], vec![]),
            synthetic_series(10),
        ];
        let result = Pipeline::new(PipelineConfig::default())
            .with_metrics(metrics.clone())
            .run_batch(batch, BatchPolicy::FailFast);
        assert_eq!(result.unwrap_err().index, 2);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.series_processed, 2);
        assert_eq!(snapshot.series_failed, 1);
    }

    #[test]
    fn skip_failed_keeps_alignment() {
        let batch = vec![
            Series::new(vec![], vec![]),
            synthetic_series(10),
            Series::new(vec![20_000.0], vec![1.0]),
        ];
        let outcome = Pipeline::new(PipelineConfig::default())
            .run_batch(batch, BatchPolicy::SkipFailed)
            .unwrap();
        assert_eq!(outcome.outputs.len(), 3);
        assert!(outcome.outputs[0].is_none());
        assert!(outcome.outputs[1].is_some());
        assert!(outcome.outputs[2].is_none());
        assert_eq!(
            outcome.failures.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert!(matches!(
            outcome.failures[1].error,
            SignalError::EmptyResult { .. }
        ));
    }

    #[test]
    fn enabling_all_stages_keeps_parameters() {
        let config = PipelineConfig {
            window_length: 7,
            lam: 50.0,
            ..Default::default()
        }
        .with_all_stages();
        assert!(config.remove_baseline && config.apply_smoothing);
        assert!(config.normalize && config.find_peaks);
        assert_eq!(config.window_length, 7);
        assert_eq!(config.lam, 50.0);
    }

    #[test]
    fn config_deserializes_from_partial_map() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"normalize": true, "window_length": 11}"#).unwrap();
        assert!(config.normalize);
        assert_eq!(config.window_length, 11);
        assert_eq!(config.lam, 1000.0);
        assert_eq!(config.max_freq, 10_000.0);
    }
}
