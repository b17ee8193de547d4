use crate::workflow::config::ServiceConfig;
use anyhow::Context;
use log::warn;
use spectracore::interface::{
    ProcessRequest, ProcessResponse, StatisticsRequest, StatisticsResponse,
};
use spectracore::pipeline::{Pipeline, PipelineConfig};
use spectracore::prelude::Series;
use spectracore::telemetry::{MetricsRecorder, MetricsSnapshot};
use std::sync::Arc;

#[derive(Clone)]
pub struct Runner {
    config: ServiceConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Runs a request's series under its overrides and the service batch
    /// policy.
    pub fn execute(&self, request: &ProcessRequest) -> anyhow::Result<ProcessResponse> {
        let pipeline_config = request.overrides.apply(&self.config.pipeline);
        let series = request
            .series()
            .context("frequencies and amplitudes must hold the same number of series")?;
        self.process(series, pipeline_config)
    }

    pub fn process(
        &self,
        series: Vec<Series>,
        pipeline_config: PipelineConfig,
    ) -> anyhow::Result<ProcessResponse> {
        let pipeline = Pipeline::new(pipeline_config).with_metrics(self.metrics.clone());
        let outcome = pipeline
            .run_batch(series, self.config.batch_policy)
            .context("processing batch")?;

        Ok(ProcessResponse::from(outcome))
    }

    pub fn statistics(&self, request: &StatisticsRequest) -> StatisticsResponse {
        let stats = StatisticsResponse::compute(&request.amplitudes);
        if let Some(reason) = &stats.mean_std_error {
            warn!("mean/std skipped: {}", reason);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_spectrum, GeneratorConfig};
    use spectracore::interface::PipelineOverrides;
    use spectracore::pipeline::BatchPolicy;

    fn full_overrides() -> PipelineOverrides {
        PipelineOverrides {
            remove_baseline: Some(true),
            apply_smoothing: Some(true),
            normalize: Some(true),
            find_peaks: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn runner_executes_full_pipeline() {
        let runner = Runner::new(ServiceConfig::default());
        let series = build_spectrum(&GeneratorConfig {
            points: 50,
            ..Default::default()
        })
        .unwrap();
        let request = ProcessRequest {
            frequencies: vec![series.frequencies.clone()],
            amplitudes: vec![series.amplitudes.clone()],
            overrides: full_overrides(),
        };
        let response = runner.execute(&request).unwrap();
        assert_eq!(response.processed_amplitudes[0].len(), 50);
        assert_eq!(response.frequencies[0], series.frequencies);
        assert_eq!(runner.metrics().series_processed, 1);
        assert_eq!(runner.metrics().peaks_detected, response.total_peaks());
    }

    #[test]
    fn fail_fast_policy_aborts_batch() {
        let runner = Runner::new(ServiceConfig::default());
        let request = ProcessRequest {
            frequencies: vec![vec![1.0, 2.0], vec![]],
            amplitudes: vec![vec![1.0, 2.0], vec![]],
            overrides: PipelineOverrides::default(),
        };
        let err = runner.execute(&request).unwrap_err();
        assert!(format!("{:#}", err).contains("series 1 failed in range stage"));
        assert_eq!(runner.metrics().series_failed, 1);
        assert_eq!(runner.metrics().series_processed, 1);
    }

    #[test]
    fn skip_failed_policy_reports_failures() {
        let runner = Runner::new(ServiceConfig {
            batch_policy: BatchPolicy::SkipFailed,
            ..Default::default()
        });
        let request = ProcessRequest {
            frequencies: vec![vec![1.0, 2.0], vec![]],
            amplitudes: vec![vec![1.0, 2.0], vec![]],
            overrides: PipelineOverrides::default(),
        };
        let response = runner.execute(&request).unwrap();
        assert_eq!(response.processed_amplitudes, vec![vec![1.0, 2.0], vec![]]);
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].index, 1);
    }

    #[test]
    fn statistics_on_ragged_input_keep_boxplots() {
        let runner = Runner::new(ServiceConfig::default());
        let request = StatisticsRequest {
            amplitudes: vec![vec![1.0, 2.0], vec![3.0]],
        };
        let stats = runner.statistics(&request);
        assert_eq!(stats.boxplot.len(), 2);
        assert!(stats.mean.is_none());
        assert!(stats.mean_std_error.is_some());
    }
}
