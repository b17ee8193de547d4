//! Core signal-processing library for spectral (frequency, amplitude) series.
//!
//! The modules cover range filtering, asymmetric least squares baseline
//! removal, Savitzky-Golay smoothing, SNV normalization and peak detection,
//! composed by [`pipeline::Pipeline`] in a fixed order, plus box-plot and
//! cross-series summary statistics.

pub mod interface;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod summary;
pub mod telemetry;

pub use pipeline::{BatchPolicy, Pipeline, PipelineConfig, ProcessedSeries};
pub use prelude::{ProcessingStage, Series, SignalError, SignalResult, StageOutput};
