use crate::processing::peaks::PeakResult;
use serde::{Deserialize, Serialize};

/// A spectrum as two parallel sequences of equal length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

impl Series {
    pub fn new(frequencies: Vec<f64>, amplitudes: Vec<f64>) -> Self {
        Self {
            frequencies,
            amplitudes,
        }
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub series: Series,
    pub metadata: StageMetadata,
}

impl StageOutput {
    pub fn passthrough(series: Series) -> Self {
        Self {
            series,
            metadata: StageMetadata::default(),
        }
    }
}

/// Metadata a stage attaches to its output for chaining and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub baseline: Option<Vec<f64>>,
    pub peaks: Option<PeakResult>,
    pub notes: Vec<String>,
}

/// Validation failures raised at stage boundaries.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("minimum frequency {min} is greater than maximum frequency {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
    #[error("no data in frequency range {min} to {max}")]
    EmptyResult { min: f64, max: f64 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid window length {window} for signal of length {len}")]
    InvalidWindow { window: usize, len: usize },
    #[error("polynomial order {polyorder} must be less than window length {window}")]
    InvalidPolyorder { polyorder: usize, window: usize },
    #[error("standard deviation is zero, series cannot be normalized")]
    DegenerateInput,
    #[error("shape mismatch: expected length {expected}, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type SignalResult<T> = Result<T, SignalError>;

/// A single step of the spectral pipeline. Stages consume a series and
/// produce a new one; they hold only their immutable parameters.
pub trait ProcessingStage {
    fn name(&self) -> &'static str;
    fn execute(&self, input: Series) -> SignalResult<StageOutput>;
}
