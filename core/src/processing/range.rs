use crate::prelude::{
    ProcessingStage, Series, SignalError, SignalResult, StageMetadata, StageOutput,
};
use crate::telemetry::log::LogManager;

/// Keeps the samples whose frequency lies in `[min_freq, max_freq]`,
/// preserving their relative order.
pub fn filter_frequency_range(
    frequencies: &[f64],
    amplitudes: &[f64],
    min_freq: f64,
    max_freq: f64,
) -> SignalResult<(Vec<f64>, Vec<f64>)> {
    if min_freq > max_freq {
        return Err(SignalError::InvalidRange {
            min: min_freq,
            max: max_freq,
        });
    }
    if frequencies.is_empty() || amplitudes.is_empty() {
        return Err(SignalError::EmptyInput("frequencies or amplitudes"));
    }
    if frequencies.len() != amplitudes.len() {
        return Err(SignalError::ShapeMismatch {
            expected: frequencies.len(),
            found: amplitudes.len(),
        });
    }

    let (kept_freq, kept_ampl): (Vec<f64>, Vec<f64>) = frequencies
        .iter()
        .zip(amplitudes)
        .filter(|&(&f, _)| f >= min_freq && f <= max_freq)
        .map(|(&f, &a)| (f, a))
        .unzip();

    if kept_freq.is_empty() {
        return Err(SignalError::EmptyResult {
            min: min_freq,
            max: max_freq,
        });
    }

    Ok((kept_freq, kept_ampl))
}

/// Mandatory first stage of the pipeline.
pub struct RangeStage {
    min_freq: f64,
    max_freq: f64,
    logger: LogManager,
}

impl RangeStage {
    pub fn new(min_freq: f64, max_freq: f64) -> Self {
        Self {
            min_freq,
            max_freq,
            logger: LogManager::new(),
        }
    }
}

impl ProcessingStage for RangeStage {
    fn name(&self) -> &'static str {
        "range"
    }

    fn execute(&self, input: Series) -> SignalResult<StageOutput> {
        let original = input.len();
        let (frequencies, amplitudes) = filter_frequency_range(
            &input.frequencies,
            &input.amplitudes,
            self.min_freq,
            self.max_freq,
        )?;

        let note = format!(
            "kept {} of {} samples in [{}, {}]",
            frequencies.len(),
            original,
            self.min_freq,
            self.max_freq
        );
        self.logger.record_stage(self.name(), &note);

        Ok(StageOutput {
            series: Series::new(frequencies, amplitudes),
            metadata: StageMetadata {
                notes: vec![note],
                ..Default::default()
            },
        })
    }
}
