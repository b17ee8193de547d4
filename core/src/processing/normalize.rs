use crate::math::stats::StatsHelper;
use crate::prelude::{
    ProcessingStage, Series, SignalError, SignalResult, StageMetadata, StageOutput,
};
use crate::telemetry::log::LogManager;

/// Standard Normal Variate: `(y - mean) / std` with population statistics.
pub fn normalize_snv(amplitudes: &[f64]) -> SignalResult<Vec<f64>> {
    let first = *amplitudes.first().ok_or(SignalError::EmptyInput("amplitudes"))?;
    if amplitudes.iter().all(|&v| v == first) {
        return Err(SignalError::DegenerateInput);
    }

    let mean = StatsHelper::mean(amplitudes);
    let std = StatsHelper::population_std(amplitudes);
    if std == 0.0 {
        return Err(SignalError::DegenerateInput);
    }

    Ok(amplitudes.iter().map(|v| (v - mean) / std).collect())
}

#[derive(Default)]
pub struct NormalizeStage {
    logger: LogManager,
}

impl NormalizeStage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessingStage for NormalizeStage {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn execute(&self, input: Series) -> SignalResult<StageOutput> {
        let mean = StatsHelper::mean(&input.amplitudes);
        let std = StatsHelper::population_std(&input.amplitudes);
        let normalized = normalize_snv(&input.amplitudes)?;

        let note = format!("mean {:.4} std {:.4}", mean, std);
        self.logger.record_stage(self.name(), &note);

        Ok(StageOutput {
            series: Series::new(input.frequencies, normalized),
            metadata: StageMetadata {
                notes: vec![note],
                ..Default::default()
            },
        })
    }
}
