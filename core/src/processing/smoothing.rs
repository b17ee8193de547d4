use crate::math::polyfit::PolyFitHelper;
use crate::prelude::{
    ProcessingStage, Series, SignalError, SignalResult, StageMetadata, StageOutput,
};
use crate::telemetry::log::LogManager;

/// Savitzky-Golay smoothing.
///
/// Interior points take the value of a degree-`polyorder` least-squares fit
/// over the centered window. The first and last `window_length / 2` points
/// are evaluated on the polynomial fitted to the first (last) full window.
/// `window_length` must be odd.
pub fn smooth_signal(
    amplitudes: &[f64],
    window_length: usize,
    polyorder: usize,
) -> SignalResult<Vec<f64>> {
    let len = amplitudes.len();
    if window_length == 0 || window_length % 2 == 0 || len < window_length {
        return Err(SignalError::InvalidWindow {
            window: window_length,
            len,
        });
    }
    if polyorder >= window_length {
        return Err(SignalError::InvalidPolyorder {
            polyorder,
            window: window_length,
        });
    }

    let half = window_length / 2;
    let center = PolyFitHelper::evaluation_weights(window_length, polyorder, 0.0)?;
    let mut smoothed = vec![0.0; len];

    for i in half..len - half {
        smoothed[i] = apply(&center, &amplitudes[i - half..=i + half]);
    }

    let head = PolyFitHelper::fit(&amplitudes[..window_length], polyorder)?;
    let tail = PolyFitHelper::fit(&amplitudes[len - window_length..], polyorder)?;
    for offset in 1..=half {
        let position = offset as f64;
        smoothed[half - offset] = PolyFitHelper::evaluate(&head, window_length, -position);
        smoothed[len - 1 - half + offset] =
            PolyFitHelper::evaluate(&tail, window_length, position);
    }

    Ok(smoothed)
}

fn apply(weights: &[f64], window: &[f64]) -> f64 {
    weights.iter().zip(window).map(|(w, y)| w * y).sum()
}

pub struct SmoothingStage {
    window_length: usize,
    polyorder: usize,
    logger: LogManager,
}

impl SmoothingStage {
    pub fn new(window_length: usize, polyorder: usize) -> Self {
        Self {
            window_length,
            polyorder,
            logger: LogManager::new(),
        }
    }
}

impl ProcessingStage for SmoothingStage {
    fn name(&self) -> &'static str {
        "smoothing"
    }

    fn execute(&self, input: Series) -> SignalResult<StageOutput> {
        let smoothed = smooth_signal(&input.amplitudes, self.window_length, self.polyorder)?;
        let note = format!("window {} polyorder {}", self.window_length, self.polyorder);
        self.logger.record_stage(self.name(), &note);

        Ok(StageOutput {
            series: Series::new(input.frequencies, smoothed),
            metadata: StageMetadata {
                notes: vec![note],
                ..Default::default()
            },
        })
    }
}
