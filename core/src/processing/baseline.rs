use crate::math::matrix::BandedMatrix;
use crate::prelude::{
    ProcessingStage, Series, SignalError, SignalResult, StageMetadata, StageOutput,
};
use crate::telemetry::log::LogManager;

pub const DEFAULT_NITER: usize = 10;

/// Estimates a slowly varying baseline with asymmetric least squares.
///
/// Each iteration solves `(W + lam * D * D^T) z = W y` where `D` is the
/// second-order difference operator and `W` the current weights, then
/// reweights every point with `p` if it lies above `z` and `1 - p`
/// otherwise. Small `p` makes `z` follow the lower envelope of the signal.
pub fn baseline_als(
    amplitudes: &[f64],
    lam: f64,
    p: f64,
    niter: usize,
) -> SignalResult<Vec<f64>> {
    if lam.is_nan() || lam <= 0.0 {
        return Err(SignalError::InvalidParameter(format!(
            "lam must be positive, got {}",
            lam
        )));
    }
    if p.is_nan() || p <= 0.0 || p >= 1.0 {
        return Err(SignalError::InvalidParameter(format!(
            "p must lie in (0, 1), got {}",
            p
        )));
    }
    if niter == 0 {
        return Err(SignalError::InvalidParameter(
            "niter must be at least 1".to_string(),
        ));
    }
    if amplitudes.is_empty() {
        return Err(SignalError::EmptyInput("amplitudes"));
    }

    let len = amplitudes.len();
    let penalty = second_difference_penalty(len).scaled(lam);
    let mut weights = vec![1.0; len];
    let mut baseline = amplitudes.to_vec();

    for _ in 0..niter {
        let mut system = penalty.clone();
        system.add_diagonal(&weights);
        let rhs: Vec<f64> = weights
            .iter()
            .zip(amplitudes)
            .map(|(w, y)| w * y)
            .collect();
        baseline = system.cholesky_solve(&rhs)?;

        for ((w, &y), &z) in weights.iter_mut().zip(amplitudes).zip(&baseline) {
            *w = if y > z { p } else { 1.0 - p };
        }
    }

    Ok(baseline)
}

/// `D * D^T` for the `(len, len - 2)` operator with columns `[1, -2, 1]`.
/// Pentadiagonal; empty when `len < 3`.
fn second_difference_penalty(len: usize) -> BandedMatrix {
    const STENCIL: [f64; 3] = [1.0, -2.0, 1.0];
    let mut penalty = BandedMatrix::zeros(len, 2);
    for column in 0..len.saturating_sub(2) {
        for (a, &ca) in STENCIL.iter().enumerate() {
            for (b, &cb) in STENCIL.iter().enumerate().take(a + 1) {
                penalty.add(column + a, column + b, ca * cb);
            }
        }
    }
    penalty
}

/// Optional stage subtracting the estimated baseline from the amplitudes.
pub struct BaselineStage {
    lam: f64,
    p: f64,
    niter: usize,
    logger: LogManager,
}

impl BaselineStage {
    pub fn new(lam: f64, p: f64, niter: usize) -> Self {
        Self {
            lam,
            p,
            niter,
            logger: LogManager::new(),
        }
    }
}

impl ProcessingStage for BaselineStage {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn execute(&self, input: Series) -> SignalResult<StageOutput> {
        let baseline = baseline_als(&input.amplitudes, self.lam, self.p, self.niter)?;
        let corrected: Vec<f64> = input
            .amplitudes
            .iter()
            .zip(&baseline)
            .map(|(y, z)| y - z)
            .collect();

        let note = format!("lam {} p {} niter {}", self.lam, self.p, self.niter);
        self.logger.record_stage(self.name(), &note);

        Ok(StageOutput {
            series: Series::new(input.frequencies, corrected),
            metadata: StageMetadata {
                baseline: Some(baseline),
                notes: vec![note],
                ..Default::default()
            },
        })
    }
}
