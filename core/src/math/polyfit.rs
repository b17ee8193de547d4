use crate::math::matrix::MatrixHelper;
use crate::prelude::SignalResult;
use ndarray::Array2;

pub struct PolyFitHelper;

impl PolyFitHelper {
    /// Weights `w` such that `sum(w[j] * y[j])` over a window of
    /// `window_length` consecutive samples equals the least-squares
    /// polynomial of degree `polyorder` evaluated at `position`, where
    /// `position` is measured in samples from the window center.
    ///
    /// Positions are scaled by the half-width so the normal equations stay
    /// well conditioned for long windows.
    pub fn evaluation_weights(
        window_length: usize,
        polyorder: usize,
        position: f64,
    ) -> SignalResult<Vec<f64>> {
        let terms = polyorder + 1;
        let (offsets, scale) = Self::offsets(window_length);
        let target = Self::powers(position / scale, terms);
        let solution = MatrixHelper::solve_dense(&Self::gram(&offsets, terms), &target)?;

        Ok(offsets
            .iter()
            .map(|&x| Self::dot(&Self::powers(x, terms), &solution))
            .collect())
    }

    /// Least-squares coefficients of a degree-`polyorder` polynomial through
    /// `samples`, in the scaled offsets used by [`Self::evaluate`].
    pub fn fit(samples: &[f64], polyorder: usize) -> SignalResult<Vec<f64>> {
        let terms = polyorder + 1;
        let (offsets, _) = Self::offsets(samples.len());
        let mut moments = vec![0.0; terms];
        for (&x, &y) in offsets.iter().zip(samples) {
            for (moment, power) in moments.iter_mut().zip(Self::powers(x, terms)) {
                *moment += power * y;
            }
        }
        MatrixHelper::solve_dense(&Self::gram(&offsets, terms), &moments)
    }

    /// Evaluates coefficients from [`Self::fit`] over a window of
    /// `window_length` samples at `position` samples from its center.
    pub fn evaluate(coefficients: &[f64], window_length: usize, position: f64) -> f64 {
        let (_, scale) = Self::offsets(window_length);
        Self::dot(&Self::powers(position / scale, coefficients.len()), coefficients)
    }

    fn offsets(window_length: usize) -> (Vec<f64>, f64) {
        let half = (window_length / 2) as f64;
        let scale = if half > 0.0 { half } else { 1.0 };
        let offsets = (0..window_length)
            .map(|j| (j as f64 - half) / scale)
            .collect();
        (offsets, scale)
    }

    // Gram matrix of the Vandermonde design: sum over the window of x^(a+b).
    fn gram(offsets: &[f64], terms: usize) -> Array2<f64> {
        let mut gram = Array2::<f64>::zeros((terms, terms));
        for &x in offsets {
            let powers = Self::powers(x, terms);
            for a in 0..terms {
                for b in 0..terms {
                    gram[[a, b]] += powers[a] * powers[b];
                }
            }
        }
        gram
    }

    fn powers(x: f64, terms: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(terms);
        let mut value = 1.0;
        for _ in 0..terms {
            out.push(value);
            value *= x;
        }
        out
    }

    fn dot(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_weights_match_classic_five_point_quadratic() {
        // Savitzky-Golay 5-point quadratic: (-3, 12, 17, 12, -3) / 35
        let weights = PolyFitHelper::evaluation_weights(5, 2, 0.0).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|v| v / 35.0);
        for (w, e) in weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-12, "{} vs {}", w, e);
        }
    }

    #[test]
    fn weights_sum_to_one_at_any_position() {
        for position in [-3.0, -1.5, 0.0, 2.0] {
            let weights = PolyFitHelper::evaluation_weights(7, 3, position).unwrap();
            let sum: f64 = weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn zero_order_fit_is_a_moving_average() {
        let weights = PolyFitHelper::evaluation_weights(3, 0, 0.0).unwrap();
        for w in weights {
            assert!((w - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn fitted_polynomial_matches_evaluation_weights() {
        let samples = [2.0, -1.0, 4.0, 0.5, 3.0, 7.0, -2.0];
        let coefficients = PolyFitHelper::fit(&samples, 2).unwrap();
        for position in [-3.0, -2.0, 0.0, 1.0, 3.0] {
            let weights = PolyFitHelper::evaluation_weights(7, 2, position).unwrap();
            let expected: f64 = weights.iter().zip(samples).map(|(w, y)| w * y).sum();
            let value = PolyFitHelper::evaluate(&coefficients, 7, position);
            assert!((value - expected).abs() < 1e-10, "{} vs {}", value, expected);
        }
    }

    #[test]
    fn fit_recovers_exact_quadratic() {
        let samples: Vec<f64> = (-2..=2).map(|x| f64::from(x * x) - 1.0).collect();
        let coefficients = PolyFitHelper::fit(&samples, 2).unwrap();
        assert!((PolyFitHelper::evaluate(&coefficients, 5, 4.0) - 15.0).abs() < 1e-9);
    }
}
