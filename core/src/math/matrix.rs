use crate::prelude::{SignalError, SignalResult};
use ndarray::{Array1, Array2};

/// Symmetric banded matrix stored by its lower diagonals.
///
/// Row `d` of `bands` holds the `d`-th sub-diagonal, so `bands[[d, j]]` is
/// the element at `(j + d, j)`.
#[derive(Debug, Clone)]
pub struct BandedMatrix {
    bands: Array2<f64>,
}

impl BandedMatrix {
    pub fn zeros(size: usize, bandwidth: usize) -> Self {
        Self {
            bands: Array2::zeros((bandwidth + 1, size)),
        }
    }

    pub fn size(&self) -> usize {
        self.bands.ncols()
    }

    pub fn bandwidth(&self) -> usize {
        self.bands.nrows() - 1
    }

    /// Element `(row, col)`; zero outside the band.
    #[cfg(test)]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (i, j) = if row >= col { (row, col) } else { (col, row) };
        let offset = i - j;
        if offset > self.bandwidth() || i >= self.size() {
            0.0
        } else {
            self.bands[[offset, j]]
        }
    }

    /// Adds `value` at `(row, col)` and its mirror. Writes outside the band
    /// are ignored.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        let (i, j) = if row >= col { (row, col) } else { (col, row) };
        let offset = i - j;
        if offset <= self.bandwidth() && i < self.size() {
            self.bands[[offset, j]] += value;
        }
    }

    pub fn add_diagonal(&mut self, values: &[f64]) {
        for (j, &value) in values.iter().enumerate().take(self.size()) {
            self.bands[[0, j]] += value;
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            bands: &self.bands * factor,
        }
    }

    /// Solves `self * x = rhs` through a banded Cholesky factorization.
    /// Fails when the matrix is not positive definite.
    pub fn cholesky_solve(&self, rhs: &[f64]) -> SignalResult<Vec<f64>> {
        let n = self.size();
        let bw = self.bandwidth();
        if rhs.len() != n {
            return Err(SignalError::ShapeMismatch {
                expected: n,
                found: rhs.len(),
            });
        }

        // factor[[d, j]] = L[j + d, j]
        let mut factor = Array2::<f64>::zeros((bw + 1, n));
        for j in 0..n {
            let start = j.saturating_sub(bw);
            let mut pivot = self.bands[[0, j]];
            for k in start..j {
                let l_jk = factor[[j - k, k]];
                pivot -= l_jk * l_jk;
            }
            if pivot <= 0.0 || !pivot.is_finite() {
                return Err(SignalError::Internal(format!(
                    "matrix is not positive definite at row {}",
                    j
                )));
            }
            let diag = pivot.sqrt();
            factor[[0, j]] = diag;

            for i in (j + 1)..(j + bw + 1).min(n) {
                let mut value = self.bands[[i - j, j]];
                for k in i.saturating_sub(bw)..j {
                    value -= factor[[i - k, k]] * factor[[j - k, k]];
                }
                factor[[i - j, j]] = value / diag;
            }
        }

        let mut y = Array1::<f64>::zeros(n);
        for i in 0..n {
            let mut value = rhs[i];
            for k in i.saturating_sub(bw)..i {
                value -= factor[[i - k, k]] * y[k];
            }
            y[i] = value / factor[[0, i]];
        }

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut value = y[i];
            for k in (i + 1)..(i + bw + 1).min(n) {
                value -= factor[[k - i, i]] * x[k];
            }
            x[i] = value / factor[[0, i]];
        }

        Ok(x)
    }
}

pub struct MatrixHelper;

impl MatrixHelper {
    /// Solves a small dense system with Gaussian elimination and partial
    /// pivoting.
    pub fn solve_dense(matrix: &Array2<f64>, rhs: &[f64]) -> SignalResult<Vec<f64>> {
        let n = rhs.len();
        if matrix.nrows() != n || matrix.ncols() != n {
            return Err(SignalError::ShapeMismatch {
                expected: n,
                found: matrix.nrows(),
            });
        }

        let mut a = matrix.clone();
        let mut b = rhs.to_vec();

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&r1, &r2| a[[r1, col]].abs().total_cmp(&a[[r2, col]].abs()))
                .unwrap_or(col);
            if a[[pivot_row, col]].abs() < f64::EPSILON {
                return Err(SignalError::Internal("singular system".into()));
            }
            if pivot_row != col {
                for k in 0..n {
                    a.swap([col, k], [pivot_row, k]);
                }
                b.swap(col, pivot_row);
            }

            for row in (col + 1)..n {
                let factor = a[[row, col]] / a[[col, col]];
                if factor == 0.0 {
                    continue;
                }
                for k in col..n {
                    a[[row, k]] -= factor * a[[col, k]];
                }
                b[row] -= factor * b[col];
            }
        }

        let mut x = vec![0.0; n];
        for row in (0..n).rev() {
            let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
            x[row] = (b[row] - tail) / a[[row, row]];
        }
        Ok(x)
    }
}
