pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Standard deviation with an `N` divisor.
    pub fn population_std(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let mean = Self::mean(samples);
        let sum_sq: f64 = samples.iter().map(|&v| (v - mean) * (v - mean)).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Percentile `q` (0..=100) of an ascending slice, interpolating linearly
    /// between the two closest ranks at position `(n - 1) * q / 100`.
    pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
        match sorted.len() {
            0 => f64::NAN,
            1 => sorted[0],
            n => {
                let position = (n - 1) as f64 * (q / 100.0).clamp(0.0, 1.0);
                let lower = position.floor() as usize;
                let upper = (lower + 1).min(n - 1);
                let fraction = position - lower as f64;
                sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
            }
        }
    }

    pub fn sorted(samples: &[f64]) -> Vec<f64> {
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }
}
