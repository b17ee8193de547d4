use anyhow::{ensure, Context};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use spectracore::prelude::Series;
use std::fmt::Write;

/// A Gaussian band in the synthetic spectrum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Band {
    pub center: f64,
    pub height: f64,
    pub width: f64,
}

/// Configuration for generating synthetic spectra.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub points: usize,
    pub start_freq: f64,
    pub end_freq: f64,
    pub bands: Vec<Band>,
    pub baseline_offset: f64,
    pub baseline_slope: f64,
    pub noise: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            points: 512,
            start_freq: 400.0,
            end_freq: 4000.0,
            bands: vec![
                Band {
                    center: 1000.0,
                    height: 8.0,
                    width: 60.0,
                },
                Band {
                    center: 1600.0,
                    height: 5.0,
                    width: 90.0,
                },
                Band {
                    center: 2900.0,
                    height: 11.0,
                    width: 120.0,
                },
            ],
            baseline_offset: 2.0,
            baseline_slope: 0.001,
            noise: 0.05,
            seed: 0,
        }
    }
}

/// Evenly spaced spectrum: sloped baseline plus Gaussian bands plus uniform
/// noise, reproducible for a given seed.
pub fn build_spectrum(config: &GeneratorConfig) -> anyhow::Result<Series> {
    ensure!(config.points > 0, "generator needs at least one point");
    ensure!(
        config.end_freq > config.start_freq,
        "generator range {}..{} is empty",
        config.start_freq,
        config.end_freq
    );
    ensure!(config.noise >= 0.0, "noise amplitude must not be negative");

    let step = if config.points > 1 {
        (config.end_freq - config.start_freq) / (config.points - 1) as f64
    } else {
        0.0
    };
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut frequencies = Vec::with_capacity(config.points);
    let mut amplitudes = Vec::with_capacity(config.points);

    for i in 0..config.points {
        let freq = config.start_freq + step * i as f64;
        let baseline = config.baseline_offset + config.baseline_slope * (freq - config.start_freq);
        let signal: f64 = config
            .bands
            .iter()
            .map(|band| band.height * (-((freq - band.center) / band.width).powi(2)).exp())
            .sum();
        let jitter = if config.noise > 0.0 {
            rng.gen_range(-config.noise..config.noise)
        } else {
            0.0
        };
        frequencies.push(freq);
        amplitudes.push(baseline + signal + jitter);
    }

    Ok(Series::new(frequencies, amplitudes))
}

/// Renders a series as the two-column text the upload endpoint accepts.
pub fn to_delimited_text(series: &Series, separator: &str) -> anyhow::Result<String> {
    let mut out = String::from("# synthetic spectrum\n");
    for (f, a) in series.frequencies.iter().zip(&series.amplitudes) {
        writeln!(out, "{}{}{}", f, separator, a).context("formatting spectrum row")?;
    }
    Ok(out)
}
