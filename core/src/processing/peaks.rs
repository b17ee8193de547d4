use crate::prelude::{ProcessingStage, Series, SignalResult, StageMetadata, StageOutput};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};

/// Per-peak diagnostics, parallel to the returned indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakProperties {
    pub prominences: Vec<f64>,
    pub left_bases: Vec<usize>,
    pub right_bases: Vec<usize>,
    pub widths: Vec<f64>,
    pub width_heights: Vec<f64>,
    pub left_ips: Vec<f64>,
    pub right_ips: Vec<f64>,
}

impl PeakProperties {
    fn push(&mut self, prominence: &Prominence, width: &Width) {
        self.prominences.push(prominence.value);
        self.left_bases.push(prominence.left_base);
        self.right_bases.push(prominence.right_base);
        self.widths.push(width.value);
        self.width_heights.push(width.height);
        self.left_ips.push(width.left_ip);
        self.right_ips.push(width.right_ip);
    }
}

/// Peaks found in a processed amplitude sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakResult {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
    pub properties: PeakProperties,
}

struct Prominence {
    value: f64,
    left_base: usize,
    right_base: usize,
}

struct Width {
    value: f64,
    height: f64,
    left_ip: f64,
    right_ip: f64,
}

/// Finds local maxima whose prominence is at least `prominence` and whose
/// width at half prominence is at least `width`. Indices are ascending.
/// Empty input yields an empty result.
pub fn find_signal_peaks(
    amplitudes: &[f64],
    width: f64,
    prominence: f64,
) -> (Vec<usize>, PeakProperties) {
    let mut indices = Vec::new();
    let mut properties = PeakProperties::default();

    for peak in local_maxima(amplitudes) {
        let prom = peak_prominence(amplitudes, peak);
        if prom.value < prominence {
            continue;
        }
        let w = peak_width(amplitudes, peak, &prom);
        if w.value < width {
            continue;
        }
        indices.push(peak);
        properties.push(&prom, &w);
    }

    (indices, properties)
}

/// Local maxima including flat plateaus, reported at the plateau midpoint
/// (rounded down). Samples at either boundary never qualify.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Height above the higher of the two lowest points reached before a
/// strictly higher sample (or the boundary) on each side.
fn peak_prominence(x: &[f64], peak: usize) -> Prominence {
    let height = x[peak];

    let mut left_base = peak;
    let mut left_min = height;
    let mut i = peak;
    loop {
        if x[i] > height {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_base = peak;
    let mut right_min = height;
    for (j, &value) in x.iter().enumerate().skip(peak) {
        if value > height {
            break;
        }
        if value < right_min {
            right_min = value;
            right_base = j;
        }
    }

    Prominence {
        value: height - left_min.max(right_min),
        left_base,
        right_base,
    }
}

/// Width at `x[peak] - prominence / 2`, with crossing points linearly
/// interpolated and bounded by the prominence bases.
fn peak_width(x: &[f64], peak: usize, prominence: &Prominence) -> Width {
    let height = x[peak] - prominence.value * 0.5;

    let mut i = peak;
    while i > prominence.left_base && height < x[i] {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if x[i] < height {
        left_ip += (height - x[i]) / (x[i + 1] - x[i]);
    }

    let mut i = peak;
    while i < prominence.right_base && height < x[i] {
        i += 1;
    }
    let mut right_ip = i as f64;
    if x[i] < height {
        right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
    }

    Width {
        value: right_ip - left_ip,
        height,
        left_ip,
        right_ip,
    }
}

/// Terminal stage: leaves the series untouched and attaches detected peaks.
pub struct PeakStage {
    width: f64,
    prominence: f64,
    logger: LogManager,
}

impl PeakStage {
    pub fn new(width: f64, prominence: f64) -> Self {
        Self {
            width,
            prominence,
            logger: LogManager::new(),
        }
    }
}

impl ProcessingStage for PeakStage {
    fn name(&self) -> &'static str {
        "peaks"
    }

    fn execute(&self, input: Series) -> SignalResult<StageOutput> {
        let (indices, properties) =
            find_signal_peaks(&input.amplitudes, self.width, self.prominence);
        let values = indices.iter().map(|&i| input.amplitudes[i]).collect();

        let note = format!("detected {} peaks", indices.len());
        self.logger.record_stage(self.name(), &note);

        Ok(StageOutput {
            series: input,
            metadata: StageMetadata {
                peaks: Some(PeakResult {
                    indices,
                    values,
                    properties,
                }),
                notes: vec![note],
                ..Default::default()
            },
        })
    }
}
