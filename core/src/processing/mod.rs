pub mod baseline;
pub mod normalize;
pub mod peaks;
pub mod range;
pub mod smoothing;

pub use baseline::{baseline_als, BaselineStage};
pub use normalize::{normalize_snv, NormalizeStage};
pub use peaks::{find_signal_peaks, PeakProperties, PeakResult, PeakStage};
pub use range::{filter_frequency_range, RangeStage};
pub use smoothing::{smooth_signal, SmoothingStage};
