pub mod matrix;
pub mod polyfit;
pub mod stats;

pub use matrix::{BandedMatrix, MatrixHelper};
pub use polyfit::PolyFitHelper;
pub use stats::StatsHelper;
