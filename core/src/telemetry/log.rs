use log::{debug, info, warn};

/// Thin wrapper over the `log` facade for stage-level records.
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn record_stage(&self, stage: &str, note: &str) {
        debug!(target: "spectracore::stage", "[{}] {}", stage, note);
    }

    pub fn record_failure(&self, series_index: usize, stage: &str, error: &dyn std::fmt::Display) {
        warn!(
            target: "spectracore::stage",
            "series {} failed in {} stage: {}", series_index, stage, error
        );
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
