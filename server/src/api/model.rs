use serde::{Deserialize, Serialize};
use spectracore::telemetry::MetricsSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<String>,
    pub frequencies: Vec<Vec<f64>>,
    pub amplitudes: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub metrics: MetricsSnapshot,
}
