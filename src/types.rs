use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::probes::HandshakeRecord;

/// Outcome of probing one target.
#[derive(Debug, Serialize, Clone)]
pub struct DetectResult {
    pub ts: DateTime<Utc>,
    pub target: String,
    pub detected: bool,
    pub handshake: Option<HandshakeRecord>,
    pub error_kind: Option<&'static str>, // "connect_error", "read_error", "missing_data", "invalid_protocol"
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub targets: usize,
    pub detected: usize,
    pub failed: usize,
}

impl ScanSummary {
    pub fn from_results(results: &[DetectResult]) -> Self {
        let detected = results.iter().filter(|r| r.detected).count();
        Self {
            targets: results.len(),
            detected,
            failed: results.len() - detected,
        }
    }

    /// True when every target answered with a valid handshake.
    pub fn all_detected(&self) -> bool {
        self.targets > 0 && self.failed == 0
    }
}
