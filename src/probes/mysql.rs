use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use super::helper::{connect_with_timeout, read_once};
use super::mysql_handshake::{decode, HandshakeRecord};
use crate::error::DetectError;
use crate::types::DetectResult;

pub const DEFAULT_PORT: u16 = 3306;

/// The handshake fits comfortably; anything the server sends beyond this is ignored.
pub const READ_BUFFER_LEN: usize = 1024;

/// Connect to `addr`, read whatever the server volunteers in a single read
/// and decode it as a protocol-10 handshake.
///
/// `timeout` bounds the connect and the read separately. The connection is
/// closed before decoding, whatever the outcome.
pub async fn detect_mysql(addr: &str, timeout: Duration) -> Result<HandshakeRecord, DetectError> {
    let mut tcp = connect_with_timeout(addr, timeout)
        .await
        .map_err(DetectError::Connect)?;
    debug!(%addr, "connected");

    let read = read_once(&mut tcp, READ_BUFFER_LEN, timeout).await;
    drop(tcp);

    let bytes = read.map_err(DetectError::Read)?;
    debug!(%addr, bytes = bytes.len(), "read handshake");

    let record = decode(&bytes).map_err(|e| {
        debug!(%addr, error = %e, "handshake decode failed");
        DetectError::from(e)
    })?;
    info!(%addr, version = %record.server_version, "mysql detected");
    Ok(record)
}

pub struct MysqlProbe {
    pub timeout: Duration,
}

impl MysqlProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run one attempt against `addr` and fold it into a reportable result.
    pub async fn detect(&self, addr: &str) -> DetectResult {
        let ts = Utc::now();
        let start = Instant::now();
        let outcome = detect_mysql(addr, self.timeout).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(handshake) => DetectResult {
                ts,
                target: addr.to_string(),
                detected: true,
                handshake: Some(handshake),
                error_kind: None,
                error: None,
                duration_ms,
            },
            Err(e) => DetectResult {
                ts,
                target: addr.to_string(),
                detected: false,
                handshake: None,
                error_kind: Some(e.kind()),
                error: Some(e.to_string()),
                duration_ms,
            },
        }
    }
}
