//! Program-log line filter.

use crate::error::LineError;

/// Substring that marks a log line as a candidate event line.
///
/// It is the base64 rendering of the leading discriminator bytes, so it
/// appears in every `Program data:` line carrying a create event.
pub const EVENT_MARKER: &str = "G3KpTd7r";

/// Prefix the Solana runtime puts in front of `sol_log_data` payloads.
pub const PROGRAM_DATA_PREFIX: &str = "Program data: ";

/// Selects candidate lines and extracts their base64 payload.
#[derive(Debug, Clone)]
pub struct LogFilter {
    marker: String,
    prefix: String,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::new(EVENT_MARKER, PROGRAM_DATA_PREFIX)
    }
}

impl LogFilter {
    pub fn new(marker: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            prefix: prefix.into(),
        }
    }

    /// Returns the payload text of a candidate line.
    ///
    /// `Ok(None)` when the line lacks the marker. A marked line without
    /// the prefix is malformed.
    pub fn extract<'a>(&self, line: &'a str) -> Result<Option<&'a str>, LineError> {
        if !line.contains(self.marker.as_str()) {
            return Ok(None);
        }
        line.split_once(self.prefix.as_str())
            .map(|(_, payload)| Some(payload))
            .ok_or(LineError::MissingProgramData)
    }
}
