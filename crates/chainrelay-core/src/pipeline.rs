//! Raw log line → [`WireEvent`].

use base64::{engine::general_purpose, Engine as _};

use crate::decoder::ProgramEvent;
use crate::error::LineError;
use crate::event::WireEvent;
use crate::filter::LogFilter;

/// Stateless decode path applied to every upstream log line.
#[derive(Debug, Clone, Default)]
pub struct LogPipeline {
    filter: LogFilter,
}

impl LogPipeline {
    pub fn new(filter: LogFilter) -> Self {
        Self { filter }
    }

    /// Decode one log line.
    ///
    /// `Ok(None)` means the line is not a relayed event: it lacks the
    /// marker, or its payload carries a different discriminator.
    pub fn process_line(&self, line: &str) -> Result<Option<WireEvent>, LineError> {
        let Some(payload) = self.filter.extract(line)? else {
            return Ok(None);
        };

        let bytes = general_purpose::STANDARD.decode(payload)?;

        match ProgramEvent::decode(&bytes) {
            None => Ok(None),
            Some(event) => Ok(Some(event?.into_wire())),
        }
    }

    /// Decode one log line and serialize the result for clients.
    pub fn serialize_line(&self, line: &str) -> Result<Option<(WireEvent, String)>, LineError> {
        let Some(wire) = self.process_line(line)? else {
            return Ok(None);
        };
        let json = wire.to_json()?;
        Ok(Some((wire, json)))
    }
}
