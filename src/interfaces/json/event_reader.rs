use crate::domain::event::PaymentEvent;
use crate::error::{PaymentError, Result};
use std::io::{BufRead, BufReader, Read};

/// Reads payment events from a JSON-lines source.
///
/// Each non-blank line holds one `{"type": ..., "payload": ...}` object. A line
/// that fails to parse yields an error item and reading carries on with the
/// next line.
pub struct EventReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads and deserializes events.
    pub fn events(self) -> impl Iterator<Item = Result<PaymentEvent>> {
        self.reader
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line).map_err(PaymentError::from)
            })
    }
}
