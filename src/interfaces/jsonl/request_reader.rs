use crate::error::{OrderError, Result};
use crate::interfaces::gateway::GatewayRequest;
use std::io::{BufRead, BufReader, Read};

/// Reads gateway requests from a JSON-lines source, one request per line.
///
/// A malformed line yields an error for that line only; reading continues with
/// the next one. Blank lines are skipped.
pub struct RequestReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> RequestReader<R> {
    /// Creates a new `RequestReader` from any `Read` source (e.g. File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads and decodes requests, so large
    /// files are streamed rather than loaded whole.
    pub fn requests(self) -> impl Iterator<Item = Result<GatewayRequest>> {
        self.reader.lines().enumerate().filter_map(|(index, line)| {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(OrderError::from(e))),
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(serde_json::from_str(&line).map_err(|e| {
                OrderError::BadRequest(format!("line {}: {e}", index + 1))
            }))
        })
    }
}
