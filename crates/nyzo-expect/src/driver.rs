//! Send lines, await markers

use crate::reader::{LineReader, ReadOutcome};
use crate::DriverError;
use std::io::Write;
use std::time::{Duration, Instant};

/// Log target for echoed child output
pub const ECHO_TARGET: &str = "nyzo_expect::echo";

/// Request/response channel over a child's output and input
pub struct Driver<W: Write> {
    reader: LineReader,
    writer: W,
    timeout: Option<Duration>,
}

impl<W: Write> Driver<W> {
    /// Create a driver with no marker timeout
    pub fn new(reader: LineReader, writer: W) -> Self {
        Self {
            reader,
            writer,
            timeout: None,
        }
    }

    /// Bound every `await_marker` call (`None` waits forever)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The input side, for inspecting what was sent
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Write `content` and a newline, then flush
    ///
    /// Content is never logged: it may be a private key.
    pub fn send_line(&mut self, content: &str) -> Result<(), DriverError> {
        self.writer.write_all(content.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read lines until one contains `marker`, and return that line
    ///
    /// Every line read is echoed to the log. Lines without the marker are
    /// consumed and skipped.
    pub fn await_marker(&mut self, marker: &str) -> Result<String, DriverError> {
        let started = Instant::now();

        loop {
            let remaining = match self.timeout {
                Some(limit) => {
                    let elapsed = started.elapsed();
                    if elapsed >= limit {
                        return Err(DriverError::Timeout {
                            marker: marker.to_string(),
                            waited: elapsed,
                        });
                    }
                    Some(limit - elapsed)
                }
                None => None,
            };

            match self.reader.next_line(remaining)? {
                ReadOutcome::Line(line) => {
                    log::info!(target: ECHO_TARGET, "{}", line);
                    if line.contains(marker) {
                        return Ok(line);
                    }
                }
                ReadOutcome::Timeout => {
                    return Err(DriverError::Timeout {
                        marker: marker.to_string(),
                        waited: started.elapsed(),
                    });
                }
                ReadOutcome::Closed => {
                    return Err(DriverError::ProcessTerminatedEarly {
                        marker: marker.to_string(),
                    });
                }
            }
        }
    }
}
