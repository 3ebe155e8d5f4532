//! Timeout-bounded line reading
//!
//! Blocking pipe reads cannot be cancelled, so the read happens on a
//! dedicated thread and lines are handed over a channel. Waiting on the
//! channel is what carries the timeout.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Longest line accepted from a child, terminator excluded
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Result of waiting for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line, without its terminator
    Line(String),
    /// Nothing arrived within the timeout
    Timeout,
    /// The stream ended
    Closed,
}

/// Line reader over a byte stream, fed by a background thread
pub struct LineReader {
    lines: Receiver<io::Result<String>>,
    closed: bool,
}

impl LineReader {
    /// Start reading `source` on a background thread
    ///
    /// The thread exits when the stream ends, on a read error, or once this
    /// reader is dropped and the next line has nowhere to go.
    pub fn spawn<R: Read + Send + 'static>(source: R) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();

        thread::Builder::new()
            .name("nyzo-expect-reader".into())
            .spawn(move || {
                let mut reader = BufReader::new(source);
                loop {
                    let mut buf = Vec::new();
                    let limit = (MAX_LINE_LEN + 1) as u64;
                    match (&mut reader).take(limit).read_until(b'\n', &mut buf) {
                        Ok(0) => break,
                        Ok(n) if n as u64 == limit && buf.last() != Some(&b'\n') => {
                            let _ = sender.send(Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("output line exceeds {} bytes", MAX_LINE_LEN),
                            )));
                            break;
                        }
                        Ok(_) => {
                            let line = String::from_utf8_lossy(&buf)
                                .trim_end_matches(&['\r', '\n'][..])
                                .to_string();
                            if sender.send(Ok(line)).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            let _ = sender.send(Err(e));
                            break;
                        }
                    }
                }
            })?;

        Ok(Self {
            lines: receiver,
            closed: false,
        })
    }

    /// Wait for the next line
    ///
    /// `None` waits without bound.
    pub fn next_line(&mut self, timeout: Option<Duration>) -> io::Result<ReadOutcome> {
        if self.closed {
            return Ok(ReadOutcome::Closed);
        }

        let received = match timeout {
            Some(timeout) => match self.lines.recv_timeout(timeout) {
                Ok(received) => received,
                Err(RecvTimeoutError::Timeout) => return Ok(ReadOutcome::Timeout),
                Err(RecvTimeoutError::Disconnected) => {
                    self.closed = true;
                    return Ok(ReadOutcome::Closed);
                }
            },
            None => match self.lines.recv() {
                Ok(received) => received,
                Err(_) => {
                    self.closed = true;
                    return Ok(ReadOutcome::Closed);
                }
            },
        };

        received.map(ReadOutcome::Line)
    }
}
