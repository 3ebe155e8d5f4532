//! Conversation state machine
//!
//! ```text
//! NotStarted → AwaitingStartup → { SendingBatch ⇄ AwaitingBatchAck }* → AwaitingFinal → Done
//! ```
//!
//! Any error moves the conversation to `Failed`, which is terminal. There
//! are no retries: a failed conversation is abandoned along with its process.

use crate::driver::Driver;
use crate::DriverError;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    NotStarted,
    AwaitingStartup,
    SendingBatch,
    AwaitingBatchAck,
    AwaitingFinal,
    Done,
    Failed,
}

impl ConversationState {
    pub fn is_done(&self) -> bool {
        *self == ConversationState::Done
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationState::Done | ConversationState::Failed)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversationState::NotStarted => "not started",
            ConversationState::AwaitingStartup => "awaiting startup",
            ConversationState::SendingBatch => "sending batch",
            ConversationState::AwaitingBatchAck => "awaiting batch acknowledgement",
            ConversationState::AwaitingFinal => "awaiting final marker",
            ConversationState::Done => "done",
            ConversationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A scripted exchange with one process
pub struct Conversation<W: Write> {
    driver: Driver<W>,
    state: ConversationState,
    acknowledged: usize,
}

impl<W: Write> Conversation<W> {
    pub fn new(driver: Driver<W>) -> Self {
        Self {
            driver,
            state: ConversationState::NotStarted,
            acknowledged: 0,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Number of batches acknowledged so far
    pub fn acknowledged(&self) -> usize {
        self.acknowledged
    }

    pub fn driver(&self) -> &Driver<W> {
        &self.driver
    }

    /// Wait for the startup banner
    pub fn start(&mut self, startup_marker: &str) -> Result<String, DriverError> {
        self.require("start", &[ConversationState::NotStarted])?;

        self.state = ConversationState::AwaitingStartup;
        let banner = self.guard(|driver| driver.await_marker(startup_marker))?;
        self.state = ConversationState::SendingBatch;
        Ok(banner)
    }

    /// Send one batch of lines and wait for its acknowledgement
    pub fn exchange(&mut self, lines: &[&str], ack_marker: &str) -> Result<String, DriverError> {
        self.require("send a batch", &[ConversationState::SendingBatch])?;

        self.guard(|driver| send_all(driver, lines))?;
        self.state = ConversationState::AwaitingBatchAck;
        let ack = self.guard(|driver| driver.await_marker(ack_marker))?;
        self.state = ConversationState::SendingBatch;
        self.acknowledged += 1;
        Ok(ack)
    }

    /// Send the closing lines and wait for the final marker
    ///
    /// Allowed before `start` for processes that print no startup banner.
    pub fn finish(&mut self, lines: &[&str], final_marker: &str) -> Result<String, DriverError> {
        self.require(
            "finish",
            &[ConversationState::NotStarted, ConversationState::SendingBatch],
        )?;

        self.guard(|driver| send_all(driver, lines))?;
        self.state = ConversationState::AwaitingFinal;
        let last = self.guard(|driver| driver.await_marker(final_marker))?;
        self.state = ConversationState::Done;
        Ok(last)
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[ConversationState],
    ) -> Result<(), DriverError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(DriverError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn guard<T>(
        &mut self,
        step: impl FnOnce(&mut Driver<W>) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        match step(&mut self.driver) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.state = ConversationState::Failed;
                Err(e)
            }
        }
    }
}

fn send_all<W: Write>(driver: &mut Driver<W>, lines: &[&str]) -> Result<(), DriverError> {
    for line in lines {
        driver.send_line(line)?;
    }
    Ok(())
}
