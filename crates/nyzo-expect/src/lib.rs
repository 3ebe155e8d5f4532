//! Nyzo Expect
//!
//! Drives an interactive child process as a scripted, line-oriented
//! conversation: send command lines, then block until a line containing an
//! expected marker appears on the child's output.
//!
//! # Layers
//!
//! - [`LineReader`]: background thread turning a byte stream into lines,
//!   read with an optional timeout (`Line` / `Timeout` / `Closed`)
//! - [`Driver`]: `send_line` and `await_marker` over a reader and a writer
//! - [`Conversation`]: state machine enforcing startup → batches → final
//! - [`ScriptedProcess`]: spawns the child and guarantees it is killed and
//!   reaped when dropped
//!
//! # Example
//!
//! ```
//! use nyzo_expect::{Conversation, Driver, LineReader};
//! use std::io::Cursor;
//!
//! let output = Cursor::new(b"starting\ntype X to exit Nyzo client\nbye\nfin.\n".to_vec());
//! let reader = LineReader::spawn(output).unwrap();
//! let mut conversation = Conversation::new(Driver::new(reader, Vec::new()));
//!
//! conversation.start("exit Nyzo client").unwrap();
//! conversation.finish(&["X"], "fin.").unwrap();
//! assert!(conversation.state().is_done());
//! ```

pub mod conversation;
pub mod driver;
pub mod process;
pub mod reader;

pub use conversation::{Conversation, ConversationState};
pub use driver::Driver;
pub use process::{ProcessCommand, ScriptedProcess};
pub use reader::{LineReader, ReadOutcome};

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors from driving a child process
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Timed out after {waited:?} waiting for {marker:?}")]
    Timeout { marker: String, waited: Duration },

    #[error("Process output ended before {marker:?} appeared")]
    ProcessTerminatedEarly { marker: String },

    #[error("Process did not exit within {waited:?}")]
    ExitTimeout { waited: Duration },

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ConversationState,
    },
}
