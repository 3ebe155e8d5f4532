//! Child process ownership
//!
//! A [`ScriptedProcess`] owns its child for its whole lifetime: whatever
//! path the caller takes out (success, error, panic), dropping it kills a
//! still-running child and reaps it.

use crate::conversation::Conversation;
use crate::driver::Driver;
use crate::reader::LineReader;
use crate::DriverError;
use std::fmt;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Log target for the child's stderr
pub const STDERR_TARGET: &str = "nyzo_expect::stderr";

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Program and arguments to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Kills and reaps the child on drop unless it already exited.
struct ChildGuard {
    child: Child,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            log::warn!("Killing child process {}", self.child.id());
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

/// A running child driven through a [`Conversation`]
pub struct ScriptedProcess {
    conversation: Conversation<ChildStdin>,
    guard: ChildGuard,
}

impl ScriptedProcess {
    /// Spawn `command` with piped stdin/stdout
    ///
    /// Stderr is drained to the log so a chatty child cannot block on a full
    /// pipe. `timeout` bounds each marker wait.
    pub fn spawn(command: &ProcessCommand, timeout: Option<Duration>) -> Result<Self, DriverError> {
        log::debug!("Spawning {}", command);

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DriverError::Spawn {
                program: command.program.display().to_string(),
                source,
            })?;
        let mut guard = ChildGuard { child };

        let stdin = guard.child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = guard.child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        if let Some(stderr) = guard.child.stderr.take() {
            spawn_stderr_drain(stderr)?;
        }

        let reader = LineReader::spawn(stdout)?;
        let driver = Driver::new(reader, stdin).with_timeout(timeout);

        Ok(Self {
            conversation: Conversation::new(driver),
            guard,
        })
    }

    pub fn id(&self) -> u32 {
        self.guard.child.id()
    }

    pub fn conversation(&mut self) -> &mut Conversation<ChildStdin> {
        &mut self.conversation
    }

    /// Wait up to `grace` for the child to exit on its own
    ///
    /// On expiry the child is killed and `ExitTimeout` returned.
    pub fn wait(&mut self, grace: Duration) -> Result<ExitStatus, DriverError> {
        let started = Instant::now();
        loop {
            if let Some(status) = self.guard.child.try_wait()? {
                log::debug!("Child process {} exited: {}", self.id(), status);
                return Ok(status);
            }
            if started.elapsed() >= grace {
                let _ = self.guard.child.kill();
                let _ = self.guard.child.wait();
                return Err(DriverError::ExitTimeout {
                    waited: started.elapsed(),
                });
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

fn missing_pipe(name: &str) -> DriverError {
    DriverError::Io(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("child {} was not captured", name),
    ))
}

fn spawn_stderr_drain(stderr: ChildStderr) -> io::Result<()> {
    thread::Builder::new()
        .name("nyzo-expect-stderr".into())
        .spawn(move || {
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) => log::debug!(target: STDERR_TARGET, "{}", line),
                    Err(_) => break,
                }
            }
        })?;
    Ok(())
}
