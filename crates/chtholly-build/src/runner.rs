//! Command runner
//!
//! Runs a single external process and relays its stdout and stderr line by
//! line while it runs. Both streams are also captured, interleaved in arrival
//! order, so callers can show them again after the fact.

use crate::error::{RunnerError, RunnerResult};
use crate::step::{CommandSpec, Outcome};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Where process output goes while the process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Relay {
    /// Forward to the operator's stdout/stderr and capture
    #[default]
    Stream,
    /// Capture only
    Capture,
}

/// Result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub outcome: Outcome,
    /// Interleaved stdout and stderr text
    pub output: String,
    pub duration: Duration,
}

impl RunOutput {
    pub fn new(outcome: Outcome, output: impl Into<String>) -> Self {
        Self {
            outcome,
            output: output.into(),
            duration: Duration::ZERO,
        }
    }

    /// Check if the process exited with code 0
    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Seam between the sequencer and process execution
pub trait ProcessRunner {
    /// Run the command to completion
    ///
    /// A nonzero exit is `Ok` with a failure outcome; `Err` means the process
    /// could not be started or awaited.
    fn run(&self, command: &CommandSpec) -> RunnerResult<RunOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &CommandSpec) -> RunnerResult<RunOutput> {
        (**self).run(command)
    }
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Stdout,
    Stderr,
}

/// Runs commands as child processes
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    relay: Relay,
}

impl CommandRunner {
    /// Create a runner that streams output to the operator
    pub fn new() -> Self {
        Self::default()
    }

    /// Set relay mode
    pub fn with_relay(mut self, relay: Relay) -> Self {
        self.relay = relay;
        self
    }

    pub fn relay(&self) -> Relay {
        self.relay
    }

    fn forward(&self, channel: Channel, line: &str) {
        if self.relay == Relay::Capture {
            return;
        }
        // A closed terminal must not stop the drain, so write errors are ignored.
        match channel {
            Channel::Stdout => {
                let mut out = io::stdout().lock();
                let _ = out.write_all(line.as_bytes());
                let _ = out.flush();
            }
            Channel::Stderr => {
                let mut err = io::stderr().lock();
                let _ = err.write_all(line.as_bytes());
                let _ = err.flush();
            }
        }
    }
}

impl ProcessRunner for CommandRunner {
    fn run(&self, command: &CommandSpec) -> RunnerResult<RunOutput> {
        let program = command.program.display().to_string();
        tracing::debug!(
            program = %program,
            args = ?command.args,
            cwd = ?command.cwd,
            "spawning process"
        );

        let start = Instant::now();
        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .envs(&command.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match self.relay {
            Relay::Stream => process.stdin(Stdio::inherit()),
            Relay::Capture => process.stdin(Stdio::null()),
        };
        if let Some(ref dir) = command.cwd {
            process.current_dir(dir);
        }

        let mut child = process
            .spawn()
            .map_err(|e| RunnerError::launch(&program, e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Readers end at EOF, which the child's exit guarantees; the scope joins
        // them before the child is awaited.
        let output = thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            if let Some(stdout) = stdout {
                let tx = tx.clone();
                scope.spawn(move || read_lines(stdout, Channel::Stdout, tx));
            }
            if let Some(stderr) = stderr {
                let tx = tx.clone();
                scope.spawn(move || read_lines(stderr, Channel::Stderr, tx));
            }
            drop(tx);

            let mut captured = String::new();
            for (channel, line) in rx {
                self.forward(channel, &line);
                captured.push_str(&line);
            }
            captured
        });

        let status = child.wait().map_err(|e| RunnerError::wait(&program, e))?;
        let code = status.code().unwrap_or(1);
        let duration = start.elapsed();
        tracing::debug!(
            program = %program,
            code,
            elapsed_ms = duration.as_millis() as u64,
            "process exited"
        );

        Ok(RunOutput {
            outcome: Outcome::from_exit_code(code),
            output,
            duration,
        })
    }
}

/// Send each line (newline-terminated) until EOF or a read error
fn read_lines<T: Read>(stream: T, channel: Channel, tx: Sender<(Channel, String)>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let mut line = String::from_utf8_lossy(&buf).into_owned();
                if !line.ends_with('\n') {
                    line.push('\n');
                }
                if tx.send((channel, line)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "stopped reading process output");
                break;
            }
        }
    }
}
