//! Execution engine: dispatch selected recommendations, one at a time.
//!
//! Every dispatched command gets its own log file, created before the
//! command starts, and one [`ExecutedCommand`] appended to the session.
//! Failures (missing tool, timeout, launch error) affect only their own
//! index; the batch always runs to the end of the selection.

mod install;

pub use install::{NeverInstall, PackageInstaller};

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::model::{CommandOutcome, ExecutedCommand, NO_EXIT_CODE, Recommendation, Session};
use crate::process::{self, Completion};

/// Separates captured stdout from stderr in a command log.
pub const STDERR_MARKER: &str = "\n\n[STDERR]\n";

/// Written to the log in place of output when a command times out.
pub const TIMEOUT_MARKER: &str = "Command timed out.";

/// Decides what happens when a selected command's executable is missing.
pub trait ToolPolicy {
    /// Returns whether `tool` is available once the policy has been applied.
    fn ensure_available(&mut self, tool: &str) -> bool;
}

/// Why a selected index was not dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    OutOfRange,
    EmptyCommand,

    /// The command could not be split into words (e.g. unbalanced quotes).
    Unsplittable(String),

    /// The leading executable is missing and the policy didn't provide it.
    ToolUnavailable(String),

    /// The log file could not be created, so the command was not started.
    LogUnavailable(String),
}

/// Live progress from the engine. Every method defaults to doing nothing.
pub trait ExecutionObserver {
    fn starting(&mut self, _index: usize, _candidate: &Recommendation) {}

    /// `stdout` is the captured standard output (empty unless the command exited).
    fn finished(&mut self, _record: &ExecutedCommand, _stdout: &str) {}

    fn skipped(&mut self, _index: usize, _skip: &Skip) {}
}

impl ExecutionObserver for () {}

/// Runs selected candidates under the logging, timeout, and tool policies.
pub struct Engine<'a, P: ?Sized, O: ?Sized> {
    logs_dir: PathBuf,
    timeout: Duration,
    policy: &'a mut P,
    observer: &'a mut O,
}

impl<'a, P, O> Engine<'a, P, O>
where
    P: ToolPolicy + ?Sized,
    O: ExecutionObserver + ?Sized,
{
    pub fn new(
        logs_dir: impl Into<PathBuf>,
        timeout: Duration,
        policy: &'a mut P,
        observer: &'a mut O,
    ) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            timeout,
            policy,
            observer,
        }
    }

    /// Execute each selected candidate in order, appending provenance to
    /// `session`.
    ///
    /// `selected` holds 1-based indices into `candidates`, and is re-validated
    /// here: each index runs at most once, in ascending order. Returns once
    /// every index has been attempted.
    pub fn execute(
        &mut self,
        session: &mut Session,
        candidates: &[Recommendation],
        selected: &[usize],
    ) {
        if selected.is_empty() {
            debug!("no commands selected");
            return;
        }
        if let Err(e) = fs::create_dir_all(&self.logs_dir) {
            warn!(dir = %self.logs_dir.display(), "failed to create logs directory: {e}");
        }

        let mut selected = selected.to_vec();
        selected.sort_unstable();
        selected.dedup();

        for index in selected {
            let Some(candidate) = index.checked_sub(1).and_then(|i| candidates.get(i)) else {
                self.skip(index, Skip::OutOfRange);
                continue;
            };
            match self.dispatch(index, candidate) {
                Ok(record) => session.push_executed(record),
                Err(skip) => self.skip(index, skip),
            }
        }
    }

    fn dispatch(
        &mut self,
        index: usize,
        candidate: &Recommendation,
    ) -> Result<ExecutedCommand, Skip> {
        let command = candidate.command.trim();
        if command.is_empty() {
            return Err(Skip::EmptyCommand);
        }

        let words = shell_words::split(command).map_err(|e| Skip::Unsplittable(e.to_string()))?;
        let tool = words.first().ok_or(Skip::EmptyCommand)?;
        if which::which(tool).is_err() && !self.policy.ensure_available(tool) {
            return Err(Skip::ToolUnavailable(tool.clone()));
        }

        let log_path = self.log_path(index);
        let mut log = File::create(&log_path).map_err(|e| Skip::LogUnavailable(e.to_string()))?;

        info!(index, command, "executing command");
        self.observer.starting(index, candidate);
        let started_at = Timestamp::now();
        let completion = process::run_shell(command, self.timeout);
        let ended_at = Timestamp::now();

        let (outcome, exit_code, stdout, log_body) = match completion {
            Completion::Exited {
                code,
                stdout,
                stderr,
            } => {
                let body = format!("{stdout}{STDERR_MARKER}{stderr}");
                (CommandOutcome::Exited, code, stdout, body)
            }
            Completion::TimedOut => (
                CommandOutcome::TimedOut,
                NO_EXIT_CODE,
                String::new(),
                TIMEOUT_MARKER.to_string(),
            ),
            Completion::Failed(e) => {
                let reason = e.to_string();
                let body = format!("Command failed to run: {reason}");
                (
                    CommandOutcome::LaunchFailed { reason },
                    NO_EXIT_CODE,
                    String::new(),
                    body,
                )
            }
        };

        if let Err(e) = log.write_all(log_body.as_bytes()) {
            warn!(log = %log_path.display(), "failed to write command log: {e}");
        }
        debug!(index, exit_code, ?outcome, "command finished");

        let record = ExecutedCommand::from_candidate(
            index,
            candidate,
            started_at,
            ended_at,
            outcome,
            exit_code,
            log_path,
        );
        self.observer.finished(&record, &stdout);
        Ok(record)
    }

    fn skip(&mut self, index: usize, skip: Skip) {
        info!(index, ?skip, "skipping command");
        self.observer.skipped(index, &skip);
    }

    fn log_path(&self, index: usize) -> PathBuf {
        log_path(&self.logs_dir, index)
    }
}

/// `cmd_<2-digit index>.log` under `logs_dir`.
pub fn log_path(logs_dir: &Path, index: usize) -> PathBuf {
    logs_dir.join(format!("cmd_{index:02}.log"))
}
