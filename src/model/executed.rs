//! Execution provenance: one record per dispatched command.

use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Category, Recommendation};

/// Exit code recorded when a command produced no real exit status
/// (timed out or failed to launch). `outcome` says which.
pub const NO_EXIT_CODE: i32 = -1;

/// Provenance of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedCommand {
    /// 1-based index into the candidate list at selection time.
    /// Not the execution order.
    pub index: usize,
    pub name: String,
    pub command: String,
    pub category: Category,
    pub priority: i64,
    pub rationale: String,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,

    /// The process's exit code, or [`NO_EXIT_CODE`].
    pub exit_code: i32,
    pub outcome: CommandOutcome,

    /// The captured output log. Created before the command starts.
    pub log_file: PathBuf,
}

impl ExecutedCommand {
    /// Assemble a record from the candidate it was dispatched for.
    pub fn from_candidate(
        index: usize,
        candidate: &Recommendation,
        started_at: Timestamp,
        ended_at: Timestamp,
        outcome: CommandOutcome,
        exit_code: i32,
        log_file: PathBuf,
    ) -> Self {
        Self {
            index,
            name: candidate.name.clone(),
            command: candidate.command.clone(),
            category: candidate.category.clone(),
            priority: candidate.priority,
            rationale: candidate.rationale.clone(),
            started_at,
            ended_at,
            exit_code,
            outcome,
            log_file,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.outcome, CommandOutcome::TimedOut)
    }
}

/// How a dispatched command ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommandOutcome {
    /// The process ran to completion; `exit_code` is real.
    Exited,

    /// The process hit the wall-clock ceiling and was killed.
    TimedOut,

    /// The process could not be started or waited on.
    LaunchFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_tagged() {
        let json = serde_json::to_string(&CommandOutcome::LaunchFailed {
            reason: "gone".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"launchFailed","reason":"gone"}"#);

        let json = serde_json::to_string(&CommandOutcome::TimedOut).unwrap();
        assert_eq!(json, r#"{"kind":"timedOut"}"#);
    }
}
