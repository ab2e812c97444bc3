//! Live narration of a run on the terminal.

use tracing::warn;

use crate::execute::{ExecutionObserver, Skip};
use crate::model::{AiOutcome, DiscoveryOutcome, ExecutedCommand, Reachability, Recommendation};
use crate::pipeline::{Operator, Phase};

use super::format::{
    format_discovery, format_finished, format_preview, format_reachability,
    format_recommendations, format_skip,
};
use super::prompt;

/// Prints each phase and asks the operator which commands to run.
pub(super) struct Console {
    /// Selection given up front with `--select`; asked for when `None`.
    selection: Option<String>,
}

impl Console {
    pub(super) fn new(selection: Option<String>) -> Self {
        Self { selection }
    }
}

impl ExecutionObserver for Console {
    fn starting(&mut self, index: usize, candidate: &Recommendation) {
        println!("\n[#{index}] {}", candidate.name);
        println!("$ {}", candidate.command);
    }

    fn finished(&mut self, record: &ExecutedCommand, stdout: &str) {
        println!("{}", format_preview(stdout));
        println!("{}", format_finished(record));
    }

    fn skipped(&mut self, index: usize, skip: &Skip) {
        println!("{}", format_skip(index, skip));
    }
}

impl Operator for Console {
    fn phase(&mut self, phase: Phase) {
        println!("\n== {phase} ==");
    }

    fn reachability(&mut self, reachability: &Reachability) {
        println!("{}", format_reachability(reachability));
    }

    fn discovery(&mut self, discovery: &DiscoveryOutcome) {
        println!("{}", format_discovery(discovery));
    }

    fn recommendations(&mut self, outcome: AiOutcome, candidates: &[Recommendation]) {
        println!("{}", format_recommendations(outcome, candidates));
    }

    fn choose_commands(&mut self, _candidates: &[Recommendation]) -> String {
        if let Some(selection) = self.selection.take() {
            println!("Selected: {selection}");
            return selection;
        }
        println!();
        selection_or_none(prompt::ask(
            "Commands to run (e.g. 1,3 or 'all'; empty to skip)",
        ))
    }
}

/// The operator's answer, or an empty selection when there is none.
fn selection_or_none(answer: Result<Option<String>, String>) -> String {
    match answer {
        Ok(Some(answer)) => answer,
        Ok(None) => String::new(),
        Err(e) => {
            warn!("{e}; running no commands");
            String::new()
        }
    }
}
