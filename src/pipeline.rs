//! The phase driver: probe, discover, recommend, select, execute, save.
//!
//! Every phase after the probe tolerates the failure of the ones before it.
//! The session always reaches storage with whatever was gathered; only
//! storage failures abort a run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::discover::{self, Scanner};
use crate::execute::{Engine, ExecutionObserver, ToolPolicy};
use crate::llm::Generate;
use crate::model::{
    AiOutcome, DiscoveryOutcome, DiscoverySummary, Reachability, Recommendation, ScanMode, Session,
    SessionId,
};
use crate::probe::Probe;
use crate::recommend::{self, PromptContext, Recommendations};
use crate::report;
use crate::select::parse_selection;
use crate::storage::{self, Storage};

/// What to run against.
#[derive(Debug, Clone)]
pub struct Request {
    pub target: String,
    pub mode: ScanMode,
    pub hint: Option<String>,
}

/// The outside world, as the pipeline sees it.
pub struct Collaborators<'a> {
    pub probe: &'a dyn Probe,
    pub scanner: &'a dyn Scanner,

    /// `None` when no model endpoint is configured.
    pub model: Option<&'a dyn Generate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reachability,
    Discovery,
    Recommendations,
    Execution,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reachability => "Phase 1: Reachability",
            Self::Discovery => "Phase 2: Service Discovery",
            Self::Recommendations => "Phase 3: AI Recommendations",
            Self::Execution => "Phase 4: Command Execution",
        })
    }
}

/// The person at the keyboard: narrated to, and asked which commands to run.
pub trait Operator: ExecutionObserver {
    fn phase(&mut self, _phase: Phase) {}

    fn reachability(&mut self, _reachability: &Reachability) {}

    fn discovery(&mut self, _discovery: &DiscoveryOutcome) {}

    fn recommendations(&mut self, _outcome: AiOutcome, _candidates: &[Recommendation]) {}

    /// Selection text for [`parse_selection`]. Only asked when there are candidates.
    fn choose_commands(&mut self, candidates: &[Recommendation]) -> String;
}

/// A finished run.
#[derive(Debug)]
pub struct Completed {
    pub session: Session,
    pub report_path: PathBuf,
}

pub struct Pipeline<'a> {
    storage: &'a Storage,
    reports_dir: PathBuf,
    command_timeout: Duration,
    collaborators: Collaborators<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        storage: &'a Storage,
        reports_dir: impl Into<PathBuf>,
        command_timeout: Duration,
        collaborators: Collaborators<'a>,
    ) -> Self {
        Self {
            storage,
            reports_dir: reports_dir.into(),
            command_timeout,
            collaborators,
        }
    }

    /// Run every phase for `request`, save the session, and write its report.
    pub fn run(
        &self,
        request: Request,
        policy: &mut dyn ToolPolicy,
        operator: &mut dyn Operator,
    ) -> storage::Result<Completed> {
        let mut session = Session::new(request.target, request.mode, request.hint);
        let id = session.session_id().clone();
        info!(session = %id, target = session.target(), mode = %session.mode(), "starting session");

        operator.phase(Phase::Reachability);
        let reachability = self.collaborators.probe.check(session.target());
        operator.reachability(&reachability);
        session.record_reachability(reachability);

        operator.phase(Phase::Discovery);
        self.storage.prepare_session_dir(&id)?;
        let discovery = discover::discover(
            self.collaborators.scanner,
            session.target(),
            session.mode(),
            &self.storage.discovery_xml_path(&id),
        );
        operator.discovery(&discovery);
        session.record_discovery(discovery);

        operator.phase(Phase::Recommendations);
        let (outcome, raw, candidates) = self.recommend(&session);
        operator.recommendations(outcome, &candidates);
        session.record_ai(outcome, raw, candidates);

        let candidates = session.ai_recommendations().to_vec();
        if candidates.is_empty() {
            info!("no candidates to execute");
        } else {
            let selected = parse_selection(candidates.len(), &operator.choose_commands(&candidates));
            operator.phase(Phase::Execution);
            Engine::new(
                self.storage.logs_dir(&id),
                self.command_timeout,
                policy,
                operator,
            )
            .execute(&mut session, &candidates, &selected);

            let executed = session.executed_commands();
            let timed_out = executed.iter().filter(|c| c.timed_out()).count();
            info!(
                selected = selected.len(),
                executed = executed.len(),
                timed_out,
                "execution finished"
            );
        }

        self.storage.save_session(&session)?;
        let report_path = report::write_report(&session, &self.reports_dir)?;
        info!(session = %id, report = %report_path.display(), "session saved");

        Ok(Completed {
            session,
            report_path,
        })
    }

    fn recommend(&self, session: &Session) -> (AiOutcome, Option<String>, Vec<Recommendation>) {
        let Some(model) = self.collaborators.model else {
            info!("no model endpoint configured; skipping recommendations");
            return (AiOutcome::NotConfigured, None, Vec::new());
        };

        let empty = DiscoverySummary::default();
        let context = PromptContext {
            target: session.target(),
            mode: session.mode(),
            hint: session.hint(),
            reachability: session.reachability(),
            discovery_summary: session.discovery().map_or(&empty, |d| &d.summary),
        };

        let Some(answer) = recommend::ask(model, &context) else {
            return (AiOutcome::NoResponse, None, Vec::new());
        };
        debug!(
            bytes = answer.raw().len(),
            parsed = answer.is_parsed(),
            candidates = answer.recommendations().len(),
            "model answered"
        );

        match answer {
            Recommendations::Parsed {
                raw,
                recommendations,
            } => (AiOutcome::Parsed, Some(raw), recommendations),
            Recommendations::Unparsed { raw, .. } => {
                warn!("model output could not be parsed; continuing without recommendations");
                (AiOutcome::Unparsed, Some(raw), Vec::new())
            }
        }
    }
}

/// Regenerate the report for a stored session.
pub fn regenerate_report(
    storage: &Storage,
    reports_dir: &Path,
    id: &SessionId,
) -> storage::Result<(Session, PathBuf)> {
    let session = storage.load_session(id)?;
    let path = report::write_report(&session, reports_dir)?;
    Ok((session, path))
}
