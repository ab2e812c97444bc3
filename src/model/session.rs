//! Session: the durable record of one reconnaissance run.

use std::fmt;
use std::str::FromStr;

use jiff::{Timestamp, Zoned};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DiscoveryOutcome, ExecutedCommand, Reachability, Recommendation, ScanMode};

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 4;

/// Identifies a session: local start time plus a short random suffix,
/// e.g. `20261018-142233-k3x9`.
///
/// Doubles as the session's directory name, so it never contains path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let stamp = Zoned::now().strftime("%Y%m%d-%H%M%S").to_string();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
            .collect();
        Self(format!("{stamp}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("session id cannot be empty".to_string());
        }
        if s == "." || s == ".." || s.contains(['/', '\\']) {
            return Err(format!("invalid session id '{s}'"));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for SessionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What became of the model phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiOutcome {
    /// No model endpoint configured; the phase was skipped.
    NotConfigured,

    /// The endpoint failed or returned nothing usable.
    NoResponse,

    /// The model answered but its output could not be interpreted.
    Unparsed,

    /// The model's output was interpreted. The list may still be empty.
    Parsed,
}

/// One end-to-end run.
///
/// Identity fields (`session_id`, `target`, `mode`) are fixed at creation.
/// Each phase output is recorded once; later attempts are ignored.
/// Executed commands are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    session_id: SessionId,
    target: String,
    mode: ScanMode,
    hint: Option<String>,
    created_at: Timestamp,
    reachability: Option<Reachability>,
    discovery: Option<DiscoveryOutcome>,
    ai_outcome: Option<AiOutcome>,
    ai_raw_output: Option<String>,
    ai_recommendations: Vec<Recommendation>,
    executed_commands: Vec<ExecutedCommand>,
}

impl Session {
    /// Start a new session. A blank hint is stored as `None`.
    pub fn new(target: impl Into<String>, mode: ScanMode, hint: Option<String>) -> Self {
        Self {
            session_id: SessionId::generate(),
            target: target.into(),
            mode,
            hint: hint.filter(|h| !h.trim().is_empty()),
            created_at: Timestamp::now(),
            reachability: None,
            discovery: None,
            ai_outcome: None,
            ai_raw_output: None,
            ai_recommendations: Vec::new(),
            executed_commands: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn reachability(&self) -> Option<&Reachability> {
        self.reachability.as_ref()
    }

    pub fn discovery(&self) -> Option<&DiscoveryOutcome> {
        self.discovery.as_ref()
    }

    pub fn ai_outcome(&self) -> Option<AiOutcome> {
        self.ai_outcome
    }

    pub fn ai_raw_output(&self) -> Option<&str> {
        self.ai_raw_output.as_deref()
    }

    pub fn ai_recommendations(&self) -> &[Recommendation] {
        &self.ai_recommendations
    }

    pub fn executed_commands(&self) -> &[ExecutedCommand] {
        &self.executed_commands
    }

    pub fn record_reachability(&mut self, reachability: Reachability) {
        if self.reachability.is_some() {
            warn!(session = %self.session_id, "reachability already recorded; ignoring");
            return;
        }
        self.reachability = Some(reachability);
    }

    pub fn record_discovery(&mut self, discovery: DiscoveryOutcome) {
        if self.discovery.is_some() {
            warn!(session = %self.session_id, "discovery already recorded; ignoring");
            return;
        }
        self.discovery = Some(discovery);
    }

    /// Record the model phase: its outcome, the raw text (if any), and the
    /// parsed candidates.
    pub fn record_ai(
        &mut self,
        outcome: AiOutcome,
        raw_output: Option<String>,
        recommendations: Vec<Recommendation>,
    ) {
        if self.ai_outcome.is_some() {
            warn!(session = %self.session_id, "model phase already recorded; ignoring");
            return;
        }
        self.ai_outcome = Some(outcome);
        self.ai_raw_output = raw_output;
        self.ai_recommendations = recommendations;
    }

    pub fn push_executed(&mut self, command: ExecutedCommand) {
        self.executed_commands.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    #[test]
    fn generated_id_has_timestamp_and_suffix() {
        let id = SessionId::generate();
        let parts: Vec<&str> = id.as_str().split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(
            parts[2]
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        );
    }

    #[test]
    fn ids_generated_together_differ() {
        let ids: std::collections::HashSet<_> = (0..50).map(|_| SessionId::generate()).collect();
        // 36^4 suffixes within one second; a collision among 50 is vanishingly unlikely.
        assert!(ids.len() >= 49);
    }

    #[test]
    fn session_id_rejects_path_like_values() {
        assert!("../etc".parse::<SessionId>().is_err());
        assert!("a/b".parse::<SessionId>().is_err());
        assert!("..".parse::<SessionId>().is_err());
        assert!("   ".parse::<SessionId>().is_err());
        assert_eq!(
            "20261018-142233-k3x9".parse::<SessionId>().unwrap().as_str(),
            "20261018-142233-k3x9"
        );
    }

    #[test]
    fn blank_hint_is_dropped() {
        let session = Session::new("10.0.0.5", ScanMode::Fast, Some("   ".into()));
        assert_eq!(session.hint(), None);

        let session = Session::new("10.0.0.5", ScanMode::Fast, Some("web box".into()));
        assert_eq!(session.hint(), Some("web box"));
    }

    #[test]
    fn phases_record_once() {
        let mut session = Session::new("10.0.0.5", ScanMode::Fast, None);
        let first = Reachability {
            target: "10.0.0.5".into(),
            icmp_reachable: true,
            tcp_checks: BTreeMap::new(),
        };
        let second = Reachability {
            icmp_reachable: false,
            ..first.clone()
        };

        session.record_reachability(first.clone());
        session.record_reachability(second);
        assert_eq!(session.reachability(), Some(&first));

        session.record_ai(AiOutcome::NotConfigured, None, Vec::new());
        session.record_ai(AiOutcome::Parsed, Some("x".into()), Vec::new());
        assert_eq!(session.ai_outcome(), Some(AiOutcome::NotConfigured));
        assert_eq!(session.ai_raw_output(), None);
    }
}
