//! Prompt construction for the model phase.

use serde::Serialize;

use crate::model::{DiscoverySummary, Reachability, ScanMode};

/// What the model is told about the target.
#[derive(Debug, Serialize)]
pub struct PromptContext<'a> {
    pub target: &'a str,
    pub mode: ScanMode,
    pub hint: Option<&'a str>,
    pub reachability: Option<&'a Reachability>,
    pub discovery_summary: &'a DiscoverySummary,
}

const INSTRUCTIONS: &str = "\
You are a senior security engineer mentoring someone through AUTHORIZED \
reconnaissance of a lab or CTF target they have permission to test.

Rules:
- Suggest enumeration and information-gathering commands only.
- No exploit payloads, exploit modules, or exploitation steps.
- No password guessing or brute force of any kind.
- No commands that modify, delete, or damage data on the target.
- Prefer read-only, discovery-focused tools (nmap scripts, nikto, gobuster, \
enum4linux, smbclient, curl, dig, netcat, ...).
- Hints about where to look next are fine; full attack chains are not.";

const OUTPUT_FORMAT: &str = r#"Respond with a single YAML document and nothing else (no prose, no code fences):

hosts:
  - host: "<ip or hostname>"
    os_guess: "<OS guess or Unknown>"
    key_services:
      - "<port/service worth a look>"
recommendations:
  - name: "<short name for the step>"
    command: "<one shell command>"
    category: "<web|ssh|smb|rdp|database|ldap|ftp|smtp|dns|generic>"
    priority: 1   # 1 is most important; larger numbers run later
    rationale: "<one or two plain sentences>"
    notes: "<optional short hint>""#;

/// Render the full prompt for a target.
pub fn build_prompt(context: &PromptContext<'_>) -> Result<String, serde_json::Error> {
    let context_json = serde_json::to_string_pretty(context)?;
    Ok(format!(
        "{INSTRUCTIONS}\n\nContext (JSON):\n{context_json}\n\n{OUTPUT_FORMAT}\n"
    ))
}
