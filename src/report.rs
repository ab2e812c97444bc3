//! Markdown report rendering.
//!
//! The report is derived from the session record alone, so it can be
//! regenerated at any time from `session.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::{AiOutcome, CommandOutcome, ExecutedCommand, Host, Recommendation, Session};

const NEXT_STEPS: &str = "Use this report to reflect on your enumeration process. \
Consider which services look most interesting or unusual. Without exploiting \
anything, think about what information can be gathered next, what typical \
misconfigurations might exist, and how you would safely validate them within \
the rules of your CTF or authorized engagement.";

/// Render the report for a session.
pub fn render(session: &Session) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# Lookout Report: Session {}", session.session_id()));
    lines.push(String::new());
    lines.push("## Legal / Ethical Notice".into());
    lines.push(
        "This report was generated for an **authorized** testing or CTF lab scenario only.".into(),
    );
    lines.push("Do not use this data for any form of unauthorized activity.".into());
    lines.push(String::new());

    target_section(session, &mut lines);
    reachability_section(session, &mut lines);
    discovery_section(session, &mut lines);
    recommendations_section(session, &mut lines);
    executed_section(session.executed_commands(), &mut lines);

    lines.push("## High-Level Next Steps (Educational)".into());
    lines.push(NEXT_STEPS.into());
    lines.push(String::new());

    lines.join("\n")
}

/// Render and write `<reports_dir>/<session-id>.md`, creating the directory.
pub fn write_report(session: &Session, reports_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(reports_dir)?;
    let path = reports_dir.join(format!("{}.md", session.session_id()));
    fs::write(&path, render(session))?;
    Ok(path)
}

fn target_section(session: &Session, lines: &mut Vec<String>) {
    lines.push("## Target & Context".into());
    lines.push(format!("- Target: `{}`", session.target()));
    lines.push(format!("- Mode: `{}`", session.mode()));
    if let Some(hint) = session.hint() {
        lines.push(format!("- Hint/Context: `{hint}`"));
    }
    lines.push(format!("- Started: `{}`", session.created_at()));
    lines.push(String::new());
}

fn reachability_section(session: &Session, lines: &mut Vec<String>) {
    lines.push("## Reachability Summary".into());
    match session.reachability() {
        None => lines.push("Reachability was not checked.".into()),
        Some(r) => {
            lines.push(format!("- ICMP reachable: `{}`", r.icmp_reachable));
            lines.push("- TCP checks:".into());
            if r.tcp_checks.is_empty() {
                lines.push("  - None".into());
            }
            for (port, open) in &r.tcp_checks {
                let status = if *open { "open/reachable" } else { "closed/unreachable" };
                lines.push(format!("  - {port}: {status}"));
            }
        }
    }
    lines.push(String::new());
}

fn discovery_section(session: &Session, lines: &mut Vec<String>) {
    lines.push("## Discovery Summary".into());
    let Some(discovery) = session.discovery() else {
        lines.push("Discovery was not run.".into());
        lines.push(String::new());
        return;
    };

    if !discovery.succeeded {
        let reason = discovery.diagnostic.as_deref().unwrap_or("unknown error");
        lines.push(format!("Discovery scan failed: {}", reason.trim()));
        lines.push(String::new());
        return;
    }
    if discovery.summary.hosts.is_empty() {
        lines.push("No hosts or open ports discovered.".into());
        lines.push(String::new());
        return;
    }
    for host in &discovery.summary.hosts {
        host_section(host, lines);
    }
}

fn host_section(host: &Host, lines: &mut Vec<String>) {
    lines.push(format!(
        "### Host {} ({})",
        host.address.as_deref().unwrap_or("?"),
        host.addr_type.as_deref().unwrap_or("?")
    ));
    lines.push(format!("- OS Guess: {}", host.os_guess));
    lines.push("- Open Ports:".into());

    let mut any_open = false;
    for port in host.open_ports() {
        any_open = true;
        let portid = port.portid.map_or_else(|| "?".to_string(), |p| p.to_string());
        let service: Vec<&str> = [&port.service_name, &port.product, &port.version]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .filter(|field| !field.is_empty())
            .collect();
        lines.push(format!(
            "  - {portid}/{} ({})",
            port.protocol.as_deref().unwrap_or("?"),
            service.join(" ")
        ));
    }
    if !any_open {
        lines.push("  - None".into());
    }
    lines.push(String::new());
}

fn recommendations_section(session: &Session, lines: &mut Vec<String>) {
    lines.push("## AI-Recommended Enumeration Steps".into());
    let recommendations = session.ai_recommendations();
    if recommendations.is_empty() {
        lines.push(no_recommendations_note(session.ai_outcome()).into());
        lines.push(String::new());
        if let (Some(AiOutcome::Unparsed), Some(raw)) =
            (session.ai_outcome(), session.ai_raw_output())
        {
            lines.push("Raw model output:".into());
            lines.push(String::new());
            lines.push("```text".into());
            lines.push(raw.trim_end().to_string());
            lines.push("```".into());
            lines.push(String::new());
        }
        return;
    }
    for (i, rec) in recommendations.iter().enumerate() {
        recommendation_section(i + 1, rec, lines);
    }
}

/// Why the recommendation list is empty.
fn no_recommendations_note(outcome: Option<AiOutcome>) -> &'static str {
    match outcome {
        None | Some(AiOutcome::NotConfigured) => {
            "No AI recommendations were recorded: no model endpoint is configured."
        }
        Some(AiOutcome::NoResponse) => {
            "No AI recommendations were recorded: the model endpoint did not return a usable response."
        }
        Some(AiOutcome::Unparsed) => {
            "No AI recommendations were recorded: the model's output could not be parsed."
        }
        Some(AiOutcome::Parsed) => {
            "No AI recommendations were recorded: the model suggested no usable commands."
        }
    }
}

fn recommendation_section(index: usize, rec: &Recommendation, lines: &mut Vec<String>) {
    lines.push(format!("### Step {index}: {}", rec.name));
    lines.push(format!("- Category: `{}`", rec.category));
    lines.push(format!("- Priority: `{}`", rec.priority));
    lines.push(format!("- Command: `{}`", rec.command));
    if !rec.rationale.is_empty() {
        lines.push(format!("- Rationale: {}", rec.rationale));
    }
    if !rec.notes.is_empty() {
        lines.push(format!("- Notes: {}", rec.notes));
    }
    lines.push(String::new());
}

fn executed_section(executed: &[ExecutedCommand], lines: &mut Vec<String>) {
    lines.push("## Commands Executed".into());
    if executed.is_empty() {
        lines.push("No enumeration commands were executed in this session.".into());
        lines.push(String::new());
        return;
    }
    for cmd in executed {
        lines.push(format!("### #{}: {}", cmd.index, cmd.name));
        lines.push(format!("- Category: `{}`", cmd.category));
        lines.push(format!("- Priority: `{}`", cmd.priority));
        lines.push(format!("- Command: `{}`", cmd.command));
        lines.push(format!("- Started at: `{}`", cmd.started_at));
        lines.push(format!("- Ended at: `{}`", cmd.ended_at));
        lines.push(format!("- Exit code: `{}`", exit_status(cmd)));
        lines.push(format!("- Log file: `{}`", cmd.log_file.display()));
        lines.push(String::new());
    }
}

fn exit_status(cmd: &ExecutedCommand) -> String {
    match &cmd.outcome {
        CommandOutcome::Exited => cmd.exit_code.to_string(),
        CommandOutcome::TimedOut => format!("{} (timed out)", cmd.exit_code),
        CommandOutcome::LaunchFailed { reason } => {
            format!("{} (failed to launch: {reason})", cmd.exit_code)
        }
    }
}
