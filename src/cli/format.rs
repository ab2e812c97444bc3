//! Output formatting for terminal display.

use crate::execute::Skip;
use crate::model::{
    AiOutcome, CommandOutcome, DiscoveryOutcome, ExecutedCommand, Reachability, Recommendation,
    ScanMode,
};

/// How much of a command's stdout is echoed after it finishes.
pub(super) const PREVIEW_CHARS: usize = 600;

pub(super) fn format_reachability(reachability: &Reachability) -> String {
    let mut lines = vec![
        format!("Host: {}", reachability.target),
        format!("ICMP reachable: {}", reachability.icmp_reachable),
        "TCP checks:".to_string(),
    ];
    for (port, open) in &reachability.tcp_checks {
        let status = if *open { "open" } else { "closed/unreachable" };
        lines.push(format!("  - Port {port}: {status}"));
    }
    if !reachability.any_response() {
        lines.push("Nothing answered. The target may be down or filtering probes.".to_string());
    }
    lines.join("\n")
}

pub(super) fn format_discovery(discovery: &DiscoveryOutcome) -> String {
    if !discovery.succeeded {
        let reason = discovery.diagnostic.as_deref().unwrap_or("unknown error");
        return format!("Discovery scan failed: {}", reason.trim());
    }
    if discovery.summary.hosts.is_empty() {
        return "No hosts found in scan results.".to_string();
    }

    let rows: Vec<[String; 4]> = discovery
        .summary
        .hosts
        .iter()
        .map(|host| {
            let ports: Vec<String> = host
                .open_ports()
                .map(|p| {
                    format!(
                        "{}/{} ({})",
                        p.portid.map_or_else(|| "?".to_string(), |id| id.to_string()),
                        p.protocol.as_deref().unwrap_or("?"),
                        p.service_name.as_deref().unwrap_or("?")
                    )
                })
                .collect();
            [
                host.address.clone().unwrap_or_else(|| "?".into()),
                host.addr_type.clone().unwrap_or_else(|| "?".into()),
                host.os_guess.clone(),
                if ports.is_empty() {
                    "None".to_string()
                } else {
                    ports.join(", ")
                },
            ]
        })
        .collect();

    table(["Host", "Type", "OS Guess", "Open Ports"], &rows)
}

pub(super) fn format_recommendations(outcome: AiOutcome, candidates: &[Recommendation]) -> String {
    if candidates.is_empty() {
        return match outcome {
            AiOutcome::NotConfigured => "No model endpoint configured; skipping recommendations.",
            AiOutcome::NoResponse => "The model endpoint gave no usable response.",
            AiOutcome::Unparsed => "The model's output could not be parsed; it is kept in the session record.",
            AiOutcome::Parsed => "The model suggested no usable commands.",
        }
        .to_string();
    }

    let rows: Vec<[String; 5]> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            [
                (i + 1).to_string(),
                c.name.clone(),
                c.category.to_string(),
                c.priority.to_string(),
                c.command.clone(),
            ]
        })
        .collect();
    table(["#", "Name", "Category", "Priority", "Command"], &rows)
}

pub(super) fn format_modes() -> String {
    ScanMode::ALL
        .iter()
        .map(|m| format!("  {:<11} {}", m.name(), m.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The first [`PREVIEW_CHARS`] characters of `stdout`, marked when cut.
pub(super) fn format_preview(stdout: &str) -> String {
    let stdout = stdout.trim_end();
    if stdout.is_empty() {
        return "(no output)".to_string();
    }
    let mut preview: String = stdout.chars().take(PREVIEW_CHARS).collect();
    if preview.len() < stdout.len() {
        preview.push_str("\n[...]");
    }
    preview
}

pub(super) fn format_finished(record: &ExecutedCommand) -> String {
    let status = match &record.outcome {
        CommandOutcome::Exited => format!("exit code {}", record.exit_code),
        CommandOutcome::TimedOut => "timed out".to_string(),
        CommandOutcome::LaunchFailed { reason } => format!("failed to launch: {reason}"),
    };
    format!(
        "[#{}] {}: {status} (log: {})",
        record.index,
        record.name,
        record.log_file.display()
    )
}

pub(super) fn format_skip(index: usize, skip: &Skip) -> String {
    let reason = match skip {
        Skip::OutOfRange => "no such recommendation".to_string(),
        Skip::EmptyCommand => "empty command".to_string(),
        Skip::Unsplittable(e) => format!("could not parse command ({e})"),
        Skip::ToolUnavailable(tool) => format!("'{tool}' is not installed"),
        Skip::LogUnavailable(e) => format!("could not create log file ({e})"),
    };
    format!("[#{index}] skipped: {reason}")
}

/// A plain left-aligned text table.
fn table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; N]| -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let rule = widths.map(|w| "-".repeat(w));
    let mut lines = vec![line(headers), line(rule.each_ref().map(String::as_str))];
    for row in rows {
        lines.push(line(row.each_ref().map(String::as_str)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use jiff::Timestamp;

    use crate::model::{Category, DiscoverySummary, Host, NO_EXIT_CODE, Port};

    fn rec(name: &str, command: &str, priority: i64) -> Recommendation {
        Recommendation {
            name: name.into(),
            command: command.into(),
            category: Category::Web,
            priority,
            rationale: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn reachability_lists_ports() {
        let text = format_reachability(&Reachability {
            target: "10.0.0.5".into(),
            icmp_reachable: false,
            tcp_checks: BTreeMap::from([(22, true), (80, false)]),
        });
        assert!(text.contains("Host: 10.0.0.5"));
        assert!(text.contains("  - Port 22: open"));
        assert!(text.contains("  - Port 80: closed/unreachable"));
        assert!(!text.contains("Nothing answered"));
    }

    #[test]
    fn silent_target_is_called_out() {
        let text = format_reachability(&Reachability {
            target: "10.0.0.5".into(),
            icmp_reachable: false,
            tcp_checks: BTreeMap::from([(22, false)]),
        });
        assert!(text.contains("Nothing answered"));
    }

    #[test]
    fn discovery_table_lists_open_ports() {
        let text = format_discovery(&DiscoveryOutcome {
            succeeded: true,
            diagnostic: None,
            xml_path: None,
            summary: DiscoverySummary {
                hosts: vec![Host {
                    address: Some("10.0.0.5".into()),
                    addr_type: Some("ipv4".into()),
                    os_guess: "Linux".into(),
                    ports: vec![
                        Port {
                            portid: Some(22),
                            protocol: Some("tcp".into()),
                            state: Some("open".into()),
                            service_name: Some("ssh".into()),
                            ..Port::default()
                        },
                        Port {
                            portid: Some(23),
                            protocol: Some("tcp".into()),
                            state: Some("closed".into()),
                            ..Port::default()
                        },
                    ],
                }],
            },
        });

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Host"));
        assert!(lines[1].starts_with("----"));
        assert!(lines[2].contains("22/tcp (ssh)"));
        assert!(!lines[2].contains("23/tcp"));
    }

    #[test]
    fn failed_discovery_shows_diagnostic() {
        let text = format_discovery(&DiscoveryOutcome::failed("nmap not found\n"));
        assert_eq!(text, "Discovery scan failed: nmap not found");
    }

    #[test]
    fn recommendation_table_is_numbered_from_one() {
        let text = format_recommendations(
            AiOutcome::Parsed,
            &[rec("Headers", "curl -I http://h", 1), rec("Dirs", "gobuster dir -u http://h", 2)],
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("1  Headers"));
        assert!(lines[3].starts_with("2  Dirs"));
        assert!(lines[3].ends_with("gobuster dir -u http://h"));
    }

    #[test]
    fn empty_recommendations_explain_why() {
        assert!(format_recommendations(AiOutcome::NotConfigured, &[]).contains("No model endpoint"));
        assert!(format_recommendations(AiOutcome::Unparsed, &[]).contains("could not be parsed"));
    }

    #[test]
    fn preview_truncates_long_output() {
        let long = "x".repeat(PREVIEW_CHARS + 10);
        let preview = format_preview(&long);
        assert!(preview.starts_with(&"x".repeat(PREVIEW_CHARS)));
        assert!(preview.ends_with("[...]"));

        assert_eq!(format_preview("short\n"), "short");
        assert_eq!(format_preview("  \n"), "(no output)");
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let text = "é".repeat(PREVIEW_CHARS);
        assert_eq!(format_preview(&text), text);
    }

    #[test]
    fn finished_shows_outcome() {
        let at = Timestamp::new(1_760_000_000, 0).unwrap();
        let record = ExecutedCommand::from_candidate(
            3,
            &rec("Slow", "sleep 999", 1),
            at,
            at,
            CommandOutcome::TimedOut,
            NO_EXIT_CODE,
            PathBuf::from("/s/logs/cmd_03.log"),
        );
        assert_eq!(
            format_finished(&record),
            "[#3] Slow: timed out (log: /s/logs/cmd_03.log)"
        );
    }

    #[test]
    fn skip_reasons() {
        assert_eq!(
            format_skip(2, &Skip::ToolUnavailable("nikto".into())),
            "[#2] skipped: 'nikto' is not installed"
        );
    }

    #[test]
    fn modes_list_every_mode() {
        let text = format_modes();
        for mode in ScanMode::ALL {
            assert!(text.contains(mode.name()));
        }
    }
}
