//! CLI interface for Lookout.
//!
//! Two commands:
//!
//! - `lookout run` walks a target through every phase, asking the operator
//!   for anything not given as a flag.
//! - `lookout report` regenerates a stored session's report, or lists the
//!   stored sessions when no id is given.

mod console;
mod format;
mod prompt;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{AutoInstall, Config};
use crate::discover::Nmap;
use crate::execute::{NeverInstall, PackageInstaller, ToolPolicy};
use crate::llm::{Generate, ModelClient};
use crate::model::{ScanMode, SessionId};
use crate::pipeline::{self, Collaborators, Pipeline, Request};
use crate::probe::NetworkProbe;
use crate::storage::Storage;

use console::Console;
use format::format_modes;

/// Lookout: guided, authorized reconnaissance.
#[derive(Debug, Parser)]
#[command(name = "lookout", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: ~/.lookout/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow:
  1. lookout run --target 10.0.0.5 --mode fast
     → probes, scans, asks the model, then offers the recommended commands
  2. lookout report
     → lists stored sessions
  3. lookout report --session-id 20261018-142233-k3x9
     → rewrites and prints that session's report

Only run this against systems you are authorized to test.";

const DISCLAIMER: &str = "\
This tool is for AUTHORIZED security testing and CTF/lab use only.
Scanning or enumerating systems without permission may be illegal.";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a full session: reachability, discovery, recommendations, execution.
    ///
    /// Anything not given as a flag is asked for interactively.
    Run {
        /// Target IP address or hostname.
        #[arg(long)]
        target: Option<String>,

        /// Discovery scan intensity.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Free-text context for the model (e.g. a CTF hint).
        #[arg(long)]
        hint: Option<String>,

        /// Which recommendations to run (e.g. `1,3` or `all`), instead of asking.
        #[arg(long)]
        select: Option<String>,

        /// Confirm authorization without being asked.
        #[arg(long)]
        yes: bool,

        /// Never offer to install missing tools.
        #[arg(long)]
        no_install: bool,
    },

    /// Regenerate a session's report, or list sessions when no id is given.
    Report {
        #[arg(long)]
        session_id: Option<String>,
    },
}

/// CLI-facing scan mode, mapped to the domain `ScanMode`.
#[derive(Debug, Clone, ValueEnum)]
pub enum ModeArg {
    /// Top 100 ports, minimal scripts.
    Fast,
    /// Top 1000 ports, version detection, default scripts.
    Balanced,
    /// Full TCP scan with more scripts (lab use).
    Aggressive,
    /// Reduced ports and conservative timing.
    LowNoise,
}

impl ModeArg {
    fn to_domain(&self) -> ScanMode {
        match self {
            Self::Fast => ScanMode::Fast,
            Self::Balanced => ScanMode::Balanced,
            Self::Aggressive => ScanMode::Aggressive,
            Self::LowNoise => ScanMode::LowNoise,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config) -> Result<(), String> {
    match cli.command {
        Command::Run {
            target,
            mode,
            hint,
            select,
            yes,
            no_install,
        } => {
            let options = RunOptions {
                target,
                mode: mode.as_ref().map(ModeArg::to_domain),
                hint,
                select,
                yes,
                no_install,
            };
            cmd_run(config, options)
        }
        Command::Report { session_id } => cmd_report(config, session_id.as_deref()),
    }
}

struct RunOptions {
    target: Option<String>,
    mode: Option<ScanMode>,
    hint: Option<String>,
    select: Option<String>,
    yes: bool,
    no_install: bool,
}

fn cmd_run(config: &Config, options: RunOptions) -> Result<(), String> {
    println!("{DISCLAIMER}\n");
    if !options.yes && !prompt::confirm("Do you have explicit authorization to test this target?", false) {
        return Err("authorization not confirmed; aborting".to_string());
    }

    let request = match options.target {
        // Everything given up front: don't ask for the optional bits.
        Some(target) => Request {
            target: validate_target(&target)?,
            mode: options.mode.unwrap_or_default(),
            hint: options.hint,
        },
        None => ask_request(options.mode, options.hint)?,
    };

    let storage = Storage::new(sessions_dir(config)?)
        .map_err(|e| format!("failed to initialize storage: {e}"))?;
    let reports_dir = reports_dir(config)?;

    let client = ModelClient::from_config(&config.ai)
        .map_err(|e| format!("failed to set up model client: {e}"))?;
    if let Some(client) = &client {
        println!("Model endpoint: {}", client.url());
    }
    let probe = NetworkProbe::from_config(&config.probe);
    let pipeline = Pipeline::new(
        &storage,
        reports_dir,
        Duration::from_secs(config.execution.command_timeout_seconds),
        Collaborators {
            probe: &probe,
            scanner: &Nmap,
            model: client.as_ref().map(|c| c as &dyn Generate),
        },
    );

    let mut policy: Box<dyn ToolPolicy> =
        if options.no_install || config.execution.auto_install == AutoInstall::Never {
            Box::new(NeverInstall)
        } else {
            Box::new(PackageInstaller::new(|question: &str| {
                prompt::confirm(question, false)
            }))
        };
    let mut console = Console::new(options.select);

    let completed = pipeline
        .run(request, policy.as_mut(), &mut console)
        .map_err(|e| format!("session failed: {e}"))?;

    let id = completed.session.session_id();
    println!("\nSession {id} saved to {}", storage.session_dir(id).display());
    println!("Report: {}", completed.report_path.display());
    Ok(())
}

/// Ask for whatever the flags left out.
fn ask_request(mode: Option<ScanMode>, hint: Option<String>) -> Result<Request, String> {
    let target = loop {
        let answer = prompt::ask("Target IP/hostname")?.ok_or("no target given")?;
        match validate_target(&answer) {
            Ok(target) => break target,
            Err(e) => eprintln!("{e}"),
        }
    };

    let mode = match mode {
        Some(mode) => mode,
        None => {
            println!("Scan modes:\n{}", format_modes());
            loop {
                let answer = prompt::ask(&format!("Mode [{}]", ScanMode::default()))?
                    .unwrap_or_default();
                if answer.is_empty() {
                    break ScanMode::default();
                }
                match answer.parse::<ScanMode>() {
                    Ok(mode) => break mode,
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    };

    let hint = match hint {
        Some(hint) => Some(hint),
        None => prompt::ask("Hint or context (optional)")?,
    };

    Ok(Request { target, mode, hint })
}

/// A target is one word that can't be mistaken for an option.
fn validate_target(raw: &str) -> Result<String, String> {
    let target = raw.trim();
    if target.is_empty() {
        return Err("target cannot be empty".to_string());
    }
    if target.starts_with('-') || target.chars().any(char::is_whitespace) {
        return Err(format!("invalid target '{target}'"));
    }
    Ok(target.to_string())
}

fn cmd_report(config: &Config, session_id: Option<&str>) -> Result<(), String> {
    let storage = Storage::open(sessions_dir(config)?);

    let Some(session_id) = session_id else {
        return cmd_list(&storage);
    };
    let id: SessionId = session_id.parse()?;
    let (_, path) = pipeline::regenerate_report(&storage, &reports_dir(config)?, &id)
        .map_err(|e| format!("failed to regenerate report: {e}"))?;

    let report =
        fs::read_to_string(&path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    println!("{report}");
    eprintln!("Report written to {}", path.display());
    Ok(())
}

fn cmd_list(storage: &Storage) -> Result<(), String> {
    if !storage.root().is_dir() {
        return Err(format!(
            "no sessions directory at {}",
            storage.root().display()
        ));
    }
    let ids = storage
        .list_sessions()
        .map_err(|e| format!("failed to list sessions: {e}"))?;

    if ids.is_empty() {
        println!("No sessions");
        return Ok(());
    }
    println!("Sessions:");
    for id in &ids {
        println!("  {id}");
    }
    println!("\nRegenerate one with: lookout report --session-id <id>");
    Ok(())
}

fn sessions_dir(config: &Config) -> Result<PathBuf, String> {
    config
        .general
        .sessions_dir()
        .ok_or_else(|| "could not determine home directory".to_string())
}

fn reports_dir(config: &Config) -> Result<PathBuf, String> {
    config
        .general
        .reports_dir()
        .ok_or_else(|| "could not determine home directory".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "lookout", "-vv", "run", "--target", "10.0.0.5", "--mode", "low-noise", "--select",
            "1,2", "--yes",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Run {
            target, mode, select, yes, no_install, ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(target.as_deref(), Some("10.0.0.5"));
        assert_eq!(mode.map(|m| m.to_domain()), Some(ScanMode::LowNoise));
        assert_eq!(select.as_deref(), Some("1,2"));
        assert!(yes);
        assert!(!no_install);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["lookout", "run", "--mode", "stealthy"]).is_err());
    }

    #[test]
    fn parses_report_with_global_config() {
        let cli = Cli::try_parse_from([
            "lookout", "report", "--session-id", "20261018-142233-k3x9", "--config", "/tmp/c.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(
            cli.command,
            Command::Report { session_id: Some(ref id) } if id == "20261018-142233-k3x9"
        ));
    }

    #[test]
    fn target_validation() {
        assert_eq!(validate_target(" 10.0.0.5 ").unwrap(), "10.0.0.5");
        assert_eq!(validate_target("box.lab").unwrap(), "box.lab");
        assert!(validate_target("").is_err());
        assert!(validate_target("-iL /etc/passwd").is_err());
        assert!(validate_target("10.0.0.5 10.0.0.6").is_err());
    }

    #[test]
    fn listing_without_sessions_dir_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("missing"));

        assert!(cmd_list(&storage).unwrap_err().contains("no sessions directory"));
    }
}
