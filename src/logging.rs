//! Diagnostic logging to stderr.
//!
//! Operator-facing output (phase headers, tables, previews) is printed by
//! the CLI, not logged. `RUST_LOG` overrides the verbosity flag when set.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// The default filter for a `-v` count.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace,hyper=debug,reqwest=debug",
    }
}

pub fn init_logging(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2) // Show target module for -vv and above
        .with_line_number(verbose >= 3)
        .init();

    debug!("lookout started with verbosity level: {verbose}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(log_level(0), "warn");
        assert_eq!(log_level(1), "info");
        assert_eq!(log_level(2), "debug");
        assert!(log_level(3).starts_with("trace"));
        assert!(log_level(9).starts_with("trace"));
    }
}
