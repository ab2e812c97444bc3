//! Tool-availability policies.
//!
//! The executable name comes from model output, so it is checked against
//! Debian package-name rules before it reaches the package manager.

use std::process::Command;

use tracing::{info, warn};

use super::ToolPolicy;

/// Never installs anything: a missing tool means its command is skipped.
#[derive(Debug, Default)]
pub struct NeverInstall;

impl ToolPolicy for NeverInstall {
    fn ensure_available(&mut self, tool: &str) -> bool {
        info!(tool, "tool not installed; installation disabled");
        false
    }
}

/// Offers to install missing tools with `sudo apt-get`.
///
/// `confirm` is asked once per missing tool and must return `true` before
/// anything is installed.
pub struct PackageInstaller<C> {
    confirm: C,
}

impl<C: FnMut(&str) -> bool> PackageInstaller<C> {
    pub fn new(confirm: C) -> Self {
        Self { confirm }
    }
}

impl<C: FnMut(&str) -> bool> ToolPolicy for PackageInstaller<C> {
    fn ensure_available(&mut self, tool: &str) -> bool {
        if !is_package_name(tool) {
            warn!(tool, "refusing to install: not a valid package name");
            return false;
        }
        let question = format!("Tool '{tool}' is not installed. Install it via apt-get? (requires sudo)");
        if !(self.confirm)(&question) {
            info!(tool, "installation declined");
            return false;
        }

        for args in [&["apt-get", "update"][..], &["apt-get", "install", "-y", tool][..]] {
            match Command::new("sudo").args(args).status() {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    warn!(tool, %status, "sudo {} failed", args.join(" "));
                    return false;
                }
                Err(e) => {
                    warn!(tool, "failed to run sudo: {e}");
                    return false;
                }
            }
        }

        which::which(tool).is_ok()
    }
}

/// Debian package names: lowercase alphanumerics plus `+ - .`, starting
/// with an alphanumeric, at least two characters.
fn is_package_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() >= 2
        && (first.is_ascii_lowercase() || first.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+-.".contains(c))
}
