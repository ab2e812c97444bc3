//! Scan modes: named bundles of discovery-scan intensity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How hard the discovery scan leans on the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Top 100 ports, version detection only.
    Fast,

    /// Top 1000 ports, version detection and default scripts.
    #[default]
    Balanced,

    /// Every TCP port, OS detection and more scripts. Lab targets only.
    Aggressive,

    /// Fewer ports and conservative timing.
    LowNoise,
}

impl ScanMode {
    pub const ALL: [Self; 4] = [Self::Fast, Self::Balanced, Self::Aggressive, Self::LowNoise];

    /// The name used on the command line and in session records.
    pub fn name(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::LowNoise => "low-noise",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Fast => "Top 100 ports, minimal scripts.",
            Self::Balanced => "Top 1000 ports, version detection, default scripts.",
            Self::Aggressive => "Full TCP scan with version detection and more scripts (lab use).",
            Self::LowNoise => "Reduced ports and conservative timing.",
        }
    }

    /// Scanner arguments for this mode.
    ///
    /// The XML output flag and target are appended by the caller.
    pub fn scan_args(self) -> &'static [&'static str] {
        match self {
            Self::Fast => &["-T4", "--top-ports", "100", "-sV"],
            Self::Balanced => &["-T3", "--top-ports", "1000", "-sV", "-sC"],
            Self::Aggressive => &["-T4", "-p-", "-sV", "-sC", "-A"],
            Self::LowNoise => &["-T2", "--top-ports", "200", "-sV"],
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.name()).collect();
                format!("unknown scan mode '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("fast".parse::<ScanMode>().unwrap(), ScanMode::Fast);
        assert_eq!(" Low-Noise ".parse::<ScanMode>().unwrap(), ScanMode::LowNoise);
        assert_eq!("AGGRESSIVE".parse::<ScanMode>().unwrap(), ScanMode::Aggressive);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "stealthy".parse::<ScanMode>().unwrap_err();
        assert!(err.contains("stealthy"));
        assert!(err.contains("low-noise"));
    }

    #[test]
    fn serializes_as_kebab_case_name() {
        let json = serde_json::to_string(&ScanMode::LowNoise).unwrap();
        assert_eq!(json, "\"low-noise\"");
        for mode in ScanMode::ALL {
            assert_eq!(serde_json::to_string(&mode).unwrap(), format!("\"{mode}\""));
        }
    }

    #[test]
    fn every_mode_requests_version_detection() {
        for mode in ScanMode::ALL {
            assert!(mode.scan_args().contains(&"-sV"), "{mode} lacks -sV");
        }
    }
}
