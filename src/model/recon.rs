//! Recon facts: what the probe and the discovery scan found.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Liveness facts about a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reachability {
    pub target: String,
    pub icmp_reachable: bool,

    /// Probed TCP port → whether a connection was accepted.
    pub tcp_checks: BTreeMap<u16, bool>,
}

impl Reachability {
    /// Whether anything at all answered.
    pub fn any_response(&self) -> bool {
        self.icmp_reachable || self.tcp_checks.values().any(|open| *open)
    }
}

/// Normalized host/port records decoded from a discovery scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySummary {
    pub hosts: Vec<Host>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub address: Option<String>,
    pub addr_type: Option<String>,
    pub os_guess: String,
    pub ports: Vec<Port>,
}

impl Host {
    pub fn open_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_open())
    }
}

/// One scanned port. Every attribute is optional in the scanner's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub portid: Option<u16>,
    pub protocol: Option<String>,
    pub state: Option<String>,
    pub reason: Option<String>,
    pub service_name: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    pub extrainfo: Option<String>,
}

impl Port {
    pub fn is_open(&self) -> bool {
        self.state.as_deref() == Some("open")
    }
}

/// The result of the discovery phase.
///
/// A failed scan still yields an outcome (with an empty summary) so that
/// downstream phases always have something to work with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    pub succeeded: bool,

    /// Scanner stderr, a launch error, or an XML decoding error.
    pub diagnostic: Option<String>,

    /// Where the raw XML artifact was written, when it exists.
    pub xml_path: Option<PathBuf>,

    pub summary: DiscoverySummary,
}

impl DiscoveryOutcome {
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            diagnostic: Some(diagnostic.into()),
            xml_path: None,
            summary: DiscoverySummary::default(),
        }
    }
}
