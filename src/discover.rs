//! Service discovery: run the scanner, then normalize its XML.
//!
//! The scan runs without a time limit; the scan mode is what bounds it.

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::model::{DiscoveryOutcome, DiscoverySummary, Host, Port, ScanMode};

/// OS guess recorded when the scanner offers none.
pub const UNKNOWN_OS: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to read scan output: {0}")]
    Io(#[from] io::Error),

    #[error("failed to decode scan XML: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// How a scan run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRun {
    pub succeeded: bool,
    pub diagnostic: Option<String>,
}

/// Runs a discovery scan that writes XML to a given path.
pub trait Scanner {
    fn scan(&self, target: &str, mode: ScanMode, xml_path: &Path) -> ScanRun;
}

/// The `nmap` binary on `PATH`.
#[derive(Debug, Default)]
pub struct Nmap;

impl Nmap {
    /// The full argument list for a scan.
    pub fn args(target: &str, mode: ScanMode, xml_path: &Path) -> Vec<String> {
        let mut args: Vec<String> = mode.scan_args().iter().map(ToString::to_string).collect();
        args.push("-oX".to_string());
        args.push(xml_path.display().to_string());
        args.push(target.to_string());
        args
    }
}

impl Scanner for Nmap {
    fn scan(&self, target: &str, mode: ScanMode, xml_path: &Path) -> ScanRun {
        if let Some(parent) = xml_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return ScanRun {
                    succeeded: false,
                    diagnostic: Some(format!("failed to create {}: {e}", parent.display())),
                };
            }
        }

        let args = Self::args(target, mode, xml_path);
        info!(%mode, "running nmap {}", args.join(" "));
        match Command::new("nmap").args(&args).output() {
            Ok(output) if output.status.success() => {
                debug!(bytes = output.stdout.len(), "nmap finished");
                ScanRun {
                    succeeded: true,
                    diagnostic: None,
                }
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                warn!(status = %output.status, "nmap failed");
                ScanRun {
                    succeeded: false,
                    diagnostic: Some(if stderr.is_empty() {
                        format!("nmap exited with {}", output.status)
                    } else {
                        stderr
                    }),
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => ScanRun {
                succeeded: false,
                diagnostic: Some("nmap not found; install it and make sure it is on PATH".into()),
            },
            Err(e) => ScanRun {
                succeeded: false,
                diagnostic: Some(format!("failed to run nmap: {e}")),
            },
        }
    }
}

/// Run the discovery phase.
///
/// Never fails: a failed scan or unreadable XML yields an unsuccessful
/// outcome with an empty summary.
pub fn discover(
    scanner: &dyn Scanner,
    target: &str,
    mode: ScanMode,
    xml_path: &Path,
) -> DiscoveryOutcome {
    let run = scanner.scan(target, mode, xml_path);
    if !run.succeeded {
        return DiscoveryOutcome {
            xml_path: xml_path.exists().then(|| xml_path.to_path_buf()),
            ..DiscoveryOutcome::failed(run.diagnostic.unwrap_or_else(|| "scan failed".into()))
        };
    }

    match summarize_file(xml_path) {
        Ok(summary) => DiscoveryOutcome {
            succeeded: true,
            diagnostic: run.diagnostic,
            xml_path: Some(xml_path.to_path_buf()),
            summary,
        },
        Err(e) => {
            warn!(path = %xml_path.display(), "{e}");
            DiscoveryOutcome {
                xml_path: xml_path.exists().then(|| xml_path.to_path_buf()),
                ..DiscoveryOutcome::failed(e.to_string())
            }
        }
    }
}

pub fn summarize_file(xml_path: &Path) -> Result<DiscoverySummary, DiscoveryError> {
    let xml = fs::read_to_string(xml_path)?;
    summarize_xml(&xml)
}

/// Normalize scanner XML into a summary.
///
/// Hosts whose status is anything but `up` are skipped. The first address
/// and the first OS match are used.
pub fn summarize_xml(xml: &str) -> Result<DiscoverySummary, DiscoveryError> {
    let run: xml::NmapRun = quick_xml::de::from_str(xml)?;
    let hosts = run
        .hosts
        .into_iter()
        .filter(|h| h.status.as_ref().is_none_or(|s| s.state.as_deref() == Some("up")))
        .map(xml::XmlHost::into_host)
        .collect();
    Ok(DiscoverySummary { hosts })
}

/// The subset of the nmap XML schema that the summary needs.
mod xml {
    use super::{Deserialize, Host, Port, UNKNOWN_OS};

    #[derive(Deserialize)]
    pub struct NmapRun {
        #[serde(default, rename = "host")]
        pub hosts: Vec<XmlHost>,
    }

    #[derive(Deserialize)]
    pub struct XmlHost {
        pub status: Option<Status>,
        #[serde(default, rename = "address")]
        addresses: Vec<Address>,
        ports: Option<Ports>,
        os: Option<Os>,
    }

    #[derive(Deserialize)]
    pub struct Status {
        #[serde(rename = "@state")]
        pub state: Option<String>,
    }

    #[derive(Deserialize)]
    struct Address {
        #[serde(rename = "@addr")]
        addr: Option<String>,
        #[serde(rename = "@addrtype")]
        addrtype: Option<String>,
    }

    #[derive(Deserialize)]
    struct Ports {
        #[serde(default, rename = "port")]
        ports: Vec<XmlPort>,
    }

    #[derive(Deserialize)]
    struct XmlPort {
        #[serde(rename = "@protocol")]
        protocol: Option<String>,
        #[serde(rename = "@portid")]
        portid: Option<String>,
        state: Option<PortState>,
        service: Option<Service>,
    }

    #[derive(Deserialize)]
    struct PortState {
        #[serde(rename = "@state")]
        state: Option<String>,
        #[serde(rename = "@reason")]
        reason: Option<String>,
    }

    #[derive(Deserialize)]
    struct Service {
        #[serde(rename = "@name")]
        name: Option<String>,
        #[serde(rename = "@product")]
        product: Option<String>,
        #[serde(rename = "@version")]
        version: Option<String>,
        #[serde(rename = "@extrainfo")]
        extrainfo: Option<String>,
    }

    #[derive(Deserialize)]
    struct Os {
        #[serde(default, rename = "osmatch")]
        matches: Vec<OsMatch>,
    }

    #[derive(Deserialize)]
    struct OsMatch {
        #[serde(rename = "@name")]
        name: Option<String>,
    }

    impl XmlHost {
        pub fn into_host(self) -> Host {
            let (address, addr_type) = self
                .addresses
                .into_iter()
                .next()
                .map(|a| (a.addr, a.addrtype))
                .unwrap_or_default();
            let os_guess = self
                .os
                .and_then(|os| os.matches.into_iter().next())
                .and_then(|m| m.name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_OS.to_string());
            let ports = self
                .ports
                .map(|p| p.ports.into_iter().map(XmlPort::into_port).collect())
                .unwrap_or_default();

            Host {
                address,
                addr_type,
                os_guess,
                ports,
            }
        }
    }

    impl XmlPort {
        fn into_port(self) -> Port {
            let (state, reason) = self
                .state
                .map(|s| (s.state, s.reason))
                .unwrap_or_default();
            let (service_name, product, version, extrainfo) = self
                .service
                .map(|s| (s.name, s.product, s.version, s.extrainfo))
                .unwrap_or_default();

            Port {
                portid: self.portid.and_then(|p| p.trim().parse().ok()),
                protocol: self.protocol,
                state,
                reason,
                service_name,
                product,
                version,
                extrainfo,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use tempfile::TempDir;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -T4 --top-ports 100 -sV -oX nmap.xml 10.0.0.5" version="7.94">
  <scaninfo type="syn" protocol="tcp" numservices="100" services="7,9,13"/>
  <verbose level="0"/>
  <debugging level="0"/>
  <host starttime="1760790000" endtime="1760790042">
    <status state="up" reason="echo-reply" reason_ttl="63"/>
    <address addr="10.0.0.5" addrtype="ipv4"/>
    <address addr="08:00:27:AA:BB:CC" addrtype="mac" vendor="Oracle VirtualBox"/>
    <hostnames><hostname name="box.lab" type="PTR"/></hostnames>
    <ports>
      <extraports state="closed" count="98"><extrareasons reason="reset" count="98"/></extraports>
      <port protocol="tcp" portid="22">
        <state state="open" reason="syn-ack" reason_ttl="63"/>
        <service name="ssh" product="OpenSSH" version="8.2p1 Ubuntu 4ubuntu0.5" extrainfo="Ubuntu Linux; protocol 2.0" method="probed" conf="10">
          <cpe>cpe:/a:openbsd:openssh:8.2p1</cpe>
        </service>
      </port>
      <port protocol="tcp" portid="80">
        <state state="filtered" reason="no-response" reason_ttl="0"/>
        <service name="http" method="table" conf="3"/>
      </port>
    </ports>
    <os>
      <portused state="open" proto="tcp" portid="22"/>
      <osmatch name="Linux 5.0 - 5.4" accuracy="98" line="12345"/>
      <osmatch name="Linux 4.15" accuracy="90" line="12346"/>
    </os>
  </host>
  <host>
    <status state="down" reason="no-response" reason_ttl="0"/>
    <address addr="10.0.0.6" addrtype="ipv4"/>
  </host>
  <runstats><finished time="1760790042" elapsed="42.00"/><hosts up="1" down="1" total="2"/></runstats>
</nmaprun>
"#;

    #[test]
    fn summarizes_up_hosts_only() {
        let summary = summarize_xml(SAMPLE).unwrap();
        assert_eq!(summary.hosts.len(), 1);

        let host = &summary.hosts[0];
        assert_eq!(host.address.as_deref(), Some("10.0.0.5"));
        assert_eq!(host.addr_type.as_deref(), Some("ipv4"));
        assert_eq!(host.os_guess, "Linux 5.0 - 5.4");
        assert_eq!(host.ports.len(), 2);

        let ssh = &host.ports[0];
        assert_eq!(ssh.portid, Some(22));
        assert_eq!(ssh.protocol.as_deref(), Some("tcp"));
        assert_eq!(ssh.state.as_deref(), Some("open"));
        assert_eq!(ssh.reason.as_deref(), Some("syn-ack"));
        assert_eq!(ssh.service_name.as_deref(), Some("ssh"));
        assert_eq!(ssh.product.as_deref(), Some("OpenSSH"));
        assert_eq!(ssh.extrainfo.as_deref(), Some("Ubuntu Linux; protocol 2.0"));

        let http = &host.ports[1];
        assert_eq!(http.portid, Some(80));
        assert_eq!(http.product, None);
        assert_eq!(host.open_ports().count(), 1);
    }

    #[test]
    fn missing_os_and_ports_get_defaults() {
        let xml = r#"<nmaprun><host><status state="up"/><address addr="h" addrtype="ipv4"/></host></nmaprun>"#;
        let summary = summarize_xml(xml).unwrap();

        assert_eq!(summary.hosts[0].os_guess, UNKNOWN_OS);
        assert!(summary.hosts[0].ports.is_empty());
    }

    #[test]
    fn no_hosts_is_an_empty_summary() {
        let summary = summarize_xml(r#"<nmaprun scanner="nmap"></nmaprun>"#).unwrap();
        assert_eq!(summary, DiscoverySummary::default());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            summarize_xml("<nmaprun><host></nmaprun>"),
            Err(DiscoveryError::Xml(_))
        ));
    }

    #[test]
    fn args_end_with_xml_output_and_target() {
        let args = Nmap::args("10.0.0.5", ScanMode::Fast, Path::new("/s/nmap.xml"));
        assert_eq!(
            args,
            ["-T4", "--top-ports", "100", "-sV", "-oX", "/s/nmap.xml", "10.0.0.5"]
        );
    }

    /// Writes a canned XML file, or fails without writing.
    struct FakeScanner(Option<&'static str>);

    impl Scanner for FakeScanner {
        fn scan(&self, _target: &str, _mode: ScanMode, xml_path: &Path) -> ScanRun {
            match self.0 {
                Some(xml) => {
                    fs::write(xml_path, xml).unwrap();
                    ScanRun {
                        succeeded: true,
                        diagnostic: None,
                    }
                }
                None => ScanRun {
                    succeeded: false,
                    diagnostic: Some("nmap not found".into()),
                },
            }
        }
    }

    #[test]
    fn discover_parses_the_written_xml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmap.xml");

        let outcome = discover(&FakeScanner(Some(SAMPLE)), "10.0.0.5", ScanMode::Fast, &path);

        assert!(outcome.succeeded);
        assert_eq!(outcome.xml_path, Some(path));
        assert_eq!(outcome.summary.hosts.len(), 1);
    }

    #[test]
    fn failed_scan_is_an_empty_failed_outcome() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmap.xml");

        let outcome = discover(&FakeScanner(None), "10.0.0.5", ScanMode::Fast, &path);

        assert!(!outcome.succeeded);
        assert_eq!(outcome.diagnostic.as_deref(), Some("nmap not found"));
        assert_eq!(outcome.xml_path, None::<PathBuf>);
        assert!(outcome.summary.hosts.is_empty());
    }

    #[test]
    fn unreadable_xml_is_a_failed_outcome() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nmap.xml");

        let outcome = discover(
            &FakeScanner(Some("<nmaprun><host></nmaprun>")),
            "10.0.0.5",
            ScanMode::Fast,
            &path,
        );

        assert!(!outcome.succeeded);
        assert!(outcome.diagnostic.is_some());
        assert_eq!(outcome.xml_path, Some(path));
    }
}
