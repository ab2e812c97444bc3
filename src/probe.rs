//! Reachability probe: is the target alive, and which common ports answer?

use std::collections::BTreeMap;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use crate::config::ProbeConfig;
use crate::model::Reachability;
use crate::process::{self, Completion};

/// Gathers liveness facts about a target.
pub trait Probe {
    fn check(&self, target: &str) -> Reachability;
}

/// ICMP via the system `ping`, TCP via plain connects.
#[derive(Debug, Clone)]
pub struct NetworkProbe {
    ports: Vec<u16>,
    timeout: Duration,
    ping_count: u32,
}

impl NetworkProbe {
    pub fn new(ports: Vec<u16>, timeout: Duration, ping_count: u32) -> Self {
        Self {
            ports,
            timeout,
            ping_count,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(
            config.ports.clone(),
            Duration::from_secs(config.timeout_seconds),
            config.ping_count,
        )
    }

    fn ping(&self, target: &str) -> bool {
        let wait = self.timeout.as_secs().max(1);
        let mut cmd = Command::new("ping");
        cmd.arg("-c")
            .arg(self.ping_count.max(1).to_string())
            .arg("-W")
            .arg(wait.to_string())
            .arg(target);

        // Each echo may wait the full reply timeout; allow one extra for startup.
        let ceiling = Duration::from_secs(wait * (u64::from(self.ping_count) + 1));
        match process::run_bounded(cmd, ceiling) {
            Completion::Exited { code, .. } => code == 0,
            Completion::TimedOut => false,
            Completion::Failed(e) => {
                debug!("ping could not run: {e}");
                false
            }
        }
    }

    fn tcp_open(&self, target: &str, port: u16) -> bool {
        let addrs: Vec<SocketAddr> = match (target, port).to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(e) => {
                debug!(target, port, "could not resolve: {e}");
                return false;
            }
        };
        addrs
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok())
    }
}

impl Probe for NetworkProbe {
    fn check(&self, target: &str) -> Reachability {
        let icmp_reachable = self.ping(target);
        let tcp_checks: BTreeMap<u16, bool> = self
            .ports
            .iter()
            .map(|&port| (port, self.tcp_open(target, port)))
            .collect();
        debug!(target, icmp_reachable, ?tcp_checks, "reachability checked");

        Reachability {
            target: target.to_string(),
            icmp_reachable,
            tcp_checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener;

    #[test]
    fn tcp_check_sees_a_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let open = listener.local_addr().unwrap().port();

        // Bind then drop to find a port that is very likely closed.
        let closed = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let probe = NetworkProbe::new(vec![open, closed], Duration::from_secs(1), 1);
        assert!(probe.tcp_open("127.0.0.1", open));
        assert!(!probe.tcp_open("127.0.0.1", closed));
    }

    #[test]
    fn unresolvable_target_is_closed() {
        let probe = NetworkProbe::new(vec![80], Duration::from_secs(1), 1);
        assert!(!probe.tcp_open("lookout-test.invalid", 80));
    }

    #[test]
    fn check_reports_every_configured_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let open = listener.local_addr().unwrap().port();

        let probe = NetworkProbe::new(vec![open], Duration::from_secs(1), 1);
        let reach = probe.check("127.0.0.1");

        assert_eq!(reach.target, "127.0.0.1");
        assert_eq!(reach.tcp_checks, BTreeMap::from([(open, true)]));
        assert!(reach.any_response());
    }

    #[test]
    fn defaults_come_from_config() {
        let probe = NetworkProbe::from_config(&ProbeConfig::default());
        assert_eq!(probe.ports, vec![22, 80, 443]);
        assert_eq!(probe.timeout, Duration::from_secs(3));
        assert_eq!(probe.ping_count, 2);
    }
}
