//! Network controller command.
//!
//! The controller is an external program (plus fixed leading arguments)
//! that answers one verb per invocation with JSON on stdout:
//!
//! - `get_networks` → `["<nwid>", ...]`
//! - `with_network <nwid> get_pa_modes` → `{"6plane": bool, "rfc4193": bool}`
//! - `with_network <nwid> get_member_ips <nodeid>` → `["<ip>", ...]`
//! - `with_network <nwid> set_dns_params <domain> <server>...`

use crate::resolver::{AddressingModes, MembershipLookup};
use crate::zerotier::{NetworkId, NodeId};
use log::debug;
use serde::de::DeserializeOwned;
use std::net::{AddrParseError, IpAddr};
use std::process::{Command, ExitStatus, Output};

/// Errors from invoking the controller or interpreting its replies
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to run controller command `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Controller command `{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Unexpected reply to `{command}`: {source}")]
    InvalidReply {
        command: String,
        source: serde_json::Error,
    },

    #[error("Controller returned invalid IP address {value:?}: {source}")]
    InvalidAddress {
        value: String,
        source: AddrParseError,
    },
}

/// The controller program and its leading arguments
#[derive(Debug, Clone)]
pub struct ControllerCommand {
    program: String,
    args: Vec<String>,
}

impl ControllerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn describe(&self, extra: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(extra.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run(&self, extra: &[&str]) -> Result<Output, ControllerError> {
        debug!("Running controller: {}", self.describe(extra));
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .output()
            .map_err(|source| ControllerError::Spawn {
                command: self.describe(extra),
                source,
            })?;

        if !output.status.success() {
            return Err(ControllerError::Failed {
                command: self.describe(extra),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Run the controller with `extra` arguments and decode its JSON reply
    pub fn call<T: DeserializeOwned>(&self, extra: &[&str]) -> Result<T, ControllerError> {
        let output = self.run(extra)?;
        serde_json::from_slice(&output.stdout).map_err(|source| ControllerError::InvalidReply {
            command: self.describe(extra),
            source,
        })
    }

    /// List the networks managed by the controller
    pub fn networks(&self) -> Result<Vec<ControllerNetwork>, ControllerError> {
        let ids: Vec<NetworkId> = self.call(&["get_networks"])?;
        Ok(ids
            .into_iter()
            .map(|network_id| ControllerNetwork {
                command: self.clone(),
                network_id,
            })
            .collect())
    }
}

/// Controller verbs scoped to one network
#[derive(Debug, Clone)]
pub struct ControllerNetwork {
    command: ControllerCommand,
    network_id: NetworkId,
}

impl ControllerNetwork {
    pub fn new(command: ControllerCommand, network_id: NetworkId) -> Self {
        Self { command, network_id }
    }

    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    fn scoped<'a>(&self, nwid: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec!["with_network", nwid];
        args.extend_from_slice(extra);
        args
    }

    pub fn call<T: DeserializeOwned>(&self, extra: &[&str]) -> Result<T, ControllerError> {
        let nwid = self.network_id.to_string();
        self.command.call(&self.scoped(&nwid, extra))
    }

    /// Managed addressing modes enabled on the network
    pub fn addressing_modes(&self) -> Result<AddressingModes, ControllerError> {
        self.call(&["get_pa_modes"])
    }

    /// Addresses assigned directly to one member
    pub fn member_ips(&self, node_id: NodeId) -> Result<Vec<IpAddr>, ControllerError> {
        let node = node_id.to_string();
        let raw: Vec<String> = self.call(&["get_member_ips", &node])?;
        raw.into_iter()
            .map(|value| match value.parse::<IpAddr>() {
                Ok(ip) => Ok(ip),
                Err(source) => Err(ControllerError::InvalidAddress { value, source }),
            })
            .collect()
    }

    /// Publish the DNS domain and servers to the network's members.
    ///
    /// Only the exit status matters; the reply body is ignored.
    pub fn set_dns_params(&self, domain: &str, servers: &[IpAddr]) -> Result<(), ControllerError> {
        let nwid = self.network_id.to_string();
        let servers: Vec<String> = servers.iter().map(|ip| ip.to_string()).collect();
        let mut extra = vec!["set_dns_params", domain];
        extra.extend(servers.iter().map(String::as_str));
        self.command.run(&self.scoped(&nwid, &extra))?;
        Ok(())
    }
}

impl MembershipLookup for ControllerNetwork {
    type Error = ControllerError;

    /// One `get_member_ips` call per id; the controller has no bulk verb
    fn member_ips(&mut self, node_ids: &[NodeId]) -> Result<Vec<Vec<IpAddr>>, ControllerError> {
        node_ids
            .iter()
            .map(|node_id| ControllerNetwork::member_ips(self, *node_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FAKE_CONTROLLER: &str = r#"
case "$1" in
  get_networks) echo '["8056c2e21c000001", "0123456789abcdef"]' ;;
  get_garbage) echo 'not json' ;;
  with_network)
    case "$3" in
      get_pa_modes) echo '{"6plane": true, "rfc4193": false}' ;;
      get_member_ips)
        case "$4" in
          efcc1b0947) echo '["10.147.17.5", "fd00::5"]' ;;
          badbadbad0) echo '["not-an-ip"]' ;;
          *) echo '[]' ;;
        esac ;;
      set_dns_params) shift 3; echo "$@" > "$LOG_FILE" ;;
    esac ;;
  *) echo "unknown verb $1" >&2; exit 2 ;;
esac
"#;

    fn fake_controller() -> ControllerCommand {
        ControllerCommand::new(
            "sh",
            vec!["-c".to_string(), FAKE_CONTROLLER.to_string(), "ztctl".to_string()],
        )
    }

    fn network() -> ControllerNetwork {
        ControllerNetwork::new(fake_controller(), "8056c2e21c000001".parse().unwrap())
    }

    #[test]
    fn test_list_networks() {
        let networks = fake_controller().networks().unwrap();
        let ids: Vec<String> = networks.iter().map(|n| n.network_id().to_string()).collect();
        assert_eq!(ids, vec!["8056c2e21c000001", "0123456789abcdef"]);
    }

    #[test]
    fn test_addressing_modes() {
        let modes = network().addressing_modes().unwrap();
        assert_eq!(modes, AddressingModes { sixplane: true, rfc4193: false });
    }

    #[test]
    fn test_member_ips() {
        let ips = network().member_ips("efcc1b0947".parse().unwrap()).unwrap();
        assert_eq!(ips, vec!["10.147.17.5".parse::<IpAddr>().unwrap(), "fd00::5".parse().unwrap()]);
        assert!(network().member_ips("0000000001".parse().unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_member_ips_invalid_address() {
        let err = network().member_ips("badbadbad0".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidAddress { ref value, .. } if value == "not-an-ip"));
    }

    #[test]
    fn test_lookup_keeps_order() {
        let ids = ["0000000001".parse().unwrap(), "efcc1b0947".parse().unwrap()];
        let lists = MembershipLookup::member_ips(&mut network(), &ids).unwrap();
        assert_eq!(lists.len(), 2);
        assert!(lists[0].is_empty());
        assert_eq!(lists[1].len(), 2);
    }

    #[test]
    fn test_failed_command() {
        let err = fake_controller().call::<serde_json::Value>(&["bogus"]).unwrap_err();
        match err {
            ControllerError::Failed { stderr, .. } => assert_eq!(stderr, "unknown verb bogus"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_reply() {
        let err = fake_controller().call::<Vec<String>>(&["get_garbage"]).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidReply { .. }));

        // Valid JSON of the wrong shape
        let err = network().call::<Vec<String>>(&["get_pa_modes"]).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidReply { .. }));
    }

    #[test]
    fn test_missing_program() {
        let command = ControllerCommand::new("/nonexistent/ztctl", Vec::new());
        assert!(matches!(command.networks(), Err(ControllerError::Spawn { .. })));
    }

    #[test]
    fn test_set_dns_params() {
        let dir = TempDir::new().unwrap();
        let log_file = dir.path().join("dns.log");
        let script = format!("LOG_FILE='{}'\n{}", log_file.display(), FAKE_CONTROLLER);
        let command = ControllerCommand::new("sh", vec!["-c".to_string(), script, "ztctl".to_string()]);
        let network = ControllerNetwork::new(command, "8056c2e21c000001".parse().unwrap());

        let servers: Vec<IpAddr> = vec!["10.147.17.5".parse().unwrap(), "fd00::5".parse().unwrap()];
        network.set_dns_params("zt.example", &servers).unwrap();

        let logged = std::fs::read_to_string(&log_file).unwrap();
        assert_eq!(logged.trim(), "zt.example 10.147.17.5 fd00::5");
    }
}
