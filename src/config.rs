use crate::resolver::AddressResolver;
use crate::utils::ip_utils::{parse_any_address, AnyAddress};
use crate::zerotier::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{AddrParseError, IpAddr};

/// Per-network configuration as written on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawNetworkConfig {
    /// Host names to publish for each node
    pub zt_hosts: BTreeMap<NodeId, Vec<String>>,
    pub dns: RawDnsConfig,
}

/// DNS section; servers are node ids or IP literals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDnsConfig {
    pub domain: String,
    pub servers: Vec<String>,
}

impl RawNetworkConfig {
    /// Validate the configuration
    ///
    /// Host names are published as written (trailing dots and underscores
    /// included); only empty strings are refused.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dns.domain.trim().is_empty() {
            return Err(ValidationError::InvalidDns("domain cannot be empty".to_string()));
        }

        for (node_id, names) in &self.zt_hosts {
            if names.iter().any(|name| name.is_empty()) {
                return Err(ValidationError::InvalidHost(format!("{} has an empty host name", node_id)));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid DNS configuration: {0}")]
    InvalidDns(String),
    #[error("Invalid host configuration: {0}")]
    InvalidHost(String),
}

/// Errors while turning a raw configuration into resolved addresses
#[derive(Debug, thiserror::Error)]
pub enum ConfigError<E> {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("DNS server {entry:?} is neither a node id nor an IP address: {source}")]
    InvalidServer { entry: String, source: AddrParseError },

    #[error("Failed to resolve DNS server {node_id}: {source}")]
    Resolve { node_id: NodeId, source: E },
}

/// DNS settings with every server resolved to IP addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsConfig {
    pub domain: String,
    pub servers: Vec<IpAddr>,
}

/// A node together with its resolved addresses and host names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub node_id: NodeId,
    pub addresses: Vec<IpAddr>,
    pub names: Vec<String>,
}

/// Validated network configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub zt_hosts: BTreeMap<NodeId, Vec<String>>,
    pub dns: DnsConfig,
}

impl NetworkConfig {
    /// Validate `raw` and resolve its DNS servers through `resolver`
    pub fn from_raw<R: AddressResolver>(
        raw: RawNetworkConfig,
        resolver: &mut R,
    ) -> Result<Self, ConfigError<R::Error>> {
        raw.validate()?;

        let mut servers = Vec::new();
        for entry in &raw.dns.servers {
            match parse_any_address(entry) {
                Ok(AnyAddress::Ip(ip)) => servers.push(ip),
                Ok(AnyAddress::Node(node_id)) => {
                    let addresses = resolver
                        .resolve(node_id)
                        .map_err(|source| ConfigError::Resolve { node_id, source })?;
                    servers.extend(addresses);
                }
                Err(source) => {
                    return Err(ConfigError::InvalidServer {
                        entry: entry.clone(),
                        source,
                    })
                }
            }
        }

        Ok(Self {
            zt_hosts: raw.zt_hosts,
            dns: DnsConfig {
                domain: raw.dns.domain,
                servers,
            },
        })
    }

    /// Resolve every configured host in one burst, in node id order
    pub fn resolve_hosts<R: AddressResolver>(&self, resolver: &mut R) -> Result<Vec<HostEntry>, R::Error> {
        let node_ids: Vec<NodeId> = self.zt_hosts.keys().copied().collect();
        let addresses = resolver.resolve_all(&node_ids)?;

        Ok(self
            .zt_hosts
            .iter()
            .zip(addresses)
            .map(|((node_id, names), addresses)| HostEntry {
                node_id: *node_id,
                addresses,
                names: names.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Resolver answering from a fixed table, counting calls
    struct TableResolver {
        table: HashMap<NodeId, Vec<IpAddr>>,
        calls: usize,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("unknown node {0}")]
    struct UnknownNode(NodeId);

    impl AddressResolver for TableResolver {
        type Error = UnknownNode;

        fn resolve(&mut self, node_id: NodeId) -> Result<Vec<IpAddr>, UnknownNode> {
            self.calls += 1;
            self.table.get(&node_id).cloned().ok_or(UnknownNode(node_id))
        }
    }

    fn resolver() -> TableResolver {
        let mut table = HashMap::new();
        table.insert(
            "efcc1b0947".parse().unwrap(),
            vec!["10.147.17.5".parse().unwrap(), "fd00::5".parse().unwrap()],
        );
        table.insert("0000000001".parse().unwrap(), vec!["10.147.17.1".parse().unwrap()]);
        TableResolver { table, calls: 0 }
    }

    fn parse(json: &str) -> RawNetworkConfig {
        serde_json::from_str(json).unwrap()
    }

    const CONFIG: &str = r#"{
        "zt_hosts": {
            "efcc1b0947": ["gateway", "gw.lan"],
            "0000000001": ["printer"]
        },
        "dns": {
            "domain": "zt.example",
            "servers": ["efcc1b0947", "1.1.1.1"]
        }
    }"#;

    #[test]
    fn test_parse_and_resolve_servers() {
        let mut resolver = resolver();
        let config = NetworkConfig::from_raw(parse(CONFIG), &mut resolver).unwrap();

        assert_eq!(config.dns.domain, "zt.example");
        let servers: Vec<String> = config.dns.servers.iter().map(|ip| ip.to_string()).collect();
        assert_eq!(servers, vec!["10.147.17.5", "fd00::5", "1.1.1.1"]);
        assert_eq!(resolver.calls, 1);
    }

    #[test]
    fn test_resolve_hosts_in_node_order() {
        let mut resolver = resolver();
        let config = NetworkConfig::from_raw(parse(CONFIG), &mut resolver).unwrap();
        let hosts = config.resolve_hosts(&mut resolver).unwrap();

        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].node_id.to_string(), "0000000001");
        assert_eq!(hosts[0].names, vec!["printer"]);
        assert_eq!(hosts[1].names, vec!["gateway", "gw.lan"]);
        assert_eq!(hosts[1].addresses.len(), 2);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let json = r#"{"zt_hosts": {}, "dns": {"domain": "a", "servers": []}, "extra": 1}"#;
        assert!(serde_json::from_str::<RawNetworkConfig>(json).is_err());
        let json = r#"{"zt_hosts": {}, "dns": {"domain": "a", "servers": [], "ttl": 5}}"#;
        assert!(serde_json::from_str::<RawNetworkConfig>(json).is_err());
        let json = r#"{"zt_hosts": {}}"#;
        assert!(serde_json::from_str::<RawNetworkConfig>(json).is_err());
    }

    #[test]
    fn test_invalid_host_key_rejected() {
        let json = r#"{"zt_hosts": {"efcc1b094": ["a"]}, "dns": {"domain": "a", "servers": ["1.1.1.1"]}}"#;
        assert!(serde_json::from_str::<RawNetworkConfig>(json).is_err());
    }

    #[test]
    fn test_validate() {
        let mut raw = parse(CONFIG);
        assert!(raw.validate().is_ok());

        raw.dns.domain = " ".to_string();
        assert!(matches!(raw.validate(), Err(ValidationError::InvalidDns(_))));

        let mut raw = parse(CONFIG);
        raw.zt_hosts.insert("0000000002".parse().unwrap(), vec!["ok".to_string(), String::new()]);
        assert!(matches!(raw.validate(), Err(ValidationError::InvalidHost(_))));
    }

    #[test]
    fn test_validate_accepts_dns_names() {
        let sip: NodeId = "0000000002".parse().unwrap();
        let mut raw = parse(CONFIG);
        raw.dns.servers.clear();
        raw.zt_hosts.insert(
            sip,
            vec!["gw.zt.example.".to_string(), "_sip".to_string()],
        );
        raw.zt_hosts.insert("0000000003".parse().unwrap(), Vec::new());
        assert!(raw.validate().is_ok());

        let config = NetworkConfig::from_raw(raw, &mut resolver()).unwrap();
        assert!(config.dns.servers.is_empty());
        assert_eq!(config.zt_hosts[&sip], vec!["gw.zt.example.", "_sip"]);
    }

    #[test]
    fn test_invalid_server_entry() {
        let mut raw = parse(CONFIG);
        raw.dns.servers.push("dns.example".to_string());
        let err = NetworkConfig::from_raw(raw, &mut resolver()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidServer { ref entry, .. } if entry == "dns.example"));
    }

    #[test]
    fn test_server_resolution_error() {
        let mut raw = parse(CONFIG);
        raw.dns.servers = vec!["abcdefabcd".to_string()];
        let err = NetworkConfig::from_raw(raw, &mut resolver()).unwrap_err();
        assert!(matches!(err, ConfigError::Resolve { .. }));
        assert_eq!(err.to_string(), "Failed to resolve DNS server abcdefabcd: unknown node abcdefabcd");
    }
}
