use crate::zerotier::NodeId;
use std::net::{AddrParseError, IpAddr};

/// IP utility functions for address entries in network configs

/// An address entry that is either a ZeroTier node or a literal IP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyAddress {
    Node(NodeId),
    Ip(IpAddr),
}

/// Parse a node id if the entry is 10 hex digits, otherwise an IP literal
pub fn parse_any_address(entry: &str) -> Result<AnyAddress, AddrParseError> {
    match entry.parse::<NodeId>() {
        Ok(node_id) => Ok(AnyAddress::Node(node_id)),
        Err(_) => entry.parse::<IpAddr>().map(AnyAddress::Ip),
    }
}

/// Render addresses space separated, in order
pub fn join_addresses(addresses: &[IpAddr]) -> String {
    addresses
        .iter()
        .map(|ip| ip.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
