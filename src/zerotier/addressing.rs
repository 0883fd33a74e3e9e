//! Managed address derivation.
//!
//! ZeroTier can assign IPv6 addresses computed from the network id and the
//! node id instead of handing them out from a pool. Two schemes exist:
//!
//! - **6plane**: every node gets its own /80 below a /40 shared by the
//!   whole network. The /40 is `fc` followed by the network id folded to
//!   32 bits.
//! - **rfc4193**: the network gets a single /88 (`fd`, network id, a fixed
//!   tag) and each node sits at the offset given by its node id.
//!
//! Both functions are pure and total over validated identifiers.

use super::ids::{NetworkId, NodeId};
use ipnet::Ipv6Net;
use std::net::Ipv6Addr;

/// Prefix length of the per-network 6plane allocation
pub const SIXPLANE_SUPERNET_PREFIX: u8 = 40;
/// Prefix length of the per-node 6plane subnet
pub const SIXPLANE_NODE_PREFIX: u8 = 80;
/// Prefix length of the rfc4193 network
pub const UNIQUE_LOCAL_PREFIX: u8 = 88;

/// Marker placed after the network id in rfc4193 addresses
pub const UNIQUE_LOCAL_TAG: u16 = 0x9993;

const SIXPLANE_MARKER: u128 = 0xfc;
const UNIQUE_LOCAL_MARKER: u128 = 0xfd;

/// Addresses derived by the 6plane scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SixPlaneAddresses {
    /// The /40 covering every node of the network
    pub supernet: Ipv6Net,
    /// The /80 delegated to the node
    pub node_subnet: Ipv6Net,
    /// First host address of `node_subnet`
    pub node_address: Ipv6Addr,
}

/// Addresses derived by the rfc4193 scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueLocalAddresses {
    /// The /88 shared by the network
    pub network: Ipv6Net,
    /// Address of the node inside `network`
    pub node_address: Ipv6Addr,
}

/// Fold the 64-bit network id into 32 bits by XOR-ing its halves
fn sixplane_prefix(network_id: NetworkId) -> u32 {
    let nwid = network_id.as_u64();
    ((nwid ^ (nwid >> 32)) & 0xffff_ffff) as u32
}

/// Compute the 6plane supernet, node subnet and node address.
pub fn derive_6plane(network_id: NetworkId, node_id: NodeId) -> SixPlaneAddresses {
    // fc | prefix (32) | node id (40) | 48 zero bits
    let bits = (SIXPLANE_MARKER << 120)
        | (u128::from(sixplane_prefix(network_id)) << 88)
        | (u128::from(node_id.as_u64()) << 48);

    let node_subnet = Ipv6Net::new_assert(Ipv6Addr::from(bits), SIXPLANE_NODE_PREFIX);
    let supernet = Ipv6Net::new_assert(node_subnet.network(), SIXPLANE_SUPERNET_PREFIX).trunc();
    let node_address = Ipv6Addr::from(u128::from(node_subnet.network()) + 1);

    SixPlaneAddresses {
        supernet,
        node_subnet,
        node_address,
    }
}

/// Compute the rfc4193 network and the node's address inside it.
pub fn derive_unique_local(network_id: NetworkId, node_id: NodeId) -> UniqueLocalAddresses {
    // fd | network id (64) | tag (16) | node id (40)
    let bits = (UNIQUE_LOCAL_MARKER << 120)
        | (u128::from(network_id.as_u64()) << 56)
        | (u128::from(UNIQUE_LOCAL_TAG) << 40);

    let network = Ipv6Net::new_assert(Ipv6Addr::from(bits), UNIQUE_LOCAL_PREFIX);
    let node_address = Ipv6Addr::from(u128::from(network.network()) + u128::from(node_id.as_u64()));

    UniqueLocalAddresses {
        network,
        node_address,
    }
}
