//! Node id to address list resolution.
//!
//! A [`NetworkResolver`] answers "which addresses does this node have on
//! this network" one node at a time. Behind it, [`MemberAddresses`] drains
//! every id queued since the last lookup, asks the [`MembershipLookup`] for
//! all of them at once, and appends the managed addresses enabled for the
//! network.

use crate::utils::feeder::{Drain, FeedError, Feeder};
use crate::zerotier::{derive_6plane, derive_unique_local, NetworkId, NodeId};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::net::IpAddr;

/// Managed addressing modes enabled on a network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressingModes {
    #[serde(rename = "6plane")]
    pub sixplane: bool,
    pub rfc4193: bool,
}

impl AddressingModes {
    /// Managed addresses of a node: 6plane first, then rfc4193
    pub fn derived_addresses(&self, network_id: NetworkId, node_id: NodeId) -> Vec<IpAddr> {
        let mut addresses = Vec::new();
        if self.sixplane {
            addresses.push(IpAddr::V6(derive_6plane(network_id, node_id).node_address));
        }
        if self.rfc4193 {
            addresses.push(IpAddr::V6(derive_unique_local(network_id, node_id).node_address));
        }
        addresses
    }
}

/// Source of the addresses assigned directly to network members
pub trait MembershipLookup {
    type Error;

    /// Return one address list per id, in the order the ids were given
    fn member_ips(&mut self, node_ids: &[NodeId]) -> Result<Vec<Vec<IpAddr>>, Self::Error>;
}

/// Turns a bare node id into its final address list
pub trait AddressResolver {
    type Error;

    fn resolve(&mut self, node_id: NodeId) -> Result<Vec<IpAddr>, Self::Error>;

    /// Resolve several ids, in order
    fn resolve_all(&mut self, node_ids: &[NodeId]) -> Result<Vec<Vec<IpAddr>>, Self::Error> {
        node_ids.iter().map(|node_id| self.resolve(*node_id)).collect()
    }
}

/// Batch resolver over a lazy stream of node ids.
///
/// Each time its buffer of answers runs dry it collects every id the
/// source currently has, performs one lookup for all of them and queues
/// the combined address lists.
pub struct MemberAddresses<L, I> {
    network_id: NetworkId,
    modes: AddressingModes,
    lookup: L,
    node_ids: I,
    ready: VecDeque<Vec<IpAddr>>,
}

impl<L, I> MemberAddresses<L, I>
where
    L: MembershipLookup,
    I: Iterator<Item = NodeId>,
{
    pub fn new(network_id: NetworkId, modes: AddressingModes, lookup: L, node_ids: I) -> Self {
        Self {
            network_id,
            modes,
            lookup,
            node_ids,
            ready: VecDeque::new(),
        }
    }

    fn fetch(&mut self, batch: &[NodeId]) -> Result<(), L::Error> {
        debug!("Looking up {} member(s) of network {}", batch.len(), self.network_id);
        let member_ips = self.lookup.member_ips(batch)?;

        if member_ips.len() != batch.len() {
            error!(
                "Membership lookup for network {} returned {} address lists for {} ids",
                self.network_id,
                member_ips.len(),
                batch.len()
            );
        }

        for (node_id, mut addresses) in batch.iter().zip(member_ips) {
            addresses.extend(self.modes.derived_addresses(self.network_id, *node_id));
            self.ready.push_back(addresses);
        }
        Ok(())
    }
}

impl<L, I> Iterator for MemberAddresses<L, I>
where
    L: MembershipLookup,
    I: Iterator<Item = NodeId>,
{
    type Item = Result<Vec<IpAddr>, L::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ready.is_empty() {
            let batch: Vec<NodeId> = self.node_ids.by_ref().collect();
            if batch.is_empty() {
                return None;
            }
            // A failed lookup answers for the whole batch
            if let Err(err) = self.fetch(&batch) {
                return Some(Err(err));
            }
        }
        self.ready.pop_front().map(Ok)
    }
}

/// Single-id resolver for one network
pub struct NetworkResolver<L> {
    network_id: NetworkId,
    feeder: Feeder<NodeId, MemberAddresses<L, Drain<NodeId>>>,
}

impl<L: MembershipLookup> NetworkResolver<L> {
    pub fn new(network_id: NetworkId, modes: AddressingModes, lookup: L) -> Self {
        let feeder = Feeder::new(|node_ids: Drain<NodeId>| {
            MemberAddresses::new(network_id, modes, lookup, node_ids)
        });
        Self { network_id, feeder }
    }

    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }
}

impl<L: MembershipLookup> AddressResolver for NetworkResolver<L> {
    type Error = FeedError<L::Error>;

    fn resolve(&mut self, node_id: NodeId) -> Result<Vec<IpAddr>, Self::Error> {
        self.feeder.push(node_id)
    }

    /// Queues every id before pulling, so the lookup sees them as one batch
    fn resolve_all(&mut self, node_ids: &[NodeId]) -> Result<Vec<Vec<IpAddr>>, Self::Error> {
        self.feeder.push_batch(node_ids.iter().copied())
    }
}
