//! Ring topology abstractions.
//!
//! - [`Topology`]: datacenter and rack attributes of every ring member
//! - [`TokenMetadata`]: an immutable, epoch-stamped snapshot of ring
//!   ownership plus topology
//! - [`TopologyProvider`]: the live source of snapshots

mod metadata;
mod provider;

pub use metadata::{TokenMetadata, TokenMetadataBuilder};
pub use provider::{SharedTopology, TopologyProvider};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::network::Endpoint;
use crate::node::Node;

/// Monotonically increasing version of a topology snapshot.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RingEpoch(pub u64);

impl RingEpoch {
    pub fn next(self) -> Self {
        RingEpoch(self.0 + 1)
    }
}

impl fmt::Display for RingEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Per-node placement attributes, indexed by datacenter and rack.
///
/// All collections are ordered so iteration is identical on every node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    nodes: BTreeMap<Endpoint, Node>,
    datacenters: BTreeMap<String, BTreeSet<Endpoint>>,
    racks: BTreeMap<String, BTreeMap<String, BTreeSet<Endpoint>>>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a node. A node moving racks is removed from its old one.
    pub fn add_node(&mut self, node: Node) {
        self.remove_node(&node.endpoint);
        self.datacenters
            .entry(node.datacenter.clone())
            .or_default()
            .insert(node.endpoint);
        self.racks
            .entry(node.datacenter.clone())
            .or_default()
            .entry(node.rack.clone())
            .or_default()
            .insert(node.endpoint);
        self.nodes.insert(node.endpoint, node);
    }

    pub fn remove_node(&mut self, endpoint: &Endpoint) -> Option<Node> {
        let node = self.nodes.remove(endpoint)?;

        if let Some(members) = self.datacenters.get_mut(&node.datacenter) {
            members.remove(endpoint);
            if members.is_empty() {
                self.datacenters.remove(&node.datacenter);
            }
        }
        if let Some(racks) = self.racks.get_mut(&node.datacenter) {
            if let Some(members) = racks.get_mut(&node.rack) {
                members.remove(endpoint);
                if members.is_empty() {
                    racks.remove(&node.rack);
                }
            }
            if racks.is_empty() {
                self.racks.remove(&node.datacenter);
            }
        }
        Some(node)
    }

    pub fn get(&self, endpoint: &Endpoint) -> Option<&Node> {
        self.nodes.get(endpoint)
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.nodes.contains_key(endpoint)
    }

    pub fn datacenter_of(&self, endpoint: &Endpoint) -> Option<&str> {
        self.nodes.get(endpoint).map(|n| n.datacenter.as_str())
    }

    pub fn rack_of(&self, endpoint: &Endpoint) -> Option<&str> {
        self.nodes.get(endpoint).map(|n| n.rack.as_str())
    }

    /// Datacenter names, sorted.
    pub fn datacenters(&self) -> impl Iterator<Item = &str> {
        self.datacenters.keys().map(String::as_str)
    }

    pub fn datacenter_size(&self, datacenter: &str) -> usize {
        self.datacenters.get(datacenter).map_or(0, BTreeSet::len)
    }

    pub fn rack_count(&self, datacenter: &str) -> usize {
        self.racks.get(datacenter).map_or(0, BTreeMap::len)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
