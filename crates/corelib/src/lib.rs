//! Core library for the replica locator.
//!
//! This crate provides the fundamental abstractions replication strategies
//! are computed over:
//! - Tokens and partitioners
//! - Endpoints, endpoint sets and the local broadcast address
//! - Nodes and virtual nodes
//! - The token ring, topology snapshots and the topology provider

pub mod error;
pub mod network;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod topology;
pub mod vnode;

pub use error::{Error, Result};
pub use network::{broadcast_address, set_broadcast_address, Endpoint, EndpointSet};
pub use node::Node;
pub use partitioner::Partitioner;
pub use ring::TokenRing;
pub use token::Token;
pub use topology::{
    RingEpoch, SharedTopology, TokenMetadata, TokenMetadataBuilder, Topology, TopologyProvider,
};
pub use vnode::VirtualNode;
