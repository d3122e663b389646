//! Epoch-stamped token metadata snapshots.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::network::Endpoint;
use crate::node::Node;
use crate::ring::TokenRing;
use crate::token::Token;
use crate::topology::{RingEpoch, Topology};
use crate::vnode::VirtualNode;

/// Immutable view of ring ownership and node attributes at one epoch.
///
/// Only nodes owning at least one token are part of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    ring: TokenRing,
    topology: Topology,
    epoch: RingEpoch,
}

impl TokenMetadata {
    /// An empty snapshot at `epoch`.
    pub fn empty(epoch: RingEpoch) -> Self {
        Self {
            epoch,
            ..Self::default()
        }
    }

    pub fn builder(epoch: RingEpoch) -> TokenMetadataBuilder {
        TokenMetadataBuilder::new(epoch)
    }

    /// A builder seeded with this snapshot's nodes, stamped with the next epoch.
    pub fn to_builder(&self) -> TokenMetadataBuilder {
        let mut builder = TokenMetadataBuilder::new(self.epoch.next());
        for node in self.topology.nodes() {
            builder = builder.add_node_with_tokens(node.clone(), self.ring.tokens_of(&node.endpoint));
        }
        builder
    }

    pub fn ring(&self) -> &TokenRing {
        &self.ring
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn epoch(&self) -> RingEpoch {
        self.epoch
    }

    /// The endpoint owning `token`.
    pub fn owner(&self, token: Token) -> Option<Endpoint> {
        self.ring.owner(token)
    }

    /// Ring tokens in ascending order.
    pub fn sorted_tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.ring.sorted_tokens()
    }

    pub fn node_count(&self) -> usize {
        self.topology.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

/// Builder for [`TokenMetadata`].
///
/// # Example
///
/// ```rust
/// use corelib::{Node, RingEpoch, TokenMetadata};
///
/// let metadata = TokenMetadata::builder(RingEpoch(1))
///     .add_node(Node::new("10.0.0.1".parse().unwrap()), 8)
///     .add_node(Node::new("10.0.0.2".parse().unwrap()), 8)
///     .build()
///     .unwrap();
/// assert_eq!(metadata.node_count(), 2);
/// assert_eq!(metadata.ring().len(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct TokenMetadataBuilder {
    epoch: RingEpoch,
    nodes: BTreeMap<Endpoint, (Node, Vec<Token>)>,
}

impl TokenMetadataBuilder {
    pub fn new(epoch: RingEpoch) -> Self {
        Self {
            epoch,
            nodes: BTreeMap::new(),
        }
    }

    /// Add a node owning `vnodes` tokens derived from its endpoint.
    pub fn add_node(self, node: Node, vnodes: usize) -> Self {
        let tokens = (0..vnodes)
            .map(|i| VirtualNode::from_index(node.endpoint, i).token)
            .collect();
        self.add_node_with_tokens(node, tokens)
    }

    /// Add a node owning exactly `tokens`. Replaces an earlier entry for the
    /// same endpoint.
    pub fn add_node_with_tokens(mut self, node: Node, tokens: Vec<Token>) -> Self {
        self.nodes.insert(node.endpoint, (node, tokens));
        self
    }

    pub fn remove_node(mut self, endpoint: &Endpoint) -> Self {
        self.nodes.remove(endpoint);
        self
    }

    /// Assemble the snapshot. Fails if two endpoints claim the same token.
    pub fn build(self) -> Result<TokenMetadata> {
        let mut ring = TokenRing::new();
        let mut topology = Topology::new();

        for (endpoint, (node, tokens)) in self.nodes {
            if tokens.is_empty() {
                tracing::trace!(%endpoint, "skipping node without tokens");
                continue;
            }
            for token in tokens {
                ring.insert(token, endpoint)?;
            }
            topology.add_node(node);
        }

        tracing::debug!(
            epoch = %self.epoch,
            nodes = topology.node_count(),
            tokens = ring.len(),
            "built token metadata"
        );

        Ok(TokenMetadata {
            ring,
            topology,
            epoch: self.epoch,
        })
    }
}
