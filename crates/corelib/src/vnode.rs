//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Instead of each physical node having a single token on the ring, each node
//! owns multiple tokens (virtual nodes). This provides:
//!
//! 1. **Better Load Distribution**: More tokens = smoother distribution of keys
//! 2. **Gradual Rebalancing**: When nodes join/leave, only a fraction of keys move
//! 3. **Fault Tolerance**: Failure of one node affects fewer keys
//!
//! Tokens derived here are a pure function of the endpoint and the vnode
//! index, so every node computes the same ring from the same membership.

use crate::network::Endpoint;
use crate::partitioner::{Partitioner, Xxh3Partitioner};
use crate::token::Token;

/// A virtual node on the ring: a single token owned by a physical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: Token,

    /// The physical node that owns this virtual node.
    pub endpoint: Endpoint,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: Token, endpoint: Endpoint) -> Self {
        Self { token, endpoint }
    }

    /// Create a virtual node from an endpoint and vnode index.
    ///
    /// The token is the XXH3 hash of `"endpoint:vnode_index"`.
    ///
    /// # Example
    /// ```rust
    /// use corelib::{Endpoint, VirtualNode};
    ///
    /// let endpoint: Endpoint = "10.0.0.1".parse().unwrap();
    /// let vnode0 = VirtualNode::from_index(endpoint, 0);
    /// let vnode1 = VirtualNode::from_index(endpoint, 1);
    /// assert_ne!(vnode0.token, vnode1.token);
    /// ```
    pub fn from_index(endpoint: Endpoint, vnode_index: usize) -> Self {
        let vnode_key = format!("{}:{}", endpoint, vnode_index);
        Self::new(Xxh3Partitioner.token_for(vnode_key.as_bytes()), endpoint)
    }
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={}, endpoint={})", self.token, self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(last: u8) -> Endpoint {
        Endpoint::from(std::net::Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_vnode_from_index() {
        let vnode0 = VirtualNode::from_index(ep(1), 0);
        let vnode1 = VirtualNode::from_index(ep(1), 1);

        // Should have different tokens
        assert_ne!(vnode0.token, vnode1.token);
        assert_eq!(vnode0.endpoint, vnode1.endpoint);

        // And be reproducible
        assert_eq!(vnode0, VirtualNode::from_index(ep(1), 0));
    }

    #[test]
    fn test_vnode_ordering() {
        let vnode1 = VirtualNode::new(Token(100), ep(2));
        let vnode2 = VirtualNode::new(Token(200), ep(1));
        assert!(vnode1 < vnode2); // Ordered by token first
    }
}
