//! Simple replication strategy.
//!
//! Places N replicas sequentially around the ring (clockwise from the primary).
//! This is the simplest replication strategy and works well for:
//!
//! - Small clusters
//! - Single data center deployments
//! - When network topology doesn't matter
//!
//! # Algorithm
//!
//! 1. Find the ring token owning the key's token (first ring token at or after it)
//! 2. Continue clockwise, skipping endpoints already chosen, until N distinct
//!    endpoints are found or the ring is exhausted
//! 3. Return the endpoints in walk order (primary first)
//!
//! # Performance
//!
//! - **Time**: O(log n + t) where n = ring tokens, t = tokens walked
//! - **Space**: O(r) for the returned set
//!
//! # Limitations
//!
//! - Doesn't consider data center/rack placement
//! - May place replicas on nodes in the same failure domain

use async_trait::async_trait;
use corelib::{EndpointSet, Token, TokenMetadata, Topology};
use std::collections::BTreeSet;

use crate::error::{ReplicationError, Result};
use crate::options::{parse_replication_factor, ReplicationOptions};
use crate::strategy::{ReplicationStrategy, ReplicationStrategyType};

pub const REPLICATION_FACTOR: &str = "replication_factor";

/// Simple replication strategy: N replicas placed sequentially around the ring.
///
/// # Example
///
/// ```rust
/// use replication::{ReplicationStrategy, SimpleStrategy};
///
/// let strategy = SimpleStrategy::with_replication_factor(3).unwrap();
/// assert_eq!(strategy.options().get("replication_factor"), Some("3"));
/// assert!(SimpleStrategy::with_replication_factor(0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SimpleStrategy {
    options: ReplicationOptions,
    /// Number of replicas to create (including primary).
    replication_factor: usize,
}

impl SimpleStrategy {
    /// Build from options. `replication_factor` is required and must be
    /// positive.
    pub fn new(options: ReplicationOptions) -> Result<Self> {
        let value = options.get(REPLICATION_FACTOR).ok_or_else(|| {
            ReplicationError::InvalidConfiguration(format!(
                "{} requires the '{REPLICATION_FACTOR}' option",
                ReplicationStrategyType::Simple
            ))
        })?;
        let replication_factor = parse_replication_factor(REPLICATION_FACTOR, value)?;

        let strategy = Self {
            options,
            replication_factor,
        };
        strategy.validate_options()?;
        Ok(strategy)
    }

    /// Create a strategy with the given replication factor.
    pub fn with_replication_factor(replication_factor: usize) -> Result<Self> {
        Self::new(
            [(REPLICATION_FACTOR, replication_factor.to_string())]
                .into_iter()
                .collect(),
        )
    }

    fn calculate(&self, token: Token, metadata: &TokenMetadata) -> Result<EndpointSet> {
        if metadata.is_empty() {
            return Err(ReplicationError::EmptyTopology);
        }

        let wanted = self.replication_factor.min(metadata.node_count());
        let mut replicas = EndpointSet::with_capacity(wanted);

        for (_, endpoint) in metadata.ring().walk(token) {
            if replicas.len() >= wanted {
                break;
            }
            replicas.insert(endpoint);
        }

        tracing::trace!(%token, replicas = %replicas, "simple placement");
        Ok(replicas)
    }
}

#[async_trait]
impl ReplicationStrategy for SimpleStrategy {
    async fn calculate_natural_endpoints(
        &self,
        token: Token,
        metadata: &TokenMetadata,
    ) -> Result<EndpointSet> {
        self.calculate(token, metadata)
    }

    fn validate_options(&self) -> Result<()> {
        if self.replication_factor == 0 {
            return Err(ReplicationError::InvalidConfiguration(format!(
                "{REPLICATION_FACTOR} must be at least 1"
            )));
        }
        Ok(())
    }

    fn validate_for_topology(&self, topology: &Topology) -> Result<()> {
        let nodes = topology.node_count();
        if self.replication_factor > nodes {
            return Err(ReplicationError::InvalidConfiguration(format!(
                "{REPLICATION_FACTOR} {} exceeds the {nodes} nodes of the cluster",
                self.replication_factor
            )));
        }
        Ok(())
    }

    fn recognized_options(&self, _topology: &Topology) -> Option<BTreeSet<String>> {
        Some(BTreeSet::from([REPLICATION_FACTOR.to_string()]))
    }

    fn replication_factor(&self, _metadata: &TokenMetadata) -> usize {
        self.replication_factor
    }

    fn strategy_type(&self) -> ReplicationStrategyType {
        ReplicationStrategyType::Simple
    }

    fn options(&self) -> &ReplicationOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Endpoint, Node, RingEpoch};

    fn ep(last: u8) -> Endpoint {
        Endpoint::from(std::net::Ipv4Addr::new(10, 0, 0, last))
    }

    /// Ring: 100 -> .1, 200 -> .2, 300 -> .3, 400 -> .1
    fn metadata() -> TokenMetadata {
        TokenMetadata::builder(RingEpoch(1))
            .add_node_with_tokens(Node::new(ep(1)), vec![Token(100), Token(400)])
            .add_node_with_tokens(Node::new(ep(2)), vec![Token(200)])
            .add_node_with_tokens(Node::new(ep(3)), vec![Token(300)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_simple_strategy_replication_factor() {
        let strategy = SimpleStrategy::with_replication_factor(3).unwrap();
        assert_eq!(strategy.replication_factor(&metadata()), 3);
        assert_eq!(strategy.options().get(REPLICATION_FACTOR), Some("3"));
    }

    #[tokio::test]
    async fn test_walks_clockwise_skipping_seen_nodes() {
        let strategy = SimpleStrategy::with_replication_factor(3).unwrap();
        let replicas = strategy
            .calculate_natural_endpoints(Token(350), &metadata())
            .await
            .unwrap();
        // 400 -> .1, wrap to 100 -> .1 (skipped), 200 -> .2, 300 -> .3
        assert_eq!(replicas.as_slice(), &[ep(1), ep(2), ep(3)]);
    }

    #[tokio::test]
    async fn test_primary_is_ring_owner() {
        let strategy = SimpleStrategy::with_replication_factor(2).unwrap();
        let metadata = metadata();
        for token in [Token(0), Token(150), Token(250), Token(401)] {
            let replicas = strategy.calculate_natural_endpoints(token, &metadata).await.unwrap();
            assert_eq!(replicas.primary(), metadata.owner(token));
            assert_eq!(replicas.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_factor_above_node_count_returns_every_node() {
        let strategy = SimpleStrategy::with_replication_factor(5).unwrap();
        let replicas = strategy
            .calculate_natural_endpoints(Token(1), &metadata())
            .await
            .unwrap();
        assert_eq!(replicas.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_topology() {
        let strategy = SimpleStrategy::with_replication_factor(1).unwrap();
        let result = strategy
            .calculate_natural_endpoints(Token(1), &TokenMetadata::empty(RingEpoch(1)))
            .await;
        assert_eq!(result, Err(ReplicationError::EmptyTopology));
    }

    #[test]
    fn test_option_validation() {
        let missing = SimpleStrategy::new(ReplicationOptions::new());
        assert!(matches!(missing, Err(ReplicationError::InvalidConfiguration(_))));

        let garbage = SimpleStrategy::new([(REPLICATION_FACTOR, "abc")].into_iter().collect());
        assert!(matches!(garbage, Err(ReplicationError::InvalidConfiguration(_))));

    }

    #[test]
    fn test_factor_checked_against_node_count() {
        let metadata = metadata();
        let three = SimpleStrategy::with_replication_factor(3).unwrap();
        assert!(three.validate_for_topology(metadata.topology()).is_ok());

        let four = SimpleStrategy::with_replication_factor(4).unwrap();
        assert!(matches!(
            four.validate_for_topology(metadata.topology()),
            Err(ReplicationError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_factor_rejected_at_construction() {
        let zero = SimpleStrategy::new([(REPLICATION_FACTOR, "0")].into_iter().collect());
        assert!(matches!(zero, Err(ReplicationError::InvalidConfiguration(_))));
        assert!(matches!(
            SimpleStrategy::with_replication_factor(0),
            Err(ReplicationError::InvalidConfiguration(_))
        ));

        // The smallest accepted factor still yields a replica on a populated ring.
        let one = SimpleStrategy::new([(REPLICATION_FACTOR, "1")].into_iter().collect()).unwrap();
        let replicas = one
            .calculate_natural_endpoints(Token(5), &metadata())
            .await
            .unwrap();
        assert_eq!(replicas.len(), 1);
    }
}
