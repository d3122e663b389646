//! Everywhere replication strategy.
//!
//! Every node in the snapshot holds every token. The replica order starts at
//! the token's ring owner and continues clockwise, so the primary still
//! follows ring ownership.

use async_trait::async_trait;
use corelib::{EndpointSet, Token, TokenMetadata, Topology};
use std::collections::BTreeSet;

use crate::error::{ReplicationError, Result};
use crate::options::ReplicationOptions;
use crate::strategy::{ReplicationStrategy, ReplicationStrategyType};

#[derive(Debug, Clone, Default)]
pub struct EverywhereStrategy {
    options: ReplicationOptions,
}

impl EverywhereStrategy {
    pub fn new(options: ReplicationOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ReplicationStrategy for EverywhereStrategy {
    async fn calculate_natural_endpoints(
        &self,
        token: Token,
        metadata: &TokenMetadata,
    ) -> Result<EndpointSet> {
        if metadata.is_empty() {
            return Err(ReplicationError::EmptyTopology);
        }
        Ok(metadata.ring().walk(token).map(|(_, endpoint)| endpoint).collect())
    }

    fn validate_options(&self) -> Result<()> {
        Ok(())
    }

    fn recognized_options(&self, _topology: &Topology) -> Option<BTreeSet<String>> {
        Some(BTreeSet::new())
    }

    /// Follows membership: one replica per node in the snapshot.
    fn replication_factor(&self, metadata: &TokenMetadata) -> usize {
        metadata.node_count()
    }

    fn strategy_type(&self) -> ReplicationStrategyType {
        ReplicationStrategyType::Everywhere
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

    #[tokio::test]
    async fn test_every_node_from_owner() {
        let metadata = TokenMetadata::builder(RingEpoch(1))
            .add_node_with_tokens(Node::new(ep(1)), vec![Token(10), Token(40)])
            .add_node_with_tokens(Node::new(ep(2)), vec![Token(20)])
            .add_node_with_tokens(Node::new(ep(3)), vec![Token(30)])
            .build()
            .unwrap();

        let strategy = EverywhereStrategy::default();
        let replicas = strategy
            .calculate_natural_endpoints(Token(15), &metadata)
            .await
            .unwrap();
        assert_eq!(replicas.as_slice(), &[ep(2), ep(3), ep(1)]);
        assert_eq!(strategy.replication_factor(&metadata), 3);
    }

    #[tokio::test]
    async fn test_factor_tracks_membership() {
        let strategy = EverywhereStrategy::default();
        let one = TokenMetadata::builder(RingEpoch(1))
            .add_node(Node::new(ep(1)), 2)
            .build()
            .unwrap();
        let two = one.to_builder().add_node(Node::new(ep(2)), 2).build().unwrap();

        assert_eq!(strategy.replication_factor(&one), 1);
        assert_eq!(strategy.replication_factor(&two), 2);
        assert_eq!(
            strategy
                .calculate_natural_endpoints(Token(0), &TokenMetadata::empty(RingEpoch(1)))
                .await,
            Err(ReplicationError::EmptyTopology)
        );
    }
}
