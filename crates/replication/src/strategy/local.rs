//! Local replication strategy.
//!
//! Data is held only by the node computing placement. Used for node-local
//! data such as system tables, so the token and the topology are ignored.

use async_trait::async_trait;
use corelib::{broadcast_address, EndpointSet, Token, TokenMetadata, Topology};
use std::collections::BTreeSet;

use crate::effective_map::EffectiveReplicationMap;
use crate::error::Result;
use crate::options::ReplicationOptions;
use crate::strategy::{ReplicationStrategy, ReplicationStrategyType};

/// Replicates to this node's broadcast address only.
#[derive(Debug, Clone, Default)]
pub struct LocalStrategy {
    options: ReplicationOptions,
}

impl LocalStrategy {
    pub fn new(options: ReplicationOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ReplicationStrategy for LocalStrategy {
    async fn calculate_natural_endpoints(
        &self,
        _token: Token,
        _metadata: &TokenMetadata,
    ) -> Result<EndpointSet> {
        Ok(EndpointSet::singleton(broadcast_address()))
    }

    fn validate_options(&self) -> Result<()> {
        Ok(())
    }

    fn recognized_options(&self, _topology: &Topology) -> Option<BTreeSet<String>> {
        // No options are accepted.
        Some(BTreeSet::new())
    }

    fn replication_factor(&self, _metadata: &TokenMetadata) -> usize {
        1
    }

    fn get_natural_endpoints(
        &self,
        _token: Token,
        _map: &EffectiveReplicationMap,
    ) -> Result<EndpointSet> {
        Ok(EndpointSet::singleton(broadcast_address()))
    }

    fn strategy_type(&self) -> ReplicationStrategyType {
        ReplicationStrategyType::Local
    }

    fn options(&self) -> &ReplicationOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Node, RingEpoch};

    #[tokio::test]
    async fn test_ignores_token_and_topology() {
        let strategy = LocalStrategy::default();
        let empty = TokenMetadata::empty(RingEpoch(1));
        let populated = TokenMetadata::builder(RingEpoch(2))
            .add_node(Node::new("10.0.0.1".parse().unwrap()), 4)
            .add_node(Node::new("10.0.0.2".parse().unwrap()), 4)
            .build()
            .unwrap();

        let expected = EndpointSet::singleton(broadcast_address());
        for token in [Token::MIN, Token(12345), Token::MAX] {
            assert_eq!(
                strategy.calculate_natural_endpoints(token, &empty).await.unwrap(),
                expected
            );
            assert_eq!(
                strategy.calculate_natural_endpoints(token, &populated).await.unwrap(),
                expected
            );
        }
        assert_eq!(strategy.replication_factor(&empty), 1);
        assert_eq!(strategy.replication_factor(&populated), 1);
    }

    #[test]
    fn test_accepts_no_options() {
        let strategy = LocalStrategy::default();
        assert!(strategy.validate_options().is_ok());
        assert_eq!(
            strategy.recognized_options(&Topology::new()),
            Some(BTreeSet::new())
        );
    }
}
