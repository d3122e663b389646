//! Replication strategy abstractions.
//!
//! Replication strategies determine how many replicas to create and where
//! to place them on the ring. Different strategies optimize for different
//! goals:
//!
//! - **LocalStrategy**: data lives only on the node computing placement
//! - **SimpleStrategy**: N replicas placed sequentially around the ring
//! - **NetworkTopologyStrategy**: replicas placed per datacenter, spread across racks
//! - **EverywhereStrategy**: every node holds every token

pub mod everywhere;
pub mod local;
pub mod network_topology;
pub mod simple;

pub use everywhere::EverywhereStrategy;
pub use local::LocalStrategy;
pub use network_topology::NetworkTopologyStrategy;
pub use simple::SimpleStrategy;

use async_trait::async_trait;
use corelib::{EndpointSet, RingEpoch, Token, TokenMetadata, Topology, TopologyProvider};
use std::collections::BTreeSet;
use std::fmt;

use crate::effective_map::EffectiveReplicationMap;
use crate::error::Result;
use crate::options::ReplicationOptions;

const QUALIFIED_PREFIX: &str = "org.apache.cassandra.locator.";

/// Type tag of a strategy instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReplicationStrategyType {
    Local,
    Simple,
    NetworkTopology,
    Everywhere,
}

impl ReplicationStrategyType {
    pub const ALL: [ReplicationStrategyType; 4] = [
        ReplicationStrategyType::Local,
        ReplicationStrategyType::Simple,
        ReplicationStrategyType::NetworkTopology,
        ReplicationStrategyType::Everywhere,
    ];

    /// Name used in schema definitions, e.g. `SimpleStrategy`.
    pub fn short_name(&self) -> &'static str {
        match self {
            ReplicationStrategyType::Local => "LocalStrategy",
            ReplicationStrategyType::Simple => "SimpleStrategy",
            ReplicationStrategyType::NetworkTopology => "NetworkTopologyStrategy",
            ReplicationStrategyType::Everywhere => "EverywhereStrategy",
        }
    }

    /// Fully qualified name, e.g. `org.apache.cassandra.locator.SimpleStrategy`.
    pub fn qualified_name(&self) -> String {
        format!("{QUALIFIED_PREFIX}{}", self.short_name())
    }
}

impl fmt::Display for ReplicationStrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Trait for replication strategies.
///
/// A strategy instance is an immutable (type tag, options) pair. It never
/// caches topology between calls, so one instance can serve any number of
/// concurrent callers across topology changes.
///
/// # Determinism
///
/// For a fixed strategy, options and snapshot, the endpoint set computed for
/// a token must be identical on every call and on every node. Nodes compute
/// placement independently and rely on agreeing without coordination.
#[async_trait]
pub trait ReplicationStrategy: Send + Sync + fmt::Debug + 'static {
    /// Compute the replicas of `token` on the given snapshot.
    ///
    /// Primary replica first. Fails with
    /// [`EmptyTopology`](crate::ReplicationError::EmptyTopology) when the
    /// snapshot has no eligible nodes. Never performs I/O.
    async fn calculate_natural_endpoints(
        &self,
        token: Token,
        metadata: &TokenMetadata,
    ) -> Result<EndpointSet>;

    /// Check the stored options for internal consistency.
    fn validate_options(&self) -> Result<()>;

    /// Check the options against a topology, e.g. that no replication
    /// factor exceeds the nodes available for it. Run when a schema is
    /// defined; placement itself never fails on a shrunken topology.
    fn validate_for_topology(&self, _topology: &Topology) -> Result<()> {
        Ok(())
    }

    /// Option names this strategy accepts. `None` means any key is allowed;
    /// an empty set means no options are allowed.
    fn recognized_options(&self, topology: &Topology) -> Option<BTreeSet<String>>;

    /// Total number of replicas this strategy targets on `metadata`.
    fn replication_factor(&self, metadata: &TokenMetadata) -> usize;

    /// Synchronous lookup against a materialized map.
    fn get_natural_endpoints(
        &self,
        token: Token,
        map: &EffectiveReplicationMap,
    ) -> Result<EndpointSet> {
        map.replicas_for_ring_token(token)
    }

    fn strategy_type(&self) -> ReplicationStrategyType;

    fn options(&self) -> &ReplicationOptions;

    /// Get the strategy name (for logging/debugging).
    fn name(&self) -> &'static str {
        self.strategy_type().short_name()
    }
}

/// Calculate replicas of `token` once the provider has reached `epoch`.
///
/// Waiting for the epoch is the only point where this suspends.
pub async fn calculate_at_epoch(
    strategy: &dyn ReplicationStrategy,
    provider: &dyn TopologyProvider,
    token: Token,
    epoch: RingEpoch,
) -> Result<EndpointSet> {
    let metadata = provider.wait_for_epoch(epoch).await?;
    strategy.calculate_natural_endpoints(token, &metadata).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let ty = ReplicationStrategyType::NetworkTopology;
        assert_eq!(ty.short_name(), "NetworkTopologyStrategy");
        assert_eq!(
            ty.qualified_name(),
            "org.apache.cassandra.locator.NetworkTopologyStrategy"
        );
        assert_eq!(ty.to_string(), "NetworkTopologyStrategy");
    }
}
