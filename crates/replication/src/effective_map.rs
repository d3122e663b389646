//! Epoch-bound materialization of a strategy's placement.
//!
//! An [`EffectiveReplicationMap`] pairs a strategy with one topology snapshot
//! and precomputes the replicas of every ring token, so hot-path lookups are
//! a range query instead of a ring walk. A map answers only while its epoch
//! is current; callers holding a stale map must fetch a new one, which is
//! what [`ReplicationMapCache`] does.

use corelib::{EndpointSet, RingEpoch, Token, TokenMetadata, TopologyProvider};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ReplicationError, Result};
use crate::strategy::{ReplicationStrategy, ReplicationStrategyType};

pub struct EffectiveReplicationMap {
    strategy: Arc<dyn ReplicationStrategy>,
    provider: Arc<dyn TopologyProvider>,
    metadata: Arc<TokenMetadata>,
    /// Ring token -> replicas of every data token it owns.
    replicas: BTreeMap<Token, EndpointSet>,
    replication_factor: usize,
}

impl EffectiveReplicationMap {
    /// Build a map for the provider's current snapshot.
    pub async fn build(
        strategy: Arc<dyn ReplicationStrategy>,
        provider: Arc<dyn TopologyProvider>,
    ) -> Result<Self> {
        let metadata = provider.current();
        Self::build_for(strategy, provider, metadata).await
    }

    /// Build a map once the provider has reached `epoch`.
    pub async fn build_at_epoch(
        strategy: Arc<dyn ReplicationStrategy>,
        provider: Arc<dyn TopologyProvider>,
        epoch: RingEpoch,
    ) -> Result<Self> {
        let metadata = provider.wait_for_epoch(epoch).await?;
        Self::build_for(strategy, provider, metadata).await
    }

    async fn build_for(
        strategy: Arc<dyn ReplicationStrategy>,
        provider: Arc<dyn TopologyProvider>,
        metadata: Arc<TokenMetadata>,
    ) -> Result<Self> {
        let mut replicas = BTreeMap::new();
        for token in metadata.sorted_tokens() {
            let endpoints = strategy.calculate_natural_endpoints(token, &metadata).await?;
            replicas.insert(token, endpoints);
        }

        let replication_factor = strategy.replication_factor(&metadata);
        if strategy.strategy_type() != ReplicationStrategyType::Local
            && !metadata.is_empty()
            && replication_factor > metadata.node_count()
        {
            tracing::warn!(
                strategy = strategy.name(),
                replication_factor,
                nodes = metadata.node_count(),
                "replication factor exceeds the number of nodes"
            );
        }

        tracing::debug!(
            strategy = strategy.name(),
            epoch = %metadata.epoch(),
            ring_tokens = replicas.len(),
            "built effective replication map"
        );

        Ok(Self {
            strategy,
            provider,
            metadata,
            replicas,
            replication_factor,
        })
    }

    pub fn epoch(&self) -> RingEpoch {
        self.metadata.epoch()
    }

    pub fn token_metadata(&self) -> &Arc<TokenMetadata> {
        &self.metadata
    }

    pub fn strategy(&self) -> &Arc<dyn ReplicationStrategy> {
        &self.strategy
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    /// False once the provider has moved past this map's epoch.
    pub fn is_current(&self) -> bool {
        self.provider.current_epoch() <= self.epoch()
    }

    /// Replicas of `token`. Never suspends.
    ///
    /// Fails with [`ReplicationError::StaleReplicationMap`] once the bound
    /// epoch has been superseded.
    pub fn get_natural_endpoints(&self, token: Token) -> Result<EndpointSet> {
        let current = self.provider.current_epoch();
        if current > self.epoch() {
            return Err(ReplicationError::StaleReplicationMap {
                bound: self.epoch(),
                current,
            });
        }
        self.strategy.get_natural_endpoints(token, self)
    }

    /// Precomputed replicas of the ring token owning `token`.
    pub fn replicas_for_ring_token(&self, token: Token) -> Result<EndpointSet> {
        self.metadata
            .ring()
            .first_token(token)
            .and_then(|ring_token| self.replicas.get(&ring_token))
            .cloned()
            .ok_or(ReplicationError::EmptyTopology)
    }
}

impl fmt::Debug for EffectiveReplicationMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveReplicationMap")
            .field("strategy", &self.strategy)
            .field("epoch", &self.epoch())
            .field("ring_tokens", &self.replicas.len())
            .field("replication_factor", &self.replication_factor)
            .finish()
    }
}

/// Keeps the current map for one strategy, rebuilding it when the ring epoch
/// moves on.
pub struct ReplicationMapCache {
    strategy: Arc<dyn ReplicationStrategy>,
    provider: Arc<dyn TopologyProvider>,
    current: Mutex<Option<Arc<EffectiveReplicationMap>>>,
}

impl ReplicationMapCache {
    pub fn new(strategy: Arc<dyn ReplicationStrategy>, provider: Arc<dyn TopologyProvider>) -> Self {
        Self {
            strategy,
            provider,
            current: Mutex::new(None),
        }
    }

    /// The map for the current epoch.
    ///
    /// Concurrent callers racing a rebuild may each build a map; the one with
    /// the newest epoch is kept.
    pub async fn get(&self) -> Result<Arc<EffectiveReplicationMap>> {
        let cached = self.current.lock().clone();
        if let Some(map) = cached {
            if map.is_current() {
                return Ok(map);
            }
        }

        let map = Arc::new(
            EffectiveReplicationMap::build(Arc::clone(&self.strategy), Arc::clone(&self.provider))
                .await?,
        );
        metrics::counter!("replication_map_rebuilds_total").increment(1);

        let mut slot = self.current.lock();
        if let Some(existing) = slot.as_ref() {
            if existing.epoch() >= map.epoch() {
                return Ok(Arc::clone(existing));
            }
        }
        *slot = Some(Arc::clone(&map));
        Ok(map)
    }
}

impl fmt::Debug for ReplicationMapCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationMapCache")
            .field("strategy", &self.strategy)
            .field("epoch", &self.current.lock().as_ref().map(|m| m.epoch()))
            .finish()
    }
}
