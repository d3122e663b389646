//! Datacenter and rack aware replication strategy.
//!
//! Options map each datacenter name to its replication factor. Within a
//! datacenter, replicas go to distinct racks first; nodes sharing an already
//! used rack are held back and only fill the remaining slots once every rack
//! of that datacenter has received a replica.
//!
//! The ring is walked once, clockwise from the token's owner, so the result
//! order is the order in which replicas were accepted.

use async_trait::async_trait;
use corelib::{Endpoint, EndpointSet, Token, TokenMetadata, Topology};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ReplicationError, Result};
use crate::options::{parse_replication_factor, ReplicationOptions};
use crate::strategy::{ReplicationStrategy, ReplicationStrategyType};

/// Per-datacenter replication with replicas spread across racks.
///
/// # Example
///
/// ```rust
/// use replication::{NetworkTopologyStrategy, ReplicationStrategy};
///
/// let options = [("dc1", "3"), ("dc2", "2")].into_iter().collect();
/// let strategy = NetworkTopologyStrategy::new(options).unwrap();
/// assert_eq!(strategy.options().get("dc2"), Some("2"));
/// ```
#[derive(Debug, Clone)]
pub struct NetworkTopologyStrategy {
    options: ReplicationOptions,
    datacenters: BTreeMap<String, usize>,
}

/// Placement progress inside one datacenter during a ring walk.
#[derive(Default)]
struct DatacenterState<'a> {
    wanted: usize,
    placed: usize,
    racks_total: usize,
    racks_seen: BTreeSet<&'a str>,
    skipped: Vec<Endpoint>,
}

impl DatacenterState<'_> {
    fn done(&self) -> bool {
        self.placed >= self.wanted
    }

    fn all_racks_seen(&self) -> bool {
        self.racks_seen.len() >= self.racks_total
    }

    fn place(&mut self, endpoint: Endpoint, replicas: &mut EndpointSet) {
        if !self.done() && replicas.insert(endpoint) {
            self.placed += 1;
        }
    }
}

impl NetworkTopologyStrategy {
    /// Build from `datacenter -> replication factor` options. At least one
    /// factor must be positive.
    pub fn new(options: ReplicationOptions) -> Result<Self> {
        let datacenters = options
            .iter()
            .map(|(dc, value)| -> Result<(String, usize)> {
                Ok((dc.to_string(), parse_replication_factor(dc, value)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let strategy = Self {
            options,
            datacenters,
        };
        strategy.validate_options()?;
        Ok(strategy)
    }

    fn calculate(&self, token: Token, metadata: &TokenMetadata) -> Result<EndpointSet> {
        let topology = metadata.topology();

        let mut states: BTreeMap<&str, DatacenterState<'_>> = self
            .datacenters
            .iter()
            .map(|(dc, rf)| {
                let state = DatacenterState {
                    wanted: (*rf).min(topology.datacenter_size(dc)),
                    racks_total: topology.rack_count(dc),
                    ..DatacenterState::default()
                };
                (dc.as_str(), state)
            })
            .filter(|(_, state)| state.wanted > 0)
            .collect();

        // Options hold a positive factor, so zero means none of the
        // configured datacenters has nodes in this snapshot.
        let total: usize = states.values().map(|s| s.wanted).sum();
        if total == 0 {
            return Err(ReplicationError::EmptyTopology);
        }

        let mut replicas = EndpointSet::with_capacity(total);

        for (_, endpoint) in metadata.ring().walk(token) {
            if replicas.len() >= total {
                break;
            }
            if replicas.contains(&endpoint) {
                continue;
            }
            let Some(node) = topology.get(&endpoint) else {
                continue;
            };
            let Some(state) = states.get_mut(node.datacenter.as_str()) else {
                continue;
            };
            if state.done() {
                continue;
            }

            if state.all_racks_seen() {
                state.place(endpoint, &mut replicas);
            } else if state.racks_seen.contains(node.rack.as_str()) {
                if !state.skipped.contains(&endpoint) {
                    state.skipped.push(endpoint);
                }
            } else {
                state.racks_seen.insert(node.rack.as_str());
                state.place(endpoint, &mut replicas);

                if state.all_racks_seen() {
                    for held in std::mem::take(&mut state.skipped) {
                        state.place(held, &mut replicas);
                    }
                }
            }
        }

        tracing::trace!(%token, replicas = %replicas, "network topology placement");
        Ok(replicas)
    }
}

#[async_trait]
impl ReplicationStrategy for NetworkTopologyStrategy {
    async fn calculate_natural_endpoints(
        &self,
        token: Token,
        metadata: &TokenMetadata,
    ) -> Result<EndpointSet> {
        self.calculate(token, metadata)
    }

    fn validate_options(&self) -> Result<()> {
        if self.datacenters.values().all(|rf| *rf == 0) {
            return Err(ReplicationError::InvalidConfiguration(format!(
                "{} needs a positive replication factor for at least one datacenter",
                ReplicationStrategyType::NetworkTopology
            )));
        }
        Ok(())
    }

    fn validate_for_topology(&self, topology: &Topology) -> Result<()> {
        for (datacenter, rf) in &self.datacenters {
            let size = topology.datacenter_size(datacenter);
            if *rf > size {
                return Err(ReplicationError::InvalidConfiguration(format!(
                    "{datacenter}: replication factor {rf} exceeds the {size} nodes of the datacenter"
                )));
            }
        }
        Ok(())
    }

    /// Only datacenters that currently exist may be named.
    fn recognized_options(&self, topology: &Topology) -> Option<BTreeSet<String>> {
        Some(topology.datacenters().map(str::to_string).collect())
    }

    fn replication_factor(&self, _metadata: &TokenMetadata) -> usize {
        self.datacenters.values().sum()
    }

    fn strategy_type(&self) -> ReplicationStrategyType {
        ReplicationStrategyType::NetworkTopology
    }

    fn options(&self) -> &ReplicationOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Node, RingEpoch};

    fn ep(last: u8) -> Endpoint {
        Endpoint::from(std::net::Ipv4Addr::new(10, 0, 0, last))
    }

    fn strategy(pairs: &[(&str, &str)]) -> NetworkTopologyStrategy {
        NetworkTopologyStrategy::new(pairs.iter().copied().collect()).unwrap()
    }

    /// dc1: .1 r1 @100, .2 r1 @200, .3 r2 @300
    /// dc2: .4 r1 @150, .5 r1 @250
    fn metadata() -> TokenMetadata {
        TokenMetadata::builder(RingEpoch(1))
            .add_node_with_tokens(Node::with_topology(ep(1), "dc1", "r1"), vec![Token(100)])
            .add_node_with_tokens(Node::with_topology(ep(2), "dc1", "r1"), vec![Token(200)])
            .add_node_with_tokens(Node::with_topology(ep(3), "dc1", "r2"), vec![Token(300)])
            .add_node_with_tokens(Node::with_topology(ep(4), "dc2", "r1"), vec![Token(150)])
            .add_node_with_tokens(Node::with_topology(ep(5), "dc2", "r1"), vec![Token(250)])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_prefers_distinct_racks() {
        let strategy = strategy(&[("dc1", "2")]);
        let replicas = strategy
            .calculate_natural_endpoints(Token(50), &metadata())
            .await
            .unwrap();
        // .2 shares r1 with .1 and is held back; .3 on r2 is taken instead.
        assert_eq!(replicas.as_slice(), &[ep(1), ep(3)]);
    }

    #[tokio::test]
    async fn test_fills_from_skipped_once_racks_exhausted() {
        let strategy = strategy(&[("dc1", "3")]);
        let replicas = strategy
            .calculate_natural_endpoints(Token(50), &metadata())
            .await
            .unwrap();
        assert_eq!(replicas.as_slice(), &[ep(1), ep(3), ep(2)]);
    }

    #[tokio::test]
    async fn test_per_datacenter_counts() {
        let strategy = strategy(&[("dc1", "2"), ("dc2", "1")]);
        let replicas = strategy
            .calculate_natural_endpoints(Token(50), &metadata())
            .await
            .unwrap();
        assert_eq!(replicas.as_slice(), &[ep(1), ep(4), ep(3)]);
        assert_eq!(strategy.replication_factor(&metadata()), 3);
    }

    #[tokio::test]
    async fn test_factor_capped_at_datacenter_size() {
        let strategy = strategy(&[("dc2", "5")]);
        let replicas = strategy
            .calculate_natural_endpoints(Token(0), &metadata())
            .await
            .unwrap();
        assert_eq!(replicas.len(), 2);
        assert!(replicas.iter().all(|e| *e == ep(4) || *e == ep(5)));
    }

    #[tokio::test]
    async fn test_empty_topology() {
        let strategy = strategy(&[("dc1", "3")]);
        let result = strategy
            .calculate_natural_endpoints(Token(0), &TokenMetadata::empty(RingEpoch(1)))
            .await;
        assert_eq!(result, Err(ReplicationError::EmptyTopology));
    }

    #[tokio::test]
    async fn test_unknown_datacenter_only_has_no_eligible_nodes() {
        let strategy = strategy(&[("dc9", "3")]);
        let result = strategy
            .calculate_natural_endpoints(Token(0), &metadata())
            .await;
        assert_eq!(result, Err(ReplicationError::EmptyTopology));
    }

    #[test]
    fn test_option_validation() {
        let build = |pairs: &[(&str, &str)]| {
            NetworkTopologyStrategy::new(pairs.iter().copied().collect())
        };
        assert!(matches!(
            build(&[("dc1", "x")]),
            Err(ReplicationError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            build(&[("dc1", "0")]),
            Err(ReplicationError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            build(&[]),
            Err(ReplicationError::InvalidConfiguration(_))
        ));
        assert!(build(&[("dc1", "0"), ("dc2", "1")]).is_ok());
    }

    #[test]
    fn test_factor_checked_against_datacenter_size() {
        let metadata = metadata();
        assert!(strategy(&[("dc1", "3"), ("dc2", "2")])
            .validate_for_topology(metadata.topology())
            .is_ok());
        assert!(matches!(
            strategy(&[("dc2", "3")]).validate_for_topology(metadata.topology()),
            Err(ReplicationError::InvalidConfiguration(reason)) if reason.contains("dc2")
        ));
    }

    #[test]
    fn test_recognized_options_are_known_datacenters() {
        let recognized = strategy(&[("dc1", "1")]).recognized_options(metadata().topology());
        assert_eq!(
            recognized,
            Some(BTreeSet::from(["dc1".to_string(), "dc2".to_string()]))
        );
    }
}
