//! Replication strategies for a token ring.
//!
//! This crate provides pluggable replication strategies that determine which
//! endpoints hold the replicas of a token:
//! - The [`ReplicationStrategy`] contract and its built-in variants
//! - Strategy options and their validation
//! - A name -> factory [`registry`] used to instantiate strategies from schema
//! - [`EffectiveReplicationMap`], an epoch-bound cache of placement for the
//!   read/write path

pub mod effective_map;
pub mod error;
pub mod options;
pub mod registry;
pub mod strategy;

pub use effective_map::{EffectiveReplicationMap, ReplicationMapCache};
pub use error::{ReplicationError, Result};
pub use options::ReplicationOptions;
pub use registry::{RegistryBuilder, StrategyRegistry};
pub use strategy::{
    calculate_at_epoch, EverywhereStrategy, LocalStrategy, NetworkTopologyStrategy,
    ReplicationStrategy, ReplicationStrategyType, SimpleStrategy,
};
