//! Error types for replication strategies.

use corelib::RingEpoch;

/// Result type alias for the replication crate.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Errors raised while configuring strategies or computing placement.
///
/// None of these are retried internally: they point at a configuration
/// mistake or a cluster with no eligible nodes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicationError {
    /// Malformed or contradictory strategy options.
    #[error("invalid replication configuration: {0}")]
    InvalidConfiguration(String),

    /// An option the strategy does not accept.
    #[error("unrecognized strategy option '{option}' for {strategy}")]
    UnrecognizedOption { strategy: String, option: String },

    /// No factory is registered under the requested name.
    #[error("unknown replication strategy: {0}")]
    UnknownStrategy(String),

    /// Placement was requested against a topology without eligible nodes.
    #[error("no replicas available: topology has no eligible nodes")]
    EmptyTopology,

    /// Two strategies tried to claim the same name.
    #[error("replication strategy name already registered: {0}")]
    DuplicateStrategy(String),

    /// The process-wide registry was already installed or read.
    #[error("strategy registry is already initialized")]
    RegistryFrozen,

    /// The map was built for a ring epoch that has since been superseded.
    #[error("replication map bound to epoch {bound} is stale, current epoch is {current}")]
    StaleReplicationMap { bound: RingEpoch, current: RingEpoch },

    /// Topology layer failure.
    #[error("topology error: {0}")]
    Topology(#[from] corelib::Error),
}
