//! Error types for the core library.

use crate::network::Endpoint;
use crate::token::Token;
use crate::topology::RingEpoch;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid token value
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Two different endpoints claim the same ring token.
    #[error("token {token} claimed by both {existing} and {claimant}")]
    TokenCollision {
        token: Token,
        existing: Endpoint,
        claimant: Endpoint,
    },

    /// A published snapshot does not advance the ring epoch.
    #[error("stale ring epoch: current is {current}, got {published}")]
    StaleEpoch {
        current: RingEpoch,
        published: RingEpoch,
    },

    /// The broadcast address was already fixed to another value.
    #[error("broadcast address already set to {current}, refusing {requested}")]
    BroadcastAddressConflict {
        current: Endpoint,
        requested: Endpoint,
    },

    /// The topology publisher went away while a caller waited on it.
    #[error("topology provider closed")]
    TopologyClosed,
}
