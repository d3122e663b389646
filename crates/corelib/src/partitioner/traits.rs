//! Core partitioner trait definitions.

use crate::token::Token;

/// A partitioner converts partition keys into tokens for placement on the ring.
///
/// Partitioners are stateless and thread-safe, allowing concurrent
/// token generation without synchronization overhead. Every node must use
/// the same partitioner, otherwise they disagree on placement.
pub trait Partitioner: Send + Sync + 'static {
    /// Converts a key into a token.
    fn token_for(&self, key: &[u8]) -> Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}
