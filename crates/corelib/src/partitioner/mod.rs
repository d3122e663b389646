//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting keys into tokens
//! that can be placed on the ring.

pub mod sip;
pub mod traits;
pub mod xxh3;

pub use sip::SipPartitioner;
pub use traits::Partitioner;
pub use xxh3::Xxh3Partitioner;

/// Looks a partitioner up by the name it reports.
pub fn by_name(name: &str) -> Option<Box<dyn Partitioner>> {
    let known: [Box<dyn Partitioner>; 2] = [Box::new(Xxh3Partitioner), Box::new(SipPartitioner)];
    known.into_iter().find(|partitioner| partitioner.name() == name)
}
