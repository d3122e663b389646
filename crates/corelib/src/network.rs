//! Core networking abstractions shared across the workspace.
//!
//! Defines node identity on the network ([`Endpoint`]), ordered replica sets
//! ([`EndpointSet`]) and the process-wide broadcast address of this node.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Network identity of a storage node.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(pub IpAddr);

impl Endpoint {
    pub const fn new(addr: IpAddr) -> Self {
        Self(addr)
    }

    pub const fn localhost() -> Self {
        Self(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    pub fn addr(&self) -> IpAddr {
        self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Endpoint {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(Endpoint)
    }
}

impl From<IpAddr> for Endpoint {
    fn from(addr: IpAddr) -> Self {
        Self(addr)
    }
}

impl From<Ipv4Addr> for Endpoint {
    fn from(addr: Ipv4Addr) -> Self {
        Self(IpAddr::V4(addr))
    }
}

/// Replicas responsible for one token.
///
/// Keeps insertion order and never holds the same endpoint twice. The first
/// endpoint is the primary replica, so equality is order-sensitive.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Endpoint>")]
pub struct EndpointSet(Vec<Endpoint>);

impl EndpointSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn singleton(endpoint: Endpoint) -> Self {
        Self(vec![endpoint])
    }

    /// Appends `endpoint` unless already present. Returns whether it was added.
    pub fn insert(&mut self, endpoint: Endpoint) -> bool {
        // Replica sets are small, a linear scan beats hashing here.
        if self.0.contains(&endpoint) {
            return false;
        }
        self.0.push(endpoint);
        true
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.0.contains(endpoint)
    }

    /// The first replica, if any.
    pub fn primary(&self) -> Option<Endpoint> {
        self.0.first().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Endpoint] {
        &self.0
    }
}

impl fmt::Debug for EndpointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for EndpointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, endpoint) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{endpoint}")?;
        }
        write!(f, "]")
    }
}

impl FromIterator<Endpoint> for EndpointSet {
    fn from_iter<I: IntoIterator<Item = Endpoint>>(iter: I) -> Self {
        let mut set = EndpointSet::new();
        for endpoint in iter {
            set.insert(endpoint);
        }
        set
    }
}

impl From<Vec<Endpoint>> for EndpointSet {
    fn from(endpoints: Vec<Endpoint>) -> Self {
        endpoints.into_iter().collect()
    }
}

impl IntoIterator for EndpointSet {
    type Item = Endpoint;
    type IntoIter = std::vec::IntoIter<Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EndpointSet {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

static BROADCAST_ADDRESS: OnceCell<Endpoint> = OnceCell::new();

/// Fixes the address this node advertises to the rest of the cluster.
///
/// May be called more than once with the same address; a different address
/// after the first call (or after the first read) is rejected.
pub fn set_broadcast_address(endpoint: Endpoint) -> Result<()> {
    let current = *BROADCAST_ADDRESS.get_or_init(|| endpoint);
    if current != endpoint {
        return Err(Error::BroadcastAddressConflict {
            current,
            requested: endpoint,
        });
    }
    tracing::debug!(%endpoint, "broadcast address set");
    Ok(())
}

/// The address of this node. Falls back to the IPv4 loopback, which also
/// fixes it for the rest of the process.
pub fn broadcast_address() -> Endpoint {
    *BROADCAST_ADDRESS.get_or_init(Endpoint::localhost)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(last: u8) -> Endpoint {
        Endpoint::from(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_endpoint_set_dedup_keeps_order() {
        let mut set = EndpointSet::new();
        assert!(set.insert(ep(2)));
        assert!(set.insert(ep(1)));
        assert!(!set.insert(ep(2)));

        assert_eq!(set.len(), 2);
        assert_eq!(set.primary(), Some(ep(2)));
        assert_eq!(set.as_slice(), &[ep(2), ep(1)]);
    }

    #[test]
    fn test_endpoint_set_order_matters_for_equality() {
        let a: EndpointSet = [ep(1), ep(2)].into_iter().collect();
        let b: EndpointSet = [ep(2), ep(1)].into_iter().collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_deserialize_drops_duplicates() {
        let set: EndpointSet =
            serde_json::from_str(r#"["10.0.0.2", "10.0.0.1", "10.0.0.2"]"#).unwrap();
        assert_eq!(set.as_slice(), &[ep(2), ep(1)]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["10.0.0.2","10.0.0.1"]"#);
    }

    #[test]
    fn test_endpoint_roundtrip_display() {
        let endpoint: Endpoint = "10.0.0.7".parse().unwrap();
        assert_eq!(endpoint.to_string(), "10.0.0.7");
    }

    #[test]
    fn test_broadcast_address_is_stable() {
        let first = broadcast_address();
        assert_eq!(broadcast_address(), first);
        assert!(set_broadcast_address(first).is_ok());

        let other = if first == ep(99) { ep(98) } else { ep(99) };
        assert!(matches!(
            set_broadcast_address(other),
            Err(Error::BroadcastAddressConflict { .. })
        ));
    }
}
