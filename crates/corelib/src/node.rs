//! Node abstractions for the replication ring.
//!
//! Nodes are identified by their [`Endpoint`] and carry the datacenter and
//! rack labels used by topology-aware replication.

use serde::{Deserialize, Serialize};

use crate::network::Endpoint;

pub const DEFAULT_DATACENTER: &str = "datacenter1";
pub const DEFAULT_RACK: &str = "rack1";

/// Logical node participating in the ring.
///
/// Keep this struct small and cheap to clone; heavy mutable state (connections,
/// metrics, etc.) should live elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub endpoint: Endpoint,
    /// Data center label for topology-aware replication.
    #[serde(default = "default_datacenter")]
    pub datacenter: String,
    /// Rack label for rack-aware replication.
    #[serde(default = "default_rack")]
    pub rack: String,
}

impl Node {
    /// Construct a node in the default datacenter and rack.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            datacenter: default_datacenter(),
            rack: default_rack(),
        }
    }

    pub fn with_topology(
        endpoint: Endpoint,
        datacenter: impl Into<String>,
        rack: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            datacenter: datacenter.into(),
            rack: rack.into(),
        }
    }
}

fn default_datacenter() -> String {
    DEFAULT_DATACENTER.to_string()
}

fn default_rack() -> String {
    DEFAULT_RACK.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_default_when_missing() {
        let node: Node = serde_json::from_str(r#"{"endpoint":"10.0.0.1"}"#).unwrap();
        assert_eq!(node.datacenter, DEFAULT_DATACENTER);
        assert_eq!(node.rack, DEFAULT_RACK);
    }
}
