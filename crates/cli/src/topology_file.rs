//! JSON description of a ring, loaded into a [`TokenMetadata`] snapshot.
//!
//! ```json
//! {
//!   "epoch": 3,
//!   "nodes": [
//!     { "endpoint": "10.0.0.1", "datacenter": "dc1", "rack": "r1", "vnodes": 16 },
//!     { "endpoint": "10.0.0.2", "datacenter": "dc1", "rack": "r2", "tokens": [100, 200] }
//!   ]
//! }
//! ```

use anyhow::Context;
use corelib::{Node, RingEpoch, Token, TokenMetadata};
use serde::Deserialize;
use std::path::Path;

/// Vnodes given to a node listing neither `tokens` nor `vnodes`.
pub const DEFAULT_VNODES: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub epoch: RingEpoch,
    pub nodes: Vec<NodeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeEntry {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default)]
    pub tokens: Vec<Token>,
    pub vnodes: Option<usize>,
}

impl TopologyFile {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parsing topology")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading topology file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    pub fn into_metadata(self) -> anyhow::Result<TokenMetadata> {
        let mut builder = TokenMetadata::builder(self.epoch);
        for entry in self.nodes {
            builder = if entry.tokens.is_empty() {
                builder.add_node(entry.node, entry.vnodes.unwrap_or(DEFAULT_VNODES))
            } else {
                builder.add_node_with_tokens(entry.node, entry.tokens)
            };
        }
        builder.build().context("building token metadata")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_vnodes_and_defaults() {
        let file = TopologyFile::from_json(
            r#"{
                "epoch": 7,
                "nodes": [
                    { "endpoint": "10.0.0.1", "datacenter": "dc1", "rack": "r1", "vnodes": 3 },
                    { "endpoint": "10.0.0.2", "tokens": [5, 10] },
                    { "endpoint": "10.0.0.3" }
                ]
            }"#,
        )
        .unwrap();

        let metadata = file.into_metadata().unwrap();
        assert_eq!(metadata.epoch(), RingEpoch(7));
        assert_eq!(metadata.node_count(), 3);
        assert_eq!(metadata.ring().len(), 3 + 2 + DEFAULT_VNODES);

        let second = "10.0.0.2".parse().unwrap();
        assert_eq!(metadata.topology().datacenter_of(&second), Some("datacenter1"));
        assert_eq!(metadata.ring().tokens_of(&second), vec![Token(5), Token(10)]);
    }

    #[test]
    fn test_colliding_tokens_fail() {
        let file = TopologyFile::from_json(
            r#"{ "nodes": [
                { "endpoint": "10.0.0.1", "tokens": [5] },
                { "endpoint": "10.0.0.2", "tokens": [5] }
            ] }"#,
        )
        .unwrap();
        assert!(file.into_metadata().is_err());
    }
}
