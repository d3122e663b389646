//! Live source of topology snapshots.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::topology::{RingEpoch, TokenMetadata};

/// Read-only access to the current topology snapshot.
///
/// Snapshots are never mutated; a membership change publishes a new one with
/// a higher epoch.
#[async_trait]
pub trait TopologyProvider: Send + Sync {
    /// The snapshot current right now.
    fn current(&self) -> Arc<TokenMetadata>;

    /// Epoch of [`TopologyProvider::current`]. Must be cheap, it is checked on
    /// every replica lookup.
    fn current_epoch(&self) -> RingEpoch;

    /// Resolve once a snapshot at `epoch` or later is current.
    async fn wait_for_epoch(&self, epoch: RingEpoch) -> Result<Arc<TokenMetadata>>;
}

/// In-process provider backed by a `tokio::sync::watch` channel.
#[derive(Debug)]
pub struct SharedTopology {
    tx: watch::Sender<Arc<TokenMetadata>>,
}

impl SharedTopology {
    pub fn new(initial: TokenMetadata) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Make `metadata` the current snapshot. Its epoch must be newer than the
    /// current one.
    pub fn publish(&self, metadata: TokenMetadata) -> Result<()> {
        let published = metadata.epoch();
        let mut result = Ok(());
        self.tx.send_if_modified(|current| {
            if published <= current.epoch() {
                result = Err(Error::StaleEpoch {
                    current: current.epoch(),
                    published,
                });
                return false;
            }
            *current = Arc::new(metadata);
            true
        });
        if result.is_ok() {
            tracing::debug!(epoch = %published, "published topology snapshot");
        }
        result
    }
}

#[async_trait]
impl TopologyProvider for SharedTopology {
    fn current(&self) -> Arc<TokenMetadata> {
        Arc::clone(&self.tx.borrow())
    }

    fn current_epoch(&self) -> RingEpoch {
        self.tx.borrow().epoch()
    }

    async fn wait_for_epoch(&self, epoch: RingEpoch) -> Result<Arc<TokenMetadata>> {
        let mut rx = self.tx.subscribe();
        let metadata = rx
            .wait_for(|metadata| metadata.epoch() >= epoch)
            .await
            .map_err(|_| Error::TopologyClosed)?;
        Ok(Arc::clone(&metadata))
    }
}
