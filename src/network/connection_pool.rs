use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::Connector;
use super::NodeConnection;
use crate::NodeAddress;
use crate::Result;

/// A pooled connection.
///
/// The mutex serializes whole send/receive exchanges, so concurrent callers
/// never interleave request/reply pairs on one stream.
pub type PooledConnection = Arc<Mutex<Box<dyn NodeConnection>>>;

/// Lazily dialed connections, at most one per node address.
///
/// A connection that failed is NOT evicted implicitly: callers see the error
/// and the next operation reuses the same handle until [`reset`](Self::reset)
/// is called for that node.
pub struct ConnectionPool {
    connector: Arc<dyn Connector>,
    connections: DashMap<NodeAddress, PooledConnection>,
}

impl ConnectionPool {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            connections: DashMap::new(),
        }
    }

    /// Returns the cached connection for `node`, dialing it on first use.
    ///
    /// The dial happens outside any map guard. If two callers race to create
    /// the same entry, the first one stored wins and the loser's freshly
    /// dialed connection is closed.
    pub async fn get_or_create(
        &self,
        node: &NodeAddress,
    ) -> Result<PooledConnection> {
        if let Some(entry) = self.connections.get(node) {
            trace!(%node, "Reusing pooled connection");
            return Ok(entry.value().clone());
        }

        let connection: PooledConnection = Arc::new(Mutex::new(self.connector.connect(node).await?));

        let duplicate = match self.connections.entry(node.clone()) {
            Entry::Occupied(existing) => (existing.get().clone(), Some(connection)),
            Entry::Vacant(slot) => {
                debug!(%node, "Connection added to pool");
                (slot.insert(connection).value().clone(), None)
            }
        };

        let (pooled, loser) = duplicate;
        if let Some(loser) = loser {
            debug!(%node, "Lost connection race, closing duplicate");
            if let Err(e) = loser.lock().await.close().await {
                warn!(%node, error = %e, "Failed to close duplicate connection");
            }
        }
        Ok(pooled)
    }

    /// Closes every pooled connection and empties the pool.
    ///
    /// Idempotent. Close failures are logged and ignored.
    pub async fn close_all(&self) {
        let nodes: Vec<NodeAddress> = self.connections.iter().map(|entry| entry.key().clone()).collect();
        for node in nodes {
            self.reset(&node).await;
        }
    }

    /// Evicts and closes the connection to `node`, if any.
    /// The next operation against `node` dials again.
    ///
    /// Returns `true` if a connection was removed.
    pub async fn reset(
        &self,
        node: &NodeAddress,
    ) -> bool {
        let Some((node, connection)) = self.connections.remove(node) else {
            return false;
        };
        debug!(%node, "Closing pooled connection");
        if let Err(e) = connection.lock().await.close().await {
            warn!(%node, error = %e, "Failed to close connection");
        }
        true
    }

    /// Health of the pooled connection to `node`, `None` if not pooled
    pub async fn is_healthy(
        &self,
        node: &NodeAddress,
    ) -> Option<bool> {
        let connection = self.connections.get(node).map(|entry| entry.value().clone())?;
        let healthy = connection.lock().await.is_healthy();
        Some(healthy)
    }

    pub fn contains(
        &self,
        node: &NodeAddress,
    ) -> bool {
        self.connections.contains_key(node)
    }

    pub fn nodes(&self) -> Vec<NodeAddress> {
        self.connections.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
