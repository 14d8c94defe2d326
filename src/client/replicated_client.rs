use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use tracing::debug;
use tracing::warn;

use super::ClientBuilder;
use crate::utils::ScopedTimer;
use crate::ClientConfig;
use crate::Command;
use crate::ConnectionPool;
use crate::Error;
use crate::NodeAddress;
use crate::NodeDirectory;
use crate::Result;
use crate::WriteMode;

/// Replicated key-value client over a consistent-hash node directory.
///
/// Every key maps to up to `R` candidate nodes (primary first):
/// - [`set`](Self::set) writes to all of them
/// - [`get`](Self::get) reads them in order and returns the first value found
///
/// Replicas are treated as equally authoritative. There is no read repair and
/// no versioning, so a stale replica can be returned without detection.
///
/// Created through [`builder()`](Self::builder). Call [`close()`](Self::close)
/// at shutdown to release pooled connections.
pub struct ReplicatedClient {
    config: ClientConfig,
    directory: Arc<dyn NodeDirectory>,
    pool: ConnectionPool,
}

impl ReplicatedClient {
    /// Create a configured client builder
    ///
    /// # Arguments
    /// * `endpoints` - Bootstrap addresses of the directory service
    /// * `service_name` - Membership group the storage nodes register under
    pub fn builder(
        endpoints: Vec<String>,
        service_name: impl Into<String>,
    ) -> ClientBuilder {
        ClientBuilder::new(endpoints, service_name)
    }

    pub(crate) fn new(
        config: ClientConfig,
        directory: Arc<dyn NodeDirectory>,
        pool: ConnectionPool,
    ) -> Self {
        Self {
            config,
            directory,
            pool,
        }
    }

    pub fn replication_factor(&self) -> usize {
        self.config.replication.factor
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Candidate nodes for `key`, primary first.
    ///
    /// At most `R` distinct addresses; empty when the directory has no
    /// members.
    pub async fn resolve(
        &self,
        key: &str,
    ) -> Result<Vec<NodeAddress>> {
        let factor = self.replication_factor();
        let mut nodes = self.directory.resolve(key, factor).await?;

        let mut seen = HashSet::with_capacity(nodes.len());
        nodes.retain(|node| seen.insert(node.clone()));
        nodes.truncate(factor);
        Ok(nodes)
    }

    /// Writes `value` under `key` to every candidate node.
    ///
    /// Writes go out in candidate order and the first failure aborts the
    /// operation. Writes already sent to earlier candidates are NOT rolled
    /// back: after an error the replicas may disagree until the key is
    /// written again.
    ///
    /// In the default [`WriteMode::FireAndForget`] a successful return only
    /// means every candidate accepted the command on its transport, not that
    /// the write is durable.
    ///
    /// # Errors
    /// - [`Error::NoNodesAvailable`] if the key resolves to no node
    /// - [`Error::Connection`], [`Error::Protocol`] or [`Error::Timeout`] from
    ///   the first failing candidate
    /// - [`Error::Directory`] if resolution itself failed
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<Bytes>,
    ) -> Result<()> {
        let _timer = ScopedTimer::new("client::set");
        let value = value.into();
        let nodes = self.candidates(key).await?;

        if self.config.replication.parallel_writes {
            let writes = nodes.iter().map(|node| self.write_to(node, key, value.clone()));
            // First failure in candidate order, regardless of completion order
            for result in join_all(writes).await {
                result?;
            }
        } else {
            for node in &nodes {
                self.write_to(node, key, value.clone()).await?;
            }
        }
        Ok(())
    }

    /// Reads `key` from the first candidate that has a value.
    ///
    /// Candidates are consulted in order and the first value returned wins;
    /// the remaining candidates are not contacted. A failing candidate, or
    /// one that misses the key, passes the read on to the next one.
    ///
    /// # Returns
    /// - `Ok(Some(value))` from the first candidate holding the key
    /// - `Ok(None)` if no candidate held it and at least one answered with a miss
    ///
    /// # Errors
    /// - [`Error::NoNodesAvailable`] if the key resolves to no node
    /// - the last candidate error, if every candidate failed
    pub async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Bytes>> {
        let _timer = ScopedTimer::new("client::get");
        let nodes = self.candidates(key).await?;

        let mut last_error = None;
        let mut answered_miss = false;
        for node in &nodes {
            match self.read_from(node, key).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {
                    debug!(%node, key, "Key missing on replica, trying next candidate");
                    answered_miss = true;
                }
                Err(e) => {
                    warn!(%node, key, error = %e, "Read from replica failed, trying next candidate");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered_miss => Err(e),
            Some(e) => {
                debug!(key, error = %e, "Replica answered with a miss, discarding read error");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Drops the pooled connection to `node` so the next operation redials.
    /// Returns `true` if one was pooled.
    pub async fn reset_node(
        &self,
        node: &NodeAddress,
    ) -> bool {
        self.pool.reset(node).await
    }

    /// Closes every pooled connection. Idempotent and never fails.
    pub async fn close(&self) {
        debug!(connections = self.pool.len(), "Closing replicated client");
        self.pool.close_all().await;
    }

    async fn candidates(
        &self,
        key: &str,
    ) -> Result<Vec<NodeAddress>> {
        let nodes = self.resolve(key).await?;
        if nodes.is_empty() {
            debug!(key, "No assignment");
            return Err(Error::NoNodesAvailable { key: key.to_string() });
        }
        debug!(key, ?nodes, "Assigned to nodes");
        Ok(nodes)
    }

    async fn write_to(
        &self,
        node: &NodeAddress,
        key: &str,
        value: Bytes,
    ) -> Result<()> {
        let connection = self.pool.get_or_create(node).await?;
        let mut connection = connection.lock().await;
        let acknowledged = self.config.replication.write_mode == WriteMode::Acknowledged;

        self.with_timeout(node, async {
            connection.send(Command::set(key, value)).await?;
            if acknowledged {
                connection.receive().await?.into_ack()?;
            }
            Ok::<_, Error>(())
        })
        .await
    }

    async fn read_from(
        &self,
        node: &NodeAddress,
        key: &str,
    ) -> Result<Option<Bytes>> {
        let connection = self.pool.get_or_create(node).await?;
        let mut connection = connection.lock().await;

        self.with_timeout(node, async {
            connection.send(Command::get(key)).await?;
            let value = connection.receive().await?.into_value()?;
            Ok::<_, Error>(value)
        })
        .await
    }

    async fn with_timeout<T>(
        &self,
        node: &NodeAddress,
        exchange: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.config.network.request_timeout() {
            Some(duration) => tokio::time::timeout(duration, exchange)
                .await
                .map_err(|_| Error::Timeout {
                    node: node.to_string(),
                    duration,
                })?,
            None => exchange.await,
        }
    }
}
