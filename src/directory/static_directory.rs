use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tracing::debug;
use tracing::info;

use super::HashRing;
use super::NodeAddress;
use super::NodeDirectory;
use crate::DirectoryError;
use crate::Result;

/// In-process directory over a static member list.
///
/// `connect` treats the seed endpoints as the members themselves. Membership
/// can still change at runtime through [`join`](Self::join) and
/// [`leave`](Self::leave); each change publishes a new ring snapshot, so a
/// concurrent `resolve` always sees one consistent membership view.
pub struct StaticDirectory {
    virtual_nodes: usize,
    service_name: RwLock<Option<String>>,
    ring: ArcSwap<HashRing>,
    // Serializes read-modify-publish of the ring snapshot
    update_lock: Mutex<()>,
}

impl StaticDirectory {
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            virtual_nodes,
            service_name: RwLock::new(None),
            ring: ArcSwap::from_pointee(HashRing::new(virtual_nodes)),
            update_lock: Mutex::new(()),
        }
    }

    /// Service name given to the last successful `connect`
    pub fn service_name(&self) -> Option<String> {
        self.service_name.read().clone()
    }

    pub fn members(&self) -> Vec<NodeAddress> {
        self.ring.load().members().cloned().collect()
    }

    /// Adds `node` to the ring. Returns `false` if it was already a member.
    pub fn join(
        &self,
        node: NodeAddress,
    ) -> bool {
        self.update(|ring| ring.add(node))
    }

    /// Removes `node` from the ring. Returns `false` if it was not a member.
    pub fn leave(
        &self,
        node: &NodeAddress,
    ) -> bool {
        self.update(|ring| ring.remove(node))
    }

    fn update(
        &self,
        change: impl FnOnce(&mut HashRing) -> bool,
    ) -> bool {
        let _guard = self.update_lock.lock();
        let mut ring = HashRing::clone(&self.ring.load());
        let changed = change(&mut ring);
        if changed {
            debug!(members = ring.len(), "Membership changed");
            self.ring.store(Arc::new(ring));
        }
        changed
    }
}

#[async_trait]
impl NodeDirectory for StaticDirectory {
    async fn connect(
        &self,
        service_name: &str,
        endpoints: &[String],
    ) -> Result<()> {
        if service_name.trim().is_empty() {
            return Err(DirectoryError::EmptyServiceName.into());
        }
        if endpoints.is_empty() {
            return Err(DirectoryError::NoSeedEndpoints(service_name.to_string()).into());
        }

        let members = endpoints
            .iter()
            .map(|endpoint| {
                endpoint
                    .parse::<NodeAddress>()
                    .map_err(|_| DirectoryError::InvalidEndpoint(endpoint.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let ring = HashRing::with_members(self.virtual_nodes, members);
        info!(service_name, members = ring.len(), "Directory connected");

        let _guard = self.update_lock.lock();
        self.ring.store(Arc::new(ring));
        *self.service_name.write() = Some(service_name.to_string());
        Ok(())
    }

    async fn resolve(
        &self,
        key: &str,
        count: usize,
    ) -> Result<Vec<NodeAddress>> {
        if self.service_name.read().is_none() {
            return Err(DirectoryError::NotConnected.into());
        }
        Ok(self.ring.load().get_n(key, count))
    }
}
