//! Node directory: maps a key to the ordered storage nodes that should hold it.
//!
//! The client only depends on the [`NodeDirectory`] trait. Any membership
//! backend (a coordination service, gossip, a static list) plugs in behind it.
//! [`StaticDirectory`] is the bundled implementation: a consistent hash ring
//! over an explicit member list.

mod ring;
mod static_directory;

pub use ring::*;
pub use static_directory::*;


use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::ConnectionError;
use crate::Result;

/// A reachable storage endpoint in `host:port` form.
///
/// Used as the identity of a node on the ring and as the key of its pooled
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Wraps an address without validating it
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(addr: &str) -> Self {
        Self::new(addr)
    }
}

impl From<String> for NodeAddress {
    fn from(addr: String) -> Self {
        Self::new(addr)
    }
}

/// Parses and validates `host:port`, tolerating a leading `tcp://` or `redis://`.
impl FromStr for NodeAddress {
    type Err = ConnectionError;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let normalized = trimmed
            .strip_prefix("tcp://")
            .or_else(|| trimmed.strip_prefix("redis://"))
            .unwrap_or(trimmed);

        match normalized.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(Self::new(normalized)),
            _ => Err(ConnectionError::InvalidAddress(raw.to_string())),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeDirectory: Send + Sync + 'static {
    /// Establishes the directory's view of membership for `service_name`.
    ///
    /// # Arguments
    /// * `service_name` - Namespace of the membership group
    /// * `endpoints` - Bootstrap addresses of the directory service
    ///
    /// # Errors
    /// Any failure is fatal to client construction.
    async fn connect(
        &self,
        service_name: &str,
        endpoints: &[String],
    ) -> Result<()>;

    /// Resolves `key` to at most `count` distinct candidate nodes, primary first.
    ///
    /// Deterministic for a fixed membership snapshot. Returns fewer than
    /// `count` entries when fewer live nodes exist and an empty list when no
    /// node is available; neither case is an error.
    async fn resolve(
        &self,
        key: &str,
        count: usize,
    ) -> Result<Vec<NodeAddress>>;
}
