//! Storage node transport.
//!
//! The client talks to storage nodes through two seams:
//! - [`Connector`] dials a [`NodeAddress`] and yields a [`NodeConnection`]
//! - [`NodeConnection`] sends commands and receives replies in order
//!
//! [`TcpConnector`] / [`TcpConnection`] implement them over RESP on TCP.
//! [`ConnectionPool`] caches one connection per node address.

mod connection_pool;
mod resp;
mod tcp;

pub use connection_pool::*;
pub use resp::*;
pub use tcp::*;


use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::NodeAddress;
use crate::Result;

/// Duplex request/reply channel to one storage node.
///
/// Replies come back in the order commands were sent. A caller that sends
/// without receiving (a fire-and-forget write) leaves its reply unclaimed;
/// the next `receive` returns the reply to the most recent `send` and
/// discards the unclaimed ones before it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeConnection: Send + 'static {
    /// Writes `command` to the node without waiting for its reply
    async fn send(
        &mut self,
        command: Command,
    ) -> Result<()>;

    /// Waits for the reply to the most recent `send`
    ///
    /// # Errors
    /// - [`crate::ProtocolError::NoPendingReply`] if nothing was sent
    /// - [`crate::ProtocolError::ConnectionClosed`] if the peer went away
    async fn receive(&mut self) -> Result<Reply>;

    /// Shuts the channel down. Further use fails.
    async fn close(&mut self) -> Result<()>;

    /// `false` once a transport error has been observed
    fn is_healthy(&self) -> bool;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a new connection to `node`
    async fn connect(
        &self,
        node: &NodeAddress,
    ) -> Result<Box<dyn NodeConnection>>;
}
