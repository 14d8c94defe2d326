//! Replicated Client Error Hierarchy
//!
//! Errors are grouped by the layer that produced them: the directory that
//! resolves keys to nodes, the dial to a storage node, and the request/reply
//! exchange over an established connection.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The directory resolved zero candidates for a key.
    /// Not retryable until membership changes.
    #[error("Can't get access to any storage node for key {key:?}")]
    NoNodesAvailable { key: String },

    /// Dialing a storage node failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Send or receive on an established connection failed
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The directory collaborator itself failed
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A configured dial or request timeout expired
    #[error("Operation against {node} timed out after {duration:?}")]
    Timeout { node: String, duration: Duration },

    /// Invalid settings or construction parameters
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the same operation may succeed when simply retried.
    ///
    /// Transport failures are retryable. An empty candidate list, directory
    /// failures and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Protocol(_) | Error::Timeout { .. }
        )
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::Config(ConfigError::Message(message.into()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// TCP dial failure with source context
    #[error("Failed to connect to {node}: {source}")]
    Dial {
        node: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket option failure right after the dial
    #[error("Failed to configure socket for {node}: {source}")]
    SocketOption {
        node: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed `host:port` address
    #[error("Invalid node address: {0:?}")]
    InvalidAddress(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Transport I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the stream while a reply was still owed
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// `receive` was called without a preceding `send`
    #[error("No reply is pending on this connection")]
    NoPendingReply,

    #[error("Malformed reply: {0}")]
    Malformed(String),

    /// Error reply sent by the storage node
    #[error("Storage node replied with error: {0}")]
    ServerError(String),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Directory is not connected")]
    NotConnected,

    #[error("Service name can't be empty")]
    EmptyServiceName,

    #[error("No seed endpoints given for service {0}")]
    NoSeedEndpoints(String),

    #[error("Invalid seed endpoint: {0:?}")]
    InvalidEndpoint(String),

    /// Directory backend failure
    #[error("Directory service unavailable: {0}")]
    Unavailable(String),
}
