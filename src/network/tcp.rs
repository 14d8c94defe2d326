use std::time::Duration;

use async_trait::async_trait;
use futures::SinkExt;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::Command;
use super::Connector;
use super::NodeConnection;
use super::Reply;
use super::RespCodec;
use crate::ConnectionError;
use crate::Error;
use crate::NetworkConfig;
use crate::NodeAddress;
use crate::ProtocolError;
use crate::Result;

/// RESP connection to one storage node
pub struct TcpConnection {
    node: NodeAddress,
    framed: Framed<TcpStream, RespCodec>,
    // Replies owed by the node for commands already sent
    outstanding: usize,
    healthy: bool,
}

impl TcpConnection {
    pub fn new(
        node: NodeAddress,
        stream: TcpStream,
    ) -> Self {
        Self {
            node,
            framed: Framed::new(stream, RespCodec),
            outstanding: 0,
            healthy: true,
        }
    }

    pub fn node(&self) -> &NodeAddress {
        &self.node
    }

    /// Number of replies the node still owes
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    async fn next_reply(&mut self) -> Result<Reply> {
        match self.framed.next().await {
            Some(Ok(reply)) => {
                self.outstanding -= 1;
                Ok(reply)
            }
            Some(Err(e)) => {
                self.healthy = false;
                Err(e.into())
            }
            None => {
                self.healthy = false;
                Err(ProtocolError::ConnectionClosed.into())
            }
        }
    }

    fn mark_failed(
        &mut self,
        e: ProtocolError,
    ) -> Error {
        self.healthy = false;
        e.into()
    }
}

#[async_trait]
impl NodeConnection for TcpConnection {
    async fn send(
        &mut self,
        command: Command,
    ) -> Result<()> {
        trace!(node = %self.node, command = command.name(), key = command.key(), "send");

        if let Err(e) = self.framed.feed(command).await {
            return Err(self.mark_failed(e));
        }
        // Counted once buffered: a flush interrupted here still delivers it later.
        self.outstanding += 1;

        if let Err(e) = SinkExt::<Command>::flush(&mut self.framed).await {
            return Err(self.mark_failed(e));
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Reply> {
        if self.outstanding == 0 {
            return Err(ProtocolError::NoPendingReply.into());
        }

        while self.outstanding > 1 {
            if let Reply::Error(message) = self.next_reply().await? {
                warn!(node = %self.node, %message, "Unclaimed write was rejected by storage node");
            }
        }
        self.next_reply().await
    }

    async fn close(&mut self) -> Result<()> {
        self.healthy = false;
        self.outstanding = 0;
        self.framed
            .get_mut()
            .shutdown()
            .await
            .map_err(|e| ProtocolError::Io(e).into())
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}

/// Dials storage nodes over TCP
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Option<Duration>,
    tcp_nodelay: bool,
}

impl TcpConnector {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            tcp_nodelay: config.tcp_nodelay,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        node: &NodeAddress,
    ) -> Result<Box<dyn NodeConnection>> {
        debug!(%node, "Establishing new storage connection");
        let dial = TcpStream::connect(node.as_str());

        let dialed = match self.connect_timeout {
            Some(duration) => tokio::time::timeout(duration, dial).await.map_err(|_| Error::Timeout {
                node: node.to_string(),
                duration,
            })?,
            None => dial.await,
        };

        let stream = dialed.map_err(|source| ConnectionError::Dial {
            node: node.to_string(),
            source,
        })?;

        stream
            .set_nodelay(self.tcp_nodelay)
            .map_err(|source| ConnectionError::SocketOption {
                node: node.to_string(),
                source,
            })?;

        Ok(Box::new(TcpConnection::new(node.clone(), stream)))
    }
}
