use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::ReplicatedClient;
use crate::ClientConfig;
use crate::ConnectionPool;
use crate::Connector;
use crate::NodeDirectory;
use crate::Result;
use crate::StaticDirectory;
use crate::TcpConnector;
use crate::WriteMode;

pub struct ClientBuilder {
    config: ClientConfig,
    directory: Option<Arc<dyn NodeDirectory>>,
    connector: Option<Arc<dyn Connector>>,
}

impl ClientBuilder {
    /// Create a new builder with default config, the given directory
    /// endpoints and service name
    pub fn new(
        endpoints: Vec<String>,
        service_name: impl Into<String>,
    ) -> Self {
        let mut config = ClientConfig::default();
        config.directory.endpoints = endpoints;
        config.directory.service_name = service_name.into();
        Self {
            config,
            directory: None,
            connector: None,
        }
    }

    /// Number of candidate nodes per key (default: 2)
    pub fn replication_factor(
        mut self,
        factor: usize,
    ) -> Self {
        self.config.replication.factor = factor;
        self
    }

    /// Set storage node dial timeout (default: none)
    ///
    /// Rounded up to whole milliseconds; `Duration::ZERO` disables it.
    pub fn connect_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.network.connect_timeout_in_ms = ceil_millis(timeout);
        self
    }

    /// Set per-node request timeout (default: none)
    ///
    /// Rounded up to whole milliseconds; `Duration::ZERO` disables it.
    pub fn request_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.network.request_timeout_in_ms = ceil_millis(timeout);
        self
    }

    /// Set how writes treat replica replies (default: fire and forget)
    pub fn write_mode(
        mut self,
        mode: WriteMode,
    ) -> Self {
        self.config.replication.write_mode = mode;
        self
    }

    /// Broadcast writes to all replicas concurrently (default: disabled)
    pub fn parallel_writes(
        mut self,
        enable: bool,
    ) -> Self {
        self.config.replication.parallel_writes = enable;
        self
    }

    /// Completely replaces the configuration, including the endpoints and
    /// service name given to [`new`](ClientBuilder::new)
    ///
    /// Settings applied earlier through individual methods are discarded.
    ///
    /// ```ignore
    /// let config = ClientConfig::load(Some("ringkv.toml"))?;
    /// let client = ClientBuilder::new(vec![], "")
    ///     .set_config(config)
    ///     .build()
    ///     .await?;
    /// ```
    pub fn set_config(
        mut self,
        config: ClientConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Use a custom membership backend instead of [`StaticDirectory`]
    pub fn directory(
        mut self,
        directory: Arc<dyn NodeDirectory>,
    ) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Use a custom storage node transport instead of [`TcpConnector`]
    pub fn connector(
        mut self,
        connector: Arc<dyn Connector>,
    ) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Validate the configuration, connect the directory and build the client
    ///
    /// No storage node is dialed here; connections are opened on first use.
    pub async fn build(self) -> Result<ReplicatedClient> {
        let config = self.config;
        config.validate()?;

        let directory = match self.directory {
            Some(directory) => directory,
            None => Arc::new(StaticDirectory::new(config.directory.virtual_nodes)),
        };
        directory
            .connect(&config.directory.service_name, &config.directory.endpoints)
            .await?;

        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(TcpConnector::new(&config.network)),
        };

        info!(
            service_name = %config.directory.service_name,
            replication_factor = config.replication.factor,
            write_mode = ?config.replication.write_mode,
            "Replicated client ready"
        );

        Ok(ReplicatedClient::new(config, directory, ConnectionPool::new(connector)))
    }
}

// A sub-millisecond timeout must not collapse to 0, which means "no timeout"
fn ceil_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}
