//! Configuration management for the replicated client.
//!
//! Settings are merged from several sources with increasing priority:
//! 1. Default values (hardcoded)
//! 2. Config file (explicit path, or `CONFIG_PATH`)
//! 3. Environment variables prefixed with `RINGKV__`
//!
//! Construction parameters given on a [`crate::ClientBuilder`] override all of them.

mod directory;
mod network;
mod replication;
pub use directory::*;
pub use network::*;
pub use replication::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::constants::ENV_PREFIX;
use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClientConfig {
    /// Membership directory: service name and bootstrap endpoints
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Replication factor and write policy
    #[serde(default)]
    pub replication: ReplicationConfig,

    /// Dial and request parameters for storage node connections
    #[serde(default)]
    pub network: NetworkConfig,
}

impl ClientConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// # Arguments
    /// * `path` - Optional config file; when absent `CONFIG_PATH` is consulted
    ///
    /// The result is not validated here because the caller may still fill in
    /// endpoints or the service name programmatically.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if let Ok(path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("directory.endpoints"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validates the settings required to construct a client
    pub fn validate(&self) -> Result<()> {
        self.directory.validate()?;
        self.replication.validate()?;
        Ok(())
    }
}
