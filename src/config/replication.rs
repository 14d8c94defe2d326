use serde::Deserialize;

use crate::constants::DEFAULT_REPLICATION_FACTOR;
use crate::Error;
use crate::Result;

/// How `set` treats the reply of each replica
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Send the write and move on; the reply is drained later
    #[default]
    FireAndForget,

    /// Wait for each replica to acknowledge before moving on
    Acknowledged,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplicationConfig {
    /// Number of candidate nodes requested per key
    #[serde(default = "default_factor")]
    pub factor: usize,

    #[serde(default)]
    pub write_mode: WriteMode,

    /// Broadcast writes to all candidates concurrently
    #[serde(default)]
    pub parallel_writes: bool,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            factor: default_factor(),
            write_mode: WriteMode::default(),
            parallel_writes: false,
        }
    }
}

impl ReplicationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.factor == 0 {
            return Err(Error::invalid_config("replication factor must be at least 1"));
        }
        Ok(())
    }
}

fn default_factor() -> usize {
    DEFAULT_REPLICATION_FACTOR
}
