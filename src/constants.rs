// -
// Replication

/// Number of candidate nodes requested per key when none is configured
pub const DEFAULT_REPLICATION_FACTOR: usize = 2;

// -
// Hash ring

/// Virtual points placed on the ring per member
pub const DEFAULT_VIRTUAL_NODES: usize = 20;

// -
// Wire protocol

/// Upper bound accepted for a single bulk string in a reply (512 MiB)
pub(crate) const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Deepest array nesting accepted in a reply
pub(crate) const MAX_NESTING: usize = 32;

/// Environment prefix for configuration overrides, e.g. `RINGKV__REPLICATION__FACTOR=3`
pub(crate) const ENV_PREFIX: &str = "RINGKV";
