use std::time::Duration;

use serde::Deserialize;

/// Storage node connection parameters
///
/// A timeout of `0` disables it: the call blocks until the transport resolves.
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    /// TCP connect timeout in milliseconds
    #[serde(default)]
    pub connect_timeout_in_ms: u64,

    /// Timeout for one request/reply exchange with a node, in milliseconds
    #[serde(default)]
    pub request_timeout_in_ms: u64,

    #[serde(default = "default_tcp_nodelay")]
    pub tcp_nodelay: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_in_ms: 0,
            request_timeout_in_ms: 0,
            tcp_nodelay: default_tcp_nodelay(),
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.connect_timeout_in_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.request_timeout_in_ms)
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn default_tcp_nodelay() -> bool {
    true
}
