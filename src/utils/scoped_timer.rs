use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// Traces how long a client operation took, once it goes out of scope.
///
/// Events go to the `timing` target so they can be enabled on their own,
/// e.g. `RUST_LOG=timing=trace`.
pub(crate) struct ScopedTimer {
    op: &'static str,
    started: Instant,
}

impl ScopedTimer {
    pub(crate) fn new(op: &'static str) -> Self {
        Self {
            op,
            started: Instant::now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        trace!(target: "timing", op = self.op, elapsed_us = self.elapsed().as_micros() as u64, "Operation finished");
    }
}
