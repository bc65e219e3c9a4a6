//! Fixed-delay throttle for classification calls
//!
//! Every call is followed by the same pause, so N calls take at least
//! N × interval. This is deliberately not a token bucket.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    interval: Duration,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Suspend for the configured interval
    pub async fn pause(&self) {
        if self.interval.is_zero() {
            return;
        }
        tracing::trace!("Throttling: waiting {:?}", self.interval);
        tokio::time::sleep(self.interval).await;
    }
}
