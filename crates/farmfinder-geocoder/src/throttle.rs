//! Minimum-interval gate for outbound geocoding requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces consecutive calls at least `min_interval` apart.
///
/// Clones share the same clock, so one `Throttle` guards every request made
/// through any clone. The lock is held while waiting, which serializes
/// concurrent callers in arrival order.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request slot is available and claim it.
    ///
    /// Returns how long the caller was delayed.
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last.lock().await;
        let mut waited = Duration::ZERO;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                waited = self.min_interval - elapsed;
                tracing::debug!(wait_ms = waited.as_millis(), "geocoder throttle engaged");
                tokio::time::sleep(waited).await;
            }
        }
        *last = Some(Instant::now());
        waited
    }
}
