//! Process-wide spacing of outbound NewsAPI calls.
//!
//! Every call through [`crate::client::NewsClient`] passes a [`Throttle`] first. The default
//! implementation, [`RateGate`], keeps a single "last call" timestamp and delays callers until
//! the minimum interval has elapsed since the previous call started.
//!
//! The timestamp lives behind an async mutex that stays locked while a caller waits. That makes
//! the check-then-update atomic on the multi-threaded runtime and queues concurrent callers in
//! arrival order (tokio's mutex is fair).

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Minimum spacing between two outbound calls when nothing else is configured.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Gate consulted before every outbound call.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Suspend until the caller is allowed to issue a call, then record the call.
    async fn acquire(&self);
}

#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_call_at: Mutex<Option<Instant>>,
}

impl RateGate {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call_at: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// When the most recent call was admitted, or `None` if the gate was never acquired.
    pub async fn last_call_at(&self) -> Option<Instant> {
        *self.last_call_at.lock().await
    }

    /// Wait out the remainder of the interval (if any) and stamp the current time.
    ///
    /// The timestamp is updated unconditionally, so an attempt that later fails upstream still
    /// counts toward the limit.
    pub async fn acquire(&self) {
        let mut last = self.last_call_at.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval - elapsed;
                debug!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "rate gate: delaying outbound call"
                );
                tokio::time::sleep(delay).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

#[async_trait]
impl Throttle for RateGate {
    async fn acquire(&self) {
        RateGate::acquire(self).await;
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_MIN_INTERVAL, RateGate};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let gate = RateGate::default();
        assert!(gate.last_call_at().await.is_none());

        let before = Instant::now();
        gate.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
        assert!(gate.last_call_at().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_acquires_are_spaced_by_min_interval() {
        let gate = RateGate::default();
        let mut starts = Vec::new();
        for _ in 0..4 {
            gate.acquire().await;
            starts.push(Instant::now());
        }

        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= DEFAULT_MIN_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_after_interval_elapsed_is_immediate() {
        let gate = RateGate::new(Duration::from_millis(500));
        gate.acquire().await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        let before = Instant::now();
        gate.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_only_for_the_remaining_delta() {
        let gate = RateGate::new(Duration::from_millis(500));
        gate.acquire().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        let before = Instant::now();
        gate.acquire().await;
        let waited = before.elapsed();
        assert!(waited >= Duration::from_millis(300));
        assert!(waited < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialized() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(500)));
        let mut handles = Vec::new();
        for _ in 0..3 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                gate.acquire().await;
                Instant::now()
            }));
        }

        let mut starts = Vec::new();
        for h in handles {
            starts.push(h.await.expect("join"));
        }
        starts.sort();

        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
    }
}
