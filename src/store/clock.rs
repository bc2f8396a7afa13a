use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for timers and edit stamps
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall time read once at construction, then advanced by a monotonic
/// `Instant`. Elapsed time within a session is immune to system clock
/// adjustments.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor_wall: DateTime<Utc>,
    anchor_mono: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            anchor_wall: Utc::now(),
            anchor_mono: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let since = self.anchor_mono.elapsed();
        let since = Duration::from_std(since).unwrap_or_else(|_| Duration::zero());
        self.anchor_wall + since
    }
}

/// A hand-driven clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn at(time: DateTime<Utc>) -> Self {
        ManualClock {
            millis: Arc::new(AtomicI64::new(time.timestamp_millis())),
        }
    }

    pub fn advance_ms(&self, ms: i64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, time: DateTime<Utc>) {
        self.millis.store(time.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}
