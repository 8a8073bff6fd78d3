//! Commit timestamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of commit timestamps.
pub trait TimestampProvider: Send + Sync {
    /// Returns a timestamp strictly greater than every earlier one.
    fn timestamp(&self) -> i64;
}

/// Wall clock milliseconds, bumped by one whenever the clock has not
/// advanced past the previously issued value.
#[derive(Debug, Default)]
pub struct MonotonicTimestampProvider {
    last: AtomicI64,
}

impl MonotonicTimestampProvider {
    /// Creates a provider.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimestampProvider for MonotonicTimestampProvider {
    fn timestamp(&self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as i64);
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}
