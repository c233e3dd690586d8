//! Time source for `exp`/`nbf` checks.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Supplies "now" as Unix seconds.
pub trait Clock: Send + Sync {
    /// Current time in seconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0));
        i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now(&self) -> i64 {
        self()
    }
}
