//! Time source used by the address manager.
//!
//! Every policy clock (stale horizon, interval, ban expiry) reads the same
//! [`Clock::now`] value once per operation, so a single mutating call never
//! observes two different "currents".

use chrono::Utc;

/// Supplies the current Unix timestamp, in seconds.
///
/// The default implementation reads the system clock. Tests inject a fixed
/// or steppable clock so that time-dependent scenarios (staleness, ban
/// expiry) are deterministic.
pub trait Clock {
    /// Current time as Unix seconds.
    fn now(&self) -> i64;
}

/// Reads the wall-clock system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock that always returns a fixed instant, advanced manually by tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: i64,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: i64) -> Self {
        FixedClock { now }
    }

    /// Moves the clock forward by `secs` seconds.
    pub fn advance(&mut self, secs: i64) {
        self.now += secs;
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&mut self, now: i64) {
        self.now = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now
    }
}
