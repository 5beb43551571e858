//! Wall-clock time source for the engine.
//!
//! Quest deadlines, buff expiry and offline catch-up all use absolute
//! timestamps, so the engine never counts time down itself: it asks its
//! [`Clock`] for `now` at the start of every operation. Production uses
//! [`SystemClock`]; tests drive a [`ManualClock`] forward explicitly.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

/// Errors that can occur when moving a manual clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The requested time is outside the representable range.
    #[error("clock out of range: cannot advance by {millis} ms")]
    OutOfRange {
        /// The attempted step in milliseconds.
        millis: i64,
    },
}

/// A source of the current UTC time.
pub trait Clock: Send + Sync + core::fmt::Debug {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// A clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// Move the clock forward (or backward, for a negative delta).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::OutOfRange`] if the result would overflow.
    pub fn advance(&self, by: TimeDelta) -> Result<DateTime<Utc>, ClockError> {
        let step = by.num_milliseconds();
        let current = self.millis.load(Ordering::SeqCst);
        let next = current
            .checked_add(step)
            .filter(|&millis| DateTime::<Utc>::from_timestamp_millis(millis).is_some())
            .ok_or(ClockError::OutOfRange { millis: step })?;
        self.millis.store(next, Ordering::SeqCst);
        Ok(self.now())
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        self.millis.store(to.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn manual_clock_stands_still() {
        let clock = ManualClock::new(start());
        assert_eq!(clock.now(), start());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(start());
        let later = clock.advance(TimeDelta::seconds(90)).unwrap();
        assert_eq!(later, start() + TimeDelta::seconds(90));
    }

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new(start());
        let handle = clock.clone();
        handle.advance(TimeDelta::minutes(5)).unwrap();
        assert_eq!(clock.now(), start() + TimeDelta::minutes(5));
    }

    #[test]
    fn overflow_is_rejected() {
        let clock = ManualClock::new(start());
        assert!(clock.advance(TimeDelta::MAX).is_err());
        assert_eq!(clock.now(), start());
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
