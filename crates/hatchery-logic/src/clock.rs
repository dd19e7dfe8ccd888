//! Wall-clock abstraction.
//!
//! Session clocks never read system time directly. Callers pass a [`Clock`]:
//! [`SystemClock`] in production, [`ManualClock`] in tests and the harness,
//! so time only moves when the caller says so.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::constants::MS_PER_SECOND;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn from_secs(secs: f64) -> Self {
        Self((secs * MS_PER_SECOND).round() as i64)
    }

    pub fn millis(self) -> i64 {
        self.0
    }

    /// Signed seconds from `earlier` to `self`. Exact for any pair of
    /// timestamps, including ones far outside the wall-clock range.
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        (i128::from(self.0) - i128::from(earlier.0)) as f64 / MS_PER_SECOND
    }

    /// Saturates at the ends of the `i64` range.
    pub fn plus_secs(self, secs: f64) -> Self {
        Self(self.0.saturating_add((secs * MS_PER_SECOND).round() as i64))
    }
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Reads the operating system's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Timestamp(ms)
    }
}

/// A clock that only moves when told to.
///
/// Interior mutability lets tests advance time while sessions hold a shared
/// reference to the clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    current: Cell<i64>,
}

impl ManualClock {
    pub fn at(start: Timestamp) -> Self {
        Self {
            current: Cell::new(start.0),
        }
    }

    /// Advance by `secs` seconds. Negative values are ignored.
    pub fn advance_secs(&self, secs: f64) {
        if secs > 0.0 {
            let delta = (secs * MS_PER_SECOND).round() as i64;
            self.current.set(self.current.get().saturating_add(delta));
        }
    }

    /// Jump to `target` if it lies in the future.
    pub fn advance_to(&self, target: Timestamp) {
        if target.0 > self.current.get() {
            self.current.set(target.0);
        }
    }

    /// Set the time unconditionally, including backwards.
    pub fn set(&self, target: Timestamp) {
        self.current.set(target.0);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.current.get())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
