/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wall-clock and sleep capability.
//!
//! The scheduler never calls `Utc::now()` or `thread::sleep()` directly; it
//! goes through [`Clock`] so the same code runs against the real clock in the
//! binary and against [`SimClock`] in tests, where every sleep advances
//! simulated time instantly.

use std::cell::{Cell, RefCell};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Source of UTC wall-clock time plus a blocking sleep.
pub trait Clock {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Block the calling thread for `d`.
    fn sleep(&self, d: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn sleep(&self, d: Duration) {
        (**self).sleep(d)
    }
}

// ── SystemClock ───────────────────────────────────────────────────────────────

/// The real UTC clock with `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, d: Duration) {
        thread::sleep(d);
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Deterministic clock: `sleep` advances `now` by exactly the requested
/// duration and records it.
///
/// Interior mutability lets the activation loop and the shutter controller
/// share one instance by reference (`&SimClock` is itself a [`Clock`]).
#[derive(Debug)]
pub struct SimClock {
    now: Cell<DateTime<Utc>>,
    sleeps: RefCell<Vec<Duration>>,
}

impl SimClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    /// Start at `secs` seconds after the Unix epoch.
    pub fn at_unix_secs(secs: f64) -> Self {
        let micros = (secs * 1_000_000.0).round() as i64;
        Self::new(DateTime::<Utc>::UNIX_EPOCH + TimeDelta::microseconds(micros))
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    /// Sum of every sleep requested so far.
    pub fn total_slept(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get() + to_delta(d));
    }
}

impl Clock for SimClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn sleep(&self, d: Duration) {
        self.sleeps.borrow_mut().push(d);
        self.advance(d);
    }
}

/// Convert a std [`Duration`] into a signed chrono delta, saturating at the
/// largest representable span.
pub(crate) fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
