/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Repeating sample timetable.
//!
//! A [`SampleSchedule`] is a grid anchored at the Unix epoch (UTC):
//!
//! ```text
//!   file period m            file period m+1
//!   |<───────────── file_interval ─────────────>|<──── ...
//!   [▓▓▓▓]      [▓▓▓▓]      [▓▓▓▓]      [▓▓▓▓]  [▓▓▓▓]
//!   |<-- sample_repetition -->|
//!   [▓▓▓▓] = sample window, sample_interval long
//! ```
//!
//! The end of the file period containing "now" is the end of the schedule:
//! [`SampleSchedule::sample_timesteps_remaining`] counts the windows that still
//! start before it.
//!
//! [`ShutterSampleSchedule`] adds the servo timing and enforces that a full
//! open/close cycle fits inside one repetition.

pub mod math;

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{secs_to_duration, ShutterError};
use crate::timing::ShutterTimingParameters;
use math::{align_down, grid_points_between};

/// Returned by [`SampleSchedule::sample_timesteps_remaining`] when the
/// schedule has no defined end.
pub const NO_TIMESTEPS: i64 = -1;

// ── SampleSchedule ────────────────────────────────────────────────────────────

/// The externally supplied timetable of sample windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSchedule {
    /// Length of one file period; zero means the schedule has no end.
    pub file_interval: Duration,
    /// Length of one sample window.
    pub sample_interval: Duration,
    /// Period between successive sample window starts.
    pub sample_repetition: Duration,
}

impl SampleSchedule {
    /// # Errors
    /// [`ShutterError::InvalidSchedule`] if `sample_repetition` is zero, if
    /// `sample_interval` is longer than `sample_repetition`, or if a value is
    /// too large to place on the microsecond grid.
    pub fn new(
        file_interval: Duration,
        sample_interval: Duration,
        sample_repetition: Duration,
    ) -> Result<Self, ShutterError> {
        if sample_repetition.is_zero() {
            return Err(ShutterError::InvalidSchedule {
                reason: "sample_repetition must be greater than zero".into(),
            });
        }
        if sample_interval > sample_repetition {
            return Err(ShutterError::InvalidSchedule {
                reason: format!(
                    "sample_interval {sample_interval:?} is longer than sample_repetition {sample_repetition:?}"
                ),
            });
        }
        for (name, d) in [
            ("file_interval", file_interval),
            ("sample_repetition", sample_repetition),
        ] {
            if i64::try_from(d.as_micros()).is_err() {
                return Err(ShutterError::InvalidSchedule {
                    reason: format!("{name} {d:?} is too large"),
                });
            }
        }
        Ok(Self {
            file_interval,
            sample_interval,
            sample_repetition,
        })
    }

    /// Build from raw seconds as found in a schedule file.
    pub fn from_secs(
        file_interval: f64,
        sample_interval: f64,
        sample_repetition: f64,
    ) -> Result<Self, ShutterError> {
        let as_schedule_err = |e: ShutterError| match e {
            ShutterError::InvalidTiming { field, value } => ShutterError::InvalidSchedule {
                reason: format!("{field} = {value} is not a non-negative number of seconds"),
            },
            other => other,
        };
        Self::new(
            secs_to_duration("file_interval", file_interval).map_err(as_schedule_err)?,
            secs_to_duration("sample_interval", sample_interval).map_err(as_schedule_err)?,
            secs_to_duration("sample_repetition", sample_repetition).map_err(as_schedule_err)?,
        )
    }

    /// Start of the window containing `now`, or of the next window if `now`
    /// falls between windows.
    pub fn current_sample_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now = truncate_to_micros(now);
        let t = now.timestamp_micros();
        let rep = micros(self.sample_repetition);
        let window = micros(self.sample_interval);

        let offset = t - align_down(t, rep);
        if offset == 0 || offset < window {
            now - TimeDelta::microseconds(offset)
        } else {
            now + TimeDelta::microseconds(rep - offset)
        }
    }

    /// End of the window returned by [`current_sample_start`](Self::current_sample_start).
    pub fn current_sample_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.current_sample_start(now) + TimeDelta::microseconds(micros(self.sample_interval))
    }

    /// End of the file period containing `now`, or `None` when
    /// `file_interval` is zero.
    pub fn schedule_end(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.file_interval.is_zero() {
            return None;
        }
        let now = truncate_to_micros(now);
        let t = now.timestamp_micros();
        let file = micros(self.file_interval);
        let remaining = align_down(t, file) + file - t;
        Some(now + TimeDelta::microseconds(remaining))
    }

    /// Number of sample windows that start in `[now, schedule_end)`.
    ///
    /// Returns [`NO_TIMESTEPS`] when the schedule has no defined end, or when
    /// it is exhausted because no window starts before the end.
    pub fn sample_timesteps_remaining(&self, now: DateTime<Utc>) -> i64 {
        let Some(end) = self.schedule_end(now) else {
            return NO_TIMESTEPS;
        };
        match grid_points_between(
            now.timestamp_micros(),
            end.timestamp_micros(),
            micros(self.sample_repetition),
        ) {
            0 => NO_TIMESTEPS,
            n => n,
        }
    }
}

/// Drop the sub-microsecond part so grid points land exactly on the grid.
fn truncate_to_micros(t: DateTime<Utc>) -> DateTime<Utc> {
    t - TimeDelta::nanoseconds(i64::from(t.timestamp_subsec_nanos() % 1_000))
}

/// Microseconds of a duration already range-checked by [`SampleSchedule::new`].
fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

// ── ShutterSampleSchedule ─────────────────────────────────────────────────────

/// A [`SampleSchedule`] paired with the servo timing that must follow it.
///
/// Construction guarantees `2 × total_grace_time < sample_repetition`, so the
/// shutter can open, hold, and close before the next window needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutterSampleSchedule {
    schedule: SampleSchedule,
    timing: ShutterTimingParameters,
}

impl ShutterSampleSchedule {
    /// # Errors
    /// [`ShutterError::Timing`] if `2 × (servo_move_time + grace_time)` is not
    /// strictly less than `sample_repetition`.
    pub fn new(
        schedule: SampleSchedule,
        timing: ShutterTimingParameters,
    ) -> Result<Self, ShutterError> {
        let total_grace = timing.total_grace_time();
        let fits = total_grace
            .checked_mul(2)
            .is_some_and(|cycle| cycle < schedule.sample_repetition);
        if !fits {
            return Err(ShutterError::Timing {
                total_grace,
                sample_repetition: schedule.sample_repetition,
            });
        }
        Ok(Self { schedule, timing })
    }

    pub fn schedule(&self) -> &SampleSchedule {
        &self.schedule
    }

    pub fn total_grace_time(&self) -> Duration {
        self.timing.total_grace_time()
    }

    pub fn grace_time(&self) -> Duration {
        self.timing.grace_time
    }

    pub fn sample_interval(&self) -> Duration {
        self.schedule.sample_interval
    }

    /// How long the shutter stays open: the window plus one grace allowance
    /// for open-settling and one for close-settling.
    pub fn hold_duration(&self) -> Duration {
        self.sample_interval() + self.total_grace_time() + self.grace_time()
    }

    pub fn current_sample_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.schedule.current_sample_start(now)
    }

    pub fn current_sample_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.schedule.current_sample_end(now)
    }

    pub fn sample_timesteps_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.schedule.sample_timesteps_remaining(now)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
