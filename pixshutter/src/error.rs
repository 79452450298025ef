/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the shutter scheduler.
//!
//! Every variant is a *configuration* problem: the timetable or the servo
//! parameters read from an external source do not describe something the
//! shutter can physically follow.  None of them is fatal.  The top-level loop
//! in [`ActivationLoop`](crate::activation::ActivationLoop) reports the error,
//! backs off, and re-reads its sources.
//!
//! | Variant | Category |
//! |---|---|
//! | `Timing` | configuration timing error |
//! | `PulseWidth` / `InvalidSchedule` / `InvalidTiming` | configuration value error |
//! | `Source` | parse error from a schedule or parameter source |
//!
//! Actuator driver faults are deliberately absent: they are logged by the
//! actuator adapter and never reach the scheduler.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for schedule and parameter construction.
#[derive(Debug, Error)]
pub enum ShutterError {
    /// The servo cannot complete an open/close cycle (two full grace periods)
    /// inside one sample repetition.
    #[error(
        "servo takes longer to move than the sample repetition: 2 x {total_grace:?} >= {sample_repetition:?} \
         (slow the sample repetition or reduce the servo grace time)"
    )]
    Timing {
        total_grace: Duration,
        sample_repetition: Duration,
    },

    /// Servo pulse-width bounds are inverted.
    #[error("min pulse width {min_ms}ms is greater than max pulse width {max_ms}ms")]
    PulseWidth { min_ms: f64, max_ms: f64 },

    /// The schedule intervals cannot describe a repeating timetable.
    #[error("invalid sample schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// A servo or grace time is negative or not a finite number.
    #[error("invalid shutter timing: {field} = {value}")]
    InvalidTiming { field: &'static str, value: f64 },

    /// A schedule or parameter source could not be read or parsed.
    #[error("cannot read {what} from {origin}: {source:#}")]
    Source {
        what: &'static str,
        origin: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ShutterError {
    /// Short category tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ShutterError::Timing { .. } => "timing",
            ShutterError::PulseWidth { .. }
            | ShutterError::InvalidSchedule { .. }
            | ShutterError::InvalidTiming { .. } => "value",
            ShutterError::Source { .. } => "source",
        }
    }
}

/// Convert a non-negative number of seconds into a [`Duration`].
///
/// Rejects NaN, infinities and negative values with
/// [`ShutterError::InvalidTiming`] tagged with `field`.
pub fn secs_to_duration(field: &'static str, secs: f64) -> Result<Duration, ShutterError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ShutterError::InvalidTiming { field, value: secs })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
