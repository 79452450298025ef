/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Servo timing and electrical parameters.
//!
//! ```text
//!   flags ─┐                               ┌─► ShutterSampleSchedule (timing check)
//!          ├─► ShutterTimingParameters ────┤
//!   file ──┘                               └─► ActivationLoop (sleep offsets)
//!
//!   flags / file ─► ServoParams ─► ServoActuator (pulse widths, pin)
//! ```
//!
//! Durations are carried as [`Duration`] so negative values cannot exist past
//! construction.  Raw numbers from flags or files go through the checked
//! constructors.

use std::time::Duration;

use crate::error::{secs_to_duration, ShutterError};

/// Default BCM pin for the shutter servo (hardware PWM0 on a Raspberry Pi).
pub const DEFAULT_SERVO_PIN: u8 = 18;
/// Default minimum servo pulse width, in milliseconds.
pub const DEFAULT_MIN_PULSE_WIDTH_MS: f64 = 0.553;
/// Default maximum servo pulse width, in milliseconds.
pub const DEFAULT_MAX_PULSE_WIDTH_MS: f64 = 2.45;
/// Default servo frame width (PWM period), in milliseconds.
pub const DEFAULT_FRAME_WIDTH_MS: f64 = 20.0;

// ── ShutterTimingParameters ───────────────────────────────────────────────────

/// How long the servo needs to travel and how much slack to leave around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutterTimingParameters {
    /// Physical travel time between the closed and open positions.
    pub servo_move_time: Duration,
    /// Extra buffer for clock-sync and mechanical latency.
    pub grace_time: Duration,
}

impl ShutterTimingParameters {
    pub fn new(servo_move_time: Duration, grace_time: Duration) -> Self {
        Self {
            servo_move_time,
            grace_time,
        }
    }

    /// Build from raw seconds (CLI flags or file values).
    ///
    /// # Errors
    /// [`ShutterError::InvalidTiming`] if either value is negative or not
    /// finite.
    pub fn from_secs(servo_move_time: f64, grace_time: f64) -> Result<Self, ShutterError> {
        Ok(Self {
            servo_move_time: secs_to_duration("servo_move_time", servo_move_time)?,
            grace_time: secs_to_duration("grace_time", grace_time)?,
        })
    }

    /// `servo_move_time + grace_time`: the lead needed before a window for
    /// the shutter to be fully open and settled.
    pub fn total_grace_time(&self) -> Duration {
        self.servo_move_time + self.grace_time
    }
}

impl Default for ShutterTimingParameters {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(1))
    }
}

// ── ServoParams ───────────────────────────────────────────────────────────────

/// Electrical configuration of the shutter servo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoParams {
    /// BCM GPIO pin number.
    pub pin: u8,
    pub min_pulse_width: Duration,
    pub max_pulse_width: Duration,
    /// PWM period.
    pub frame_width: Duration,
}

impl ServoParams {
    /// Build from pulse widths given in milliseconds.
    ///
    /// # Errors
    /// * [`ShutterError::PulseWidth`] if `min_ms > max_ms`.
    /// * [`ShutterError::InvalidTiming`] if any width is negative or not finite.
    pub fn from_millis(
        pin: u8,
        min_ms: f64,
        max_ms: f64,
        frame_ms: f64,
    ) -> Result<Self, ShutterError> {
        if min_ms > max_ms {
            return Err(ShutterError::PulseWidth { min_ms, max_ms });
        }
        Ok(Self {
            pin,
            min_pulse_width: secs_to_duration("min_pulse_width", min_ms / 1000.0)?,
            max_pulse_width: secs_to_duration("max_pulse_width", max_ms / 1000.0)?,
            frame_width: secs_to_duration("frame_width", frame_ms / 1000.0)?,
        })
    }

    /// Pulse width of the neutral position, which is where the shutter is
    /// closed.
    pub fn mid_pulse_width(&self) -> Duration {
        (self.min_pulse_width + self.max_pulse_width) / 2
    }
}

impl Default for ServoParams {
    fn default() -> Self {
        Self {
            pin: DEFAULT_SERVO_PIN,
            min_pulse_width: Duration::from_micros(553),
            max_pulse_width: Duration::from_micros(2450),
            frame_width: Duration::from_millis(20),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
