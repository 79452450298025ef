/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Shutter controller: open/close intents → actuator positions + telemetry.
//!
//! ```text
//!   ActivationLoop ──open()/close()──► ShutterController ──► dyn Actuator
//!                                          │                   ├── DryRunActuator
//!                                          │                   └── ServoActuator (feature "rpi")
//!                                          └── opened/closed counters, last trigger time
//! ```
//!
//! Both operations are fire-and-forget: they command the actuator and return
//! without waiting for physical travel.  The caller accounts for the travel
//! time through `servo_move_time`.

#[cfg(feature = "rpi")]
pub mod servo;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use crate::clock::Clock;

// ── Actuator ──────────────────────────────────────────────────────────────────

/// Physical device that holds the shutter.
///
/// Implementations must not block for the travel time and must not fail:
/// driver faults are handled (logged) inside the implementation.
pub trait Actuator {
    /// Command the fully-open position.
    fn move_open(&mut self);

    /// Command the neutral (closed) position.
    fn move_closed(&mut self);

    /// Human-readable description for log lines.
    fn describe(&self) -> String;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn move_open(&mut self) {
        (**self).move_open()
    }

    fn move_closed(&mut self) {
        (**self).move_closed()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Actuator that only logs; used with `--dry-run` and on hosts without GPIO.
#[derive(Debug, Default)]
pub struct DryRunActuator {
    is_open: bool,
}

impl DryRunActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

impl Actuator for DryRunActuator {
    fn move_open(&mut self) {
        self.is_open = true;
        info!("[dry-run] servo -> open");
    }

    fn move_closed(&mut self) {
        self.is_open = false;
        info!("[dry-run] servo -> closed");
    }

    fn describe(&self) -> String {
        "dry-run servo".to_string()
    }
}

// ── ShutterController ─────────────────────────────────────────────────────────

/// Owns the actuator and records how often and when it was triggered.
///
/// One instance lives for the whole process and is only ever touched by the
/// control thread, so the counters are plain fields.
#[derive(Debug)]
pub struct ShutterController<A, C> {
    actuator: A,
    clock: C,
    opened: u64,
    closed: u64,
    last_trigger_time: DateTime<Utc>,
}

impl<A: Actuator, C: Clock> ShutterController<A, C> {
    /// `last_trigger_time` starts one year before construction so it reads as
    /// "never triggered".
    pub fn new(actuator: A, clock: C) -> Self {
        let last_trigger_time = clock.now() - TimeDelta::days(365);
        info!(actuator = %actuator.describe(), "Shutter controller ready");
        Self {
            actuator,
            clock,
            opened: 0,
            closed: 0,
            last_trigger_time,
        }
    }

    /// Command the open position.
    pub fn open(&mut self) {
        self.actuator.move_open();
        self.opened += 1;
        self.last_trigger_time = self.clock.now();
    }

    /// Command the closed (neutral) position.
    pub fn close(&mut self) {
        self.actuator.move_closed();
        self.closed += 1;
        self.last_trigger_time = self.clock.now();
    }

    pub fn opened_count(&self) -> u64 {
        self.opened
    }

    pub fn closed_count(&self) -> u64 {
        self.closed
    }

    pub fn last_trigger_time(&self) -> DateTime<Utc> {
        self.last_trigger_time
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
