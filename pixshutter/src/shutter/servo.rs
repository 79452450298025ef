/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Raspberry Pi servo actuator (software PWM through `rppal`).
//!
//! Open = maximum pulse width, closed = midpoint of the pulse-width range.
//! The PWM period is the configured frame width.  The PWM signal stays on
//! after each command so the servo holds its position.

use anyhow::{Context, Result};
use rppal::gpio::{Gpio, OutputPin};
use tracing::{debug, error};

use super::Actuator;
use crate::timing::ServoParams;

pub struct ServoActuator {
    pin: OutputPin,
    params: ServoParams,
}

impl ServoActuator {
    /// Claim `params.pin` as an output.
    ///
    /// # Errors
    /// Returns an error if the GPIO peripheral is unavailable or the pin is
    /// already in use.
    pub fn new(params: ServoParams) -> Result<Self> {
        let pin = Gpio::new()
            .context("Cannot access the GPIO peripheral")?
            .get(params.pin)
            .with_context(|| format!("Cannot claim GPIO pin {}", params.pin))?
            .into_output();
        Ok(Self { pin, params })
    }

    fn set_pulse(&mut self, pulse: std::time::Duration, position: &str) {
        debug!(pin = self.params.pin, ?pulse, position, "Servo pulse");
        if let Err(e) = self.pin.set_pwm(self.params.frame_width, pulse) {
            error!(pin = self.params.pin, position, "Servo PWM failed: {e}");
        }
    }
}

impl Actuator for ServoActuator {
    fn move_open(&mut self) {
        let pulse = self.params.max_pulse_width;
        self.set_pulse(pulse, "open");
    }

    fn move_closed(&mut self) {
        let pulse = self.params.mid_pulse_width();
        self.set_pulse(pulse, "closed");
    }

    fn describe(&self) -> String {
        format!(
            "servo on GPIO {} (pulse {:?}..{:?}, frame {:?})",
            self.params.pin,
            self.params.min_pulse_width,
            self.params.max_pulse_width,
            self.params.frame_width
        )
    }
}
