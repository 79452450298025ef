//! Schedule and shutter-parameter sources.
//!
//! Both inputs are external and may change while the process runs, so they
//! are modelled as capabilities that are *read again on every pass* rather
//! than parsed once:
//!
//! * [`ScheduleSource`] → [`SampleSchedule`]
//! * [`TimingSource`] → [`ShutterTimingParameters`]
//!
//! File-backed implementations read YAML.  The schedule file layout is:
//! ```yaml
//! file_interval: 3600      # seconds
//! sample_interval: 5       # seconds
//! sample_repetition: 60    # seconds
//! ```
//!
//! The shutter parameter file layout is:
//! ```yaml
//! servo_move_time: 1.0     # seconds
//! grace_time: 1.0          # seconds
//! servo_pin: 18
//! min_pulse_width: 0.553   # milliseconds
//! max_pulse_width: 2.45    # milliseconds
//! frame_width: 20          # milliseconds
//! ```
//! The pin and pulse-width keys are optional; missing values fall back to the
//! defaults supplied by the caller (normally the CLI flags).  Only the timing
//! keys take effect when the file is re-read: the servo is built once at
//! startup, and later pin or pulse-width edits are reported with a warning.
//!
//! Plain values ([`SampleSchedule`], [`ShutterTimingParameters`]) are sources
//! too, which is how timing passed directly on the command line is wired in.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ShutterError;
use crate::schedule::SampleSchedule;
use crate::timing::{ServoParams, ShutterTimingParameters};

// ── Capability traits ─────────────────────────────────────────────────────────

/// Supplies the current sample timetable.
pub trait ScheduleSource {
    /// # Errors
    /// [`ShutterError::Source`] when the data cannot be read or parsed, or a
    /// value error when the timetable is not usable.
    fn read(&self) -> Result<SampleSchedule, ShutterError>;
}

/// Supplies the current servo timing.
pub trait TimingSource {
    /// # Errors
    /// [`ShutterError::Source`] when the data cannot be read or parsed, or a
    /// value error when the parameters are not usable.
    fn read(&self) -> Result<ShutterTimingParameters, ShutterError>;
}

impl ScheduleSource for SampleSchedule {
    fn read(&self) -> Result<SampleSchedule, ShutterError> {
        Ok(*self)
    }
}

impl TimingSource for ShutterTimingParameters {
    fn read(&self) -> Result<ShutterTimingParameters, ShutterError> {
        Ok(*self)
    }
}

// ── Private YAML deserialization types ────────────────────────────────────────

/// Schedule file layout.  Unknown keys are ignored so richer schedule files
/// shared with the capture side are accepted.
#[derive(Debug, Deserialize)]
struct ScheduleConfigFile {
    file_interval: f64,
    sample_interval: f64,
    sample_repetition: f64,
}

#[derive(Debug, Deserialize)]
struct ShutterParamsFileEntry {
    servo_move_time: f64,
    grace_time: f64,
    servo_pin: Option<u8>,
    /// Milliseconds.
    min_pulse_width: Option<f64>,
    /// Milliseconds.
    max_pulse_width: Option<f64>,
    /// Milliseconds.
    frame_width: Option<f64>,
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
}

fn source_error(what: &'static str, path: &Path, source: anyhow::Error) -> ShutterError {
    ShutterError::Source {
        what,
        origin: path.display().to_string(),
        source,
    }
}

// ── ScheduleFile ──────────────────────────────────────────────────────────────

/// A YAML schedule file, re-read on every [`read`](ScheduleSource::read).
#[derive(Debug, Clone)]
pub struct ScheduleFile {
    path: PathBuf,
}

impl ScheduleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleSource for ScheduleFile {
    fn read(&self) -> Result<SampleSchedule, ShutterError> {
        let file: ScheduleConfigFile =
            read_yaml(&self.path).map_err(|e| source_error("sample schedule", &self.path, e))?;
        debug!(
            file_interval = file.file_interval,
            sample_interval = file.sample_interval,
            sample_repetition = file.sample_repetition,
            "Read schedule from {}",
            self.path.display()
        );
        SampleSchedule::from_secs(
            file.file_interval,
            file.sample_interval,
            file.sample_repetition,
        )
    }
}

// ── ShutterParamsFile ─────────────────────────────────────────────────────────

/// Everything a shutter parameter file describes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShutterParams {
    pub timing: ShutterTimingParameters,
    pub servo: ServoParams,
}

/// A YAML shutter parameter file, re-read on every [`read`](TimingSource::read).
#[derive(Debug, Clone)]
pub struct ShutterParamsFile {
    path: PathBuf,
    /// Used for pin / pulse-width keys absent from the file.
    defaults: ServoParams,
    /// What the running actuator was built with.
    active_servo: Option<ServoParams>,
    /// Last ignored servo change already warned about.
    warned_servo: Cell<Option<ServoParams>>,
}

impl ShutterParamsFile {
    pub fn new(path: impl Into<PathBuf>, defaults: ServoParams) -> Self {
        Self {
            path: path.into(),
            defaults,
            active_servo: None,
            warned_servo: Cell::new(None),
        }
    }

    /// Record the servo parameters the actuator was built with, so that
    /// later edits to them in the file can be reported.
    pub fn with_active_servo(mut self, servo: ServoParams) -> Self {
        self.active_servo = Some(servo);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when `servo` differs from the parameters the actuator runs with.
    pub fn servo_change_ignored(&self, servo: &ServoParams) -> bool {
        self.active_servo.is_some_and(|active| active != *servo)
    }

    /// Parse and validate the whole file.
    ///
    /// # Errors
    /// * [`ShutterError::Source`] if the file is missing or malformed.
    /// * [`ShutterError::PulseWidth`] if `min_pulse_width > max_pulse_width`.
    /// * [`ShutterError::InvalidTiming`] for negative or non-finite values.
    pub fn load(&self) -> Result<ShutterParams, ShutterError> {
        let entry: ShutterParamsFileEntry =
            read_yaml(&self.path).map_err(|e| source_error("shutter parameters", &self.path, e))?;

        let timing = ShutterTimingParameters::from_secs(entry.servo_move_time, entry.grace_time)?;
        let servo = ServoParams::from_millis(
            entry.servo_pin.unwrap_or(self.defaults.pin),
            entry
                .min_pulse_width
                .unwrap_or_else(|| millis(self.defaults.min_pulse_width)),
            entry
                .max_pulse_width
                .unwrap_or_else(|| millis(self.defaults.max_pulse_width)),
            entry
                .frame_width
                .unwrap_or_else(|| millis(self.defaults.frame_width)),
        )?;

        debug!(?timing, ?servo, "Read shutter parameters from {}", self.path.display());
        Ok(ShutterParams { timing, servo })
    }
}

impl TimingSource for ShutterParamsFile {
    fn read(&self) -> Result<ShutterTimingParameters, ShutterError> {
        let params = self.load()?;
        if self.servo_change_ignored(&params.servo) {
            if self.warned_servo.get() != Some(params.servo) {
                warn!(
                    active = ?self.active_servo,
                    file = ?params.servo,
                    "Servo pin and pulse widths in {} changed; restart to apply them",
                    self.path.display()
                );
            }
            self.warned_servo.set(Some(params.servo));
        } else {
            self.warned_servo.set(None);
        }
        Ok(params.timing)
    }
}

fn millis(d: std::time::Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

// ── Tests ─────────────────────────────────────────────────────────────────────
