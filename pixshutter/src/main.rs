/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use pixshutter::activation::{ActivationLoop, LoopSettings};
use pixshutter::clock::{Clock, SystemClock};
use pixshutter::config::{ScheduleFile, ShutterParamsFile, TimingSource};
use pixshutter::error::{secs_to_duration, ShutterError};
use pixshutter::shutter::{Actuator, DryRunActuator, ShutterController};
use pixshutter::timing::{
    ServoParams, ShutterTimingParameters, DEFAULT_FRAME_WIDTH_MS, DEFAULT_MAX_PULSE_WIDTH_MS,
    DEFAULT_MIN_PULSE_WIDTH_MS, DEFAULT_SERVO_PIN,
};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Opens a servo-driven camera shutter only during scheduled sample windows.
///
/// Example:
///   pixshutter --schedule-config-file schedule_config.yaml \
///              --shutter-config-file shutter.yaml
#[derive(Debug, Parser)]
#[command(
    name = "pixshutter",
    about = "Servo shutter scheduler – opens the shutter around each sample window",
    long_about = None,
)]
struct Cli {
    /// The sample schedule file (YAML), re-read on every pass.
    #[arg(long = "schedule-config-file", default_value = "schedule_config.yaml")]
    schedule_config_file: PathBuf,

    /// Shutter parameter file (YAML).  When given, it replaces the timing and
    /// servo flags below and is re-read on every pass.
    #[arg(long = "shutter-config-file")]
    shutter_config_file: Option<PathBuf>,

    /// The time it takes for the servo to move (s).
    #[arg(long = "servo-move-time", default_value_t = 1.0)]
    servo_move_time: f64,

    /// Extra delay around each movement to absorb time-sync inconsistencies (s).
    #[arg(long = "grace-time", default_value_t = 1.0)]
    grace_time: f64,

    /// The servo GPIO pin (BCM numbering).
    #[arg(long = "servo-pin", default_value_t = DEFAULT_SERVO_PIN)]
    servo_pin: u8,

    /// Servo minimum pulse width (ms).
    #[arg(long = "min-pulse-width", default_value_t = DEFAULT_MIN_PULSE_WIDTH_MS)]
    min_pulse_width: f64,

    /// Servo maximum pulse width (ms).
    #[arg(long = "max-pulse-width", default_value_t = DEFAULT_MAX_PULSE_WIDTH_MS)]
    max_pulse_width: f64,

    /// Servo frame width (ms).
    #[arg(long = "frame-width", default_value_t = DEFAULT_FRAME_WIDTH_MS)]
    frame_width: f64,

    /// Sleep after a missed sample window (s).
    #[arg(long = "missed-window-sleep", default_value_t = 0.5)]
    missed_window_sleep: f64,

    /// Sleep after a configuration error before retrying (s).
    #[arg(long = "error-backoff", default_value_t = 5.0)]
    error_backoff: f64,

    /// Log servo moves instead of driving a GPIO pin.
    #[arg(long = "dry-run", default_value_t = false)]
    dry_run: bool,
}

// ── Startup helpers ───────────────────────────────────────────────────────────

/// Flag values cannot change while the process runs, so nothing is retried:
/// the error is repeated every backoff until an operator restarts us.
fn invalid_flags(e: &ShutterError, clock: &impl Clock, backoff: Duration) -> ! {
    loop {
        error!(
            kind = e.kind(),
            "{e}; invalid command-line flags, fix them and restart pixshutter"
        );
        clock.sleep(backoff);
    }
}

#[cfg(feature = "rpi")]
fn build_actuator(dry_run: bool, params: ServoParams) -> anyhow::Result<Box<dyn Actuator>> {
    if dry_run {
        return Ok(Box::new(DryRunActuator::new()));
    }
    Ok(Box::new(pixshutter::shutter::servo::ServoActuator::new(
        params,
    )?))
}

#[cfg(not(feature = "rpi"))]
fn build_actuator(dry_run: bool, params: ServoParams) -> anyhow::Result<Box<dyn Actuator>> {
    if !dry_run {
        warn!(
            pin = params.pin,
            "Built without the \"rpi\" feature, falling back to a dry-run servo"
        );
    }
    Ok(Box::new(DryRunActuator::new()))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("pixshutter starting up...");

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let cli = Cli::parse();

    info!(
        schedule_config_file = %cli.schedule_config_file.display(),
        shutter_config_file  = ?cli.shutter_config_file,
        servo_pin            = cli.servo_pin,
        dry_run              = cli.dry_run,
        "Configuration"
    );

    let clock = SystemClock;
    let settings = LoopSettings {
        missed_window_sleep: secs_to_duration("missed_window_sleep", cli.missed_window_sleep)
            .unwrap_or_else(|e| {
                warn!("{e}, using default");
                LoopSettings::default().missed_window_sleep
            }),
        error_backoff: secs_to_duration("error_backoff", cli.error_backoff).unwrap_or_else(|e| {
            warn!("{e}, using default");
            LoopSettings::default().error_backoff
        }),
    };

    // ── Servo and timing parameters ───────────────────────────────────────────
    let flag_servo = ServoParams::from_millis(
        cli.servo_pin,
        cli.min_pulse_width,
        cli.max_pulse_width,
        cli.frame_width,
    )
    .unwrap_or_else(|e| invalid_flags(&e, &clock, settings.error_backoff));

    let (servo, timing): (ServoParams, Box<dyn TimingSource>) = match &cli.shutter_config_file {
        None => {
            let timing = ShutterTimingParameters::from_secs(cli.servo_move_time, cli.grace_time)
                .unwrap_or_else(|e| invalid_flags(&e, &clock, settings.error_backoff));
            (flag_servo, Box::new(timing))
        }
        Some(path) => {
            // Retried until the file is valid.
            let file = ShutterParamsFile::new(path, flag_servo);
            let servo = loop {
                match file.load() {
                    Ok(params) => break params.servo,
                    Err(e) => {
                        error!(kind = e.kind(), "{e}");
                        clock.sleep(settings.error_backoff);
                    }
                }
            };
            info!(
                ?servo,
                "Servo parameters from {} apply until restart",
                file.path().display()
            );
            (servo, Box::new(file.with_active_servo(servo)))
        }
    };

    let actuator = loop {
        match build_actuator(cli.dry_run, servo) {
            Ok(a) => break a,
            Err(e) => {
                error!("Failed to initialise the servo: {e:#}");
                clock.sleep(settings.error_backoff.max(Duration::from_secs(1)));
            }
        }
    };
    let mut controller = ShutterController::new(actuator, clock);

    // ── Run forever ───────────────────────────────────────────────────────────
    let schedule = ScheduleFile::new(&cli.schedule_config_file);
    info!("Following the sample schedule in {}", schedule.path().display());
    ActivationLoop::new(clock, settings).run_forever(&schedule, timing.as_ref(), &mut controller)
}
