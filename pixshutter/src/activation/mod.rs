/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scheduled shutter activation.
//!
//! Three layers, each built on the one below:
//!
//! | Layer | Entry point | Blocks for |
//! |---|---|---|
//! | single cycle | [`ActivationLoop::activate_once`] | lead time + hold, or the missed-window sleep |
//! | one schedule | [`ActivationLoop::run_schedule`] | every remaining window of the file period |
//! | process | [`ActivationLoop::run_forever`] | forever |
//!
//! # Timing of one cycle
//! ```text
//!            lead                 hold = interval + total_grace + grace
//!   now ─────────────► open ──────────────────────────────────────► close
//!                       |<─ total_grace ─>[▓▓▓ sample window ▓▓▓]
//!                                          ^ current_sample_start()
//! ```
//! Every cycle re-anchors on `current_sample_start()` computed from a fresh
//! clock reading, so sleep overshoot never accumulates across cycles.
//!
//! # Process state machine
//! ```text
//!            ┌──────── schedule exhausted ───────┐
//!            ▼                                   │
//!   ┌──────────────────┐   configuration error  ┌┴──────────┐
//!   │ RunningSchedule  │ ─────────────────────► │  Backoff  │
//!   └──────────────────┘ ◄───── after sleep ─── └───────────┘
//! ```
//! There is no terminal state.
//!
//! Everything runs on one thread; the only shared state is the
//! [`ShutterController`], borrowed mutably by whichever layer is running.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, info, warn};

use crate::clock::{to_delta, Clock};
use crate::config::{ScheduleSource, TimingSource};
use crate::error::ShutterError;
use crate::schedule::{SampleSchedule, ShutterSampleSchedule};
use crate::shutter::{Actuator, ShutterController};
use crate::timing::ShutterTimingParameters;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default sleep after a window was missed.
pub const DEFAULT_MISSED_WINDOW_SLEEP: Duration = Duration::from_millis(500);

/// Default sleep after a configuration error before the sources are re-read.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

// ── Settings and results ──────────────────────────────────────────────────────

/// Fixed delays of the loop itself (not part of the schedule).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Sleep when the next window starts too soon to open in time.
    pub missed_window_sleep: Duration,
    /// Sleep in the `Backoff` state.
    pub error_backoff: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            missed_window_sleep: DEFAULT_MISSED_WINDOW_SLEEP,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

/// What a single [`activate_once`](ActivationLoop::activate_once) call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The shutter was opened and closed around the window at `sample_start`.
    Completed {
        sample_start: DateTime<Utc>,
        opened_at: DateTime<Utc>,
        closed_at: DateTime<Utc>,
    },
    /// The window at `sample_start` was too close (or already running);
    /// nothing was moved.
    MissedWindow { sample_start: DateTime<Utc> },
}

/// How a [`run_schedule`](ActivationLoop::run_schedule) call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The schedule reported a negative number of remaining timesteps.
    NoTimesteps,
    /// Every remaining timestep was attempted.
    Finished { completed: u64, missed: u64 },
}

impl RunOutcome {
    /// Number of `activate_once` calls made.
    pub fn activations(&self) -> u64 {
        match self {
            RunOutcome::NoTimesteps => 0,
            RunOutcome::Finished { completed, missed } => completed + missed,
        }
    }
}

/// State of the top-level loop.
#[derive(Debug)]
pub enum LoopState {
    RunningSchedule,
    /// Carrying the error that caused the backoff.
    Backoff(ShutterError),
}

// ── ActivationLoop ────────────────────────────────────────────────────────────

/// Drives a [`ShutterController`] through the windows of a sample schedule.
#[derive(Debug, Clone)]
pub struct ActivationLoop<C> {
    clock: C,
    settings: LoopSettings,
}

impl<C: Clock> ActivationLoop<C> {
    pub fn new(clock: C, settings: LoopSettings) -> Self {
        Self { clock, settings }
    }

    // ── Single cycle ──────────────────────────────────────────────────────────

    /// Run one open → hold → close cycle for the current or next window.
    ///
    /// If the shutter cannot be fully open and settled by the window start
    /// (the lead time is negative), nothing is moved: the call sleeps for
    /// [`LoopSettings::missed_window_sleep`] and returns
    /// [`Activation::MissedWindow`].  A late or partial activation is never
    /// attempted.
    pub fn activate_once<A: Actuator, CC: Clock>(
        &self,
        schedule: &ShutterSampleSchedule,
        controller: &mut ShutterController<A, CC>,
    ) -> Activation {
        let now = self.clock.now();
        let sample_start = schedule.current_sample_start(now);
        let lead = lead_time(schedule, now);

        let Ok(lead) = lead.to_std() else {
            debug!(
                %sample_start,
                lead_ms = lead.num_milliseconds(),
                "Missed window, waiting for the next one"
            );
            self.clock.sleep(self.settings.missed_window_sleep);
            return Activation::MissedWindow { sample_start };
        };

        self.clock.sleep(lead);

        let sample_end = sample_start + to_delta(schedule.sample_interval());
        info!("Doing interval {sample_start} - {sample_end}");

        info!("Opening shutter {}", self.clock.now());
        controller.open();
        let opened_at = controller.last_trigger_time();

        self.clock.sleep(schedule.hold_duration());

        info!("Closing shutter {}", self.clock.now());
        controller.close();
        let closed_at = controller.last_trigger_time();

        debug!(
            opened = controller.opened_count(),
            closed = controller.closed_count(),
            "Shutter counters"
        );

        Activation::Completed {
            sample_start,
            opened_at,
            closed_at,
        }
    }

    // ── One schedule ──────────────────────────────────────────────────────────

    /// Activate the shutter for every window left in the schedule.
    ///
    /// Cycles run strictly one after another; each finishes (including its
    /// sleeps) before the next begins.
    ///
    /// # Errors
    /// [`ShutterError::Timing`] if the servo timing does not fit the sample
    /// repetition.  Nothing is moved in that case.
    pub fn run_schedule<A: Actuator, CC: Clock>(
        &self,
        schedule: SampleSchedule,
        timing: ShutterTimingParameters,
        controller: &mut ShutterController<A, CC>,
    ) -> Result<RunOutcome, ShutterError> {
        let schedule = ShutterSampleSchedule::new(schedule, timing)?;

        let remaining = schedule.sample_timesteps_remaining(self.clock.now());
        // Exhausted schedules come back here on every pass until the next
        // file period opens, so neither line is logged above debug.
        if remaining < 0 {
            debug!("No timesteps");
            return Ok(RunOutcome::NoTimesteps);
        }

        debug!(
            remaining,
            sample_repetition = ?schedule.schedule().sample_repetition,
            sample_interval = ?schedule.sample_interval(),
            total_grace = ?schedule.total_grace_time(),
            "Running schedule"
        );

        let (mut completed, mut missed) = (0u64, 0u64);
        for _ in 0..remaining {
            match self.activate_once(&schedule, controller) {
                Activation::Completed { .. } => completed += 1,
                Activation::MissedWindow { .. } => missed += 1,
            }
        }

        if missed > 0 {
            warn!(completed, missed, "Schedule finished with missed windows");
        } else {
            debug!(completed, "Schedule finished");
        }
        Ok(RunOutcome::Finished { completed, missed })
    }

    // ── Process loop ──────────────────────────────────────────────────────────

    /// Perform one state transition of the top-level loop.
    ///
    /// `RunningSchedule` re-reads both sources and runs the schedule; any
    /// error moves to `Backoff`.  `Backoff` sleeps for
    /// [`LoopSettings::error_backoff`] and returns to `RunningSchedule`.
    pub fn step<S, T, A, CC>(
        &self,
        state: LoopState,
        schedule_source: &S,
        timing_source: &T,
        controller: &mut ShutterController<A, CC>,
    ) -> LoopState
    where
        S: ScheduleSource + ?Sized,
        T: TimingSource + ?Sized,
        A: Actuator,
        CC: Clock,
    {
        match state {
            LoopState::RunningSchedule => {
                let result = schedule_source.read().and_then(|schedule| {
                    let timing = timing_source.read()?;
                    self.run_schedule(schedule, timing, controller)
                });
                match result {
                    Ok(_) => LoopState::RunningSchedule,
                    Err(e) => {
                        error!(kind = e.kind(), "{e}");
                        LoopState::Backoff(e)
                    }
                }
            }
            LoopState::Backoff(e) => {
                debug!(backoff = ?self.settings.error_backoff, "Backing off after {} error", e.kind());
                self.clock.sleep(self.settings.error_backoff);
                LoopState::RunningSchedule
            }
        }
    }

    /// Run the schedule over and over, re-reading both sources on every
    /// pass.  Never returns.
    pub fn run_forever<S, T, A, CC>(
        &self,
        schedule_source: &S,
        timing_source: &T,
        controller: &mut ShutterController<A, CC>,
    ) -> !
    where
        S: ScheduleSource + ?Sized,
        T: TimingSource + ?Sized,
        A: Actuator,
        CC: Clock,
    {
        let mut state = LoopState::RunningSchedule;
        loop {
            state = self.step(state, schedule_source, timing_source, controller);
        }
    }
}

/// Time left at `now` before the shutter must start opening for the current
/// or next window.  Negative when that moment has already passed.
pub fn lead_time(schedule: &ShutterSampleSchedule, now: DateTime<Utc>) -> TimeDelta {
    (schedule.current_sample_start(now) - now) - to_delta(schedule.total_grace_time())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;
    use crate::config::{ScheduleFile, ShutterParamsFile};
    use crate::shutter::tests::{Move, RecordingActuator};
    use crate::timing::ServoParams;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn at(s: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(s)
    }

    fn timing(servo: u64, grace: u64) -> ShutterTimingParameters {
        ShutterTimingParameters::new(secs(servo), secs(grace))
    }

    /// 40 s file periods, 2 s windows every 10 s.
    fn ten_second_schedule() -> SampleSchedule {
        SampleSchedule::new(secs(40), secs(2), secs(10)).unwrap()
    }

    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── activate_once ─────────────────────────────────────────────────────────

    #[test]
    fn ample_lead_opens_then_closes_once() {
        let clock = SimClock::new(at(1005));
        let actuator = RecordingActuator::new(&clock);
        let log = actuator.clone();
        let mut ctrl = ShutterController::new(actuator, &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let schedule = ShutterSampleSchedule::new(ten_second_schedule(), timing(1, 1)).unwrap();

        let expected_lead = lead_time(&schedule, clock.now());
        let result = activator.activate_once(&schedule, &mut ctrl);

        // window at 1010, total grace 2 s → open at 1008, hold 2 + 2 + 1 = 5 s
        assert_eq!(
            result,
            Activation::Completed {
                sample_start: at(1010),
                opened_at: at(1008),
                closed_at: at(1013),
            }
        );
        assert_eq!(expected_lead, TimeDelta::seconds(3));
        assert_eq!(clock.sleeps(), vec![secs(3), secs(5)]);
        assert_eq!(
            log.moves(),
            vec![(Move::Open, at(1008)), (Move::Closed, at(1013))]
        );
        assert_eq!((ctrl.opened_count(), ctrl.closed_count()), (1, 1));
    }

    #[test]
    fn zero_lead_still_activates() {
        let clock = SimClock::new(at(1008));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let schedule = ShutterSampleSchedule::new(ten_second_schedule(), timing(1, 1)).unwrap();

        let result = activator.activate_once(&schedule, &mut ctrl);
        assert!(matches!(result, Activation::Completed { .. }));
        assert_eq!(clock.sleeps(), vec![Duration::ZERO, secs(5)]);
    }

    #[test]
    fn insufficient_lead_skips_window_and_sleeps_short_interval() {
        // window at 1010 is 1 s away but needs 2 s of grace
        let clock = SimClock::new(at(1009));
        let actuator = RecordingActuator::new(&clock);
        let log = actuator.clone();
        let mut ctrl = ShutterController::new(actuator, &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let schedule = ShutterSampleSchedule::new(ten_second_schedule(), timing(1, 1)).unwrap();

        let result = activator.activate_once(&schedule, &mut ctrl);

        assert_eq!(
            result,
            Activation::MissedWindow {
                sample_start: at(1010)
            }
        );
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(500)]);
        assert!(log.moves().is_empty());
        assert_eq!((ctrl.opened_count(), ctrl.closed_count()), (0, 0));
    }

    #[test]
    fn window_in_progress_is_missed() {
        let clock = SimClock::new(at(1011));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let schedule = ShutterSampleSchedule::new(ten_second_schedule(), timing(1, 1)).unwrap();

        let result = activator.activate_once(&schedule, &mut ctrl);
        assert_eq!(
            result,
            Activation::MissedWindow {
                sample_start: at(1010)
            }
        );
    }

    #[test]
    fn missed_window_sleep_is_configurable() {
        let clock = SimClock::new(at(1009));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let settings = LoopSettings {
            missed_window_sleep: Duration::from_millis(125),
            ..LoopSettings::default()
        };
        let activator = ActivationLoop::new(&clock, settings);
        let schedule = ShutterSampleSchedule::new(ten_second_schedule(), timing(1, 1)).unwrap();

        activator.activate_once(&schedule, &mut ctrl);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(125)]);
    }

    // ── run_schedule ──────────────────────────────────────────────────────────

    #[test]
    fn three_remaining_timesteps_give_three_ordered_cycles() {
        // file period [1000, 1040) → windows at 1010, 1020, 1030 remain
        let clock = SimClock::new(at(1005));
        let actuator = RecordingActuator::new(&clock);
        let log = actuator.clone();
        let mut ctrl = ShutterController::new(actuator, &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());

        let outcome = activator
            .run_schedule(ten_second_schedule(), timing(1, 1), &mut ctrl)
            .unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Finished {
                completed: 3,
                missed: 0
            }
        );
        assert_eq!(outcome.activations(), 3);
        assert_eq!((ctrl.opened_count(), ctrl.closed_count()), (3, 3));

        let moves = log.moves();
        assert_eq!(
            moves,
            vec![
                (Move::Open, at(1008)),
                (Move::Closed, at(1013)),
                (Move::Open, at(1018)),
                (Move::Closed, at(1023)),
                (Move::Open, at(1028)),
                (Move::Closed, at(1033)),
            ]
        );
        // each close strictly precedes the next open
        for pair in moves.windows(2) {
            assert!(pair[0].1 < pair[1].1);
            assert_ne!(pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn negative_timesteps_return_immediately() {
        let clock = SimClock::new(at(1005));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let endless = SampleSchedule::new(Duration::ZERO, secs(2), secs(10)).unwrap();

        let outcome = activator
            .run_schedule(endless, timing(1, 1), &mut ctrl)
            .unwrap();

        assert_eq!(outcome, RunOutcome::NoTimesteps);
        assert_eq!(outcome.activations(), 0);
        assert!(clock.sleeps().is_empty());
        assert_eq!(ctrl.opened_count(), 0);
    }

    #[test]
    fn zero_timesteps_run_no_cycles() {
        // last window of the period (1030) already started
        let clock = SimClock::new(at(1031));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());

        let outcome = activator
            .run_schedule(ten_second_schedule(), timing(1, 1), &mut ctrl)
            .unwrap();
        assert_eq!(outcome, RunOutcome::NoTimesteps);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn each_missed_attempt_consumes_a_timestep() {
        // From 1009 three timesteps remain, but the short sleeps after each miss
        // (1009 → 1009.5 → 1010 → 1010.5) never clear the window at 1010.
        let clock = SimClock::new(at(1009));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());

        let outcome = activator
            .run_schedule(ten_second_schedule(), timing(1, 1), &mut ctrl)
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Finished {
                completed: 0,
                missed: 3
            }
        );
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(500); 3]);
        assert_eq!(ctrl.opened_count(), 0);
    }

    #[test]
    fn timing_violation_fails_before_moving() {
        // 2 × (4 + 1) = 10, not < 10
        let clock = SimClock::new(at(1005));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());

        let result = activator.run_schedule(ten_second_schedule(), timing(4, 1), &mut ctrl);
        assert!(matches!(result, Err(ShutterError::Timing { .. })));
        assert!(clock.sleeps().is_empty());
        assert_eq!(ctrl.opened_count(), 0);
    }

    // ── step / state machine ──────────────────────────────────────────────────

    #[test]
    fn timing_violation_backs_off_then_retries() {
        let clock = SimClock::new(at(1005));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let schedule = ten_second_schedule();
        let bad = timing(4, 1);

        let state = activator.step(LoopState::RunningSchedule, &schedule, &bad, &mut ctrl);
        assert!(matches!(
            state,
            LoopState::Backoff(ShutterError::Timing { .. })
        ));
        assert!(clock.sleeps().is_empty());

        let state = activator.step(state, &schedule, &bad, &mut ctrl);
        assert!(matches!(state, LoopState::RunningSchedule));
        assert_eq!(clock.sleeps(), vec![secs(5)]);
        assert_eq!(ctrl.opened_count(), 0);
    }

    #[test]
    fn exhausted_schedule_goes_straight_back_to_running() {
        let clock = SimClock::new(at(1005));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let endless = SampleSchedule::new(Duration::ZERO, secs(2), secs(10)).unwrap();

        let state = activator.step(LoopState::RunningSchedule, &endless, &timing(1, 1), &mut ctrl);
        assert!(matches!(state, LoopState::RunningSchedule));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn tail_of_file_period_reports_no_timesteps_until_next_period() {
        // last window (1030) closed at 1033; the next period opens at 1040
        let clock = SimClock::new(at(1034));
        let actuator = RecordingActuator::new(&clock);
        let log = actuator.clone();
        let mut ctrl = ShutterController::new(actuator, &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let schedule = ten_second_schedule();

        let outcome = activator
            .run_schedule(schedule, timing(1, 1), &mut ctrl)
            .unwrap();
        assert_eq!(outcome, RunOutcome::NoTimesteps);

        let mut state = LoopState::RunningSchedule;
        for _ in 0..1_000 {
            state = activator.step(state, &schedule, &timing(1, 1), &mut ctrl);
            assert!(matches!(state, LoopState::RunningSchedule));
        }
        assert!(clock.sleeps().is_empty());
        assert!(log.moves().is_empty());

        // once the new period has started its windows run as usual
        clock.advance(secs(11));
        let state = activator.step(state, &schedule, &timing(1, 1), &mut ctrl);
        assert!(matches!(state, LoopState::RunningSchedule));
        assert_eq!(log.moves().first(), Some(&(Move::Open, at(1048))));
        assert_eq!((ctrl.opened_count(), ctrl.closed_count()), (3, 3));
    }

    #[test]
    fn completed_schedule_stays_running() {
        let clock = SimClock::new(at(1005));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());

        let state = activator.step(
            LoopState::RunningSchedule,
            &ten_second_schedule(),
            &timing(1, 1),
            &mut ctrl,
        );
        assert!(matches!(state, LoopState::RunningSchedule));
        assert_eq!(ctrl.closed_count(), 3);
    }

    #[test]
    fn unreadable_schedule_file_backs_off() {
        let clock = SimClock::new(at(1005));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let activator = ActivationLoop::new(&clock, LoopSettings::default());
        let missing = ScheduleFile::new("/nonexistent/schedule.yaml");

        let state = activator.step(LoopState::RunningSchedule, &missing, &timing(1, 1), &mut ctrl);
        assert!(matches!(state, LoopState::Backoff(ShutterError::Source { .. })));
    }

    #[test]
    fn repaired_parameter_file_is_picked_up_after_backoff() {
        let clock = SimClock::new(at(1005));
        let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
        let settings = LoopSettings {
            error_backoff: secs(3),
            ..LoopSettings::default()
        };
        let activator = ActivationLoop::new(&clock, settings);

        let schedule_file =
            yaml_tempfile("file_interval: 40\nsample_interval: 2\nsample_repetition: 10\n");
        let params_file = yaml_tempfile(
            "servo_move_time: 1\ngrace_time: 1\nmin_pulse_width: 3\nmax_pulse_width: 1\n",
        );
        let schedule_source = ScheduleFile::new(schedule_file.path());
        let timing_source = ShutterParamsFile::new(params_file.path(), ServoParams::default());

        let state = activator.step(
            LoopState::RunningSchedule,
            &schedule_source,
            &timing_source,
            &mut ctrl,
        );
        assert!(matches!(
            state,
            LoopState::Backoff(ShutterError::PulseWidth { .. })
        ));

        std::fs::write(params_file.path(), "servo_move_time: 1\ngrace_time: 1\n").unwrap();

        let state = activator.step(state, &schedule_source, &timing_source, &mut ctrl);
        assert!(matches!(state, LoopState::RunningSchedule));
        assert_eq!(clock.now(), at(1008));

        // [1000, 1040) period: windows at 1010 (exactly 2 s of lead), 1020, 1030
        let state = activator.step(state, &schedule_source, &timing_source, &mut ctrl);
        assert!(matches!(state, LoopState::RunningSchedule));
        assert_eq!(ctrl.opened_count(), 3);
        assert_eq!(ctrl.closed_count(), 3);
    }

    // ── Properties ────────────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn completed_cycle_elapses_lead_plus_hold(
            start_ms in 0i64..60_000,
            servo_ms in 0u64..2_000,
            grace_ms in 0u64..2_000,
            interval_ms in 0u64..5_000,
        ) {
            let clock = SimClock::new(at(1_000_000) + TimeDelta::milliseconds(start_ms));
            let mut ctrl = ShutterController::new(RecordingActuator::new(&clock), &clock);
            let activator = ActivationLoop::new(&clock, LoopSettings::default());
            let schedule = ShutterSampleSchedule::new(
                SampleSchedule::new(secs(3600), Duration::from_millis(interval_ms), secs(10)).unwrap(),
                ShutterTimingParameters::new(
                    Duration::from_millis(servo_ms),
                    Duration::from_millis(grace_ms),
                ),
            )
            .unwrap();

            let before = clock.now();
            let lead = lead_time(&schedule, before);
            let result = activator.activate_once(&schedule, &mut ctrl);

            match result {
                Activation::Completed { opened_at, closed_at, .. } => {
                    prop_assert!(lead >= TimeDelta::zero());
                    prop_assert!(closed_at > opened_at || schedule.hold_duration().is_zero());
                    let elapsed = clock.now() - before;
                    prop_assert_eq!(elapsed, lead + to_delta(schedule.hold_duration()));
                    prop_assert_eq!((ctrl.opened_count(), ctrl.closed_count()), (1, 1));
                }
                Activation::MissedWindow { .. } => {
                    prop_assert!(lead < TimeDelta::zero());
                    prop_assert_eq!(clock.sleeps(), vec![DEFAULT_MISSED_WINDOW_SLEEP]);
                    prop_assert_eq!(ctrl.opened_count(), 0);
                }
            }
        }
    }
}
