/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! pixshutter – servo shutter driven by a repeating sample schedule
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── activation/     – activate_once / run_schedule / top-level state machine
//! ├── clock           – wall clock + sleep capability (real and simulated)
//! ├── config/         – schedule and shutter-parameter sources (YAML files)
//! ├── error           – ShutterError taxonomy
//! ├── schedule/       – sample timetable and the servo timing invariant
//! ├── shutter/        – ShutterController and actuators
//! └── timing          – servo move / grace times, pulse widths
//! ```

pub mod activation;
pub mod clock;
pub mod config;
pub mod error;
pub mod schedule;
pub mod shutter;
pub mod timing;
