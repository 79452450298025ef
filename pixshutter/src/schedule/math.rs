/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure arithmetic helpers for epoch-anchored periodic grids.
//!
//! All values are microseconds since the Unix epoch (times) or microsecond
//! spans (periods).  These are free functions so they can be tested without
//! building a [`SampleSchedule`](super::SampleSchedule).

/// Largest grid point `<= t`.  `period` must be positive.
///
/// Uses Euclidean division so times before the epoch align downwards too.
pub fn align_down(t: i64, period: i64) -> i64 {
    t - t.rem_euclid(period)
}

/// Smallest grid point `>= t`.  `period` must be positive.
pub fn align_up(t: i64, period: i64) -> i64 {
    let down = align_down(t, period);
    if down == t {
        t
    } else {
        down.saturating_add(period)
    }
}

/// Number of grid points in the half-open range `[from, to)`.
///
/// Returns `0` when `to <= from`.
pub fn grid_points_between(from: i64, to: i64, period: i64) -> i64 {
    if to <= from {
        return 0;
    }
    let first = align_up(from, period);
    if first >= to {
        return 0;
    }
    (to - 1 - first) / period + 1
}

// ── Tests ─────────────────────────────────────────────────────────────────────
