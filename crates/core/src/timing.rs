// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bus speed and edge spacing checks derived from sampled edge timestamps.

use crate::signals::SimTime;

const NS_PER_SEC: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimingViolation {
    #[error("{bus} clock {measured_hz} Hz above limit {limit_hz} Hz (target {target_hz} Hz, tolerance {tolerance_percent}%)")]
    TooFast {
        bus: &'static str,
        measured_hz: u64,
        limit_hz: u64,
        target_hz: u64,
        tolerance_percent: u32,
        time: SimTime,
    },
    #[error("{bus} clock {measured_hz} Hz below limit {limit_hz} Hz (target {target_hz} Hz, tolerance {tolerance_percent}%)")]
    TooSlow {
        bus: &'static str,
        measured_hz: u64,
        limit_hz: u64,
        target_hz: u64,
        tolerance_percent: u32,
        time: SimTime,
    },
    #[error("spi cs{cs} to first clock edge {delay_ns} ns, minimum {min_ns} ns")]
    CsToClock {
        cs: usize,
        delay_ns: SimTime,
        min_ns: SimTime,
        time: SimTime,
    },
    #[error("spi gap between words {gap_ns} ns, minimum {min_ns} ns")]
    InterWordGap {
        gap_ns: SimTime,
        min_ns: SimTime,
        time: SimTime,
    },
}

impl TimingViolation {
    pub fn time(&self) -> SimTime {
        match self {
            TimingViolation::TooFast { time, .. }
            | TimingViolation::TooSlow { time, .. }
            | TimingViolation::CsToClock { time, .. }
            | TimingViolation::InterWordGap { time, .. } => *time,
        }
    }
}

/// Frequency implied by `intervals` clock periods spanning `span_ns`.
pub fn measured_hz(intervals: u32, span_ns: SimTime) -> u64 {
    if span_ns == 0 {
        return u64::MAX;
    }
    (intervals as u128 * NS_PER_SEC as u128 / span_ns as u128) as u64
}

/// Compares measured bit rates against a target within a percentage tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedCheck {
    pub bus: &'static str,
    pub target_hz: u64,
    pub tolerance_percent: u32,
    /// When false only over-speed is reported (I2C slaves may stretch the clock).
    pub check_lower: bool,
}

impl SpeedCheck {
    pub fn upper_limit_hz(&self) -> u64 {
        self.scaled(100 + self.tolerance_percent as u64)
    }

    pub fn lower_limit_hz(&self) -> u64 {
        self.scaled(100 - self.tolerance_percent.min(100) as u64)
    }

    /// `target_hz * percent / 100`, saturating at `u64::MAX`.
    fn scaled(&self, percent: u64) -> u64 {
        let hz = self.target_hz as u128 * percent as u128 / 100;
        u64::try_from(hz).unwrap_or(u64::MAX)
    }

    /// Check `intervals` clock periods between the edges at `first` and `last`.
    pub fn check(&self, intervals: u32, first: SimTime, last: SimTime) -> Option<TimingViolation> {
        if intervals == 0 {
            return None;
        }
        let measured = measured_hz(intervals, last.saturating_sub(first));
        let upper = self.upper_limit_hz();
        if measured > upper {
            return Some(TimingViolation::TooFast {
                bus: self.bus,
                measured_hz: measured,
                limit_hz: upper,
                target_hz: self.target_hz,
                tolerance_percent: self.tolerance_percent,
                time: last,
            });
        }
        let lower = self.lower_limit_hz();
        if self.check_lower && measured < lower {
            return Some(TimingViolation::TooSlow {
                bus: self.bus,
                measured_hz: measured,
                limit_hz: lower,
                target_hz: self.target_hz,
                tolerance_percent: self.tolerance_percent,
                time: last,
            });
        }
        None
    }
}
