// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::error::{ProtocolViolation, StallTimeout};
use crate::expect::ContentMismatch;
use crate::signals::SimTime;
use crate::timing::TimingViolation;
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

bitflags! {
    /// Kinds of failure recorded during a run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct FailureKinds: u8 {
        const CONFIG = 1 << 0;
        const TIMING = 1 << 1;
        const PROTOCOL = 1 << 2;
        const MISMATCH = 1 << 3;
        const UNDERRUN = 1 << 4;
        const STALL = 1 << 5;
    }
}

/// Anything reported about the observed bus besides decoded events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Timing(TimingViolation),
    Mismatch(ContentMismatch),
    Protocol(ProtocolViolation),
    Stall(StallTimeout),
    Underrun { observed: usize, expected: usize },
}

impl Finding {
    pub fn kind(&self) -> FailureKinds {
        match self {
            Finding::Timing(_) => FailureKinds::TIMING,
            Finding::Mismatch(_) => FailureKinds::MISMATCH,
            Finding::Protocol(_) => FailureKinds::PROTOCOL,
            Finding::Stall(_) => FailureKinds::STALL,
            Finding::Underrun { .. } => FailureKinds::UNDERRUN,
        }
    }

    /// Fatal findings end decoding for the rest of the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Finding::Protocol(_) | Finding::Stall(_))
    }

    pub fn time(&self) -> Option<SimTime> {
        match self {
            Finding::Timing(v) => Some(v.time()),
            Finding::Mismatch(m) => Some(m.time),
            Finding::Protocol(v) => Some(v.time()),
            Finding::Stall(s) => Some(s.time),
            Finding::Underrun { .. } => None,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Timing(v) => write!(f, "TIMING: {}", v),
            Finding::Mismatch(m) => write!(f, "MISMATCH: {}", m),
            Finding::Protocol(v) => write!(f, "PROTOCOL ERROR: {}", v),
            Finding::Stall(s) => write!(f, "STALL: {}", s),
            Finding::Underrun { observed, expected } => write!(
                f,
                "UNDERRUN: observed {} of {} expected entries",
                observed, expected
            ),
        }
    }
}

/// Accumulated outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub failures: FailureKinds,
    pub mismatches: usize,
    pub timing_violations: usize,
    pub observed_entries: usize,
    pub expected_entries: usize,
    /// Message of the fatal finding that stopped decoding, if any.
    pub fatal: Option<String>,
}

impl Verdict {
    pub fn new(expected_entries: usize) -> Self {
        Self {
            expected_entries,
            ..Self::default()
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn record(&mut self, finding: &Finding) {
        self.failures |= finding.kind();
        match finding {
            Finding::Timing(_) => self.timing_violations += 1,
            Finding::Mismatch(_) => self.mismatches += 1,
            Finding::Protocol(_) | Finding::Stall(_) => {
                if self.fatal.is_none() {
                    self.fatal = Some(finding.to_string());
                }
            }
            Finding::Underrun { .. } => {}
        }
    }

    /// Lowercase failure kinds, e.g. `["timing", "mismatch"]`.
    pub fn failure_names(&self) -> Vec<String> {
        self.failures
            .iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(f, "PASS")
        } else {
            write!(f, "FAIL ({})", self.failure_names().join(", "))
        }
    }
}
