// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::signals::{SimTime, SourceError};

/// Structural violations. Once one occurs, further decoding is meaningless.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("i2c {symbol} condition after {bits} of 8 bits")]
    FramingInsideByte {
        symbol: &'static str,
        bits: u8,
        time: SimTime,
    },
    #[error("i2c {symbol} condition between byte and acknowledge bit")]
    FramingBeforeAck { symbol: &'static str, time: SimTime },
    #[error("i2c stop condition directly after start")]
    StopAfterStart { time: SimTime },
    #[error("chip select cs{cs} deasserted after {bits} of {width} bits")]
    DeselectMidWord {
        cs: usize,
        bits: u8,
        width: u8,
        time: SimTime,
    },
    #[error("chip select cs{other} asserted while cs{active} is selected")]
    MultipleSelect {
        active: usize,
        other: usize,
        time: SimTime,
    },
    #[error("sclk not at idle polarity for mode {mode} when cs{cs} was selected")]
    ClockNotIdle { cs: usize, mode: u8, time: SimTime },
    #[error("run ended in state {state} with a transaction in progress")]
    EndedMidTransaction { state: &'static str, time: SimTime },
    #[error("event at {time} ns precedes the previous event at {previous} ns")]
    TimeReversal { time: SimTime, previous: SimTime },
}

impl ProtocolViolation {
    pub fn time(&self) -> SimTime {
        match self {
            ProtocolViolation::FramingInsideByte { time, .. }
            | ProtocolViolation::FramingBeforeAck { time, .. }
            | ProtocolViolation::StopAfterStart { time }
            | ProtocolViolation::DeselectMidWord { time, .. }
            | ProtocolViolation::MultipleSelect { time, .. }
            | ProtocolViolation::ClockNotIdle { time, .. }
            | ProtocolViolation::EndedMidTransaction { time, .. }
            | ProtocolViolation::TimeReversal { time, .. } => *time,
        }
    }
}

/// The bus went quiet in the middle of a transaction for longer than allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no bus activity for {idle_ns} ns mid-transaction (timeout {timeout_ns} ns)")]
pub struct StallTimeout {
    pub idle_ns: SimTime,
    pub timeout_ns: SimTime,
    pub time: SimTime,
}

/// Failures of the checker itself, as opposed to findings about the bus.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type CheckResult<T> = Result<T, CheckError>;
