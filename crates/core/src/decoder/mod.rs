// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Protocol state machines grouping sampled symbols into transactions.

pub mod i2c;
pub mod spi;

pub use i2c::{I2cDecoder, I2cState};
pub use spi::{SpiDecoder, SpiState};

use crate::signals::SimTime;
use crate::timing::TimingViolation;

/// Transfer direction taken from the R/W bit of an I2C address byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Write,
    Read,
}

impl Direction {
    pub fn from_address(byte: u8) -> Self {
        if byte & 1 == 1 {
            Direction::Read
        } else {
            Direction::Write
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Write => "write",
            Direction::Read => "read",
        }
    }
}

/// A protocol-level event and the time of the edge that defined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    I2cStart { time: SimTime },
    I2cRepeatedStart { time: SimTime },
    I2cAddress { byte: u8, time: SimTime },
    I2cData { byte: u8, direction: Direction, time: SimTime },
    I2cAck { time: SimTime },
    I2cNack { time: SimTime },
    I2cStop { time: SimTime },
    SpiSelect { cs: usize, time: SimTime },
    /// One full-duplex word; a direction that is not enabled is `None`.
    SpiWord {
        mosi: Option<u32>,
        miso: Option<u32>,
        time: SimTime,
    },
    SpiDeselect { cs: usize, time: SimTime },
}

impl DecodedEvent {
    pub fn time(&self) -> SimTime {
        match self {
            DecodedEvent::I2cStart { time }
            | DecodedEvent::I2cRepeatedStart { time }
            | DecodedEvent::I2cAddress { time, .. }
            | DecodedEvent::I2cData { time, .. }
            | DecodedEvent::I2cAck { time }
            | DecodedEvent::I2cNack { time }
            | DecodedEvent::I2cStop { time }
            | DecodedEvent::SpiSelect { time, .. }
            | DecodedEvent::SpiWord { time, .. }
            | DecodedEvent::SpiDeselect { time, .. } => *time,
        }
    }
}

/// Result of feeding one symbol to a decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub event: Option<DecodedEvent>,
    pub timing: Vec<TimingViolation>,
}

impl Step {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn event(event: DecodedEvent) -> Self {
        Self {
            event: Some(event),
            timing: Vec::new(),
        }
    }
}
