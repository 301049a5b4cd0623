// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::pins::Role;
use crate::signals::{DigitalLevel, Edge, Line, SimTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cSymbol {
    /// SDA fell while SCL was high.
    Start(SimTime),
    /// SDA rose while SCL was high.
    Stop(SimTime),
    /// SDA level sampled at the SCL rising edge at `time`.
    Bit { value: bool, time: SimTime },
}

/// Samples SDA on SCL rising edges.
///
/// The sampled bit is held until SCL falls: if SDA moves while SCL is still
/// high the pulse was a start or stop condition, not data. Sampling follows the
/// observed clock, so clock stretching needs no special handling.
#[derive(Debug, Clone)]
pub struct I2cSampler {
    scl: Line,
    sda: Line,
    pending: Option<(bool, SimTime)>,
}

impl Default for I2cSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cSampler {
    /// Both lines start released (pulled high).
    pub fn new() -> Self {
        Self {
            scl: Line::new(DigitalLevel::High),
            sda: Line::new(DigitalLevel::High),
            pending: None,
        }
    }

    pub fn preset(&mut self, role: Role, level: DigitalLevel) {
        match role {
            Role::Scl => self.scl.preset(level),
            Role::Sda => self.sda.preset(level),
            _ => {}
        }
    }

    pub fn on_edge(&mut self, role: Role, level: DigitalLevel, time: SimTime) -> Option<I2cSymbol> {
        match role {
            Role::Scl => match self.scl.drive(level)? {
                Edge::Rising => {
                    self.pending = Some((self.sda.is_high(), time));
                    None
                }
                Edge::Falling => self
                    .pending
                    .take()
                    .map(|(value, time)| I2cSymbol::Bit { value, time }),
            },
            Role::Sda => {
                let edge = self.sda.drive(level)?;
                if !self.scl.is_high() {
                    return None;
                }
                self.pending = None;
                Some(match edge {
                    Edge::Falling => I2cSymbol::Start(time),
                    Edge::Rising => I2cSymbol::Stop(time),
                })
            }
            _ => None,
        }
    }

    pub fn scl(&self) -> DigitalLevel {
        self.scl.get()
    }

    pub fn sda(&self) -> DigitalLevel {
        self.sda.get()
    }
}
