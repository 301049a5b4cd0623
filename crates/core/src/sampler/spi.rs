// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::pins::Role;
use crate::signals::{DigitalLevel, Edge, Line, SimTime};
use labwired_probe_config::SpiMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiSymbol {
    /// A chip select moved to its active level. `clock_idle` is whether SCLK sat at CPOL.
    Select {
        cs: usize,
        clock_idle: bool,
        time: SimTime,
    },
    Deselect { cs: usize, time: SimTime },
    /// Sampling edge while a device is selected.
    Sample {
        mosi: bool,
        miso: bool,
        time: SimTime,
    },
    /// Shift edge while a device is selected.
    Shift { time: SimTime },
}

#[derive(Debug, Clone)]
pub struct SpiSampler {
    mode: SpiMode,
    cs_active_low: bool,
    sclk: Line,
    mosi: Line,
    miso: Line,
    chip_selects: Vec<Line>,
}

impl SpiSampler {
    /// Lines start idle: SCLK at CPOL, every chip select inactive.
    pub fn new(mode: SpiMode, cs_active_low: bool, chip_selects: usize) -> Self {
        let inactive = DigitalLevel::from(cs_active_low);
        Self {
            mode,
            cs_active_low,
            sclk: Line::new(DigitalLevel::from(mode.cpol())),
            mosi: Line::default(),
            miso: Line::default(),
            chip_selects: vec![Line::new(inactive); chip_selects],
        }
    }

    fn line_mut(&mut self, role: Role) -> Option<&mut Line> {
        match role {
            Role::Sclk => Some(&mut self.sclk),
            Role::Mosi => Some(&mut self.mosi),
            Role::Miso => Some(&mut self.miso),
            Role::ChipSelect(index) => self.chip_selects.get_mut(index),
            Role::Scl | Role::Sda => None,
        }
    }

    pub fn preset(&mut self, role: Role, level: DigitalLevel) {
        if let Some(line) = self.line_mut(role) {
            line.preset(level);
        }
    }

    fn is_active(&self, level: DigitalLevel) -> bool {
        level.is_high() != self.cs_active_low
    }

    pub fn any_selected(&self) -> bool {
        self.chip_selects.iter().any(|cs| self.is_active(cs.get()))
    }

    pub fn on_edge(&mut self, role: Role, level: DigitalLevel, time: SimTime) -> Option<SpiSymbol> {
        let edge = self.line_mut(role)?.drive(level)?;
        match role {
            Role::ChipSelect(cs) => {
                if self.is_active(level) {
                    Some(SpiSymbol::Select {
                        cs,
                        clock_idle: self.sclk.is_high() == self.mode.cpol(),
                        time,
                    })
                } else {
                    Some(SpiSymbol::Deselect { cs, time })
                }
            }
            Role::Sclk => {
                if !self.any_selected() {
                    return None;
                }
                if (edge == Edge::Rising) == self.mode.samples_on_rising() {
                    Some(SpiSymbol::Sample {
                        mosi: self.mosi.is_high(),
                        miso: self.miso.is_high(),
                        time,
                    })
                } else {
                    Some(SpiSymbol::Shift { time })
                }
            }
            _ => None,
        }
    }
}
