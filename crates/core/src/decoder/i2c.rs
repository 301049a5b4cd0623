// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{DecodedEvent, Direction, Step};
use crate::error::ProtocolViolation;
use crate::sampler::I2cSymbol;
use crate::signals::SimTime;
use crate::timing::SpeedCheck;
use tracing::debug;

/// Bits shifted in so far for the current byte, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftIn {
    pub value: u8,
    pub bits: u8,
    /// SCL rising edge of the first bit.
    pub first_edge: SimTime,
}

impl ShiftIn {
    fn push(mut self, bit: bool, time: SimTime) -> Self {
        if self.bits == 0 {
            self.first_edge = time;
        }
        self.value = (self.value << 1) | bit as u8;
        self.bits += 1;
        self
    }

    fn is_complete(&self) -> bool {
        self.bits == 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cState {
    Idle,
    StartSeen,
    Address(ShiftIn),
    AckAddr {
        byte: u8,
        first_edge: SimTime,
    },
    Data {
        direction: Direction,
        shift: ShiftIn,
    },
    AckData {
        direction: Direction,
        byte: u8,
        first_edge: SimTime,
    },
    /// Reached on a stop condition; behaves exactly like `Idle`.
    Stop,
}

impl I2cState {
    pub fn name(&self) -> &'static str {
        match self {
            I2cState::Idle => "IDLE",
            I2cState::StartSeen => "START_SEEN",
            I2cState::Address(_) => "ADDRESS",
            I2cState::AckAddr { .. } => "ACK_ADDR",
            I2cState::Data { .. } => "DATA",
            I2cState::AckData { .. } => "ACK_DATA",
            I2cState::Stop => "STOP",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, I2cState::Idle | I2cState::Stop)
    }
}

fn symbol_name(symbol: &I2cSymbol) -> &'static str {
    match symbol {
        I2cSymbol::Start(_) => "start",
        I2cSymbol::Stop(_) => "stop",
        I2cSymbol::Bit { .. } => "bit",
    }
}

fn handshake(bit: bool, time: SimTime) -> DecodedEvent {
    // Acknowledge is active low.
    if bit {
        DecodedEvent::I2cNack { time }
    } else {
        DecodedEvent::I2cAck { time }
    }
}

/// The I2C transition function.
///
/// The decoder never decides whether a NACK ends the transfer: after any
/// handshake it follows whatever the master does next (more bytes, a
/// repeated start or a stop).
pub fn transition(
    state: I2cState,
    symbol: I2cSymbol,
) -> Result<(I2cState, Option<DecodedEvent>), ProtocolViolation> {
    use I2cState as S;
    use I2cSymbol as Y;

    Ok(match (state, symbol) {
        (S::Idle | S::Stop, Y::Start(time)) => (S::StartSeen, Some(DecodedEvent::I2cStart { time })),
        // Stray clocks and stops on an idle bus are initialisation noise.
        (S::Idle | S::Stop, Y::Stop(_) | Y::Bit { .. }) => (state, None),

        (S::StartSeen, Y::Start(time)) => (
            S::StartSeen,
            Some(DecodedEvent::I2cRepeatedStart { time }),
        ),
        (S::StartSeen, Y::Stop(time)) => return Err(ProtocolViolation::StopAfterStart { time }),
        (S::StartSeen, Y::Bit { value, time }) => {
            (S::Address(ShiftIn::default().push(value, time)), None)
        }

        (S::Address(shift), Y::Bit { value, time }) => {
            let shift = shift.push(value, time);
            if shift.is_complete() {
                (
                    S::AckAddr {
                        byte: shift.value,
                        first_edge: shift.first_edge,
                    },
                    Some(DecodedEvent::I2cAddress {
                        byte: shift.value,
                        time,
                    }),
                )
            } else {
                (S::Address(shift), None)
            }
        }

        (S::AckAddr { byte, .. }, Y::Bit { value, time }) => (
            S::Data {
                direction: Direction::from_address(byte),
                shift: ShiftIn::default(),
            },
            Some(handshake(value, time)),
        ),

        (S::Data { direction, shift }, Y::Bit { value, time }) => {
            let shift = shift.push(value, time);
            if shift.is_complete() {
                (
                    S::AckData {
                        direction,
                        byte: shift.value,
                        first_edge: shift.first_edge,
                    },
                    Some(DecodedEvent::I2cData {
                        byte: shift.value,
                        direction,
                        time,
                    }),
                )
            } else {
                (S::Data { direction, shift }, None)
            }
        }
        (S::Data { shift, .. }, Y::Start(time)) if shift.bits == 0 => (
            S::StartSeen,
            Some(DecodedEvent::I2cRepeatedStart { time }),
        ),
        (S::Data { shift, .. }, Y::Stop(time)) if shift.bits == 0 => {
            (S::Stop, Some(DecodedEvent::I2cStop { time }))
        }

        (S::AckData { direction, .. }, Y::Bit { value, time }) => (
            S::Data {
                direction,
                shift: ShiftIn::default(),
            },
            Some(handshake(value, time)),
        ),

        (S::Address(shift) | S::Data { shift, .. }, Y::Start(time) | Y::Stop(time)) => {
            return Err(ProtocolViolation::FramingInsideByte {
                symbol: symbol_name(&symbol),
                bits: shift.bits,
                time,
            })
        }
        (S::AckAddr { .. } | S::AckData { .. }, Y::Start(time) | Y::Stop(time)) => {
            return Err(ProtocolViolation::FramingBeforeAck {
                symbol: symbol_name(&symbol),
                time,
            })
        }
    })
}

#[derive(Debug, Clone)]
pub struct I2cDecoder {
    state: I2cState,
    speed: Option<SpeedCheck>,
}

impl I2cDecoder {
    pub fn new(speed: Option<SpeedCheck>) -> Self {
        Self {
            state: I2cState::Idle,
            speed,
        }
    }

    pub fn state(&self) -> I2cState {
        self.state
    }

    pub fn in_transaction(&self) -> bool {
        !self.state.is_idle()
    }

    pub fn on_symbol(&mut self, symbol: I2cSymbol) -> Result<Step, ProtocolViolation> {
        // Eight SCL periods separate the first data bit from the acknowledge bit.
        let timing = match (self.state, symbol, self.speed) {
            (
                I2cState::AckAddr { first_edge, .. } | I2cState::AckData { first_edge, .. },
                I2cSymbol::Bit { time, .. },
                Some(speed),
            ) => speed.check(8, first_edge, time),
            _ => None,
        };

        let (next, event) = transition(self.state, symbol)?;
        if next.name() != self.state.name() {
            debug!("i2c {} -> {}", self.state.name(), next.name());
        }
        self.state = next;

        Ok(Step {
            event,
            timing: timing.into_iter().collect(),
        })
    }

    /// End of run: anything but an idle bus means the transaction was cut short.
    pub fn finish(&self, time: SimTime) -> Result<(), ProtocolViolation> {
        if self.in_transaction() {
            return Err(ProtocolViolation::EndedMidTransaction {
                state: self.state.name(),
                time,
            });
        }
        Ok(())
    }
}
