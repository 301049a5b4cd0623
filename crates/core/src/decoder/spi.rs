// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{DecodedEvent, Step};
use crate::error::ProtocolViolation;
use crate::sampler::SpiSymbol;
use crate::signals::SimTime;
use crate::timing::{SpeedCheck, TimingViolation};
use labwired_probe_config::{SpiConfig, SpiMode, TimingLimits};
use tracing::debug;

/// Bits of the word currently being clocked, both directions at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordShift {
    pub bits: u8,
    pub mosi: u32,
    pub miso: u32,
    /// Sampling edge of the first bit.
    pub first_sample: SimTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiState {
    Deselected,
    Selected {
        cs: usize,
        selected_at: SimTime,
        word: WordShift,
        last_word_end: Option<SimTime>,
        clocked: bool,
    },
}

impl SpiState {
    pub fn name(&self) -> &'static str {
        match self {
            SpiState::Deselected => "DESELECTED",
            SpiState::Selected { .. } => "SELECTED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpiDecoder {
    state: SpiState,
    mode: SpiMode,
    word_width: u8,
    msb_first: bool,
    mosi_enabled: bool,
    miso_enabled: bool,
    speed: Option<SpeedCheck>,
    min_cs_to_clock_ns: Option<u64>,
    min_inter_word_ns: Option<u64>,
}

impl SpiDecoder {
    pub fn new(config: &SpiConfig, timing: &TimingLimits) -> Self {
        let enabled = timing.enabled;
        Self {
            state: SpiState::Deselected,
            mode: config.mode,
            word_width: config.word_width,
            msb_first: config.msb_first,
            mosi_enabled: config.mosi_enabled,
            miso_enabled: config.miso_enabled,
            speed: enabled.then(|| SpeedCheck {
                bus: "spi",
                target_hz: config.target_hz(),
                tolerance_percent: timing.tolerance_percent,
                check_lower: true,
            }),
            min_cs_to_clock_ns: config.min_cs_to_clock_ns.filter(|_| enabled),
            min_inter_word_ns: config.min_inter_word_ns.filter(|_| enabled),
        }
    }

    pub fn state(&self) -> SpiState {
        self.state
    }

    pub fn in_transaction(&self) -> bool {
        matches!(self.state, SpiState::Selected { .. })
    }

    fn shift(&self, word: WordShift, mosi: bool, miso: bool, time: SimTime) -> WordShift {
        let mut next = word;
        if word.bits == 0 {
            next.first_sample = time;
        }
        if self.msb_first {
            next.mosi = (word.mosi << 1) | mosi as u32;
            next.miso = (word.miso << 1) | miso as u32;
        } else {
            next.mosi = word.mosi | ((mosi as u32) << word.bits);
            next.miso = word.miso | ((miso as u32) << word.bits);
        }
        next.bits += 1;
        next
    }

    fn first_clock(&self, cs: usize, selected_at: SimTime, time: SimTime) -> Option<TimingViolation> {
        let min_ns = self.min_cs_to_clock_ns?;
        let delay_ns = time.saturating_sub(selected_at);
        (delay_ns < min_ns).then_some(TimingViolation::CsToClock {
            cs,
            delay_ns,
            min_ns,
            time,
        })
    }

    pub fn on_symbol(&mut self, symbol: SpiSymbol) -> Result<Step, ProtocolViolation> {
        let (cs, selected_at, word, last_word_end, clocked) = match self.state {
            SpiState::Deselected => {
                return match symbol {
                    SpiSymbol::Select {
                        cs,
                        clock_idle,
                        time,
                    } => {
                        if !clock_idle {
                            return Err(ProtocolViolation::ClockNotIdle {
                                cs,
                                mode: self.mode.into(),
                                time,
                            });
                        }
                        debug!("spi cs{} selected", cs);
                        self.state = SpiState::Selected {
                            cs,
                            selected_at: time,
                            word: WordShift::default(),
                            last_word_end: None,
                            clocked: false,
                        };
                        Ok(Step::event(DecodedEvent::SpiSelect { cs, time }))
                    }
                    // The sampler drops clock edges without a selected device.
                    _ => Ok(Step::none()),
                };
            }
            SpiState::Selected {
                cs,
                selected_at,
                word,
                last_word_end,
                clocked,
            } => (cs, selected_at, word, last_word_end, clocked),
        };

        match symbol {
            SpiSymbol::Select { cs: other, time, .. } => Err(ProtocolViolation::MultipleSelect {
                active: cs,
                other,
                time,
            }),
            SpiSymbol::Deselect { cs: released, time } => {
                if released != cs {
                    return Ok(Step::none());
                }
                if word.bits != 0 {
                    return Err(ProtocolViolation::DeselectMidWord {
                        cs,
                        bits: word.bits,
                        width: self.word_width,
                        time,
                    });
                }
                debug!("spi cs{} deselected", cs);
                self.state = SpiState::Deselected;
                Ok(Step::event(DecodedEvent::SpiDeselect { cs, time }))
            }
            SpiSymbol::Shift { time } => {
                let mut step = Step::none();
                if !clocked {
                    step.timing.extend(self.first_clock(cs, selected_at, time));
                }
                self.state = SpiState::Selected {
                    cs,
                    selected_at,
                    word,
                    last_word_end,
                    clocked: true,
                };
                Ok(step)
            }
            SpiSymbol::Sample { mosi, miso, time } => {
                let mut step = Step::none();
                if !clocked {
                    step.timing.extend(self.first_clock(cs, selected_at, time));
                }
                if word.bits == 0 {
                    if let (Some(min_ns), Some(end)) = (self.min_inter_word_ns, last_word_end) {
                        let gap_ns = time.saturating_sub(end);
                        if gap_ns < min_ns {
                            step.timing.push(TimingViolation::InterWordGap {
                                gap_ns,
                                min_ns,
                                time,
                            });
                        }
                    }
                }

                let word = self.shift(word, mosi, miso, time);
                if word.bits < self.word_width {
                    self.state = SpiState::Selected {
                        cs,
                        selected_at,
                        word,
                        last_word_end,
                        clocked: true,
                    };
                    return Ok(step);
                }

                if let Some(speed) = self.speed {
                    let intervals = self.word_width as u32 - 1;
                    step.timing
                        .extend(speed.check(intervals, word.first_sample, time));
                }
                step.event = Some(DecodedEvent::SpiWord {
                    mosi: self.mosi_enabled.then_some(word.mosi),
                    miso: self.miso_enabled.then_some(word.miso),
                    time,
                });
                self.state = SpiState::Selected {
                    cs,
                    selected_at,
                    word: WordShift::default(),
                    last_word_end: Some(time),
                    clocked: true,
                };
                Ok(step)
            }
        }
    }

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
