// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bus master waveform synthesis.
//!
//! Generates the pin activity an ideal I2C or SPI master (and its slave)
//! would produce, so checks can be exercised against exact traces.

use crate::signals::{DigitalLevel, SignalEvent, SimTime, SourceEvent};
use labwired_probe_config::{ConfigError, ProbeScript, Protocol, SpiConfig, SpiMode};

const NS_PER_SEC: u64 = 1_000_000_000;

fn half_period_ns(speed_hz: u64) -> SimTime {
    (NS_PER_SEC / speed_hz.max(1).saturating_mul(2)).max(2)
}

#[derive(Debug, Clone)]
struct Recorder {
    pins: Vec<String>,
    levels: Vec<DigitalLevel>,
    time: SimTime,
    events: Vec<SourceEvent>,
}

impl Recorder {
    fn new(pins: Vec<(String, DigitalLevel)>) -> Self {
        let events = pins
            .iter()
            .map(|(pin, level)| SourceEvent::Initial {
                pin: pin.clone(),
                level: *level,
            })
            .collect();
        let (pins, levels) = pins.into_iter().unzip();
        Self {
            pins,
            levels,
            time: 0,
            events,
        }
    }

    fn wait(&mut self, ns: SimTime) {
        self.time += ns;
    }

    fn set(&mut self, index: usize, level: DigitalLevel) {
        if self.levels[index] == level {
            return;
        }
        self.levels[index] = level;
        self.events.push(SourceEvent::Transition(SignalEvent::new(
            self.pins[index].clone(),
            level,
            self.time,
        )));
    }

    fn level(&self, index: usize) -> DigitalLevel {
        self.levels[index]
    }

    fn finish(mut self, tail_ns: SimTime) -> Vec<SourceEvent> {
        self.time += tail_ns;
        self.events.push(SourceEvent::Advance(self.time));
        self.events
    }
}

const SCL: usize = 0;
const SDA: usize = 1;

/// Open-drain I2C waveform. Both lines idle high.
#[derive(Debug, Clone)]
pub struct I2cWaveform {
    rec: Recorder,
    half: SimTime,
}

impl I2cWaveform {
    pub fn new(scl: &str, sda: &str, speed_hz: u64) -> Self {
        Self {
            rec: Recorder::new(vec![
                (scl.to_string(), DigitalLevel::High),
                (sda.to_string(), DigitalLevel::High),
            ]),
            half: half_period_ns(speed_hz),
        }
    }

    fn quarter(&self) -> SimTime {
        self.half / 2
    }

    pub fn idle(mut self, ns: SimTime) -> Self {
        self.rec.wait(ns);
        self
    }

    /// Slave holds SCL low for `ns` before the next bit.
    pub fn stretch(self, ns: SimTime) -> Self {
        self.idle(ns)
    }

    /// Start condition; a repeated start when issued mid-transaction.
    pub fn start(mut self) -> Self {
        let q = self.quarter();
        if !self.rec.level(SDA).is_high() {
            self.rec.wait(q);
            self.rec.set(SDA, DigitalLevel::High);
        }
        if !self.rec.level(SCL).is_high() {
            self.rec.wait(q);
            self.rec.set(SCL, DigitalLevel::High);
        }
        self.rec.wait(q);
        self.rec.set(SDA, DigitalLevel::Low);
        self.rec.wait(q);
        self.rec.set(SCL, DigitalLevel::Low);
        self
    }

    pub fn bit(mut self, value: bool) -> Self {
        let q = self.quarter();
        self.rec.wait(q);
        self.rec.set(SDA, value.into());
        self.rec.wait(q);
        self.rec.set(SCL, DigitalLevel::High);
        self.rec.wait(self.half);
        self.rec.set(SCL, DigitalLevel::Low);
        self
    }

    /// Eight data bits MSB first followed by the slave's handshake.
    pub fn byte(self, value: u8, ack: bool) -> Self {
        (0..8)
            .fold(self, |w, i| w.bit(value & (0x80 >> i) != 0))
            .bit(!ack)
    }

    pub fn stop(mut self) -> Self {
        let q = self.quarter();
        self.rec.wait(q);
        self.rec.set(SDA, DigitalLevel::Low);
        self.rec.wait(q);
        self.rec.set(SCL, DigitalLevel::High);
        self.rec.wait(q);
        self.rec.set(SDA, DigitalLevel::High);
        self
    }

    /// Closes the trace with an idle tail.
    pub fn into_events(self) -> Vec<SourceEvent> {
        let tail = self.half * 4;
        self.rec.finish(tail)
    }
}

const SCLK: usize = 0;

/// Full-duplex SPI waveform following the configured mode and framing.
#[derive(Debug, Clone)]
pub struct SpiWaveform {
    rec: Recorder,
    /// Recorder indices of the data lines; unbound lines are not recorded.
    mosi: Option<usize>,
    miso: Option<usize>,
    cs_base: usize,
    half: SimTime,
    mode: SpiMode,
    cs_active_low: bool,
    msb_first: bool,
    word_width: u8,
}

impl SpiWaveform {
    /// Clocked at the speed the configuration's divider produces.
    pub fn for_config(config: &SpiConfig) -> Self {
        let idle_cs = DigitalLevel::from(config.cs_active_low);
        let mut pins = vec![(config.sclk.clone(), DigitalLevel::from(config.mode.cpol()))];
        let mut data_line = |pin: &Option<String>| {
            pin.as_ref().map(|pin| {
                pins.push((pin.clone(), DigitalLevel::Low));
                pins.len() - 1
            })
        };
        let mosi = data_line(&config.mosi);
        let miso = data_line(&config.miso);
        let cs_base = pins.len();
        pins.extend(config.chip_selects.iter().map(|cs| (cs.clone(), idle_cs)));
        Self {
            rec: Recorder::new(pins),
            mosi,
            miso,
            cs_base,
            half: half_period_ns(config.target_hz()),
            mode: config.mode,
            cs_active_low: config.cs_active_low,
            msb_first: config.msb_first,
            word_width: config.word_width,
        }
    }

    /// Override the SCLK half period, e.g. to model a misconfigured divider.
    pub fn with_half_period(mut self, ns: SimTime) -> Self {
        self.half = ns.max(2);
        self
    }

    pub fn idle(mut self, ns: SimTime) -> Self {
        self.rec.wait(ns);
        self
    }

    fn cs_level(&self, active: bool) -> DigitalLevel {
        DigitalLevel::from(active != self.cs_active_low)
    }

    pub fn select(mut self, cs: usize) -> Self {
        self.rec.wait(self.half);
        let level = self.cs_level(true);
        self.rec.set(self.cs_base + cs, level);
        self.rec.wait(self.half);
        self
    }

    pub fn deselect(mut self, cs: usize) -> Self {
        self.rec.wait(self.half);
        let level = self.cs_level(false);
        self.rec.set(self.cs_base + cs, level);
        self.rec.wait(self.half);
        self
    }

    fn drive_data(&mut self, mosi: bool, miso: bool) {
        for (line, value) in [(self.mosi, mosi), (self.miso, miso)] {
            if let Some(index) = line {
                self.rec.set(index, value.into());
            }
        }
    }

    fn clock_bit(&mut self, mosi: bool, miso: bool) {
        let q = self.half / 2;
        let idle = DigitalLevel::from(self.mode.cpol());
        let active = DigitalLevel::from(!self.mode.cpol());
        if self.mode.cpha() {
            self.rec.set(SCLK, active);
            self.rec.wait(q);
            self.drive_data(mosi, miso);
            self.rec.wait(self.half - q);
            self.rec.set(SCLK, idle);
            self.rec.wait(self.half);
        } else {
            self.drive_data(mosi, miso);
            self.rec.wait(q);
            self.rec.set(SCLK, active);
            self.rec.wait(self.half);
            self.rec.set(SCLK, idle);
            self.rec.wait(self.half - q);
        }
    }

    /// Clock `bits` raw bit pairs, which may be less than a word.
    pub fn bits(mut self, bits: &[(bool, bool)]) -> Self {
        for &(mosi, miso) in bits {
            self.clock_bit(mosi, miso);
        }
        self
    }

    /// One word in the configured bit order.
    pub fn word(self, mosi: u32, miso: u32) -> Self {
        let width = self.word_width as u32;
        let bits: Vec<(bool, bool)> = (0..width)
            .map(|i| {
                let shift = if self.msb_first { width - 1 - i } else { i };
                ((mosi >> shift) & 1 == 1, (miso >> shift) & 1 == 1)
            })
            .collect();
        self.bits(&bits)
    }

    pub fn into_events(self) -> Vec<SourceEvent> {
        let tail = self.half * 4;
        self.rec.finish(tail)
    }
}

/// The trace a conforming master would produce for `script`: one transaction
/// carrying every scripted entry, clocked at the configured speed unless
/// `speed_hz` overrides it. For I2C the first scripted byte is the address.
pub fn reference_trace(
    script: &ProbeScript,
    speed_hz: Option<u64>,
) -> Result<Vec<SourceEvent>, ConfigError> {
    match script.protocol()? {
        Protocol::I2c(i2c) => {
            let bytes = script
                .expect
                .bytes
                .as_ref()
                .ok_or(ConfigError::MissingExpectation("bytes"))?;
            let acks = script.expect.acks.as_deref().unwrap_or(&[]);
            let wave = I2cWaveform::new(&i2c.scl, &i2c.sda, speed_hz.unwrap_or(i2c.target_hz()))
                .start();
            Ok(bytes
                .iter()
                .enumerate()
                .fold(wave, |w, (i, &byte)| {
                    w.byte(byte, acks.get(i).copied().unwrap_or(true))
                })
                .stop()
                .into_events())
        }
        Protocol::Spi(spi) => {
            let mut wave = SpiWaveform::for_config(spi);
            if let Some(speed) = speed_hz {
                wave = wave.with_half_period(half_period_ns(speed));
            }
            let words = |values: &Option<Vec<u32>>, i: usize| {
                values.as_ref().and_then(|v| v.get(i).copied()).unwrap_or(0)
            };
            let wave = (0..script.expected_entries())
                .fold(wave.select(0), |w, i| {
                    w.word(words(&script.expect.mosi, i), words(&script.expect.miso, i))
                })
                .deselect(0);
            Ok(wave.into_events())
        }
    }
}
