// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Line-oriented report of decoded events, findings and the final verdict.

use crate::config::ReportOptions;
use crate::decoder::DecodedEvent;
use crate::expect::word_digits;
use crate::signals::SimTime;
use crate::verdict::{Finding, Verdict};
use std::fmt;
use std::io::{self, Write};

pub struct ReportWriter<W: Write> {
    sink: W,
    options: ReportOptions,
    word_width: u8,
    lines: usize,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W, options: ReportOptions, word_width: u8) -> Self {
        Self {
            sink,
            options,
            word_width,
            lines: 0,
        }
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    fn line(&mut self, time: Option<SimTime>, text: fmt::Arguments<'_>) -> io::Result<()> {
        if let (true, Some(time)) = (self.options.timestamps, time) {
            write!(self.sink, "@{} ", time)?;
        }
        self.sink.write_fmt(text)?;
        self.sink.write_all(b"\n")?;
        // Lines must reach the sink as they happen, not at the end of the run.
        self.sink.flush()?;
        self.lines += 1;
        Ok(())
    }

    fn word(&self, value: Option<u32>) -> String {
        match value {
            Some(v) => format!("0x{:0digits$x}", v, digits = word_digits(self.word_width)),
            None => "--".to_string(),
        }
    }

    pub fn event(&mut self, event: &DecodedEvent) -> io::Result<()> {
        let time = Some(event.time());
        match event {
            DecodedEvent::I2cStart { .. } => self.line(time, format_args!("I2C start")),
            DecodedEvent::I2cRepeatedStart { .. } => {
                self.line(time, format_args!("I2C repeated start"))
            }
            DecodedEvent::I2cAddress { byte, .. } => self.line(
                time,
                format_args!(
                    "I2C address 0x{:02x} (0x{:02x} {})",
                    byte,
                    *byte >> 1,
                    crate::decoder::Direction::from_address(*byte).as_str()
                ),
            ),
            DecodedEvent::I2cData {
                byte, direction, ..
            } => self.line(
                time,
                format_args!("I2C data 0x{:02x} ({})", byte, direction.as_str()),
            ),
            DecodedEvent::I2cAck { .. } => self.line(time, format_args!("I2C ack")),
            DecodedEvent::I2cNack { .. } => self.line(time, format_args!("I2C nack")),
            DecodedEvent::I2cStop { .. } => self.line(time, format_args!("I2C stop")),
            DecodedEvent::SpiSelect { cs, .. } => {
                self.line(time, format_args!("SPI select cs{}", cs))
            }
            DecodedEvent::SpiDeselect { cs, .. } => {
                self.line(time, format_args!("SPI deselect cs{}", cs))
            }
            DecodedEvent::SpiWord { mosi, miso, .. } => {
                let mosi = self.word(*mosi);
                let miso = self.word(*miso);
                self.line(time, format_args!("SPI word mosi={} miso={}", mosi, miso))
            }
        }
    }

    pub fn finding(&mut self, finding: &Finding) -> io::Result<()> {
        self.line(finding.time(), format_args!("{}", finding))
    }

    pub fn verdict(&mut self, verdict: &Verdict) -> io::Result<()> {
        self.line(None, format_args!("VERDICT: {}", verdict))
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Direction;
    use crate::expect::{ContentMismatch, Field, Value};

    fn render(options: ReportOptions, width: u8, f: impl FnOnce(&mut ReportWriter<Vec<u8>>)) -> String {
        let mut w = ReportWriter::new(Vec::new(), options, width);
        f(&mut w);
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn test_i2c_vocabulary() {
        let out = render(ReportOptions::default(), 8, |w| {
            w.event(&DecodedEvent::I2cStart { time: 0 }).unwrap();
            w.event(&DecodedEvent::I2cAddress { byte: 0x99, time: 1 }).unwrap();
            w.event(&DecodedEvent::I2cAck { time: 2 }).unwrap();
            w.event(&DecodedEvent::I2cData {
                byte: 0x3A,
                direction: Direction::Write,
                time: 3,
            })
            .unwrap();
            w.event(&DecodedEvent::I2cNack { time: 4 }).unwrap();
            w.event(&DecodedEvent::I2cRepeatedStart { time: 5 }).unwrap();
            w.event(&DecodedEvent::I2cStop { time: 6 }).unwrap();
        });
        assert_eq!(
            out,
            "I2C start\nI2C address 0x99 (0x4c read)\nI2C ack\nI2C data 0x3a (write)\n\
             I2C nack\nI2C repeated start\nI2C stop\n"
        );
    }

    #[test]
    fn test_spi_vocabulary() {
        let out = render(ReportOptions::default(), 8, |w| {
            w.event(&DecodedEvent::SpiSelect { cs: 0, time: 0 }).unwrap();
            w.event(&DecodedEvent::SpiWord {
                mosi: Some(0x12),
                miso: None,
                time: 1,
            })
            .unwrap();
            w.event(&DecodedEvent::SpiDeselect { cs: 0, time: 2 }).unwrap();
        });
        assert_eq!(out, "SPI select cs0\nSPI word mosi=0x12 miso=--\nSPI deselect cs0\n");
    }

    #[test]
    fn test_findings_and_verdict() {
        let mut verdict = Verdict::new(1);
        let mismatch = Finding::Mismatch(ContentMismatch {
            entry: 0,
            field: Field::Byte,
            expected: Some(Value::Byte(0x98)),
            actual: Value::Byte(0x99),
            time: 10,
        });
        verdict.record(&mismatch);
        let out = render(ReportOptions::with_timestamps(true), 8, |w| {
            w.finding(&mismatch).unwrap();
            w.verdict(&verdict).unwrap();
            assert_eq!(w.lines_written(), 2);
        });
        assert_eq!(
            out,
            "@10 MISMATCH: entry 0 byte expected 0x98 got 0x99\nVERDICT: FAIL (mismatch)\n"
        );
    }

    #[test]
    fn test_timestamps_on_events() {
        let out = render(ReportOptions::with_timestamps(true), 16, |w| {
            w.event(&DecodedEvent::SpiWord {
                mosi: Some(0xBEEF),
                miso: Some(1),
                time: 1_250,
            })
            .unwrap();
        });
        assert_eq!(out, "@1250 SPI word mosi=0xbeef miso=0x0001\n");
    }
}
