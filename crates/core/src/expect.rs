// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Compares decoded events against the scripted transaction sequence.

use crate::decoder::{DecodedEvent, Direction};
use crate::signals::SimTime;
use crate::verdict::{Finding, Verdict};
use labwired_probe_config::{ConfigError, ProbeScript, Protocol};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cEntry {
    /// `None` when only handshakes are scripted.
    pub byte: Option<u8>,
    pub ack: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiEntry {
    pub mosi: Option<u32>,
    pub miso: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    I2c(Vec<I2cEntry>),
    Spi { entries: Vec<SpiEntry>, word_width: u8 },
}

impl Script {
    pub fn from_probe(script: &ProbeScript) -> Result<Self, ConfigError> {
        let expect = &script.expect;
        match script.protocol()? {
            Protocol::I2c(_) => {
                let len = script.expected_entries();
                let entries = (0..len)
                    .map(|i| I2cEntry {
                        byte: expect.bytes.as_ref().and_then(|b| b.get(i).copied()),
                        ack: expect
                            .acks
                            .as_ref()
                            .and_then(|a| a.get(i).copied())
                            .unwrap_or(true),
                    })
                    .collect();
                Ok(Script::I2c(entries))
            }
            Protocol::Spi(spi) => {
                let len = script.expected_entries();
                let pick = |enabled: bool, values: &Option<Vec<u32>>, i: usize| {
                    if enabled {
                        values.as_ref().and_then(|v| v.get(i).copied())
                    } else {
                        None
                    }
                };
                let entries = (0..len)
                    .map(|i| SpiEntry {
                        mosi: pick(spi.mosi_enabled, &expect.mosi, i),
                        miso: pick(spi.miso_enabled, &expect.miso, i),
                    })
                    .collect();
                Ok(Script::Spi {
                    entries,
                    word_width: spi.word_width,
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Script::I2c(entries) => entries.len(),
            Script::Spi { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Byte,
    Handshake,
    /// Byte the slave returned on a master read, checked against `read_data`.
    ReadByte,
    Mosi,
    Miso,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Byte => "byte",
            Field::Handshake => "ack",
            Field::ReadByte => "read byte",
            Field::Mosi => "mosi",
            Field::Miso => "miso",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Byte(u8),
    /// `true` for ACK.
    Handshake(bool),
    /// Word value and its width in bits.
    Word(u32, u8),
}

/// Hex digits needed to print a word of `width` bits.
pub fn word_digits(width: u8) -> usize {
    (width as usize).div_ceil(4).max(1)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(b) => write!(f, "0x{:02x}", b),
            Value::Handshake(true) => f.write_str("ack"),
            Value::Handshake(false) => f.write_str("nack"),
            Value::Word(w, width) => write!(f, "0x{:0digits$x}", w, digits = word_digits(*width)),
        }
    }
}

/// Observed content differing from the script. `expected` is `None` past the script end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMismatch {
    pub entry: usize,
    pub field: Field,
    pub expected: Option<Value>,
    pub actual: Value,
    pub time: SimTime,
}

impl fmt::Display for ContentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expected {
            Some(expected) => write!(
                f,
                "entry {} {} expected {} got {}",
                self.entry, self.field, expected, self.actual
            ),
            None => write!(
                f,
                "entry {} unexpected {} {} beyond end of script",
                self.entry, self.field, self.actual
            ),
        }
    }
}

/// Forward cursor over the script.
///
/// I2C entries are a byte plus its handshake: the byte is checked when it
/// arrives and the cursor moves on at the handshake, matched or not. SPI
/// entries are whole words.
///
/// Read data supplied by an I2C slave has a second cursor that moves only on
/// master reads. Leftover read data is not an under-run.
#[derive(Debug, Clone)]
pub struct ExpectationEngine {
    script: Script,
    cursor: usize,
    read_data: Option<Vec<u8>>,
    read_cursor: usize,
    verdict: Verdict,
    finalized: bool,
}

impl ExpectationEngine {
    pub fn new(script: Script) -> Self {
        let verdict = Verdict::new(script.len());
        Self {
            script,
            cursor: 0,
            read_data: None,
            read_cursor: 0,
            verdict,
            finalized: false,
        }
    }

    /// Also check master reads, in order, against `data`.
    pub fn with_read_data(mut self, data: Vec<u8>) -> Self {
        self.read_data = Some(data);
        self
    }

    pub fn from_probe(script: &ProbeScript) -> Result<Self, ConfigError> {
        let engine = Self::new(Script::from_probe(script)?);
        Ok(match &script.expect.read_data {
            Some(data) => engine.with_read_data(data.clone()),
            None => engine,
        })
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    /// Compare one decoded event. Returned mismatches are already recorded.
    pub fn observe(&mut self, event: &DecodedEvent) -> Vec<ContentMismatch> {
        let entry = self.cursor;
        let mut mismatches = match (&self.script, event) {
            (
                Script::I2c(entries),
                DecodedEvent::I2cAddress { byte, time } | DecodedEvent::I2cData { byte, time, .. },
            ) => match entries.get(entry) {
                Some(I2cEntry {
                    byte: Some(expected),
                    ..
                }) if expected != byte => vec![ContentMismatch {
                    entry,
                    field: Field::Byte,
                    expected: Some(Value::Byte(*expected)),
                    actual: Value::Byte(*byte),
                    time: *time,
                }],
                Some(_) => Vec::new(),
                None => vec![ContentMismatch {
                    entry,
                    field: Field::Byte,
                    expected: None,
                    actual: Value::Byte(*byte),
                    time: *time,
                }],
            },
            (Script::I2c(entries), DecodedEvent::I2cAck { time } | DecodedEvent::I2cNack { time }) => {
                let acked = matches!(event, DecodedEvent::I2cAck { .. });
                self.cursor += 1;
                match entries.get(entry) {
                    Some(e) if e.ack != acked => vec![ContentMismatch {
                        entry,
                        field: Field::Handshake,
                        expected: Some(Value::Handshake(e.ack)),
                        actual: Value::Handshake(acked),
                        time: *time,
                    }],
                    // Past the end the byte was already flagged.
                    _ => Vec::new(),
                }
            }
            (Script::Spi { entries, word_width }, DecodedEvent::SpiWord { mosi, miso, time }) => {
                let width = *word_width;
                self.cursor += 1;
                match entries.get(entry) {
                    Some(e) => [(Field::Mosi, e.mosi, *mosi), (Field::Miso, e.miso, *miso)]
                        .into_iter()
                        .filter_map(|(field, expected, actual)| match (expected, actual) {
                            (Some(exp), Some(act)) if exp != act => Some(ContentMismatch {
                                entry,
                                field,
                                expected: Some(Value::Word(exp, width)),
                                actual: Value::Word(act, width),
                                time: *time,
                            }),
                            _ => None,
                        })
                        .collect(),
                    None => {
                        let (field, actual) = match (mosi, miso) {
                            (Some(w), _) => (Field::Mosi, *w),
                            (None, Some(w)) => (Field::Miso, *w),
                            (None, None) => (Field::Mosi, 0),
                        };
                        vec![ContentMismatch {
                            entry,
                            field,
                            expected: None,
                            actual: Value::Word(actual, width),
                            time: *time,
                        }]
                    }
                }
            }
            _ => Vec::new(),
        };

        if let (
            Some(data),
            DecodedEvent::I2cData {
                byte,
                direction: Direction::Read,
                time,
            },
        ) = (&self.read_data, event)
        {
            let index = self.read_cursor;
            self.read_cursor += 1;
            let expected = data.get(index).copied();
            if expected != Some(*byte) {
                mismatches.push(ContentMismatch {
                    entry: index,
                    field: Field::ReadByte,
                    expected: expected.map(Value::Byte),
                    actual: Value::Byte(*byte),
                    time: *time,
                });
            }
        }

        for mismatch in &mismatches {
            self.verdict.record(&Finding::Mismatch(mismatch.clone()));
        }
        mismatches
    }

    pub fn record(&mut self, finding: &Finding) {
        self.verdict.record(finding);
    }

    /// Close the run. Reports an under-run once if the script was not consumed.
    pub fn finalize(&mut self) -> Option<Finding> {
        if self.finalized {
            return None;
        }
        self.finalized = true;
        self.verdict.observed_entries = self.cursor;
        let expected = self.script.len();
        if self.cursor < expected {
            let finding = Finding::Underrun {
                observed: self.cursor,
                expected,
            };
            self.verdict.record(&finding);
            return Some(finding);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i2c_engine(bytes: &[u8], acks: &[bool]) -> ExpectationEngine {
        ExpectationEngine::new(Script::I2c(
            bytes
                .iter()
                .zip(acks)
                .map(|(&b, &a)| I2cEntry {
                    byte: Some(b),
                    ack: a,
                })
                .collect(),
        ))
    }

    #[test]
    fn test_i2c_exact_match() {
        let mut e = i2c_engine(&[0x98, 0x3A], &[true, false]);
        assert!(e.observe(&DecodedEvent::I2cStart { time: 0 }).is_empty());
        assert!(e.observe(&DecodedEvent::I2cAddress { byte: 0x98, time: 1 }).is_empty());
        assert!(e.observe(&DecodedEvent::I2cAck { time: 2 }).is_empty());
        assert!(e
            .observe(&DecodedEvent::I2cData {
                byte: 0x3A,
                direction: Direction::Write,
                time: 3
            })
            .is_empty());
        assert!(e.observe(&DecodedEvent::I2cNack { time: 4 }).is_empty());
        assert_eq!(e.finalize(), None);
        assert!(e.verdict().passed());
        assert_eq!(e.verdict().observed_entries, 2);
    }

    #[test]
    fn test_ack_flip_advances_cursor() {
        let mut e = i2c_engine(&[0x98, 0x3A], &[true, true]);
        e.observe(&DecodedEvent::I2cAddress { byte: 0x98, time: 1 });
        let m = e.observe(&DecodedEvent::I2cNack { time: 2 });
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].to_string(), "entry 0 ack expected ack got nack");
        assert_eq!(e.cursor(), 1);
        assert!(e
            .observe(&DecodedEvent::I2cData {
                byte: 0x3A,
                direction: Direction::Write,
                time: 3
            })
            .is_empty());
        assert_eq!(e.verdict().mismatches, 1);
    }

    #[test]
    fn test_byte_beyond_end() {
        let mut e = i2c_engine(&[0x98], &[true]);
        e.observe(&DecodedEvent::I2cAddress { byte: 0x98, time: 1 });
        e.observe(&DecodedEvent::I2cAck { time: 2 });
        let m = e.observe(&DecodedEvent::I2cData {
            byte: 0x55,
            direction: Direction::Write,
            time: 3,
        });
        assert_eq!(m[0].to_string(), "entry 1 unexpected byte 0x55 beyond end of script");
        assert!(e.observe(&DecodedEvent::I2cAck { time: 4 }).is_empty());
        assert_eq!(e.cursor(), 2);
        assert_eq!(e.finalize(), None);
        assert_eq!(e.verdict().to_string(), "FAIL (mismatch)");
    }

    #[test]
    fn test_read_data_has_own_cursor() {
        let acks = [false, true, true, true, true, false];
        let mut e = ExpectationEngine::new(Script::I2c(
            acks.iter()
                .map(|&ack| I2cEntry { byte: None, ack })
                .collect(),
        ))
        .with_read_data(vec![0x3A, 0xFF]);
        let read = |byte, time| DecodedEvent::I2cData {
            byte,
            direction: Direction::Read,
            time,
        };

        // Address NACKed, then a write of a register pointer: no reads yet.
        e.observe(&DecodedEvent::I2cAddress { byte: 0x98, time: 1 });
        e.observe(&DecodedEvent::I2cNack { time: 2 });
        e.observe(&DecodedEvent::I2cAddress { byte: 0x98, time: 3 });
        e.observe(&DecodedEvent::I2cAck { time: 4 });
        assert!(e
            .observe(&DecodedEvent::I2cData {
                byte: 0x10,
                direction: Direction::Write,
                time: 5
            })
            .is_empty());
        e.observe(&DecodedEvent::I2cAck { time: 6 });
        assert_eq!((e.cursor(), e.read_cursor()), (3, 0));

        e.observe(&DecodedEvent::I2cAddress { byte: 0x99, time: 7 });
        e.observe(&DecodedEvent::I2cAck { time: 8 });
        assert!(e.observe(&read(0x3A, 9)).is_empty());
        e.observe(&DecodedEvent::I2cAck { time: 10 });
        let m = e.observe(&read(0xFE, 11));
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].to_string(), "entry 1 read byte expected 0xff got 0xfe");
        e.observe(&DecodedEvent::I2cNack { time: 12 });
        assert_eq!((e.cursor(), e.read_cursor()), (6, 2));

        assert_eq!(e.finalize(), None);
        assert_eq!(e.verdict().mismatches, 1);
    }

    #[test]
    fn test_read_beyond_read_data() {
        let mut e = ExpectationEngine::new(Script::I2c(vec![
            I2cEntry {
                byte: Some(0x99),
                ack: true,
            },
            I2cEntry {
                byte: None,
                ack: false,
            },
        ]))
        .with_read_data(Vec::new());
        e.observe(&DecodedEvent::I2cAddress { byte: 0x99, time: 1 });
        e.observe(&DecodedEvent::I2cAck { time: 2 });
        let m = e.observe(&DecodedEvent::I2cData {
            byte: 0x42,
            direction: Direction::Read,
            time: 3,
        });
        assert_eq!(m[0].to_string(), "entry 0 unexpected read byte 0x42 beyond end of script");
        e.observe(&DecodedEvent::I2cNack { time: 4 });
        assert_eq!(e.finalize(), None);
        assert_eq!(e.verdict().to_string(), "FAIL (mismatch)");
    }

    #[test]
    fn test_acks_only_script() {
        let mut e = ExpectationEngine::new(Script::I2c(vec![I2cEntry {
            byte: None,
            ack: true,
        }]));
        assert!(e.observe(&DecodedEvent::I2cAddress { byte: 0x12, time: 1 }).is_empty());
        assert!(e.observe(&DecodedEvent::I2cAck { time: 2 }).is_empty());
        assert!(e.verdict().passed());
    }

    #[test]
    fn test_spi_word_fields() {
        let mut e = ExpectationEngine::new(Script::Spi {
            entries: vec![
                SpiEntry {
                    mosi: Some(0x12),
                    miso: None,
                },
                SpiEntry {
                    mosi: Some(0x34),
                    miso: Some(0xA),
                },
            ],
            word_width: 12,
        });
        // miso disabled for the first entry: ignored.
        assert!(e
            .observe(&DecodedEvent::SpiWord {
                mosi: Some(0x12),
                miso: Some(0xFFF),
                time: 1
            })
            .is_empty());
        let m = e.observe(&DecodedEvent::SpiWord {
            mosi: Some(0x35),
            miso: Some(0xB),
            time: 2,
        });
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].to_string(), "entry 1 mosi expected 0x034 got 0x035");
        assert_eq!(m[1].to_string(), "entry 1 miso expected 0x00a got 0x00b");
        let m = e.observe(&DecodedEvent::SpiWord {
            mosi: None,
            miso: Some(1),
            time: 3,
        });
        assert_eq!(m[0].to_string(), "entry 2 unexpected miso 0x001 beyond end of script");
    }

    #[test]
    fn test_underrun_reported_once() {
        let mut e = i2c_engine(&[0x98, 0x3A], &[true, true]);
        let finding = e.finalize();
        assert_eq!(
            finding,
            Some(Finding::Underrun {
                observed: 0,
                expected: 2
            })
        );
        assert_eq!(e.finalize(), None);
        assert_eq!(e.verdict().to_string(), "FAIL (underrun)");
    }

    #[test]
    fn test_engine_from_probe_takes_read_data() {
        let probe = ProbeScript::from_yaml(
            r#"
schema_version: "1.0"
i2c:
  scl: scl
  sda: sda
  speed_khz: 100
expect:
  acks: [true, false]
  read_data: [0x05]
"#,
        )
        .unwrap();
        let mut e = ExpectationEngine::from_probe(&probe).unwrap();
        assert_eq!(e.script().len(), 2);
        e.observe(&DecodedEvent::I2cAddress { byte: 0x99, time: 1 });
        e.observe(&DecodedEvent::I2cAck { time: 2 });
        let m = e.observe(&DecodedEvent::I2cData {
            byte: 0x06,
            direction: Direction::Read,
            time: 3,
        });
        assert_eq!(m[0].field, Field::ReadByte);
        assert_eq!(m[0].expected, Some(Value::Byte(0x05)));
    }

    #[test]
    fn test_script_from_probe() {
        let probe = ProbeScript::from_yaml(
            r#"
schema_version: "1.0"
spi:
  sclk: clk
  mosi: mosi
  miso: miso
  chip_selects: [cs]
  mode: 1
  miso_enabled: false
expect:
  mosi: [1, 2, 3]
  miso: [4, 5, 6]
"#,
        )
        .unwrap();
        let script = Script::from_probe(&probe).unwrap();
        assert_eq!(script.len(), 3);
        match script {
            Script::Spi { entries, word_width } => {
                assert_eq!(word_width, 8);
                assert_eq!(
                    entries[2],
                    SpiEntry {
                        mosi: Some(3),
                        miso: None
                    }
                );
            }
            other => panic!("unexpected script {:?}", other),
        }
    }
}
