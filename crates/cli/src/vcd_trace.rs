// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! VCD traces on both sides of the checker: a recorded simulation read back
//! as a signal source, and synthesized bus activity written out as a dump.

use labwired_probe_core::signals::{SourceError, SourceEvent};
use labwired_probe_core::{DigitalLevel, SignalEvent, SignalSource, SimTime};
use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, Write};
use tracing::{debug, trace};
use vcd::{Command, IdCode, Parser, ScopeItem, SimulationCommand, TimescaleUnit, Value, Writer};

fn malformed(e: impl std::fmt::Display) -> SourceError {
    SourceError::Malformed(e.to_string())
}

/// Nanoseconds per timescale unit as a fraction.
fn unit_ns(unit: TimescaleUnit) -> (u128, u128) {
    match unit {
        TimescaleUnit::S => (1_000_000_000, 1),
        TimescaleUnit::MS => (1_000_000, 1),
        TimescaleUnit::US => (1_000, 1),
        TimescaleUnit::NS => (1, 1),
        TimescaleUnit::PS => (1, 1_000),
        TimescaleUnit::FS => (1, 1_000_000),
    }
}

fn level_of(value: Value) -> Option<DigitalLevel> {
    match value {
        Value::V0 => Some(DigitalLevel::Low),
        Value::V1 => Some(DigitalLevel::High),
        // Released open-drain line.
        Value::Z => Some(DigitalLevel::High),
        Value::X => None,
    }
}

fn collect_vars(items: &[ScopeItem], path: &mut Vec<String>, out: &mut Vec<(String, String, IdCode)>) {
    for item in items {
        match item {
            ScopeItem::Scope(scope) => {
                path.push(scope.identifier.clone());
                collect_vars(&scope.items, path, out);
                path.pop();
            }
            ScopeItem::Var(var) => {
                let mut full = path.clone();
                full.push(var.reference.clone());
                out.push((full.join("."), var.reference.clone(), var.code));
            }
            _ => {}
        }
    }
}

/// Streams a VCD dump as pin events for the requested pins.
///
/// Pins are matched against the full dotted variable path (`top.i2c.scl`)
/// first and the bare variable name second. Values dumped before the first
/// timestamp or inside `$dumpvars` are initial levels, not transitions.
pub struct VcdSource<R: BufRead> {
    parser: Parser<R>,
    pins: HashMap<IdCode, Vec<String>>,
    scale: (u128, u128),
    time: SimTime,
    seen_timestamp: bool,
    in_dumpvars: bool,
    pending: VecDeque<SourceEvent>,
}

impl<R: BufRead> VcdSource<R> {
    pub fn new(reader: R, pins: &[&str]) -> Result<Self, SourceError> {
        let mut parser = Parser::new(reader);
        let header = parser.parse_header().map_err(malformed)?;

        let (multiplier, unit) = header.timescale.unwrap_or((1, TimescaleUnit::NS));
        let (num, den) = unit_ns(unit);
        let scale = (num * multiplier as u128, den);

        let mut vars = Vec::new();
        collect_vars(&header.items, &mut Vec::new(), &mut vars);

        let mut map: HashMap<IdCode, Vec<String>> = HashMap::new();
        for pin in pins {
            let by_path = vars.iter().find(|(path, _, _)| path == pin);
            let code = match by_path {
                Some((_, _, code)) => *code,
                None => {
                    let named: Vec<&IdCode> = vars
                        .iter()
                        .filter(|(_, name, _)| name == pin)
                        .map(|(_, _, code)| code)
                        .collect();
                    match named.as_slice() {
                        [code] => **code,
                        [] => {
                            return Err(SourceError::Malformed(format!(
                                "pin {} not found in trace",
                                pin
                            )))
                        }
                        _ => {
                            return Err(SourceError::Malformed(format!(
                                "pin {} is ambiguous in trace, use the full scope path",
                                pin
                            )))
                        }
                    }
                }
            };
            debug!("Pin {} bound to VCD id {}", pin, code);
            map.entry(code).or_default().push(pin.to_string());
        }

        Ok(Self {
            parser,
            pins: map,
            scale,
            time: 0,
            seen_timestamp: false,
            in_dumpvars: false,
            pending: VecDeque::new(),
        })
    }

    fn to_ns(&self, ticks: u64) -> SimTime {
        (ticks as u128 * self.scale.0 / self.scale.1) as SimTime
    }

    fn change(&mut self, code: IdCode, value: Value) {
        let Some(pins) = self.pins.get(&code) else {
            return;
        };
        let Some(level) = level_of(value) else {
            trace!("Ignoring unknown value on {:?}", pins);
            return;
        };
        let initial = self.in_dumpvars || !self.seen_timestamp;
        for pin in pins {
            self.pending.push_back(if initial {
                SourceEvent::Initial {
                    pin: pin.clone(),
                    level,
                }
            } else {
                SourceEvent::Transition(SignalEvent::new(pin.clone(), level, self.time))
            });
        }
    }
}

impl<R: BufRead> SignalSource for VcdSource<R> {
    fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            let Some(command) = self.parser.next() else {
                return Ok(None);
            };
            match command.map_err(malformed)? {
                Command::Timestamp(ticks) => {
                    self.time = self.to_ns(ticks);
                    self.seen_timestamp = true;
                    self.pending.push_back(SourceEvent::Advance(self.time));
                }
                Command::ChangeScalar(code, value) => self.change(code, value),
                Command::Begin(SimulationCommand::Dumpvars) => self.in_dumpvars = true,
                Command::End(SimulationCommand::Dumpvars) => self.in_dumpvars = false,
                other => trace!("Skipping VCD command {:?}", other),
            }
        }
    }
}

/// Write pin events as a 1 ns timescale VCD.
///
/// Dotted pin ids become nested scopes; other ids are placed in a `probe` module.
pub fn write_vcd<W: Write>(out: W, events: &[SourceEvent]) -> anyhow::Result<()> {
    let mut writer = Writer::new(out);
    writer.timescale(1, TimescaleUnit::NS)?;

    let mut pins: Vec<&str> = Vec::new();
    for event in events {
        let pin = match event {
            SourceEvent::Initial { pin, .. } => pin.as_str(),
            SourceEvent::Transition(ev) => ev.pin.as_str(),
            SourceEvent::Advance(_) => continue,
        };
        if !pins.contains(&pin) {
            pins.push(pin);
        }
    }

    let mut ids: HashMap<&str, IdCode> = HashMap::new();
    for &pin in &pins {
        let mut parts: Vec<&str> = pin.split('.').collect();
        let name = parts.pop().unwrap_or(pin);
        if parts.is_empty() {
            parts.push("probe");
        }
        for scope in &parts {
            writer.add_module(scope)?;
        }
        ids.insert(pin, writer.add_wire(1, name)?);
        for _ in &parts {
            writer.upscope()?;
        }
    }
    writer.enddefinitions()?;

    let value = |level: DigitalLevel| if level.is_high() { Value::V1 } else { Value::V0 };
    let mut current: Option<SimTime> = None;
    for event in events {
        match event {
            SourceEvent::Initial { pin, level } => {
                if let Some(id) = ids.get(pin.as_str()) {
                    writer.change_scalar(*id, value(*level))?;
                }
            }
            SourceEvent::Transition(ev) => {
                if current != Some(ev.time) {
                    writer.timestamp(ev.time)?;
                    current = Some(ev.time);
                }
                if let Some(id) = ids.get(ev.pin.as_str()) {
                    writer.change_scalar(*id, value(ev.level))?;
                }
            }
            SourceEvent::Advance(time) => {
                if current != Some(*time) {
                    writer.timestamp(*time)?;
                    current = Some(*time);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain<S: SignalSource>(source: &mut S) -> Vec<SourceEvent> {
        let mut out = Vec::new();
        while let Some(ev) = source.next_event().unwrap() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn test_reads_hand_written_dump() {
        let dump = "\
$timescale 10 ns $end
$scope module top $end
$var wire 1 ! scl $end
$var wire 1 \" sda $end
$var wire 1 # led $end
$upscope $end
$enddefinitions $end
$dumpvars
1!
1\"
0#
$end
#0
#5
0\"
x!
#7
1#
0!
";
        let mut source = VcdSource::new(Cursor::new(dump), &["top.scl", "sda"]).unwrap();
        let events = drain(&mut source);
        assert_eq!(
            events,
            vec![
                SourceEvent::Initial {
                    pin: "top.scl".to_string(),
                    level: DigitalLevel::High
                },
                SourceEvent::Initial {
                    pin: "sda".to_string(),
                    level: DigitalLevel::High
                },
                SourceEvent::Advance(0),
                SourceEvent::Advance(50),
                SourceEvent::Transition(SignalEvent::new("sda", DigitalLevel::Low, 50)),
                SourceEvent::Advance(70),
                SourceEvent::Transition(SignalEvent::new("top.scl", DigitalLevel::Low, 70)),
            ]
        );
    }

    #[test]
    fn test_missing_pin() {
        let dump = "$scope module top $end\n$var wire 1 ! scl $end\n$upscope $end\n$enddefinitions $end\n";
        match VcdSource::new(Cursor::new(dump), &["top.sda"]) {
            Err(SourceError::Malformed(msg)) => assert!(msg.contains("top.sda")),
            other => panic!("expected missing pin error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_written_dump_reads_back() {
        let events = vec![
            SourceEvent::Initial {
                pin: "top.scl".to_string(),
                level: DigitalLevel::High,
            },
            SourceEvent::Initial {
                pin: "cs0".to_string(),
                level: DigitalLevel::High,
            },
            SourceEvent::Transition(SignalEvent::new("top.scl", DigitalLevel::Low, 125)),
            SourceEvent::Transition(SignalEvent::new("cs0", DigitalLevel::Low, 125)),
            SourceEvent::Advance(400),
        ];
        let mut buf = Vec::new();
        write_vcd(&mut buf, &events).unwrap();

        let mut source = VcdSource::new(Cursor::new(buf), &["top.scl", "cs0"]).unwrap();
        let read: Vec<SourceEvent> = drain(&mut source)
            .into_iter()
            .filter(|e| !matches!(e, SourceEvent::Advance(t) if *t != 400))
            .collect();
        assert_eq!(read, events);
    }
}
