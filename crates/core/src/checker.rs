// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Passive bus checker: pin transitions in, report lines and a verdict out.

use crate::config::ReportOptions;
use crate::decoder::{I2cDecoder, SpiDecoder, Step};
use crate::error::{CheckResult, ProtocolViolation, StallTimeout};
use crate::expect::ExpectationEngine;
use crate::pins::{PinBinding, Role};
use crate::report::ReportWriter;
use crate::sampler::{I2cSampler, SpiSampler};
use crate::signals::{DigitalLevel, SignalEvent, SignalSource, SimTime, SourceEvent};
use crate::timing::SpeedCheck;
use crate::verdict::{Finding, Verdict};
use crate::CheckObserver;
use labwired_probe_config::{ConfigError, ProbeScript, Protocol};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

#[derive(Debug)]
enum BusEngine {
    I2c {
        sampler: I2cSampler,
        decoder: I2cDecoder,
    },
    Spi {
        sampler: SpiSampler,
        decoder: SpiDecoder,
    },
}

impl BusEngine {
    fn from_script(script: &ProbeScript) -> Result<Self, ConfigError> {
        let timing = &script.timing;
        Ok(match script.protocol()? {
            Protocol::I2c(i2c) => BusEngine::I2c {
                sampler: I2cSampler::new(),
                decoder: I2cDecoder::new(timing.enabled.then(|| SpeedCheck {
                    bus: "i2c",
                    target_hz: i2c.target_hz(),
                    tolerance_percent: timing.tolerance_percent,
                    check_lower: false,
                })),
            },
            Protocol::Spi(spi) => BusEngine::Spi {
                sampler: SpiSampler::new(spi.mode, spi.cs_active_low, spi.chip_selects.len()),
                decoder: SpiDecoder::new(spi, timing),
            },
        })
    }

    fn in_transaction(&self) -> bool {
        match self {
            BusEngine::I2c { decoder, .. } => decoder.in_transaction(),
            BusEngine::Spi { decoder, .. } => decoder.in_transaction(),
        }
    }

    fn preset(&mut self, role: Role, level: DigitalLevel) {
        match self {
            BusEngine::I2c { sampler, .. } => sampler.preset(role, level),
            BusEngine::Spi { sampler, .. } => sampler.preset(role, level),
        }
    }

    fn on_edge(
        &mut self,
        role: Role,
        level: DigitalLevel,
        time: SimTime,
    ) -> Result<Step, ProtocolViolation> {
        match self {
            BusEngine::I2c { sampler, decoder } => match sampler.on_edge(role, level, time) {
                Some(symbol) => decoder.on_symbol(symbol),
                None => Ok(Step::none()),
            },
            BusEngine::Spi { sampler, decoder } => match sampler.on_edge(role, level, time) {
                Some(symbol) => decoder.on_symbol(symbol),
                None => Ok(Step::none()),
            },
        }
    }

    fn finish(&self, time: SimTime) -> Result<(), ProtocolViolation> {
        match self {
            BusEngine::I2c { decoder, .. } => decoder.finish(time),
            BusEngine::Spi { decoder, .. } => decoder.finish(time),
        }
    }
}

/// One checker per bus under test. Owns its binding, decoder state and verdict.
pub struct Checker<W: Write> {
    binding: PinBinding,
    bus: BusEngine,
    engine: ExpectationEngine,
    report: ReportWriter<W>,
    stall_timeout_ns: SimTime,
    last_time: Option<SimTime>,
    last_activity: SimTime,
    halted: bool,
    finished: bool,
    observers: Vec<Arc<dyn CheckObserver>>,
}

impl<W: Write> Checker<W> {
    /// Validates the script before any signal is seen.
    pub fn new(script: &ProbeScript, options: ReportOptions, sink: W) -> Result<Self, ConfigError> {
        script.validate()?;
        let protocol = script.protocol()?;
        let binding = PinBinding::from_protocol(protocol)?;
        let word_width = script.spi.as_ref().map(|spi| spi.word_width).unwrap_or(8);
        let engine = ExpectationEngine::from_probe(script)?;
        debug!(
            "Checker for {} bus: {} pins bound, {} expected entries",
            protocol.name(),
            binding.len(),
            engine.script().len()
        );

        Ok(Self {
            binding,
            bus: BusEngine::from_script(script)?,
            engine,
            report: ReportWriter::new(sink, options, word_width),
            stall_timeout_ns: script.timing.stall_timeout_ns,
            last_time: None,
            last_activity: 0,
            halted: false,
            finished: false,
            observers: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: Arc<dyn CheckObserver>) {
        self.observers.push(observer);
    }

    pub fn verdict(&self) -> &Verdict {
        self.engine.verdict()
    }

    /// Whether a fatal finding stopped decoding.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn binding(&self) -> &PinBinding {
        &self.binding
    }

    /// Level of a pin before the first transition. Produces no symbols.
    pub fn set_initial_level(&mut self, pin: &str, level: DigitalLevel) {
        match self.binding.role_of(pin) {
            Some(role) => self.bus.preset(role, level),
            None => trace!("Ignoring initial level of unbound pin {}", pin),
        }
    }

    pub fn on_transition(&mut self, event: &SignalEvent) -> io::Result<()> {
        if self.halted || self.finished {
            return Ok(());
        }
        let Some(role) = self.binding.role_of(&event.pin) else {
            trace!("Ignoring transition on unbound pin {}", event.pin);
            return Ok(());
        };

        if let Some(previous) = self.last_time {
            if event.time < previous {
                return self.raise(Finding::Protocol(ProtocolViolation::TimeReversal {
                    time: event.time,
                    previous,
                }));
            }
        }
        if self.check_stall(event.time)? {
            return Ok(());
        }
        self.last_time = Some(event.time);
        self.last_activity = event.time;

        for observer in &self.observers {
            observer.on_transition(&event.pin, event.time);
        }

        match self.bus.on_edge(role, event.level, event.time) {
            Ok(step) => self.apply(step),
            Err(violation) => self.raise(Finding::Protocol(violation)),
        }
    }

    fn apply(&mut self, step: Step) -> io::Result<()> {
        if let Some(event) = &step.event {
            self.report.event(event)?;
            for observer in &self.observers {
                observer.on_event(event);
            }
            for mismatch in self.engine.observe(event) {
                self.emit(Finding::Mismatch(mismatch))?;
            }
        }
        for violation in step.timing {
            self.raise(Finding::Timing(violation))?;
        }
        Ok(())
    }

    /// Write a finding that the engine has already recorded.
    fn emit(&mut self, finding: Finding) -> io::Result<()> {
        for observer in &self.observers {
            observer.on_finding(&finding);
        }
        self.report.finding(&finding)
    }

    /// Record and write a new finding. Fatal findings stop decoding.
    fn raise(&mut self, finding: Finding) -> io::Result<()> {
        if finding.is_fatal() {
            warn!("{}; decoding stopped", finding);
            self.halted = true;
        }
        self.engine.record(&finding);
        self.emit(finding)
    }

    /// Returns true if a stall was reported.
    fn check_stall(&mut self, now: SimTime) -> io::Result<bool> {
        if self.halted || !self.bus.in_transaction() {
            return Ok(false);
        }
        let idle_ns = now.saturating_sub(self.last_activity);
        if idle_ns <= self.stall_timeout_ns {
            return Ok(false);
        }
        self.raise(Finding::Stall(StallTimeout {
            idle_ns,
            timeout_ns: self.stall_timeout_ns,
            time: now,
        }))?;
        Ok(true)
    }

    /// Simulated time moved on without a transition on any pin.
    pub fn advance_to(&mut self, now: SimTime) -> io::Result<()> {
        if self.halted || self.finished {
            return Ok(());
        }
        if self.last_time.is_some_and(|t| now < t) {
            return Ok(());
        }
        if !self.check_stall(now)? {
            self.last_time = Some(now);
        }
        Ok(())
    }

    /// Close the run: structural end-of-run checks, under-run, then the verdict line.
    /// Calling it again returns the same verdict without writing anything.
    pub fn finish(&mut self, end: SimTime) -> io::Result<Verdict> {
        if self.finished {
            return Ok(self.engine.verdict().clone());
        }
        let end = end.max(self.last_time.unwrap_or(0));
        if !self.halted && !self.check_stall(end)? {
            if let Err(violation) = self.bus.finish(end) {
                self.raise(Finding::Protocol(violation))?;
            }
        }
        if let Some(underrun) = self.engine.finalize() {
            self.emit(underrun)?;
        }

        self.finished = true;
        let verdict = self.engine.verdict().clone();
        self.report.verdict(&verdict)?;
        info!(
            "Check finished: {} ({} of {} entries, {} mismatches, {} timing violations, {} report lines)",
            verdict,
            verdict.observed_entries,
            verdict.expected_entries,
            verdict.mismatches,
            verdict.timing_violations,
            self.report.lines_written()
        );
        for observer in &self.observers {
            observer.on_check_stop(&verdict);
        }
        Ok(verdict)
    }

    /// Drive the checker from a source until it is exhausted.
    pub fn run<S: SignalSource + ?Sized>(mut self, source: &mut S) -> CheckResult<(Verdict, W)> {
        for observer in &self.observers {
            observer.on_check_start();
        }
        let mut end = 0;
        while let Some(event) = source.next_event()? {
            if let Some(time) = event.time() {
                end = end.max(time);
            }
            match event {
                SourceEvent::Initial { pin, level } => self.set_initial_level(&pin, level),
                SourceEvent::Transition(ev) => self.on_transition(&ev)?,
                SourceEvent::Advance(time) => self.advance_to(time)?,
            }
        }
        let verdict = self.finish(end)?;
        Ok((verdict, self.into_inner()))
    }

    pub fn into_inner(self) -> W {
        self.report.into_inner()
    }
}
