// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod checker;
pub mod config;
pub mod decoder;
pub mod error;
pub mod expect;
pub mod metrics;
pub mod pins;
pub mod report;
pub mod sampler;
pub mod signals;
pub mod timing;
pub mod verdict;
pub mod waveform;

pub use checker::Checker;
pub use config::ReportOptions;
pub use decoder::{DecodedEvent, Direction};
pub use error::{CheckError, CheckResult, ProtocolViolation, StallTimeout};
pub use metrics::{RunMetrics, RunStats};
pub use signals::{DigitalLevel, ReplaySource, SignalEvent, SignalSource, SimTime, SourceEvent};
pub use verdict::{FailureKinds, Finding, Verdict};

/// Hooks into a running check. Observers see everything the report sees,
/// plus every raw transition on a bound pin.
pub trait CheckObserver: std::fmt::Debug + Send + Sync {
    fn on_check_start(&self) {}
    fn on_check_stop(&self, _verdict: &Verdict) {}
    fn on_transition(&self, _pin: &str, _time: SimTime) {}
    fn on_event(&self, _event: &DecodedEvent) {}
    fn on_finding(&self, _finding: &Finding) {}
}
