// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::decoder::DecodedEvent;
use crate::signals::SimTime;
use crate::verdict::{Finding, Verdict};
use crate::CheckObserver;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug)]
pub struct RunMetrics {
    transition_count: AtomicU64,
    event_count: AtomicU64,
    finding_count: AtomicU64,
    last_time: AtomicU64,
    transitions_by_pin: Mutex<HashMap<String, u64>>,
}

/// Point-in-time copy of [`RunMetrics`], ordered for stable serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub transitions: u64,
    pub decoded_events: u64,
    pub findings: u64,
    pub last_time_ns: SimTime,
    pub transitions_by_pin: BTreeMap<String, u64>,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            transition_count: AtomicU64::new(0),
            event_count: AtomicU64::new(0),
            finding_count: AtomicU64::new(0),
            last_time: AtomicU64::new(0),
            transitions_by_pin: Mutex::new(HashMap::new()),
        }
    }

    pub fn reset(&self) {
        self.transition_count.store(0, Ordering::SeqCst);
        self.event_count.store(0, Ordering::SeqCst);
        self.finding_count.store(0, Ordering::SeqCst);
        self.last_time.store(0, Ordering::SeqCst);
        if let Ok(mut m) = self.transitions_by_pin.lock() {
            m.clear();
        }
    }

    pub fn get_transitions(&self) -> u64 {
        self.transition_count.load(Ordering::SeqCst)
    }

    pub fn get_events(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }

    pub fn get_findings(&self) -> u64 {
        self.finding_count.load(Ordering::SeqCst)
    }

    pub fn get_transitions_on(&self, pin: &str) -> u64 {
        self.transitions_by_pin
            .lock()
            .ok()
            .and_then(|m| m.get(pin).copied())
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> RunStats {
        RunStats {
            transitions: self.get_transitions(),
            decoded_events: self.get_events(),
            findings: self.get_findings(),
            last_time_ns: self.last_time.load(Ordering::SeqCst),
            transitions_by_pin: self
                .transitions_by_pin
                .lock()
                .map(|m| m.iter().map(|(k, v)| (k.clone(), *v)).collect())
                .unwrap_or_default(),
        }
    }
}

impl CheckObserver for RunMetrics {
    fn on_check_start(&self) {
        self.reset();
    }

    fn on_transition(&self, pin: &str, time: SimTime) {
        self.transition_count.fetch_add(1, Ordering::SeqCst);
        self.last_time.fetch_max(time, Ordering::SeqCst);
        if let Ok(mut m) = self.transitions_by_pin.lock() {
            *m.entry(pin.to_string()).or_insert(0) += 1;
        }
    }

    fn on_event(&self, _event: &DecodedEvent) {
        self.event_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_finding(&self, _finding: &Finding) {
        self.finding_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_check_stop(&self, _verdict: &Verdict) {}
}
