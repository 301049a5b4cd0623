// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Simulated time in nanoseconds.
pub type SimTime = u64;

/// Represents a digital signal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitalLevel {
    #[default]
    Low,
    High,
}

impl DigitalLevel {
    pub fn is_high(self) -> bool {
        self == DigitalLevel::High
    }
}

impl From<bool> for DigitalLevel {
    fn from(b: bool) -> Self {
        if b {
            DigitalLevel::High
        } else {
            DigitalLevel::Low
        }
    }
}

impl From<DigitalLevel> for bool {
    fn from(level: DigitalLevel) -> Self {
        match level {
            DigitalLevel::High => true,
            DigitalLevel::Low => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// A monitored line: its current level and when it last changed.
#[derive(Debug, Clone, Default)]
pub struct Line {
    level: DigitalLevel,
}

impl Line {
    pub fn new(level: DigitalLevel) -> Self {
        Self { level }
    }

    /// Force the level without registering an edge.
    pub fn preset(&mut self, level: DigitalLevel) {
        self.level = level;
    }

    /// Move the line to `level`. Returns the edge, or `None` if the level did not change.
    pub fn drive(&mut self, level: DigitalLevel) -> Option<Edge> {
        if level == self.level {
            return None;
        }
        self.level = level;
        Some(match level {
            DigitalLevel::High => Edge::Rising,
            DigitalLevel::Low => Edge::Falling,
        })
    }

    pub fn get(&self) -> DigitalLevel {
        self.level
    }

    pub fn is_high(&self) -> bool {
        self.level.is_high()
    }

}

/// A level change on one physical pin, as delivered by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEvent {
    pub pin: String,
    pub level: DigitalLevel,
    pub time: SimTime,
}

impl SignalEvent {
    pub fn new(pin: impl Into<String>, level: DigitalLevel, time: SimTime) -> Self {
        Self {
            pin: pin.into(),
            level,
            time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// Level of a pin before the run starts; never treated as an edge.
    Initial { pin: String, level: DigitalLevel },
    Transition(SignalEvent),
    /// Simulated time moved forward without any transition.
    Advance(SimTime),
}

impl SourceEvent {
    pub fn time(&self) -> Option<SimTime> {
        match self {
            SourceEvent::Initial { .. } => None,
            SourceEvent::Transition(ev) => Some(ev.time),
            SourceEvent::Advance(t) => Some(*t),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("signal source I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed signal trace: {0}")]
    Malformed(String),
}

/// The simulator side of the boundary: a one-shot feed of pin events in time order.
pub trait SignalSource {
    fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError>;
}

/// Replays a recorded event list.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    events: std::vec::IntoIter<SourceEvent>,
}

impl ReplaySource {
    pub fn new(events: Vec<SourceEvent>) -> Self {
        Self {
            events: events.into_iter(),
        }
    }

    pub fn from_transitions(transitions: Vec<SignalEvent>) -> Self {
        Self::new(
            transitions
                .into_iter()
                .map(SourceEvent::Transition)
                .collect(),
        )
    }
}

impl SignalSource for ReplaySource {
    fn next_event(&mut self) -> Result<Option<SourceEvent>, SourceError> {
        Ok(self.events.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_edges() {
        let mut line = Line::default();
        assert_eq!(line.get(), DigitalLevel::Low);
        assert_eq!(line.drive(DigitalLevel::Low), None);
        assert_eq!(line.drive(DigitalLevel::High), Some(Edge::Rising));
        assert_eq!(line.drive(DigitalLevel::Low), Some(Edge::Falling));

        let b: bool = line.get().into();
        assert!(!b);
    }

    #[test]
    fn test_preset_is_not_an_edge() {
        let mut line = Line::new(DigitalLevel::Low);
        line.preset(DigitalLevel::High);
        assert!(line.is_high());
        assert_eq!(line.drive(DigitalLevel::High), None);
    }

    #[test]
    fn test_replay_source_is_one_shot() {
        let mut source = ReplaySource::from_transitions(vec![
            SignalEvent::new("scl", DigitalLevel::Low, 100),
            SignalEvent::new("scl", DigitalLevel::High, 200),
        ]);
        assert_eq!(source.next_event().unwrap().and_then(|e| e.time()), Some(100));
        assert_eq!(source.next_event().unwrap().and_then(|e| e.time()), Some(200));
        assert!(source.next_event().unwrap().is_none());
        assert!(source.next_event().unwrap().is_none());
    }
}
