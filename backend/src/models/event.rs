//! Event log for grading, replay and data export.
//!
//! Every lifecycle transition, tick and host-recorded measurement appends one
//! [`Event`]. The log is append-only while a session runs and is cleared only
//! by a reset.
//!
//! # Critical Invariants
//!
//! - Timestamps are simulated seconds and never decrease within a run
//! - A `Tick` payload holds exactly what the enabled engines produced that tick
//!
//! # Example
//!
//! ```rust
//! use virtual_lab_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::Measurement {
//!     timestamp: 1.5,
//!     key: "ph".to_string(),
//!     value: 7.02,
//!     unit: None,
//! });
//!
//! assert_eq!(log.events_of_type("measurement").len(), 1);
//! ```

use crate::chemistry::engine::VesselReading;
use crate::physics::circuits::CircuitStep;
use crate::physics::mechanics::MechanicsStep;
use crate::physics::optics::RayTraceResult;
use serde::{Deserialize, Serialize};

/// Engine results for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickPayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vessels: Vec<VesselReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit: Option<CircuitStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanics: Option<MechanicsStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rays: Vec<RayTraceResult>,
}

impl TickPayload {
    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty() && self.circuit.is_none() && self.mechanics.is_none() && self.rays.is_empty()
    }
}

/// Simulation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Start { timestamp: f64 },
    Pause { timestamp: f64 },
    Resume { timestamp: f64 },
    Stop { timestamp: f64 },

    /// One fixed step ran
    Tick {
        timestamp: f64,
        tick: u64,
        payload: TickPayload,
    },

    /// A reading the host recorded (table row, meter value, ...)
    Measurement {
        timestamp: f64,
        key: String,
        value: f64,
        #[serde(default)]
        unit: Option<String>,
    },

    /// Config changed mid-session; lists the changed fields
    ConfigUpdated { timestamp: f64, fields: Vec<String> },

    /// `max_time` reached
    Complete { timestamp: f64, ticks: u64 },

    /// A tick failed and the clock halted
    Error { timestamp: f64, message: String },
}

impl Event {
    /// Simulated time at which the event happened
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::Start { timestamp }
            | Event::Pause { timestamp }
            | Event::Resume { timestamp }
            | Event::Stop { timestamp }
            | Event::Tick { timestamp, .. }
            | Event::Measurement { timestamp, .. }
            | Event::ConfigUpdated { timestamp, .. }
            | Event::Complete { timestamp, .. }
            | Event::Error { timestamp, .. } => *timestamp,
        }
    }

    /// Serialized `kind` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start",
            Event::Pause { .. } => "pause",
            Event::Resume { .. } => "resume",
            Event::Stop { .. } => "stop",
            Event::Tick { .. } => "tick",
            Event::Measurement { .. } => "measurement",
            Event::ConfigUpdated { .. } => "config_updated",
            Event::Complete { .. } => "complete",
            Event::Error { .. } => "error",
        }
    }

    /// Measurement key, for measurement events
    pub fn measurement_key(&self) -> Option<&str> {
        match self {
            Event::Measurement { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Measurements recorded under `key`, oldest first
    pub fn measurements(&self, key: &str) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Measurement { key: k, value, .. } if k == key => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn has_measurement(&self, key: &str) -> bool {
        self.events.iter().any(|e| e.measurement_key() == Some(key))
    }

    /// Most recent tick payload
    pub fn last_payload(&self) -> Option<&TickPayload> {
        self.events.iter().rev().find_map(|e| match e {
            Event::Tick { payload, .. } => Some(payload),
            _ => None,
        })
    }

    /// Timestamps never decrease within a run
    ///
    /// `stop` rewinds simulated time, so whatever follows a `Stop` and any
    /// `Start` may begin again from an earlier time.
    pub fn is_chronological(&self) -> bool {
        self.events.windows(2).all(|w| {
            matches!(w[0], Event::Stop { .. })
                || matches!(w[1], Event::Start { .. })
                || w[0].timestamp() <= w[1].timestamp()
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
