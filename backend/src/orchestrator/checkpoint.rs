//! Checkpoint - Save/Load Session State
//!
//! Serializes everything a session needs to continue bit-identically: clock
//! state, simulated time, generator state, both benches and the event log.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a restored session produces the same future ticks as
//!   the session it was taken from
//! - **Generator Integrity**: the saved generator state is consistent with
//!   its seed and draw count
//! - **Non-negative Amounts**: no vessel holds negative moles
//! - **Config Matching**: the snapshot's config hashes to its recorded hash

use crate::core::scheduler::TickScheduler;
use crate::core::time::TimeManager;
use crate::models::bench::BenchState;
use crate::models::event::EventLog;
use crate::orchestrator::engine::{ClockState, LabConfig, SimulationClock, SimulationError};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete session state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    pub session_id: Uuid,
    pub config: LabConfig,

    /// SHA256 of the canonical config JSON
    pub config_hash: String,

    pub clock_state: ClockState,
    pub time: TimeManager,

    /// Generator state including draw count (CRITICAL for determinism)
    pub rng: RngManager,

    /// Bench the run started from; `reset` returns here
    pub initial_bench: BenchState,
    pub bench: BenchState,
    pub event_log: EventLog,
}

// ============================================================================
// Hashing
// ============================================================================

/// Compute SHA256 hash of a config
///
/// Object keys are sorted before hashing so the result does not depend on
/// field or map ordering.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config)
        .map_err(|e| SimulationError::SerializationError(format!("Config serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| SimulationError::SerializationError(format!("Config serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation
// ============================================================================

/// Validate snapshot integrity before it replaces live state
pub fn validate_snapshot(snapshot: &StateSnapshot) -> Result<(), SimulationError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SimulationError::StateValidationError(format!(
            "Unsupported snapshot version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    snapshot.config.validate()?;

    let actual = compute_config_hash(&snapshot.config)?;
    if actual != snapshot.config_hash {
        return Err(SimulationError::ConfigMismatch {
            expected: snapshot.config_hash.clone(),
            actual,
        });
    }

    if !snapshot.rng.is_consistent() {
        return Err(SimulationError::StateValidationError(format!(
            "Generator state does not match seed {} after {} draws",
            snapshot.rng.seed(),
            snapshot.rng.draw_count()
        )));
    }

    if snapshot.bench.has_negative_moles() || snapshot.initial_bench.has_negative_moles() {
        return Err(SimulationError::StateValidationError(
            "Negative species amount in bench".to_string(),
        ));
    }

    if !snapshot.event_log.is_chronological() {
        return Err(SimulationError::StateValidationError(
            "Event log timestamps go backwards".to_string(),
        ));
    }

    Ok(())
}

// ============================================================================
// Clock Integration
// ============================================================================

impl<S: TickScheduler> SimulationClock<S> {
    /// Capture the full session state
    pub fn snapshot(&self) -> Result<StateSnapshot, SimulationError> {
        Ok(StateSnapshot {
            version: SNAPSHOT_VERSION,
            session_id: self.session_id,
            config_hash: compute_config_hash(&self.config)?,
            config: self.config.clone(),
            clock_state: self.state,
            time: self.time.clone(),
            rng: self.rng.borrow().clone(),
            initial_bench: self.initial_bench.clone(),
            bench: self.bench.clone(),
            event_log: self.event_log.clone(),
        })
    }

    /// Replace live state with a validated snapshot
    ///
    /// The engines keep their shared generator handle; only its contents
    /// change. A running snapshot requests a fresh frame.
    pub fn restore(&mut self, snapshot: StateSnapshot) -> Result<(), SimulationError> {
        validate_snapshot(&snapshot)?;

        self.session_id = snapshot.session_id;
        self.set_precision(snapshot.config.precision);
        self.config = snapshot.config;
        self.time = snapshot.time;
        *self.rng.borrow_mut() = snapshot.rng;
        self.initial_bench = snapshot.initial_bench;
        self.bench = snapshot.bench;
        self.event_log = snapshot.event_log;
        self.state = snapshot.clock_state;
        self.replace_scheduler_request();

        tracing::info!(
            session = %self.session_id,
            tick = self.time.current_tick(),
            "Session restored"
        );
        Ok(())
    }

    /// Snapshot as JSON
    pub fn export_state(&self) -> Result<String, SimulationError> {
        serde_json::to_string(&self.snapshot()?).map_err(|e| SimulationError::SerializationError(e.to_string()))
    }

    /// Restore from JSON produced by [`Self::export_state`]
    pub fn import_state(&mut self, json: &str) -> Result<(), SimulationError> {
        let snapshot: StateSnapshot =
            serde_json::from_str(json).map_err(|e| SimulationError::SerializationError(e.to_string()))?;
        self.restore(snapshot)
    }
}
