//! Orchestrator - session clock and checkpoints
//!
//! See `engine.rs` for the tick loop and `checkpoint.rs` for save/restore.

pub mod checkpoint;
pub mod engine;

pub use engine::{
    ClockCallbacks, ClockState, ClockStatus, LabConfig, LabConfigUpdate, SimulationClock, SimulationError,
};

pub use checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot, SNAPSHOT_VERSION};
