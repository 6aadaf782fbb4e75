//! Virtual Lab Core - Rust Engine
//!
//! Deterministic simulation engine behind an interactive science lab:
//! chemistry vessels, DC circuits, mechanics and optics benches, all
//! advanced by one fixed-step clock with seeded instrument noise.
//!
//! # Architecture
//!
//! - **rng**: Deterministic random number generation
//! - **core**: Time management and frame scheduling
//! - **models**: Bench state, event log, experiment presets
//! - **chemistry**: Acid/base, kinetics, solubility, stoichiometry
//! - **physics**: Circuits, mechanics, optics
//! - **objectives**: Grading objectives against session state
//! - **orchestrator**: Simulation clock and checkpoints
//!
//! # Critical Invariants
//!
//! 1. All randomness flows from one seeded generator per session
//! 2. Ticks are fixed-size; frame timing never changes results
//! 3. The bench holds true values; noise only touches readings
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod chemistry;
pub mod core;
pub mod models;
pub mod objectives;
pub mod orchestrator;
pub mod physics;
pub mod rng;

// Re-exports for convenience
pub use chemistry::{ChemistryEngine, ChemistryError};
pub use core::scheduler::{FrameScheduler, ManualScheduler, TickScheduler};
pub use core::time::TimeManager;
pub use models::{
    bench::{BenchState, Solution, Species},
    event::{Event, EventLog, TickPayload},
    preset::{ExperimentPreset, Objective},
};
pub use objectives::{ObjectiveError, ObjectiveOutcome, ObjectiveReport, ValidationResult};
pub use orchestrator::{
    ClockCallbacks, ClockState, ClockStatus, LabConfig, LabConfigUpdate, SimulationClock, SimulationError,
    StateSnapshot,
};
pub use physics::{CircuitEngine, MechanicsEngine, OpticsEngine, PhysicsError, Vec2};
pub use rng::{RngManager, SharedRng};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn virtual_lab_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::LabSession>()?;
    Ok(())
}
