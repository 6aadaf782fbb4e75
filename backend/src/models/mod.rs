//! Domain models for the virtual lab

pub mod bench;
pub mod event;
pub mod preset;

// Re-exports
pub use bench::{BenchState, OpticsBench, Phase, Solution, Species};
pub use event::{Event, EventLog, TickPayload};
pub use preset::{Discipline, ExperimentPreset, LayoutItem, Objective, ValidatorSpec};
