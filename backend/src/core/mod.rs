//! Simulation time and tick scheduling

pub mod scheduler;
pub mod time;
