//! Time management for the simulation
//!
//! The lab advances in fixed-size ticks. Elapsed time is accumulated with the
//! same additions in the same order on every run, so it is reproducible even
//! though it is a float.

use serde::{Deserialize, Serialize};

/// Manages simulated time in fixed-size ticks
///
/// # Example
/// ```
/// use virtual_lab_core_rs::TimeManager;
///
/// let mut time = TimeManager::new(0.1, 1.0);
/// assert_eq!(time.current_tick(), 0);
///
/// time.advance_tick();
/// assert_eq!(time.current_tick(), 1);
/// assert!((time.elapsed() - 0.1).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeManager {
    /// Ticks executed since the last reset
    current_tick: u64,
    /// Simulated seconds since the last reset
    elapsed: f64,
    /// Fixed integration step in seconds
    timestep: f64,
    /// Simulated time at which the run completes
    max_time: f64,
}

impl TimeManager {
    /// Create a new TimeManager
    ///
    /// # Panics
    /// Panics if `timestep` is not positive
    pub fn new(timestep: f64, max_time: f64) -> Self {
        assert!(timestep > 0.0, "timestep must be positive");
        Self {
            current_tick: 0,
            elapsed: 0.0,
            timestep,
            max_time,
        }
    }

    /// Advance time by one fixed tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
        self.elapsed += self.timestep;
    }

    /// Return to t = 0
    pub fn reset(&mut self) {
        self.current_tick = 0;
        self.elapsed = 0.0;
    }

    /// Ticks executed since the last reset
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Simulated seconds since the last reset
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Fixed step size in seconds
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Simulated time limit in seconds
    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    /// Change the step size for subsequent ticks
    ///
    /// # Panics
    /// Panics if `timestep` is not positive
    pub fn set_timestep(&mut self, timestep: f64) {
        assert!(timestep > 0.0, "timestep must be positive");
        self.timestep = timestep;
    }

    /// Change the simulated time limit
    pub fn set_max_time(&mut self, max_time: f64) {
        self.max_time = max_time;
    }

    /// Check whether the simulated time limit has been reached
    ///
    /// A half-step slack absorbs accumulated rounding so that, e.g., ten
    /// 0.1 s ticks complete a 1.0 s run.
    pub fn is_finished(&self) -> bool {
        self.elapsed + 0.5 * self.timestep > self.max_time
    }
}
