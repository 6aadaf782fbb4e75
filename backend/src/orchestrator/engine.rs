//! Simulation Clock
//!
//! Owns simulated time, the session generator and the bench, and drives the
//! enabled engines one fixed step at a time.
//!
//! # Architecture
//!
//! The clock never runs on its own. The host delivers frames through
//! [`SimulationClock::on_frame`]; each frame either runs exactly one fixed
//! step or does nothing:
//!
//! ```text
//! For each frame at wall time `now`:
//! 1. Ignore the frame unless a tick was scheduled and the clock is running
//! 2. First frame after start/resume: remember `now`, reschedule
//! 3. If now − last_tick ≥ timestep:
//!    a. Advance time by one fixed step
//!    b. Chemistry: progress vessel reactions, read pH and temperature
//!    c. Physics: integrate mechanics, solve circuit, heat lamps
//!    d. Optics: trace every ray
//!    e. Log the Tick event, invoke on_update
//!    f. Complete at max_time
//! 4. Reschedule while running
//! ```
//!
//! Frame jitter changes *when* steps run, never their size, so the event
//! log depends only on the seed and the command sequence.
//!
//! # Example
//!
//! ```rust
//! use virtual_lab_core_rs::models::BenchState;
//! use virtual_lab_core_rs::orchestrator::{LabConfig, SimulationClock};
//!
//! let mut clock = SimulationClock::new(LabConfig::default()).unwrap();
//! clock.start(BenchState::default()).unwrap();
//!
//! // The first frame only sets the reference time
//! clock.on_frame(0.0).unwrap();
//! assert!(clock.on_frame(0.1).unwrap());
//! assert_eq!(clock.status().tick, 1);
//! ```

use crate::chemistry::{ChemistryEngine, ChemistryError};
use crate::core::scheduler::{ManualScheduler, TickScheduler};
use crate::core::time::TimeManager;
use crate::models::bench::BenchState;
use crate::models::event::{Event, EventLog, TickPayload};
use crate::objectives::ObjectiveError;
use crate::physics::{CircuitEngine, MechanicsEngine, OpticsEngine, PhysicsError};
use crate::rng::{self, SharedRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Configuration Types
// ============================================================================

/// Session configuration
///
/// # Fields
///
/// * `timestep` - Fixed integration step (s)
/// * `max_time` - Simulated time at which the run completes (s)
/// * `precision` - Relative standard deviation of instrument noise
/// * `enable_*` - Which engines take part in a tick
/// * `seed` - Session generator seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub timestep: f64,
    pub max_time: f64,
    pub precision: f64,
    pub enable_physics: bool,
    pub enable_chemistry: bool,
    pub enable_optics: bool,
    pub seed: u32,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            timestep: 0.1,
            max_time: 300.0,
            precision: 0.01,
            enable_physics: true,
            enable_chemistry: true,
            enable_optics: false,
            seed: 42,
        }
    }
}

impl LabConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.timestep > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        if !(self.max_time > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "max_time must be positive, got {}",
                self.max_time
            )));
        }
        if !(0.0..1.0).contains(&self.precision) {
            return Err(SimulationError::InvalidConfig(format!(
                "precision must be within [0, 1), got {}",
                self.precision
            )));
        }
        Ok(())
    }
}

/// Partial config change requested by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfigUpdate {
    pub timestep: Option<f64>,
    pub max_time: Option<f64>,
    pub precision: Option<f64>,
    pub enable_physics: Option<bool>,
    pub enable_chemistry: Option<bool>,
    pub enable_optics: Option<bool>,
    pub seed: Option<u32>,
}

impl LabConfigUpdate {
    /// Apply to `config`, returning the names of the fields that changed
    fn apply(&self, config: &mut LabConfig) -> Vec<String> {
        let mut changed = Vec::new();
        macro_rules! apply_field {
            ($field:ident) => {
                if let Some(value) = self.$field {
                    if config.$field != value {
                        config.$field = value;
                        changed.push(stringify!($field).to_string());
                    }
                }
            };
        }
        apply_field!(timestep);
        apply_field!(max_time);
        apply_field!(precision);
        apply_field!(enable_physics);
        apply_field!(enable_chemistry);
        apply_field!(enable_optics);
        apply_field!(seed);
        changed
    }
}

// ============================================================================
// Clock State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Per-frame view handed to the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockStatus {
    pub state: ClockState,
    pub tick: u64,
    pub elapsed: f64,
    pub is_running: bool,
    pub is_paused: bool,
}

pub type UpdateCallback = Box<dyn FnMut(&ClockStatus, &TickPayload)>;
pub type CompleteCallback = Box<dyn FnMut(&ClockStatus)>;
pub type ErrorCallback = Box<dyn FnMut(&SimulationError)>;

/// Host callbacks; any may be left unset
#[derive(Default)]
pub struct ClockCallbacks {
    pub on_update: Option<UpdateCallback>,
    pub on_complete: Option<CompleteCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl std::fmt::Debug for ClockCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockCallbacks")
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Simulation error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("State validation failed: {0}")]
    StateValidationError(String),

    #[error("Config mismatch: snapshot hash {expected}, config hashes to {actual}")]
    ConfigMismatch { expected: String, actual: String },

    #[error("Chemistry error: {0}")]
    Chemistry(#[from] ChemistryError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("Objective error: {0}")]
    Objective(#[from] ObjectiveError),
}

// ============================================================================
// Simulation Clock
// ============================================================================

/// Session state machine and tick loop
pub struct SimulationClock<S: TickScheduler = ManualScheduler> {
    pub(crate) session_id: Uuid,
    pub(crate) config: LabConfig,
    pub(crate) time: TimeManager,
    pub(crate) rng: SharedRng,
    chemistry: ChemistryEngine,
    circuits: CircuitEngine,
    mechanics: MechanicsEngine,
    optics: OpticsEngine,
    pub(crate) initial_bench: BenchState,
    pub(crate) bench: BenchState,
    pub(crate) state: ClockState,
    pub(crate) event_log: EventLog,
    last_tick_time: Option<f64>,
    scheduler: S,
    callbacks: ClockCallbacks,
}

impl SimulationClock<ManualScheduler> {
    /// Create a clock pumped by explicit frames
    pub fn new(config: LabConfig) -> Result<Self, SimulationError> {
        Self::with_scheduler(config, ManualScheduler::new())
    }
}

impl<S: TickScheduler> SimulationClock<S> {
    /// Create a clock that requests frames from `scheduler`
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the config fails validation.
    pub fn with_scheduler(config: LabConfig, scheduler: S) -> Result<Self, SimulationError> {
        config.validate()?;

        let rng = rng::shared(config.seed);
        let precision = config.precision;

        Ok(Self {
            session_id: Uuid::new_v4(),
            time: TimeManager::new(config.timestep, config.max_time),
            chemistry: ChemistryEngine::new(rng.clone(), precision),
            circuits: CircuitEngine::new(rng.clone(), precision),
            mechanics: MechanicsEngine::new(rng.clone(), precision),
            optics: OpticsEngine::new(rng.clone(), precision),
            rng,
            config,
            initial_bench: BenchState::default(),
            bench: BenchState::default(),
            state: ClockState::Idle,
            event_log: EventLog::new(),
            last_tick_time: None,
            scheduler,
            callbacks: ClockCallbacks::default(),
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn status(&self) -> ClockStatus {
        ClockStatus {
            state: self.state,
            tick: self.time.current_tick(),
            elapsed: self.time.elapsed(),
            is_running: self.state == ClockState::Running,
            is_paused: self.state == ClockState::Paused,
        }
    }

    pub fn time(&self) -> &TimeManager {
        &self.time
    }

    pub fn bench(&self) -> &BenchState {
        &self.bench
    }

    /// Mutable bench access for host actions (pouring, wiring, placing)
    pub fn bench_mut(&mut self) -> &mut BenchState {
        &mut self.bench
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Handle to the session generator
    pub fn rng(&self) -> SharedRng {
        self.rng.clone()
    }

    pub fn chemistry(&self) -> &ChemistryEngine {
        &self.chemistry
    }

    pub fn circuits(&self) -> &CircuitEngine {
        &self.circuits
    }

    pub fn mechanics(&self) -> &MechanicsEngine {
        &self.mechanics
    }

    pub fn optics(&self) -> &OpticsEngine {
        &self.optics
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn set_callbacks(&mut self, callbacks: ClockCallbacks) {
        self.callbacks = callbacks;
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Start a run on `bench`
    ///
    /// From Idle or Stopped the bench becomes the run's initial bench; a run
    /// that already reached `max_time` starts again from t = 0. From Paused
    /// this resumes and `bench` is ignored. From Running it is ignored.
    pub fn start(&mut self, bench: BenchState) -> Result<(), SimulationError> {
        match self.state {
            ClockState::Running => {
                tracing::warn!(session = %self.session_id, "start ignored: clock already running");
                Ok(())
            }
            ClockState::Paused => {
                self.resume();
                Ok(())
            }
            ClockState::Idle | ClockState::Stopped => {
                bench.validate()?;
                if self.time.is_finished() {
                    self.time.reset();
                }
                self.initial_bench = bench.clone();
                self.bench = bench;
                self.state = ClockState::Running;
                self.last_tick_time = None;
                self.event_log.log(Event::Start {
                    timestamp: self.time.elapsed(),
                });
                self.scheduler.schedule_next();
                tracing::info!(
                    session = %self.session_id,
                    seed = self.config.seed,
                    timestep = self.config.timestep,
                    "Simulation started"
                );
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state != ClockState::Running {
            return;
        }
        self.state = ClockState::Paused;
        self.scheduler.cancel();
        self.event_log.log(Event::Pause {
            timestamp: self.time.elapsed(),
        });
        tracing::info!(elapsed = self.time.elapsed(), "Simulation paused");
    }

    pub fn resume(&mut self) {
        if self.state != ClockState::Paused {
            return;
        }
        self.state = ClockState::Running;
        self.last_tick_time = None;
        self.event_log.log(Event::Resume {
            timestamp: self.time.elapsed(),
        });
        self.scheduler.schedule_next();
        tracing::info!(elapsed = self.time.elapsed(), "Simulation resumed");
    }

    /// Halt and rewind simulated time; the generator is untouched
    pub fn stop(&mut self) {
        let elapsed = self.time.elapsed();
        self.halt();
        self.time.reset();
        self.event_log.log(Event::Stop { timestamp: elapsed });
        tracing::info!(elapsed, "Simulation stopped");
    }

    /// Stop, reseed, restore the initial bench and clear the log
    pub fn reset(&mut self) {
        self.halt();
        self.time.reset();
        self.rng.borrow_mut().reset();
        self.bench = self.initial_bench.clone();
        self.event_log.clear();
        self.state = ClockState::Idle;
        tracing::info!(session = %self.session_id, "Simulation reset");
    }

    /// Run one fixed step now, whatever the state
    ///
    /// Never changes the running/paused flags, except that a failed tick
    /// halts a running clock.
    pub fn step(&mut self) -> Result<TickPayload, SimulationError> {
        self.advance()
    }

    /// Deliver a host frame at wall time `now` (seconds)
    ///
    /// Returns whether a tick ran.
    pub fn on_frame(&mut self, now: f64) -> Result<bool, SimulationError> {
        if !self.scheduler.take_pending() || self.state != ClockState::Running {
            return Ok(false);
        }

        let Some(last) = self.last_tick_time else {
            self.last_tick_time = Some(now);
            self.scheduler.schedule_next();
            return Ok(false);
        };

        if now - last < self.config.timestep {
            self.scheduler.schedule_next();
            return Ok(false);
        }

        self.last_tick_time = Some(now);
        self.advance()?;
        if self.state == ClockState::Running {
            self.scheduler.schedule_next();
        }
        Ok(true)
    }

    /// Apply a partial config change
    ///
    /// A new seed reseeds the session generator.
    pub fn update_config(&mut self, update: &LabConfigUpdate) -> Result<(), SimulationError> {
        let mut config = self.config.clone();
        let fields = update.apply(&mut config);
        config.validate()?;
        if fields.is_empty() {
            return Ok(());
        }

        if config.seed != self.config.seed {
            self.rng.borrow_mut().set_seed(config.seed);
        }
        self.time.set_timestep(config.timestep);
        self.time.set_max_time(config.max_time);
        self.set_precision(config.precision);
        self.config = config;

        tracing::info!(fields = ?fields, "Config updated");
        self.event_log.log(Event::ConfigUpdated {
            timestamp: self.time.elapsed(),
            fields,
        });
        Ok(())
    }

    /// Log a reading the host took (table row, meter value)
    pub fn record_measurement(&mut self, key: impl Into<String>, value: f64, unit: Option<String>) {
        self.event_log.log(Event::Measurement {
            timestamp: self.time.elapsed(),
            key: key.into(),
            value,
            unit,
        });
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    fn halt(&mut self) {
        self.state = match self.state {
            ClockState::Idle => ClockState::Idle,
            _ => ClockState::Stopped,
        };
        self.scheduler.cancel();
        self.last_tick_time = None;
    }

    pub(crate) fn set_precision(&mut self, precision: f64) {
        self.chemistry.set_precision(precision);
        self.circuits.set_precision(precision);
        self.mechanics.set_precision(precision);
        self.optics.set_precision(precision);
    }

    pub(crate) fn replace_scheduler_request(&mut self) {
        self.scheduler.cancel();
        self.last_tick_time = None;
        if self.state == ClockState::Running {
            self.scheduler.schedule_next();
        }
    }

    /// One step with completion and failure handling
    fn advance(&mut self) -> Result<TickPayload, SimulationError> {
        match self.run_tick() {
            Ok(payload) => {
                if self.state == ClockState::Running && self.time.is_finished() {
                    self.complete();
                }
                Ok(payload)
            }
            Err(error) => {
                self.fail(&error);
                Err(error)
            }
        }
    }

    /// Engines work on copies of the bench; nothing is committed and time
    /// does not move unless every engine succeeds.
    fn run_tick(&mut self) -> Result<TickPayload, SimulationError> {
        let dt = self.config.timestep;
        let mut payload = TickPayload::default();

        let mut vessels = None;
        if self.config.enable_chemistry {
            let mut next = self.bench.vessels.clone();
            for vessel in next.iter_mut() {
                payload.vessels.push(self.chemistry.update_vessel(vessel, dt)?);
            }
            vessels = Some(next);
        }

        let mut mechanics = None;
        let mut circuit = None;
        if self.config.enable_physics {
            if !self.bench.mechanics.objects.is_empty() {
                let mut next = self.bench.mechanics.clone();
                payload.mechanics = Some(self.mechanics.step_bench(&mut next, dt)?);
                mechanics = Some(next);
            }
            if let Some(current) = self.bench.circuit.as_ref() {
                let mut next = current.clone();
                payload.circuit = Some(self.circuits.step_circuit(&mut next)?);
                circuit = Some(next);
            }
        }

        if self.config.enable_optics {
            payload.rays = self
                .optics
                .trace_all(&self.bench.optics.rays, &self.bench.optics.elements);
        }

        if let Some(next) = vessels {
            self.bench.vessels = next;
        }
        if let Some(next) = mechanics {
            self.bench.mechanics = next;
        }
        if circuit.is_some() {
            self.bench.circuit = circuit;
        }
        self.time.advance_tick();

        let tick = self.time.current_tick();
        let elapsed = self.time.elapsed();
        tracing::debug!(
            tick,
            elapsed,
            vessels = payload.vessels.len(),
            rays = payload.rays.len(),
            "Tick complete"
        );

        self.event_log.log(Event::Tick {
            timestamp: elapsed,
            tick,
            payload: payload.clone(),
        });

        let status = self.status();
        if let Some(on_update) = self.callbacks.on_update.as_mut() {
            on_update(&status, &payload);
        }

        Ok(payload)
    }

    fn complete(&mut self) {
        self.state = ClockState::Stopped;
        self.scheduler.cancel();
        self.last_tick_time = None;

        let status = self.status();
        self.event_log.log(Event::Complete {
            timestamp: status.elapsed,
            ticks: status.tick,
        });
        tracing::info!(ticks = status.tick, elapsed = status.elapsed, "Simulation complete");

        if let Some(on_complete) = self.callbacks.on_complete.as_mut() {
            on_complete(&status);
        }
    }

    fn fail(&mut self, error: &SimulationError) {
        if self.state == ClockState::Running {
            self.state = ClockState::Stopped;
        }
        self.scheduler.cancel();
        self.last_tick_time = None;

        self.event_log.log(Event::Error {
            timestamp: self.time.elapsed(),
            message: error.to_string(),
        });
        tracing::error!(tick = self.time.current_tick(), %error, "Tick failed");

        if let Some(on_error) = self.callbacks.on_error.as_mut() {
            on_error(error);
        }
    }
}

impl<S: TickScheduler> std::fmt::Debug for SimulationClock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationClock")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("tick", &self.time.current_tick())
            .field("elapsed", &self.time.elapsed())
            .field("events", &self.event_log.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(LabConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        for config in [
            LabConfig { timestep: 0.0, ..Default::default() },
            LabConfig { max_time: -1.0, ..Default::default() },
            LabConfig { precision: 1.0, ..Default::default() },
        ] {
            assert!(matches!(
                SimulationClock::new(config),
                Err(SimulationError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_update_reports_changed_fields_only() {
        let mut config = LabConfig::default();
        let update = LabConfigUpdate {
            precision: Some(0.05),
            seed: Some(42),
            ..Default::default()
        };
        assert_eq!(update.apply(&mut config), vec!["precision".to_string()]);
        assert_eq!(config.precision, 0.05);
    }

    #[test]
    fn test_frame_without_request_ignored() {
        let mut clock = SimulationClock::new(LabConfig::default()).unwrap();
        assert!(!clock.on_frame(1.0).unwrap());
        assert_eq!(clock.state(), ClockState::Idle);
    }
}
