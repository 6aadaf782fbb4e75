//! PyO3 wrapper for SimulationClock
//!
//! # Example (from Python)
//!
//! ```python
//! from virtual_lab_core_rs import LabSession
//!
//! session = LabSession(open("titration.json").read())
//! session.start()
//! for frame in range(100):
//!     if session.on_frame(frame / 60.0):
//!         print(session.last_payload())
//! print(session.validate_objectives())
//! ```

use pyo3::prelude::*;

use super::types::{from_json, to_json, to_py_err};
use crate::models::ExperimentPreset;
use crate::orchestrator::{LabConfig, LabConfigUpdate, SimulationClock, SimulationError};

/// One lab session driven by host frames
///
/// Holds `Rc` state internally, so it stays on the thread that made it.
#[pyclass(unsendable)]
pub struct LabSession {
    inner: SimulationClock,
    preset: ExperimentPreset,
}

#[pymethods]
impl LabSession {
    /// Create a session from a preset document
    ///
    /// `config_json` overrides the default config; the preset's seed, if it
    /// has one, wins over both.
    ///
    /// # Errors
    ///
    /// Raises ValueError for malformed JSON or an invalid config.
    #[new]
    #[pyo3(signature = (preset_json, config_json=None))]
    fn new(preset_json: &str, config_json: Option<&str>) -> PyResult<Self> {
        let preset = ExperimentPreset::from_json(preset_json).map_err(to_py_err)?;
        let mut config: LabConfig = match config_json {
            Some(json) => from_json("config", json)?,
            None => LabConfig::default(),
        };
        if let Some(seed) = preset.seed {
            config.seed = seed;
        }

        let inner = SimulationClock::new(config).map_err(to_py_err)?;
        Ok(LabSession { inner, preset })
    }

    /// Start (or resume) with the preset's bench
    fn start(&mut self) -> PyResult<()> {
        self.inner.start(self.preset.bench.clone()).map_err(to_py_err)
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn resume(&mut self) {
        self.inner.resume();
    }

    fn stop(&mut self) {
        self.inner.stop();
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    /// Run one fixed step now; returns the tick payload as JSON
    fn step(&mut self) -> PyResult<String> {
        let payload = self.inner.step().map_err(to_py_err)?;
        to_json(&payload)
    }

    /// Deliver a frame at host time `now` (seconds); True if a tick ran
    fn on_frame(&mut self, now: f64) -> PyResult<bool> {
        self.inner.on_frame(now).map_err(to_py_err)
    }

    /// Clock status as JSON
    fn status(&self) -> PyResult<String> {
        to_json(&self.inner.status())
    }

    /// Most recent tick payload as JSON, or None before the first tick
    fn last_payload(&self) -> PyResult<Option<String>> {
        self.inner.event_log().last_payload().map(to_json).transpose()
    }

    fn bench(&self) -> PyResult<String> {
        to_json(self.inner.bench())
    }

    fn event_log(&self) -> PyResult<String> {
        to_json(self.inner.event_log())
    }

    fn session_id(&self) -> String {
        self.inner.session_id().to_string()
    }

    /// Apply a partial config given as JSON
    fn update_config(&mut self, update_json: &str) -> PyResult<()> {
        let update: LabConfigUpdate = from_json("config update", update_json)?;
        self.inner.update_config(&update).map_err(to_py_err)
    }

    #[pyo3(signature = (key, value, unit=None))]
    fn record_measurement(&mut self, key: String, value: f64, unit: Option<String>) {
        self.inner.record_measurement(key, value, unit);
    }

    fn export_state(&self) -> PyResult<String> {
        self.inner.export_state().map_err(to_py_err)
    }

    fn import_state(&mut self, json: &str) -> PyResult<()> {
        self.inner.import_state(json).map_err(to_py_err)
    }

    /// Grade the preset's objectives; returns the reports as JSON
    fn validate_objectives(&self) -> PyResult<String> {
        let reports = self
            .inner
            .validate_objectives(&self.preset.objectives)
            .map_err(|e| to_py_err(SimulationError::from(e)))?;
        to_json(&reports)
    }

    fn max_points(&self) -> u32 {
        self.preset.max_points()
    }
}
