//! Conversions at the Python boundary

use crate::objectives::ObjectiveError;
use crate::orchestrator::SimulationError;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::PyErr;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Map an engine error to the closest Python exception
///
/// Bad input becomes `ValueError`; anything that went wrong while running
/// becomes `RuntimeError`.
pub fn to_py_err(error: SimulationError) -> PyErr {
    match &error {
        SimulationError::InvalidConfig(_)
        | SimulationError::SerializationError(_)
        | SimulationError::StateValidationError(_)
        | SimulationError::ConfigMismatch { .. }
        | SimulationError::Objective(ObjectiveError::InvalidParams { .. }) => {
            PyValueError::new_err(error.to_string())
        }
        _ => PyRuntimeError::new_err(error.to_string()),
    }
}

pub fn from_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, PyErr> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("Invalid {} JSON: {}", what, e)))
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, PyErr> {
    serde_json::to_string(value).map_err(|e| PyRuntimeError::new_err(format!("Serialization failed: {}", e)))
}
