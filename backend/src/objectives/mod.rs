//! Objective validation
//!
//! Grades a preset's objectives against the session's true state: the
//! bench as it is now, the bench the run started from, the event log and
//! the elapsed simulated time. Instrument noise never enters a grade.
//!
//! # Validator kinds
//!
//! | Kind | Params |
//! |---|---|
//! | `ph-in-range` | `vessel`, `min`, `max` |
//! | `log-has-key` | `key` |
//! | `indicator-color-change` | `vessel`, `color` |
//! | `time-limit` | `max_time` |
//! | `current-in-range` | `element`, `min`, `max` |
//! | `voltage-measurements` | `elements`, `expected_voltages`, `tolerance` |
//! | `table-has-rows` | `min_rows`, optional `key` |
//! | `concentration-in-range` | `vessel`, `species`, `min`, `max` |
//! | `temperature-in-range` | `vessel`, `min`, `max`, optional `unit` (`K`/`C`) |
//! | `mass-in-range` | `vessel`, `species`, `min`, `max` |
//! | `ohm-law-verification` | `element`, `tolerance`, optional `key` |
//! | `compare-series-parallel` | `resistors`, `ratio_min`, `ratio_max`, optional `source` |
//!
//! Unknown kinds are reported as [`ObjectiveOutcome::Unsupported`]; bad
//! params are an [`ObjectiveError`].

use crate::chemistry::stoichiometry::molar_mass;
use crate::chemistry::ChemistryError;
use crate::core::scheduler::TickScheduler;
use crate::models::bench::{BenchState, Solution};
use crate::models::event::EventLog;
use crate::models::preset::Objective;
use crate::orchestrator::SimulationClock;
use crate::physics::circuits::{
    parallel_resistance, series_resistance, solve_circuit, Circuit, CircuitAnalysis, CircuitElement, ElementKind,
};
use crate::physics::PhysicsError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const KELVIN_OFFSET: f64 = 273.15;

/// Per-volt penalty for a missed voltage reading
const VOLTAGE_PENALTY_PER_VOLT: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectiveError {
    #[error("Invalid params for {kind}: {reason}")]
    InvalidParams { kind: String, reason: String },

    #[error("Unknown vessel: {0}")]
    UnknownVessel(String),

    #[error("Unknown circuit element: {0}")]
    UnknownElement(String),

    #[error("Bench has no circuit")]
    MissingCircuit,

    #[error(transparent)]
    Chemistry(#[from] ChemistryError),

    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// Grade for one objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// 0..=100
    pub score: u8,
    pub message: String,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ObjectiveOutcome {
    Evaluated(ValidationResult),
    Unsupported { kind: String },
}

impl ObjectiveOutcome {
    pub fn score(&self) -> u8 {
        match self {
            ObjectiveOutcome::Evaluated(result) => result.score,
            ObjectiveOutcome::Unsupported { .. } => 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ObjectiveOutcome::Evaluated(r) if r.is_valid)
    }
}

/// One graded objective with its share of the preset's points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveReport {
    pub objective_id: String,
    pub points: u32,
    pub earned: f64,
    pub outcome: ObjectiveOutcome,
}

/// Read-only view of the state objectives are graded against
#[derive(Debug, Clone, Copy)]
pub struct LabView<'a> {
    pub bench: &'a BenchState,
    pub initial_bench: &'a BenchState,
    pub event_log: &'a EventLog,
    pub elapsed: f64,
}

impl<S: TickScheduler> SimulationClock<S> {
    pub fn lab_view(&self) -> LabView<'_> {
        LabView {
            bench: &self.bench,
            initial_bench: &self.initial_bench,
            event_log: &self.event_log,
            elapsed: self.time.elapsed(),
        }
    }

    /// Grade `objectives` against the current session
    pub fn validate_objectives(&self, objectives: &[Objective]) -> Result<Vec<ObjectiveReport>, ObjectiveError> {
        validate_all(objectives, &self.lab_view())
    }
}

// ============================================================================
// Params
// ============================================================================

#[derive(Debug, Deserialize)]
struct VesselRange {
    #[serde(alias = "vesselId")]
    vessel: String,
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct SpeciesRange {
    #[serde(alias = "vesselId")]
    vessel: String,
    species: String,
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct TemperatureRange {
    #[serde(alias = "vesselId")]
    vessel: String,
    min: f64,
    max: f64,
    #[serde(default = "default_temperature_unit")]
    unit: String,
}

fn default_temperature_unit() -> String {
    "K".to_string()
}

#[derive(Debug, Deserialize)]
struct LogKey {
    key: String,
}

#[derive(Debug, Deserialize)]
struct IndicatorTarget {
    #[serde(alias = "vesselId")]
    vessel: String,
    #[serde(alias = "expectedColor")]
    color: String,
}

#[derive(Debug, Deserialize)]
struct TimeLimit {
    #[serde(alias = "maxTime")]
    max_time: f64,
}

#[derive(Debug, Deserialize)]
struct ElementRange {
    element: String,
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct VoltageTargets {
    #[serde(alias = "resistors")]
    elements: Vec<String>,
    expected_voltages: Vec<f64>,
    tolerance: f64,
}

#[derive(Debug, Deserialize)]
struct TableRows {
    #[serde(alias = "minRows")]
    min_rows: usize,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OhmLawCheck {
    element: String,
    /// Relative tolerance on the current
    tolerance: f64,
    /// Measurement key holding the ammeter reading; the solved current otherwise
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesParallelRatio {
    #[serde(alias = "elements")]
    resistors: Vec<String>,
    #[serde(alias = "ratioMin")]
    ratio_min: f64,
    #[serde(alias = "ratioMax")]
    ratio_max: f64,
    #[serde(default)]
    source: Option<String>,
}

fn params<T: DeserializeOwned>(kind: &str, value: &serde_json::Value) -> Result<T, ObjectiveError> {
    serde_json::from_value(value.clone()).map_err(|e| ObjectiveError::InvalidParams {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

fn check_range(kind: &str, min: f64, max: f64) -> Result<(), ObjectiveError> {
    if min > max {
        return Err(ObjectiveError::InvalidParams {
            kind: kind.to_string(),
            reason: format!("min {min} exceeds max {max}"),
        });
    }
    Ok(())
}

// ============================================================================
// Validation
// ============================================================================

/// Grade every objective; the first malformed objective aborts
pub fn validate_all(objectives: &[Objective], view: &LabView<'_>) -> Result<Vec<ObjectiveReport>, ObjectiveError> {
    objectives
        .iter()
        .map(|objective| {
            let outcome = validate(objective, view)?;
            Ok(ObjectiveReport {
                objective_id: objective.id.clone(),
                points: objective.points,
                earned: objective.points as f64 * outcome.score() as f64 / 100.0,
                outcome,
            })
        })
        .collect()
}

/// Grade one objective
pub fn validate(objective: &Objective, view: &LabView<'_>) -> Result<ObjectiveOutcome, ObjectiveError> {
    let kind = objective.validator.kind.as_str();
    let raw = &objective.validator.params;

    let result = match kind {
        "ph-in-range" | "pH-in-range" => {
            let p: VesselRange = params(kind, raw)?;
            check_range(kind, p.min, p.max)?;
            let ph = vessel(view.bench, &p.vessel)?.ph().ph;
            in_range("pH", ph, p.min, p.max, json!({ "vessel": p.vessel }))
        }
        "log-has-key" => {
            let p: LogKey = params(kind, raw)?;
            let found = view.event_log.has_measurement(&p.key);
            ValidationResult {
                is_valid: found,
                score: if found { 100 } else { 0 },
                message: if found {
                    format!("Key '{}' found in log", p.key)
                } else {
                    format!("Key '{}' not found in log", p.key)
                },
                details: json!({ "key": p.key, "log_entries": view.event_log.len() }),
            }
        }
        "indicator-color-change" => {
            let p: IndicatorTarget = params(kind, raw)?;
            let current = vessel(view.bench, &p.vessel)?.indicator_color();
            let initial = view.initial_bench.vessel(&p.vessel).and_then(Solution::indicator_color);
            let reached = current.is_some_and(|c| c.eq_ignore_ascii_case(&p.color));
            let changed = reached && current != initial;
            ValidationResult {
                is_valid: changed,
                score: if changed { 100 } else { 0 },
                message: match (changed, current) {
                    (true, _) => format!("Indicator in {} turned {}", p.vessel, p.color),
                    (false, Some(c)) => format!("Indicator in {} is {}, expected a change to {}", p.vessel, c, p.color),
                    (false, None) => format!("Vessel {} has no indicator", p.vessel),
                },
                details: json!({
                    "vessel": p.vessel,
                    "expected_color": p.color,
                    "initial_color": initial,
                    "actual_color": current,
                }),
            }
        }
        "time-limit" => {
            let p: TimeLimit = params(kind, raw)?;
            if !(p.max_time > 0.0) {
                return Err(ObjectiveError::InvalidParams {
                    kind: kind.to_string(),
                    reason: "max_time must be positive".to_string(),
                });
            }
            let t = view.elapsed;
            let is_valid = t <= p.max_time;
            let score = if is_valid {
                100.0
            } else {
                100.0 - (t - p.max_time) / p.max_time * 100.0
            };
            ValidationResult {
                is_valid,
                score: clamp_score(score),
                message: if is_valid {
                    format!("Finished in {:.1}s (limit {}s)", t, p.max_time)
                } else {
                    format!("Took {:.1}s (limit {}s)", t, p.max_time)
                },
                details: json!({ "elapsed": t, "max_time": p.max_time }),
            }
        }
        "current-in-range" => {
            let p: ElementRange = params(kind, raw)?;
            check_range(kind, p.min, p.max)?;
            let analysis = analysis(view.bench)?;
            let current = element_value(&analysis.element_currents, &p.element)?.abs();
            in_range("Current", current, p.min, p.max, json!({ "element": p.element, "unit": "A" }))
        }
        "voltage-measurements" => {
            let p: VoltageTargets = params(kind, raw)?;
            voltage_measurements(kind, p, view.bench)?
        }
        "table-has-rows" => {
            let p: TableRows = params(kind, raw)?;
            let rows = match &p.key {
                Some(key) => view.event_log.measurements(key).len(),
                None => view.event_log.events_of_type("measurement").len(),
            };
            let is_valid = rows >= p.min_rows;
            let score = if p.min_rows == 0 {
                100.0
            } else {
                rows as f64 / p.min_rows as f64 * 100.0
            };
            ValidationResult {
                is_valid,
                score: clamp_score(score),
                message: format!("Table has {} rows (minimum {})", rows, p.min_rows),
                details: json!({ "rows": rows, "min_rows": p.min_rows, "key": p.key }),
            }
        }
        "concentration-in-range" => {
            let p: SpeciesRange = params(kind, raw)?;
            check_range(kind, p.min, p.max)?;
            let c = vessel(view.bench, &p.vessel)?.concentration(&p.species);
            in_range(
                "Concentration",
                c,
                p.min,
                p.max,
                json!({ "vessel": p.vessel, "species": p.species, "unit": "mol/L" }),
            )
        }
        "temperature-in-range" => {
            let p: TemperatureRange = params(kind, raw)?;
            check_range(kind, p.min, p.max)?;
            let kelvin = vessel(view.bench, &p.vessel)?.temperature_k;
            let t = match p.unit.as_str() {
                "K" => kelvin,
                "C" => kelvin - KELVIN_OFFSET,
                other => {
                    return Err(ObjectiveError::InvalidParams {
                        kind: kind.to_string(),
                        reason: format!("unknown temperature unit {other}"),
                    })
                }
            };
            in_range("Temperature", t, p.min, p.max, json!({ "vessel": p.vessel, "unit": p.unit }))
        }
        "mass-in-range" => {
            let p: SpeciesRange = params(kind, raw)?;
            check_range(kind, p.min, p.max)?;
            let moles = vessel(view.bench, &p.vessel)?.moles(&p.species);
            let mass = moles * molar_mass(&p.species)?.grams_per_mole;
            in_range(
                "Mass",
                mass,
                p.min,
                p.max,
                json!({ "vessel": p.vessel, "species": p.species, "unit": "g" }),
            )
        }
        "ohm-law-verification" => {
            let p: OhmLawCheck = params(kind, raw)?;
            ohm_law_verification(kind, p, view)?
        }
        "compare-series-parallel" => {
            let p: SeriesParallelRatio = params(kind, raw)?;
            check_range(kind, p.ratio_min, p.ratio_max)?;
            compare_series_parallel(kind, p, view.bench)?
        }
        other => {
            tracing::warn!(objective = %objective.id, kind = other, "Unsupported objective validator");
            return Ok(ObjectiveOutcome::Unsupported { kind: other.to_string() });
        }
    };

    Ok(ObjectiveOutcome::Evaluated(result))
}

fn vessel<'a>(bench: &'a BenchState, id: &str) -> Result<&'a Solution, ObjectiveError> {
    bench.vessel(id).ok_or_else(|| ObjectiveError::UnknownVessel(id.to_string()))
}

fn analysis(bench: &BenchState) -> Result<CircuitAnalysis, ObjectiveError> {
    let circuit = bench.circuit.as_ref().ok_or(ObjectiveError::MissingCircuit)?;
    Ok(solve_circuit(circuit)?)
}

fn element_value(values: &std::collections::BTreeMap<String, f64>, id: &str) -> Result<f64, ObjectiveError> {
    values
        .get(id)
        .copied()
        .ok_or_else(|| ObjectiveError::UnknownElement(id.to_string()))
}

fn voltage_measurements(kind: &str, p: VoltageTargets, bench: &BenchState) -> Result<ValidationResult, ObjectiveError> {
    if p.elements.len() != p.expected_voltages.len() || p.elements.is_empty() {
        return Err(ObjectiveError::InvalidParams {
            kind: kind.to_string(),
            reason: "elements and expected_voltages must be non-empty and the same length".to_string(),
        });
    }

    let circuit = bench.circuit.as_ref().ok_or(ObjectiveError::MissingCircuit)?;
    let analysis = solve_circuit(circuit)?;

    let mut total = 0.0;
    let mut correct = 0;
    let mut actual = Vec::with_capacity(p.elements.len());
    for (id, expected) in p.elements.iter().zip(&p.expected_voltages) {
        let element = circuit
            .element(id)
            .ok_or_else(|| ObjectiveError::UnknownElement(id.clone()))?;
        let v1 = analysis.node_voltages.get(&element.n1).copied().unwrap_or(0.0);
        let v2 = analysis.node_voltages.get(&element.n2).copied().unwrap_or(0.0);
        let drop = (v1 - v2).abs();
        let error = (drop - expected).abs();
        if error <= p.tolerance {
            correct += 1;
            total += 100.0;
        } else {
            total += (100.0 - error * VOLTAGE_PENALTY_PER_VOLT).max(0.0);
        }
        actual.push(drop);
    }

    let count = p.elements.len();
    Ok(ValidationResult {
        is_valid: correct == count,
        score: clamp_score(total / count as f64),
        message: format!("{}/{} voltage readings within tolerance", correct, count),
        details: json!({
            "elements": p.elements,
            "expected_voltages": p.expected_voltages,
            "actual_voltages": actual,
            "tolerance": p.tolerance,
        }),
    })
}

fn invalid(kind: &str, reason: impl Into<String>) -> ObjectiveError {
    ObjectiveError::InvalidParams {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn element<'a>(circuit: &'a Circuit, id: &str) -> Result<&'a CircuitElement, ObjectiveError> {
    circuit
        .element(id)
        .ok_or_else(|| ObjectiveError::UnknownElement(id.to_string()))
}

fn voltage_across(analysis: &CircuitAnalysis, element: &CircuitElement) -> f64 {
    let v1 = analysis.node_voltages.get(&element.n1).copied().unwrap_or(0.0);
    let v2 = analysis.node_voltages.get(&element.n2).copied().unwrap_or(0.0);
    v1 - v2
}

/// Nameplate resistance: a lamp's cold resistance, not its hot one
fn nominal_resistance(kind: &str, element: &CircuitElement) -> Result<f64, ObjectiveError> {
    match element.kind {
        ElementKind::Resistor { resistance } | ElementKind::Lamp { resistance, .. } => Ok(resistance),
        ref other => Err(invalid(kind, format!("{} is a {}, not a resistance", element.id, other.name()))),
    }
}

/// Measured current against `V / R` across one element
///
/// The voltage is the solved drop; the current is the last logged reading
/// under `key` when given, else the solved current. A lamp read hot fails
/// against its nameplate resistance.
fn ohm_law_verification(
    kind: &str,
    p: OhmLawCheck,
    view: &LabView<'_>,
) -> Result<ValidationResult, ObjectiveError> {
    if !(p.tolerance >= 0.0) {
        return Err(invalid(kind, "tolerance must be non-negative"));
    }
    let circuit = view.bench.circuit.as_ref().ok_or(ObjectiveError::MissingCircuit)?;
    let analysis = solve_circuit(circuit)?;
    let target = element(circuit, &p.element)?;
    let resistance = nominal_resistance(kind, target)?;

    let voltage = voltage_across(&analysis, target).abs();
    let expected = voltage / resistance;
    let measured = match &p.key {
        Some(key) => view
            .event_log
            .measurements(key)
            .last()
            .copied()
            .ok_or_else(|| invalid(kind, format!("no '{key}' reading in the log")))?
            .abs(),
        None => element_value(&analysis.element_currents, &p.element)?.abs(),
    };

    let error = (measured - expected).abs();
    let relative = if expected > 0.0 { error / expected } else { error };
    let is_valid = relative <= p.tolerance;
    let score = if is_valid { 100.0 } else { 100.0 - relative * 100.0 };

    Ok(ValidationResult {
        is_valid,
        score: clamp_score(score),
        message: if is_valid {
            format!("Ohm's law holds for {}: {:.3} V = {:.4} A x {} ohm", p.element, voltage, measured, resistance)
        } else {
            format!("{} carries {:.4} A, V/R gives {:.4} A", p.element, measured, expected)
        },
        details: json!({
            "element": p.element,
            "voltage": voltage,
            "resistance": resistance,
            "expected_current": expected,
            "measured_current": measured,
            "tolerance": p.tolerance,
        }),
    })
}

/// Parallel-to-series current ratio for the listed resistors on the bench source
fn compare_series_parallel(
    kind: &str,
    p: SeriesParallelRatio,
    bench: &BenchState,
) -> Result<ValidationResult, ObjectiveError> {
    if p.resistors.len() < 2 {
        return Err(invalid(kind, "at least two resistors are needed"));
    }
    let circuit = bench.circuit.as_ref().ok_or(ObjectiveError::MissingCircuit)?;
    let analysis = solve_circuit(circuit)?;

    let source = match &p.source {
        Some(id) => element(circuit, id)?,
        None => circuit
            .elements
            .iter()
            .find(|e| matches!(e.kind, ElementKind::VoltageSource { .. }))
            .ok_or_else(|| invalid(kind, "circuit has no voltage source"))?,
    };
    if !matches!(source.kind, ElementKind::VoltageSource { .. }) {
        return Err(invalid(kind, format!("{} is not a voltage source", source.id)));
    }
    let voltage = voltage_across(&analysis, source).abs();

    let resistances = p
        .resistors
        .iter()
        .map(|id| element(circuit, id).and_then(|e| nominal_resistance(kind, e)))
        .collect::<Result<Vec<_>, _>>()?;
    let series_current = voltage / series_resistance(&resistances)?;
    let parallel_current = voltage / parallel_resistance(&resistances)?;
    let ratio = if series_current > 0.0 {
        parallel_current / series_current
    } else {
        0.0
    };

    Ok(in_range(
        "Parallel/series current ratio",
        ratio,
        p.ratio_min,
        p.ratio_max,
        json!({
            "resistors": p.resistors,
            "source": source.id,
            "source_voltage": voltage,
            "series_current": series_current,
            "parallel_current": parallel_current,
        }),
    ))
}

/// Range grade: 100 inside, falling by the distance outside as a share of the width
fn in_range(label: &str, value: f64, min: f64, max: f64, mut details: serde_json::Value) -> ValidationResult {
    let is_valid = (min..=max).contains(&value);
    let score = if is_valid {
        100.0
    } else {
        let distance = if value < min { min - value } else { value - max };
        let width = (max - min).max(f64::EPSILON);
        100.0 - distance / width * 100.0
    };

    if let serde_json::Value::Object(map) = &mut details {
        map.insert("actual".to_string(), json!(value));
        map.insert("expected_range".to_string(), json!({ "min": min, "max": max }));
    }

    ValidationResult {
        is_valid,
        score: clamp_score(score),
        message: format!(
            "{} {:.3} is {} the expected range ({}-{})",
            label,
            value,
            if is_valid { "within" } else { "outside" },
            min,
            max
        ),
        details,
    }
}

fn clamp_score(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bench::Species;
    use crate::models::event::Event;
    use crate::models::preset::ValidatorSpec;

    fn objective(kind: &str, params: serde_json::Value) -> Objective {
        Objective {
            id: "obj".to_string(),
            description: String::new(),
            validator: ValidatorSpec {
                kind: kind.to_string(),
                params,
            },
            points: 10,
        }
    }

    fn bench() -> BenchState {
        BenchState {
            vessels: vec![Solution::new("beaker", 1.0).with_species(Species::new("HCl", 0.001))],
            ..Default::default()
        }
    }

    #[test]
    fn test_ph_in_range_uses_true_ph() {
        let bench = bench();
        let log = EventLog::new();
        let view = LabView {
            bench: &bench,
            initial_bench: &bench,
            event_log: &log,
            elapsed: 0.0,
        };

        let hit = validate(&objective("ph-in-range", json!({"vessel": "beaker", "min": 2.9, "max": 3.1})), &view).unwrap();
        assert!(hit.is_valid());
        assert_eq!(hit.score(), 100);

        let miss = validate(&objective("ph-in-range", json!({"vessel": "beaker", "min": 4.0, "max": 5.0})), &view).unwrap();
        assert!(!miss.is_valid());
        assert_eq!(miss.score(), 0);
    }

    #[test]
    fn test_table_rows_partial_score() {
        let bench = bench();
        let mut log = EventLog::new();
        for i in 0..3 {
            log.log(Event::Measurement {
                timestamp: i as f64,
                key: "volume".to_string(),
                value: 1.0,
                unit: None,
            });
        }
        let view = LabView {
            bench: &bench,
            initial_bench: &bench,
            event_log: &log,
            elapsed: 3.0,
        };

        let outcome = validate(&objective("table-has-rows", json!({"min_rows": 4})), &view).unwrap();
        assert!(!outcome.is_valid());
        assert_eq!(outcome.score(), 75);
    }

    #[test]
    fn test_unknown_kind_unsupported() {
        let bench = bench();
        let log = EventLog::new();
        let view = LabView {
            bench: &bench,
            initial_bench: &bench,
            event_log: &log,
            elapsed: 0.0,
        };

        let outcome = validate(&objective("draw-a-diagram", json!({})), &view).unwrap();
        assert_eq!(
            outcome,
            ObjectiveOutcome::Unsupported {
                kind: "draw-a-diagram".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_params_error() {
        let bench = bench();
        let log = EventLog::new();
        let view = LabView {
            bench: &bench,
            initial_bench: &bench,
            event_log: &log,
            elapsed: 0.0,
        };

        assert!(matches!(
            validate(&objective("time-limit", json!({"limit": 5})), &view),
            Err(ObjectiveError::InvalidParams { .. })
        ));
        assert!(matches!(
            validate(&objective("ph-in-range", json!({"vessel": "nope", "min": 1, "max": 2})), &view),
            Err(ObjectiveError::UnknownVessel(_))
        ));
    }
}
