//! DC circuit analysis
//!
//! A circuit is a graph of named nodes joined by two-terminal elements.
//! Node voltages are solved by nodal analysis: every element stamps its
//! conductance into an n×n matrix and its source current into an injection
//! vector, the ground node is pinned at 0 V, and the reduced system is solved
//! by Gaussian elimination.
//!
//! # Source model
//!
//! Ideal voltage sources are approximated by their Norton equivalent: a very
//! high conductance branch in parallel with an injected current `V·G`. This
//! keeps the system a pure conductance matrix (no extra MNA rows) at the cost
//! of a relative error of about `G_load / G_source` in the terminal voltage.
//!
//! # Sign conventions
//!
//! - `n1` is the positive terminal of sources; source currents are reported
//!   as the current delivered out of `n1`.
//! - Passive element currents flow from `n1` to `n2`.
//! - Sources report negative (supplied) power; `total_power` sums the
//!   dissipation of passive elements only.

use super::linalg::solve_linear_system;
use super::PhysicsError;
use crate::rng::SharedRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Conductance of the Norton branch standing in for an ideal voltage source
pub const SOURCE_CONDUCTANCE: f64 = 1e6;

/// Conductance of a closed switch
pub const CLOSED_SWITCH_CONDUCTANCE: f64 = 1e6;

/// Conductance of an open switch
pub const OPEN_SWITCH_CONDUCTANCE: f64 = 1e-12;

/// Shunt to ground on every node so floating nodes stay solvable
const SHUNT_CONDUCTANCE: f64 = 1e-12;

/// Relative filament resistance increase per °C
pub const LAMP_TEMPERATURE_COEFFICIENT: f64 = 0.004;

/// Reference temperature for lamp resistance (°C)
pub const AMBIENT_TEMPERATURE: f64 = 25.0;

/// Absolute zero (°C)
pub const ABSOLUTE_ZERO: f64 = -273.15;

/// Power at which a lamp reaches full brightness (W)
pub const LAMP_FULL_BRIGHTNESS_POWER: f64 = 10.0;

/// Filament heating per watt dissipated, per update (°C/W)
pub const LAMP_HEATING_PER_WATT: f64 = 0.1;

/// Filament temperature ceiling (°C)
pub const MAX_FILAMENT_TEMPERATURE: f64 = 2500.0;

/// Series resistance assumed when charging a capacitor from a DC source (Ω)
pub const CAPACITOR_SERIES_RESISTANCE: f64 = 1e6;

/// Name of the conventional ground node
pub const GROUND_NODE: &str = "GND";

fn default_ground() -> String {
    GROUND_NODE.to_string()
}

fn ambient() -> f64 {
    AMBIENT_TEMPERATURE
}

/// Circuit node; its voltage is an output of analysis, never an input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitNode {
    pub id: String,
}

impl CircuitNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Element kind with only the fields that kind needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// Ohmic resistor (Ω)
    Resistor { resistance: f64 },
    /// Ideal voltage source, `n1` positive (V)
    VoltageSource { voltage: f64 },
    /// Ideal current source driving current out of `n1` (A)
    CurrentSource { current: f64 },
    /// Filament lamp: cold resistance (Ω) and filament temperature (°C)
    Lamp {
        resistance: f64,
        #[serde(default = "ambient")]
        temperature: f64,
    },
    /// Single-pole switch
    Switch { closed: bool },
    /// Capacitor (F); open circuit at DC steady state
    Capacitor { capacitance: f64 },
}

impl ElementKind {
    /// Short name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Resistor { .. } => "resistor",
            ElementKind::VoltageSource { .. } => "voltage_source",
            ElementKind::CurrentSource { .. } => "current_source",
            ElementKind::Lamp { .. } => "lamp",
            ElementKind::Switch { .. } => "switch",
            ElementKind::Capacitor { .. } => "capacitor",
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(
            self,
            ElementKind::VoltageSource { .. } | ElementKind::CurrentSource { .. }
        )
    }

    /// Branch conductance stamped into the nodal matrix (S)
    fn conductance(&self) -> f64 {
        match self {
            ElementKind::Resistor { resistance } => 1.0 / resistance,
            ElementKind::VoltageSource { .. } => SOURCE_CONDUCTANCE,
            ElementKind::CurrentSource { .. } => 0.0,
            ElementKind::Lamp {
                resistance,
                temperature,
            } => 1.0 / lamp_resistance_at(*resistance, *temperature),
            ElementKind::Switch { closed: true } => CLOSED_SWITCH_CONDUCTANCE,
            ElementKind::Switch { closed: false } => OPEN_SWITCH_CONDUCTANCE,
            ElementKind::Capacitor { .. } => 0.0,
        }
    }

    /// Current injected into `n1` (and drawn from `n2`) (A)
    fn injected_current(&self) -> f64 {
        match self {
            ElementKind::VoltageSource { voltage } => voltage * SOURCE_CONDUCTANCE,
            ElementKind::CurrentSource { current } => *current,
            _ => 0.0,
        }
    }

    fn check(&self, element: &str) -> Result<(), PhysicsError> {
        let invalid = |reason: &str| {
            Err(PhysicsError::InvalidElement {
                element: element.to_string(),
                reason: reason.to_string(),
            })
        };
        match self {
            ElementKind::Resistor { resistance } | ElementKind::Lamp { resistance, .. }
                if !(resistance.is_finite() && *resistance > 0.0) =>
            {
                invalid("resistance must be positive")
            }
            ElementKind::Lamp { temperature, .. }
                if !(temperature.is_finite() && *temperature > ABSOLUTE_ZERO) =>
            {
                invalid("filament temperature must be above absolute zero")
            }
            ElementKind::Lamp {
                resistance,
                temperature,
            } if !(lamp_resistance_at(*resistance, *temperature) > 0.0) => {
                invalid("filament too cold for the linear resistance model")
            }
            ElementKind::Capacitor { capacitance } if !(*capacitance >= 0.0) => {
                invalid("capacitance must be non-negative")
            }
            ElementKind::VoltageSource { voltage } if !voltage.is_finite() => {
                invalid("voltage must be finite")
            }
            ElementKind::CurrentSource { current } if !current.is_finite() => {
                invalid("current must be finite")
            }
            _ => Ok(()),
        }
    }
}

/// Two-terminal element between nodes `n1` and `n2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitElement {
    pub id: String,
    pub n1: String,
    pub n2: String,
    pub kind: ElementKind,
}

impl CircuitElement {
    pub fn new(
        id: impl Into<String>,
        n1: impl Into<String>,
        n2: impl Into<String>,
        kind: ElementKind,
    ) -> Self {
        Self {
            id: id.into(),
            n1: n1.into(),
            n2: n2.into(),
            kind,
        }
    }
}

/// A bench circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub nodes: Vec<CircuitNode>,
    pub elements: Vec<CircuitElement>,
    /// Reference node pinned at 0 V
    #[serde(default = "default_ground")]
    pub ground: String,
}

impl Circuit {
    pub fn new(nodes: Vec<CircuitNode>, elements: Vec<CircuitElement>) -> Self {
        Self {
            nodes,
            elements,
            ground: default_ground(),
        }
    }

    pub fn element(&self, id: &str) -> Option<&CircuitElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    fn ground_id(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.id == self.ground)
            .or_else(|| self.nodes.iter().find(|n| n.id == GROUND_NODE))
            .map(|n| n.id.as_str())
    }
}

/// Result of a circuit solve
///
/// Maps are ordered by id so serialized analyses are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitAnalysis {
    pub node_voltages: BTreeMap<String, f64>,
    pub element_currents: BTreeMap<String, f64>,
    pub power_dissipated: BTreeMap<String, f64>,
    pub total_power: f64,
}

/// Advisory validation outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitValidation {
    pub problems: Vec<String>,
}

impl CircuitValidation {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

/// How a resistor joins the running equivalent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    Series,
    Parallel,
}

/// Instruments that can read a solved circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitInstrument {
    Voltmeter,
    Ammeter,
    Ohmmeter,
}

/// Lamp electrical and thermal state after one update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LampReading {
    pub current: f64,
    pub power: f64,
    /// Percent of full brightness, 0-100
    pub brightness: u8,
    /// Filament temperature (°C)
    pub temperature: f64,
}

/// Capacitor charging state at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacitorReading {
    pub charge: f64,
    pub current: f64,
    pub energy: f64,
}

/// Check a circuit without solving it
///
/// Returns every problem found instead of failing on the first, so the host
/// can decide whether to block the simulation.
///
/// # Example
/// ```
/// use virtual_lab_core_rs::physics::circuits::{validate_circuit, Circuit};
///
/// let report = validate_circuit(&Circuit::new(vec![], vec![]));
/// assert!(!report.is_valid());
/// assert_eq!(report.problems.len(), 2); // no ground, no source
/// ```
pub fn validate_circuit(circuit: &Circuit) -> CircuitValidation {
    let mut problems = Vec::new();

    for element in &circuit.elements {
        for node in [&element.n1, &element.n2] {
            if !circuit.has_node(node) {
                problems.push(format!(
                    "Element {} references unknown node: {}",
                    element.id, node
                ));
            }
        }
    }

    if circuit.ground_id().is_none() {
        problems.push(format!(
            "Circuit must have a reference node ({})",
            circuit.ground
        ));
    }

    if !circuit.elements.iter().any(|e| e.kind.is_source()) {
        problems.push("Circuit must have at least one voltage or current source".to_string());
    }

    let mut seen = HashSet::new();
    for node in &circuit.nodes {
        if !seen.insert(node.id.as_str()) {
            problems.push(format!("Duplicate node id: {}", node.id));
        }
    }

    CircuitValidation { problems }
}

/// Solve node voltages and element currents/powers (true values)
///
/// # Errors
///
/// - `MissingGround` if neither the declared ground nor `GND` exists
/// - `UnknownNode` if an element references a node not in the circuit
/// - `InvalidElement` for non-positive resistances and similar
/// - `SingularMatrix` if the network cannot be solved
pub fn solve_circuit(circuit: &Circuit) -> Result<CircuitAnalysis, PhysicsError> {
    let ground = circuit
        .ground_id()
        .ok_or_else(|| PhysicsError::MissingGround(circuit.ground.clone()))?
        .to_string();

    // Index every non-ground node
    let mut index: HashMap<&str, usize> = HashMap::new();
    for node in circuit.nodes.iter().filter(|n| n.id != ground) {
        let next = index.len();
        if index.insert(node.id.as_str(), next).is_some() {
            return Err(PhysicsError::InvalidParameter(format!(
                "duplicate node id: {}",
                node.id
            )));
        }
    }

    let locate = |element: &CircuitElement, node: &str| -> Result<Option<usize>, PhysicsError> {
        if node == ground {
            Ok(None)
        } else {
            index
                .get(node)
                .copied()
                .map(Some)
                .ok_or_else(|| PhysicsError::UnknownNode {
                    element: element.id.clone(),
                    node: node.to_string(),
                })
        }
    };

    let n = index.len();
    let mut matrix = vec![vec![0.0; n]; n];
    let mut injected = vec![0.0; n];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[i] += SHUNT_CONDUCTANCE;
    }

    let mut terminals = Vec::with_capacity(circuit.elements.len());
    for element in &circuit.elements {
        element.kind.check(&element.id)?;
        let a = locate(element, &element.n1)?;
        let b = locate(element, &element.n2)?;
        terminals.push((a, b));

        if element.n1 == element.n2 {
            continue;
        }

        let g = element.kind.conductance();
        if let Some(a) = a {
            matrix[a][a] += g;
        }
        if let Some(b) = b {
            matrix[b][b] += g;
        }
        if let (Some(a), Some(b)) = (a, b) {
            matrix[a][b] -= g;
            matrix[b][a] -= g;
        }

        let i = element.kind.injected_current();
        if i != 0.0 {
            if let Some(a) = a {
                injected[a] += i;
            }
            if let Some(b) = b {
                injected[b] -= i;
            }
        }
    }

    let voltages = solve_linear_system(matrix, injected)?;
    let voltage_at = |node: Option<usize>| node.map_or(0.0, |i| voltages[i]);

    let mut analysis = CircuitAnalysis::default();
    analysis.node_voltages.insert(ground.clone(), 0.0);
    for (id, &i) in &index {
        analysis.node_voltages.insert((*id).to_string(), voltages[i]);
    }

    for (element, &(a, b)) in circuit.elements.iter().zip(&terminals) {
        let across = if element.n1 == element.n2 {
            0.0
        } else {
            voltage_at(a) - voltage_at(b)
        };

        let (current, power) = match &element.kind {
            ElementKind::VoltageSource { voltage } => {
                let delivered = SOURCE_CONDUCTANCE * (voltage - across);
                (delivered, -across * delivered)
            }
            ElementKind::CurrentSource { current } => (*current, -across * current),
            ElementKind::Switch { closed: false } | ElementKind::Capacitor { .. } => (0.0, 0.0),
            passive => {
                let current = across * passive.conductance();
                (current, across * current)
            }
        };

        if !element.kind.is_source() {
            analysis.total_power += power;
        }
        analysis.element_currents.insert(element.id.clone(), current);
        analysis.power_dissipated.insert(element.id.clone(), power);
    }

    Ok(analysis)
}

/// Fold resistors into one equivalent, in order
///
/// Each entry joins the running equivalent in series (adds) or in parallel
/// (reciprocal sum). A parallel entry with nothing before it starts the
/// chain.
///
/// # Example
/// ```
/// use virtual_lab_core_rs::physics::circuits::{equivalent_resistance, Connection};
///
/// let r = equivalent_resistance(&[(100.0, Connection::Parallel), (100.0, Connection::Parallel)]);
/// assert!((r - 50.0).abs() < 1e-9);
/// ```
pub fn equivalent_resistance(resistors: &[(f64, Connection)]) -> f64 {
    resistors
        .iter()
        .fold(0.0, |acc, &(value, connection)| match connection {
            Connection::Series => acc + value,
            Connection::Parallel if acc == 0.0 => value,
            Connection::Parallel => 1.0 / (1.0 / acc + 1.0 / value),
        })
}

/// Equivalent of resistors all in series
pub fn series_resistance(values: &[f64]) -> Result<f64, PhysicsError> {
    check_resistances(values)?;
    Ok(values.iter().sum())
}

/// Equivalent of resistors all in parallel
pub fn parallel_resistance(values: &[f64]) -> Result<f64, PhysicsError> {
    check_resistances(values)?;
    if values.is_empty() {
        return Err(PhysicsError::InvalidParameter(
            "parallel combination needs at least one resistor".to_string(),
        ));
    }
    Ok(1.0 / values.iter().map(|r| 1.0 / r).sum::<f64>())
}

fn check_resistances(values: &[f64]) -> Result<(), PhysicsError> {
    match values.iter().find(|r| !(**r > 0.0)) {
        Some(r) => Err(PhysicsError::InvalidParameter(format!(
            "resistance must be positive, got {}",
            r
        ))),
        None => Ok(()),
    }
}

/// Filament resistance at `temperature` (°C), linear in temperature
pub fn lamp_resistance_at(resistance: f64, temperature: f64) -> f64 {
    resistance * (1.0 + LAMP_TEMPERATURE_COEFFICIENT * (temperature - AMBIENT_TEMPERATURE))
}

/// One lamp update with true values
///
/// Brightness is proportional to power and capped at 100%. The filament
/// heats by `LAMP_HEATING_PER_WATT` per watt with no cooling term; the
/// temperature is clamped at `MAX_FILAMENT_TEMPERATURE` so sustained
/// current cannot run away.
pub fn lamp_state(voltage: f64, resistance: f64, temperature: f64) -> Result<LampReading, PhysicsError> {
    let hot_resistance = lamp_resistance_at(resistance, temperature);
    if !(hot_resistance > 0.0) {
        return Err(PhysicsError::InvalidParameter(format!(
            "lamp resistance at {} °C is not positive",
            temperature
        )));
    }

    let current = voltage / hot_resistance;
    let power = voltage * current;
    let brightness = (power / LAMP_FULL_BRIGHTNESS_POWER * 100.0).clamp(0.0, 100.0);
    let temperature = (temperature + power * LAMP_HEATING_PER_WATT).min(MAX_FILAMENT_TEMPERATURE);

    Ok(LampReading {
        current,
        power,
        brightness: brightness.round() as u8,
        temperature,
    })
}

/// Capacitor charging from a DC source through the assumed series resistance
pub fn capacitor_state(voltage: f64, capacitance: f64, time: f64) -> Result<CapacitorReading, PhysicsError> {
    if !(capacitance > 0.0) {
        return Err(PhysicsError::InvalidParameter(
            "capacitance must be positive".to_string(),
        ));
    }
    if time < 0.0 {
        return Err(PhysicsError::InvalidParameter(
            "time must be non-negative".to_string(),
        ));
    }

    let tau = capacitance * CAPACITOR_SERIES_RESISTANCE;
    let decay = (-time / tau).exp();
    let charge = capacitance * voltage * (1.0 - decay);
    let current = voltage / CAPACITOR_SERIES_RESISTANCE * decay;
    let energy = charge * charge / (2.0 * capacitance);

    Ok(CapacitorReading {
        charge,
        current,
        energy,
    })
}

/// Everything one circuit tick produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitStep {
    /// Measured currents and powers, solved node voltages
    pub analysis: CircuitAnalysis,
    pub lamps: BTreeMap<String, LampReading>,
}

/// Circuit engine producing instrument readings
///
/// Holds the session generator; every value it returns has passed through
/// measurement noise. Use [`solve_circuit`] for true values.
#[derive(Debug, Clone)]
pub struct CircuitEngine {
    rng: SharedRng,
    precision: f64,
}

impl CircuitEngine {
    pub fn new(rng: SharedRng, precision: f64) -> Self {
        Self { rng, precision }
    }

    pub fn set_precision(&mut self, precision: f64) {
        self.precision = precision;
    }

    fn noisy(&self, value: f64, precision: f64) -> f64 {
        self.rng.borrow_mut().measurement_noise(value, precision)
    }

    /// Solve the circuit and return noisy currents and powers
    ///
    /// Node voltages are returned as solved; use a voltmeter reading for a
    /// noisy voltage. Noise is drawn in element order so the draw sequence
    /// is reproducible.
    pub fn analyze_circuit(&self, circuit: &Circuit) -> Result<CircuitAnalysis, PhysicsError> {
        let truth = solve_circuit(circuit)?;
        Ok(self.measure(circuit, &truth))
    }

    /// Apply measurement noise to an already solved circuit
    pub fn measure(&self, circuit: &Circuit, truth: &CircuitAnalysis) -> CircuitAnalysis {
        let mut measured = CircuitAnalysis {
            node_voltages: truth.node_voltages.clone(),
            ..Default::default()
        };

        for element in &circuit.elements {
            let current = truth.element_currents.get(&element.id).copied().unwrap_or(0.0);
            let power = truth.power_dissipated.get(&element.id).copied().unwrap_or(0.0);
            measured
                .element_currents
                .insert(element.id.clone(), self.noisy(current, self.precision));
            measured
                .power_dissipated
                .insert(element.id.clone(), self.noisy(power, 2.0 * self.precision));
        }
        measured.total_power = self.noisy(truth.total_power, self.precision);

        measured
    }

    /// Read a solved circuit with an instrument
    ///
    /// - voltmeter: one reading per node
    /// - ammeter: one reading per element
    /// - ohmmeter: `|ΔV / I|` for every element carrying current
    pub fn instrument_readings(
        &self,
        circuit: &Circuit,
        analysis: &CircuitAnalysis,
        instrument: CircuitInstrument,
    ) -> BTreeMap<String, f64> {
        let fine = self.precision / 10.0;
        let mut readings = BTreeMap::new();

        match instrument {
            CircuitInstrument::Voltmeter => {
                for (node, voltage) in &analysis.node_voltages {
                    readings.insert(node.clone(), self.noisy(*voltage, fine));
                }
            }
            CircuitInstrument::Ammeter => {
                for element in &circuit.elements {
                    if let Some(current) = analysis.element_currents.get(&element.id) {
                        readings.insert(element.id.clone(), self.noisy(*current, fine));
                    }
                }
            }
            CircuitInstrument::Ohmmeter => {
                for element in &circuit.elements {
                    let current = analysis.element_currents.get(&element.id).copied().unwrap_or(0.0);
                    if current == 0.0 {
                        continue;
                    }
                    let v1 = analysis.node_voltages.get(&element.n1).copied().unwrap_or(0.0);
                    let v2 = analysis.node_voltages.get(&element.n2).copied().unwrap_or(0.0);
                    let resistance = ((v1 - v2) / current).abs();
                    readings.insert(element.id.clone(), self.noisy(resistance, self.precision));
                }
            }
        }

        readings
    }

    /// One tick of the bench circuit
    ///
    /// Solves at the current lamp temperatures, then heats every lamp from
    /// the power it dissipated. Readings are noisy; the circuit keeps the
    /// true filament temperatures.
    pub fn step_circuit(&self, circuit: &mut Circuit) -> Result<CircuitStep, PhysicsError> {
        let truth = solve_circuit(circuit)?;
        let analysis = self.measure(circuit, &truth);

        let mut lamps = BTreeMap::new();
        for element in circuit.elements.iter_mut() {
            let ElementKind::Lamp {
                resistance,
                temperature,
            } = &mut element.kind
            else {
                continue;
            };
            let v1 = truth.node_voltages.get(&element.n1).copied().unwrap_or(0.0);
            let v2 = truth.node_voltages.get(&element.n2).copied().unwrap_or(0.0);
            let state = lamp_state(v1 - v2, *resistance, *temperature)?;
            *temperature = state.temperature;
            lamps.insert(
                element.id.clone(),
                LampReading {
                    current: self.noisy(state.current, self.precision),
                    power: self.noisy(state.power, 2.0 * self.precision),
                    brightness: state.brightness,
                    temperature: self.noisy(state.temperature, 10.0 * self.precision),
                },
            );
        }

        Ok(CircuitStep { analysis, lamps })
    }

    /// Lamp behaviour as read by instruments
    pub fn simulate_lamp_behavior(
        &self,
        voltage: f64,
        resistance: f64,
        temperature: f64,
    ) -> Result<LampReading, PhysicsError> {
        let truth = lamp_state(voltage, resistance, temperature)?;
        Ok(LampReading {
            current: self.noisy(truth.current, self.precision),
            power: self.noisy(truth.power, 2.0 * self.precision),
            brightness: truth.brightness,
            temperature: self.noisy(truth.temperature, 10.0 * self.precision),
        })
    }

    /// Capacitor charging as read by instruments
    pub fn simulate_capacitor_behavior(
        &self,
        voltage: f64,
        capacitance: f64,
        time: f64,
    ) -> Result<CapacitorReading, PhysicsError> {
        let truth = capacitor_state(voltage, capacitance, time)?;
        Ok(CapacitorReading {
            charge: self.noisy(truth.charge, self.precision),
            current: self.noisy(truth.current, 2.0 * self.precision),
            energy: self.noisy(truth.energy, self.precision),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divider() -> Circuit {
        Circuit::new(
            vec![CircuitNode::new("GND"), CircuitNode::new("A"), CircuitNode::new("B")],
            vec![
                CircuitElement::new("V1", "A", "GND", ElementKind::VoltageSource { voltage: 9.0 }),
                CircuitElement::new("R1", "A", "B", ElementKind::Resistor { resistance: 100.0 }),
                CircuitElement::new("R2", "B", "GND", ElementKind::Resistor { resistance: 200.0 }),
            ],
        )
    }

    #[test]
    fn test_voltage_divider() {
        let analysis = solve_circuit(&divider()).unwrap();
        assert!((analysis.node_voltages["B"] - 6.0).abs() < 1e-3);
        assert!((analysis.element_currents["R1"] - 0.03).abs() < 1e-5);
        assert!((analysis.element_currents["V1"] - 0.03).abs() < 1e-5);
        assert!((analysis.total_power - 0.27).abs() < 1e-3);
    }

    #[test]
    fn test_open_switch_blocks_current() {
        let circuit = Circuit::new(
            vec![CircuitNode::new("GND"), CircuitNode::new("A"), CircuitNode::new("B")],
            vec![
                CircuitElement::new("V1", "A", "GND", ElementKind::VoltageSource { voltage: 5.0 }),
                CircuitElement::new("S1", "A", "B", ElementKind::Switch { closed: false }),
                CircuitElement::new("R1", "B", "GND", ElementKind::Resistor { resistance: 10.0 }),
            ],
        );
        let analysis = solve_circuit(&circuit).unwrap();
        assert_eq!(analysis.element_currents["S1"], 0.0);
        assert!(analysis.element_currents["R1"].abs() < 1e-9);
    }

    #[test]
    fn test_negative_resistance_rejected() {
        let mut circuit = divider();
        circuit.elements[1].kind = ElementKind::Resistor { resistance: -5.0 };
        let err = solve_circuit(&circuit).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidElement { .. }));
    }

    #[test]
    fn test_lamp_temperature_is_bounded() {
        let mut temperature = AMBIENT_TEMPERATURE;
        for _ in 0..10_000 {
            temperature = lamp_state(230.0, 10.0, temperature).unwrap().temperature;
        }
        assert!(temperature <= MAX_FILAMENT_TEMPERATURE);
    }

    #[test]
    fn test_capacitor_charges_towards_cv() {
        let c = 1e-6;
        let late = capacitor_state(5.0, c, 10.0).unwrap();
        assert!((late.charge - 5e-6).abs() < 1e-9);
        assert!(late.current < 1e-9);
    }
}
