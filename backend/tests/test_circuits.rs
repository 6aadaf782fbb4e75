//! DC circuit analysis and the circuit engine

use virtual_lab_core_rs::physics::circuits::{
    capacitor_state, equivalent_resistance, lamp_state, parallel_resistance, series_resistance,
    solve_circuit, validate_circuit, CircuitInstrument, Connection, MAX_FILAMENT_TEMPERATURE,
};
use virtual_lab_core_rs::physics::{Circuit, CircuitElement, CircuitEngine, CircuitNode, ElementKind};
use virtual_lab_core_rs::{rng, PhysicsError};

fn nodes(ids: &[&str]) -> Vec<CircuitNode> {
    ids.iter().map(|id| CircuitNode::new(*id)).collect()
}

fn single_resistor(voltage: f64, resistance: f64) -> Circuit {
    Circuit::new(
        nodes(&["GND", "A"]),
        vec![
            CircuitElement::new("V1", "A", "GND", ElementKind::VoltageSource { voltage }),
            CircuitElement::new("R1", "A", "GND", ElementKind::Resistor { resistance }),
        ],
    )
}

fn lamp_circuit() -> Circuit {
    Circuit::new(
        nodes(&["GND", "A"]),
        vec![
            CircuitElement::new("V1", "A", "GND", ElementKind::VoltageSource { voltage: 12.0 }),
            CircuitElement::new(
                "L1",
                "A",
                "GND",
                ElementKind::Lamp {
                    resistance: 10.0,
                    temperature: 25.0,
                },
            ),
        ],
    )
}

// ============================================================================
// Equivalent resistance
// ============================================================================

#[test]
fn test_series_and_parallel_helpers() {
    assert_eq!(series_resistance(&[100.0, 100.0]).unwrap(), 200.0);
    assert!((parallel_resistance(&[100.0, 100.0]).unwrap() - 50.0).abs() < 1e-12);
    assert!((parallel_resistance(&[60.0, 30.0, 20.0]).unwrap() - 10.0).abs() < 1e-12);
}

#[test]
fn test_resistance_helpers_reject_bad_values() {
    assert!(matches!(
        series_resistance(&[100.0, 0.0]),
        Err(PhysicsError::InvalidParameter(_))
    ));
    assert!(parallel_resistance(&[]).is_err());
    assert!(parallel_resistance(&[-5.0]).is_err());
}

#[test]
fn test_mixed_chain() {
    // (100 + 100) ∥ 200 = 100, then + 50
    let r = equivalent_resistance(&[
        (100.0, Connection::Series),
        (100.0, Connection::Series),
        (200.0, Connection::Parallel),
        (50.0, Connection::Series),
    ]);
    assert!((r - 150.0).abs() < 1e-9);
}

// ============================================================================
// Nodal analysis
// ============================================================================

#[test]
fn test_ohms_law_single_resistor() {
    let analysis = solve_circuit(&single_resistor(10.0, 100.0)).unwrap();
    let current = analysis.element_currents["R1"];
    assert!((current - 0.1).abs() < 1e-6, "current {}", current);
    assert!((analysis.node_voltages["A"] - 10.0).abs() < 1e-5);
    assert_eq!(analysis.node_voltages["GND"], 0.0);
    assert!((analysis.total_power - 1.0).abs() < 1e-5);
}

#[test]
fn test_source_delivers_load_current() {
    let analysis = solve_circuit(&single_resistor(10.0, 100.0)).unwrap();
    let delivered = analysis.element_currents["V1"];
    assert!((delivered - 0.1).abs() < 1e-6);
    // Sources report supplied power and are left out of the total
    assert!(analysis.power_dissipated["V1"] < 0.0);
}

#[test]
fn test_parallel_branches_share_voltage() {
    let circuit = Circuit::new(
        nodes(&["GND", "A"]),
        vec![
            CircuitElement::new("V1", "A", "GND", ElementKind::VoltageSource { voltage: 5.0 }),
            CircuitElement::new("R1", "A", "GND", ElementKind::Resistor { resistance: 100.0 }),
            CircuitElement::new("R2", "A", "GND", ElementKind::Resistor { resistance: 100.0 }),
        ],
    );
    let analysis = solve_circuit(&circuit).unwrap();
    assert!((analysis.element_currents["R1"] - 0.05).abs() < 1e-6);
    assert!((analysis.element_currents["R2"] - 0.05).abs() < 1e-6);
    assert!((analysis.element_currents["V1"] - 0.1).abs() < 1e-6);
}

#[test]
fn test_current_source_drives_resistor() {
    let circuit = Circuit::new(
        nodes(&["GND", "A"]),
        vec![
            CircuitElement::new("I1", "A", "GND", ElementKind::CurrentSource { current: 0.01 }),
            CircuitElement::new("R1", "A", "GND", ElementKind::Resistor { resistance: 100.0 }),
        ],
    );
    let analysis = solve_circuit(&circuit).unwrap();
    assert!((analysis.node_voltages["A"] - 1.0).abs() < 1e-6);
    assert!((analysis.element_currents["R1"] - 0.01).abs() < 1e-8);
}

#[test]
fn test_closed_switch_conducts() {
    let circuit = Circuit::new(
        nodes(&["GND", "A", "B"]),
        vec![
            CircuitElement::new("V1", "A", "GND", ElementKind::VoltageSource { voltage: 9.0 }),
            CircuitElement::new("S1", "A", "B", ElementKind::Switch { closed: true }),
            CircuitElement::new("R1", "B", "GND", ElementKind::Resistor { resistance: 90.0 }),
        ],
    );
    let analysis = solve_circuit(&circuit).unwrap();
    assert!((analysis.element_currents["R1"] - 0.1).abs() < 1e-5);
}

#[test]
fn test_capacitor_blocks_dc() {
    let circuit = Circuit::new(
        nodes(&["GND", "A", "B"]),
        vec![
            CircuitElement::new("V1", "A", "GND", ElementKind::VoltageSource { voltage: 9.0 }),
            CircuitElement::new("R1", "A", "B", ElementKind::Resistor { resistance: 1000.0 }),
            CircuitElement::new("C1", "B", "GND", ElementKind::Capacitor { capacitance: 1e-6 }),
        ],
    );
    let analysis = solve_circuit(&circuit).unwrap();
    assert_eq!(analysis.element_currents["C1"], 0.0);
    assert!(analysis.element_currents["R1"].abs() < 1e-6);
}

#[test]
fn test_solve_reports_structural_errors() {
    let no_ground = Circuit::new(
        nodes(&["A", "B"]),
        vec![CircuitElement::new("R1", "A", "B", ElementKind::Resistor { resistance: 1.0 })],
    );
    assert!(matches!(solve_circuit(&no_ground), Err(PhysicsError::MissingGround(_))));

    let dangling = Circuit::new(
        nodes(&["GND", "A"]),
        vec![CircuitElement::new("R1", "A", "Z", ElementKind::Resistor { resistance: 1.0 })],
    );
    assert!(matches!(
        solve_circuit(&dangling),
        Err(PhysicsError::UnknownNode { ref node, .. }) if node == "Z"
    ));
}

#[test]
fn test_frozen_lamp_rejected() {
    let frozen = |temperature: f64| {
        Circuit::new(
            nodes(&["GND", "A"]),
            vec![
                CircuitElement::new("V1", "A", "GND", ElementKind::VoltageSource { voltage: 12.0 }),
                CircuitElement::new(
                    "L1",
                    "A",
                    "GND",
                    ElementKind::Lamp {
                        resistance: 10.0,
                        temperature,
                    },
                ),
            ],
        )
    };
    // Below absolute zero, and above it but where the linear model goes negative
    for t in [-300.0, -250.0, -240.0, f64::NAN, f64::INFINITY] {
        assert!(
            matches!(
                solve_circuit(&frozen(t)),
                Err(PhysicsError::InvalidElement { ref element, .. }) if element == "L1"
            ),
            "temperature {}",
            t
        );
    }
    assert!(solve_circuit(&frozen(-200.0)).is_ok());
}

#[test]
fn test_validation_collects_every_problem() {
    let circuit = Circuit::new(
        nodes(&["A", "A"]),
        vec![CircuitElement::new("R1", "A", "X", ElementKind::Resistor { resistance: 1.0 })],
    );
    let report = validate_circuit(&circuit);
    assert!(!report.is_valid());
    // unknown node, no ground, no source, duplicate node
    assert_eq!(report.problems.len(), 4, "{:?}", report.problems);

    assert!(validate_circuit(&single_resistor(1.0, 1.0)).is_valid());
}

#[test]
fn test_circuit_json_shape() {
    let json = r#"{
        "nodes": [{"id": "GND"}, {"id": "A"}],
        "elements": [
            {"id": "V1", "n1": "A", "n2": "GND", "kind": {"type": "voltage_source", "voltage": 10.0}},
            {"id": "L1", "n1": "A", "n2": "GND", "kind": {"type": "lamp", "resistance": 100.0}}
        ]
    }"#;
    let circuit: Circuit = serde_json::from_str(json).unwrap();
    assert_eq!(circuit.ground, "GND");
    assert!(matches!(
        circuit.element("L1").map(|e| &e.kind),
        Some(ElementKind::Lamp { temperature, .. }) if *temperature == 25.0
    ));
}

// ============================================================================
// Lamps and capacitors
// ============================================================================

#[test]
fn test_lamp_brightness_and_clamp() {
    let dim = lamp_state(1.0, 100.0, 25.0).unwrap();
    assert_eq!(dim.brightness, 0);
    assert!((dim.current - 0.01).abs() < 1e-12);

    let bright = lamp_state(240.0, 10.0, 25.0).unwrap();
    assert_eq!(bright.brightness, 100);

    let hot = lamp_state(1_000.0, 1.0, 2_499.0).unwrap();
    assert_eq!(hot.temperature, MAX_FILAMENT_TEMPERATURE);
}

#[test]
fn test_capacitor_charges_monotonically() {
    let c = 1e-6;
    let early = capacitor_state(5.0, c, 0.1).unwrap();
    let late = capacitor_state(5.0, c, 2.0).unwrap();
    assert!(late.charge > early.charge);
    assert!(late.current < early.current);
    assert!(late.charge <= c * 5.0);
    assert!(capacitor_state(5.0, 0.0, 1.0).is_err());
    assert!(capacitor_state(5.0, c, -1.0).is_err());
}

// ============================================================================
// Engine
// ============================================================================

#[test]
fn test_filament_heats_to_ceiling_over_ticks() {
    let engine = CircuitEngine::new(rng::shared(11), 0.01);
    let mut circuit = lamp_circuit();
    let mut last = 25.0;

    for _ in 0..5_000 {
        engine.step_circuit(&mut circuit).unwrap();
        let Some(ElementKind::Lamp { temperature, .. }) = circuit.element("L1").map(|e| e.kind.clone()) else {
            panic!("lamp missing");
        };
        assert!(temperature >= last);
        assert!(temperature <= MAX_FILAMENT_TEMPERATURE);
        last = temperature;
    }
}

#[test]
fn test_hot_filament_draws_less_current() {
    let engine = CircuitEngine::new(rng::shared(11), 0.0);
    let mut circuit = lamp_circuit();

    let first = engine.step_circuit(&mut circuit).unwrap();
    for _ in 0..100 {
        engine.step_circuit(&mut circuit).unwrap();
    }
    let later = engine.step_circuit(&mut circuit).unwrap();
    assert!(later.lamps["L1"].current < first.lamps["L1"].current);
}

#[test]
fn test_engine_noise_is_reproducible() {
    let circuit = single_resistor(10.0, 100.0);
    let a = CircuitEngine::new(rng::shared(404), 0.05);
    let b = CircuitEngine::new(rng::shared(404), 0.05);

    for _ in 0..10 {
        assert_eq!(a.analyze_circuit(&circuit).unwrap(), b.analyze_circuit(&circuit).unwrap());
    }
}

#[test]
fn test_engine_leaves_node_voltages_exact() {
    let circuit = single_resistor(10.0, 100.0);
    let truth = solve_circuit(&circuit).unwrap();
    let measured = CircuitEngine::new(rng::shared(1), 0.05).analyze_circuit(&circuit).unwrap();
    assert_eq!(measured.node_voltages, truth.node_voltages);
}

#[test]
fn test_instrument_readings() {
    let circuit = single_resistor(10.0, 100.0);
    let truth = solve_circuit(&circuit).unwrap();
    let engine = CircuitEngine::new(rng::shared(2), 0.0);

    let volts = engine.instrument_readings(&circuit, &truth, CircuitInstrument::Voltmeter);
    assert_eq!(volts.len(), 2);
    assert!((volts["A"] - 10.0).abs() < 1e-5);

    let amps = engine.instrument_readings(&circuit, &truth, CircuitInstrument::Ammeter);
    assert!((amps["R1"] - 0.1).abs() < 1e-6);

    let ohms = engine.instrument_readings(&circuit, &truth, CircuitInstrument::Ohmmeter);
    assert!((ohms["R1"] - 100.0).abs() < 1e-6);
}

#[test]
fn test_engine_draws_two_values_per_noisy_reading() {
    let shared = rng::shared(8);
    let engine = CircuitEngine::new(shared.clone(), 0.01);
    engine.simulate_lamp_behavior(6.0, 30.0, 25.0).unwrap();
    // current, power, temperature
    assert_eq!(shared.borrow().draw_count(), 6);

    engine.simulate_capacitor_behavior(5.0, 1e-6, 0.5).unwrap();
    assert_eq!(shared.borrow().draw_count(), 12);
}
