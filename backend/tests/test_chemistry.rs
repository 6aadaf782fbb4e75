//! Chemistry calculators and the noisy chemistry engine

use proptest::prelude::*;
use virtual_lab_core_rs::chemistry::acid_base::{
    calculate_buffer_ph, calculate_strong_acid_ph, calculate_strong_base_ph, calculate_weak_acid_ph,
    simulate_titration, titration_curve, Analyte,
};
use virtual_lab_core_rs::chemistry::kinetics::{
    arrhenius_rate_constant, concentration_at_time, estimate_activation_energy, half_life,
};
use virtual_lab_core_rs::chemistry::solubility::{common_ion_solubility, compound_solubility, will_precipitate};
use virtual_lab_core_rs::chemistry::stoichiometry::{
    element_counts, limiting_reagent, molar_mass, theoretical_yield, yield_with_factor,
};
use virtual_lab_core_rs::chemistry::engine::YIELD_FACTOR_RANGE;
use virtual_lab_core_rs::chemistry::{
    ChemistryEngine, ChemistryError, Indicator, ReagentAmount, Reaction, StoichTerm, TitrationSetup,
};
use virtual_lab_core_rs::rng;
use virtual_lab_core_rs::{Solution, Species};

fn acid_titration() -> TitrationSetup {
    TitrationSetup {
        analyte: Analyte::StrongAcid,
        analyte_concentration: 0.1,
        analyte_volume_l: 0.025,
        titrant_concentration: 0.1,
    }
}

// ============================================================================
// Acid-base
// ============================================================================

#[test]
fn test_strong_acid_and_base_ph() {
    assert!((calculate_strong_acid_ph(0.1).unwrap() - 1.0).abs() < 1e-9);
    assert!((calculate_strong_base_ph(0.1).unwrap() - 13.0).abs() < 1e-9);
    assert!((calculate_strong_acid_ph(1e-3).unwrap() - 3.0).abs() < 1e-9);
}

#[test]
fn test_weak_acid_is_less_acidic_than_strong() {
    let weak = calculate_weak_acid_ph(1.8e-5, 0.1).unwrap();
    assert!((weak - 2.87).abs() < 0.01, "pH {}", weak);
    assert!(weak > calculate_strong_acid_ph(0.1).unwrap());
}

#[test]
fn test_equal_buffer_sits_at_pka() {
    let ph = calculate_buffer_ph(1.8e-5, 0.1, 0.1).unwrap();
    assert!((ph + 1.8e-5_f64.log10()).abs() < 1e-9);
}

#[test]
fn test_non_positive_concentration_rejected() {
    assert!(matches!(
        calculate_strong_acid_ph(0.0),
        Err(ChemistryError::NonPositive { .. })
    ));
    assert!(calculate_strong_base_ph(-1.0).is_err());
    assert!(calculate_weak_acid_ph(1.8e-5, f64::NAN).is_err());
}

#[test]
fn test_titration_equivalence_point() {
    let setup = acid_titration();
    let point = simulate_titration(&setup, setup.equivalence_volume()).unwrap();
    assert!(point.at_equivalence);
    assert_eq!(point.ph, 7.0);
}

#[test]
fn test_titration_curve_rises_through_equivalence() {
    let setup = acid_titration();
    let volumes = [0.0, 0.010, 0.020, 0.024, 0.025, 0.026, 0.030, 0.040];
    let curve = titration_curve(&setup, &volumes).unwrap();

    assert!((curve[0].ph - 1.0).abs() < 1e-9);
    assert!(curve.windows(2).all(|w| w[1].ph >= w[0].ph));
    assert_eq!(curve.iter().filter(|p| p.at_equivalence).count(), 1);
    assert!(curve.last().unwrap().ph > 11.0);
}

#[test]
fn test_base_titration_falls() {
    let setup = TitrationSetup {
        analyte: Analyte::StrongBase,
        ..acid_titration()
    };
    let start = simulate_titration(&setup, 0.0).unwrap();
    let past = simulate_titration(&setup, 0.035).unwrap();
    assert!((start.ph - 13.0).abs() < 1e-9);
    assert!(past.ph < 7.0);
    assert!(past.excess_moles > 0.0);
}

#[test]
fn test_indicator_colors() {
    assert_eq!(Indicator::Phenolphthalein.color(7.0), "colorless");
    assert_eq!(Indicator::Phenolphthalein.color(12.0), "deep pink");
    assert_eq!(Indicator::BromothymolBlue.color(7.0), "green");
    assert_eq!(Indicator::MethylOrange.color(2.0), "red");
    assert_eq!(Indicator::from_name("Methyl Orange"), Some(Indicator::MethylOrange));
    assert_eq!(Indicator::from_name("litmus"), None);
}

#[test]
fn test_solution_ph_from_species() {
    let acid = Solution::new("flask", 1.0).with_species(Species::new("HCl", 0.01));
    assert!((acid.ph().ph - 2.0).abs() < 1e-9);

    let neutral = Solution::new("flask", 1.0).with_species(Species::new("NaCl", 0.1));
    assert_eq!(neutral.ph().ph, 7.0);
}

// ============================================================================
// Kinetics
// ============================================================================

#[test]
fn test_arrhenius_increases_with_temperature() {
    let cold = arrhenius_rate_constant(1e10, 50_000.0, 280.0).unwrap();
    let room = arrhenius_rate_constant(1e10, 50_000.0, 298.15).unwrap();
    let hot = arrhenius_rate_constant(1e10, 50_000.0, 350.0).unwrap();
    assert!(cold < room && room < hot);
    assert!(arrhenius_rate_constant(1e10, 50_000.0, 0.0).is_err());
}

#[test]
fn test_activation_energy_recovered_from_data() {
    let data: Vec<(f64, f64)> = [290.0, 300.0, 310.0, 320.0]
        .iter()
        .map(|&t| (t, arrhenius_rate_constant(5e7, 60_000.0, t).unwrap()))
        .collect();
    let fit = estimate_activation_energy(&data).unwrap();

    assert!((fit.activation_energy - 60_000.0).abs() < 1e-2);
    assert!((fit.pre_exponential / 5e7 - 1.0).abs() < 1e-6);
    assert!(fit.r_squared > 0.999_999);
}

#[test]
fn test_half_life_by_order() {
    assert!((half_life(0.2, 1.0, 0).unwrap() - 2.5).abs() < 1e-12);
    assert!((half_life(0.2, 1.0, 2).unwrap() - 5.0).abs() < 1e-12);
    assert!(matches!(half_life(0.2, 1.0, 3), Err(ChemistryError::UnsupportedOrder(3))));
}

#[test]
fn test_zero_order_never_goes_negative() {
    assert_eq!(concentration_at_time(0.5, 0.1, 100.0, 0).unwrap(), 0.0);
}

proptest! {
    #[test]
    fn prop_first_order_half_life_independent_of_c0(k in 1e-4f64..10.0, c0 in 1e-4f64..10.0) {
        let t = half_life(k, c0, 1).unwrap();
        prop_assert!((t - std::f64::consts::LN_2 / k).abs() < 1e-9 * t);

        let c = concentration_at_time(c0, k, t, 1).unwrap();
        prop_assert!((c - c0 / 2.0).abs() < 1e-9 * c0);
    }

    #[test]
    fn prop_concentration_decreases_with_time(
        c0 in 1e-3f64..5.0,
        k in 1e-3f64..1.0,
        t1 in 0.0f64..50.0,
        dt in 0.0f64..50.0,
        order in 0u8..3,
    ) {
        let early = concentration_at_time(c0, k, t1, order).unwrap();
        let late = concentration_at_time(c0, k, t1 + dt, order).unwrap();
        prop_assert!(late <= early);
        prop_assert!(late >= 0.0);
    }
}

// ============================================================================
// Solubility
// ============================================================================

#[test]
fn test_silver_chloride_precipitates() {
    let check = will_precipitate("AgCl", &[1e-4, 1e-4]).unwrap();
    assert!(check.will_precipitate);
    assert!(check.supersaturation > 1.0);

    let dilute = will_precipitate("AgCl", &[1e-6, 1e-6]).unwrap();
    assert!(!dilute.will_precipitate);
}

#[test]
fn test_unknown_compound() {
    assert!(matches!(
        will_precipitate("Unobtainium", &[1.0]),
        Err(ChemistryError::UnknownCompound(_))
    ));
}

#[test]
fn test_common_ion_lowers_solubility() {
    let pure = compound_solubility("AgCl").unwrap();
    let ksp = pure * pure;
    let suppressed = common_ion_solubility(ksp, 0.1).unwrap();
    assert!(suppressed < pure);
}

// ============================================================================
// Stoichiometry
// ============================================================================

#[test]
fn test_molar_mass_of_water_and_copper_sulfate() {
    let water = molar_mass("H2O").unwrap();
    assert!((water.grams_per_mole - 18.015).abs() < 0.01);
    assert!(water.is_complete());

    let sulfate = molar_mass("CuSO4").unwrap();
    assert!((sulfate.grams_per_mole - 159.6).abs() < 0.1);
}

#[test]
fn test_oversized_counts_are_formula_errors() {
    for formula in ["(H99999)99999", "H4294967296", "(H2)2147483648", "H4294967295H"] {
        assert!(
            matches!(molar_mass(formula), Err(ChemistryError::InvalidFormula { .. })),
            "{} should be rejected",
            formula
        );
    }
    assert_eq!(element_counts("(H99999)9").unwrap()["H"], 899_991);
}

#[test]
fn test_deep_nesting_rejected() {
    let nested = format!("{}H{}", "(".repeat(9), ")".repeat(9));
    assert!(matches!(
        element_counts(&nested),
        Err(ChemistryError::InvalidFormula { .. })
    ));

    let shallow = format!("{}H{}", "(".repeat(8), ")2".repeat(8));
    assert_eq!(element_counts(&shallow).unwrap()["H"], 256);

    let huge = "(".repeat(100_000);
    assert!(element_counts(&huge).is_err());
}

#[test]
fn test_limiting_reagent_and_yield() {
    // 2A + B -> ... with 2 mol A and 5 mol B: A limits, extent 1
    let reagents = [ReagentAmount::new("A", 2.0, 2), ReagentAmount::new("B", 5.0, 1)];
    let limiting = limiting_reagent(&reagents).unwrap();
    assert_eq!(limiting.formula, "A");
    assert_eq!(limiting.ratio, 1.0);
    assert_eq!(theoretical_yield(&reagents, 2).unwrap(), 2.0);

    let result = yield_with_factor(&reagents, 2, 0.9).unwrap();
    assert!((result.actual_moles - 1.8).abs() < 1e-12);
    assert!((result.percent_yield - 90.0).abs() < 1e-12);
    assert!(yield_with_factor(&reagents, 2, 1.1).is_err());
}

#[test]
fn test_limiting_reagent_rejects_bad_input() {
    assert!(limiting_reagent(&[]).is_err());
    assert!(limiting_reagent(&[ReagentAmount::new("A", 1.0, 0)]).is_err());
    assert!(limiting_reagent(&[ReagentAmount::new("A", -1.0, 1)]).is_err());
}

// ============================================================================
// Engine
// ============================================================================

#[test]
fn test_realistic_yield_within_factor_range() {
    let engine = ChemistryEngine::new(rng::shared(9), 0.01);
    let reagents = [ReagentAmount::new("Zn", 0.5, 1), ReagentAmount::new("HCl", 2.0, 2)];

    for _ in 0..200 {
        let result = engine.realistic_yield(&reagents, 1).unwrap();
        let (lo, hi) = YIELD_FACTOR_RANGE;
        assert!(result.percent_yield >= lo * 100.0 && result.percent_yield <= hi * 100.0);
        assert!(result.actual_moles <= result.theoretical_moles);
    }
}

#[test]
fn test_measurement_noise_is_reproducible() {
    let solution = Solution::new("flask", 0.1).with_species(Species::new("HCl", 0.001));
    let a = ChemistryEngine::new(rng::shared(77), 0.05);
    let b = ChemistryEngine::new(rng::shared(77), 0.05);

    for _ in 0..20 {
        assert_eq!(a.measure_ph(&solution), b.measure_ph(&solution));
    }
}

#[test]
fn test_zero_precision_reads_true_values() {
    let solution = Solution::new("flask", 0.1).with_species(Species::new("HCl", 0.001));
    let engine = ChemistryEngine::new(rng::shared(1), 0.0);
    assert!((engine.measure_ph(&solution) - 2.0).abs() < 1e-9);

    let (ph, at_equivalence) = engine
        .measure_titration(&acid_titration(), acid_titration().equivalence_volume())
        .unwrap();
    assert_eq!(ph, 7.0);
    assert!(at_equivalence);
}

#[test]
fn test_crystal_formation_only_when_supersaturated() {
    let engine = ChemistryEngine::new(rng::shared(5), 0.01);

    let dilute = will_precipitate("AgCl", &[1e-6, 1e-6]).unwrap();
    assert!(engine.simulate_crystal_formation(&dilute).is_none());

    let saturated = will_precipitate("AgCl", &[1e-3, 1e-3]).unwrap();
    let crystals = engine.simulate_crystal_formation(&saturated).unwrap();
    assert!(crystals.crystal_count >= 1);
    assert!(crystals.mean_size_um > 0.0);
    assert!(crystals.formation_time_s > 0.0);
}

#[test]
fn test_vessel_update_consumes_limiting_reactant() {
    let reaction = Reaction::new(
        "A + 2B -> C",
        vec![StoichTerm::new("A", 1), StoichTerm::new("B", 2)],
        vec![StoichTerm::new("C", 1)],
        5.0,
        0.0,
        1,
    )
    .unwrap();
    let mut vessel = Solution::new("reactor", 1.0)
        .with_species(Species::new("A", 1.0))
        .with_species(Species::new("B", 0.1))
        .with_reaction(reaction);

    let engine = ChemistryEngine::new(rng::shared(3), 0.0);
    for _ in 0..50 {
        engine.update_vessel(&mut vessel, 1.0).unwrap();
    }

    assert!(vessel.moles("B") >= 0.0);
    assert!(vessel.moles("B") < 1e-9);
    assert!((vessel.moles("C") - 0.05).abs() < 1e-9);
    assert!((vessel.moles("A") - 0.95).abs() < 1e-9);
}

#[test]
fn test_invalid_reaction_rejected() {
    let result = Reaction::new("A ->", vec![], vec![StoichTerm::new("B", 1)], 1.0, 0.0, 1);
    assert!(matches!(result, Err(ChemistryError::InvalidReaction { .. })));
}
