//! Chemistry engine
//!
//! Wraps the pure calculators with the session generator. Anything a student
//! reads off an instrument goes through measurement noise here; the bench
//! itself only ever holds true values.

use super::acid_base::{simulate_titration, PhRegime, TitrationSetup};
use super::kinetics::concentration_at_time;
use super::solubility::PrecipitationCheck;
use super::stoichiometry::{yield_with_factor, ReagentAmount, YieldResult};
use super::{require_positive, ChemistryError};
use crate::models::bench::Solution;
use crate::rng::SharedRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Range of the realistic-yield factor
pub const YIELD_FACTOR_RANGE: (f64, f64) = (0.80, 0.95);

/// Range of the random spread applied to crystal growth figures
const CRYSTAL_SPREAD: (f64, f64) = (0.8, 1.2);

/// Crystals that came out of a supersaturated solution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrystalFormation {
    pub crystal_count: u32,
    /// Mean crystal size (µm)
    pub mean_size_um: f64,
    /// Time until crystals are visible (s)
    pub formation_time_s: f64,
}

/// Instrument view of one vessel after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselReading {
    pub vessel_id: String,
    pub ph: f64,
    pub regime: PhRegime,
    pub temperature_k: f64,
    pub indicator_color: Option<String>,
    /// Moles per species after the tick (true values)
    pub species: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct ChemistryEngine {
    rng: SharedRng,
    precision: f64,
}

impl ChemistryEngine {
    pub fn new(rng: SharedRng, precision: f64) -> Self {
        Self { rng, precision }
    }

    pub fn set_precision(&mut self, precision: f64) {
        self.precision = precision;
    }

    fn noisy(&self, value: f64) -> f64 {
        self.rng.borrow_mut().measurement_noise(value, self.precision)
    }

    /// pH meter reading
    pub fn measure_ph(&self, solution: &Solution) -> f64 {
        self.noisy(solution.ph().ph)
    }

    /// Thermometer reading (K)
    pub fn measure_temperature(&self, solution: &Solution) -> f64 {
        self.noisy(solution.temperature_k)
    }

    /// Balance reading (g)
    pub fn measure_mass(&self, grams: f64) -> f64 {
        self.noisy(grams)
    }

    /// pH meter reading during a titration; the equivalence flag is exact
    pub fn measure_titration(&self, setup: &TitrationSetup, added_volume_l: f64) -> Result<(f64, bool), ChemistryError> {
        let point = simulate_titration(setup, added_volume_l)?;
        Ok((self.noisy(point.ph), point.at_equivalence))
    }

    /// Actual yield with a random factor in [`YIELD_FACTOR_RANGE`]
    pub fn realistic_yield(&self, reagents: &[ReagentAmount], product_coefficient: u32) -> Result<YieldResult, ChemistryError> {
        let factor = self.rng.borrow_mut().range(YIELD_FACTOR_RANGE.0, YIELD_FACTOR_RANGE.1);
        yield_with_factor(reagents, product_coefficient, factor)
    }

    /// Crystals from a supersaturated solution, `None` at or below Ksp
    ///
    /// Count and size grow with `ln(Q/Ksp)`, formation time shrinks with it;
    /// each figure gets its own random spread. Draws three values when
    /// crystals form and none otherwise.
    pub fn simulate_crystal_formation(&self, check: &PrecipitationCheck) -> Option<CrystalFormation> {
        if !check.will_precipitate {
            return None;
        }
        let drive = check.supersaturation.ln();
        let mut rng = self.rng.borrow_mut();
        let (lo, hi) = CRYSTAL_SPREAD;
        let count = (10.0 * drive * rng.range(lo, hi)).round().max(1.0);
        let size = 5.0 * (1.0 + drive) * rng.range(lo, hi);
        let time = 60.0 / (1.0 + drive) * rng.range(lo, hi);

        Some(CrystalFormation {
            crystal_count: count as u32,
            mean_size_um: size,
            formation_time_s: time,
        })
    }

    /// Advance every reaction in the vessel by `dt` seconds
    ///
    /// The first reactant is the key species: its concentration follows the
    /// closed form for the reaction order with `k` rescaled to the vessel
    /// temperature. The resulting extent is capped by whichever reactant runs
    /// out first, so moles stay non-negative.
    pub fn update_vessel(&self, solution: &mut Solution, dt: f64) -> Result<VesselReading, ChemistryError> {
        require_positive("timestep", dt)?;
        solution.validate()?;

        let reactions = solution.reactions.clone();
        for reaction in &reactions {
            let Some(key) = reaction.reactants.first() else {
                continue;
            };
            let k = reaction.rate_constant_at(solution.temperature_k)?;
            let c0 = solution.concentration(&key.formula);
            if c0 <= 0.0 {
                continue;
            }
            let c1 = concentration_at_time(c0, k, dt, reaction.order)?;

            let requested = (c0 - c1) * solution.volume_l / key.coefficient as f64;
            let available = reaction
                .reactants
                .iter()
                .map(|t| solution.moles(&t.formula) / t.coefficient as f64)
                .fold(f64::INFINITY, f64::min);
            let extent = requested.min(available).max(0.0);
            if extent == 0.0 {
                continue;
            }

            for term in &reaction.reactants {
                solution.add_moles(&term.formula, -extent * term.coefficient as f64);
            }
            for term in &reaction.products {
                solution.add_moles(&term.formula, extent * term.coefficient as f64);
            }
        }

        let estimate = solution.ph();
        let species = solution
            .species
            .iter()
            .map(|s| (s.formula.clone(), s.moles))
            .collect();

        Ok(VesselReading {
            vessel_id: solution.id.clone(),
            ph: self.noisy(estimate.ph),
            regime: estimate.regime,
            temperature_k: self.noisy(solution.temperature_k),
            indicator_color: solution.indicator_color().map(str::to_string),
            species,
        })
    }
}
