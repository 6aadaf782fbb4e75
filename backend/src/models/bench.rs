//! Bench state
//!
//! Everything the student has placed on the bench: vessels holding
//! solutions, an optional circuit, mechanical objects and an optical rail.
//! The clock owns one `BenchState` and the engines update it each tick.
//!
//! # Critical Invariants
//!
//! - Species moles are never negative
//! - pH is derived from species, never stored

use crate::chemistry::acid_base::{ph_from_concentrations, Indicator, PhEstimate};
use crate::chemistry::kinetics::Reaction;
use crate::chemistry::ChemistryError;
use crate::physics::circuits::Circuit;
use crate::physics::mechanics::MechanicsBench;
use crate::physics::optics::{OpticalElement, OpticalRay};
use serde::{Deserialize, Serialize};

/// Room temperature (K)
pub const ROOM_TEMPERATURE: f64 = 298.15;

fn room_temperature() -> f64 {
    ROOM_TEMPERATURE
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Solid,
    Liquid,
    Gas,
    #[default]
    Aqueous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub formula: String,
    pub moles: f64,
    #[serde(default)]
    pub charge: Option<i32>,
    #[serde(default)]
    pub phase: Phase,
}

impl Species {
    pub fn new(formula: impl Into<String>, moles: f64) -> Self {
        Self {
            formula: formula.into(),
            moles,
            charge: None,
            phase: Phase::Aqueous,
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }
}

/// A vessel on the bench and the solution it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: String,
    pub volume_l: f64,
    #[serde(default = "room_temperature")]
    pub temperature_k: f64,
    #[serde(default)]
    pub species: Vec<Species>,
    #[serde(default)]
    pub indicator: Option<Indicator>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Solution {
    pub fn new(id: impl Into<String>, volume_l: f64) -> Self {
        Self {
            id: id.into(),
            volume_l,
            temperature_k: ROOM_TEMPERATURE,
            species: Vec::new(),
            indicator: None,
            reactions: Vec::new(),
        }
    }

    pub fn with_species(mut self, species: Species) -> Self {
        self.species.push(species);
        self
    }

    pub fn with_indicator(mut self, indicator: Indicator) -> Self {
        self.indicator = Some(indicator);
        self
    }

    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.reactions.push(reaction);
        self
    }

    pub fn moles(&self, formula: &str) -> f64 {
        self.species
            .iter()
            .filter(|s| s.formula == formula)
            .map(|s| s.moles)
            .sum()
    }

    /// mol/L, zero for an empty vessel
    pub fn concentration(&self, formula: &str) -> f64 {
        if self.volume_l > 0.0 {
            self.moles(formula) / self.volume_l
        } else {
            0.0
        }
    }

    /// Add (or with a negative delta, remove) moles, clamping at zero
    pub fn add_moles(&mut self, formula: &str, delta: f64) {
        match self.species.iter_mut().find(|s| s.formula == formula) {
            Some(s) => s.moles = (s.moles + delta).max(0.0),
            None => self.species.push(Species::new(formula, delta.max(0.0))),
        }
    }

    /// True pH derived from dissolved species
    pub fn ph(&self) -> PhEstimate {
        let volume = self.volume_l;
        ph_from_concentrations(
            self.species
                .iter()
                .filter(|s| matches!(s.phase, Phase::Aqueous | Phase::Liquid))
                .map(|s| (s.formula.as_str(), if volume > 0.0 { s.moles / volume } else { 0.0 })),
        )
    }

    /// Indicator colour at the current pH, if an indicator was added
    pub fn indicator_color(&self) -> Option<&'static str> {
        self.indicator.map(|i| i.color(self.ph().ph))
    }

    pub fn validate(&self) -> Result<(), ChemistryError> {
        if !(self.volume_l > 0.0) {
            return Err(ChemistryError::NonPositive {
                quantity: "vessel volume",
                value: self.volume_l,
            });
        }
        if !(self.temperature_k > 0.0) {
            return Err(ChemistryError::NonPositive {
                quantity: "vessel temperature",
                value: self.temperature_k,
            });
        }
        if let Some(s) = self.species.iter().find(|s| !(s.moles >= 0.0)) {
            return Err(ChemistryError::InvalidParameter(format!(
                "{} in {} has negative moles ({})",
                s.formula, self.id, s.moles
            )));
        }
        Ok(())
    }
}

/// Optical rail: rays and the elements they pass through
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticsBench {
    #[serde(default)]
    pub rays: Vec<OpticalRay>,
    #[serde(default)]
    pub elements: Vec<OpticalElement>,
}

/// Everything on the bench
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchState {
    #[serde(default)]
    pub vessels: Vec<Solution>,
    #[serde(default)]
    pub circuit: Option<Circuit>,
    #[serde(default)]
    pub mechanics: MechanicsBench,
    #[serde(default)]
    pub optics: OpticsBench,
}

impl BenchState {
    pub fn vessel(&self, id: &str) -> Option<&Solution> {
        self.vessels.iter().find(|v| v.id == id)
    }

    pub fn validate(&self) -> Result<(), ChemistryError> {
        self.vessels.iter().try_for_each(Solution::validate)
    }

    /// True if any vessel holds a negative amount
    pub fn has_negative_moles(&self) -> bool {
        self.vessels
            .iter()
            .flat_map(|v| &v.species)
            .any(|s| !(s.moles >= 0.0))
    }
}
