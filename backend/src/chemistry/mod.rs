//! Chemistry engine
//!
//! - **acid_base**: pH of strong/weak acids and bases, buffers, mixing,
//!   titration, indicators
//! - **kinetics**: Arrhenius, closed-form concentration per order, rate laws
//! - **solubility**: Ksp table, precipitation, molar and common-ion solubility
//! - **stoichiometry**: formula parsing, molar mass, limiting reagent, yields
//! - **engine**: `ChemistryEngine`, the noisy instrument view and per-tick
//!   vessel update

pub mod acid_base;
pub mod engine;
pub mod kinetics;
pub mod solubility;
pub mod stoichiometry;

use thiserror::Error;

pub use acid_base::{Indicator, PhEstimate, PhRegime, TitrationPoint, TitrationSetup};
pub use engine::{ChemistryEngine, CrystalFormation, VesselReading};
pub use kinetics::{ArrheniusFit, RateLaw, Reaction, StoichTerm};
pub use solubility::{PrecipitationCheck, SaltType, SolubilityRecord};
pub use stoichiometry::{LimitingReagent, MolarMass, ReagentAmount, YieldResult};

/// Errors raised by chemistry calculations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChemistryError {
    #[error("{quantity} must be positive, got {value}")]
    NonPositive { quantity: &'static str, value: f64 },

    #[error("Unsupported reaction order: {0} (closed forms exist for 0, 1 and 2)")]
    UnsupportedOrder(u8),

    #[error("Unknown compound: {0}")]
    UnknownCompound(String),

    #[error("Invalid reaction {equation}: {reason}")]
    InvalidReaction { equation: String, reason: String },

    #[error("Invalid formula {formula}: {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Reject zero, negative and NaN inputs
pub(crate) fn require_positive(quantity: &'static str, value: f64) -> Result<f64, ChemistryError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ChemistryError::NonPositive { quantity, value })
    }
}
