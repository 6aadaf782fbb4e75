//! Solubility equilibria
//!
//! A fixed table of sparingly soluble salts at 25 °C. Ion concentrations are
//! always given in the table's ion order (cation first).

use super::{require_positive, ChemistryError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaltType {
    /// MX, `s = √Ksp`
    OneToOne,
    /// MX₂, `s = ∛(Ksp/4)`
    OneToTwo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolubilityRecord {
    pub compound: &'static str,
    pub ksp: f64,
    /// `(ion, stoichiometric count)`
    pub ions: &'static [(&'static str, u32)],
    pub salt_type: SaltType,
}

pub const SOLUBILITY_TABLE: [SolubilityRecord; 7] = [
    SolubilityRecord {
        compound: "AgCl",
        ksp: 1.8e-10,
        ions: &[("Ag+", 1), ("Cl-", 1)],
        salt_type: SaltType::OneToOne,
    },
    SolubilityRecord {
        compound: "AgBr",
        ksp: 5.0e-13,
        ions: &[("Ag+", 1), ("Br-", 1)],
        salt_type: SaltType::OneToOne,
    },
    SolubilityRecord {
        compound: "BaSO4",
        ksp: 1.1e-10,
        ions: &[("Ba^2+", 1), ("SO4^2-", 1)],
        salt_type: SaltType::OneToOne,
    },
    SolubilityRecord {
        compound: "CaCO3",
        ksp: 3.3e-9,
        ions: &[("Ca^2+", 1), ("CO3^2-", 1)],
        salt_type: SaltType::OneToOne,
    },
    SolubilityRecord {
        compound: "PbI2",
        ksp: 9.8e-9,
        ions: &[("Pb^2+", 1), ("I-", 2)],
        salt_type: SaltType::OneToTwo,
    },
    SolubilityRecord {
        compound: "CaF2",
        ksp: 3.9e-11,
        ions: &[("Ca^2+", 1), ("F-", 2)],
        salt_type: SaltType::OneToTwo,
    },
    SolubilityRecord {
        compound: "Mg(OH)2",
        ksp: 5.6e-12,
        ions: &[("Mg^2+", 1), ("OH-", 2)],
        salt_type: SaltType::OneToTwo,
    },
];

pub fn lookup(compound: &str) -> Result<&'static SolubilityRecord, ChemistryError> {
    SOLUBILITY_TABLE
        .iter()
        .find(|r| r.compound == compound)
        .ok_or_else(|| ChemistryError::UnknownCompound(compound.to_string()))
}

/// `Q = Π[ion]^count`
pub fn ionic_product(record: &SolubilityRecord, concentrations: &[f64]) -> Result<f64, ChemistryError> {
    if concentrations.len() != record.ions.len() {
        return Err(ChemistryError::InvalidParameter(format!(
            "{} needs {} ion concentrations, got {}",
            record.compound,
            record.ions.len(),
            concentrations.len()
        )));
    }
    if concentrations.iter().any(|c| !(*c >= 0.0)) {
        return Err(ChemistryError::InvalidParameter(
            "ion concentrations must be non-negative".to_string(),
        ));
    }
    Ok(record
        .ions
        .iter()
        .zip(concentrations)
        .map(|((_, count), c)| c.powi(*count as i32))
        .product())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationCheck {
    pub compound: String,
    pub ionic_product: f64,
    pub ksp: f64,
    /// `Q / Ksp`
    pub supersaturation: f64,
    pub will_precipitate: bool,
}

/// `Q > Ksp`
///
/// # Example
///
/// ```
/// use virtual_lab_core_rs::chemistry::solubility::will_precipitate;
///
/// let check = will_precipitate("AgCl", &[1e-4, 1e-4]).unwrap();
/// assert!((check.ionic_product - 1e-8).abs() < 1e-20);
/// assert!(check.will_precipitate);
/// ```
pub fn will_precipitate(compound: &str, concentrations: &[f64]) -> Result<PrecipitationCheck, ChemistryError> {
    let record = lookup(compound)?;
    let q = ionic_product(record, concentrations)?;
    Ok(PrecipitationCheck {
        compound: record.compound.to_string(),
        ionic_product: q,
        ksp: record.ksp,
        supersaturation: q / record.ksp,
        will_precipitate: q > record.ksp,
    })
}

/// Molar solubility in pure water (mol/L)
pub fn molar_solubility(ksp: f64, salt_type: SaltType) -> Result<f64, ChemistryError> {
    let ksp = require_positive("Ksp", ksp)?;
    Ok(match salt_type {
        SaltType::OneToOne => ksp.sqrt(),
        SaltType::OneToTwo => (ksp / 4.0).cbrt(),
    })
}

/// Molar solubility of a tabulated compound
pub fn compound_solubility(compound: &str) -> Result<f64, ChemistryError> {
    let record = lookup(compound)?;
    molar_solubility(record.ksp, record.salt_type)
}

/// Solubility with a common ion already present, `Ksp / [common ion]`
pub fn common_ion_solubility(ksp: f64, common_ion_concentration: f64) -> Result<f64, ChemistryError> {
    let ksp = require_positive("Ksp", ksp)?;
    let c = require_positive("common ion concentration", common_ion_concentration)?;
    Ok(ksp / c)
}
