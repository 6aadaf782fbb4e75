//! Acid-base equilibrium
//!
//! All concentrations are mol/L at 25 °C (`Kw = 1e-14`).

use super::{require_positive, ChemistryError};
use serde::{Deserialize, Serialize};

/// Ion product of water
pub const KW: f64 = 1e-14;

/// Excess moles below this count as an exact equivalence point
pub const EQUIVALENCE_TOLERANCE: f64 = 1e-10;

/// pH of a fully dissociated monoprotic acid
///
/// # Example
///
/// ```
/// use virtual_lab_core_rs::chemistry::acid_base::calculate_strong_acid_ph;
///
/// let ph = calculate_strong_acid_ph(0.1).unwrap();
/// assert!((ph - 1.0).abs() < 1e-9);
/// ```
pub fn calculate_strong_acid_ph(concentration: f64) -> Result<f64, ChemistryError> {
    let c = require_positive("acid concentration", concentration)?;
    Ok(-c.log10())
}

/// pH of a fully dissociated monobasic base
pub fn calculate_strong_base_ph(concentration: f64) -> Result<f64, ChemistryError> {
    let c = require_positive("base concentration", concentration)?;
    Ok(14.0 + c.log10())
}

/// `[H+] = sqrt(Ka·C)`
pub fn calculate_weak_acid_ph(ka: f64, concentration: f64) -> Result<f64, ChemistryError> {
    let ka = require_positive("Ka", ka)?;
    let c = require_positive("acid concentration", concentration)?;
    Ok(-(ka * c).sqrt().log10())
}

/// `[OH-] = sqrt(Kb·C)`
pub fn calculate_weak_base_ph(kb: f64, concentration: f64) -> Result<f64, ChemistryError> {
    let kb = require_positive("Kb", kb)?;
    let c = require_positive("base concentration", concentration)?;
    Ok(14.0 + (kb * c).sqrt().log10())
}

/// Henderson-Hasselbalch: `pH = pKa + log10([A-]/[HA])`
pub fn calculate_buffer_ph(ka: f64, base_concentration: f64, acid_concentration: f64) -> Result<f64, ChemistryError> {
    let ka = require_positive("Ka", ka)?;
    let base = require_positive("conjugate base concentration", base_concentration)?;
    let acid = require_positive("acid concentration", acid_concentration)?;
    Ok(-ka.log10() + (base / acid).log10())
}

fn ph_from_net_hydronium(net_h_moles: f64, volume_l: f64) -> f64 {
    if net_h_moles.abs() < EQUIVALENCE_TOLERANCE {
        7.0
    } else if net_h_moles > 0.0 {
        -(net_h_moles / volume_l).log10()
    } else {
        14.0 + (-net_h_moles / volume_l).log10()
    }
}

// ============================================================================
// Mixing and titration
// ============================================================================

/// An aqueous portion characterised by its pH
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AqueousSample {
    pub volume_l: f64,
    pub ph: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixResult {
    pub volume_l: f64,
    pub ph: f64,
}

/// Mix portions by neutralising their total H+ against their total OH-
pub fn mix_solutions(samples: &[AqueousSample]) -> Result<MixResult, ChemistryError> {
    let mut volume = 0.0;
    let mut h_moles = 0.0;
    let mut oh_moles = 0.0;
    for sample in samples {
        let v = require_positive("sample volume", sample.volume_l)?;
        volume += v;
        h_moles += 10f64.powf(-sample.ph) * v;
        oh_moles += 10f64.powf(sample.ph - 14.0) * v;
    }
    let volume = require_positive("mixed volume", volume)?;

    Ok(MixResult {
        volume_l: volume,
        ph: ph_from_net_hydronium(h_moles - oh_moles, volume),
    })
}

/// Which side of the titration sits in the flask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyte {
    StrongAcid,
    StrongBase,
}

/// A strong acid/strong base titration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TitrationSetup {
    pub analyte: Analyte,
    pub analyte_concentration: f64,
    pub analyte_volume_l: f64,
    pub titrant_concentration: f64,
}

impl TitrationSetup {
    pub fn equivalence_volume(&self) -> f64 {
        self.analyte_concentration * self.analyte_volume_l / self.titrant_concentration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TitrationPoint {
    pub added_volume_l: f64,
    pub ph: f64,
    /// Positive for excess acid, negative for excess base
    pub excess_moles: f64,
    pub at_equivalence: bool,
}

/// pH after adding `added_volume_l` of titrant
///
/// Salt hydrolysis is ignored, so the equivalence point is pH 7.
pub fn simulate_titration(setup: &TitrationSetup, added_volume_l: f64) -> Result<TitrationPoint, ChemistryError> {
    require_positive("analyte concentration", setup.analyte_concentration)?;
    require_positive("analyte volume", setup.analyte_volume_l)?;
    require_positive("titrant concentration", setup.titrant_concentration)?;
    if !(added_volume_l >= 0.0) {
        return Err(ChemistryError::InvalidParameter(format!(
            "added volume must be non-negative, got {added_volume_l}"
        )));
    }

    let analyte_moles = setup.analyte_concentration * setup.analyte_volume_l;
    let titrant_moles = setup.titrant_concentration * added_volume_l;
    let excess_moles = match setup.analyte {
        Analyte::StrongAcid => analyte_moles - titrant_moles,
        Analyte::StrongBase => titrant_moles - analyte_moles,
    };
    let at_equivalence = excess_moles.abs() < EQUIVALENCE_TOLERANCE;

    Ok(TitrationPoint {
        added_volume_l,
        ph: ph_from_net_hydronium(excess_moles, setup.analyte_volume_l + added_volume_l),
        excess_moles,
        at_equivalence,
    })
}

/// Sample the titration at each added volume, in order
pub fn titration_curve(setup: &TitrationSetup, added_volumes_l: &[f64]) -> Result<Vec<TitrationPoint>, ChemistryError> {
    added_volumes_l
        .iter()
        .map(|&v| simulate_titration(setup, v))
        .collect()
}

// ============================================================================
// Indicators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Indicator {
    Phenolphthalein,
    BromothymolBlue,
    MethylOrange,
}

impl Indicator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "phenolphthalein" => Some(Indicator::Phenolphthalein),
            "bromothymol-blue" => Some(Indicator::BromothymolBlue),
            "methyl-orange" => Some(Indicator::MethylOrange),
            _ => None,
        }
    }

    /// Colour shown at the given pH
    pub fn color(self, ph: f64) -> &'static str {
        match self {
            Indicator::Phenolphthalein if ph < 8.3 => "colorless",
            Indicator::Phenolphthalein if ph <= 10.0 => "light pink",
            Indicator::Phenolphthalein => "deep pink",
            Indicator::BromothymolBlue if ph < 6.0 => "yellow",
            Indicator::BromothymolBlue if ph <= 7.6 => "green",
            Indicator::BromothymolBlue => "blue",
            Indicator::MethylOrange if ph < 3.1 => "red",
            Indicator::MethylOrange if ph <= 4.4 => "orange",
            Indicator::MethylOrange => "yellow",
        }
    }
}

pub fn indicator_color(indicator: Indicator, ph: f64) -> &'static str {
    indicator.color(ph)
}

// ============================================================================
// Species profiles and solution pH
// ============================================================================

/// Acid-base behaviour of a known species
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcidBaseProfile {
    StrongAcid,
    StrongBase,
    WeakAcid { ka: f64 },
    WeakBase { kb: f64 },
    /// Conjugate base of a weak acid with the given Ka
    ConjugateBase { ka: f64 },
    /// Conjugate acid of a weak base with the given Kb
    ConjugateAcid { kb: f64 },
}

const ACETIC_KA: f64 = 1.8e-5;
const HYDROFLUORIC_KA: f64 = 6.8e-4;
const HYDROCYANIC_KA: f64 = 6.2e-10;
const FORMIC_KA: f64 = 1.8e-4;
const NITROUS_KA: f64 = 4.5e-4;
const AMMONIA_KB: f64 = 1.8e-5;

/// Look up a species by formula
pub fn profile(formula: &str) -> Option<AcidBaseProfile> {
    use AcidBaseProfile::*;
    let p = match formula {
        "HCl" | "HBr" | "HI" | "HNO3" | "HClO4" => StrongAcid,
        "NaOH" | "KOH" | "LiOH" => StrongBase,
        "CH3COOH" => WeakAcid { ka: ACETIC_KA },
        "HF" => WeakAcid { ka: HYDROFLUORIC_KA },
        "HCN" => WeakAcid { ka: HYDROCYANIC_KA },
        "HCOOH" => WeakAcid { ka: FORMIC_KA },
        "HNO2" => WeakAcid { ka: NITROUS_KA },
        "NH3" => WeakBase { kb: AMMONIA_KB },
        "CH3COO-" => ConjugateBase { ka: ACETIC_KA },
        "F-" => ConjugateBase { ka: HYDROFLUORIC_KA },
        "CN-" => ConjugateBase { ka: HYDROCYANIC_KA },
        "HCOO-" => ConjugateBase { ka: FORMIC_KA },
        "NO2-" => ConjugateBase { ka: NITROUS_KA },
        "NH4+" => ConjugateAcid { kb: AMMONIA_KB },
        _ => return None,
    };
    Some(p)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhRegime {
    StrongExcess,
    Buffer,
    Weak,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhEstimate {
    pub ph: f64,
    pub regime: PhRegime,
}

/// Derive pH from species concentrations (mol/L)
///
/// Precedence: net strong acid/base excess, then the first weak pair present
/// as a buffer (its own Ka), then the summed weak contributions, else 7.
/// Unknown species do not affect pH.
pub fn ph_from_concentrations<'a, I>(concentrations: I) -> PhEstimate
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut strong = 0.0;
    let mut ka_c = 0.0;
    let mut kb_c = 0.0;
    let mut weak: Vec<(AcidBaseProfile, f64)> = Vec::new();

    for (formula, c) in concentrations {
        if c <= 0.0 {
            continue;
        }
        let Some(p) = profile(formula) else { continue };
        match p {
            AcidBaseProfile::StrongAcid => strong += c,
            AcidBaseProfile::StrongBase => strong -= c,
            AcidBaseProfile::WeakAcid { ka } => ka_c += ka * c,
            AcidBaseProfile::WeakBase { kb } => kb_c += kb * c,
            AcidBaseProfile::ConjugateBase { ka } => kb_c += KW / ka * c,
            AcidBaseProfile::ConjugateAcid { kb } => ka_c += KW / kb * c,
        }
        weak.push((p, c));
    }

    if strong.abs() > EQUIVALENCE_TOLERANCE {
        return PhEstimate {
            ph: ph_from_net_hydronium(strong, 1.0),
            regime: PhRegime::StrongExcess,
        };
    }

    if let Some(ph) = buffer_ph(&weak) {
        return PhEstimate {
            ph,
            regime: PhRegime::Buffer,
        };
    }

    let h = ka_c.sqrt();
    let oh = kb_c.sqrt();
    let ph = if h > oh {
        -h.log10()
    } else if oh > h {
        14.0 + oh.log10()
    } else {
        return PhEstimate {
            ph: 7.0,
            regime: PhRegime::Neutral,
        };
    };
    PhEstimate {
        ph,
        regime: PhRegime::Weak,
    }
}

fn buffer_ph(weak: &[(AcidBaseProfile, f64)]) -> Option<f64> {
    for &(p, c) in weak {
        let partner = weak.iter().find(|(q, _)| match (p, q) {
            (AcidBaseProfile::WeakAcid { ka }, AcidBaseProfile::ConjugateBase { ka: k2 }) => ka == *k2,
            (AcidBaseProfile::WeakBase { kb }, AcidBaseProfile::ConjugateAcid { kb: k2 }) => kb == *k2,
            _ => false,
        });
        let Some(&(_, partner_c)) = partner else { continue };
        match p {
            AcidBaseProfile::WeakAcid { ka } => {
                return Some(-ka.log10() + (partner_c / c).log10());
            }
            AcidBaseProfile::WeakBase { kb } => {
                let poh = -kb.log10() + (partner_c / c).log10();
                return Some(14.0 - poh);
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_base_ph() {
        assert!((calculate_strong_base_ph(0.1).unwrap() - 13.0).abs() < 1e-9);
        assert!(calculate_strong_base_ph(0.0).is_err());
    }

    #[test]
    fn test_weak_acid_ph() {
        let ph = calculate_weak_acid_ph(1.8e-5, 0.1).unwrap();
        assert!((ph - 2.872).abs() < 0.001);
    }

    #[test]
    fn test_buffer_equal_parts_is_pka() {
        let ph = calculate_buffer_ph(1.8e-5, 0.1, 0.1).unwrap();
        assert!((ph - 4.7447).abs() < 1e-3);
    }

    #[test]
    fn test_mix_equal_acid_and_base_is_neutral() {
        let mixed = mix_solutions(&[
            AqueousSample { volume_l: 0.05, ph: 1.0 },
            AqueousSample { volume_l: 0.05, ph: 13.0 },
        ])
        .unwrap();
        assert_eq!(mixed.ph, 7.0);
        assert!((mixed.volume_l - 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_indicator_thresholds() {
        assert_eq!(Indicator::Phenolphthalein.color(7.0), "colorless");
        assert_eq!(Indicator::Phenolphthalein.color(9.0), "light pink");
        assert_eq!(Indicator::Phenolphthalein.color(11.0), "deep pink");
        assert_eq!(Indicator::BromothymolBlue.color(7.0), "green");
        assert_eq!(Indicator::MethylOrange.color(2.0), "red");
        assert_eq!(Indicator::from_name("Bromothymol Blue"), Some(Indicator::BromothymolBlue));
    }

    #[test]
    fn test_acetate_buffer_uses_acetic_ka() {
        let est = ph_from_concentrations([("CH3COOH", 0.1), ("CH3COO-", 0.1)]);
        assert_eq!(est.regime, PhRegime::Buffer);
        assert!((est.ph - 4.7447).abs() < 1e-3);
    }

    #[test]
    fn test_strong_excess_wins_over_buffer() {
        let est = ph_from_concentrations([("HCl", 0.01), ("CH3COOH", 0.1), ("CH3COO-", 0.1)]);
        assert_eq!(est.regime, PhRegime::StrongExcess);
        assert!((est.ph - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_pure_water_neutral() {
        let est = ph_from_concentrations([("H2O", 55.5), ("NaCl", 0.1)]);
        assert_eq!(est.regime, PhRegime::Neutral);
        assert_eq!(est.ph, 7.0);
    }
}
