//! Stoichiometry
//!
//! Formula parsing, molar mass, limiting reagent and yields.

use super::{require_positive, ChemistryError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standard atomic weights (g/mol)
const ATOMIC_MASSES: &[(&str, f64)] = &[
    ("H", 1.008),
    ("He", 4.0026),
    ("Li", 6.94),
    ("Be", 9.0122),
    ("B", 10.81),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("F", 18.998),
    ("Ne", 20.180),
    ("Na", 22.990),
    ("Mg", 24.305),
    ("Al", 26.982),
    ("Si", 28.085),
    ("P", 30.974),
    ("S", 32.06),
    ("Cl", 35.45),
    ("Ar", 39.948),
    ("K", 39.098),
    ("Ca", 40.078),
    ("Cr", 51.996),
    ("Mn", 54.938),
    ("Fe", 55.845),
    ("Co", 58.933),
    ("Ni", 58.693),
    ("Cu", 63.546),
    ("Zn", 65.38),
    ("Br", 79.904),
    ("Ag", 107.87),
    ("Sn", 118.71),
    ("I", 126.90),
    ("Ba", 137.33),
    ("Pt", 195.08),
    ("Au", 196.97),
    ("Hg", 200.59),
    ("Pb", 207.2),
];

pub fn atomic_mass(symbol: &str) -> Option<f64> {
    ATOMIC_MASSES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, m)| *m)
}

// ============================================================================
// Formula parsing
// ============================================================================

/// Deepest parenthesis nesting accepted in a formula
const MAX_GROUP_DEPTH: usize = 8;

struct FormulaParser<'a> {
    formula: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(formula: &'a str) -> Self {
        Self {
            formula,
            chars: formula.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ChemistryError {
        ChemistryError::InvalidFormula {
            formula: self.formula.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn count(&mut self) -> Result<u32, ChemistryError> {
        let mut n: u32 = 0;
        let mut any = false;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            n = n
                .checked_mul(10)
                .and_then(|n| n.checked_add(d))
                .ok_or_else(|| self.error("count too large"))?;
            any = true;
            self.pos += 1;
        }
        Ok(if any { n } else { 1 })
    }

    fn add(
        &self,
        counts: &mut BTreeMap<String, u32>,
        symbol: String,
        n: u32,
    ) -> Result<(), ChemistryError> {
        let total = counts.entry(symbol).or_insert(0);
        *total = total.checked_add(n).ok_or_else(|| self.error("atom count too large"))?;
        Ok(())
    }

    /// Charge suffix: `+`, `-`, or `^` before a multi-unit charge
    fn at_charge(&self) -> bool {
        matches!(self.peek(), Some('+') | Some('-') | Some('^'))
    }

    fn group(&mut self, depth: usize) -> Result<BTreeMap<String, u32>, ChemistryError> {
        let mut counts = BTreeMap::new();
        loop {
            match self.peek() {
                None => {
                    if depth > 0 {
                        return Err(self.error("unclosed parenthesis"));
                    }
                    return Ok(counts);
                }
                Some(')') => {
                    if depth == 0 {
                        return Err(self.error("unmatched ')'"));
                    }
                    self.pos += 1;
                    return Ok(counts);
                }
                Some('(') => {
                    if depth >= MAX_GROUP_DEPTH {
                        return Err(self.error("groups nested too deeply"));
                    }
                    self.pos += 1;
                    let inner = self.group(depth + 1)?;
                    let n = self.count()?;
                    for (symbol, k) in inner {
                        let atoms = k.checked_mul(n).ok_or_else(|| self.error("atom count too large"))?;
                        self.add(&mut counts, symbol, atoms)?;
                    }
                }
                Some(c) if c.is_ascii_uppercase() => {
                    self.pos += 1;
                    let mut symbol = c.to_string();
                    while let Some(l) = self.peek().filter(|l| l.is_ascii_lowercase()) {
                        symbol.push(l);
                        self.pos += 1;
                    }
                    let n = self.count()?;
                    self.add(&mut counts, symbol, n)?;
                }
                Some(_) if depth == 0 && self.at_charge() => {
                    self.pos = self.chars.len();
                }
                Some(c) => return Err(self.error(format!("unexpected character '{c}'"))),
            }
        }
    }
}

/// Count atoms per element symbol
///
/// Parenthesised groups take a multiplier; a trailing charge is ignored.
/// Digits always count atoms, so multi-unit charges are written `^2+`.
///
/// # Example
///
/// ```
/// use virtual_lab_core_rs::chemistry::stoichiometry::element_counts;
///
/// let counts = element_counts("Ca(OH)2").unwrap();
/// assert_eq!(counts["O"], 2);
/// assert_eq!(counts["H"], 2);
/// assert_eq!(element_counts("SO4^2-").unwrap()["O"], 4);
/// ```
pub fn element_counts(formula: &str) -> Result<BTreeMap<String, u32>, ChemistryError> {
    let trimmed = formula.trim();
    if trimmed.is_empty() {
        return Err(ChemistryError::InvalidFormula {
            formula: formula.to_string(),
            reason: "empty formula".to_string(),
        });
    }
    FormulaParser::new(trimmed).group(0)
}

/// Molar mass together with any symbols missing from the atomic table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolarMass {
    pub grams_per_mole: f64,
    /// Unknown symbols contribute zero mass
    pub unknown_elements: Vec<String>,
}

impl MolarMass {
    pub fn is_complete(&self) -> bool {
        self.unknown_elements.is_empty()
    }
}

pub fn molar_mass(formula: &str) -> Result<MolarMass, ChemistryError> {
    let mut grams_per_mole = 0.0;
    let mut unknown_elements = Vec::new();
    for (symbol, count) in element_counts(formula)? {
        match atomic_mass(&symbol) {
            Some(m) => grams_per_mole += m * count as f64,
            None => unknown_elements.push(symbol),
        }
    }
    if !unknown_elements.is_empty() {
        tracing::warn!(
            formula,
            unknown = ?unknown_elements,
            "Unknown elements contribute zero mass"
        );
    }
    Ok(MolarMass {
        grams_per_mole,
        unknown_elements,
    })
}

pub fn mass_to_moles(mass_g: f64, molar_mass: f64) -> Result<f64, ChemistryError> {
    let m = require_positive("molar mass", molar_mass)?;
    Ok(mass_g / m)
}

pub fn moles_to_mass(moles: f64, molar_mass: f64) -> Result<f64, ChemistryError> {
    let m = require_positive("molar mass", molar_mass)?;
    Ok(moles * m)
}

/// `C2 = C1·V1 / V2`
pub fn dilute(c1: f64, v1: f64, v2: f64) -> Result<f64, ChemistryError> {
    let v2 = require_positive("final volume", v2)?;
    Ok(c1 * v1 / v2)
}

/// `V2 = C1·V1 / C2`
pub fn dilution_volume(c1: f64, v1: f64, c2: f64) -> Result<f64, ChemistryError> {
    let c2 = require_positive("target concentration", c2)?;
    Ok(c1 * v1 / c2)
}

pub fn density(total_mass: f64, volume: f64) -> Result<f64, ChemistryError> {
    let v = require_positive("volume", volume)?;
    Ok(total_mass / v)
}

// ============================================================================
// Limiting reagent and yield
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReagentAmount {
    pub formula: String,
    pub available_moles: f64,
    pub coefficient: u32,
}

impl ReagentAmount {
    pub fn new(formula: impl Into<String>, available_moles: f64, coefficient: u32) -> Self {
        Self {
            formula: formula.into(),
            available_moles,
            coefficient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitingReagent {
    pub formula: String,
    /// `available / coefficient`, the reaction extent it allows
    pub ratio: f64,
}

/// Reactant with the smallest `available / coefficient`; ties keep the first
pub fn limiting_reagent(reagents: &[ReagentAmount]) -> Result<LimitingReagent, ChemistryError> {
    let mut best: Option<LimitingReagent> = None;
    for r in reagents {
        if r.coefficient == 0 {
            return Err(ChemistryError::InvalidParameter(format!(
                "{} has a zero coefficient",
                r.formula
            )));
        }
        if !(r.available_moles >= 0.0) {
            return Err(ChemistryError::InvalidParameter(format!(
                "{} has negative moles",
                r.formula
            )));
        }
        let ratio = r.available_moles / r.coefficient as f64;
        if best.as_ref().map_or(true, |b| ratio < b.ratio) {
            best = Some(LimitingReagent {
                formula: r.formula.clone(),
                ratio,
            });
        }
    }
    best.ok_or_else(|| ChemistryError::InvalidParameter("no reagents given".to_string()))
}

/// Moles of product obtainable from the limiting reagent
pub fn theoretical_yield(reagents: &[ReagentAmount], product_coefficient: u32) -> Result<f64, ChemistryError> {
    let limiting = limiting_reagent(reagents)?;
    Ok(limiting.ratio * product_coefficient as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldResult {
    pub limiting: LimitingReagent,
    pub theoretical_moles: f64,
    pub actual_moles: f64,
    pub percent_yield: f64,
}

/// Theoretical and actual yield for a fixed yield factor in `[0, 1]`
pub fn yield_with_factor(
    reagents: &[ReagentAmount],
    product_coefficient: u32,
    factor: f64,
) -> Result<YieldResult, ChemistryError> {
    if !(0.0..=1.0).contains(&factor) {
        return Err(ChemistryError::InvalidParameter(format!(
            "yield factor must be within [0, 1], got {factor}"
        )));
    }
    let limiting = limiting_reagent(reagents)?;
    let theoretical_moles = limiting.ratio * product_coefficient as f64;
    Ok(YieldResult {
        limiting,
        theoretical_moles,
        actual_moles: theoretical_moles * factor,
        percent_yield: factor * 100.0,
    })
}
