//! Reaction kinetics
//!
//! Closed forms only: concentration at time `t` for orders 0, 1 and 2 is
//! evaluated directly rather than stepped.
//!
//! | order | `[A](t)` | `t½` |
//! |---|---|---|
//! | 0 | `max([A]₀ − kt, 0)` | `[A]₀ / 2k` |
//! | 1 | `[A]₀·e^(−kt)` | `ln 2 / k` |
//! | 2 | `[A]₀ / (1 + k[A]₀t)` | `1 / k[A]₀` |

use super::{require_positive, ChemistryError};
use serde::{Deserialize, Serialize};

/// Molar gas constant (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.314;

/// Temperature at which reaction rate constants are quoted (K)
pub const REFERENCE_TEMPERATURE: f64 = 298.15;

fn check_order(order: u8) -> Result<u8, ChemistryError> {
    if order <= 2 {
        Ok(order)
    } else {
        Err(ChemistryError::UnsupportedOrder(order))
    }
}

/// `k = A·exp(−Ea / RT)`
pub fn arrhenius_rate_constant(
    pre_exponential: f64,
    activation_energy: f64,
    temperature: f64,
) -> Result<f64, ChemistryError> {
    let t = require_positive("temperature", temperature)?;
    Ok(pre_exponential * (-activation_energy / (GAS_CONSTANT * t)).exp())
}

/// Half-life for the given order
///
/// # Example
///
/// ```
/// use virtual_lab_core_rs::chemistry::kinetics::half_life;
///
/// let t = half_life(0.1, 2.0, 1).unwrap();
/// assert!((t - std::f64::consts::LN_2 / 0.1).abs() < 1e-12);
/// ```
pub fn half_life(rate_constant: f64, initial_concentration: f64, order: u8) -> Result<f64, ChemistryError> {
    let k = require_positive("rate constant", rate_constant)?;
    match check_order(order)? {
        0 => Ok(require_positive("initial concentration", initial_concentration)? / (2.0 * k)),
        1 => Ok(std::f64::consts::LN_2 / k),
        _ => Ok(1.0 / (k * require_positive("initial concentration", initial_concentration)?)),
    }
}

/// Concentration after `time` seconds for the given order
pub fn concentration_at_time(
    initial_concentration: f64,
    rate_constant: f64,
    time: f64,
    order: u8,
) -> Result<f64, ChemistryError> {
    if !(initial_concentration >= 0.0) || !(rate_constant >= 0.0) || !(time >= 0.0) {
        return Err(ChemistryError::InvalidParameter(
            "concentration, rate constant and time must be non-negative".to_string(),
        ));
    }
    let (c0, k, t) = (initial_concentration, rate_constant, time);
    Ok(match check_order(order)? {
        0 => (c0 - k * t).max(0.0),
        1 => c0 * (-k * t).exp(),
        _ => c0 / (1.0 + k * c0 * t),
    })
}

/// Rescale a rate constant from `t1` to `t2`
///
/// `k2 = k1·exp((Ea/R)(1/T1 − 1/T2))`
pub fn rate_at_temperature(k1: f64, activation_energy: f64, t1: f64, t2: f64) -> Result<f64, ChemistryError> {
    let t1 = require_positive("initial temperature", t1)?;
    let t2 = require_positive("final temperature", t2)?;
    Ok(k1 * (activation_energy / GAS_CONSTANT * (1.0 / t1 - 1.0 / t2)).exp())
}

/// Least-squares fit of `ln k = ln A − (Ea/R)·(1/T)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusFit {
    /// J/mol
    pub activation_energy: f64,
    pub pre_exponential: f64,
    pub r_squared: f64,
}

/// Estimate Ea and A from `(temperature K, rate constant)` pairs
pub fn estimate_activation_energy(data: &[(f64, f64)]) -> Result<ArrheniusFit, ChemistryError> {
    if data.len() < 2 {
        return Err(ChemistryError::InvalidParameter(
            "at least two (T, k) points are needed".to_string(),
        ));
    }

    let mut points = Vec::with_capacity(data.len());
    for &(t, k) in data {
        let t = require_positive("temperature", t)?;
        let k = require_positive("rate constant", k)?;
        points.push((1.0 / t, k.ln()));
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let syy: f64 = points.iter().map(|p| (p.1 - mean_y).powi(2)).sum();

    if sxx == 0.0 {
        return Err(ChemistryError::InvalidParameter(
            "temperatures must not all be equal".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 { 1.0 } else { sxy * sxy / (sxx * syy) };

    Ok(ArrheniusFit {
        activation_energy: -slope * GAS_CONSTANT,
        pre_exponential: intercept.exp(),
        r_squared,
    })
}

/// Activation energy lowered by a catalyst, `Ea·(1 − reduction%/100)`
pub fn catalyzed_activation_energy(activation_energy: f64, reduction_percent: f64) -> Result<f64, ChemistryError> {
    if !(0.0..=100.0).contains(&reduction_percent) {
        return Err(ChemistryError::InvalidParameter(format!(
            "catalyst reduction must be within 0-100%, got {reduction_percent}"
        )));
    }
    Ok(activation_energy * (1.0 - reduction_percent / 100.0))
}

/// Rate law exponents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLaw {
    /// Same exponent for every reactant
    Global(f64),
    /// One exponent per reactant, in order
    PerSpecies(Vec<f64>),
}

impl RateLaw {
    /// `k·Π[c_i]^order_i`
    pub fn rate(&self, rate_constant: f64, concentrations: &[f64]) -> Result<f64, ChemistryError> {
        if concentrations.iter().any(|c| !(*c >= 0.0)) {
            return Err(ChemistryError::InvalidParameter(
                "concentrations must be non-negative".to_string(),
            ));
        }
        let product = match self {
            RateLaw::Global(order) => concentrations.iter().map(|c| c.powf(*order)).product::<f64>(),
            RateLaw::PerSpecies(orders) => {
                if orders.len() != concentrations.len() {
                    return Err(ChemistryError::InvalidParameter(format!(
                        "{} orders given for {} concentrations",
                        orders.len(),
                        concentrations.len()
                    )));
                }
                concentrations
                    .iter()
                    .zip(orders)
                    .map(|(c, o)| c.powf(*o))
                    .product::<f64>()
            }
        };
        Ok(rate_constant * product)
    }
}

pub fn rate_law(rate_constant: f64, concentrations: &[f64], law: &RateLaw) -> Result<f64, ChemistryError> {
    law.rate(rate_constant, concentrations)
}

// ============================================================================
// Reaction
// ============================================================================

/// One side entry of a balanced equation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoichTerm {
    pub formula: String,
    pub coefficient: u32,
}

impl StoichTerm {
    pub fn new(formula: impl Into<String>, coefficient: u32) -> Self {
        Self {
            formula: formula.into(),
            coefficient,
        }
    }
}

/// A validated reaction
///
/// Coefficients are positive integers and the order has a closed form.
/// Deserialization runs the same checks as [`Reaction::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReaction")]
pub struct Reaction {
    pub equation: String,
    pub reactants: Vec<StoichTerm>,
    pub products: Vec<StoichTerm>,
    /// Rate constant at [`REFERENCE_TEMPERATURE`]
    pub rate_constant: f64,
    /// J/mol
    pub activation_energy: f64,
    pub order: u8,
    pub equilibrium_constant: Option<f64>,
}

#[derive(Deserialize)]
struct RawReaction {
    equation: String,
    reactants: Vec<StoichTerm>,
    products: Vec<StoichTerm>,
    rate_constant: f64,
    #[serde(default)]
    activation_energy: f64,
    order: u8,
    #[serde(default)]
    equilibrium_constant: Option<f64>,
}

impl TryFrom<RawReaction> for Reaction {
    type Error = ChemistryError;

    fn try_from(raw: RawReaction) -> Result<Self, Self::Error> {
        Reaction::new(
            raw.equation,
            raw.reactants,
            raw.products,
            raw.rate_constant,
            raw.activation_energy,
            raw.order,
        )
        .map(|r| r.with_equilibrium_constant(raw.equilibrium_constant))
    }
}

impl Reaction {
    pub fn new(
        equation: impl Into<String>,
        reactants: Vec<StoichTerm>,
        products: Vec<StoichTerm>,
        rate_constant: f64,
        activation_energy: f64,
        order: u8,
    ) -> Result<Self, ChemistryError> {
        let equation = equation.into();
        let invalid = |reason: &str| ChemistryError::InvalidReaction {
            equation: equation.clone(),
            reason: reason.to_string(),
        };

        if reactants.is_empty() {
            return Err(invalid("no reactants"));
        }
        if reactants.iter().chain(&products).any(|t| t.coefficient == 0) {
            return Err(invalid("stoichiometric coefficients must be positive integers"));
        }
        if !(rate_constant >= 0.0) {
            return Err(invalid("rate constant must be non-negative"));
        }
        check_order(order)?;

        Ok(Self {
            equation,
            reactants,
            products,
            rate_constant,
            activation_energy,
            order,
            equilibrium_constant: None,
        })
    }

    pub fn with_equilibrium_constant(mut self, k_eq: Option<f64>) -> Self {
        self.equilibrium_constant = k_eq;
        self
    }

    /// Rate constant at `temperature`, Arrhenius-scaled from the reference
    pub fn rate_constant_at(&self, temperature: f64) -> Result<f64, ChemistryError> {
        rate_at_temperature(
            self.rate_constant,
            self.activation_energy,
            REFERENCE_TEMPERATURE,
            temperature,
        )
    }
}
