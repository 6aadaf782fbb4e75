//! Physics engine
//!
//! - **circuits**: DC nodal analysis, lamps, capacitors, circuit validation
//! - **mechanics**: 2D force integration, contacts, closed-form motion series
//! - **optics**: planar ray tracing, thin-lens imaging, interference
//!
//! Calculators are plain functions; the `*Engine` types hold the session
//! generator and add instrument noise to anything a student would read off
//! an instrument.

pub mod circuits;
pub mod linalg;
pub mod mechanics;
pub mod optics;
pub mod vector;

use thiserror::Error;

pub use circuits::{Circuit, CircuitAnalysis, CircuitElement, CircuitEngine, CircuitNode, ElementKind};
pub use mechanics::{ForceGenerator, MechanicalObject, MechanicsBench, MechanicsEngine};
pub use optics::{OpticalElement, OpticalKind, OpticalRay, OpticsEngine, RayTraceResult};
pub use vector::Vec2;

/// Errors raised by physics calculations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PhysicsError {
    #[error("Element {element} references unknown node: {node}")]
    UnknownNode { element: String, node: String },

    #[error("Circuit has no ground node: {0}")]
    MissingGround(String),

    #[error("Invalid element {element}: {reason}")]
    InvalidElement { element: String, reason: String },

    #[error("Singular system: no usable pivot in column {column}")]
    SingularMatrix { column: usize },

    #[error("Dimension mismatch: matrix is {rows}x{cols}, vector has {len} entries")]
    DimensionMismatch { rows: usize, cols: usize, len: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
