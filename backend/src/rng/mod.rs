//! Deterministic random number generation
//!
//! Uses a 32-bit mixing generator for fast, bit-exact reproducible draws.
//! CRITICAL: All measurement noise in the lab MUST go through this module.

mod mixer;

use std::cell::RefCell;
use std::rc::Rc;

pub use mixer::RngManager;

/// Session generator shared by the clock and every engine it constructs.
///
/// The engine is single-threaded; draws are ordered by call sequence.
pub type SharedRng = Rc<RefCell<RngManager>>;

/// Wrap a fresh generator for sharing between engines.
pub fn shared(seed: u32) -> SharedRng {
    Rc::new(RefCell::new(RngManager::new(seed)))
}
