//! Python host binding (feature `pyo3`)
//!
//! The host passes and receives JSON strings; every type crossing the
//! boundary is already serde-serializable, so nothing is mirrored as a
//! Python class except the session itself.

pub mod session;
pub mod types;

pub use session::LabSession;
