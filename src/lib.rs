//! Quarry - path resolution and dynamic materialization of self-describing
//! binary products.
//!
//! Products are opened into a registry, addressed by handle, and navigated
//! with selector chains (`fetch(pf, "records", -1, "x")`). The addressed data
//! is turned into host values: scalars, arrays in host dimension order,
//! structures built from record definitions, or data handles for positions
//! the host wants to come back to.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_error as error;
pub use quarry_core as core;
pub use quarry_engine as engine;
pub use quarry_storage as storage;

pub use quarry_engine::Engine;

/// Quarry version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "python")]
mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module for Quarry
///
/// The module is named `_quarry` so that a Python wrapper package can
/// re-export it with additional conveniences.
#[cfg(feature = "python")]
#[pymodule]
fn _quarry(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", VERSION)?;

    python::register_module(m)?;

    Ok(())
}
