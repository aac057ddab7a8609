//! Python bindings for Quarry.
//!
//! A `Session` owns one engine. Arguments are converted from Python objects
//! into host values, and results are converted back: arrays become nested
//! lists indexed in host dimension order, records become dicts, and data
//! handles, no-data markers and error values get small wrapper classes.

mod convert;
mod session;

use pyo3::prelude::*;

pub use convert::{PyDataHandle, PyErrorValue, PyNoData};
pub use session::PySession;

/// Register all Python bindings with the module.
pub fn register_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySession>()?;
    m.add_class::<PyDataHandle>()?;
    m.add_class::<PyNoData>()?;
    m.add_class::<PyErrorValue>()?;

    m.add("NOT_AVAILABLE", quarry_engine::NOT_AVAILABLE)?;
    m.add_function(wrap_pyfunction!(session::routines, m)?)?;

    Ok(())
}
