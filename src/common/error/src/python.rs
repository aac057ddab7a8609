//! Python bindings for Quarry errors.

use pyo3::exceptions::{PyIOError, PyKeyError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;

use crate::QuarryError;

impl From<QuarryError> for PyErr {
    fn from(err: QuarryError) -> Self {
        let msg = format!("QUARRY ERROR {}: \"{}\"", err.code(), err);
        match err {
            QuarryError::PyO3Error(inner) => inner,
            QuarryError::ExpectedScalar
            | QuarryError::ExpectedDataHandle
            | QuarryError::ExpectedDataHandleGotArray
            | QuarryError::WrongDataItemSelector(_) => PyTypeError::new_err(msg),
            QuarryError::UnknownOption(_) | QuarryError::RecordFieldNotAvailable(_) => {
                PyKeyError::new_err(msg)
            }
            QuarryError::WrongNumDimsArray
            | QuarryError::WrongDataItemSelectorInteger
            | QuarryError::ArrayNumDimsMismatch
            | QuarryError::MultipleVariableIndices
            | QuarryError::ProdIdNonPositive
            | QuarryError::ProdIdNoGood => PyValueError::new_err(msg),
            QuarryError::IoError(_) => PyIOError::new_err(msg),
            _ => PyRuntimeError::new_err(msg),
        }
    }
}
