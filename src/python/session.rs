//! Python `Session` class.

use pyo3::prelude::*;
use pyo3::types::PyTuple;

use common_config::QuarryConfig;
use quarry_engine::{Engine, ROUTINES};

use super::convert::{args_to_host, host_to_py, py_to_host};

/// An engine with its own open products and options.
///
/// Methods raise on failure; `call` returns error values instead.
#[pyclass(name = "Session")]
pub struct PySession {
    engine: Engine,
}

#[pymethods]
impl PySession {
    /// Create a session, optionally reading options from a JSON file.
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&str>) -> PyResult<Self> {
        let config = match config {
            Some(path) => QuarryConfig::from_json_file(path)?,
            None => QuarryConfig::default(),
        };
        Ok(Self {
            engine: Engine::with_config(config),
        })
    }

    // ========== Products ==========

    fn open(&mut self, path: &str) -> PyResult<u64> {
        Ok(self.engine.open(path)?.0)
    }

    #[pyo3(signature = (path, product_class, product_type, version=-1))]
    fn open_as(
        &mut self,
        path: &str,
        product_class: &str,
        product_type: &str,
        version: i32,
    ) -> PyResult<u64> {
        Ok(self
            .engine
            .open_as(path, product_class, product_type, version)?
            .0)
    }

    fn close(&mut self, pf: i64) -> PyResult<()> {
        Ok(self.engine.close(pf)?)
    }

    fn product_class(&self, pf: i64) -> PyResult<String> {
        Ok(self.engine.product_class(pf)?)
    }

    fn product_type(&self, pf: i64) -> PyResult<String> {
        Ok(self.engine.product_type(pf)?)
    }

    fn product_version(&self, pf: i64) -> PyResult<i32> {
        Ok(self.engine.product_version(pf)?)
    }

    fn unload(&mut self) {
        self.engine.unload();
    }

    // ========== Data ==========

    #[pyo3(signature = (*args))]
    fn fetch(&mut self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<PyObject> {
        let value = self.engine.fetch(&args_to_host(args)?)?;
        host_to_py(py, &value)
    }

    #[pyo3(signature = (*args))]
    fn fetch_datahandle(
        &mut self,
        py: Python<'_>,
        args: &Bound<'_, PyTuple>,
    ) -> PyResult<PyObject> {
        let value = self.engine.fetch_datahandle(&args_to_host(args)?)?;
        host_to_py(py, &value)
    }

    #[pyo3(signature = (*args))]
    fn attributes(&mut self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<PyObject> {
        let value = self.engine.attributes(&args_to_host(args)?)?;
        host_to_py(py, &value)
    }

    #[pyo3(signature = (expression, *args))]
    fn eval(
        &mut self,
        py: Python<'_>,
        expression: &str,
        args: &Bound<'_, PyTuple>,
    ) -> PyResult<PyObject> {
        let value = self.engine.eval(expression, &args_to_host(args)?)?;
        host_to_py(py, &value)
    }

    // ========== Metadata ==========

    #[pyo3(signature = (*args))]
    fn size(&self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<PyObject> {
        let value = self.engine.size(&args_to_host(args)?)?;
        host_to_py(py, &value)
    }

    #[pyo3(signature = (*args))]
    fn unit(&self, args: &Bound<'_, PyTuple>) -> PyResult<String> {
        Ok(self.engine.unit(&args_to_host(args)?)?)
    }

    #[pyo3(signature = (*args))]
    fn description(&self, args: &Bound<'_, PyTuple>) -> PyResult<String> {
        Ok(self.engine.description(&args_to_host(args)?)?)
    }

    #[pyo3(signature = (*args))]
    fn field_available(&self, args: &Bound<'_, PyTuple>) -> PyResult<bool> {
        Ok(self.engine.field_available(&args_to_host(args)?)?)
    }

    #[pyo3(signature = (*args))]
    fn field_count(&self, args: &Bound<'_, PyTuple>) -> PyResult<usize> {
        Ok(self.engine.field_count(&args_to_host(args)?)?)
    }

    #[pyo3(signature = (*args))]
    fn field_names(&self, py: Python<'_>, args: &Bound<'_, PyTuple>) -> PyResult<PyObject> {
        let value = self.engine.field_names(&args_to_host(args)?)?;
        host_to_py(py, &value)
    }

    // ========== Options ==========

    fn getopt(&self, name: &str) -> PyResult<bool> {
        Ok(self.engine.getopt(name)?)
    }

    /// Set an option and return its previous value.
    fn setopt(&mut self, name: &str, value: bool) -> PyResult<bool> {
        Ok(self.engine.setopt(name, value)?)
    }

    fn time_to_string(&self, value: &Bound<'_, PyAny>) -> PyResult<String> {
        let value = py_to_host(value)?;
        Ok(self.engine.time_to_string(&value)?)
    }

    // ========== Routines ==========

    /// Call a routine by name; failures come back as `QuarryErrorValue`.
    #[pyo3(signature = (name, *args))]
    fn call(&mut self, py: Python<'_>, name: &str, args: &Bound<'_, PyTuple>) -> PyResult<PyObject> {
        let value = self.engine.call(name, &args_to_host(args)?);
        host_to_py(py, &value)
    }

    #[staticmethod]
    fn version() -> &'static str {
        Engine::version()
    }

    fn __repr__(&self) -> String {
        format!("Session(open_products={})", self.engine.num_open_products())
    }
}

/// Names of every routine accepted by `Session.call`.
#[pyfunction]
pub fn routines() -> Vec<&'static str> {
    ROUTINES.iter().map(|routine| routine.name).collect()
}
