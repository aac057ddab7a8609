//! Conversions between Python objects and host values.

use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyComplex, PyDict, PyFloat, PyList, PyLong, PyString, PyTuple};

use quarry_core::{ArrayData, DataHandle, ErrorValue, HostArray, HostValue, Scalar};

/// Saved position in an open product.
#[pyclass(name = "DataHandle")]
#[derive(Clone)]
pub struct PyDataHandle {
    pub(crate) inner: DataHandle,
}

#[pymethods]
impl PyDataHandle {
    /// Id of the product the handle points into.
    #[getter]
    fn product(&self) -> u64 {
        self.inner.product.0
    }

    fn __repr__(&self) -> String {
        format!(
            "DataHandle(product={}, depth={}, class={})",
            self.inner.product,
            self.inner.cursor.depth(),
            self.inner.cursor.type_class().name()
        )
    }
}

/// Marker for data items that have no data.
#[pyclass(name = "NoData", frozen)]
pub struct PyNoData;

#[pymethods]
impl PyNoData {
    #[new]
    fn new() -> Self {
        Self
    }

    fn __bool__(&self) -> bool {
        false
    }

    fn __eq__(&self, other: &Bound<'_, PyAny>) -> bool {
        other.is_instance_of::<PyNoData>()
    }

    fn __repr__(&self) -> &'static str {
        "NoData"
    }
}

/// Error record returned by `Session.call` instead of raising.
#[pyclass(name = "QuarryErrorValue", frozen)]
pub struct PyErrorValue {
    #[pyo3(get)]
    code: i32,
    #[pyo3(get)]
    message: String,
}

#[pymethods]
impl PyErrorValue {
    fn __bool__(&self) -> bool {
        self.code != common_error::SUCCESS
    }

    fn __repr__(&self) -> String {
        format!("QuarryErrorValue(code={}, message={:?})", self.code, self.message)
    }
}

impl From<&ErrorValue> for PyErrorValue {
    fn from(err: &ErrorValue) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
        }
    }
}

// ============================================================================
// Python -> host
// ============================================================================

/// Convert a Python argument into a host value.
pub fn py_to_host(obj: &Bound<'_, PyAny>) -> PyResult<HostValue> {
    if let Ok(handle) = obj.extract::<PyRef<'_, PyDataHandle>>() {
        return Ok(HostValue::from(handle.inner.clone()));
    }
    if obj.is_instance_of::<PyNoData>() {
        return Ok(HostValue::NoData);
    }
    if obj.is_instance_of::<PyBool>() {
        return Ok(HostValue::Scalar(Scalar::Int(i16::from(obj.extract::<bool>()?))));
    }
    if obj.is_instance_of::<PyLong>() {
        return Ok(HostValue::from(obj.extract::<i64>()?));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(HostValue::Scalar(Scalar::Double(obj.extract::<f64>()?)));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(HostValue::from(obj.extract::<String>()?));
    }
    if obj.is_instance_of::<PyList>() || obj.is_instance_of::<PyTuple>() {
        if let Ok(indices) = obj.extract::<Vec<i64>>() {
            return Ok(HostValue::from(indices));
        }
        if let Ok(handles) = obj.extract::<Vec<PyRef<'_, PyDataHandle>>>() {
            let handles: Vec<Option<DataHandle>> =
                handles.iter().map(|h| Some(h.inner.clone())).collect();
            let array = HostArray::new(vec![handles.len()], ArrayData::Handle(handles))?;
            return Ok(HostValue::Array(array));
        }
    }
    Err(PyTypeError::new_err(format!(
        "cannot use {} as a Quarry argument",
        obj.get_type().name()?
    )))
}

pub fn args_to_host(args: &Bound<'_, PyTuple>) -> PyResult<Vec<HostValue>> {
    args.iter().map(|arg| py_to_host(&arg)).collect()
}

// ============================================================================
// Host -> Python
// ============================================================================

fn scalar_to_py(py: Python<'_>, scalar: &Scalar) -> PyObject {
    match scalar {
        Scalar::Byte(v) => v.into_py(py),
        Scalar::Int(v) => v.into_py(py),
        Scalar::UInt(v) => v.into_py(py),
        Scalar::Long(v) => v.into_py(py),
        Scalar::ULong(v) => v.into_py(py),
        Scalar::Long64(v) => v.into_py(py),
        Scalar::ULong64(v) => v.into_py(py),
        Scalar::Float(v) => v.into_py(py),
        Scalar::Double(v) => v.into_py(py),
        Scalar::DComplex(re, im) => PyComplex::from_doubles_bound(py, *re, *im).into_py(py),
        Scalar::String(v) => v.into_py(py),
    }
}

/// Nested lists indexed `[i0][i1]...` over the host dims; elements are stored
/// with the first host dimension varying fastest.
fn array_to_py(py: Python<'_>, array: &HostArray) -> PyResult<PyObject> {
    let mut strides = Vec::with_capacity(array.dims.len());
    let mut stride = 1;
    for &extent in &array.dims {
        strides.push(stride);
        stride *= extent;
    }
    nest(py, array, &strides, 0, 0)
}

fn nest(
    py: Python<'_>,
    array: &HostArray,
    strides: &[usize],
    level: usize,
    base: usize,
) -> PyResult<PyObject> {
    let list = PyList::empty_bound(py);
    let extent = array.dims.get(level).copied().unwrap_or(0);
    for i in 0..extent {
        let position = base + i * strides[level];
        let item = if level + 1 == array.dims.len() {
            match array.get(position) {
                Some(value) => host_to_py(py, &value)?,
                None => py.None(),
            }
        } else {
            nest(py, array, strides, level + 1, position)?
        };
        list.append(item)?;
    }
    Ok(list.into_py(py))
}

/// Convert a host value into a Python object.
pub fn host_to_py(py: Python<'_>, value: &HostValue) -> PyResult<PyObject> {
    Ok(match value {
        HostValue::Scalar(scalar) => scalar_to_py(py, scalar),
        HostValue::Array(array) => array_to_py(py, array)?,
        HostValue::Struct(record) => {
            let dict = PyDict::new_bound(py);
            for (name, field) in record.def().field_names().zip(record.fields()) {
                dict.set_item(name, host_to_py(py, field)?)?;
            }
            dict.into_py(py)
        }
        HostValue::Handle(handle) => Py::new(
            py,
            PyDataHandle {
                inner: handle.as_ref().clone(),
            },
        )?
        .into_py(py),
        HostValue::NoData => Py::new(py, PyNoData)?.into_py(py),
        HostValue::Error(err) => Py::new(py, PyErrorValue::from(err))?.into_py(py),
    })
}
