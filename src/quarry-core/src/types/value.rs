//! Host runtime values.
//!
//! A [`HostValue`] is what a materialization hands back: a scalar, a typed
//! array, a structure, a data handle, a no-data marker, or an error value.

use std::sync::Arc;

use common_error::{QuarryError, QuarryResult, SUCCESS};
use serde_json::{json, Value as JsonValue};

use super::handle::DataHandle;
use super::native::{NativeType, PrimitiveType, StructDef};
use crate::shape;

/// Scalar host value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Byte(u8),
    Int(i16),
    UInt(u16),
    Long(i32),
    ULong(u32),
    Long64(i64),
    ULong64(u64),
    Float(f32),
    Double(f64),
    DComplex(f64, f64),
    String(String),
}

impl Scalar {
    /// Zero value of a primitive type.
    pub fn zero(primitive: PrimitiveType) -> Self {
        match primitive {
            PrimitiveType::Byte => Self::Byte(0),
            PrimitiveType::Int => Self::Int(0),
            PrimitiveType::UInt => Self::UInt(0),
            PrimitiveType::Long => Self::Long(0),
            PrimitiveType::ULong => Self::ULong(0),
            PrimitiveType::Long64 => Self::Long64(0),
            PrimitiveType::ULong64 => Self::ULong64(0),
            PrimitiveType::Float => Self::Float(0.0),
            PrimitiveType::Double => Self::Double(0.0),
            PrimitiveType::DComplex => Self::DComplex(0.0, 0.0),
            PrimitiveType::String => Self::String(String::new()),
        }
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Byte(_) => PrimitiveType::Byte,
            Self::Int(_) => PrimitiveType::Int,
            Self::UInt(_) => PrimitiveType::UInt,
            Self::Long(_) => PrimitiveType::Long,
            Self::ULong(_) => PrimitiveType::ULong,
            Self::Long64(_) => PrimitiveType::Long64,
            Self::ULong64(_) => PrimitiveType::ULong64,
            Self::Float(_) => PrimitiveType::Float,
            Self::Double(_) => PrimitiveType::Double,
            Self::DComplex(..) => PrimitiveType::DComplex,
            Self::String(_) => PrimitiveType::String,
        }
    }

    /// Integer content, if this is an integer scalar that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::UInt(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(i64::from(*v)),
            Self::ULong(v) => Some(i64::from(*v)),
            Self::Long64(v) => Some(*v),
            Self::ULong64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::DComplex(..) | Self::String(_) => None,
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Byte(v) => json!(v),
            Self::Int(v) => json!(v),
            Self::UInt(v) => json!(v),
            Self::Long(v) => json!(v),
            Self::ULong(v) => json!(v),
            Self::Long64(v) => json!(v),
            Self::ULong64(v) => json!(v),
            Self::Float(v) => json!(v),
            Self::Double(v) => json!(v),
            Self::DComplex(re, im) => json!([re, im]),
            Self::String(s) => json!(s),
        }
    }
}

/// Element storage of a host array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Byte(Vec<u8>),
    Int(Vec<i16>),
    UInt(Vec<u16>),
    Long(Vec<i32>),
    ULong(Vec<u32>),
    Long64(Vec<i64>),
    ULong64(Vec<u64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    DComplex(Vec<(f64, f64)>),
    String(Vec<String>),
    Struct(Vec<StructValue>),
    /// Unfilled slots hold `None`.
    Handle(Vec<Option<DataHandle>>),
    NoData(usize),
}

impl ArrayData {
    /// Zero-filled storage for `count` elements of the given type.
    pub fn zeroed(native_type: &NativeType, count: usize) -> QuarryResult<Self> {
        Ok(match native_type {
            NativeType::Primitive(primitive) => match primitive {
                PrimitiveType::Byte => Self::Byte(vec![0; count]),
                PrimitiveType::Int => Self::Int(vec![0; count]),
                PrimitiveType::UInt => Self::UInt(vec![0; count]),
                PrimitiveType::Long => Self::Long(vec![0; count]),
                PrimitiveType::ULong => Self::ULong(vec![0; count]),
                PrimitiveType::Long64 => Self::Long64(vec![0; count]),
                PrimitiveType::ULong64 => Self::ULong64(vec![0; count]),
                PrimitiveType::Float => Self::Float(vec![0.0; count]),
                PrimitiveType::Double => Self::Double(vec![0.0; count]),
                PrimitiveType::DComplex => Self::DComplex(vec![(0.0, 0.0); count]),
                PrimitiveType::String => Self::String(vec![String::new(); count]),
            },
            NativeType::Struct(def) => {
                let template = StructValue::allocate(Arc::clone(def))?;
                Self::Struct(vec![template; count])
            }
            NativeType::DataHandle => Self::Handle(vec![None; count]),
            NativeType::NoData => Self::NoData(count),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::UInt(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::ULong(v) => v.len(),
            Self::Long64(v) => v.len(),
            Self::ULong64(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::DComplex(v) => v.len(),
            Self::String(v) => v.len(),
            Self::Struct(v) => v.len(),
            Self::Handle(v) => v.len(),
            Self::NoData(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a scalar at `position`; the scalar must match the element type.
    pub fn set(&mut self, position: usize, scalar: Scalar) -> QuarryResult<()> {
        let len = self.len();
        if position >= len {
            return Err(QuarryError::internal(format!(
                "slot {position} outside array of {len} elements"
            )));
        }
        match (self, scalar) {
            (Self::Byte(v), Scalar::Byte(x)) => v[position] = x,
            (Self::Int(v), Scalar::Int(x)) => v[position] = x,
            (Self::UInt(v), Scalar::UInt(x)) => v[position] = x,
            (Self::Long(v), Scalar::Long(x)) => v[position] = x,
            (Self::ULong(v), Scalar::ULong(x)) => v[position] = x,
            (Self::Long64(v), Scalar::Long64(x)) => v[position] = x,
            (Self::ULong64(v), Scalar::ULong64(x)) => v[position] = x,
            (Self::Float(v), Scalar::Float(x)) => v[position] = x,
            (Self::Double(v), Scalar::Double(x)) => v[position] = x,
            (Self::DComplex(v), Scalar::DComplex(re, im)) => v[position] = (re, im),
            (Self::String(v), Scalar::String(x)) => v[position] = x,
            (data, scalar) => {
                return Err(QuarryError::internal(format!(
                    "cannot store {} in {} array",
                    scalar.primitive_type(),
                    data.type_name()
                )))
            }
        }
        Ok(())
    }

    pub fn set_handle(&mut self, position: usize, handle: DataHandle) -> QuarryResult<()> {
        match self {
            Self::Handle(v) if position < v.len() => {
                v[position] = Some(handle);
                Ok(())
            }
            other => Err(QuarryError::internal(format!(
                "cannot store a data handle at slot {} of {} array",
                position,
                other.type_name()
            ))),
        }
    }

    /// Element at `position` as a standalone host value.
    pub fn get(&self, position: usize) -> Option<HostValue> {
        let scalar = |s: Scalar| Some(HostValue::Scalar(s));
        match self {
            Self::Byte(v) => v.get(position).and_then(|x| scalar(Scalar::Byte(*x))),
            Self::Int(v) => v.get(position).and_then(|x| scalar(Scalar::Int(*x))),
            Self::UInt(v) => v.get(position).and_then(|x| scalar(Scalar::UInt(*x))),
            Self::Long(v) => v.get(position).and_then(|x| scalar(Scalar::Long(*x))),
            Self::ULong(v) => v.get(position).and_then(|x| scalar(Scalar::ULong(*x))),
            Self::Long64(v) => v.get(position).and_then(|x| scalar(Scalar::Long64(*x))),
            Self::ULong64(v) => v.get(position).and_then(|x| scalar(Scalar::ULong64(*x))),
            Self::Float(v) => v.get(position).and_then(|x| scalar(Scalar::Float(*x))),
            Self::Double(v) => v.get(position).and_then(|x| scalar(Scalar::Double(*x))),
            Self::DComplex(v) => v
                .get(position)
                .and_then(|(re, im)| scalar(Scalar::DComplex(*re, *im))),
            Self::String(v) => v.get(position).and_then(|x| scalar(Scalar::String(x.clone()))),
            Self::Struct(v) => v.get(position).cloned().map(HostValue::Struct),
            Self::Handle(v) => v.get(position).map(|slot| match slot {
                Some(handle) => HostValue::Handle(Box::new(handle.clone())),
                None => HostValue::NoData,
            }),
            Self::NoData(n) => (position < *n).then_some(HostValue::NoData),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Byte(_) => "BYTE",
            Self::Int(_) => "INT",
            Self::UInt(_) => "UINT",
            Self::Long(_) => "LONG",
            Self::ULong(_) => "ULONG",
            Self::Long64(_) => "LONG64",
            Self::ULong64(_) => "ULONG64",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::DComplex(_) => "DCOMPLEX",
            Self::String(_) => "STRING",
            Self::Struct(_) => "STRUCT",
            Self::Handle(_) => "DATAHANDLE",
            Self::NoData(_) => "NO_DATA",
        }
    }

    /// Integer elements widened to `i64`, for integer arrays only.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            Self::Byte(v) => Some(v.iter().map(|x| i64::from(*x)).collect()),
            Self::Int(v) => Some(v.iter().map(|x| i64::from(*x)).collect()),
            Self::UInt(v) => Some(v.iter().map(|x| i64::from(*x)).collect()),
            Self::Long(v) => Some(v.iter().map(|x| i64::from(*x)).collect()),
            Self::ULong(v) => Some(v.iter().map(|x| i64::from(*x)).collect()),
            Self::Long64(v) => Some(v.clone()),
            Self::ULong64(v) => v.iter().map(|x| i64::try_from(*x).ok()).collect(),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Byte(_)
                | Self::Int(_)
                | Self::UInt(_)
                | Self::Long(_)
                | Self::ULong(_)
                | Self::Long64(_)
                | Self::ULong64(_)
        )
    }
}

/// Multi-dimensional host array.
///
/// `dims` are in host order and elements are stored with the first host
/// dimension varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct HostArray {
    pub dims: Vec<usize>,
    pub data: ArrayData,
}

impl HostArray {
    pub fn new(dims: Vec<usize>, data: ArrayData) -> QuarryResult<Self> {
        if shape::num_elements(&dims) != data.len() {
            return Err(QuarryError::internal(format!(
                "array of {} elements does not match dimensions {:?}",
                data.len(),
                dims
            )));
        }
        Ok(Self { dims, data })
    }

    pub fn allocate(native_type: &NativeType, dims: Vec<usize>) -> QuarryResult<Self> {
        let data = ArrayData::zeroed(native_type, shape::num_elements(&dims))?;
        Ok(Self { dims, data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<HostValue> {
        self.data.get(position)
    }
}

/// Instance of a host structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    def: Arc<StructDef>,
    fields: Vec<HostValue>,
}

impl StructValue {
    /// Zero-initialised instance of a definition.
    pub fn allocate(def: Arc<StructDef>) -> QuarryResult<Self> {
        let fields = def
            .fields()
            .iter()
            .map(|field| HostValue::allocate(&field.native_type, field.dims.as_deref()))
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(Self { def, fields })
    }

    pub fn def(&self) -> &Arc<StructDef> {
        &self.def
    }

    pub fn fields(&self) -> &[HostValue] {
        &self.fields
    }

    pub fn field_at_mut(&mut self, index: usize) -> Option<&mut HostValue> {
        self.fields.get_mut(index)
    }

    /// Field by name, compared case-insensitively.
    pub fn field(&self, name: &str) -> Option<&HostValue> {
        self.def
            .field_index(name)
            .and_then(|index| self.fields.get(index))
    }
}

/// Error record handed to hosts instead of raising.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub code: i32,
    pub message: String,
}

impl ErrorValue {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(SUCCESS, "success (no error)")
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS
    }
}

impl From<&QuarryError> for ErrorValue {
    fn from(err: &QuarryError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// Any value produced for, or accepted from, a host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Scalar(Scalar),
    Array(HostArray),
    Struct(StructValue),
    Handle(Box<DataHandle>),
    NoData,
    Error(ErrorValue),
}

impl HostValue {
    /// Zero-initialised value of a type; `dims` makes it an array.
    pub fn allocate(native_type: &NativeType, dims: Option<&[usize]>) -> QuarryResult<Self> {
        if let Some(dims) = dims {
            return Ok(Self::Array(HostArray::allocate(native_type, dims.to_vec())?));
        }
        match native_type {
            NativeType::Primitive(primitive) => Ok(Self::Scalar(Scalar::zero(*primitive))),
            NativeType::Struct(def) => Ok(Self::Struct(StructValue::allocate(Arc::clone(def))?)),
            NativeType::NoData => Ok(Self::NoData),
            NativeType::DataHandle => Err(QuarryError::internal(
                "a scalar data handle cannot be allocated without a position",
            )),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(err) if !err.is_success())
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&HostArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&DataHandle> {
        match self {
            Self::Handle(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// JSON rendering for command-line output.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Scalar(s) => s.to_json(),
            Self::Array(array) => {
                let values: Vec<JsonValue> = (0..array.len())
                    .filter_map(|i| array.get(i))
                    .map(|value| value.to_json())
                    .collect();
                if array.dims.len() <= 1 {
                    JsonValue::Array(values)
                } else {
                    json!({ "dims": array.dims, "values": values })
                }
            }
            Self::Struct(value) => {
                let object = value
                    .def()
                    .field_names()
                    .zip(value.fields())
                    .map(|(name, field)| (name.to_string(), field.to_json()))
                    .collect::<serde_json::Map<_, _>>();
                JsonValue::Object(object)
            }
            Self::Handle(handle) => json!({
                "datahandle": {
                    "product": handle.product.0,
                    "depth": handle.cursor.depth(),
                    "class": handle.cursor.type_class().name(),
                }
            }),
            Self::NoData => JsonValue::Null,
            Self::Error(err) => json!({ "error": err.code, "message": err.message }),
        }
    }
}

impl From<Scalar> for HostValue {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Long64(value))
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::String(value))
    }
}

impl From<Vec<i64>> for HostValue {
    fn from(values: Vec<i64>) -> Self {
        Self::Array(HostArray {
            dims: vec![values.len()],
            data: ArrayData::Long64(values),
        })
    }
}

impl From<DataHandle> for HostValue {
    fn from(handle: DataHandle) -> Self {
        Self::Handle(Box::new(handle))
    }
}

impl From<ErrorValue> for HostValue {
    fn from(err: ErrorValue) -> Self {
        Self::Error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructField;

    fn sample_def() -> Arc<StructDef> {
        Arc::new(StructDef::new(vec![
            StructField::scalar("A", NativeType::Primitive(PrimitiveType::Long)),
            StructField::array("B", NativeType::Primitive(PrimitiveType::Double), vec![2, 3]),
            StructField::scalar("C", NativeType::NoData),
        ]))
    }

    #[test]
    fn test_struct_allocation_is_zeroed() {
        let value = StructValue::allocate(sample_def()).unwrap();
        assert_eq!(value.field("a"), Some(&HostValue::Scalar(Scalar::Long(0))));
        let b = value.field("B").and_then(HostValue::as_array).unwrap();
        assert_eq!(b.dims, vec![2, 3]);
        assert_eq!(b.data, ArrayData::Double(vec![0.0; 6]));
        assert!(value.field("c").unwrap().is_no_data());
    }

    #[test]
    fn test_array_set_type_checked() {
        let mut data = ArrayData::zeroed(&NativeType::Primitive(PrimitiveType::Int), 3).unwrap();
        data.set(1, Scalar::Int(7)).unwrap();
        assert_eq!(data, ArrayData::Int(vec![0, 7, 0]));
        assert!(data.set(1, Scalar::Long(7)).is_err());
        assert!(data.set(3, Scalar::Int(7)).is_err());
    }

    #[test]
    fn test_scalar_handle_not_allocatable() {
        assert!(HostValue::allocate(&NativeType::DataHandle, None).is_err());
        let handles = HostValue::allocate(&NativeType::DataHandle, Some(&[2])).unwrap();
        assert_eq!(handles.as_array().unwrap().get(0), Some(HostValue::NoData));
    }

    #[test]
    fn test_error_value_from_error() {
        let err = ErrorValue::from(&QuarryError::MaxOpenFiles);
        assert_eq!(err.code, -920);
        assert!(HostValue::Error(err).is_error());
        assert!(!HostValue::Error(ErrorValue::success()).is_error());
    }

    #[test]
    fn test_json_rendering() {
        let array = HostValue::from(vec![1_i64, 2, 3]);
        assert_eq!(array.to_json(), json!([1, 2, 3]));
        let grid = HostValue::Array(
            HostArray::new(vec![2, 2], ArrayData::Int(vec![1, 2, 3, 4])).unwrap(),
        );
        assert_eq!(grid.to_json(), json!({"dims": [2, 2], "values": [1, 2, 3, 4]}));
        assert_eq!(HostValue::NoData.to_json(), JsonValue::Null);
    }
}
