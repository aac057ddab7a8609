//! Host-side type descriptors.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Primitive host types, named after the host's own type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Byte,
    Int,
    UInt,
    Long,
    ULong,
    Long64,
    ULong64,
    Float,
    Double,
    DComplex,
    String,
}

impl PrimitiveType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "BYTE",
            Self::Int => "INT",
            Self::UInt => "UINT",
            Self::Long => "LONG",
            Self::ULong => "ULONG",
            Self::Long64 => "LONG64",
            Self::ULong64 => "ULONG64",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::DComplex => "DCOMPLEX",
            Self::String => "STRING",
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Int
                | Self::UInt
                | Self::Long
                | Self::ULong
                | Self::Long64
                | Self::ULong64
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type of a host value slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    Primitive(PrimitiveType),
    Struct(Arc<StructDef>),
    /// Opaque position inside an open product.
    DataHandle,
    /// Marker for absent data.
    NoData,
}

impl NativeType {
    pub fn name(&self) -> String {
        match self {
            Self::Primitive(primitive) => primitive.name().to_string(),
            Self::Struct(def) => format!("STRUCT{{{}}}", def.len()),
            Self::DataHandle => "DATAHANDLE".to_string(),
            Self::NoData => "NO_DATA".to_string(),
        }
    }
}

impl From<PrimitiveType> for NativeType {
    fn from(primitive: PrimitiveType) -> Self {
        Self::Primitive(primitive)
    }
}

/// One field of a host structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub native_type: NativeType,
    /// Host-order extents for array-valued fields.
    pub dims: Option<Vec<usize>>,
}

impl StructField {
    pub fn scalar(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            native_type,
            dims: None,
        }
    }

    pub fn array(name: impl Into<String>, native_type: NativeType, dims: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            native_type,
            dims: Some(dims),
        }
    }
}

/// Layout of a host structure.
///
/// Two definitions with the same field names, types and extents are equal,
/// which makes the definition itself usable as its structural signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StructDef {
    fields: Vec<StructField>,
}

impl StructDef {
    pub fn new(fields: Vec<StructField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field; names compare case-insensitively.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}
