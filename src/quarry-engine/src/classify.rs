//! Mapping from product types to host types.
//!
//! One [`Classification`] drives both the structure builder and the value
//! materializer, so a type always produces the same host shape whether it
//! is described or filled.

use std::sync::Arc;

use common_config::{EngineOptions, StorageOptions};
use common_error::{QuarryError, QuarryResult};
use quarry_core::time::sec2day;
use quarry_core::{
    Cursor, NativeReadType, NativeType, PrimitiveType, Scalar, SpecialType, TypeKind, TypeNode,
};

/// How a product type is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Becomes a host structure.
    Record,
    /// Becomes a host array.
    Array,
    /// Becomes a byte array.
    Raw,
    /// Becomes a single host scalar.
    Leaf(LeafKind),
}

/// Scalar interpretations of leaf data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// int8 is widened to the 16-bit host integer.
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    Char,
    String,
    Time,
    VsfInteger,
    Complex,
    NoData,
}

impl LeafKind {
    fn from_read_type(read_type: NativeReadType) -> QuarryResult<Self> {
        Ok(match read_type {
            NativeReadType::Int8 => Self::Int8,
            NativeReadType::Uint8 => Self::Uint8,
            NativeReadType::Int16 => Self::Int16,
            NativeReadType::Uint16 => Self::Uint16,
            NativeReadType::Int32 => Self::Int32,
            NativeReadType::Uint32 => Self::Uint32,
            NativeReadType::Int64 => Self::Int64,
            NativeReadType::Uint64 => Self::Uint64,
            NativeReadType::Float => Self::Float,
            NativeReadType::Double => Self::Double,
            NativeReadType::Char => Self::Char,
            NativeReadType::String => Self::String,
            NativeReadType::Bytes => {
                return Err(QuarryError::internal(
                    "byte data can not be read as a single scalar",
                ))
            }
        })
    }

    /// Host type of values of this kind.
    pub fn native_type(self) -> NativeType {
        let primitive = match self {
            Self::Uint8 => PrimitiveType::Byte,
            Self::Int8 | Self::Int16 => PrimitiveType::Int,
            Self::Uint16 => PrimitiveType::UInt,
            Self::Int32 => PrimitiveType::Long,
            Self::Uint32 => PrimitiveType::ULong,
            Self::Int64 => PrimitiveType::Long64,
            Self::Uint64 => PrimitiveType::ULong64,
            Self::Float => PrimitiveType::Float,
            Self::Double | Self::Time | Self::VsfInteger => PrimitiveType::Double,
            Self::Char | Self::String => PrimitiveType::String,
            Self::Complex => PrimitiveType::DComplex,
            Self::NoData => return NativeType::NoData,
        };
        NativeType::Primitive(primitive)
    }

    /// Read the value at the cursor; no-data leaves yield `None`.
    pub fn read(self, cursor: &Cursor, options: &EngineOptions) -> QuarryResult<Option<Scalar>> {
        let scalar = match self {
            Self::Int8 | Self::Int16 => Scalar::Int(cursor.read_i16()?),
            Self::Uint8 => Scalar::Byte(cursor.read_u8()?),
            Self::Uint16 => Scalar::UInt(cursor.read_u16()?),
            Self::Int32 => Scalar::Long(cursor.read_i32()?),
            Self::Uint32 => Scalar::ULong(cursor.read_u32()?),
            Self::Int64 => Scalar::Long64(cursor.read_i64()?),
            Self::Uint64 => Scalar::ULong64(cursor.read_u64()?),
            Self::Float => Scalar::Float(cursor.read_f32()?),
            Self::Double | Self::VsfInteger => Scalar::Double(cursor.read_f64()?),
            Self::Time => {
                let seconds = cursor.read_f64()?;
                Scalar::Double(if options.time_unit_days {
                    sec2day(seconds)
                } else {
                    seconds
                })
            }
            Self::Char => Scalar::String(cursor.read_char()?.to_string()),
            Self::String => Scalar::String(cursor.read_string()?),
            Self::Complex => {
                let (re, im) = cursor.read_complex()?;
                Scalar::DComplex(re, im)
            }
            Self::NoData => return Ok(None),
        };
        Ok(Some(scalar))
    }
}

/// Classify a type node under the given read options.
///
/// With special types disabled a special node is classified as its base.
pub fn classify(node: &Arc<TypeNode>, options: &StorageOptions) -> QuarryResult<Classification> {
    let node = if options.use_special_types {
        Arc::clone(node)
    } else {
        node.strip_special()
    };
    match &node.kind {
        TypeKind::Record { .. } => Ok(Classification::Record),
        TypeKind::Array { .. } => Ok(Classification::Array),
        TypeKind::Raw { .. } => Ok(Classification::Raw),
        TypeKind::Integer { .. } | TypeKind::Real { .. } | TypeKind::Text { .. } => {
            let read_type = node
                .read_type(options.perform_conversions)
                .ok_or_else(|| QuarryError::internal("leaf type without a read type"))?;
            Ok(Classification::Leaf(LeafKind::from_read_type(read_type)?))
        }
        TypeKind::Special { special_type, .. } => Ok(Classification::Leaf(match special_type {
            SpecialType::Time => LeafKind::Time,
            SpecialType::VsfInteger => LeafKind::VsfInteger,
            SpecialType::Complex => LeafKind::Complex,
            SpecialType::NoData => LeafKind::NoData,
        })),
    }
}

/// Classification of the node under a cursor.
pub fn classify_cursor(cursor: &Cursor) -> QuarryResult<Classification> {
    classify(cursor.type_node(), &cursor.options())
}

/// Host element type for the elements of an array of `base`.
///
/// Records, arrays and raw data are never inlined; they are referenced
/// through data handles.
pub fn element_type(base: &Arc<TypeNode>, options: &StorageOptions) -> QuarryResult<NativeType> {
    Ok(match classify(base, options)? {
        Classification::Leaf(kind) => kind.native_type(),
        Classification::Record | Classification::Array | Classification::Raw => {
            NativeType::DataHandle
        }
    })
}

/// Host type of a single value reached by a selector chain: leaves map to
/// their scalar type, anything else to a data handle.
pub fn cursor_element_type(cursor: &Cursor) -> QuarryResult<NativeType> {
    element_type(cursor.type_node(), &cursor.options())
}
