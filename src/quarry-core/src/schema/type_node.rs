//! Schema nodes describing the layout of a product.

use std::fmt;
use std::sync::Arc;

use common_error::{QuarryError, QuarryResult, StorageErrorKind};
use serde::{Deserialize, Serialize};

/// Storage class of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeClass {
    Record,
    Array,
    Integer,
    Real,
    Text,
    Raw,
    Special,
}

impl TypeClass {
    /// Lower-case name of the class.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Array => "array",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Raw => "raw",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Machine type used when reading a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeReadType {
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
    Bytes,
}

impl NativeReadType {
    /// Storage width in bytes for fixed-width types.
    pub const fn byte_size(self) -> Option<u64> {
        match self {
            Self::Int8 | Self::Uint8 | Self::Char => Some(1),
            Self::Int16 | Self::Uint16 => Some(2),
            Self::Int32 | Self::Uint32 | Self::Float => Some(4),
            Self::Int64 | Self::Uint64 | Self::Double => Some(8),
            Self::String | Self::Bytes => None,
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Uint8
                | Self::Int16
                | Self::Uint16
                | Self::Int32
                | Self::Uint32
                | Self::Int64
                | Self::Uint64
        )
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Inclusive value range of an integer type.
    pub const fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            Self::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::Uint8 => Some((0, u8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::Uint16 => Some((0, u16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::Uint32 => Some((0, u32::MAX as i128)),
            Self::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::Uint64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    /// Whether data stored as `self` may be read as `target` without loss.
    pub fn widens_to(self, target: NativeReadType) -> bool {
        use NativeReadType::*;
        if self == target {
            return true;
        }
        match target {
            Int16 => matches!(self, Int8 | Uint8),
            Uint16 => matches!(self, Uint8),
            Int32 => matches!(self, Int8 | Uint8 | Int16 | Uint16),
            Uint32 => matches!(self, Uint8 | Uint16),
            Int64 => matches!(self, Int8 | Uint8 | Int16 | Uint16 | Int32 | Uint32),
            Uint64 => matches!(self, Uint8 | Uint16 | Uint32),
            Float => matches!(self, Int8 | Uint8 | Int16 | Uint16),
            Double => self.is_integer() || self == Float,
            _ => false,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for NativeReadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpretation applied on top of a special node's base data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialType {
    /// Placeholder for absent data.
    NoData,
    /// Integer with a variable decimal scale factor.
    VsfInteger,
    /// Point in time.
    Time,
    /// Complex number.
    Complex,
}

impl SpecialType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::VsfInteger => "vsf_integer",
            Self::Time => "time",
            Self::Complex => "complex",
        }
    }
}

/// Linear unit conversion of a numeric leaf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub numerator: f64,
    pub denominator: f64,
    #[serde(default)]
    pub add_offset: f64,
    /// Raw value that converts to NaN.
    #[serde(default)]
    pub invalid: Option<f64>,
}

impl Conversion {
    pub fn new(numerator: f64, denominator: f64) -> Self {
        Self {
            numerator,
            denominator,
            add_offset: 0.0,
            invalid: None,
        }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        if self.invalid == Some(raw) {
            return f64::NAN;
        }
        raw * self.numerator / self.denominator + self.add_offset
    }
}

/// One field of a record node.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub type_node: Arc<TypeNode>,
    /// Hidden fields are skipped when record fields are filtered.
    pub hidden: bool,
    /// Optional fields may be absent in a given record instance.
    pub optional: bool,
}

impl RecordField {
    pub fn new(name: impl Into<String>, type_node: impl Into<Arc<TypeNode>>) -> Self {
        Self {
            name: name.into(),
            type_node: type_node.into(),
            hidden: false,
            optional: false,
        }
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// Class-specific part of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Record {
        fields: Vec<RecordField>,
    },
    /// Array with per-dimension extents; `-1` marks an extent known only from the data.
    Array {
        dims: Vec<i64>,
        base: Arc<TypeNode>,
    },
    Integer {
        read_type: NativeReadType,
        conversion: Option<Conversion>,
    },
    Real {
        read_type: NativeReadType,
        conversion: Option<Conversion>,
    },
    Text {
        read_type: NativeReadType,
        length: Option<u64>,
    },
    Raw {
        length: Option<u64>,
    },
    Special {
        special_type: SpecialType,
        base: Arc<TypeNode>,
    },
}

/// Immutable description of one node in a product's layout.
///
/// Nodes are shared through `Arc` and never mutated after a product has
/// been loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    /// Record type describing the attributes attached to this node.
    pub attributes: Option<Arc<TypeNode>>,
    pub kind: TypeKind,
}

impl TypeNode {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            name: None,
            description: None,
            unit: None,
            attributes: None,
            kind,
        }
    }

    pub fn record(fields: Vec<RecordField>) -> Self {
        Self::new(TypeKind::Record { fields })
    }

    pub fn array(dims: Vec<i64>, base: impl Into<Arc<TypeNode>>) -> Self {
        Self::new(TypeKind::Array {
            dims,
            base: base.into(),
        })
    }

    pub fn integer(read_type: NativeReadType) -> Self {
        Self::new(TypeKind::Integer {
            read_type,
            conversion: None,
        })
    }

    pub fn real(read_type: NativeReadType) -> Self {
        Self::new(TypeKind::Real {
            read_type,
            conversion: None,
        })
    }

    pub fn text() -> Self {
        Self::new(TypeKind::Text {
            read_type: NativeReadType::String,
            length: None,
        })
    }

    pub fn character() -> Self {
        Self::new(TypeKind::Text {
            read_type: NativeReadType::Char,
            length: Some(1),
        })
    }

    pub fn raw(length: Option<u64>) -> Self {
        Self::new(TypeKind::Raw { length })
    }

    pub fn special(special_type: SpecialType, base: impl Into<Arc<TypeNode>>) -> Self {
        Self::new(TypeKind::Special {
            special_type,
            base: base.into(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_attributes(mut self, attributes: impl Into<Arc<TypeNode>>) -> Self {
        self.attributes = Some(attributes.into());
        self
    }

    /// Attach a conversion to a numeric node; other classes are left untouched.
    pub fn with_conversion(mut self, conversion: Conversion) -> Self {
        match &mut self.kind {
            TypeKind::Integer { conversion: c, .. } | TypeKind::Real { conversion: c, .. } => {
                *c = Some(conversion);
            }
            _ => {}
        }
        self
    }

    pub fn type_class(&self) -> TypeClass {
        match &self.kind {
            TypeKind::Record { .. } => TypeClass::Record,
            TypeKind::Array { .. } => TypeClass::Array,
            TypeKind::Integer { .. } => TypeClass::Integer,
            TypeKind::Real { .. } => TypeClass::Real,
            TypeKind::Text { .. } => TypeClass::Text,
            TypeKind::Raw { .. } => TypeClass::Raw,
            TypeKind::Special { .. } => TypeClass::Special,
        }
    }

    /// Read type of a leaf, or `None` for compound and special nodes.
    ///
    /// A numeric node with a conversion reads as `Double` while conversions
    /// are enabled.
    pub fn read_type(&self, perform_conversions: bool) -> Option<NativeReadType> {
        match &self.kind {
            TypeKind::Integer {
                read_type,
                conversion,
            }
            | TypeKind::Real {
                read_type,
                conversion,
            } => {
                if conversion.is_some() && perform_conversions {
                    Some(NativeReadType::Double)
                } else {
                    Some(*read_type)
                }
            }
            TypeKind::Text { read_type, .. } => Some(*read_type),
            TypeKind::Raw { .. } => Some(NativeReadType::Bytes),
            TypeKind::Record { .. } | TypeKind::Array { .. } | TypeKind::Special { .. } => None,
        }
    }

    /// Stored read type, ignoring any conversion.
    pub fn storage_read_type(&self) -> Option<NativeReadType> {
        self.read_type(false)
    }

    pub fn conversion(&self) -> Option<&Conversion> {
        match &self.kind {
            TypeKind::Integer { conversion, .. } | TypeKind::Real { conversion, .. } => {
                conversion.as_ref()
            }
            _ => None,
        }
    }

    pub fn record_fields(&self) -> QuarryResult<&[RecordField]> {
        match &self.kind {
            TypeKind::Record { fields } => Ok(fields),
            _ => Err(self.class_error("record")),
        }
    }

    pub fn num_record_fields(&self) -> QuarryResult<usize> {
        Ok(self.record_fields()?.len())
    }

    pub fn record_field(&self, index: usize) -> QuarryResult<&RecordField> {
        let fields = self.record_fields()?;
        fields.get(index).ok_or_else(|| {
            QuarryError::storage(
                StorageErrorKind::InvalidIndex,
                format!(
                    "field index ({}) is not in the range [0,{})",
                    index,
                    fields.len()
                ),
            )
        })
    }

    /// Index of the field with exactly this name.
    pub fn record_field_index(&self, name: &str) -> QuarryResult<usize> {
        self.record_fields()?
            .iter()
            .position(|field| field.name == name)
            .ok_or_else(|| {
                QuarryError::storage(
                    StorageErrorKind::InvalidName,
                    format!("record does not contain a field named '{name}'"),
                )
            })
    }

    pub fn array_dims(&self) -> QuarryResult<&[i64]> {
        match &self.kind {
            TypeKind::Array { dims, .. } => Ok(dims),
            _ => Err(self.class_error("array")),
        }
    }

    pub fn array_base(&self) -> QuarryResult<&Arc<TypeNode>> {
        match &self.kind {
            TypeKind::Array { base, .. } => Ok(base),
            _ => Err(self.class_error("array")),
        }
    }

    pub fn special_type(&self) -> QuarryResult<SpecialType> {
        match &self.kind {
            TypeKind::Special { special_type, .. } => Ok(*special_type),
            _ => Err(self.class_error("special")),
        }
    }

    pub fn special_base(&self) -> QuarryResult<&Arc<TypeNode>> {
        match &self.kind {
            TypeKind::Special { base, .. } => Ok(base),
            _ => Err(self.class_error("special")),
        }
    }

    /// Follow special nodes down to their non-special base.
    pub fn strip_special(self: &Arc<Self>) -> Arc<TypeNode> {
        let mut node = Arc::clone(self);
        while let TypeKind::Special { base, .. } = &node.kind {
            let next = Arc::clone(base);
            node = next;
        }
        node
    }

    fn class_error(&self, expected: &str) -> QuarryError {
        QuarryError::invalid_type(format!(
            "type does not refer to {} {} (type is {})",
            if expected == "array" { "an" } else { "a" },
            expected,
            self.type_class()
        ))
    }
}
