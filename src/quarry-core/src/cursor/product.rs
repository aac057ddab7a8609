//! Backend interface implemented by every product format.

use std::fmt;
use std::sync::Arc;

use common_error::QuarryResult;

use crate::schema::TypeNode;

/// One level of a cursor: a schema node plus the backend position of its data.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub node: Arc<TypeNode>,
    /// Position within the parent (field or element index); `-1` at the root
    /// and for attribute records.
    pub index: i64,
    /// Backend-defined address of the data for this node.
    pub locator: u64,
}

impl Frame {
    pub fn new(node: Arc<TypeNode>, index: i64, locator: u64) -> Self {
        Self {
            node,
            index,
            locator,
        }
    }
}

/// Raw content of a leaf as delivered by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Int(i64),
    UInt(u64),
    Real(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl LeafValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::UInt(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            Self::Text(_) | Self::Bytes(_) => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(i128::from(*v)),
            Self::UInt(v) => Some(i128::from(*v)),
            _ => None,
        }
    }
}

/// An opened product, navigated frame by frame.
///
/// Implementations are immutable once opened and shared between every
/// cursor that points into them.
pub trait Product: fmt::Debug + Send + Sync {
    /// Path or name the product was opened from.
    fn filename(&self) -> &str;

    fn product_class(&self) -> Option<&str>;

    fn product_type(&self) -> Option<&str>;

    fn product_version(&self) -> i32;

    /// Frame of the root record.
    fn root(&self) -> Frame;

    /// Frame of the `index`-th field of a record.
    ///
    /// Unavailable optional fields resolve to a no-data frame.
    fn record_field(&self, record: &Frame, index: usize) -> QuarryResult<Frame>;

    fn record_field_available(&self, record: &Frame, index: usize) -> QuarryResult<bool>;

    /// Actual extents of an array instance, in storage (row-major) order.
    fn array_dims(&self, array: &Frame) -> QuarryResult<Vec<usize>>;

    /// Frame of the element at a row-major linear index.
    fn array_element(&self, array: &Frame, index: usize) -> QuarryResult<Frame>;

    /// Frame holding the base data of a special node.
    fn special_base(&self, special: &Frame) -> QuarryResult<Frame>;

    /// Attribute record attached to a node; an empty record when none are defined.
    fn attributes(&self, frame: &Frame) -> QuarryResult<Frame>;

    fn byte_size(&self, frame: &Frame) -> QuarryResult<u64>;

    fn read_leaf(&self, frame: &Frame) -> QuarryResult<LeafValue>;

    fn read_bytes(&self, frame: &Frame, offset: u64, length: u64) -> QuarryResult<Vec<u8>>;
}
