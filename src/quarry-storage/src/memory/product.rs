//! `MemoryProduct` implementation.

use std::path::Path;
use std::sync::Arc;

use common_error::{QuarryError, QuarryResult, StorageErrorKind};
use quarry_core::{Frame, LeafValue, Product, SpecialType, TypeClass, TypeNode};

use super::data::{DataNode, Loader};
use super::definition::ProductDescription;

// ============================================================================
// MemoryProduct
// ============================================================================

/// A product held entirely in memory.
///
/// Built from a [`ProductDescription`]; the content is validated against
/// the definition while loading, so navigation never meets malformed data.
#[derive(Debug)]
pub struct MemoryProduct {
    filename: String,
    product_class: Option<String>,
    product_type: Option<String>,
    version: i32,
    root_type: Arc<TypeNode>,
    root: usize,
    nodes: Vec<DataNode>,
    /// Attribute record for nodes without attributes.
    empty_record: (Arc<TypeNode>, usize),
    /// Stand-in for unavailable record fields.
    no_data: (Arc<TypeNode>, usize),
}

impl MemoryProduct {
    /// Load a product from a parsed description.
    pub fn from_description(
        filename: impl Into<String>,
        description: ProductDescription,
    ) -> QuarryResult<Self> {
        let filename = filename.into();
        let root_type = description.definition.into_node()?;
        if root_type.type_class() != TypeClass::Record {
            return Err(QuarryError::data_definition(format!(
                "root of product '{filename}' must be a record (found {})",
                root_type.type_class()
            )));
        }

        let mut loader = Loader::new();
        let root = loader.load(&root_type, &description.data, "")?;
        let empty_id = loader.push(DataNode::Record {
            fields: Vec::new(),
            attributes: None,
        });
        let raw_id = loader.push(DataNode::Raw(Vec::new()));
        let no_data_id = loader.push(DataNode::Special { base: raw_id });
        let nodes = loader.into_nodes();

        log::debug!(
            "loaded memory product '{}' with {} data nodes",
            filename,
            nodes.len()
        );
        Ok(Self {
            filename,
            product_class: description.product_class,
            product_type: description.product_type,
            version: description.version,
            root_type,
            root,
            nodes,
            empty_record: (Arc::new(TypeNode::record(Vec::new())), empty_id),
            no_data: (
                Arc::new(TypeNode::special(
                    SpecialType::NoData,
                    TypeNode::raw(Some(0)),
                )),
                no_data_id,
            ),
        })
    }

    /// Load a product from JSON text.
    pub fn from_json_str(filename: impl Into<String>, text: &str) -> QuarryResult<Self> {
        let description: ProductDescription = serde_json::from_str(text)?;
        Self::from_description(filename, description)
    }

    /// Load a product from an already parsed JSON value.
    pub fn from_json_value(
        filename: impl Into<String>,
        value: serde_json::Value,
    ) -> QuarryResult<Self> {
        let description: ProductDescription = serde_json::from_value(value)?;
        Self::from_description(filename, description)
    }

    /// Read and load a JSON product file.
    pub fn open(path: impl AsRef<Path>) -> QuarryResult<Self> {
        let path = path.as_ref();
        let filename = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => QuarryError::storage(
                StorageErrorKind::FileNotFound,
                format!("could not find {filename}"),
            ),
            _ => QuarryError::storage(
                StorageErrorKind::FileOpen,
                format!("could not open {filename} ({err})"),
            ),
        })?;
        Self::from_json_str(filename.clone(), &text).map_err(|err| match err {
            QuarryError::SerdeJsonError(json) => QuarryError::storage(
                StorageErrorKind::UnsupportedProduct,
                format!("{filename} is not a valid product description ({json})"),
            ),
            other => other,
        })
    }

    pub fn root_type(&self) -> &Arc<TypeNode> {
        &self.root_type
    }

    fn node(&self, frame: &Frame) -> QuarryResult<&DataNode> {
        self.nodes.get(frame.locator as usize).ok_or_else(|| {
            QuarryError::storage(
                StorageErrorKind::OutOfBoundsRead,
                format!("invalid data locator {}", frame.locator),
            )
        })
    }

    fn class_mismatch(frame: &Frame, expected: &str) -> QuarryError {
        QuarryError::invalid_type(format!(
            "cursor does not refer to {expected} (current type is {})",
            frame.node.type_class()
        ))
    }

    fn node_byte_size(&self, id: usize, node: &TypeNode) -> QuarryResult<u64> {
        let data = self.nodes.get(id).ok_or_else(|| {
            QuarryError::storage(
                StorageErrorKind::OutOfBoundsRead,
                format!("invalid data locator {id}"),
            )
        })?;
        match data {
            DataNode::Record { fields, .. } => {
                let types = node.record_fields()?;
                let mut total = 0;
                for (field, id) in types.iter().zip(fields) {
                    if let Some(id) = id {
                        total += self.node_byte_size(*id, &field.type_node)?;
                    }
                }
                Ok(total)
            }
            DataNode::Array { elements, .. } => {
                let base = node.array_base()?;
                let mut total = 0;
                for id in elements {
                    total += self.node_byte_size(*id, base)?;
                }
                Ok(total)
            }
            DataNode::Leaf(LeafValue::Text(text)) => Ok(text.len() as u64),
            DataNode::Leaf(LeafValue::Bytes(bytes)) | DataNode::Raw(bytes) => Ok(bytes.len() as u64),
            DataNode::Leaf(_) => Ok(node
                .storage_read_type()
                .and_then(|read_type| read_type.byte_size())
                .unwrap_or(0)),
            DataNode::Special { base } => match node.special_base() {
                Ok(base_type) => self.node_byte_size(*base, base_type),
                Err(_) => Ok(0),
            },
        }
    }
}

impl Product for MemoryProduct {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn product_class(&self) -> Option<&str> {
        self.product_class.as_deref()
    }

    fn product_type(&self) -> Option<&str> {
        self.product_type.as_deref()
    }

    fn product_version(&self) -> i32 {
        self.version
    }

    fn root(&self) -> Frame {
        Frame::new(Arc::clone(&self.root_type), -1, self.root as u64)
    }

    fn record_field(&self, record: &Frame, index: usize) -> QuarryResult<Frame> {
        let field = record.node.record_field(index)?;
        match self.node(record)? {
            DataNode::Record { fields, .. } => match fields.get(index).copied().flatten() {
                Some(id) => Ok(Frame::new(
                    Arc::clone(&field.type_node),
                    index as i64,
                    id as u64,
                )),
                None => Ok(Frame::new(
                    Arc::clone(&self.no_data.0),
                    index as i64,
                    self.no_data.1 as u64,
                )),
            },
            _ => Err(Self::class_mismatch(record, "a record")),
        }
    }

    fn record_field_available(&self, record: &Frame, index: usize) -> QuarryResult<bool> {
        match self.node(record)? {
            DataNode::Record { fields, .. } => Ok(matches!(fields.get(index), Some(Some(_)))),
            _ => Err(Self::class_mismatch(record, "a record")),
        }
    }

    fn array_dims(&self, array: &Frame) -> QuarryResult<Vec<usize>> {
        match self.node(array)? {
            DataNode::Array { dims, .. } => Ok(dims.clone()),
            _ => Err(Self::class_mismatch(array, "an array")),
        }
    }

    fn array_element(&self, array: &Frame, index: usize) -> QuarryResult<Frame> {
        let base = array.node.array_base()?;
        match self.node(array)? {
            DataNode::Array { elements, .. } => {
                let id = elements.get(index).ok_or_else(|| {
                    QuarryError::storage(
                        StorageErrorKind::ArrayOutOfBounds,
                        format!(
                            "array index ({index}) exceeds array range [0:{})",
                            elements.len()
                        ),
                    )
                })?;
                Ok(Frame::new(Arc::clone(base), index as i64, *id as u64))
            }
            _ => Err(Self::class_mismatch(array, "an array")),
        }
    }

    fn special_base(&self, special: &Frame) -> QuarryResult<Frame> {
        let base = special.node.special_base()?;
        match self.node(special)? {
            DataNode::Special { base: id } => {
                Ok(Frame::new(Arc::clone(base), special.index, *id as u64))
            }
            _ => Err(Self::class_mismatch(special, "a special type")),
        }
    }

    fn attributes(&self, frame: &Frame) -> QuarryResult<Frame> {
        if let (Some(attr_type), DataNode::Record {
            attributes: Some(id),
            ..
        }) = (&frame.node.attributes, self.node(frame)?)
        {
            return Ok(Frame::new(Arc::clone(attr_type), -1, *id as u64));
        }
        Ok(Frame::new(
            Arc::clone(&self.empty_record.0),
            -1,
            self.empty_record.1 as u64,
        ))
    }

    fn byte_size(&self, frame: &Frame) -> QuarryResult<u64> {
        self.node_byte_size(frame.locator as usize, &frame.node)
    }

    fn read_leaf(&self, frame: &Frame) -> QuarryResult<LeafValue> {
        match self.node(frame)? {
            DataNode::Leaf(value) => Ok(value.clone()),
            DataNode::Raw(bytes) => Ok(LeafValue::Bytes(bytes.clone())),
            _ => Err(QuarryError::invalid_type(format!(
                "cannot read {} data as a single value",
                frame.node.type_class()
            ))),
        }
    }

    fn read_bytes(&self, frame: &Frame, offset: u64, length: u64) -> QuarryResult<Vec<u8>> {
        let bytes: &[u8] = match self.node(frame)? {
            DataNode::Raw(bytes) | DataNode::Leaf(LeafValue::Bytes(bytes)) => bytes,
            DataNode::Leaf(LeafValue::Text(text)) => text.as_bytes(),
            _ => {
                return Err(QuarryError::invalid_type(format!(
                    "cannot read {} data as raw bytes",
                    frame.node.type_class()
                )))
            }
        };
        let end = offset.checked_add(length).unwrap_or(u64::MAX);
        if end > bytes.len() as u64 {
            return Err(QuarryError::storage(
                StorageErrorKind::OutOfBoundsRead,
                format!(
                    "trying to read {length} bytes at offset {offset} of a {} byte block",
                    bytes.len()
                ),
            ));
        }
        Ok(bytes[offset as usize..end as usize].to_vec())
    }
}
