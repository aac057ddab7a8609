//! Cursor positioning.

use std::fmt;
use std::sync::Arc;

use common_config::StorageOptions;
use common_error::{ensure, storage_err, QuarryResult};

use super::product::{Frame, Product};
use crate::schema::{NativeReadType, SpecialType, TypeClass, TypeKind, TypeNode};

/// Deepest nesting a cursor may reach.
pub const MAX_CURSOR_DEPTH: usize = 32;

/// A position inside an opened product.
///
/// Cursors are cheap to clone; a clone is fully independent of the
/// original. With special types disabled a cursor never rests on a special
/// node, it is moved onto the node's base data instead.
#[derive(Clone)]
pub struct Cursor {
    product: Arc<dyn Product>,
    parents: Vec<Frame>,
    current: Frame,
    options: StorageOptions,
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<i64> = self
            .parents
            .iter()
            .skip(1)
            .chain(std::iter::once(&self.current))
            .map(|frame| frame.index)
            .collect();
        f.debug_struct("Cursor")
            .field("product", &self.product.filename())
            .field("depth", &self.depth())
            .field("path", &path)
            .field("class", &self.type_class())
            .finish()
    }
}

impl Cursor {
    /// Cursor positioned at the root of a product.
    pub fn new(product: Arc<dyn Product>, options: StorageOptions) -> QuarryResult<Self> {
        let root = product.root();
        let mut cursor = Self {
            product,
            parents: Vec::new(),
            current: root.clone(),
            options,
        };
        cursor.current = cursor.bypass(root)?;
        Ok(cursor)
    }

    pub fn product(&self) -> &Arc<dyn Product> {
        &self.product
    }

    pub fn options(&self) -> StorageOptions {
        self.options
    }

    /// Replace the read options, re-applying the special-type bypass to the
    /// current position.
    pub fn set_options(&mut self, options: StorageOptions) -> QuarryResult<()> {
        self.options = options;
        let current = self.current.clone();
        let resolved = self.bypass(current)?;
        if resolved != self.current {
            let previous = std::mem::replace(&mut self.current, resolved);
            self.parents.push(previous);
        }
        Ok(())
    }

    /// Number of frames from the root to the current position.
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    pub fn frame(&self) -> &Frame {
        &self.current
    }

    pub fn type_node(&self) -> &Arc<TypeNode> {
        &self.current.node
    }

    pub fn type_class(&self) -> TypeClass {
        self.current.node.type_class()
    }

    pub fn read_type(&self) -> Option<NativeReadType> {
        self.current.node.read_type(self.options.perform_conversions)
    }

    pub fn special_type(&self) -> QuarryResult<SpecialType> {
        self.current.node.special_type()
    }

    /// Index of the current node within its parent.
    pub fn index(&self) -> i64 {
        self.current.index
    }

    fn bypass(&self, mut frame: Frame) -> QuarryResult<Frame> {
        if self.options.use_special_types {
            return Ok(frame);
        }
        while frame.node.type_class() == TypeClass::Special {
            frame = self.product.special_base(&frame)?;
        }
        Ok(frame)
    }

    fn push(&mut self, frame: Frame) -> QuarryResult<()> {
        ensure!(
            self.parents.len() + 1 < MAX_CURSOR_DEPTH,
            InvalidArgument: "maximum cursor depth ({}) reached", MAX_CURSOR_DEPTH
        );
        let frame = self.bypass(frame)?;
        let previous = std::mem::replace(&mut self.current, frame);
        self.parents.push(previous);
        log::debug!(
            "cursor entered {} node at depth {}",
            self.current.node.type_class().name(),
            self.parents.len()
        );
        Ok(())
    }

    fn replace(&mut self, frame: Frame) -> QuarryResult<()> {
        self.current = self.bypass(frame)?;
        Ok(())
    }

    /// Step to a special node's base data regardless of the bypass option.
    pub(crate) fn goto_special_base(&mut self) -> QuarryResult<()> {
        let base = self.product.special_base(&self.current)?;
        let previous = std::mem::replace(&mut self.current, base);
        self.parents.push(previous);
        Ok(())
    }

    pub fn goto_parent(&mut self) -> QuarryResult<()> {
        match self.parents.pop() {
            Some(parent) => {
                self.current = parent;
                // skip over special nodes the bypass stepped through
                while !self.options.use_special_types
                    && self.current.node.type_class() == TypeClass::Special
                {
                    match self.parents.pop() {
                        Some(parent) => self.current = parent,
                        None => break,
                    }
                }
                log::debug!("cursor returned to depth {}", self.parents.len());
                Ok(())
            }
            None => storage_err!(NoParent: "cursor has no parent"),
        }
    }

    pub fn goto_root(&mut self) -> QuarryResult<()> {
        self.parents.clear();
        let root = self.product.root();
        self.current = self.bypass(root)?;
        Ok(())
    }

    pub fn num_record_fields(&self) -> QuarryResult<usize> {
        self.current.node.num_record_fields()
    }

    pub fn record_field_index(&self, name: &str) -> QuarryResult<usize> {
        self.current.node.record_field_index(name)
    }

    pub fn record_field_available(&self, index: usize) -> QuarryResult<bool> {
        self.current.node.record_field(index)?;
        self.product.record_field_available(&self.current, index)
    }

    pub fn goto_record_field_by_index(&mut self, index: usize) -> QuarryResult<()> {
        self.current.node.record_field(index)?;
        let frame = self.product.record_field(&self.current, index)?;
        self.push(frame)
    }

    pub fn goto_record_field_by_name(&mut self, name: &str) -> QuarryResult<()> {
        let index = self.current.node.record_field_index(name)?;
        self.goto_record_field_by_index(index)
    }

    pub fn goto_first_record_field(&mut self) -> QuarryResult<()> {
        self.goto_record_field_by_index(0)
    }

    /// Move to the next sibling field of the record this cursor sits in.
    pub fn goto_next_record_field(&mut self) -> QuarryResult<()> {
        let parent = match self.parents.last() {
            Some(parent) => parent.clone(),
            None => storage_err!(NoParent: "cursor has no parent"),
        };
        let next = usize::try_from(self.current.index + 1).unwrap_or(0);
        parent.node.record_field(next)?;
        let frame = self.product.record_field(&parent, next)?;
        self.replace(frame)
    }

    /// Actual extents of the array at the cursor.
    pub fn array_dims(&self) -> QuarryResult<Vec<usize>> {
        match &self.current.node.kind {
            TypeKind::Array { .. } => self.product.array_dims(&self.current),
            _ => Err(common_error::QuarryError::invalid_type(format!(
                "cursor does not refer to an array (current type is {})",
                self.type_class()
            ))),
        }
    }

    /// Number of elements: array length, record field count, or 1 for leaves.
    pub fn num_elements(&self) -> QuarryResult<usize> {
        match &self.current.node.kind {
            TypeKind::Array { .. } => Ok(crate::shape::num_elements(&self.array_dims()?)),
            TypeKind::Record { fields } => Ok(fields.len()),
            _ => Ok(1),
        }
    }

    /// Move to the element with the given row-major subscripts.
    pub fn goto_array_element(&mut self, subscripts: &[i64]) -> QuarryResult<()> {
        let dims = self.array_dims()?;
        ensure!(
            subscripts.len() == dims.len(),
            ArrayNumDimsMismatch: "number of dimensions argument ({}) does not match rank of array ({})",
            subscripts.len(),
            dims.len()
        );
        let mut linear: i64 = 0;
        for (&sub, &extent) in subscripts.iter().zip(&dims) {
            if self.options.perform_boundary_checks {
                ensure!(
                    sub >= 0 && (sub as usize) < extent,
                    ArrayOutOfBounds: "array index ({}) exceeds array range [0:{})", sub, extent
                );
            }
            linear = linear * extent as i64 + sub;
        }
        self.goto_linear(linear, crate::shape::num_elements(&dims))
    }

    /// Move to the element at a row-major linear index, whatever the rank.
    pub fn goto_array_element_by_index(&mut self, index: i64) -> QuarryResult<()> {
        let count = self.num_elements_of_array()?;
        self.goto_linear(index, count)
    }

    fn num_elements_of_array(&self) -> QuarryResult<usize> {
        Ok(crate::shape::num_elements(&self.array_dims()?))
    }

    fn goto_linear(&mut self, index: i64, count: usize) -> QuarryResult<()> {
        ensure!(
            index >= 0 && (index as usize) < count,
            ArrayOutOfBounds: "array index ({}) exceeds array range [0:{})", index, count
        );
        log::debug!("cursor moving to array element {} of {}", index, count);
        let frame = self.product.array_element(&self.current, index as usize)?;
        self.push(frame)
    }

    pub fn goto_first_array_element(&mut self) -> QuarryResult<()> {
        self.goto_array_element_by_index(0)
    }

    /// Move to the next element of the array this cursor sits in.
    pub fn goto_next_array_element(&mut self) -> QuarryResult<()> {
        let parent = match self.parents.last() {
            Some(parent) => parent.clone(),
            None => storage_err!(NoParent: "cursor has no parent"),
        };
        let count = crate::shape::num_elements(&self.product.array_dims(&parent)?);
        let next = self.current.index + 1;
        ensure!(
            next >= 0 && (next as usize) < count,
            ArrayOutOfBounds: "array index ({}) exceeds array range [0:{})", next, count
        );
        let frame = self.product.array_element(&parent, next as usize)?;
        self.replace(frame)
    }

    pub fn goto_attributes(&mut self) -> QuarryResult<()> {
        let frame = self.product.attributes(&self.current)?;
        self.push(frame)
    }

    pub fn byte_size(&self) -> QuarryResult<u64> {
        self.product.byte_size(&self.current)
    }
}
