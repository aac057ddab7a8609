//! Reading product data into host values.

use std::sync::Arc;

use common_config::EngineOptions;
use common_error::{QuarryError, QuarryResult};
use quarry_core::shape::host_dims;
use quarry_core::{
    ArrayData, ArrayOrdering, Cursor, DataHandle, HostArray, HostValue, NativeType, ProductHandle,
    StructValue,
};

use crate::builder::{included_fields, StructBuilder, StructCache};
use crate::classify::{classify, classify_cursor, element_type, Classification};

/// Turns the data under a cursor into a host value.
///
/// Structure layouts come from [`StructBuilder`]; both sides walk the same
/// filtered field list so every field lands in the slot its definition
/// assigned.
#[derive(Debug)]
pub struct Materializer<'a> {
    product: ProductHandle,
    options: EngineOptions,
    cache: &'a mut StructCache,
}

impl<'a> Materializer<'a> {
    pub fn new(product: ProductHandle, options: EngineOptions, cache: &'a mut StructCache) -> Self {
        Self {
            product,
            options,
            cache,
        }
    }

    pub fn materialize(&mut self, cursor: &Cursor) -> QuarryResult<HostValue> {
        match classify_cursor(cursor)? {
            Classification::Record => self.record(cursor),
            Classification::Array => self.array(cursor),
            Classification::Raw => self.raw(cursor),
            Classification::Leaf(kind) => Ok(kind
                .read(cursor, &self.options)?
                .map_or(HostValue::NoData, HostValue::Scalar)),
        }
    }

    fn record(&mut self, cursor: &Cursor) -> QuarryResult<HostValue> {
        let def = match StructBuilder::new(self.options, self.cache).record_type(cursor)? {
            NativeType::Struct(def) => def,
            _ => return Ok(HostValue::NoData),
        };
        let mut value = StructValue::allocate(Arc::clone(&def))?;
        self.fill_record(cursor, &mut value)?;
        Ok(HostValue::Struct(value))
    }

    fn fill_record(&mut self, cursor: &Cursor, value: &mut StructValue) -> QuarryResult<()> {
        let fields = included_fields(cursor, &self.options)?;
        if fields.len() != value.def().len() {
            return Err(QuarryError::internal(format!(
                "record has {} host fields but its structure defines {}",
                fields.len(),
                value.def().len()
            )));
        }
        for (slot, index) in fields.into_iter().enumerate() {
            let mut field_cursor = cursor.clone();
            field_cursor.goto_record_field_by_index(index)?;
            let field_value = self.materialize(&field_cursor)?;
            let target = value
                .field_at_mut(slot)
                .ok_or_else(|| QuarryError::internal(format!("no structure slot {slot}")))?;
            *target = field_value;
        }
        Ok(())
    }

    fn array(&mut self, cursor: &Cursor) -> QuarryResult<HostValue> {
        let natural = cursor.array_dims()?;
        if natural.contains(&0) {
            return Ok(HostValue::NoData);
        }
        let dims = host_dims(&natural, self.options.swap_dimensions);
        let ordering = if self.options.swap_dimensions {
            ArrayOrdering::Fortran
        } else {
            ArrayOrdering::C
        };
        let storage = cursor.options();
        let base = Arc::clone(cursor.type_node().array_base()?);
        let native_type = element_type(&base, &storage)?;
        let count = quarry_core::shape::num_elements(&dims);
        let mut data = ArrayData::zeroed(&native_type, count)?;

        match classify(&base, &storage)? {
            Classification::Leaf(kind) => {
                if native_type == NativeType::NoData {
                    return Ok(HostValue::Array(HostArray::new(dims, data)?));
                }
                let options = self.options;
                let values = cursor.read_array(ordering, |element| kind.read(element, &options))?;
                for (position, value) in values.into_iter().enumerate() {
                    if let Some(scalar) = value {
                        data.set(position, scalar)?;
                    }
                }
            }
            Classification::Record | Classification::Array | Classification::Raw => {
                let cursors = cursor.read_array(ordering, |element| Ok(Some(element.clone())))?;
                for (position, element) in cursors.into_iter().enumerate() {
                    if let Some(element) = element {
                        data.set_handle(position, DataHandle::new(self.product, element))?;
                    }
                }
            }
        }
        log::debug!(
            "materialized {} array with host dims {:?}",
            data.type_name(),
            dims
        );
        Ok(HostValue::Array(HostArray::new(dims, data)?))
    }

    fn raw(&mut self, cursor: &Cursor) -> QuarryResult<HostValue> {
        let size = cursor.byte_size()?;
        if size == 0 {
            return Ok(HostValue::NoData);
        }
        let bytes = cursor.read_bytes(0, size)?;
        let array = HostArray::new(vec![bytes.len()], ArrayData::Byte(bytes))?;
        Ok(HostValue::Array(array))
    }
}
