//! Table of open products.
//!
//! Products live in a fixed number of slots. Every successful open gets a
//! fresh handle chosen so that `(handle - 1) % NUM_PF_SLOTS` is the slot
//! index; a handle whose slot has since been reused no longer matches and
//! is rejected.

use std::sync::Arc;

use common_error::{QuarryError, QuarryResult};
use quarry_core::{DataHandle, Product, ProductHandle};

/// Number of products that can be open at the same time.
pub const NUM_PF_SLOTS: usize = 100;

#[derive(Debug)]
struct OpenProduct {
    handle: ProductHandle,
    product: Arc<dyn Product>,
}

#[derive(Debug)]
pub struct ProductRegistry {
    slots: Vec<Option<OpenProduct>>,
    counter: u64,
}

impl Default for ProductRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductRegistry {
    pub fn new() -> Self {
        Self {
            slots: (0..NUM_PF_SLOTS).map(|_| None).collect(),
            counter: 0,
        }
    }

    /// Open a product into the first free slot.
    ///
    /// `open` is only called when a slot is available; on failure the
    /// registry is left unchanged.
    pub fn insert_with<F>(&mut self, open: F) -> QuarryResult<ProductHandle>
    where
        F: FnOnce() -> QuarryResult<Arc<dyn Product>>,
    {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(QuarryError::MaxOpenFiles)?;
        let product = open()?;
        loop {
            self.counter += 1;
            if (self.counter - 1) % NUM_PF_SLOTS as u64 == slot as u64 {
                break;
            }
        }
        let handle = ProductHandle(self.counter);
        log::debug!(
            "opened {} as product {} in slot {}",
            product.filename(),
            handle,
            slot
        );
        self.slots[slot] = Some(OpenProduct { handle, product });
        Ok(handle)
    }

    fn slot_of(id: i64) -> QuarryResult<usize> {
        if id <= 0 {
            return Err(QuarryError::ProdIdNonPositive);
        }
        Ok(((id - 1) as u64 % NUM_PF_SLOTS as u64) as usize)
    }

    /// Look up a product by host-supplied id.
    pub fn get(&self, id: i64) -> QuarryResult<(ProductHandle, &Arc<dyn Product>)> {
        let slot = Self::slot_of(id)?;
        match &self.slots[slot] {
            Some(open) if open.handle.0 == id as u64 => Ok((open.handle, &open.product)),
            _ => Err(QuarryError::ProdIdNoGood),
        }
    }

    /// Check that a data handle still refers to the product it was made for.
    pub fn validate(&self, handle: &DataHandle) -> QuarryResult<()> {
        let id = i64::try_from(handle.product.0).map_err(|_| QuarryError::ProdIdNoGood)?;
        let (_, product) = self.get(id)?;
        if Arc::ptr_eq(product, handle.cursor.product()) {
            Ok(())
        } else {
            Err(QuarryError::ProdIdNoGood)
        }
    }

    pub fn remove(&mut self, id: i64) -> QuarryResult<Arc<dyn Product>> {
        self.get(id)?;
        let slot = Self::slot_of(id)?;
        match self.slots[slot].take() {
            Some(open) => {
                log::debug!("closed product {} in slot {}", open.handle, slot);
                Ok(open.product)
            }
            None => Err(QuarryError::ProdIdNoGood),
        }
    }

    /// Empty every slot, returning the products that were open.
    pub fn drain(&mut self) -> Vec<(ProductHandle, Arc<dyn Product>)> {
        self.slots
            .iter_mut()
            .filter_map(Option::take)
            .map(|open| (open.handle, open.product))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{Frame, LeafValue, TypeNode};

    #[derive(Debug)]
    struct EmptyProduct(Arc<TypeNode>);

    impl Product for EmptyProduct {
        fn filename(&self) -> &str {
            "empty"
        }
        fn product_class(&self) -> Option<&str> {
            None
        }
        fn product_type(&self) -> Option<&str> {
            None
        }
        fn product_version(&self) -> i32 {
            0
        }
        fn root(&self) -> Frame {
            Frame::new(Arc::clone(&self.0), -1, 0)
        }
        fn record_field(&self, _: &Frame, _: usize) -> QuarryResult<Frame> {
            Err(QuarryError::internal("no fields"))
        }
        fn record_field_available(&self, _: &Frame, _: usize) -> QuarryResult<bool> {
            Ok(false)
        }
        fn array_dims(&self, _: &Frame) -> QuarryResult<Vec<usize>> {
            Err(QuarryError::internal("no arrays"))
        }
        fn array_element(&self, _: &Frame, _: usize) -> QuarryResult<Frame> {
            Err(QuarryError::internal("no arrays"))
        }
        fn special_base(&self, _: &Frame) -> QuarryResult<Frame> {
            Err(QuarryError::internal("no specials"))
        }
        fn attributes(&self, frame: &Frame) -> QuarryResult<Frame> {
            Ok(frame.clone())
        }
        fn byte_size(&self, _: &Frame) -> QuarryResult<u64> {
            Ok(0)
        }
        fn read_leaf(&self, _: &Frame) -> QuarryResult<LeafValue> {
            Err(QuarryError::internal("no leaves"))
        }
        fn read_bytes(&self, _: &Frame, _: u64, _: u64) -> QuarryResult<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn open_empty() -> QuarryResult<Arc<dyn Product>> {
        Ok(Arc::new(EmptyProduct(Arc::new(TypeNode::record(Vec::new())))))
    }

    #[test]
    fn test_handles_map_to_slots() {
        let mut registry = ProductRegistry::new();
        assert_eq!(registry.insert_with(open_empty).unwrap(), ProductHandle(1));
        assert_eq!(registry.insert_with(open_empty).unwrap(), ProductHandle(2));
        registry.remove(1).unwrap();
        // slot 0 is reused with a new handle
        assert_eq!(registry.insert_with(open_empty).unwrap(), ProductHandle(101));
        assert_eq!(registry.get(1).unwrap_err().code(), -922);
        assert!(registry.get(101).is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_slots_exhausted() {
        let mut registry = ProductRegistry::new();
        for _ in 0..NUM_PF_SLOTS {
            registry.insert_with(open_empty).unwrap();
        }
        let err = registry.insert_with(open_empty).unwrap_err();
        assert_eq!(err.code(), -920);
    }

    #[test]
    fn test_failed_open_keeps_counter() {
        let mut registry = ProductRegistry::new();
        let err = registry
            .insert_with(|| Err(QuarryError::internal("boom")))
            .unwrap_err();
        assert_eq!(err.code(), -999);
        assert!(registry.is_empty());
        assert_eq!(registry.insert_with(open_empty).unwrap(), ProductHandle(1));
    }

    #[test]
    fn test_invalid_ids() {
        let registry = ProductRegistry::new();
        assert_eq!(registry.get(0).unwrap_err().code(), -923);
        assert_eq!(registry.get(-5).unwrap_err().code(), -923);
        assert_eq!(registry.get(7).unwrap_err().code(), -922);
    }

    #[test]
    fn test_drain() {
        let mut registry = ProductRegistry::new();
        registry.insert_with(open_empty).unwrap();
        registry.insert_with(open_empty).unwrap();
        assert_eq!(registry.drain().len(), 2);
        assert!(registry.is_empty());
    }
}
