//! Product identifiers and data handles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;

/// Identifier of an opened product, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductHandle(pub u64);

impl fmt::Display for ProductHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A saved position that a host can pass back later.
///
/// The handle records which product it belongs to so that it can be
/// checked against the open-product registry before use.
#[derive(Debug, Clone)]
pub struct DataHandle {
    pub product: ProductHandle,
    pub cursor: Cursor,
}

impl DataHandle {
    pub fn new(product: ProductHandle, cursor: Cursor) -> Self {
        Self { product, cursor }
    }
}

impl PartialEq for DataHandle {
    fn eq(&self, other: &Self) -> bool {
        self.product == other.product
            && self.cursor.depth() == other.cursor.depth()
            && self.cursor.frame() == other.cursor.frame()
    }
}
