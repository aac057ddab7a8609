//! Core data model for Quarry.
//!
//! This crate provides the types shared by every layer:
//! - `TypeNode` and friends describing the layout of a product
//! - `Product` and `Cursor` for navigating opened products
//! - `HostValue`, `NativeType` and `StructDef` for the host side
//! - shape and time helpers used during materialization

pub mod cursor;
pub mod schema;
pub mod shape;
pub mod time;
pub mod types;

#[cfg(test)]
mod proptest_utils;

// Re-export commonly used types
pub use cursor::{ArrayOrdering, Cursor, Frame, LeafValue, Product};
pub use schema::{
    Conversion, NativeReadType, RecordField, SpecialType, TypeClass, TypeKind, TypeNode,
};
pub use types::{
    ArrayData, DataHandle, ErrorValue, HostArray, HostValue, NativeType, PrimitiveType,
    ProductHandle, Scalar, StructDef, StructField, StructValue,
};
