//! Product layout description.

mod type_node;

pub use type_node::{
    Conversion, NativeReadType, RecordField, SpecialType, TypeClass, TypeKind, TypeNode,
};
