//! Host type system and runtime values.

mod handle;
mod native;
mod value;

pub use handle::{DataHandle, ProductHandle};
pub use native::{NativeType, PrimitiveType, StructDef, StructField};
pub use value::{ArrayData, ErrorValue, HostArray, HostValue, Scalar, StructValue};
