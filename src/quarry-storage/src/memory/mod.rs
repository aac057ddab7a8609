//! In-memory products loaded from JSON descriptions.

mod data;
mod definition;
mod product;

pub use data::ATTRIBUTES_KEY;
pub use definition::{FieldDefinition, KindDefinition, ProductDescription, TypeDefinition};
pub use product::MemoryProduct;
