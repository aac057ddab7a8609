//! Storage layer for Quarry.
//!
//! - `memory`: products held in memory, loaded from JSON descriptions
//! - `opener`: the [`ProductOpener`] seam used by the engine
//! - `expr`: expressions evaluated against product cursors

pub mod expr;
pub mod memory;
pub mod opener;

pub use expr::{ExprType, Expression};
pub use memory::{MemoryProduct, ProductDescription, ATTRIBUTES_KEY};
pub use opener::{JsonOpener, ProductOpener};
