//! Cursor-based navigation over opened products.

mod navigate;
mod product;
mod read;

pub use navigate::{Cursor, MAX_CURSOR_DEPTH};
pub use product::{Frame, LeafValue, Product};
pub use read::ArrayOrdering;
