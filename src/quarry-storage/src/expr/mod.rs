//! A small expression language over product nodes.
//!
//! Expressions combine literals, arithmetic, comparisons and boolean logic
//! with node paths such as `/measurements[2]/value` or `../header@`.

mod eval;
mod lexer;
mod parser;

pub use eval::Expression;
pub use parser::ExprType;
