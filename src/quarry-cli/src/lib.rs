//! Helpers behind the `quarry` command-line tool.
//!
//! The binary turns command-line words into host values, runs them through
//! an [`Engine`](quarry_engine::Engine) and prints the results as JSON.

pub mod output;
pub mod selectors;

pub use output::{product_info, render};
pub use selectors::{parse_option, parse_selector, parse_selectors};
