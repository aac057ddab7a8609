//! Materialization engine for Quarry.
//!
//! Resolves `(start, selectors...)` argument lists into positions inside
//! open products and turns the data found there into host values:
//!
//! - `registry`: slots of open products and their handles
//! - `resolve`: selector chains and wildcard deferral
//! - `classify` / `builder` / `materialize`: host types and values
//! - `multi`: expansion of wildcard selections
//! - `engine` / `dispatch`: the host-facing surface

pub mod builder;
pub mod classify;
pub mod dispatch;
pub mod engine;
pub mod materialize;
pub mod multi;
pub mod registry;
pub mod resolve;

pub use builder::StructCache;
pub use classify::{classify, Classification, LeafKind};
pub use dispatch::{routine, Routine, ROUTINES};
pub use engine::{is_error, is_no_data, Engine, NOT_AVAILABLE};
pub use multi::FillMode;
pub use registry::{ProductRegistry, NUM_PF_SLOTS};
pub use resolve::{Resolution, Selector, WildcardMode, WILDCARD};
