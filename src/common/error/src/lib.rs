//! Error types and result aliases for Quarry.
//!
//! Every error carries a stable numeric code so that it can be handed back
//! to a scripting host as an error value instead of being raised.

mod error;
#[cfg(feature = "python")]
pub mod python;

pub use error::{QuarryError, QuarryResult, StorageErrorKind, SUCCESS};
