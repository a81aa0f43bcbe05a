//! Models Module - Data Structures & Errors
//!
//! Single source of truth for domain records and the error type.
//! No hardcoded values outside this module and `config`.

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
