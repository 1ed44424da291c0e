#![forbid(unsafe_code)]
//! Shared types for the scms workspace: error enums and algorithm identifiers.

mod algorithm;
mod error;

pub use algorithm::*;
pub use error::*;
