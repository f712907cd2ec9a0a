//! GPU target compiler - Common Types and Errors
//!
//! This crate contains identifiers and the pipeline-wide error type
//! shared by the IR and the lowering passes.

pub mod error;
pub mod types;

pub use error::CompilerError;
pub use types::*;
