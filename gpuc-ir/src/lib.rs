//! Typed Intermediate Representation for the GPU target compiler
//!
//! The IR is produced by the frontend and rewritten by target lowering
//! passes before the final emitter runs.
//!
//! ## Architecture
//!
//! The crate is structured as follows:
//! - `types` - Type system (IrType)
//! - `layout` - Target sizes and alignments (DataLayout)
//! - `values` - Value representations
//! - `ops` - Binary operations and their constant semantics
//! - `instructions` - IR instructions
//! - `blocks` - Basic block management
//! - `function` - Function definitions and value typing
//! - `module` - Module and global variables
//! - `builder` - Instruction construction utilities

// Public exports - clean API surface
pub use self::types::IrType;
pub use self::layout::DataLayout;
pub use self::values::Value;
pub use self::ops::IrBinaryOp;
pub use self::instructions::Instruction;
pub use self::blocks::BasicBlock;
pub use self::function::Function;
pub use self::module::{Module, GlobalVariable, Linkage};
pub use self::builder::InstBuilder;

pub use gpuc_common::{LabelId, TempId};

// Internal modules
mod types;
mod layout;
mod values;
mod ops;
mod instructions;
mod blocks;
mod function;
mod module;
mod builder;
