//! Intrinsic lowering error types
//!
//! Every variant is an internal invariant violation: the frontend produced
//! IR this lowering cannot express on the target. None are recoverable.

use gpuc_common::CompilerError;
use gpuc_ir::{IrType, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoweringError {
    #[error("Invalid integer width {ty} in call to '{callee}' in '{function}'")]
    UnsupportedWidth {
        function: String,
        callee: String,
        ty: IrType,
    },

    #[error("Unhandled call to '{callee}' in '{function}' with non-zero fill value {value}")]
    UnsupportedFillValue {
        function: String,
        callee: String,
        value: Value,
    },

    #[error("{bytes} bytes in call to '{callee}' in '{function}' can't be divided evenly into {element} elements of {element_size} bytes")]
    UnevenDivision {
        function: String,
        callee: String,
        bytes: u64,
        element: IrType,
        element_size: u64,
    },

    #[error("Don't know how to unpack types for call to '{callee}' in '{function}': got to {dest} vs {src}")]
    UnsupportedTypeShape {
        function: String,
        callee: String,
        dest: IrType,
        src: IrType,
    },

    #[error("Alignment {align} of call to '{callee}' in '{function}' is not a multiple of the {required}-byte alignment of {element}")]
    MisalignedCopy {
        function: String,
        callee: String,
        align: u64,
        element: IrType,
        required: u64,
    },

    #[error("Operand {operand} of call to '{callee}' in '{function}' is not a pointer reinterpretation cast")]
    MissingReinterpretCast {
        function: String,
        callee: String,
        operand: usize,
    },

    #[error("Operand {operand} of call to '{callee}' in '{function}' must be an integer constant, got {value}")]
    NonConstantOperand {
        function: String,
        callee: String,
        operand: usize,
        value: Value,
    },

    #[error("{count} elements in call to '{callee}' in '{function}' do not fit a 32-bit element index")]
    TooManyElements {
        function: String,
        callee: String,
        count: u64,
    },

    #[error("Malformed call to '{callee}' in '{function}': {message}")]
    MalformedCallSite {
        function: String,
        callee: String,
        message: String,
    },

    #[error("'{name}' is still referenced after intrinsic lowering")]
    ResidualIntrinsic { name: String },
}

impl From<LoweringError> for CompilerError {
    fn from(err: LoweringError) -> Self {
        CompilerError::internal(crate::ReplaceIntrinsicsPass::NAME, err.to_string())
    }
}
