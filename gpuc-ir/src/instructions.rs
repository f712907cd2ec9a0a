//! IR Instructions
//!
//! Defines all instruction types available in the IR.

use gpuc_common::{TempId, LabelId};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::{Value, IrType, IrBinaryOp};

/// IR Instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Binary operation: result = op lhs, rhs
    Binary {
        result: TempId,
        op: IrBinaryOp,
        lhs: Value,
        rhs: Value,
        result_type: IrType,
    },

    /// Load from memory: result = load ptr
    Load {
        result: TempId,
        ptr: Value,
        result_type: IrType,
    },

    /// Store to memory: store value, ptr
    Store {
        value: Value,
        ptr: Value,
    },

    /// Get element pointer: result = getelementptr ptr, indices...
    /// The first index steps over the pointer itself, every further index
    /// selects a field, array element or vector lane.
    GetElementPtr {
        result: TempId,
        ptr: Value,
        indices: Vec<Value>,
        result_type: IrType,     // Type of the result pointer
    },

    /// Allocate stack memory: result = alloca type
    Alloca {
        result: TempId,
        alloc_type: IrType,
        result_type: IrType, // Always pointer type
    },

    /// Function call: result = call func(args...)
    Call {
        result: Option<TempId>,
        function: Value,
        args: Vec<Value>,
        result_type: IrType,
        /// Alignment attribute of the pointer arguments (memory intrinsics)
        #[serde(default)]
        align: Option<u64>,
    },

    /// Type cast: result = cast value to target_type.
    /// Between two pointer types this reinterprets the pointee without
    /// changing the address.
    Cast {
        result: TempId,
        value: Value,
        target_type: IrType,
    },

    /// Return: ret value or ret void
    Return(Option<Value>),

    /// Unconditional branch: br label
    Branch(LabelId),

    /// Conditional branch: br condition, true_label, false_label
    BranchCond {
        condition: Value,
        true_label: LabelId,
        false_label: LabelId,
    },

    /// Comment (for debugging)
    Comment(String),
}

impl Instruction {
    /// Temporary defined by this instruction, if any
    pub fn result(&self) -> Option<TempId> {
        match self {
            Instruction::Binary { result, .. }
            | Instruction::Load { result, .. }
            | Instruction::GetElementPtr { result, .. }
            | Instruction::Alloca { result, .. }
            | Instruction::Cast { result, .. } => Some(*result),
            Instruction::Call { result, .. } => *result,
            _ => None,
        }
    }

    /// Type of the temporary defined by this instruction
    pub fn result_type(&self) -> Option<&IrType> {
        match self {
            Instruction::Binary { result_type, .. }
            | Instruction::Load { result_type, .. }
            | Instruction::GetElementPtr { result_type, .. }
            | Instruction::Alloca { result_type, .. } => Some(result_type),
            Instruction::Call { result: Some(_), result_type, .. } => Some(result_type),
            Instruction::Cast { target_type, .. } => Some(target_type),
            _ => None,
        }
    }

    /// Name of the called function for direct calls
    pub fn callee(&self) -> Option<&str> {
        match self {
            Instruction::Call { function, .. } => function.as_function(),
            _ => None,
        }
    }

    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Instruction::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::Load { ptr, .. } => vec![ptr],
            Instruction::Store { value, ptr } => vec![value, ptr],
            Instruction::GetElementPtr { ptr, indices, .. } => {
                std::iter::once(ptr).chain(indices.iter()).collect()
            }
            Instruction::Call { function, args, .. } => {
                std::iter::once(function).chain(args.iter()).collect()
            }
            Instruction::Cast { value, .. } => vec![value],
            Instruction::Return(Some(value)) => vec![value],
            Instruction::BranchCond { condition, .. } => vec![condition],
            Instruction::Alloca { .. }
            | Instruction::Return(None)
            | Instruction::Branch(_)
            | Instruction::Comment(_) => Vec::new(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            Instruction::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::Load { ptr, .. } => vec![ptr],
            Instruction::Store { value, ptr } => vec![value, ptr],
            Instruction::GetElementPtr { ptr, indices, .. } => {
                std::iter::once(ptr).chain(indices.iter_mut()).collect()
            }
            Instruction::Call { function, args, .. } => {
                std::iter::once(function).chain(args.iter_mut()).collect()
            }
            Instruction::Cast { value, .. } => vec![value],
            Instruction::Return(Some(value)) => vec![value],
            Instruction::BranchCond { condition, .. } => vec![condition],
            Instruction::Alloca { .. }
            | Instruction::Return(None)
            | Instruction::Branch(_)
            | Instruction::Comment(_) => Vec::new(),
        }
    }

    /// Check if any operand reads the given temporary
    pub fn uses_temp(&self, temp: TempId) -> bool {
        self.operands().into_iter().any(|v| *v == Value::Temp(temp))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary { result, op, lhs, rhs, result_type } => {
                write!(f, "%{result} = {op} {result_type} {lhs}, {rhs}")
            }
            Instruction::Load { result, ptr, result_type } => {
                write!(f, "%{result} = load {result_type}, {result_type}* {ptr}")
            }
            Instruction::Store { value, ptr } => write!(f, "store {value}, {ptr}"),
            Instruction::GetElementPtr { result, ptr, indices, result_type } => {
                write!(f, "%{result} = getelementptr {ptr}")?;
                for index in indices {
                    write!(f, ", {index}")?;
                }
                write!(f, " ; {result_type}")
            }
            Instruction::Alloca { result, alloc_type, .. } => {
                write!(f, "%{result} = alloca {alloc_type}")
            }
            Instruction::Call { result, function, args, align, .. } => {
                if let Some(result) = result {
                    write!(f, "%{result} = ")?;
                }
                write!(f, "call {function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")?;
                if let Some(align) = align {
                    write!(f, " align {align}")?;
                }
                Ok(())
            }
            Instruction::Cast { result, value, target_type } => {
                write!(f, "%{result} = cast {value} to {target_type}")
            }
            Instruction::Return(Some(value)) => write!(f, "ret {value}"),
            Instruction::Return(None) => write!(f, "ret void"),
            Instruction::Branch(label) => write!(f, "br label %{label}"),
            Instruction::BranchCond { condition, true_label, false_label } => {
                write!(f, "br {condition}, label %{true_label}, label %{false_label}")
            }
            Instruction::Comment(text) => write!(f, "; {text}"),
        }
    }
}
