//! IR Value Representations
//!
//! Defines values that can be used as operands in IR instructions,
//! including temporaries, constants, globals and function references.

use gpuc_common::TempId;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::IrType;

/// IR Value - represents operands in IR instructions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Temporary variable
    Temp(TempId),

    /// Constant integer
    Constant(i64),

    /// All-zero value of a type (zeroinitializer)
    Zero(IrType),

    /// Global symbol reference
    Global(String),

    /// Function reference
    Function(String),

    /// Undefined value
    Undef,
}

impl Value {
    pub fn as_temp(&self) -> Option<TempId> {
        match self {
            Value::Temp(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<i64> {
        match self {
            Value::Constant(val) => Some(*val),
            _ => None,
        }
    }

    /// Name of the callee when this value references a function
    pub fn as_function(&self) -> Option<&str> {
        match self {
            Value::Function(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Temp(id) => write!(f, "%{id}"),
            Value::Constant(val) => write!(f, "{val}"),
            Value::Zero(ty) => write!(f, "{ty} zeroinitializer"),
            Value::Global(name) => write!(f, "@{name}"),
            Value::Function(name) => write!(f, "@{name}"),
            Value::Undef => write!(f, "undef"),
        }
    }
}
