//! IR Operations
//!
//! Binary integer operations and their constant semantics on the target.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operations in IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrBinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    URem,
    And,
    Or,
    Xor,
    Shl,
    /// Logical shift right
    LShr,
}

fn width_mask(bits: u32) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}

impl IrBinaryOp {
    /// Evaluate on constant operands of the given bit width. Operands are
    /// truncated to the width first; the result is truncated as well.
    /// Shifting by the width or more yields 0. Division by zero has no value.
    pub fn fold(self, bits: u32, lhs: u64, rhs: u64) -> Option<u64> {
        let mask = width_mask(bits);
        let (lhs, rhs) = (lhs & mask, rhs & mask);
        let value = match self {
            IrBinaryOp::Add => lhs.wrapping_add(rhs),
            IrBinaryOp::Sub => lhs.wrapping_sub(rhs),
            IrBinaryOp::Mul => lhs.wrapping_mul(rhs),
            IrBinaryOp::UDiv => lhs.checked_div(rhs)?,
            IrBinaryOp::URem => lhs.checked_rem(rhs)?,
            IrBinaryOp::And => lhs & rhs,
            IrBinaryOp::Or => lhs | rhs,
            IrBinaryOp::Xor => lhs ^ rhs,
            IrBinaryOp::Shl if rhs >= u64::from(bits) => 0,
            IrBinaryOp::Shl => lhs << rhs,
            IrBinaryOp::LShr if rhs >= u64::from(bits) => 0,
            IrBinaryOp::LShr => lhs >> rhs,
        };
        Some(value & mask)
    }
}

impl fmt::Display for IrBinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            IrBinaryOp::Add => "add",
            IrBinaryOp::Sub => "sub",
            IrBinaryOp::Mul => "mul",
            IrBinaryOp::UDiv => "udiv",
            IrBinaryOp::URem => "urem",
            IrBinaryOp::And => "and",
            IrBinaryOp::Or => "or",
            IrBinaryOp::Xor => "xor",
            IrBinaryOp::Shl => "shl",
            IrBinaryOp::LShr => "lshr",
        };
        write!(f, "{op_str}")
    }
}
