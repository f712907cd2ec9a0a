//! Target Data Layout
//!
//! Sizes and alignments of IR types on the GPU target. Integers occupy
//! the smallest whole number of bytes and are aligned to that size rounded
//! up to a power of two (at most 8). Aggregates use natural C layout.

use serde::{Deserialize, Serialize};
use crate::IrType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLayout {
    pub pointer_size_bits: u32,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self { pointer_size_bits: 64 }
    }
}

fn round_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

impl DataLayout {
    pub fn new(pointer_size_bits: u32) -> Self {
        Self { pointer_size_bits }
    }

    /// Size in bits as seen when comparing storage. Scalars and vectors
    /// report their exact width, arrays and structs include padding.
    pub fn size_in_bits(&self, ty: &IrType) -> Option<u64> {
        match ty {
            IrType::Int(bits) => Some(u64::from(*bits)),
            IrType::Ptr(_) => Some(u64::from(self.pointer_size_bits)),
            IrType::Vector { lanes, element_type } => {
                Some(u64::from(*lanes) * self.size_in_bits(element_type)?)
            }
            IrType::Array { .. } | IrType::Struct { .. } => Some(self.store_size(ty)? * 8),
            IrType::Void | IrType::Function { .. } => None,
        }
    }

    /// Bytes written by a store of this type, without tail padding
    pub fn store_size(&self, ty: &IrType) -> Option<u64> {
        match ty {
            IrType::Int(bits) => Some(u64::from(*bits).div_ceil(8)),
            IrType::Ptr(_) => Some(u64::from(self.pointer_size_bits).div_ceil(8)),
            IrType::Vector { .. } => Some(self.size_in_bits(ty)?.div_ceil(8)),
            IrType::Array { size, element_type } => Some(self.alloc_size(element_type)? * size),
            IrType::Struct { fields, packed, .. } => {
                let mut offset = 0;
                let mut struct_align = 1;
                for field in fields {
                    let align = if *packed { 1 } else { self.abi_align(field)? };
                    offset = round_up(offset, align) + self.alloc_size(field)?;
                    struct_align = struct_align.max(align);
                }
                Some(round_up(offset, struct_align))
            }
            IrType::Void | IrType::Function { .. } => None,
        }
    }

    /// Distance in bytes between consecutive elements of this type
    pub fn alloc_size(&self, ty: &IrType) -> Option<u64> {
        Some(round_up(self.store_size(ty)?, self.abi_align(ty)?))
    }

    /// Required ABI alignment in bytes
    pub fn abi_align(&self, ty: &IrType) -> Option<u64> {
        match ty {
            IrType::Int(_) | IrType::Ptr(_) => {
                let size = self.store_size(ty)?.max(1);
                Some(size.next_power_of_two().min(8))
            }
            IrType::Vector { .. } => Some(self.store_size(ty)?.max(1).next_power_of_two()),
            IrType::Array { element_type, .. } => self.abi_align(element_type),
            IrType::Struct { fields, packed, .. } => {
                if *packed {
                    return Some(1);
                }
                let mut align = 1;
                for field in fields {
                    align = align.max(self.abi_align(field)?);
                }
                Some(align)
            }
            IrType::Void | IrType::Function { .. } => None,
        }
    }
}
