//! Basic blocks

use gpuc_common::LabelId;
use serde::{Deserialize, Serialize};
use crate::Instruction;

/// Labelled instruction list. Passes address instructions by their index in
/// `instructions`; an index stays valid until something is spliced in or
/// out at or before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: LabelId,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(id: LabelId, instructions: Vec<Instruction>) -> Self {
        Self { id, instructions }
    }
}
