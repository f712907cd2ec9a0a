//! Function Definitions
//!
//! Defines IR functions with their parameters and blocks, plus the
//! def-use queries passes need to rewrite a function in place.

use gpuc_common::TempId;
use serde::{Deserialize, Serialize};
use crate::{BasicBlock, Instruction, IrType, Value};

/// Function in IR. A function without blocks and with `is_external` set
/// is a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: IrType,
    pub parameters: Vec<(TempId, IrType)>,
    pub blocks: Vec<BasicBlock>,
    pub is_external: bool,
    pub is_vararg: bool,
}

impl Function {
    pub fn new(name: String, return_type: IrType) -> Self {
        Self {
            name,
            return_type,
            parameters: Vec::new(),
            blocks: Vec::new(),
            is_external: false,
            is_vararg: false,
        }
    }

    /// External declaration with positional parameter types
    pub fn declare(name: impl Into<String>, return_type: IrType, param_types: Vec<IrType>) -> Self {
        let mut function = Self::new(name.into(), return_type);
        function.is_external = true;
        for (id, ty) in param_types.into_iter().enumerate() {
            function.add_parameter(id as TempId, ty);
        }
        function
    }

    pub fn add_parameter(&mut self, param_id: TempId, param_type: IrType) {
        self.parameters.push((param_id, param_type));
    }

    pub fn add_block(&mut self, block: BasicBlock) {
        self.blocks.push(block);
    }

    pub fn is_declaration(&self) -> bool {
        self.is_external && self.blocks.is_empty()
    }

    /// Every instruction in block order
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }

    /// Instruction defining a temporary
    pub fn find_def(&self, temp: TempId) -> Option<&Instruction> {
        self.instructions().find(|inst| inst.result() == Some(temp))
    }

    /// Type of a temporary: a parameter's declared type or the result type
    /// of its defining instruction
    pub fn temp_type(&self, temp: TempId) -> Option<&IrType> {
        self.parameters
            .iter()
            .find(|(id, _)| *id == temp)
            .map(|(_, ty)| ty)
            .or_else(|| self.find_def(temp).and_then(Instruction::result_type))
    }

    /// First temporary id not used by any parameter or instruction result
    pub fn next_temp_id(&self) -> TempId {
        let params = self.parameters.iter().map(|(id, _)| *id);
        let results = self.instructions().filter_map(Instruction::result);
        params.chain(results).max().map_or(0, |max| max + 1)
    }

    /// Check if any instruction reads the temporary
    pub fn has_users(&self, temp: TempId) -> bool {
        self.instructions().any(|inst| inst.uses_temp(temp))
    }

    /// Rewrite every read of `old` to `new`, returning how many operands changed
    pub fn replace_uses(&mut self, old: TempId, new: &Value) -> usize {
        let mut replaced = 0;
        for block in &mut self.blocks {
            for inst in &mut block.instructions {
                for operand in inst.operands_mut() {
                    if *operand == Value::Temp(old) {
                        *operand = new.clone();
                        replaced += 1;
                    }
                }
            }
        }
        replaced
    }

    /// Remove the instruction defining a temporary
    pub fn remove_def(&mut self, temp: TempId) -> Option<Instruction> {
        for block in &mut self.blocks {
            if let Some(pos) = block.instructions.iter().position(|i| i.result() == Some(temp)) {
                return Some(block.instructions.remove(pos));
            }
        }
        None
    }
}
