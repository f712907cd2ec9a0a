//! Instruction Builder
//!
//! Provides utilities for constructing instruction sequences. Passes use
//! it to build replacement code that is spliced into an existing block,
//! so it only owns a temp counter and an output buffer.

use gpuc_common::{TempId, LabelId};
use crate::{BasicBlock, Function, Instruction, IrBinaryOp, IrType, Value};

/// Builder for constructing straight-line IR
pub struct InstBuilder {
    next_temp_id: TempId,
    instructions: Vec<Instruction>,
}

impl InstBuilder {
    pub fn new(next_temp_id: TempId) -> Self {
        Self {
            next_temp_id,
            instructions: Vec::new(),
        }
    }

    /// Builder whose fresh temporaries do not collide with `function`'s
    pub fn for_function(function: &Function) -> Self {
        Self::new(function.next_temp_id())
    }

    pub fn new_temp(&mut self) -> TempId {
        let temp = self.next_temp_id;
        self.next_temp_id += 1;
        temp
    }

    pub fn build_binary(&mut self, op: IrBinaryOp, lhs: Value, rhs: Value, result_type: IrType) -> TempId {
        let result = self.new_temp();
        self.instructions.push(Instruction::Binary { result, op, lhs, rhs, result_type });
        result
    }

    pub fn build_load(&mut self, ptr: Value, result_type: IrType) -> TempId {
        let result = self.new_temp();
        self.instructions.push(Instruction::Load { result, ptr, result_type });
        result
    }

    pub fn build_store(&mut self, value: Value, ptr: Value) {
        self.instructions.push(Instruction::Store { value, ptr });
    }

    pub fn build_alloca(&mut self, alloc_type: IrType) -> Value {
        let result = self.new_temp();
        let result_type = IrType::ptr(alloc_type.clone());
        self.instructions.push(Instruction::Alloca { result, alloc_type, result_type });
        Value::Temp(result)
    }

    pub fn build_cast(&mut self, value: Value, target_type: IrType) -> Value {
        let result = self.new_temp();
        self.instructions.push(Instruction::Cast { result, value, target_type });
        Value::Temp(result)
    }

    /// Element-indexed address computation; `result_type` is the pointer
    /// type of the addressed element
    pub fn build_gep(&mut self, ptr: Value, indices: Vec<Value>, result_type: IrType) -> Value {
        let result = self.new_temp();
        self.instructions.push(Instruction::GetElementPtr { result, ptr, indices, result_type });
        Value::Temp(result)
    }

    pub fn build_call(&mut self, function: Value, args: Vec<Value>, result_type: IrType) -> Option<TempId> {
        self.build_call_aligned(function, args, result_type, None)
    }

    pub fn build_call_aligned(
        &mut self,
        function: Value,
        args: Vec<Value>,
        result_type: IrType,
        align: Option<u64>,
    ) -> Option<TempId> {
        let result = if matches!(result_type, IrType::Void) {
            None
        } else {
            Some(self.new_temp())
        };
        self.instructions.push(Instruction::Call { result, function, args, result_type, align });
        result
    }

    pub fn build_return(&mut self, value: Option<Value>) {
        self.instructions.push(Instruction::Return(value));
    }

    pub fn finish(self) -> Vec<Instruction> {
        self.instructions
    }

    /// Wrap the built instructions into a basic block
    pub fn into_block(self, id: LabelId) -> BasicBlock {
        BasicBlock::new(id, self.instructions)
    }
}
