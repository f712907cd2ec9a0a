//! Funnel shift left lowering
//!
//! `fshl(hi, lo, s)` concatenates `hi:lo`, shifts left by `s` modulo the
//! width and keeps the upper half. The target has no such instruction, so
//! each call becomes:
//!
//! ```text
//! %amt  = and  T %s, w-1
//! %down = sub  T w, %amt
//! %hi   = shl  T %hi, %amt
//! %lo   = lshr T %lo, %down
//! %res  = or   T %lo, %hi
//! ```

use gpuc_ir::{InstBuilder, IrBinaryOp, Module, Value};
use crate::rewrite::{self, lower_declarations, CallSite};
use crate::scanner::IntrinsicKind;
use crate::LoweringError;

const SUPPORTED_WIDTHS: [u32; 4] = [8, 16, 32, 64];

pub fn lower_funnel_shifts(module: &mut Module) -> Result<bool, LoweringError> {
    lower_declarations(module, IntrinsicKind::FunnelShift, |module, call, _| {
        lower_call(module, call)
    })
}

fn lower_call(module: &mut Module, call: CallSite) -> Result<(), LoweringError> {
    let ty = call.result_type.clone();
    let width = match ty.int_bits() {
        Some(bits) if SUPPORTED_WIDTHS.contains(&bits) => bits,
        _ => {
            return Err(LoweringError::UnsupportedWidth {
                function: call.function,
                callee: call.callee,
                ty,
            })
        }
    };
    let [hi, lo, shift] = <[Value; 3]>::try_from(call.args.clone())
        .map_err(|args| call.malformed(format!("expected 3 operands, found {}", args.len())))?;

    // Integer immediates are untyped and take the call's type
    for (operand, value) in call.args.iter().enumerate() {
        let operand_type = module.value_type(&module.functions[call.site.function], value);
        if let Some(operand_type) = operand_type.filter(|operand_type| *operand_type != ty) {
            return Err(call.malformed(format!("operand {operand} has type {operand_type}, expected {ty}")));
        }
    }

    let function = &mut module.functions[call.site.function];
    let mut builder = InstBuilder::for_function(function);
    let width = i64::from(width);

    // The shift amount is taken modulo the width
    let shift_amount = builder.build_binary(IrBinaryOp::And, shift, Value::Constant(width - 1), ty.clone());
    let down_amount = builder.build_binary(IrBinaryOp::Sub, Value::Constant(width), Value::Temp(shift_amount), ty.clone());
    let hi_bits = builder.build_binary(IrBinaryOp::Shl, hi, Value::Temp(shift_amount), ty.clone());
    let lo_bits = builder.build_binary(IrBinaryOp::LShr, lo, Value::Temp(down_amount), ty.clone());
    let combined = builder.build_binary(IrBinaryOp::Or, Value::Temp(lo_bits), Value::Temp(hi_bits), ty);

    if let Some(result) = call.result {
        function.replace_uses(result, &Value::Temp(combined));
    }
    rewrite::splice(module, call.site, builder.finish());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpuc_ir::{Function, Instruction, IrType};
    use pretty_assertions::assert_eq;

    fn module_with_fshl(ty: IrType) -> Module {
        let name = format!("llvm.fshl.{}", ty.mangle());
        let mut module = Module::new("fshl".to_string());
        module.add_function(Function::declare(name.clone(), ty.clone(), vec![ty.clone(); 3]));

        let mut kernel = Function::new("rotate".to_string(), ty.clone());
        for id in 0..3 {
            kernel.add_parameter(id, ty.clone());
        }
        let mut body = InstBuilder::for_function(&kernel);
        let args = vec![Value::Temp(0), Value::Temp(1), Value::Temp(2)];
        let rotated = body.build_call(Value::Function(name), args, ty);
        body.build_return(rotated.map(Value::Temp));
        kernel.add_block(body.into_block(0));
        module.add_function(kernel);
        module
    }

    #[test]
    fn test_lowered_sequence() {
        let mut module = module_with_fshl(IrType::I32);
        assert!(lower_funnel_shifts(&mut module).unwrap());

        assert_eq!(module.functions.len(), 1);
        let printed: Vec<String> = module.functions[0]
            .instructions()
            .map(|inst| inst.to_string())
            .collect();
        assert_eq!(
            printed,
            vec![
                "%4 = and i32 %2, 31".to_string(),
                "%5 = sub i32 32, %4".to_string(),
                "%6 = shl i32 %0, %4".to_string(),
                "%7 = lshr i32 %1, %5".to_string(),
                "%8 = or i32 %7, %6".to_string(),
                "ret %8".to_string(),
            ]
        );
    }

    #[test]
    fn test_unsupported_width_is_fatal() {
        let mut module = module_with_fshl(IrType::Int(24));
        let err = lower_funnel_shifts(&mut module).unwrap_err();
        assert_eq!(
            err,
            LoweringError::UnsupportedWidth {
                function: "rotate".to_string(),
                callee: "llvm.fshl.i24".to_string(),
                ty: IrType::Int(24),
            }
        );
    }

    #[test]
    fn test_operand_type_must_match_result_type() {
        let mut module = module_with_fshl(IrType::I32);
        module.functions[1].parameters[1].1 = IrType::I16;
        let err = lower_funnel_shifts(&mut module).unwrap_err();
        assert_eq!(
            err,
            LoweringError::MalformedCallSite {
                function: "rotate".to_string(),
                callee: "llvm.fshl.i32".to_string(),
                message: "operand 1 has type i16, expected i32".to_string(),
            }
        );
    }

    #[test]
    fn test_constant_shift_amount_is_accepted() {
        let mut module = module_with_fshl(IrType::I8);
        if let Instruction::Call { args, .. } = &mut module.functions[1].blocks[0].instructions[0] {
            args[2] = Value::Constant(3);
        }
        assert!(lower_funnel_shifts(&mut module).unwrap());
        let first = module.functions[0].instructions().next().map(|inst| inst.to_string());
        assert_eq!(first, Some("%4 = and i8 3, 7".to_string()));
    }

    #[test]
    fn test_wrong_operand_count_is_malformed() {
        let mut module = module_with_fshl(IrType::I16);
        if let Instruction::Call { args, .. } = &mut module.functions[1].blocks[0].instructions[0] {
            args.pop();
        }
        let err = lower_funnel_shifts(&mut module).unwrap_err();
        assert!(matches!(err, LoweringError::MalformedCallSite { .. }));
    }
}
