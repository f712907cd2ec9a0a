//! Zero-fill lowering
//!
//! `memset(dst, 0, n, volatile)` becomes `n / sizeof(E)` stores of a zero
//! `E`, where `E` is the pointee type of `dst` before any reinterpretation
//! cast. Fills with any other value are not expected from the frontend.

use gpuc_ir::{InstBuilder, IrType, Module, Value};
use log::trace;
use crate::rewrite::{self, lower_declarations, reinterpret_source, CallSite, DeadCasts};
use crate::scanner::IntrinsicKind;
use crate::LoweringError;

pub fn lower_zero_fills(module: &mut Module) -> Result<bool, LoweringError> {
    lower_declarations(module, IntrinsicKind::BlockFill, lower_call)
}

fn lower_call(module: &mut Module, call: CallSite, dead_casts: &mut DeadCasts) -> Result<(), LoweringError> {
    let fill = call.arg(1)?;
    let zero = match fill {
        Value::Constant(value) => *value == 0,
        Value::Zero(ty) => ty.is_integer(),
        _ => false,
    };
    if !zero {
        return Err(LoweringError::UnsupportedFillValue {
            function: call.function.clone(),
            callee: call.callee.clone(),
            value: fill.clone(),
        });
    }
    let bytes = call.constant_arg(2)?;

    let dest = call.arg(0)?;
    let (ptr, ptr_type) = match reinterpret_source(module, call.site.function, dest) {
        Some(cast) => {
            dead_casts.defer(call.site.function, cast.cast);
            (cast.source, cast.source_type)
        }
        None => {
            let ty = module
                .value_type(&module.functions[call.site.function], dest)
                .ok_or_else(|| call.malformed("destination has no type"))?;
            (dest.clone(), ty)
        }
    };
    let element = ptr_type
        .pointee()
        .cloned()
        .ok_or_else(|| LoweringError::MissingReinterpretCast {
            function: call.function.clone(),
            callee: call.callee.clone(),
            operand: 0,
        })?;
    let element_size = module
        .data_layout
        .alloc_size(&element)
        .filter(|size| *size > 0)
        .ok_or_else(|| call.malformed(format!("{element} has no size")))?;

    if bytes % element_size != 0 {
        return Err(LoweringError::UnevenDivision {
            function: call.function.clone(),
            callee: call.callee.clone(),
            bytes,
            element,
            element_size,
        });
    }
    let num_stores = call.element_count(bytes / element_size)?;
    trace!("  {num_stores} zero store(s) of {element}");

    let mut builder = InstBuilder::for_function(&module.functions[call.site.function]);
    let slot_type = IrType::ptr(element.clone());
    for index in 0..num_stores {
        let slot = builder.build_gep(ptr.clone(), vec![Value::Constant(index as i64)], slot_type.clone());
        builder.build_store(Value::Zero(element.clone()), slot);
    }
    rewrite::splice(module, call.site, builder.finish());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpuc_ir::{Function, Instruction};
    use pretty_assertions::assert_eq;

    const MEMSET: &str = "llvm.memset.p0i8.i64";

    /// `%0 = alloca <element>; %1 = cast %0 to i8*; memset(%1, fill, bytes, 0)`
    fn module_with_fill(element: IrType, fill: i64, bytes: i64) -> Module {
        let mut module = Module::new("fill".to_string());
        module.add_function(Function::declare(
            MEMSET,
            IrType::Void,
            vec![IrType::ptr(IrType::I8), IrType::I8, IrType::I64, IrType::I1],
        ));
        let mut body = InstBuilder::new(0);
        let buffer = body.build_alloca(element);
        let bytes_ptr = body.build_cast(buffer, IrType::ptr(IrType::I8));
        body.build_call(
            Value::Function(MEMSET.to_string()),
            vec![bytes_ptr, Value::Constant(fill), Value::Constant(bytes), Value::Constant(0)],
            IrType::Void,
        );
        body.build_return(None);
        let mut kernel = Function::new("clear".to_string(), IrType::Void);
        kernel.add_block(body.into_block(0));
        module.add_function(kernel);
        module
    }

    #[test]
    fn test_fill_becomes_indexed_zero_stores() {
        let mut module = module_with_fill(IrType::I32, 0, 12);
        assert!(lower_zero_fills(&mut module).unwrap());
        assert_eq!(module.functions.len(), 1);

        let insts = &module.functions[0].blocks[0].instructions;
        // alloca, 3 x (gep, store), ret; the cast is gone
        assert_eq!(insts.len(), 8);
        assert!(matches!(insts[0], Instruction::Alloca { .. }));
        for (i, pair) in insts[1..7].chunks(2).enumerate() {
            match pair {
                [Instruction::GetElementPtr { result, ptr, indices, result_type }, Instruction::Store { value, ptr: slot }] => {
                    assert_eq!(*ptr, Value::Temp(0));
                    assert_eq!(*indices, vec![Value::Constant(i as i64)]);
                    assert_eq!(*result_type, IrType::ptr(IrType::I32));
                    assert_eq!(*value, Value::Zero(IrType::I32));
                    assert_eq!(*slot, Value::Temp(*result));
                }
                other => panic!("unexpected pair {other:?}"),
            }
        }
    }

    #[test]
    fn test_aggregate_element_is_stored_whole() {
        let row = IrType::array(IrType::I16, 4);
        let mut module = module_with_fill(row.clone(), 0, 8);
        lower_zero_fills(&mut module).unwrap();
        let stores: Vec<&Instruction> = module.functions[0]
            .instructions()
            .filter(|inst| matches!(inst, Instruction::Store { .. }))
            .collect();
        assert_eq!(stores.len(), 1);
        assert!(matches!(stores[0], Instruction::Store { value: Value::Zero(ty), .. } if *ty == row));
    }

    #[test]
    fn test_zero_bytes_emit_nothing() {
        let mut module = module_with_fill(IrType::I64, 0, 0);
        assert!(lower_zero_fills(&mut module).unwrap());
        let printed: Vec<String> = module.functions[0]
            .instructions()
            .map(|inst| inst.to_string())
            .collect();
        assert_eq!(printed, vec!["%0 = alloca i64".to_string(), "ret void".to_string()]);
    }

    #[test]
    fn test_uncast_destination_uses_its_own_pointee() {
        let mut module = Module::new("fill".to_string());
        module.add_function(Function::declare(MEMSET, IrType::Void, Vec::new()));
        let mut kernel = Function::new("clear".to_string(), IrType::Void);
        kernel.add_parameter(0, IrType::ptr(IrType::I16));
        let mut body = InstBuilder::for_function(&kernel);
        body.build_call(
            Value::Function(MEMSET.to_string()),
            vec![Value::Temp(0), Value::Constant(0), Value::Constant(4), Value::Constant(0)],
            IrType::Void,
        );
        kernel.add_block(body.into_block(0));
        module.add_function(kernel);

        lower_zero_fills(&mut module).unwrap();
        let stores = module.functions[0]
            .instructions()
            .filter(|inst| matches!(inst, Instruction::Store { value: Value::Zero(IrType::Int(16)), .. }))
            .count();
        assert_eq!(stores, 2);
    }

    #[test]
    fn test_non_zero_fill_is_fatal() {
        let mut module = module_with_fill(IrType::I32, 0xAB, 16);
        let err = lower_zero_fills(&mut module).unwrap_err();
        assert!(matches!(err, LoweringError::UnsupportedFillValue { value: Value::Constant(0xAB), .. }));
    }

    /// Swap the fill operand of the single memset in `module_with_fill`
    fn with_fill_value(mut module: Module, fill: Value) -> Module {
        match &mut module.functions[1].blocks[0].instructions[2] {
            Instruction::Call { args, .. } => args[1] = fill,
            other => panic!("unexpected {other}"),
        }
        module
    }

    #[test]
    fn test_integer_zero_constant_fill_is_accepted() {
        let mut module = with_fill_value(module_with_fill(IrType::I32, 0, 4), Value::Zero(IrType::I8));
        assert!(lower_zero_fills(&mut module).unwrap());
        let stores = module.functions[0]
            .instructions()
            .filter(|inst| matches!(inst, Instruction::Store { value: Value::Zero(IrType::Int(32)), .. }))
            .count();
        assert_eq!(stores, 1);
    }

    #[test]
    fn test_aggregate_zero_fill_value_is_fatal() {
        let fill = Value::Zero(IrType::array(IrType::I8, 2));
        let mut module = with_fill_value(module_with_fill(IrType::I32, 0, 4), fill.clone());
        let err = lower_zero_fills(&mut module).unwrap_err();
        assert!(matches!(err, LoweringError::UnsupportedFillValue { value, .. } if value == fill));
    }

    #[test]
    fn test_fill_beyond_32_bit_index_is_fatal() {
        let mut module = module_with_fill(IrType::I8, 0, i64::MAX);
        let err = lower_zero_fills(&mut module).unwrap_err();
        assert_eq!(
            err,
            LoweringError::TooManyElements {
                function: "clear".to_string(),
                callee: MEMSET.to_string(),
                count: i64::MAX as u64,
            }
        );
    }

    #[test]
    fn test_uneven_fill_is_fatal() {
        let mut module = module_with_fill(IrType::I32, 0, 10);
        let err = lower_zero_fills(&mut module).unwrap_err();
        assert_eq!(
            err,
            LoweringError::UnevenDivision {
                function: "clear".to_string(),
                callee: MEMSET.to_string(),
                bytes: 10,
                element: IrType::I32,
                element_size: 4,
            }
        );
    }
}
