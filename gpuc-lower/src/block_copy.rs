//! Block copy lowering
//!
//! `memcpy(dst, src, n, volatile)` is rewritten into calls to the target's
//! "copy one object" primitive. Both pointers arrive as casts to a byte
//! pointer; the casts are looked through to find the real pointee types,
//! which are then unpacked level by level until a common element type is
//! found. The copy is emitted as one primitive call per element.

use gpuc_ir::{DataLayout, Function, InstBuilder, IrType, Module, Value};
use log::trace;
use crate::rewrite::{self, lower_declarations, reinterpret_source, CallSite, DeadCasts};
use crate::scanner::IntrinsicKind;
use crate::LoweringError;

/// Result of unpacking the destination and source types to a common
/// element type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMatch {
    pub element: IrType,
    /// Levels unpacked on the destination side
    pub dest_depth: usize,
    /// Levels unpacked on the source side
    pub src_depth: usize,
}

/// Where unpacking got stuck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmatched {
    pub dest: IrType,
    pub src: IrType,
}

/// Unpack `dest` and `src` until they agree, always descending the side
/// that is at least as large. On equal sizes the destination goes first
/// and the source only descends when the destination cannot. Afterwards
/// both sides keep descending together while one element is larger than
/// the `bytes` being copied.
pub fn match_types(layout: &DataLayout, dest: &IrType, src: &IrType, bytes: u64) -> Result<TypeMatch, Unmatched> {
    let (mut dest, mut src) = (dest, src);
    let (mut dest_depth, mut src_depth) = (0, 0);
    let stuck = |dest: &IrType, src: &IrType| Unmatched { dest: dest.clone(), src: src.clone() };

    while dest != src {
        let dest_bits = layout.size_in_bits(dest).ok_or_else(|| stuck(dest, src))?;
        let src_bits = layout.size_in_bits(src).ok_or_else(|| stuck(dest, src))?;

        let descend_dest = match dest_bits.cmp(&src_bits) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => dest.descend().is_some(),
        };
        if descend_dest {
            dest = dest.descend().ok_or_else(|| stuck(dest, src))?;
            dest_depth += 1;
        } else {
            src = src.descend().ok_or_else(|| stuck(dest, src))?;
            src_depth += 1;
        }
        trace!("  unpacked to {dest} ({dest_depth}) vs {src} ({src_depth})");
    }

    let element_bytes = |ty: &IrType| layout.size_in_bits(ty).map(|bits| bits / 8);
    let mut element = dest;
    while bytes < element_bytes(element).ok_or_else(|| stuck(element, element))? {
        element = element.descend().ok_or_else(|| stuck(element, element))?;
        dest_depth += 1;
        src_depth += 1;
        trace!("  copy of {bytes} bytes is smaller than one element, unpacked both to {element}");
    }

    Ok(TypeMatch {
        element: element.clone(),
        dest_depth,
        src_depth,
    })
}

pub fn lower_block_copies(module: &mut Module, copy_memory_name: &str) -> Result<bool, LoweringError> {
    lower_declarations(module, IntrinsicKind::BlockCopy, |module, call, dead_casts| {
        lower_call(module, call, dead_casts, copy_memory_name)
    })
}

fn lower_call(
    module: &mut Module,
    call: CallSite,
    dead_casts: &mut DeadCasts,
    copy_memory_name: &str,
) -> Result<(), LoweringError> {
    let missing_cast = |operand| LoweringError::MissingReinterpretCast {
        function: call.function.clone(),
        callee: call.callee.clone(),
        operand,
    };
    let dst = reinterpret_source(module, call.site.function, call.arg(0)?).ok_or_else(|| missing_cast(0))?;
    let src = reinterpret_source(module, call.site.function, call.arg(1)?).ok_or_else(|| missing_cast(1))?;
    let bytes = call.constant_arg(2)?;
    let volatile = call.constant_arg(3)?;

    dead_casts.defer(call.site.function, dst.cast);
    dead_casts.defer(call.site.function, src.cast);

    if bytes == 0 {
        trace!("  empty copy, nothing to emit");
        rewrite::splice(module, call.site, Vec::new());
        return Ok(());
    }

    let (dst_ty, src_ty) = match (dst.source_type.pointee(), src.source_type.pointee()) {
        (Some(dst_ty), Some(src_ty)) => (dst_ty, src_ty),
        _ => return Err(call.malformed("copy operands are not pointers")),
    };
    let layout = module.data_layout;
    let matched = match_types(&layout, dst_ty, src_ty, bytes).map_err(|stuck| {
        LoweringError::UnsupportedTypeShape {
            function: call.function.clone(),
            callee: call.callee.clone(),
            dest: stuck.dest,
            src: stuck.src,
        }
    })?;
    let element = matched.element.clone();

    let element_size = layout
        .size_in_bits(&element)
        .map(|bits| bits / 8)
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

    let align = call.align.unwrap_or(1);
    let required = layout.abi_align(&element).unwrap_or(1);
    if align < required || align % required != 0 {
        return Err(LoweringError::MisalignedCopy {
            function: call.function.clone(),
            callee: call.callee.clone(),
            align,
            element,
            required,
        });
    }

    let count = call.element_count(bytes / element_size)?;
    trace!(
        "  {count} copy(ies) of {element}, unpacked {} (dst) / {} (src)",
        matched.dest_depth, matched.src_depth
    );

    let element_ptr = IrType::ptr(element.clone());
    let copy_fn = declare_copy_memory(module, copy_memory_name, &element_ptr);
    let align_arg = Value::Constant(align as i64);
    let volatile_arg = Value::Constant(volatile as i64);

    let mut builder = InstBuilder::for_function(&module.functions[call.site.function]);
    if matched.dest_depth == 0 && matched.src_depth == 0 && count == 1 {
        builder.build_call(
            copy_fn,
            vec![dst.source, src.source, align_arg, volatile_arg],
            IrType::Void,
        );
    } else {
        for index in 0..count {
            let index = Value::Constant(index as i64);
            let mut src_indices = vec![Value::Constant(0); matched.src_depth];
            src_indices.push(index.clone());
            let mut dst_indices = vec![Value::Constant(0); matched.dest_depth];
            dst_indices.push(index);

            let src_elem = builder.build_gep(src.source.clone(), src_indices, element_ptr.clone());
            let dst_elem = builder.build_gep(dst.source.clone(), dst_indices, element_ptr.clone());
            builder.build_call(
                copy_fn.clone(),
                vec![dst_elem, src_elem, align_arg.clone(), volatile_arg.clone()],
                IrType::Void,
            );
        }
    }
    rewrite::splice(module, call.site, builder.finish());
    Ok(())
}

/// Declaration of the copy primitive for one pointer type, created on first use
fn declare_copy_memory(module: &mut Module, base_name: &str, ptr_type: &IrType) -> Value {
    let name = format!("{base_name}.{}", ptr_type.mangle());
    if module.get_function(&name).is_none() {
        module.add_function(Function::declare(
            name.clone(),
            IrType::Void,
            vec![ptr_type.clone(), ptr_type.clone(), IrType::I32, IrType::I32],
        ));
    }
    Value::Function(name)
}
