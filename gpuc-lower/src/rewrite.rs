//! In-place rewriting support shared by the lowerings
//!
//! All call sites of a declaration are snapshotted first and then edited
//! from the highest position down, so an edit never moves a call site that
//! is still waiting to be processed. Instructions that several call sites
//! may share (reinterpretation casts) are only queued during the walk and
//! removed once it is over.

use gpuc_common::TempId;
use gpuc_ir::{Instruction, IrType, Module, Value};
use log::{debug, trace};
use std::collections::BTreeSet;
use crate::scanner::{self, CallSiteRef, IntrinsicKind};
use crate::LoweringError;

/// Owned copy of a call instruction and where it lives
#[derive(Debug, Clone)]
pub(crate) struct CallSite {
    pub site: CallSiteRef,
    pub function: String,
    pub callee: String,
    pub result: Option<TempId>,
    pub args: Vec<Value>,
    pub result_type: IrType,
    pub align: Option<u64>,
}

impl CallSite {
    pub fn read(module: &Module, site: CallSiteRef) -> Result<Self, LoweringError> {
        let func = &module.functions[site.function];
        match &func.blocks[site.block].instructions[site.index] {
            Instruction::Call { result, function, args, result_type, align } => Ok(Self {
                site,
                function: func.name.clone(),
                callee: function.as_function().unwrap_or_default().to_string(),
                result: *result,
                args: args.clone(),
                result_type: result_type.clone(),
                align: *align,
            }),
            other => Err(LoweringError::MalformedCallSite {
                function: func.name.clone(),
                callee: String::new(),
                message: format!("expected a call, found '{other}'"),
            }),
        }
    }

    pub fn malformed(&self, message: impl Into<String>) -> LoweringError {
        LoweringError::MalformedCallSite {
            function: self.function.clone(),
            callee: self.callee.clone(),
            message: message.into(),
        }
    }

    pub fn arg(&self, operand: usize) -> Result<&Value, LoweringError> {
        self.args
            .get(operand)
            .ok_or_else(|| self.malformed(format!("missing operand {operand}")))
    }

    /// Operand that must be a non-negative integer constant
    pub fn constant_arg(&self, operand: usize) -> Result<u64, LoweringError> {
        let value = self.arg(operand)?;
        value
            .as_constant()
            .and_then(|c| u64::try_from(c).ok())
            .ok_or_else(|| LoweringError::NonConstantOperand {
                function: self.function.clone(),
                callee: self.callee.clone(),
                operand,
                value: value.clone(),
            })
    }

    /// Element counts are addressed with 32-bit indices
    pub fn element_count(&self, count: u64) -> Result<u64, LoweringError> {
        if u32::try_from(count).is_err() {
            return Err(LoweringError::TooManyElements {
                function: self.function.clone(),
                callee: self.callee.clone(),
                count,
            });
        }
        Ok(count)
    }
}

/// Replace the instruction at `site` with `replacement` (possibly nothing)
pub(crate) fn splice(module: &mut Module, site: CallSiteRef, replacement: Vec<Instruction>) {
    for inst in &replacement {
        trace!("  emit {inst}");
    }
    let block = &mut module.functions[site.function].blocks[site.block];
    block.instructions.splice(site.index..=site.index, replacement);
}

/// A pointer-reinterpretation cast feeding an operand
#[derive(Debug, Clone)]
pub(crate) struct Reinterpret {
    pub cast: TempId,
    pub source: Value,
    pub source_type: IrType,
}

/// If `value` is the result of a pointer-to-pointer cast in the call's
/// function, recover the original pointer and its type
pub(crate) fn reinterpret_source(module: &Module, function: usize, value: &Value) -> Option<Reinterpret> {
    let func = &module.functions[function];
    let cast = value.as_temp()?;
    match func.find_def(cast)? {
        Instruction::Cast { value: source, target_type, .. } if target_type.is_pointer() => {
            let source_type = module.value_type(func, source)?;
            source_type.is_pointer().then(|| Reinterpret {
                cast,
                source: source.clone(),
                source_type,
            })
        }
        _ => None,
    }
}

/// Casts queued for removal once every call site that read them is gone
#[derive(Debug, Default)]
pub(crate) struct DeadCasts {
    pending: BTreeSet<(usize, TempId)>,
}

impl DeadCasts {
    pub fn defer(&mut self, function: usize, cast: TempId) {
        self.pending.insert((function, cast));
    }

    /// Remove each queued cast that no instruction reads any more
    pub fn drain(self, module: &mut Module) -> usize {
        let mut removed = 0;
        for (function, cast) in self.pending {
            let func = &mut module.functions[function];
            if func.has_users(cast) {
                debug!("Keeping cast %{cast} in '{}': still in use", func.name);
                continue;
            }
            if func.remove_def(cast).is_some() {
                removed += 1;
            }
        }
        removed
    }
}

/// Run `lower_call` on every call site of every declaration in `kind`,
/// then drop the queued casts and the declaration itself. Returns whether
/// any declaration was found.
pub(crate) fn lower_declarations<F>(
    module: &mut Module,
    kind: IntrinsicKind,
    mut lower_call: F,
) -> Result<bool, LoweringError>
where
    F: FnMut(&mut Module, CallSite, &mut DeadCasts) -> Result<(), LoweringError>,
{
    let declarations = scanner::declarations_of(module, kind);
    for name in &declarations {
        let sites = scanner::call_sites(module, name);
        debug!("Lowering {} {kind} call(s) to '{name}'", sites.len());

        let mut dead_casts = DeadCasts::default();
        for site in sites.into_iter().rev() {
            let call = CallSite::read(module, site)?;
            trace!("{} @ {:?}", call.callee, call.site);
            lower_call(module, call, &mut dead_casts)?;
        }
        let removed = dead_casts.drain(module);
        if removed > 0 {
            debug!("Removed {removed} reinterpretation cast(s) feeding '{name}'");
        }
        module.remove_function(name);
    }
    Ok(!declarations.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpuc_ir::{Function, InstBuilder};

    /// Two casts of one alloca, one of them read twice
    fn module_with_casts() -> Module {
        let mut module = Module::new("casts".to_string());
        let mut body = InstBuilder::new(0);
        let buffer = body.build_alloca(IrType::array(IrType::I32, 4));
        body.build_cast(buffer.clone(), IrType::ptr(IrType::I8));
        let words = body.build_cast(buffer, IrType::ptr(IrType::I16));
        body.build_load(words.clone(), IrType::I16);
        body.build_store(Value::Constant(0), words);
        body.build_return(None);
        let mut kernel = Function::new("kernel".to_string(), IrType::Void);
        kernel.add_block(body.into_block(0));
        module.add_function(kernel);
        module
    }

    #[test]
    fn test_reinterpret_source_recovers_pointee() {
        let module = module_with_casts();
        let cast = reinterpret_source(&module, 0, &Value::Temp(1)).unwrap();
        assert_eq!(cast.cast, 1);
        assert_eq!(cast.source, Value::Temp(0));
        assert_eq!(cast.source_type, IrType::ptr(IrType::array(IrType::I32, 4)));

        // The alloca itself is not a cast
        assert!(reinterpret_source(&module, 0, &Value::Temp(0)).is_none());
        assert!(reinterpret_source(&module, 0, &Value::Constant(0)).is_none());
    }

    #[test]
    fn test_dead_casts_are_deduplicated_and_keep_live_ones() {
        let mut module = module_with_casts();
        let mut dead = DeadCasts::default();
        dead.defer(0, 1);
        dead.defer(0, 1);
        dead.defer(0, 2);

        assert_eq!(dead.drain(&mut module), 1);
        let kernel = &module.functions[0];
        assert!(kernel.find_def(1).is_none());
        assert!(kernel.find_def(2).is_some());
    }

    #[test]
    fn test_splice_replaces_in_place() {
        let mut module = module_with_casts();
        let site = CallSiteRef { function: 0, block: 0, index: 3 };
        splice(&mut module, site, vec![Instruction::Comment("a".into()), Instruction::Comment("b".into())]);
        let insts = &module.functions[0].blocks[0].instructions;
        assert_eq!(insts.len(), 7);
        assert_eq!(insts[3], Instruction::Comment("a".into()));
        assert_eq!(insts[4], Instruction::Comment("b".into()));
        assert!(matches!(insts[5], Instruction::Store { .. }));

        splice(&mut module, site, Vec::new());
        assert_eq!(module.functions[0].blocks[0].instructions.len(), 6);
    }
}
