//! Intrinsic classification and call-site discovery
//!
//! Declarations are classified once by name prefix. Call sites are
//! returned as positional snapshots; callers must finish collecting before
//! they start editing.

use gpuc_ir::Module;
use std::fmt;
use crate::LoweringError;

/// Intrinsic families the GPU target cannot express
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    FunnelShift,
    BlockFill,
    BlockCopy,
    LifetimeMarker,
    Unrelated,
}

impl IntrinsicKind {
    /// Name prefix shared by every overload of the family
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            IntrinsicKind::FunnelShift => Some("llvm.fshl"),
            IntrinsicKind::BlockFill => Some("llvm.memset"),
            IntrinsicKind::BlockCopy => Some("llvm.memcpy"),
            IntrinsicKind::LifetimeMarker => Some("llvm.lifetime."),
            IntrinsicKind::Unrelated => None,
        }
    }

    pub fn classify(name: &str) -> Self {
        [
            IntrinsicKind::FunnelShift,
            IntrinsicKind::BlockFill,
            IntrinsicKind::BlockCopy,
            IntrinsicKind::LifetimeMarker,
        ]
        .into_iter()
        .find(|kind| kind.prefix().is_some_and(|prefix| name.starts_with(prefix)))
        .unwrap_or(IntrinsicKind::Unrelated)
    }
}

impl fmt::Display for IntrinsicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntrinsicKind::FunnelShift => "funnel-shift",
            IntrinsicKind::BlockFill => "block-fill",
            IntrinsicKind::BlockCopy => "block-copy",
            IntrinsicKind::LifetimeMarker => "lifetime-marker",
            IntrinsicKind::Unrelated => "unrelated",
        };
        write!(f, "{name}")
    }
}

/// Position of a call instruction: function index in the module, block
/// index in the function, instruction index in the block. Only valid
/// until an edit at or before this position in the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallSiteRef {
    pub function: usize,
    pub block: usize,
    pub index: usize,
}

/// Names of the module's functions in one family, in module order
pub fn declarations_of(module: &Module, kind: IntrinsicKind) -> Vec<String> {
    module
        .functions
        .iter()
        .filter(|f| IntrinsicKind::classify(&f.name) == kind)
        .map(|f| f.name.clone())
        .collect()
}

/// Every direct call to `callee`, in ascending position order
pub fn call_sites(module: &Module, callee: &str) -> Vec<CallSiteRef> {
    let mut sites = Vec::new();
    for (function, func) in module.functions.iter().enumerate() {
        for (block, bb) in func.blocks.iter().enumerate() {
            for (index, inst) in bb.instructions.iter().enumerate() {
                if inst.callee() == Some(callee) {
                    sites.push(CallSiteRef { function, block, index });
                }
            }
        }
    }
    sites
}

/// Fail if any declaration of, or call to, a lowered family remains
pub fn verify_lowered(module: &Module) -> Result<(), LoweringError> {
    for function in &module.functions {
        if IntrinsicKind::classify(&function.name) != IntrinsicKind::Unrelated {
            return Err(LoweringError::ResidualIntrinsic { name: function.name.clone() });
        }
        for callee in function.instructions().filter_map(|inst| inst.callee()) {
            if IntrinsicKind::classify(callee) != IntrinsicKind::Unrelated {
                return Err(LoweringError::ResidualIntrinsic { name: callee.to_string() });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpuc_ir::{Function, InstBuilder, IrType, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_by_prefix() {
        assert_eq!(IntrinsicKind::classify("llvm.fshl.i32"), IntrinsicKind::FunnelShift);
        assert_eq!(IntrinsicKind::classify("llvm.memset.p0i8.i64"), IntrinsicKind::BlockFill);
        assert_eq!(IntrinsicKind::classify("llvm.memcpy.p0i8.p0i8.i32"), IntrinsicKind::BlockCopy);
        assert_eq!(IntrinsicKind::classify("llvm.lifetime.start.p0i8"), IntrinsicKind::LifetimeMarker);
        assert_eq!(IntrinsicKind::classify("llvm.lifetime.end.p0i8"), IntrinsicKind::LifetimeMarker);
        assert_eq!(IntrinsicKind::classify("llvm.fshr.i32"), IntrinsicKind::Unrelated);
        assert_eq!(IntrinsicKind::classify("llvm.memmove.p0i8.p0i8.i64"), IntrinsicKind::Unrelated);
        assert_eq!(IntrinsicKind::classify("memcpy"), IntrinsicKind::Unrelated);
    }

    #[test]
    fn test_call_sites_are_ordered_snapshots() {
        let mut module = Module::new("scan".to_string());
        module.add_function(Function::declare("llvm.fshl.i8", IrType::I8, vec![IrType::I8; 3]));
        module.add_function(Function::declare("helper", IrType::Void, Vec::new()));

        let fshl = Value::Function("llvm.fshl.i8".to_string());
        let args = vec![Value::Constant(1), Value::Constant(2), Value::Constant(3)];
        let mut body = InstBuilder::new(0);
        body.build_call(fshl.clone(), args.clone(), IrType::I8);
        body.build_call(Value::Function("helper".to_string()), Vec::new(), IrType::Void);
        body.build_call(fshl, args, IrType::I8);
        body.build_return(None);
        let mut kernel = Function::new("kernel".to_string(), IrType::Void);
        kernel.add_block(body.into_block(0));
        module.add_function(kernel);

        assert_eq!(declarations_of(&module, IntrinsicKind::FunnelShift), vec!["llvm.fshl.i8".to_string()]);
        assert_eq!(
            call_sites(&module, "llvm.fshl.i8"),
            vec![
                CallSiteRef { function: 2, block: 0, index: 0 },
                CallSiteRef { function: 2, block: 0, index: 2 },
            ]
        );
        assert!(matches!(
            verify_lowered(&module),
            Err(LoweringError::ResidualIntrinsic { name }) if name == "llvm.fshl.i8"
        ));
    }
}
