//! Lifetime marker elision
//!
//! Lifetime start/end markers need a capability the Vulkan environment
//! does not offer, so every marker call and declaration is dropped.

use gpuc_ir::Module;
use crate::rewrite::{self, lower_declarations};
use crate::scanner::IntrinsicKind;
use crate::LoweringError;

pub fn elide_lifetime_markers(module: &mut Module) -> Result<bool, LoweringError> {
    lower_declarations(module, IntrinsicKind::LifetimeMarker, |module, call, _| {
        rewrite::splice(module, call.site, Vec::new());
        Ok(())
    })
}
