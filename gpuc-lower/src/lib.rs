//! GPU target compiler - Intrinsic Lowering
//!
//! The frontend optimizer emits generic platform intrinsics that the GPU
//! target cannot translate: funnel shifts, block fills, block copies and
//! lifetime markers. `ReplaceIntrinsicsPass` rewrites every call to them
//! into plain arithmetic, stores and the target's object-copy primitive,
//! and removes their declarations.
//!
//! - `scanner` - Intrinsic families and call-site discovery
//! - `rewrite` - Snapshot-then-edit helpers shared by the lowerings
//! - `lifetime` - Lifetime marker elision
//! - `funnel_shift` - Funnel shift left lowering
//! - `zero_fill` - Zero block fill lowering
//! - `block_copy` - Block copy lowering and type matching
//! - `config` - Pass configuration

pub mod block_copy;
pub mod config;
pub mod errors;
pub mod funnel_shift;
pub mod lifetime;
pub mod scanner;
pub mod zero_fill;
mod rewrite;

pub use block_copy::{match_types, TypeMatch};
pub use config::{load_config, LoweringConfig};
pub use errors::LoweringError;
pub use scanner::IntrinsicKind;

use gpuc_ir::Module;
use log::debug;

/// Module pass replacing unsupported intrinsics
#[derive(Debug, Clone, Default)]
pub struct ReplaceIntrinsicsPass {
    config: LoweringConfig,
}

impl ReplaceIntrinsicsPass {
    pub const NAME: &'static str = "replace-intrinsics";

    pub fn new(config: LoweringConfig) -> Self {
        Self { config }
    }

    /// Lower every intrinsic call in `module`. Returns whether the module
    /// changed. On error the module is left exactly as it was.
    pub fn run_on_module(&self, module: &mut Module) -> Result<bool, LoweringError> {
        let mut working = module.clone();
        let mut changed = false;

        // Lifetime markers go first: they may reference buffers the fill
        // and copy lowerings rewrite.
        changed |= lifetime::elide_lifetime_markers(&mut working)?;
        changed |= funnel_shift::lower_funnel_shifts(&mut working)?;
        changed |= zero_fill::lower_zero_fills(&mut working)?;
        changed |= block_copy::lower_block_copies(&mut working, &self.config.copy_memory_name)?;

        if self.config.verify {
            scanner::verify_lowered(&working)?;
        }
        debug!("{} on '{}': changed = {changed}", Self::NAME, module.name);
        if changed {
            *module = working;
        }
        Ok(changed)
    }
}

/// Run the pass with the default configuration
pub fn replace_intrinsics(module: &mut Module) -> Result<bool, LoweringError> {
    ReplaceIntrinsicsPass::default().run_on_module(module)
}
