//! Module and Global Variables
//!
//! Defines the top-level module structure and global variable management.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::{DataLayout, Function, IrType, Value};

/// Linkage types for global symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    External,  // Visible to other modules
    Internal,  // Only visible within this module
}

/// Global variable definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub name: String,
    pub var_type: IrType,
    pub is_constant: bool,
    pub initializer: Option<Value>,
    pub linkage: Linkage,
}

/// IR Module - represents a complete compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<GlobalVariable>,
    #[serde(default)]
    pub data_layout: DataLayout,
}

impl Module {
    pub fn new(name: String) -> Self {
        Self {
            name,
            functions: Vec::new(),
            globals: Vec::new(),
            data_layout: DataLayout::default(),
        }
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn add_global(&mut self, global: GlobalVariable) {
        self.globals.push(global);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_global(&self, name: &str) -> Option<&GlobalVariable> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Remove a function by name, returning it
    pub fn remove_function(&mut self, name: &str) -> Option<Function> {
        let pos = self.functions.iter().position(|f| f.name == name)?;
        Some(self.functions.remove(pos))
    }

    /// Type of a value as seen from inside `function`. Globals are
    /// pointers to their storage; integer constants and undef are untyped.
    pub fn value_type(&self, function: &Function, value: &Value) -> Option<IrType> {
        match value {
            Value::Temp(id) => function.temp_type(*id).cloned(),
            Value::Zero(ty) => Some(ty.clone()),
            Value::Global(name) => self.get_global(name).map(|g| IrType::ptr(g.var_type.clone())),
            Value::Function(name) => self.get_function(name).map(|f| {
                IrType::ptr(IrType::Function {
                    return_type: Box::new(f.return_type.clone()),
                    param_types: f.parameters.iter().map(|(_, ty)| ty.clone()).collect(),
                    is_vararg: f.is_vararg,
                })
            }),
            Value::Constant(_) | Value::Undef => None,
        }
    }

    /// Number of direct call instructions targeting `name` in the module
    pub fn count_calls_to(&self, name: &str) -> usize {
        self.functions
            .iter()
            .flat_map(|f| f.instructions())
            .filter(|inst| inst.callee() == Some(name))
            .count()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for global in &self.globals {
            let kind = if global.is_constant { "constant" } else { "global" };
            write!(f, "@{} = {kind} {}", global.name, global.var_type)?;
            if let Some(init) = &global.initializer {
                write!(f, " {init}")?;
            }
            writeln!(f)?;
        }
        for function in &self.functions {
            let params: Vec<String> = function
                .parameters
                .iter()
                .map(|(id, ty)| format!("{ty} %{id}"))
                .collect();
            let head = format!("{} @{}({})", function.return_type, function.name, params.join(", "));
            if function.is_declaration() {
                writeln!(f, "declare {head}")?;
                continue;
            }
            writeln!(f, "define {head} {{")?;
            for block in &function.blocks {
                writeln!(f, "{}:", block.id)?;
                for inst in &block.instructions {
                    writeln!(f, "  {inst}")?;
                }
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
