//! IR Type System
//!
//! Defines the type system for the IR: integers of arbitrary bit width,
//! pointers, arrays, vectors, structs and functions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IR Type system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrType {
    /// Void type
    Void,

    /// Integer type with bit width
    Int(u32),

    /// Pointer to an element type
    Ptr(Box<IrType>),

    /// Array type [size x element_type]
    Array { size: u64, element_type: Box<IrType> },

    /// Vector type <lanes x element_type>
    Vector { lanes: u32, element_type: Box<IrType> },

    /// Function type
    Function {
        return_type: Box<IrType>,
        param_types: Vec<IrType>,
        is_vararg: bool,
    },

    /// Struct type
    Struct {
        name: Option<String>,
        fields: Vec<IrType>,
        packed: bool,
    },
}

impl IrType {
    pub const I1: IrType = IrType::Int(1);
    pub const I8: IrType = IrType::Int(8);
    pub const I16: IrType = IrType::Int(16);
    pub const I32: IrType = IrType::Int(32);
    pub const I64: IrType = IrType::Int(64);

    pub fn ptr(pointee: IrType) -> Self {
        IrType::Ptr(Box::new(pointee))
    }

    pub fn array(element_type: IrType, size: u64) -> Self {
        IrType::Array { size, element_type: Box::new(element_type) }
    }

    pub fn vector(element_type: IrType, lanes: u32) -> Self {
        IrType::Vector { lanes, element_type: Box::new(element_type) }
    }

    /// Anonymous, unpacked struct
    pub fn structure(fields: Vec<IrType>) -> Self {
        IrType::Struct { name: None, fields, packed: false }
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::Int(_))
    }

    /// Bit width of an integer type
    pub fn int_bits(&self) -> Option<u32> {
        match self {
            IrType::Int(bits) => Some(*bits),
            _ => None,
        }
    }

    /// Check if this is a pointer type
    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Ptr(_))
    }

    /// Get the pointee type of a pointer
    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(elem) => Some(elem),
            _ => None,
        }
    }

    /// Get the element type for arrays and vectors
    pub fn element_type(&self) -> Option<&IrType> {
        match self {
            IrType::Array { element_type, .. } | IrType::Vector { element_type, .. } => {
                Some(element_type)
            }
            _ => None,
        }
    }

    /// The type one level down: first field of a struct, element of an
    /// array, lane of a vector. Scalars and pointers have nothing below.
    pub fn descend(&self) -> Option<&IrType> {
        match self {
            IrType::Struct { fields, .. } => fields.first(),
            IrType::Array { element_type, .. } | IrType::Vector { element_type, .. } => {
                Some(element_type)
            }
            _ => None,
        }
    }

    /// Compact, deterministic spelling used to build overloaded
    /// declaration names (`i32`, `p0i8`, `a4i32`, `v4i16`, `s.i32.i32`).
    pub fn mangle(&self) -> String {
        match self {
            IrType::Void => "void".to_string(),
            IrType::Int(bits) => format!("i{bits}"),
            IrType::Ptr(pointee) => format!("p0{}", pointee.mangle()),
            IrType::Array { size, element_type } => format!("a{size}{}", element_type.mangle()),
            IrType::Vector { lanes, element_type } => format!("v{lanes}{}", element_type.mangle()),
            IrType::Function { .. } => "f".to_string(),
            IrType::Struct { name: Some(name), .. } => format!("s_{name}"),
            IrType::Struct { name: None, fields, .. } => {
                let mut out = String::from("s");
                for field in fields {
                    out.push('.');
                    out.push_str(&field.mangle());
                }
                out
            }
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Int(bits) => write!(f, "i{bits}"),
            IrType::Ptr(target) => write!(f, "{target}*"),
            IrType::Array { size, element_type } => write!(f, "[{size} x {element_type}]"),
            IrType::Vector { lanes, element_type } => write!(f, "<{lanes} x {element_type}>"),
            IrType::Function { return_type, param_types, is_vararg } => {
                write!(f, "{return_type} (")?;
                for (i, param) in param_types.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{param}")?;
                }
                if *is_vararg { write!(f, ", ...")?; }
                write!(f, ")")
            }
            IrType::Struct { name: Some(name), .. } => write!(f, "%{name}"),
            IrType::Struct { name: None, fields, packed } => {
                if *packed { write!(f, "<")?; }
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{field}")?;
                }
                write!(f, " }}")?;
                if *packed { write!(f, ">")?; }
                Ok(())
            }
        }
    }
}
