//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime values
//! in the virtual machine. Values are tagged, so a `char` keeps its 8-bit width
//! until it is explicitly widened.
//!
//! # Value Types
//!
//! - [`Value::Int`]: 32-bit signed integer
//! - [`Value::Char`]: 8-bit signed character
//! - [`Value::Str`]: handle to a string literal in the module's pool

use crate::codegen::StrId;
use crate::parser::ast::Type;

/// Runtime values in the virtual machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Char(i8),
    Str(StrId),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl Value {
    /// Zero value of a storage type
    pub fn zero(ty: Type) -> Self {
        match ty {
            Type::Char => Value::Char(0),
            _ => Value::Int(0),
        }
    }

    /// Numeric value of an `int` or `char`, sign-extending chars
    pub fn as_integral(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Char(c) => Some(i32::from(*c)),
            Value::Str(_) => None,
        }
    }

    pub fn as_str_id(&self) -> Option<StrId> {
        match self {
            Value::Str(id) => Some(*id),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
        }
    }
}
