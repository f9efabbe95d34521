//! Built-in I/O functions
//!
//! Sources `#include "io.h"` for these, but the header is never read: the
//! resolver seeds the global scope with every [`Intrinsic`] instead.

use crate::parser::ast::Type;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    /// `int read_i()`
    ReadI,
    /// `char read_c()`
    ReadC,
    /// `void print_i(int)`
    PrintI,
    /// `void print_c(char)`
    PrintC,
    /// `void print_s(string)`
    PrintS,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 5] = [
        Intrinsic::ReadI,
        Intrinsic::ReadC,
        Intrinsic::PrintI,
        Intrinsic::PrintC,
        Intrinsic::PrintS,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::ReadI => "read_i",
            Intrinsic::ReadC => "read_c",
            Intrinsic::PrintI => "print_i",
            Intrinsic::PrintC => "print_c",
            Intrinsic::PrintS => "print_s",
        }
    }

    pub fn params(self) -> &'static [Type] {
        match self {
            Intrinsic::ReadI | Intrinsic::ReadC => &[],
            Intrinsic::PrintI => &[Type::Int],
            Intrinsic::PrintC => &[Type::Char],
            Intrinsic::PrintS => &[Type::Str],
        }
    }

    pub fn return_type(self) -> Type {
        match self {
            Intrinsic::ReadI => Type::Int,
            Intrinsic::ReadC => Type::Char,
            Intrinsic::PrintI | Intrinsic::PrintC | Intrinsic::PrintS => Type::Void,
        }
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
