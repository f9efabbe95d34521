//! Bytecode for the stack machine
//!
//! Instructions work on an operand stack shared by all frames. Jump targets
//! are absolute indices into the current function's code.

use crate::parser::ast::{BinOp, SourceLocation, Type};
use crate::semantic::Intrinsic;
use std::fmt;

/// Index into [`Module::strings`]
pub type StrId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    PushInt(i32),
    PushChar(i8),
    PushStr(StrId),
    LoadLocal(usize),
    StoreLocal(usize),
    LoadGlobal(usize),
    StoreGlobal(usize),
    /// Convert the `char` on top of the stack to `int`
    Widen,
    Binary(BinOp),
    Neg,
    Jump(usize),
    /// Pop; jump when the value is zero
    JumpIfZero(usize),
    /// Call a user function; its arguments are the top `argc` values
    Call { function: usize, argc: usize },
    CallIntrinsic(Intrinsic),
    /// Return the value on top of the stack
    Return,
    ReturnVoid,
    Pop,
    Dup,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::PushInt(n) => write!(f, "push.i {}", n),
            Instr::PushChar(c) => write!(f, "push.c {}", c),
            Instr::PushStr(id) => write!(f, "push.s #{}", id),
            Instr::LoadLocal(slot) => write!(f, "load.l {}", slot),
            Instr::StoreLocal(slot) => write!(f, "store.l {}", slot),
            Instr::LoadGlobal(index) => write!(f, "load.g {}", index),
            Instr::StoreGlobal(index) => write!(f, "store.g {}", index),
            Instr::Widen => write!(f, "widen"),
            Instr::Binary(op) => write!(f, "op {}", op.symbol()),
            Instr::Neg => write!(f, "neg"),
            Instr::Jump(target) => write!(f, "jump {}", target),
            Instr::JumpIfZero(target) => write!(f, "jz {}", target),
            Instr::Call { function, argc } => write!(f, "call {} ({})", function, argc),
            Instr::CallIntrinsic(intrinsic) => write!(f, "call {}", intrinsic),
            Instr::Return => write!(f, "ret"),
            Instr::ReturnVoid => write!(f, "ret.v"),
            Instr::Pop => write!(f, "pop"),
            Instr::Dup => write!(f, "dup"),
        }
    }
}

/// One lowered function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub param_count: usize,
    /// Type of every frame slot, parameters first
    pub slot_types: Vec<Type>,
    pub return_type: Type,
    pub code: Vec<Instr>,
    /// Source location of each instruction, parallel to `code`
    pub locations: Vec<SourceLocation>,
}

impl Function {
    pub fn location_of(&self, pc: usize) -> SourceLocation {
        self.locations.get(pc).copied().unwrap_or_default()
    }
}

/// A whole lowered program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub functions: Vec<Function>,
    /// Type of every global, by store index
    pub globals: Vec<Type>,
    /// String literal pool
    pub strings: Vec<String>,
    /// Index of `main` in `functions`
    pub entry: usize,
}

impl Module {
    /// Human-readable listing of every function's code
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (index, function) in self.functions.iter().enumerate() {
            out.push_str(&format!(
                "fn #{} {}/{} -> {} ({} slots)\n",
                index,
                function.name,
                function.param_count,
                function.return_type,
                function.slot_types.len()
            ));
            for (pc, instr) in function.code.iter().enumerate() {
                out.push_str(&format!("  {:4}  {}\n", pc, instr));
            }
        }
        out
    }
}
