//! Lowering from the checked AST to stack-machine bytecode
//!
//! Each function becomes one [`Function`] whose code evaluates expressions
//! left to right on the operand stack. The resolver's bindings decide where
//! a name is loaded from or stored to, and the checker's types decide where a
//! `char` must be widened to `int`.
//!
//! Every function ends in an implicit return, so falling off the end yields
//! nothing from a `void` function and zero otherwise.

pub mod instr;

pub use instr::{Function, Instr, Module, StrId};

use crate::parser::ast::*;
use crate::semantic::scope::{Symbol, SymbolKind};
use crate::semantic::{Resolution, TypeTable};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

/// A node reached code generation without the annotations analysis should
/// have attached. Seeing one means an earlier stage let a bad program through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("internal error: node {node} at {location} has no {missing}")]
pub struct CodegenError {
    pub node: NodeId,
    pub missing: &'static str,
    pub location: SourceLocation,
}

/// Lower a resolved and checked program.
pub fn generate(
    program: &Program,
    resolution: &Resolution,
    types: &TypeTable,
) -> Result<Module, CodegenError> {
    let mut generator = Generator {
        resolution,
        types,
        strings: Vec::new(),
        string_ids: FxHashMap::default(),
    };

    let mut functions = Vec::new();
    for func in program.functions() {
        functions.push(generator.lower_function(func)?);
    }

    let entry = match resolution.main.map(|id| &resolution.symbols.get(id).kind) {
        Some(SymbolKind::Function { index, .. }) => *index,
        _ => {
            return Err(CodegenError {
                node: 0,
                missing: "entry point",
                location: SourceLocation::default(),
            })
        }
    };

    let module = Module {
        functions,
        globals: resolution.globals.clone(),
        strings: generator.strings,
        entry,
    };
    debug!(
        functions = module.functions.len(),
        instructions = module.functions.iter().map(|f| f.code.len()).sum::<usize>(),
        strings = module.strings.len(),
        "bytecode generated"
    );
    Ok(module)
}

struct Generator<'a> {
    resolution: &'a Resolution,
    types: &'a TypeTable,
    strings: Vec<String>,
    string_ids: FxHashMap<String, StrId>,
}

/// Code of the function being lowered, with the source location of each instruction
#[derive(Default)]
struct Emitter {
    code: Vec<Instr>,
    locations: Vec<SourceLocation>,
}

impl Emitter {
    fn emit(&mut self, instr: Instr, location: SourceLocation) -> usize {
        self.code.push(instr);
        self.locations.push(location);
        self.code.len() - 1
    }

    fn patch(&mut self, at: usize, instr: Instr) {
        self.code[at] = instr;
    }

    fn here(&self) -> usize {
        self.code.len()
    }
}

impl<'a> Generator<'a> {
    fn lower_function(&mut self, func: &FunctionDecl) -> Result<Function, CodegenError> {
        let layout = match self.symbol(func.id, func.location)?.kind {
            SymbolKind::Function { index, .. } => self.resolution.functions.get(index),
            _ => None,
        }
        .ok_or(CodegenError {
            node: func.id,
            missing: "frame layout",
            location: func.location,
        })?;

        let mut out = Emitter::default();
        for stmt in &func.body.statements {
            self.lower_statement(stmt, func.return_type, &mut out)?;
        }

        match func.return_type {
            Type::Void => {
                out.emit(Instr::ReturnVoid, func.location);
            }
            ty => {
                out.emit(zero_of(ty), func.location);
                out.emit(Instr::Return, func.location);
            }
        }

        Ok(Function {
            name: func.name.clone(),
            param_count: layout.param_count,
            slot_types: layout.slot_types.clone(),
            return_type: func.return_type,
            code: out.code,
            locations: out.locations,
        })
    }

    fn lower_statement(
        &mut self,
        stmt: &Stmt,
        return_type: Type,
        out: &mut Emitter,
    ) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Block(block) => {
                for stmt in &block.statements {
                    self.lower_statement(stmt, return_type, out)?;
                }
            }
            Stmt::VarDecl(var) => {
                // Re-entering a declaration starts the variable over at zero
                out.emit(zero_of(var.var_type), var.location);
                self.store(var.id, var.location, out)?;
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                location,
            } => {
                self.lower_expression(condition, out)?;
                let skip_then = out.emit(Instr::JumpIfZero(0), *location);
                self.lower_statement(then_branch, return_type, out)?;

                match else_branch {
                    Some(else_branch) => {
                        let skip_else = out.emit(Instr::Jump(0), *location);
                        out.patch(skip_then, Instr::JumpIfZero(out.here()));
                        self.lower_statement(else_branch, return_type, out)?;
                        out.patch(skip_else, Instr::Jump(out.here()));
                    }
                    None => out.patch(skip_then, Instr::JumpIfZero(out.here())),
                }
            }
            Stmt::While {
                condition,
                body,
                location,
            } => {
                let start = out.here();
                self.lower_expression(condition, out)?;
                let exit = out.emit(Instr::JumpIfZero(0), *location);
                self.lower_statement(body, return_type, out)?;
                out.emit(Instr::Jump(start), *location);
                out.patch(exit, Instr::JumpIfZero(out.here()));
            }
            Stmt::Return {
                expr: None,
                location,
            } => {
                out.emit(Instr::ReturnVoid, *location);
            }
            Stmt::Return {
                expr: Some(expr),
                location,
            } => {
                self.lower_expression(expr, out)?;
                self.widen_into(expr, return_type, out)?;
                out.emit(Instr::Return, *location);
            }
            Stmt::Expr { expr, location } => {
                self.lower_expression(expr, out)?;
                if self.type_of(expr)? != Type::Void {
                    out.emit(Instr::Pop, *location);
                }
            }
        }
        Ok(())
    }

    fn lower_expression(&mut self, expr: &Expr, out: &mut Emitter) -> Result<(), CodegenError> {
        let location = expr.location;
        match &expr.kind {
            ExprKind::IntLiteral(n) => {
                out.emit(Instr::PushInt(*n), location);
            }
            ExprKind::CharLiteral(c) => {
                out.emit(Instr::PushChar(*c), location);
            }
            ExprKind::StringLiteral(s) => {
                let id = self.intern(s);
                out.emit(Instr::PushStr(id), location);
            }
            ExprKind::Identifier(_) => {
                let instr = match self.symbol(expr.id, location)?.kind {
                    SymbolKind::Global { index } => Instr::LoadGlobal(index),
                    SymbolKind::Param { slot } | SymbolKind::Local { slot } => {
                        Instr::LoadLocal(slot)
                    }
                    _ => return Err(self.missing(expr.id, "variable binding", location)),
                };
                out.emit(instr, location);
            }
            ExprKind::Binary { op, left, right } => {
                self.lower_expression(left, out)?;
                self.widen_into(left, Type::Int, out)?;
                self.lower_expression(right, out)?;
                self.widen_into(right, Type::Int, out)?;
                out.emit(Instr::Binary(*op), location);
            }
            ExprKind::Unary {
                op: UnOp::Neg,
                operand,
            } => {
                self.lower_expression(operand, out)?;
                self.widen_into(operand, Type::Int, out)?;
                out.emit(Instr::Neg, location);
            }
            ExprKind::Assign { target, value } => {
                self.lower_expression(value, out)?;
                let target_type = self.symbol(target.id, target.location)?.ty;
                self.widen_into(value, target_type, out)?;
                out.emit(Instr::Dup, location);
                self.store(target.id, target.location, out)?;
            }
            ExprKind::Call { callee, args } => {
                for arg in args {
                    self.lower_expression(arg, out)?;
                }
                let instr = match self.symbol(callee.id, callee.location)?.kind {
                    SymbolKind::Function { index, .. } => Instr::Call {
                        function: index,
                        argc: args.len(),
                    },
                    SymbolKind::Intrinsic(intrinsic) => Instr::CallIntrinsic(intrinsic),
                    _ => return Err(self.missing(callee.id, "function binding", callee.location)),
                };
                out.emit(instr, location);
            }
        }
        Ok(())
    }

    /// Emit the store for the variable bound to `node`
    fn store(&self, node: NodeId, location: SourceLocation, out: &mut Emitter) -> Result<(), CodegenError> {
        let instr = match self.symbol(node, location)?.kind {
            SymbolKind::Global { index } => Instr::StoreGlobal(index),
            SymbolKind::Param { slot } | SymbolKind::Local { slot } => Instr::StoreLocal(slot),
            _ => return Err(self.missing(node, "variable binding", location)),
        };
        out.emit(instr, location);
        Ok(())
    }

    /// Widen the value of `expr`, just pushed, if `target` is `int` and it is a `char`
    fn widen_into(&self, expr: &Expr, target: Type, out: &mut Emitter) -> Result<(), CodegenError> {
        if target == Type::Int && self.type_of(expr)? == Type::Char {
            out.emit(Instr::Widen, expr.location);
        }
        Ok(())
    }

    fn intern(&mut self, s: &str) -> StrId {
        if let Some(id) = self.string_ids.get(s) {
            return *id;
        }
        let id = self.strings.len();
        self.strings.push(s.to_string());
        self.string_ids.insert(s.to_string(), id);
        id
    }

    fn type_of(&self, expr: &Expr) -> Result<Type, CodegenError> {
        self.types
            .get(&expr.id)
            .copied()
            .ok_or_else(|| self.missing(expr.id, "type", expr.location))
    }

    fn symbol(&self, node: NodeId, location: SourceLocation) -> Result<&'a Symbol, CodegenError> {
        self.resolution
            .symbol_of(node)
            .ok_or_else(|| self.missing(node, "symbol binding", location))
    }

    fn missing(&self, node: NodeId, missing: &'static str, location: SourceLocation) -> CodegenError {
        CodegenError {
            node,
            missing,
            location,
        }
    }
}

fn zero_of(ty: Type) -> Instr {
    match ty {
        Type::Char => Instr::PushChar(0),
        _ => Instr::PushInt(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::semantic::{check, resolve};

    fn lower(source: &str) -> Module {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        let resolution = resolve(&program).unwrap();
        let types = check(&program, &resolution).unwrap();
        generate(&program, &resolution, &types).unwrap()
    }

    #[test]
    fn test_entry_is_main() {
        let module = lower("int f() { return 1; } void main() { f(); }");
        assert_eq!(module.entry, 1);
        assert_eq!(module.functions[1].name, "main");
    }

    #[test]
    fn test_if_else_jumps() {
        let module = lower("int g; void main() { if (g) g = 1; else g = 2; }");
        assert_eq!(
            module.functions[0].code,
            vec![
                Instr::LoadGlobal(0),
                Instr::JumpIfZero(7),
                Instr::PushInt(1),
                Instr::Dup,
                Instr::StoreGlobal(0),
                Instr::Pop,
                Instr::Jump(11),
                Instr::PushInt(2),
                Instr::Dup,
                Instr::StoreGlobal(0),
                Instr::Pop,
                Instr::ReturnVoid,
            ]
        );
    }

    #[test]
    fn test_while_loops_back_to_condition() {
        let module = lower("void main() { int c; while (c < 3) c = c + 1; }");
        let code = &module.functions[0].code;
        assert_eq!(code[0], Instr::PushInt(0));
        assert_eq!(code[1], Instr::StoreLocal(0));
        assert!(code.contains(&Instr::Jump(2)));
        assert_eq!(code.last(), Some(&Instr::ReturnVoid));
    }

    #[test]
    fn test_char_widened_for_int_contexts() {
        let module = lower("int f(char c) { int x; x = c; return c + 1; } void main() { }");
        let code = &module.functions[0].code;
        assert_eq!(
            &code[..6],
            &[
                Instr::PushInt(0),
                Instr::StoreLocal(1),
                Instr::LoadLocal(0),
                Instr::Widen,
                Instr::Dup,
                Instr::StoreLocal(1),
            ]
        );
        assert!(code.windows(2).any(|w| w == [Instr::LoadLocal(0), Instr::Widen]));
    }

    #[test]
    fn test_strings_are_pooled() {
        let module = lower("void main() { print_s(\" \"); print_s(\"x\"); print_s(\" \"); }");
        assert_eq!(module.strings, vec![" ".to_string(), "x".to_string()]);
        assert_eq!(module.functions[0].code[0], Instr::PushStr(0));
        assert_eq!(module.functions[0].code[1], Instr::CallIntrinsic(crate::semantic::Intrinsic::PrintS));
    }

    #[test]
    fn test_non_void_function_falls_back_to_zero() {
        let module = lower("int f(int n) { if (n) return 1; } void main() { }");
        let code = &module.functions[0].code;
        assert_eq!(&code[code.len() - 2..], &[Instr::PushInt(0), Instr::Return]);
    }

    #[test]
    fn test_disassemble_lists_functions() {
        let listing = lower("void main() { print_i(7); }").disassemble();
        assert!(listing.starts_with("fn #0 main/0 -> void (0 slots)"));
        assert!(listing.contains("push.i 7"));
        assert!(listing.contains("call print_i"));
    }
}
