//! Name resolution
//!
//! Walks the program in declaration order and binds every name occurrence to
//! a [`Symbol`]. Bindings are recorded in [`Resolution::bindings`], keyed by
//! the node id of the occurrence; declarations are bound to the symbol they
//! introduce, so later stages can go from any declaring node to its storage.
//!
//! # Scoping
//!
//! - The global scope starts out holding the intrinsics.
//! - A function's own name is declared before its body, so it may call itself,
//!   but a function declared further down is not yet visible.
//! - Parameters get a scope of their own and the body opens the next one, so
//!   a local may shadow a parameter; every nested block opens another. Inner
//!   declarations shadow outer ones.
//!
//! # Storage
//!
//! Globals get consecutive indices in the global store. Inside a function the
//! parameters take frame slots `0..n` in order and each local declaration the
//! next free slot after them. Slots are not reused between sibling blocks.

use crate::parser::ast::*;
use crate::semantic::errors::SemanticError;
use crate::semantic::intrinsics::Intrinsic;
use crate::semantic::scope::{ScopeStack, Symbol, SymbolId, SymbolKind, SymbolTable};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Frame shape of one user function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionLayout {
    pub symbol: SymbolId,
    pub param_count: usize,
    /// Type of every frame slot, parameters first
    pub slot_types: Vec<Type>,
}

/// Result of name resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub symbols: SymbolTable,
    /// Name occurrence or declaration → symbol
    pub bindings: FxHashMap<NodeId, SymbolId>,
    /// Indexed by the `index` of [`SymbolKind::Function`]
    pub functions: Vec<FunctionLayout>,
    /// Declared type of every global, by store index
    pub globals: Vec<Type>,
    /// The top-level symbol named `main`, if any
    pub main: Option<SymbolId>,
}

impl Resolution {
    /// Symbol bound to `node`, if the node is a name occurrence or declaration
    pub fn symbol_of(&self, node: NodeId) -> Option<&Symbol> {
        self.bindings.get(&node).map(|id| self.symbols.get(*id))
    }
}

/// Resolve every name in `program`.
pub fn resolve(program: &Program) -> Result<Resolution, SemanticError> {
    let mut resolver = Resolver::new();
    resolver.resolve_program(program)?;

    let resolution = resolver.resolution;
    debug!(
        symbols = resolution.symbols.len(),
        bindings = resolution.bindings.len(),
        functions = resolution.functions.len(),
        globals = resolution.globals.len(),
        "names resolved"
    );
    Ok(resolution)
}

/// Slot allocation for the function being resolved
struct Frame {
    param_count: usize,
    slot_types: Vec<Type>,
}

struct Resolver {
    resolution: Resolution,
    scopes: ScopeStack,
    frame: Option<Frame>,
}

impl Resolver {
    fn new() -> Self {
        let mut resolver = Resolver {
            resolution: Resolution::default(),
            scopes: ScopeStack::new(),
            frame: None,
        };

        for intrinsic in Intrinsic::ALL {
            let id = resolver.resolution.symbols.add(Symbol {
                name: intrinsic.name().to_string(),
                ty: intrinsic.return_type(),
                kind: SymbolKind::Intrinsic(intrinsic),
                decl: None,
                location: None,
            });
            let declared = resolver.scopes.declare(intrinsic.name(), id);
            debug_assert!(declared.is_ok(), "intrinsic '{}' declared twice", intrinsic.name());
        }

        resolver
    }

    fn resolve_program(&mut self, program: &Program) -> Result<(), SemanticError> {
        for decl in &program.decls {
            match decl {
                Decl::Var(var) => self.declare_global(var)?,
                Decl::Function(func) => self.resolve_function(func)?,
            }
        }
        Ok(())
    }

    /// Add a symbol to the table and bind it in the innermost scope.
    fn declare(
        &mut self,
        name: &str,
        ty: Type,
        kind: SymbolKind,
        decl: NodeId,
        location: SourceLocation,
    ) -> Result<SymbolId, SemanticError> {
        let id = self.resolution.symbols.add(Symbol {
            name: name.to_string(),
            ty,
            kind,
            decl: Some(decl),
            location: Some(location),
        });

        if let Err(existing) = self.scopes.declare(name, id) {
            return Err(SemanticError::DuplicateDeclaration {
                name: name.to_string(),
                location,
                previous: self.resolution.symbols.get(existing).location,
            });
        }

        self.resolution.bindings.insert(decl, id);
        Ok(id)
    }

    fn declare_global(&mut self, var: &VarDecl) -> Result<(), SemanticError> {
        let index = self.resolution.globals.len();
        self.declare(
            &var.name,
            var.var_type,
            SymbolKind::Global { index },
            var.id,
            var.location,
        )?;
        self.resolution.globals.push(var.var_type);
        Ok(())
    }

    fn resolve_function(&mut self, func: &FunctionDecl) -> Result<(), SemanticError> {
        let index = self.resolution.functions.len();
        let params = func.params.iter().map(|p| p.param_type).collect();
        let symbol = self.declare(
            &func.name,
            func.return_type,
            SymbolKind::Function { index, params },
            func.id,
            func.location,
        )?;

        if func.name == "main" {
            self.resolution.main = Some(symbol);
        }

        self.frame = Some(Frame {
            param_count: func.params.len(),
            slot_types: Vec::new(),
        });
        self.scopes.push();

        for param in &func.params {
            let slot = self.allocate_slot(param.param_type);
            self.declare(
                &param.name,
                param.param_type,
                SymbolKind::Param { slot },
                param.id,
                param.location,
            )?;
        }

        // The body opens its own scope, so a local may shadow a parameter
        self.scopes.push();
        let body = func
            .body
            .statements
            .iter()
            .try_for_each(|stmt| self.resolve_statement(stmt));
        self.scopes.pop();
        body?;

        self.scopes.pop();
        let frame = self.frame.take().unwrap_or(Frame {
            param_count: func.params.len(),
            slot_types: Vec::new(),
        });
        self.resolution.functions.push(FunctionLayout {
            symbol,
            param_count: frame.param_count,
            slot_types: frame.slot_types,
        });

        Ok(())
    }

    fn allocate_slot(&mut self, ty: Type) -> usize {
        match self.frame.as_mut() {
            Some(frame) => {
                frame.slot_types.push(ty);
                frame.slot_types.len() - 1
            }
            None => 0,
        }
    }

    fn resolve_statement(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Block(block) => {
                self.scopes.push();
                let result = block
                    .statements
                    .iter()
                    .try_for_each(|stmt| self.resolve_statement(stmt));
                self.scopes.pop();
                result
            }
            Stmt::VarDecl(var) => {
                let slot = self.allocate_slot(var.var_type);
                self.declare(
                    &var.name,
                    var.var_type,
                    SymbolKind::Local { slot },
                    var.id,
                    var.location,
                )?;
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expression(condition)?;
                self.resolve_statement(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_statement(else_branch)?;
                }
                Ok(())
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.resolve_expression(condition)?;
                self.resolve_statement(body)
            }
            Stmt::Return { expr, .. } => match expr {
                Some(expr) => self.resolve_expression(expr),
                None => Ok(()),
            },
            Stmt::Expr { expr, .. } => self.resolve_expression(expr),
        }
    }

    fn resolve_expression(&mut self, expr: &Expr) -> Result<(), SemanticError> {
        match &expr.kind {
            ExprKind::IntLiteral(_) | ExprKind::CharLiteral(_) | ExprKind::StringLiteral(_) => {
                Ok(())
            }
            ExprKind::Identifier(name) => self.bind_variable(expr.id, name, expr.location),
            ExprKind::Binary { left, right, .. } => {
                self.resolve_expression(left)?;
                self.resolve_expression(right)
            }
            ExprKind::Unary { operand, .. } => self.resolve_expression(operand),
            ExprKind::Assign { target, value } => {
                self.bind_variable(target.id, &target.name, target.location)?;
                self.resolve_expression(value)
            }
            ExprKind::Call { callee, args } => {
                let id = self.lookup(&callee.name, callee.location)?;
                if !self.resolution.symbols.get(id).is_callable() {
                    return Err(SemanticError::mismatch(
                        format!("'{}' is a variable, not a function", callee.name),
                        callee.location,
                    ));
                }
                self.resolution.bindings.insert(callee.id, id);
                args.iter().try_for_each(|arg| self.resolve_expression(arg))
            }
        }
    }

    /// Bind a name that must denote a variable
    fn bind_variable(
        &mut self,
        node: NodeId,
        name: &str,
        location: SourceLocation,
    ) -> Result<(), SemanticError> {
        let id = self.lookup(name, location)?;
        if self.resolution.symbols.get(id).is_callable() {
            return Err(SemanticError::mismatch(
                format!("'{}' is a function, not a variable", name),
                location,
            ));
        }
        self.resolution.bindings.insert(node, id);
        Ok(())
    }

    fn lookup(&self, name: &str, location: SourceLocation) -> Result<SymbolId, SemanticError> {
        self.scopes
            .lookup(name)
            .ok_or_else(|| SemanticError::UnresolvedIdentifier {
                name: name.to_string(),
                location,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    fn resolve_source(source: &str) -> Result<Resolution, SemanticError> {
        resolve(&parse(source))
    }

    /// Symbol bound to the first `Identifier` expression named `name` in `func`.
    fn binding_in(program: &Program, res: &Resolution, func: &str, name: &str) -> Symbol {
        fn find(stmt: &Stmt, name: &str) -> Option<NodeId> {
            match stmt {
                Stmt::Block(b) => b.statements.iter().find_map(|s| find(s, name)),
                Stmt::Expr { expr, .. } | Stmt::Return { expr: Some(expr), .. } => find_expr(expr, name),
                Stmt::If { condition, then_branch, else_branch, .. } => find_expr(condition, name)
                    .or_else(|| find(then_branch, name))
                    .or_else(|| else_branch.as_ref().and_then(|e| find(e, name))),
                Stmt::While { condition, body, .. } => find_expr(condition, name).or_else(|| find(body, name)),
                _ => None,
            }
        }
        fn find_expr(expr: &Expr, name: &str) -> Option<NodeId> {
            match &expr.kind {
                ExprKind::Identifier(n) if n == name => Some(expr.id),
                ExprKind::Binary { left, right, .. } => find_expr(left, name).or_else(|| find_expr(right, name)),
                ExprKind::Unary { operand, .. } => find_expr(operand, name),
                ExprKind::Assign { value, .. } => find_expr(value, name),
                ExprKind::Call { args, .. } => args.iter().find_map(|a| find_expr(a, name)),
                _ => None,
            }
        }

        let func = program.functions().find(|f| f.name == func).unwrap();
        let node = func.body.statements.iter().find_map(|s| find(s, name)).unwrap();
        res.symbol_of(node).unwrap().clone()
    }

    #[test]
    fn test_parameter_shadows_global() {
        let program = parse(
            "int iteration_counter;
             int shadow(int a, int iteration_counter) { print_i(iteration_counter); return a; }",
        );
        let res = resolve(&program).unwrap();

        let symbol = binding_in(&program, &res, "shadow", "iteration_counter");
        assert_eq!(symbol.kind, SymbolKind::Param { slot: 1 });
    }

    #[test]
    fn test_recursion_resolves() {
        let res = resolve_source("int f(int n) { return f(n); }").unwrap();
        assert_eq!(res.functions.len(), 1);
    }

    #[test]
    fn test_forward_reference_is_unresolved() {
        let err = resolve_source("void a() { b(); }\nvoid b() { }").unwrap_err();
        assert_eq!(
            err,
            SemanticError::UnresolvedIdentifier {
                name: "b".to_string(),
                location: SourceLocation::new(1, 12),
            }
        );
    }

    #[test]
    fn test_duplicate_global() {
        let err = resolve_source("int variable1;\nint variable1;").unwrap_err();
        assert_eq!(
            err,
            SemanticError::DuplicateDeclaration {
                name: "variable1".to_string(),
                location: SourceLocation::new(2, 5),
                previous: Some(SourceLocation::new(1, 5)),
            }
        );
    }

    #[test]
    fn test_redefining_intrinsic_is_duplicate() {
        let err = resolve_source("void print_i(int x) { }").unwrap_err();
        assert!(matches!(
            err,
            SemanticError::DuplicateDeclaration { previous: None, .. }
        ));
    }

    #[test]
    fn test_local_shadows_parameter() {
        let program = parse("void f(int a) { int a; a = 2; print_i(a); }");
        let res = resolve(&program).unwrap();

        let symbol = binding_in(&program, &res, "f", "a");
        assert_eq!(symbol.kind, SymbolKind::Local { slot: 1 });
        assert_eq!(res.functions[0].slot_types, vec![Type::Int, Type::Int]);
    }

    #[test]
    fn test_duplicate_parameter() {
        let err = resolve_source("void f(int a, char a) { }").unwrap_err();
        assert!(matches!(err, SemanticError::DuplicateDeclaration { .. }));
    }

    #[test]
    fn test_duplicate_local_in_body() {
        let err = resolve_source("void f(int a) { int b; char b; }").unwrap_err();
        assert!(matches!(err, SemanticError::DuplicateDeclaration { .. }));
    }

    #[test]
    fn test_every_intrinsic_is_visible() {
        let res = resolve_source(
            "void main() { char c; print_i(read_i()); c = read_c(); print_c(c); print_s(\"\"); }",
        )
        .unwrap();
        let intrinsics = res
            .symbols
            .iter()
            .filter(|(_, symbol)| matches!(symbol.kind, SymbolKind::Intrinsic(_)))
            .count();
        assert_eq!(intrinsics, Intrinsic::ALL.len());
    }

    #[test]
    fn test_nested_block_may_shadow_local() {
        let res = resolve_source("void f() { int a; { char a; a = 'x'; } }").unwrap();
        assert_eq!(res.functions[0].slot_types, vec![Type::Int, Type::Char]);
    }

    #[test]
    fn test_slots_params_then_locals() {
        let res = resolve_source("int f(int a, char b) { int x; { int y; } int z; return a; }").unwrap();
        let layout = &res.functions[0];
        assert_eq!(layout.param_count, 2);
        assert_eq!(
            layout.slot_types,
            vec![Type::Int, Type::Char, Type::Int, Type::Int, Type::Int]
        );
    }

    #[test]
    fn test_calling_a_variable() {
        let err = resolve_source("int x; void main() { x(); }").unwrap_err();
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_function_used_as_value() {
        let err = resolve_source("int f() { return 1; } void main() { f = 2; }").unwrap_err();
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_main_is_recorded() {
        let res = resolve_source("int g; void main() { g = read_i(); }").unwrap();
        let main = res.main.unwrap();
        assert_eq!(res.symbols.get(main).name, "main");
        assert_eq!(res.globals, vec![Type::Int]);
    }
}
