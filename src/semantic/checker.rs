//! Type checking
//!
//! Assigns a [`Type`] to every expression node and validates statements
//! against the declared types of the symbols they use.
//!
//! # Rules
//!
//! - Arithmetic, comparison and unary minus take `int` or `char` operands
//!   (a `char` widens) and produce `int`.
//! - Assignment accepts the target's own type, or `char` into an `int`.
//! - Call arguments must match the parameter types exactly.
//! - A `void` call may only stand alone as an expression statement.
//! - `if`/`while` conditions are `int` or `char`.
//! - `return e;` needs a non-void function and an assignable `e`; `return;`
//!   needs a void function. A non-void function needs at least one `return`.
//! - `main` takes no parameters and returns `void` or `int`.

use crate::parser::ast::*;
use crate::semantic::errors::SemanticError;
use crate::semantic::resolver::Resolution;
use crate::semantic::scope::{Symbol, SymbolKind};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Type of every expression, by node id
pub type TypeTable = FxHashMap<NodeId, Type>;

/// Type check a resolved program.
pub fn check(program: &Program, resolution: &Resolution) -> Result<TypeTable, SemanticError> {
    let mut checker = Checker {
        resolution,
        types: TypeTable::default(),
        return_type: Type::Void,
        saw_return: false,
    };

    for decl in &program.decls {
        match decl {
            Decl::Var(var) => check_not_void(var.var_type, &var.name, var.location)?,
            Decl::Function(func) => checker.check_function(func)?,
        }
    }
    checker.check_main()?;

    debug!(expressions = checker.types.len(), "types checked");
    Ok(checker.types)
}

fn check_not_void(ty: Type, name: &str, location: SourceLocation) -> Result<(), SemanticError> {
    if ty == Type::Void {
        return Err(SemanticError::mismatch(
            format!("variable '{}' declared void", name),
            location,
        ));
    }
    Ok(())
}

struct Checker<'a> {
    resolution: &'a Resolution,
    types: TypeTable,
    /// Declared return type of the function being checked
    return_type: Type,
    saw_return: bool,
}

impl<'a> Checker<'a> {
    fn check_function(&mut self, func: &FunctionDecl) -> Result<(), SemanticError> {
        for param in &func.params {
            check_not_void(param.param_type, &param.name, param.location)?;
        }

        self.return_type = func.return_type;
        self.saw_return = false;

        for stmt in &func.body.statements {
            self.check_statement(stmt)?;
        }

        if func.return_type != Type::Void && !self.saw_return {
            return Err(SemanticError::MissingReturn {
                name: func.name.clone(),
                return_type: func.return_type,
                location: func.location,
            });
        }
        Ok(())
    }

    fn check_main(&self) -> Result<(), SemanticError> {
        let main = self
            .resolution
            .main
            .map(|id| self.resolution.symbols.get(id))
            .ok_or(SemanticError::MissingMain)?;
        let location = main.location.unwrap_or_default();

        if let SymbolKind::Function { params, .. } = &main.kind {
            if !params.is_empty() {
                return Err(SemanticError::mismatch(
                    "'main' must not take parameters",
                    location,
                ));
            }
        }
        if !matches!(main.ty, Type::Void | Type::Int) {
            return Err(SemanticError::mismatch(
                format!("'main' must return void or int, not {}", main.ty),
                location,
            ));
        }
        Ok(())
    }

    fn check_statement(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Block(block) => block
                .statements
                .iter()
                .try_for_each(|stmt| self.check_statement(stmt)),
            Stmt::VarDecl(var) => check_not_void(var.var_type, &var.name, var.location),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition, "if")?;
                self.check_statement(then_branch)?;
                match else_branch {
                    Some(else_branch) => self.check_statement(else_branch),
                    None => Ok(()),
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.check_condition(condition, "while")?;
                self.check_statement(body)
            }
            Stmt::Return { expr, location } => {
                self.saw_return = true;
                self.check_return(expr.as_ref(), *location)
            }
            Stmt::Expr { expr, .. } => self.check_expression(expr).map(|_| ()),
        }
    }

    fn check_condition(&mut self, condition: &Expr, keyword: &str) -> Result<(), SemanticError> {
        let ty = self.check_value(condition)?;
        if !ty.is_integral() {
            return Err(SemanticError::mismatch(
                format!("{} condition must be int or char, found {}", keyword, ty),
                condition.location,
            ));
        }
        Ok(())
    }

    fn check_return(&mut self, expr: Option<&Expr>, location: SourceLocation) -> Result<(), SemanticError> {
        match (expr, self.return_type) {
            (None, Type::Void) => Ok(()),
            (None, expected) => Err(SemanticError::mismatch(
                format!("return without a value in a function returning {}", expected),
                location,
            )),
            (Some(expr), Type::Void) => Err(SemanticError::mismatch(
                "return with a value in a function returning void",
                expr.location,
            )),
            (Some(expr), expected) => {
                let ty = self.check_value(expr)?;
                if !ty.is_assignable_to(expected) {
                    return Err(SemanticError::mismatch(
                        format!("cannot return {} from a function returning {}", ty, expected),
                        expr.location,
                    ));
                }
                Ok(())
            }
        }
    }

    /// Check an expression whose value is used
    fn check_value(&mut self, expr: &Expr) -> Result<Type, SemanticError> {
        let ty = self.check_expression(expr)?;
        if ty == Type::Void {
            let what = match &expr.kind {
                ExprKind::Call { callee, .. } => format!("'{}'", callee.name),
                _ => "expression".to_string(),
            };
            return Err(SemanticError::mismatch(
                format!("void result of {} used as a value", what),
                expr.location,
            ));
        }
        Ok(ty)
    }

    fn check_expression(&mut self, expr: &Expr) -> Result<Type, SemanticError> {
        let ty = match &expr.kind {
            ExprKind::IntLiteral(_) => Type::Int,
            ExprKind::CharLiteral(_) => Type::Char,
            ExprKind::StringLiteral(_) => Type::Str,
            ExprKind::Identifier(name) => self.symbol(expr.id, name, expr.location)?.ty,
            ExprKind::Binary { op, left, right } => {
                let lhs = self.check_value(left)?;
                let rhs = self.check_value(right)?;
                if !lhs.is_integral() || !rhs.is_integral() {
                    return Err(SemanticError::mismatch(
                        format!(
                            "operator '{}' needs int or char operands, found {} and {}",
                            op.symbol(),
                            lhs,
                            rhs
                        ),
                        expr.location,
                    ));
                }
                Type::Int
            }
            ExprKind::Unary { operand, .. } => {
                let ty = self.check_value(operand)?;
                if !ty.is_integral() {
                    return Err(SemanticError::mismatch(
                        format!("cannot negate a value of type {}", ty),
                        expr.location,
                    ));
                }
                Type::Int
            }
            ExprKind::Assign { target, value } => {
                let target_ty = self.symbol(target.id, &target.name, target.location)?.ty;
                let value_ty = self.check_value(value)?;
                if !value_ty.is_assignable_to(target_ty) {
                    return Err(SemanticError::mismatch(
                        format!(
                            "cannot assign {} to '{}' of type {}",
                            value_ty, target.name, target_ty
                        ),
                        value.location,
                    ));
                }
                target_ty
            }
            ExprKind::Call { callee, args } => {
                let signature = self
                    .symbol(callee.id, &callee.name, callee.location)?
                    .signature()
                    .ok_or_else(|| {
                        SemanticError::mismatch(
                            format!("'{}' is not a function", callee.name),
                            callee.location,
                        )
                    })?;

                if args.len() != signature.params.len() {
                    return Err(SemanticError::ArityMismatch {
                        name: signature.name,
                        expected: signature.params.len(),
                        found: args.len(),
                        location: expr.location,
                    });
                }

                for (position, (arg, &param)) in args.iter().zip(&signature.params).enumerate() {
                    let arg_ty = self.check_value(arg)?;
                    if arg_ty != param {
                        return Err(SemanticError::mismatch(
                            format!(
                                "argument {} of '{}' must be {}, found {}",
                                position + 1,
                                signature.name,
                                param,
                                arg_ty
                            ),
                            arg.location,
                        ));
                    }
                }
                signature.ret
            }
        };

        self.types.insert(expr.id, ty);
        Ok(ty)
    }

    fn symbol(&self, node: NodeId, name: &str, location: SourceLocation) -> Result<&'a Symbol, SemanticError> {
        self.resolution
            .symbol_of(node)
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
    use crate::semantic::resolver::resolve;

    fn check_source(source: &str) -> Result<TypeTable, SemanticError> {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        let resolution = resolve(&program).unwrap();
        check(&program, &resolution)
    }

    fn assert_mismatch(source: &str, needle: &str) {
        match check_source(source) {
            Err(SemanticError::TypeMismatch { message, .. }) => {
                assert!(message.contains(needle), "message {:?} lacks {:?}", message, needle)
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_char_widens_in_arithmetic_and_assignment() {
        let types = check_source("void main() { int x; char c; c = 'a'; x = c + 1; x = c; }").unwrap();
        assert!(types.values().any(|t| *t == Type::Char));
    }

    #[test]
    fn test_int_does_not_narrow_to_char() {
        assert_mismatch("void main() { char c; c = 65; }", "cannot assign int to 'c'");
    }

    #[test]
    fn test_call_arguments_match_exactly() {
        assert_mismatch("void main() { print_c(65); }", "argument 1 of 'print_c' must be char");
        assert_mismatch("void main() { print_i(\"no\"); }", "must be int, found string");
    }

    #[test]
    fn test_arity_mismatch() {
        let err = check_source("int f(int a) { return a; } void main() { f(1, 2); }").unwrap_err();
        assert!(matches!(
            err,
            SemanticError::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_void_call_as_value() {
        assert_mismatch("void f() { } void main() { int x; x = f(); }", "void result of 'f'");
    }

    #[test]
    fn test_void_call_as_statement_is_fine() {
        assert!(check_source("void f() { } void main() { f(); }").is_ok());
    }

    #[test]
    fn test_return_value_from_void_function() {
        assert_mismatch(
            "void test_method(int value) { return value + 1; } void main() { }",
            "return with a value",
        );
    }

    #[test]
    fn test_bare_return_in_int_function() {
        assert_mismatch("int f() { return; } void main() { }", "return without a value");
    }

    #[test]
    fn test_missing_return() {
        let err = check_source("int shadow(int a) { print_i(a); } void main() { }").unwrap_err();
        assert_eq!(
            err,
            SemanticError::MissingReturn {
                name: "shadow".to_string(),
                return_type: Type::Int,
                location: SourceLocation::new(1, 5),
            }
        );
    }

    #[test]
    fn test_return_in_one_branch_is_accepted() {
        assert!(check_source("int f(int n) { if (n) return 1; } void main() { }").is_ok());
    }

    #[test]
    fn test_string_condition_rejected() {
        assert_mismatch("void main() { while (\"x\") { } }", "while condition");
    }

    #[test]
    fn test_void_variable_rejected() {
        assert_mismatch("void v; void main() { }", "declared void");
    }

    #[test]
    fn test_main_rules() {
        assert_eq!(check_source("void f() { }").unwrap_err(), SemanticError::MissingMain);
        assert_mismatch("void main(int argc) { }", "must not take parameters");
        assert_mismatch("char main() { return 'a'; }", "must return void or int");
        assert!(check_source("int main() { return 0; }").is_ok());
    }

    #[test]
    fn test_comparison_yields_int() {
        let program = Parser::new("void main() { print_i(1 < 'a'); }")
            .unwrap()
            .parse_program()
            .unwrap();
        let resolution = resolve(&program).unwrap();
        let types = check(&program, &resolution).unwrap();
        let comparison_types: Vec<_> = types.values().filter(|t| **t == Type::Int).collect();
        // `1`, `1 < 'a'`
        assert_eq!(comparison_types.len(), 2);
    }
}
