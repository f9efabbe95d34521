//! Compact one-line rendering of a [`Program`]
//!
//! ```text
//! Program(VarDecl(INT, Var(count)), Procedure(VOID, main, Block(Assign(Var(count), IntLiteral(15)))))
//! ```
//!
//! Node ids and locations are left out, so two trees that print the same have
//! the same shape. Used by `toyc ast` and the determinism tests.

use crate::parser::ast::*;

/// Render the whole program.
pub fn print_program(program: &Program) -> String {
    let mut printer = AstPrinter::default();
    printer.program(program);
    printer.out
}

/// Render a single expression.
pub fn print_expr(expr: &Expr) -> String {
    let mut printer = AstPrinter::default();
    printer.expr(expr);
    printer.out
}

#[derive(Default)]
struct AstPrinter {
    out: String,
}

impl AstPrinter {
    fn program(&mut self, program: &Program) {
        self.out.push_str("Program(");
        self.list(&program.decls, |p, decl| match decl {
            Decl::Var(var) => p.var_decl(var.var_type, &var.name),
            Decl::Function(func) => p.function(func),
        });
        self.out.push(')');
    }

    fn function(&mut self, func: &FunctionDecl) {
        self.out.push_str("Procedure(");
        self.type_name(func.return_type);
        self.out.push_str(", ");
        self.out.push_str(&func.name);
        self.out.push_str(", ");
        for param in &func.params {
            self.var_decl(param.param_type, &param.name);
            self.out.push_str(", ");
        }
        self.block(&func.body);
        self.out.push(')');
    }

    fn var_decl(&mut self, ty: Type, name: &str) {
        self.out.push_str("VarDecl(");
        self.type_name(ty);
        self.out.push_str(", Var(");
        self.out.push_str(name);
        self.out.push_str("))");
    }

    fn block(&mut self, block: &Block) {
        self.out.push_str("Block(");
        self.list(&block.statements, Self::stmt);
        self.out.push(')');
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.block(block),
            Stmt::VarDecl(var) => self.var_decl(var.var_type, &var.name),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.out.push_str("If(");
                self.expr(condition);
                self.out.push_str(", ");
                self.stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.out.push_str(", ");
                    self.stmt(else_branch);
                }
                self.out.push(')');
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.out.push_str("While(");
                self.expr(condition);
                self.out.push_str(", ");
                self.stmt(body);
                self.out.push(')');
            }
            Stmt::Return { expr, .. } => {
                self.out.push_str("Return(");
                if let Some(expr) = expr {
                    self.expr(expr);
                }
                self.out.push(')');
            }
            Stmt::Expr { expr, .. } => match &expr.kind {
                ExprKind::Call { callee, args } => self.call("FunCallStmt", &callee.name, args),
                _ => self.expr(expr),
            },
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::IntLiteral(n) => {
                self.out.push_str("IntLiteral(");
                self.out.push_str(&n.to_string());
                self.out.push(')');
            }
            ExprKind::CharLiteral(c) => {
                self.out.push_str("ChrLiteral(");
                self.out.push((*c as u8) as char);
                self.out.push(')');
            }
            ExprKind::StringLiteral(s) => {
                self.out.push_str("StrLiteral(");
                self.out.push_str(s);
                self.out.push(')');
            }
            ExprKind::Identifier(name) => self.var(name),
            ExprKind::Binary { op, left, right } => {
                self.out.push_str("BinOp(");
                self.expr(left);
                self.out.push_str(", ");
                self.out.push_str(op_name(*op));
                self.out.push_str(", ");
                self.expr(right);
                self.out.push(')');
            }
            ExprKind::Unary {
                op: UnOp::Neg,
                operand,
            } => {
                self.out.push_str("Neg(");
                self.expr(operand);
                self.out.push(')');
            }
            ExprKind::Assign { target, value } => {
                self.out.push_str("Assign(");
                self.var(&target.name);
                self.out.push_str(", ");
                self.expr(value);
                self.out.push(')');
            }
            ExprKind::Call { callee, args } => self.call("FunCallExpr", &callee.name, args),
        }
    }

    fn call(&mut self, label: &str, name: &str, args: &[Expr]) {
        self.out.push_str(label);
        self.out.push('(');
        self.out.push_str(name);
        for arg in args {
            self.out.push_str(", ");
            self.expr(arg);
        }
        self.out.push(')');
    }

    fn var(&mut self, name: &str) {
        self.out.push_str("Var(");
        self.out.push_str(name);
        self.out.push(')');
    }

    fn type_name(&mut self, ty: Type) {
        self.out.push_str(&ty.to_string().to_uppercase());
    }

    fn list<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            each(self, item);
        }
    }
}

fn op_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "ADD",
        BinOp::Sub => "SUB",
        BinOp::Mul => "MUL",
        BinOp::Div => "DIV",
        BinOp::Mod => "MOD",
        BinOp::Eq => "EQ",
        BinOp::Ne => "NE",
        BinOp::Lt => "LT",
        BinOp::Le => "LE",
        BinOp::Gt => "GT",
        BinOp::Ge => "GE",
    }
}
