//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Local variable declarations: `int x;` (only directly inside a block)
//! - Control flow: `if`/`else`, `while`
//! - `return` with or without a value
//! - Compound statements: `{ ... }`
//! - Expression statements: function calls, assignments
//!
//! # Grammar
//!
//! ```text
//! block     ::= "{" (var_decl | statement)* "}"
//! statement ::= block | if_stmt | while_stmt | return_stmt | expr_stmt
//! if_stmt   ::= "if" "(" expr ")" statement ("else" statement)?
//! while_stmt ::= "while" "(" expr ")" statement
//! return_stmt ::= "return" expr? ";"
//! expr_stmt ::= expr ";"
//! ```
//!
//! An `else` always attaches to the nearest `if` that has none yet.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse a braced block, declarations and statements in any order
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let location = self.current_location();
        self.expect_lbrace("to open a block")?;

        let mut statements = Vec::new();
        while !self.check(&Token::RBrace(self.current_location())) && !self.is_at_end() {
            if self.is_type_keyword() {
                statements.push(Stmt::VarDecl(self.parse_var_declaration()?));
            } else {
                statements.push(self.parse_statement()?);
            }
        }

        self.expect_rbrace("to close the block")?;

        Ok(Block {
            statements,
            location,
        })
    }

    /// Parse a statement, one nesting level below the enclosing one
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.enter_nesting()?;
        let stmt = self.parse_statement_inner();
        self.leave_nesting(1);
        stmt
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.current_location();

        if self.check(&Token::LBrace(loc)) {
            return Ok(Stmt::Block(self.parse_block()?));
        }

        if self.match_token(&Token::Return(loc)) {
            return self.parse_return_statement();
        }

        if self.match_token(&Token::If(loc)) {
            return self.parse_if_statement();
        }

        if self.match_token(&Token::While(loc)) {
            return self.parse_while_statement();
        }

        if self.is_type_keyword() {
            return Err(self.error_here("a statement (declarations must open a block)"));
        }

        // Otherwise, it's an expression statement
        let expr = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(Stmt::Expr {
            expr,
            location: loc,
        })
    }

    /// Parse return statement
    fn parse_return_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.previous_location();

        let expr = if self.check(&Token::Semicolon(self.current_location())) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect_semicolon("after return")?;

        Ok(Stmt::Return { expr, location })
    }

    /// Parse if statement
    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.previous_location();

        self.expect_lparen("after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after if condition")?;

        let then_branch = Box::new(self.parse_statement()?);

        let else_branch = if self.match_token(&Token::Else(self.current_location())) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.previous_location();

        self.expect_lparen("after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_rparen("after while condition")?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While {
            condition,
            body,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn main_body(source: &str) -> Vec<Stmt> {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        match program.decls.into_iter().last() {
            Some(Decl::Function(func)) => func.body.statements,
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_else_binds_to_nearest_if() {
        let body = main_body("void main() { if (a) if (b) x = 1; else x = 2; }");

        match &body[0] {
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(else_branch.is_none());
                assert!(matches!(
                    **then_branch,
                    Stmt::If {
                        else_branch: Some(_),
                        ..
                    }
                ));
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_braced_else_branch() {
        let body = main_body("int f(int n) { if (n == 1) return 1; else { n = n - 1; return n; } }");

        match &body[0] {
            Stmt::If {
                else_branch: Some(else_branch),
                ..
            } => assert!(matches!(**else_branch, Stmt::Block(ref b) if b.statements.len() == 2)),
            other => panic!("Expected if/else, got {:?}", other),
        }
    }

    #[test]
    fn test_while_with_single_statement_body() {
        let body = main_body("void main() { while (c < n) c = c + 1; }");
        assert!(matches!(body[0], Stmt::While { ref body, .. } if matches!(**body, Stmt::Expr { .. })));
    }

    #[test]
    fn test_locals_mixed_with_statements() {
        let body = main_body("void main() { int a; a = 1; char b; }");
        assert_eq!(body.len(), 3);
        assert!(matches!(body[0], Stmt::VarDecl(_)));
        assert!(matches!(body[1], Stmt::Expr { .. }));
        assert!(matches!(body[2], Stmt::VarDecl(_)));
    }

    #[test]
    fn test_declaration_as_if_body_is_rejected() {
        let err = Parser::new("void main() { if (1) int x; }")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert!(err.expected.starts_with("a statement"));
        assert_eq!(err.found, "'int'");
    }

    #[test]
    fn test_return_without_value() {
        let body = main_body("void main() { return; }");
        assert!(matches!(body[0], Stmt::Return { expr: None, .. }));
    }
}
