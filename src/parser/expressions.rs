//! Expression parsing implementation
//!
//! One method per precedence level, lowest first. Binary levels loop so that
//! their operators associate to the left; assignment recurses so that it
//! associates to the right.
//!
//! Each operator of a binary chain nests the tree one level deeper, so the
//! loops count their iterations against the parser's nesting limit.
//!
//! # Grammar
//!
//! ```text
//! expr           ::= assignment
//! assignment     ::= identifier "=" assignment | equality
//! equality       ::= relational (("==" | "!=") relational)*
//! relational     ::= additive (("<" | "<=" | ">" | ">=") additive)*
//! additive       ::= multiplicative (("+" | "-") multiplicative)*
//! multiplicative ::= unary (("*" | "/" | "%") unary)*
//! unary          ::= "-" unary | primary
//! primary        ::= literal | identifier | call | "(" expr ")"
//! call           ::= identifier "(" (expr ("," expr)*)? ")"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    /// Parse assignment (right-associative)
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        self.enter_nesting()?;
        let expr = self.parse_assignment_inner();
        self.leave_nesting(1);
        expr
    }

    fn parse_assignment_inner(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_equality()?;

        let loc = self.current_location();
        if !self.check(&Token::Eq(loc)) {
            return Ok(expr);
        }

        // Only a plain name can be assigned to
        let target = match expr.kind {
            ExprKind::Identifier(name) => Ident {
                id: expr.id,
                name,
                location: expr.location,
            },
            _ => {
                return Err(ParseError {
                    expected: "identifier on the left of '='".to_string(),
                    found: "expression".to_string(),
                    location: expr.location,
                });
            }
        };
        self.advance(); // consume '='

        let value = Box::new(self.parse_assignment()?);
        Ok(Expr {
            id: self.fresh_id(),
            kind: ExprKind::Assign { target, value },
            location: loc,
        })
    }

    /// Parse equality (==, !=)
    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;
        let mut levels = 0;

        loop {
            let op = match self.peek() {
                Token::EqEq(_) => BinOp::Eq,
                Token::NotEq(_) => BinOp::Ne,
                _ => break,
            };
            self.advance();
            self.enter_nesting()?;
            levels += 1;
            let right = self.parse_relational()?;
            left = self.binary(op, left, right);
        }

        self.leave_nesting(levels);
        Ok(left)
    }

    /// Parse relational (<, <=, >, >=)
    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        let mut levels = 0;

        loop {
            let op = match self.peek() {
                Token::Lt(_) => BinOp::Lt,
                Token::Le(_) => BinOp::Le,
                Token::Gt(_) => BinOp::Gt,
                Token::Ge(_) => BinOp::Ge,
                _ => break,
            };
            self.advance();
            self.enter_nesting()?;
            levels += 1;
            let right = self.parse_additive()?;
            left = self.binary(op, left, right);
        }

        self.leave_nesting(levels);
        Ok(left)
    }

    /// Parse additive (+, -)
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        let mut levels = 0;

        loop {
            let op = match self.peek() {
                Token::Plus(_) => BinOp::Add,
                Token::Minus(_) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            self.enter_nesting()?;
            levels += 1;
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right);
        }

        self.leave_nesting(levels);
        Ok(left)
    }

    /// Parse multiplicative (*, /, %)
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        let mut levels = 0;

        loop {
            let op = match self.peek() {
                Token::Star(_) => BinOp::Mul,
                Token::Slash(_) => BinOp::Div,
                Token::Percent(_) => BinOp::Mod,
                _ => break,
            };
            self.advance();
            self.enter_nesting()?;
            levels += 1;
            let right = self.parse_unary()?;
            left = self.binary(op, left, right);
        }

        self.leave_nesting(levels);
        Ok(left)
    }

    /// Parse unary minus
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();
        if self.match_token(&Token::Minus(loc)) {
            // `-2147483648` is a single literal
            if let Token::IntLiteral(i32::MIN, _) = self.peek() {
                self.advance();
                return Ok(Expr {
                    id: self.fresh_id(),
                    kind: ExprKind::IntLiteral(i32::MIN),
                    location: loc,
                });
            }

            self.enter_nesting()?;
            let operand = Box::new(self.parse_unary()?);
            self.leave_nesting(1);
            return Ok(Expr {
                id: self.fresh_id(),
                kind: ExprKind::Unary {
                    op: UnOp::Neg,
                    operand,
                },
                location: loc,
            });
        }

        self.parse_primary()
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.current_location();

        let kind = match self.peek().clone() {
            Token::IntLiteral(n, _) => {
                self.advance();
                ExprKind::IntLiteral(n)
            }
            Token::CharLiteral(c, _) => {
                self.advance();
                ExprKind::CharLiteral(c)
            }
            Token::StringLiteral(s, _) => {
                self.advance();
                ExprKind::StringLiteral(s)
            }
            Token::Ident(name, _) => {
                self.advance();
                if self.check(&Token::LParen(self.current_location())) {
                    return self.parse_call(name, loc);
                }
                ExprKind::Identifier(name)
            }
            Token::LParen(_) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                return Ok(expr);
            }
            _ => return Err(self.error_here("expression")),
        };

        Ok(Expr {
            id: self.fresh_id(),
            kind,
            location: loc,
        })
    }

    /// Parse the argument list of a call; the callee name is already consumed
    fn parse_call(&mut self, name: String, loc: SourceLocation) -> Result<Expr, ParseError> {
        let callee = Ident {
            id: self.fresh_id(),
            name,
            location: loc,
        };

        self.expect_lparen("before arguments")?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen(self.current_location())) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(&Token::Comma(self.current_location())) {
                    break;
                }
            }
        }
        self.expect_rparen("after arguments")?;

        Ok(Expr {
            id: self.fresh_id(),
            kind: ExprKind::Call { callee, args },
            location: loc,
        })
    }

    fn binary(&mut self, op: BinOp, left: Expr, right: Expr) -> Expr {
        let location = left.location;
        Expr {
            id: self.fresh_id(),
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            location,
        }
    }
}
