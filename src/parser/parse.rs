//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: top-level variables, functions, parameters and types
//! - `statements`: blocks, `if`, `while`, `return` and expression statements
//! - `expressions`: one method per precedence level
//!
//! # Node ids
//!
//! Every expression, declaration and parameter receives a [`NodeId`] from a
//! counter owned by the parser. Ids are dense and assigned in source order, so
//! parsing the same text twice yields identical trees.
//!
//! # Nesting limit
//!
//! Every later stage walks the tree recursively, so the parser refuses trees
//! deeper than [`MAX_NESTING_DEPTH`]. Statements, parenthesised and unary
//! expressions, assignments and each operator of a binary chain all count as
//! one level.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use thiserror::Error;

/// Deepest statement/expression nesting the parser accepts
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parser error type: what the grammar wanted against what the source had.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct ParseError {
    pub expected: String,
    pub found: String,
    pub location: SourceLocation,
}

/// Recursive descent parser for the toy C language
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    next_id: NodeId,
    /// Current nesting level, see [`MAX_NESTING_DEPTH`]
    depth: usize,
}

impl Parser {
    /// Tokenize `source` and prepare to parse it.
    pub fn new(source: &str) -> Result<Self, LexError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Build a parser over an already lexed token stream.
    ///
    /// An `Eof` token is appended if the stream does not end with one.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(Token::Eof(_))) {
            let loc = tokens.last().map(Token::location).unwrap_or_default();
            tokens.push(Token::Eof(loc));
        }
        Self {
            tokens,
            position: 0,
            next_id: 0,
            depth: 0,
        }
    }

    /// Parse the entire program (top-level declarations)
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while !self.is_at_end() {
            let decl = self.parse_top_level_declaration()?;
            program.decls.push(decl);
        }

        program.node_count = self.next_id;
        Ok(program)
    }

    // ===== Helper methods =====

    /// Hand out the next node id.
    pub(crate) fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Go one level deeper; fails once the tree would exceed the limit.
    pub(crate) fn enter_nesting(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError {
                expected: format!("at most {} levels of nesting", MAX_NESTING_DEPTH),
                found: "code nested too deeply".to_string(),
                location: self.current_location(),
            });
        }
        Ok(())
    }

    pub(crate) fn leave_nesting(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    pub(crate) fn is_type_keyword(&self) -> bool {
        self.peek().is_type_keyword()
    }

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        // from_tokens guarantees a trailing Eof, and advance never moves past it
        &self.tokens[self.position]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    /// Error describing the current token as unexpected.
    pub(crate) fn error_here(&self, expected: impl Into<String>) -> ParseError {
        ParseError {
            expected: expected.into(),
            found: self.peek().to_string(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(&mut self, token: &Token, expected: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(expected))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LParen(self.current_location()),
            &format!("'(' {ctx}"),
        )
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RParen(self.current_location()),
            &format!("')' {ctx}"),
        )
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LBrace(self.current_location()),
            &format!("'{{' {ctx}"),
        )
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RBrace(self.current_location()),
            &format!("'}}' {ctx}"),
        )
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::Semicolon(self.current_location()),
            &format!("';' {ctx}"),
        )
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<(String, SourceLocation), ParseError> {
        if let Token::Ident(name, loc) = self.peek() {
            let result = (name.clone(), *loc);
            self.advance();
            Ok(result)
        } else {
            Err(self.error_here(format!("identifier {ctx}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse("int main() { return 0; }");

        assert_eq!(program.decls.len(), 1);
        match &program.decls[0] {
            Decl::Function(func) => {
                assert_eq!(func.name, "main");
                assert_eq!(func.params.len(), 0);
                assert_eq!(func.return_type, Type::Int);
                assert_eq!(func.body.statements.len(), 1);
            }
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_parse_globals_and_functions() {
        let program = parse("int x; char c; void main() { }");

        assert_eq!(program.globals().count(), 2);
        assert_eq!(program.functions().count(), 1);
    }

    #[test]
    fn test_node_ids_are_dense() {
        let program = parse("int x; int f(int a) { return a + 1; }");
        // x, f, a, `a`, `1`, `a + 1`
        assert_eq!(program.node_count, 6);
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let source = "int g; int f(int a) { if (a < 1) return 0; else return f(a - 1); }";
        assert_eq!(parse(source), parse(source));
    }

    #[test]
    fn test_error_reports_expected_and_found() {
        let err = Parser::new("int x").unwrap().parse_program().unwrap_err();
        assert_eq!(err.expected, "';' after variable declaration");
        assert_eq!(err.found, "end of file");
    }

    #[test]
    fn test_from_tokens_appends_eof() {
        let tokens = vec![
            Token::Int(SourceLocation::new(1, 1)),
            Token::Ident("x".to_string(), SourceLocation::new(1, 5)),
            Token::Semicolon(SourceLocation::new(1, 6)),
        ];
        let program = Parser::from_tokens(tokens).parse_program().unwrap();
        assert_eq!(program.globals().count(), 1);
    }
}
