//! Declaration parsing implementation
//!
//! This module handles parsing of top-level declarations:
//!
//! - Global variables: `int count;`
//! - Function definitions: `type name(params) { ... }`
//! - Types and parameter lists
//!
//! # Grammar
//!
//! ```text
//! declaration  ::= var_decl | function_def
//! var_decl     ::= type identifier ";"
//! function_def ::= type identifier "(" params? ")" block
//! params       ::= param ("," param)*
//! param        ::= type identifier
//! type         ::= "int" | "char" | "void"
//! ```
//!
//! Declarations are located at their name, which is where duplicate
//! declaration diagnostics point.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse a top-level declaration (global variable or function definition)
    pub(crate) fn parse_top_level_declaration(&mut self) -> Result<Decl, ParseError> {
        if !self.is_type_keyword() {
            return Err(self.error_here("a type to start a declaration"));
        }

        // `type name (` is a function, anything else a variable
        let is_function = matches!(self.peek_ahead(1), Some(Token::Ident(_, _)))
            && matches!(self.peek_ahead(2), Some(Token::LParen(_)));

        if is_function {
            self.parse_function_definition().map(Decl::Function)
        } else {
            self.parse_var_declaration().map(Decl::Var)
        }
    }

    /// Parse variable declaration: type name;
    pub(crate) fn parse_var_declaration(&mut self) -> Result<VarDecl, ParseError> {
        let var_type = self.parse_type()?;
        let (name, location) = self.expect_identifier("in variable declaration")?;
        self.expect_semicolon("after variable declaration")?;

        Ok(VarDecl {
            id: self.fresh_id(),
            name,
            var_type,
            location,
        })
    }

    /// Parse function definition: type name(params) { body }
    pub(crate) fn parse_function_definition(&mut self) -> Result<FunctionDecl, ParseError> {
        let return_type = self.parse_type()?;
        let (name, location) = self.expect_identifier("as function name")?;
        let id = self.fresh_id();

        self.expect_lparen("after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_rparen("after parameters")?;

        let body = self.parse_block()?;

        Ok(FunctionDecl {
            id,
            name,
            params,
            return_type,
            body,
            location,
        })
    }

    /// Parse parameter list: type name, type name, ...
    ///
    /// An empty list and the C-style `(void)` both mean no parameters.
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();

        if self.check(&Token::RParen(self.current_location())) {
            return Ok(params);
        }

        if matches!(self.peek(), Token::Void(_))
            && matches!(self.peek_ahead(1), Some(Token::RParen(_)))
        {
            self.advance();
            return Ok(params);
        }

        loop {
            let param_type = self.parse_type()?;
            let (name, location) = self.expect_identifier("as parameter name")?;
            params.push(Param {
                id: self.fresh_id(),
                name,
                param_type,
                location,
            });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse a type keyword
    pub(crate) fn parse_type(&mut self) -> Result<Type, ParseError> {
        let ty = match self.peek() {
            Token::Int(_) => Type::Int,
            Token::Char(_) => Type::Char,
            Token::Void(_) => Type::Void,
            _ => return Err(self.error_here("type ('int', 'char' or 'void')")),
        };
        self.advance();
        Ok(ty)
    }
}
