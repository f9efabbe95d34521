//! Crate-level error type and diagnostic rendering
//!
//! Each stage reports through its own error type; [`Error`] wraps whichever
//! stage failed so callers of [`crate::driver`] handle one type.

use crate::codegen::CodegenError;
use crate::interpreter::RuntimeError;
use crate::parser::ast::SourceLocation;
use crate::parser::lexer::LexError;
use crate::parser::ParseError;
use crate::semantic::SemanticError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Error::Lex(err) => Some(err.location),
            Error::Parse(err) => Some(err.location),
            Error::Semantic(err) => err.location(),
            Error::Codegen(err) => Some(err.location),
            Error::Runtime(err) => err.location(),
        }
    }

    /// Short label for the stage that failed
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Lex(_) | Error::Parse(_) => "syntax error",
            Error::Semantic(_) | Error::Codegen(_) => "error",
            Error::Runtime(_) => "runtime error",
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Error::Runtime(_))
    }

    /// Pair this error with the file it came from
    pub fn diagnostic<'a>(&'a self, file: &'a str) -> Diagnostic<'a> {
        Diagnostic { file, error: self }
    }
}

/// Renders an [`Error`] as `file:line:col: kind: message`
///
/// The location is left out when the error has none, e.g. a missing `main`.
pub struct Diagnostic<'a> {
    file: &'a str,
    error: &'a Error,
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error.location() {
            Some(location) => write!(f, "{}:{}: ", self.file, location)?,
            None => write!(f, "{}: ", self.file)?,
        }
        write!(f, "{}: {}", self.error.kind(), self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_with_location() {
        let err = Error::from(SemanticError::UnresolvedIdentifier {
            name: "y".to_string(),
            location: SourceLocation::new(3, 9),
        });
        assert_eq!(
            err.diagnostic("prog.c").to_string(),
            "prog.c:3:9: error: use of undeclared identifier 'y'"
        );
    }

    #[test]
    fn test_diagnostic_without_location() {
        let err = Error::from(SemanticError::MissingMain);
        assert_eq!(err.location(), None);
        assert_eq!(
            err.diagnostic("prog.c").to_string(),
            "prog.c: error: program does not define 'main'"
        );
    }

    #[test]
    fn test_runtime_kind() {
        let err = Error::from(RuntimeError::DivisionByZero {
            operation: "division",
            location: SourceLocation::new(2, 14),
        });
        assert!(err.is_runtime());
        assert_eq!(
            err.diagnostic("a.c").to_string(),
            "a.c:2:14: runtime error: division by zero"
        );
    }
}
