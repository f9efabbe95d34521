//! Compile-time errors found after parsing
//!
//! Name resolution and type checking both report through [`SemanticError`].
//! Every variant except [`SemanticError::MissingMain`] points at the source.

use crate::parser::ast::{SourceLocation, Type};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// A name used with no visible declaration
    #[error("use of undeclared identifier '{name}'")]
    UnresolvedIdentifier {
        name: String,
        location: SourceLocation,
    },

    /// A second declaration of a name in the same scope
    #[error("redeclaration of '{name}'{}", describe_previous(*previous))]
    DuplicateDeclaration {
        name: String,
        location: SourceLocation,
        /// `None` when the earlier declaration is an intrinsic
        previous: Option<SourceLocation>,
    },

    #[error("{message}")]
    TypeMismatch {
        message: String,
        location: SourceLocation,
    },

    #[error("'{name}' expects {expected} argument(s), found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },

    #[error("function '{name}' returns {return_type} but contains no return statement")]
    MissingReturn {
        name: String,
        return_type: Type,
        location: SourceLocation,
    },

    #[error("program does not define 'main'")]
    MissingMain,
}

fn describe_previous(previous: Option<SourceLocation>) -> String {
    match previous {
        Some(loc) => format!(" (previous declaration at {})", loc),
        None => " (the name is a built-in function)".to_string(),
    }
}

impl SemanticError {
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            SemanticError::UnresolvedIdentifier { location, .. }
            | SemanticError::DuplicateDeclaration { location, .. }
            | SemanticError::TypeMismatch { location, .. }
            | SemanticError::ArityMismatch { location, .. }
            | SemanticError::MissingReturn { location, .. } => Some(*location),
            SemanticError::MissingMain => None,
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>, location: SourceLocation) -> Self {
        SemanticError::TypeMismatch {
            message: message.into(),
            location,
        }
    }
}
