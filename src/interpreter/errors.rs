//! Runtime error types for the bytecode interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! during program execution (as opposed to compile errors or system errors).
//!
//! All runtime errors are fatal: they halt execution and unwind the whole call stack.

use crate::parser::ast::SourceLocation;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Call depth went past the configured limit
    #[error("stack overflow: more than {limit} nested calls")]
    StackOverflow {
        limit: usize,
        location: SourceLocation,
    },

    /// An intrinsic could not read or write
    #[error("{operation}: {message}")]
    IntrinsicIoFailure {
        /// Name of the intrinsic, or `output` for the final flush
        operation: &'static str,
        message: String,
        location: SourceLocation,
    },

    /// Division or remainder by zero
    #[error("{operation} by zero")]
    DivisionByZero {
        operation: &'static str,
        location: SourceLocation,
    },

    /// The run executed more instructions than allowed
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded {
        limit: u64,
        location: SourceLocation,
    },

    /// The bytecode broke an invariant code generation guarantees
    #[error("invalid bytecode: {message}")]
    InvalidBytecode {
        message: String,
        location: SourceLocation,
    },
}

impl RuntimeError {
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            RuntimeError::StackOverflow { location, .. }
            | RuntimeError::IntrinsicIoFailure { location, .. }
            | RuntimeError::DivisionByZero { location, .. }
            | RuntimeError::StepLimitExceeded { location, .. }
            | RuntimeError::InvalidBytecode { location, .. } => Some(*location),
        }
    }
}
