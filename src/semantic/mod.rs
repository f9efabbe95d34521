//! Semantic analysis: name resolution followed by type checking
//!
//! - [`resolver`]: binds names to [`scope::Symbol`]s and lays out storage
//! - [`checker`]: computes expression types and enforces the typing rules
//! - [`intrinsics`]: the built-in I/O functions every program can call
//!
//! Both passes read the AST without changing it; their results are side
//! tables keyed by [`NodeId`](crate::parser::ast::NodeId).

pub mod checker;
pub mod errors;
pub mod intrinsics;
pub mod resolver;
pub mod scope;

pub use checker::{check, TypeTable};
pub use errors::SemanticError;
pub use intrinsics::Intrinsic;
pub use resolver::{resolve, FunctionLayout, Resolution};
