//! Bytecode execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: fetch/execute loop over a lowered [`crate::codegen::Module`]
//! - [`builtins`]: the `read_*` / `print_*` intrinsics
//! - [`constants`]: default limits
//! - [`errors`]: runtime error types
//!
//! # Execution Model
//!
//! Every call pushes an activation record holding its parameters and locals
//! in numbered slots; operands live on one stack shared by all frames and are
//! cut back to the caller's height when a frame returns. Arithmetic wraps on
//! 32 bits. The run ends when `main` returns or on the first runtime error.

pub mod builtins;
pub mod constants;
pub mod engine;
pub mod errors;

pub use constants::ExecutionLimits;
pub use engine::{Interpreter, RunOutcome};
pub use errors::RuntimeError;
