//! # Introduction
//!
//! toyc compiles a small C-like language (`int`, `char`, `void`, functions,
//! globals, `if`/`else`, `while`, `return`) to stack-machine bytecode and runs
//! it. Programs talk to the outside world only through the built-ins
//! `read_i`, `read_c`, `print_i`, `print_c` and `print_s`.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Resolver → Type checker → Codegen → VM
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST whose nodes carry
//!    dense [`parser::ast::NodeId`]s.
//! 2. [`semantic`]: binds every name to a symbol and gives every expression a
//!    type; both results are side tables keyed by node id.
//! 3. [`codegen`]: lowers the checked AST to [`codegen::Module`] bytecode.
//! 4. [`interpreter`]: executes the bytecode on an explicit call stack
//!    ([`memory`]) and does I/O through a [`terminal::Terminal`].
//! 5. [`driver`]: `compile` / `run` helpers chaining the stages, with errors
//!    unified in [`error::Error`].
//!
//! ```
//! let source = "int fact(int n) { if (n < 2) return 1; return n * fact(n - 1); }
//!               void main() { print_i(fact(read_i())); }";
//! let (result, output) = toyc::driver::run_with_input(source, "5");
//! assert!(result.is_ok());
//! assert_eq!(output, "120");
//! ```

pub mod codegen;
pub mod driver;
pub mod error;
pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod semantic;
pub mod terminal;

pub use error::{Diagnostic, Error};
