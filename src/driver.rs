//! Pipeline entry points
//!
//! [`compile`] runs every stage up to code generation; [`run`] also executes
//! the result. Both stop at the first error.

use crate::codegen::{self, Module};
use crate::error::Error;
use crate::interpreter::{ExecutionLimits, Interpreter, RunOutcome};
use crate::parser::ast::Program;
use crate::parser::Parser;
use crate::semantic::{self, Resolution, TypeTable};
use crate::terminal::{MemoryTerminal, Terminal};
use std::io::{BufRead, Write};
use tracing::debug;

/// Output of every compile stage
#[derive(Debug, Clone)]
pub struct Compiled {
    pub program: Program,
    pub resolution: Resolution,
    pub types: TypeTable,
    pub module: Module,
}

/// Parse source text into an AST
pub fn parse(source: &str) -> Result<Program, Error> {
    let mut parser = Parser::new(source)?;
    let program = parser.parse_program()?;
    debug!(
        decls = program.decls.len(),
        nodes = program.node_count,
        "parsed"
    );
    Ok(program)
}

/// Lex, parse, resolve, check and lower `source`
pub fn compile(source: &str) -> Result<Compiled, Error> {
    let program = parse(source)?;

    let resolution = semantic::resolve(&program)?;
    debug!(
        symbols = resolution.symbols.len(),
        functions = resolution.functions.len(),
        "resolved"
    );

    let types = semantic::check(&program, &resolution)?;
    debug!(typed_nodes = types.len(), "type checked");

    let module = codegen::generate(&program, &resolution, &types)?;
    debug!(
        functions = module.functions.len(),
        strings = module.strings.len(),
        "lowered"
    );

    Ok(Compiled {
        program,
        resolution,
        types,
        module,
    })
}

/// Compile `source` and run it against `terminal`
pub fn run<R: BufRead, W: Write>(
    source: &str,
    terminal: &mut Terminal<R, W>,
    limits: ExecutionLimits,
) -> Result<RunOutcome, Error> {
    let compiled = compile(source)?;
    execute(&compiled.module, terminal, limits)
}

/// Run an already lowered module against `terminal`
///
/// The terminal is borrowed so its output survives a failed run.
pub fn execute<R: BufRead, W: Write>(
    module: &Module,
    terminal: &mut Terminal<R, W>,
    limits: ExecutionLimits,
) -> Result<RunOutcome, Error> {
    let mut interp = Interpreter::new(module, terminal.by_ref(), limits);
    Ok(interp.run()?)
}

/// Compile and run with in-memory input; returns the result and all output
pub fn run_with_input(source: &str, input: &str) -> (Result<RunOutcome, Error>, String) {
    run_with_limits(source, input, ExecutionLimits::default())
}

pub fn run_with_limits(
    source: &str,
    input: &str,
    limits: ExecutionLimits,
) -> (Result<RunOutcome, Error>, String) {
    let mut terminal = MemoryTerminal::in_memory(input);
    let result = run(source, &mut terminal, limits);
    (result, terminal.output_text())
}
