// toyc: compile and run programs in a toy C-like language

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use crossterm::{
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    tty::IsTty,
};
use tracing::{info, Level};

use toyc::driver;
use toyc::interpreter::constants::DEFAULT_MAX_CALL_DEPTH;
use toyc::interpreter::ExecutionLimits;
use toyc::parser::lexer::Lexer;
use toyc::parser::printer::print_program;
use toyc::terminal::Terminal;
use toyc::Error;

#[derive(Parser, Debug)]
#[command(name = "toyc")]
#[command(about = "Compiler and bytecode interpreter for a toy C-like language")]
struct Cli {
    /// Log compiler stages to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a program and run it on stdin/stdout
    Run {
        file: PathBuf,
        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Run every compile stage and report success
    Check { file: PathBuf },
    /// Print the token stream
    Tokens { file: PathBuf },
    /// Print the parsed syntax tree
    Ast { file: PathBuf },
    /// Print the generated bytecode
    Bytecode { file: PathBuf },
}

#[derive(Args, Debug)]
struct LimitArgs {
    /// Maximum nested calls before a stack overflow
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Stop after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,
}

impl From<LimitArgs> for ExecutionLimits {
    fn from(args: LimitArgs) -> Self {
        ExecutionLimits {
            max_call_depth: args.max_depth,
            max_steps: args.max_steps,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file = match &cli.command {
        Command::Run { file, .. }
        | Command::Check { file }
        | Command::Tokens { file }
        | Command::Ast { file }
        | Command::Bytecode { file } => file.clone(),
    };

    let source = match fs::read_to_string(&file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("toyc: cannot read '{}': {}", file.display(), err);
            return ExitCode::from(2);
        }
    };

    match execute_command(cli.command, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&file, &err);
            ExitCode::from(1)
        }
    }
}

fn execute_command(command: Command, source: &str) -> Result<(), Error> {
    match command {
        Command::Run { limits, .. } => {
            let stdin = io::stdin();
            let mut terminal = Terminal::new(stdin.lock(), io::stdout().lock());
            let outcome = driver::run(source, &mut terminal, limits.into())?;
            info!(steps = outcome.steps, exit_value = ?outcome.exit_value, "program finished");
        }
        Command::Check { .. } => {
            let compiled = driver::compile(source)?;
            println!(
                "OK: {} declarations, {} functions",
                compiled.program.decls.len(),
                compiled.module.functions.len()
            );
        }
        Command::Tokens { .. } => {
            for token in Lexer::new(source) {
                let token = token?;
                println!("{}\t{}", token.location(), token);
            }
        }
        Command::Ast { .. } => {
            let program = driver::parse(source)?;
            println!("{}", print_program(&program));
        }
        Command::Bytecode { .. } => {
            let compiled = driver::compile(source)?;
            print!("{}", compiled.module.disassemble());
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();
}

/// Print a diagnostic to stderr, coloured when stderr is a terminal
fn report(file: &Path, err: &Error) {
    let name = file.display().to_string();
    let line = err.diagnostic(&name).to_string();
    let mut stderr = io::stderr();

    let written = if stderr.is_tty() {
        execute!(
            stderr,
            SetAttribute(Attribute::Bold),
            SetForegroundColor(Color::Red),
            Print(&line),
            ResetColor,
            SetAttribute(Attribute::Reset),
            Print("\n")
        )
    } else {
        writeln!(stderr, "{}", line)
    };

    if written.is_err() {
        eprintln!("{}", line);
    }
}
