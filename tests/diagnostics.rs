// Compile-time checks and error reporting over whole programs

use toyc::driver::{compile, parse};
use toyc::parser::ast::{ExprKind, SourceLocation, Stmt};
use toyc::parser::printer::print_program;
use toyc::semantic::scope::SymbolKind;
use toyc::semantic::{resolve, SemanticError};
use toyc::Error;

const FIBONACCI: &str = include_str!("fixtures/fibonacci.c");
const PLAYGROUND: &str = include_str!("fixtures/playground.c");

fn semantic_error(source: &str) -> SemanticError {
    match compile(source) {
        Err(Error::Semantic(err)) => err,
        other => panic!("expected a semantic error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_parsing_is_deterministic() {
    let first = parse(FIBONACCI).unwrap();
    let second = parse(FIBONACCI).unwrap();
    assert_eq!(first, second);
    assert_eq!(print_program(&first), print_program(&second));
    assert!(print_program(&first)
        .starts_with("Program(VarDecl(INT, Var(variable1)), VarDecl(CHAR, Var(variable2)), Procedure(VOID, main, "));
}

#[test]
fn test_parameter_shadows_global() {
    let program = parse(PLAYGROUND).unwrap();
    let resolution = resolve(&program).unwrap();

    let shadow = program.functions().find(|f| f.name == "shadow").unwrap();
    let arg = match &shadow.body.statements[2] {
        Stmt::Expr { expr, .. } => match &expr.kind {
            ExprKind::Call { callee, args } => {
                assert_eq!(callee.name, "print_i");
                &args[0]
            }
            other => panic!("expected a call, got {:?}", other),
        },
        other => panic!("expected an expression statement, got {:?}", other),
    };

    let symbol = resolution.symbol_of(arg.id).unwrap();
    assert_eq!(symbol.name, "iteration_counter");
    assert_eq!(symbol.kind, SymbolKind::Param { slot: 1 });
}

#[test]
fn test_playground_shadow_lacks_return() {
    match semantic_error(PLAYGROUND) {
        SemanticError::MissingReturn { name, .. } => assert_eq!(name, "shadow"),
        other => panic!("expected MissingReturn, got {:?}", other),
    }
}

#[test]
fn test_duplicate_global() {
    assert_eq!(
        semantic_error("int x;\nint x;\nvoid main() { }"),
        SemanticError::DuplicateDeclaration {
            name: "x".to_string(),
            location: SourceLocation::new(2, 5),
            previous: Some(SourceLocation::new(1, 5)),
        }
    );
}

#[test]
fn test_duplicate_function_in_concatenated_file() {
    let source = format!("{}\nint factorial(int n) {{ return n; }}\n", PLAYGROUND);
    match semantic_error(&source) {
        SemanticError::DuplicateDeclaration { name, .. } => assert_eq!(name, "factorial"),
        other => panic!("expected DuplicateDeclaration, got {:?}", other),
    }
}

#[test]
fn test_unresolved_identifier_position() {
    let err = compile("void main() {\n  print_i(y);\n}").unwrap_err();
    assert_eq!(err.location(), Some(SourceLocation::new(2, 11)));
    assert_eq!(
        err.diagnostic("t.c").to_string(),
        "t.c:2:11: error: use of undeclared identifier 'y'"
    );
}

#[test]
fn test_void_function_returning_value() {
    let err = semantic_error("void test_method() { return 1; }\nvoid main() { test_method(); }");
    assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    assert_eq!(err.location().map(|loc| loc.line), Some(1));
}

#[test]
fn test_void_call_used_as_value() {
    let err = semantic_error("void f() { }\nvoid main() { int x; x = f(); }");
    assert!(matches!(err, SemanticError::TypeMismatch { .. }));
}

#[test]
fn test_arity_mismatch() {
    assert!(matches!(
        semantic_error("void main() { print_i(1, 2); }"),
        SemanticError::ArityMismatch {
            expected: 1,
            found: 2,
            ..
        }
    ));
}

#[test]
fn test_missing_main() {
    assert_eq!(semantic_error("int x;"), SemanticError::MissingMain);
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(
        compile("void main() { int x; x = 1 @ 2; }"),
        Err(Error::Lex(_))
    ));

    let err = compile("void main() {\n  print_i(1)\n}").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(err.kind(), "syntax error");
}

#[test]
fn test_bytecode_listing_names_every_function() {
    let compiled = compile(FIBONACCI).unwrap();
    let listing = compiled.module.disassemble();
    assert!(listing.starts_with("fn #0 main/0 -> void"));
    assert!(listing.contains("call read_i"));
    assert!(listing.contains("call print_s"));
}
