use std::rc::Rc;

use pretty_assertions::assert_eq;

use treelox::ast::Program;
use treelox::config::DEFAULT_MAX_CALL_DEPTH;
use treelox::interpreter::{execute, populate_builtin, stock_interpreter, Environment, PrintHandler, RuntimeError};
use treelox::parser::parse;
use treelox::reporter::CollectingReporter;
use treelox::scanner::Scanner;
use treelox::RunError;

fn run_program(code: &str) -> (String, Result<(), RunError>) {
    let mut interpreter = stock_interpreter(PrintHandler::buffer());
    let mut reporter = CollectingReporter::default();
    let result = treelox::run(&mut interpreter, &mut reporter, code);
    (interpreter.output(), result)
}

fn run_demo(code: &str) -> String {
    let (output, result) = run_program(code);
    if let Err(error) = result {
        panic!("demo failed: {} (output so far {:?})", error, output);
    }
    output
}

#[test]
fn reduce_demo() {
    assert_eq!(
        "30\n465\n9\nabc\n",
        run_demo(include_str!("../demos/reduce.lox"))
    );
}

#[test]
fn field_closure_demo() {
    assert_eq!(
        "42\nscales by 2\n8\nscales by 10\n10\n<Scaler instance>\n<class Scaler>\n",
        run_demo(include_str!("../demos/fields.lox"))
    );
}

#[test]
fn inheritance_demo() {
    assert_eq!(
        "Rex makes a sound, woof\nanimal\nRex jr makes a sound, woof (tiny)\n0\nfield wins\n",
        run_demo(include_str!("../demos/inheritance.lox"))
    );
}

#[test]
fn parse_errors_stop_before_running() {
    let mut interpreter = stock_interpreter(PrintHandler::buffer());
    let mut reporter = CollectingReporter::default();
    let result = treelox::run(&mut interpreter, &mut reporter, "print 1;\nprint (2;");
    assert!(matches!(result, Err(RunError::Parse(_))));
    assert_eq!("", interpreter.output());
    assert!(!reporter.messages.is_empty());
}

#[test]
fn runtime_error_keeps_earlier_output() {
    let (output, result) = run_program("print 1;\nprint first([]);\nprint 2;");
    assert_eq!("1\n", output);
    assert!(matches!(
        result,
        Err(RunError::Runtime(RuntimeError::EmptyOperand("first")))
    ));
}

#[test]
fn rest_shortens_by_one() {
    let output = run_demo(
        r#"
        var xs = [4, 5, 6];
        print len(rest(xs)) == len(xs) - 1;
        print rest([1]);
        "#,
    );
    assert_eq!("true\n[]\n", output);
}

const DEEP_REDUCE: &str = r#"
fun reduce(f, init, xs) {
    fun iter(acc, remaining) {
        if (len(remaining) == 0) return acc;
        return iter(f(acc, first(remaining)), rest(remaining));
    }
    return iter(init, xs);
}
fun add(a, b) { return a + b; }
print reduce(add, 0, range(1, 2001));
"#;

fn parse_program(code: &str) -> Program {
    let mut reporter = CollectingReporter::default();
    match parse(&mut reporter, Scanner::new(code)) {
        Ok(program) => program,
        Err(_) => panic!("parse errors: {:?}", reporter.messages),
    }
}

fn builtin_globals() -> Rc<Environment> {
    let globals = Environment::new_global();
    populate_builtin(&globals);
    globals
}

#[test]
fn deep_reduce_on_default_stack() {
    assert_eq!("2001000\n", run_demo(DEEP_REDUCE));
}

#[test]
fn execute_runs_a_program_against_given_globals() {
    let program = parse_program(DEEP_REDUCE);
    assert!(execute(&program, builtin_globals()).is_ok());

    let program = parse_program(include_str!("../demos/inheritance.lox"));
    assert!(execute(&program, builtin_globals()).is_ok());
}

#[test]
fn execute_reports_errors() {
    let program = parse_program("print len(1);");
    assert!(matches!(
        execute(&program, builtin_globals()),
        Err(RuntimeError::TypeError(_))
    ));

    // Builtins only exist when the caller registered them
    let program = parse_program("print now();");
    assert!(matches!(
        execute(&program, Environment::new_global()),
        Err(RuntimeError::UnresolvedName(name)) if name == "now"
    ));
}

#[test]
fn execute_limits_runaway_recursion() {
    let program = parse_program("fun down(n) { return down(n + 1); } down(0);");
    assert!(matches!(
        execute(&program, builtin_globals()),
        Err(RuntimeError::StackOverflow(limit)) if limit == DEFAULT_MAX_CALL_DEPTH
    ));
}
