pub mod ast;
pub mod config;
pub mod interpreter;
pub mod parser;
pub mod reporter;
pub mod scanner;

use thiserror::Error;

use interpreter::{Interpreter, RuntimeError};
use parser::{parse, ParseError};
use reporter::ErrorReporter;
use scanner::Scanner;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Parse `code` and run it on `interpreter`. Diagnostics go to `reporter`, nothing runs if parsing failed.
pub fn run<Reporter>(interpreter: &mut Interpreter, reporter: &mut Reporter, code: &str) -> Result<(), RunError>
where
    Reporter: ErrorReporter,
{
    let program = parse(reporter, Scanner::new(code))?;
    interpreter.interpret(&program)?;
    Ok(())
}
