mod builtin;
mod callable;
mod class;
mod environment;
mod error;
mod output;
mod runtime;
mod stack;
mod value;

pub use builtin::populate_builtin;
pub use callable::{Arity, BoundMethod, BuiltinFunc, Callable, Function};
pub use class::{Class, Instance};
pub use environment::Environment;
pub use error::RuntimeError;
pub use output::PrintHandler;
pub use runtime::Interpreter;
pub use value::Value;

use crate::ast::Program;
use crate::config::Settings;

/// An interpreter whose globals hold every builtin, with default limits
pub fn stock_interpreter(printer: PrintHandler) -> Interpreter {
    stock_interpreter_with(printer, Settings::default())
}

pub fn stock_interpreter_with(printer: PrintHandler, settings: Settings) -> Interpreter {
    let global_env = Environment::new_global();
    populate_builtin(&global_env);
    Interpreter::new_with_global(global_env, printer, settings)
}

/// Run a whole program against a caller supplied global scope, printing to stdout
pub fn execute(program: &Program, globals: std::rc::Rc<Environment>) -> Result<(), RuntimeError> {
    Interpreter::new_with_global(globals, PrintHandler::Stdout, Settings::default()).interpret(program)
}
