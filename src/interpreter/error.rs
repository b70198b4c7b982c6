use std::io;

use thiserror::Error;

use super::callable::Arity;
use super::value::Value;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("undefined variable '{0}'")]
    UnresolvedName(String),
    #[error("undefined property '{property}' on {object}")]
    UnresolvedProperty { object: String, property: String },
    #[error("{callee} expected {expected} arguments but got {actual}")]
    Arity {
        callee: String,
        expected: Arity,
        actual: usize,
    },
    #[error("type error: {0}")]
    TypeError(String),
    #[error("{0} of an empty sequence")]
    EmptyOperand(&'static str),
    #[error("divide by zero")]
    DivideByZero,
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("not callable: {0}")]
    NotCallable(String),
    #[error("break outside of a loop")]
    InvalidBreak,
    #[error("return outside of a function")]
    ReturnOutsideFunction,
    #[error("stack overflow: more than {0} nested calls")]
    StackOverflow(usize),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    pub fn type_error(message: impl Into<String>) -> RuntimeError {
        RuntimeError::TypeError(message.into())
    }
}

/// Why statement execution stopped early. Only `Error` may escape the interpreter, the others are absorbed by the
/// enclosing call or loop.
#[derive(Debug)]
pub enum UnwindCause {
    Error(RuntimeError),
    Return(Value),
    Break,
}

impl From<RuntimeError> for UnwindCause {
    fn from(error: RuntimeError) -> Self {
        UnwindCause::Error(error)
    }
}

impl UnwindCause {
    // Convert whatever is still unwinding at the top level into the error it represents
    pub fn into_error(self) -> RuntimeError {
        match self {
            UnwindCause::Error(error) => error,
            UnwindCause::Return(_) => RuntimeError::ReturnOutsideFunction,
            UnwindCause::Break => RuntimeError::InvalidBreak,
        }
    }
}
