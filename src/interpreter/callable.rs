use std::fmt::Display;
use std::rc::Rc;

use super::class::{Instance, THIS_LITERAL};
use super::environment::Environment;
use super::error::{RuntimeError, UnwindCause};
use super::runtime::Interpreter;
use super::value::Value;
use crate::ast::FunDecl;

/// How many arguments a callable accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic { min: usize, max: Option<usize> },
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Fixed(n) => count == n,
            Arity::Variadic { min, max } => count >= min && max.map_or(true, |max| count <= max),
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variadic { min, max: Some(max) } => write!(f, "{} to {}", min, max),
            Arity::Variadic { min, max: None } => write!(f, "at least {}", min),
        }
    }
}

/// Shared invocation contract. Arity is checked by the interpreter before `call` runs, so implementations may
/// assume they received an accepted number of arguments.
pub trait Callable {
    fn name(&self) -> &str;
    fn arity(&self) -> Arity;
    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError>;
}

pub type BuiltinImpl = fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>;

pub struct BuiltinFunc {
    pub name: &'static str,
    pub arity: Arity,
    pub call: BuiltinImpl,
}

impl Callable for BuiltinFunc {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.call)(interpreter, args)
    }
}

/// A user function: the declaration plus the scope that was current when the declaration ran
pub struct Function {
    pub decl: Rc<FunDecl>,
    pub closure: Rc<Environment>,
}

impl Function {
    pub fn new(decl: Rc<FunDecl>, closure: Rc<Environment>) -> Function {
        Function { decl, closure }
    }

    // Every call gets a fresh scope whose parent is the closure, never the caller's scope.
    // A method receiver is bound in that scope before the parameters.
    pub(crate) fn invoke(
        &self,
        interpreter: &mut Interpreter,
        receiver: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let env = Environment::new_child(&self.closure);
        if let Some(receiver) = receiver {
            env.define(THIS_LITERAL, receiver);
        }
        for (parameter, value) in self.decl.parameters.iter().zip(args) {
            env.define(parameter, value);
        }
        match interpreter.execute_block(&self.decl.body, env) {
            Ok(()) => Ok(Value::Nil),
            Err(UnwindCause::Return(value)) => Ok(value),
            Err(UnwindCause::Break) => Err(RuntimeError::InvalidBreak),
            Err(UnwindCause::Error(error)) => Err(error),
        }
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.decl.name
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(self.decl.parameters.len())
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.invoke(interpreter, None, args)
    }
}

/// A method looked up through an instance, `this` is bound to the receiver for the duration of each call
pub struct BoundMethod {
    pub receiver: Rc<Instance>,
    pub method: Rc<Function>,
}

impl Callable for BoundMethod {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn arity(&self) -> Arity {
        self.method.arity()
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.method
            .invoke(interpreter, Some(Value::Instance(self.receiver.clone())), args)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed_arity_is_exact() {
        assert!(Arity::Fixed(2).accepts(2));
        assert!(!Arity::Fixed(2).accepts(1));
        assert!(!Arity::Fixed(2).accepts(3));
    }

    #[test]
    fn variadic_arity_ranges() {
        let bounded = Arity::Variadic {
            min: 1,
            max: Some(3),
        };
        assert!(!bounded.accepts(0));
        assert!(bounded.accepts(3));
        assert!(!bounded.accepts(4));
        assert_eq!("1 to 3", bounded.to_string());

        let open = Arity::Variadic { min: 2, max: None };
        assert!(open.accepts(200));
        assert_eq!("at least 2", open.to_string());
    }
}
