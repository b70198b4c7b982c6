use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    ops::{Add, Div, Mul, Sub},
    rc::Rc,
};

use super::callable::{BoundMethod, BuiltinFunc, Callable, Function};
use super::class::{Class, Instance};
use super::error::RuntimeError;
use super::stack::ensure_sufficient_stack;

pub type List = Rc<RefCell<Vec<Value>>>;

#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(Rc<str>),
    Bool(bool),
    Nil,
    List(List),
    Function(Rc<Function>),
    BoundMethod(Rc<BoundMethod>),
    Builtin(Rc<BuiltinFunc>),
    Class(Class),
    Instance(Rc<Instance>),
}

impl Value {
    pub fn list(values: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn string(s: &str) -> Value {
        Value::String(Rc::from(s))
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Nil => false,
            _ => true,
        }
    }

    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::Function(fun) => Some(fun.as_ref()),
            Value::BoundMethod(method) => Some(method.as_ref()),
            Value::Builtin(builtin) => Some(builtin.as_ref()),
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
            Value::List(_) => "sequence",
            Value::Function(_) | Value::BoundMethod(_) => "function",
            Value::Builtin(_) => "native function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "Value::String('{}')", s),
            Value::Number(n) => write!(f, "Value::Number({})", n),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Nil => f.write_str("Value::Nil"),
            Value::List(_) => write!(f, "Value::List({})", self),
            other => write!(f, "Value::{}({})", other.type_name(), other),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Nil => f.write_str("nil"),
            Value::List(items) => write_list(items, f, &mut Vec::new()),
            Value::Function(fun) => write!(f, "<fn {}>", fun.name()),
            Value::BoundMethod(method) => write!(f, "<fn {}>", method.name()),
            Value::Builtin(builtin) => write!(f, "<native fn {}>", builtin.name),
            Value::Class(class) => write!(f, "<class {}>", class.name()),
            Value::Instance(instance) => write!(f, "<{} instance>", instance.class.name()),
        }
    }
}

// `open` holds the sequences currently being rendered, a sequence reached again through itself prints as `[...]`
fn write_list(
    items: &List,
    f: &mut std::fmt::Formatter<'_>,
    open: &mut Vec<*const RefCell<Vec<Value>>>,
) -> std::fmt::Result {
    let ptr = Rc::as_ptr(items);
    if open.contains(&ptr) {
        return f.write_str("[...]");
    }
    open.push(ptr);
    f.write_str("[")?;
    for (i, item) in items.borrow().iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match item {
            Value::List(inner) => ensure_sufficient_stack(|| write_list(inner, f, open))?,
            other => write!(f, "{}", other)?,
        }
    }
    open.pop();
    f.write_str("]")
}

// Primitives compare by content, everything with identity compares by reference
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(left), Self::String(right)) => left == right,
            (Self::Number(left), Self::Number(right)) => left == right,
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Nil, Self::Nil) => true,
            (Self::List(left), Self::List(right)) => Rc::ptr_eq(left, right),
            (Self::Function(left), Self::Function(right)) => Rc::ptr_eq(left, right),
            (Self::BoundMethod(left), Self::BoundMethod(right)) => Rc::ptr_eq(left, right),
            (Self::Builtin(left), Self::Builtin(right)) => Rc::ptr_eq(left, right),
            (Self::Class(left), Self::Class(right)) => left.same(right),
            (Self::Instance(left), Self::Instance(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

fn operand_error(op: &str, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "operands of '{}' must be numbers, got {} and {}",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}

// Starting here are convenience implementations to make the interpret loop easier
impl Add for Value {
    type Output = Result<Value, RuntimeError>;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(l), r) => Ok(Value::String(Rc::from(format!("{}{}", l, r)))),
            (l, Value::String(r)) => Ok(Value::String(Rc::from(format!("{}{}", l, r)))),
            (l, r) => Err(RuntimeError::type_error(format!(
                "operands of '+' must be two numbers or include a string, got {} and {}",
                l.type_name(),
                r.type_name()
            ))),
        }
    }
}

impl Mul for Value {
    type Output = Result<Value, RuntimeError>;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l * r)),
            (l, r) => Err(operand_error("*", &l, &r)),
        }
    }
}

impl Div for Value {
    type Output = Result<Value, RuntimeError>;

    fn div(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Value::Number(_), Value::Number(r)) if r == 0f64 => Err(RuntimeError::DivideByZero),
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l / r)),
            (l, r) => Err(operand_error("/", &l, &r)),
        }
    }
}

impl Sub for Value {
    type Output = Result<Value, RuntimeError>;

    fn sub(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l - r)),
            (l, r) => Err(operand_error("-", &l, &r)),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
            (Value::String(l), Value::String(r)) => l.partial_cmp(r),
            _ => None,
        }
    }
}
