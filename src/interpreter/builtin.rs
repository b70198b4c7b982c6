use std::rc::Rc;

use super::callable::{Arity, BuiltinFunc, BuiltinImpl};
use super::environment::Environment;
use super::error::RuntimeError;
use super::runtime::Interpreter;
use super::value::{List, Value};

fn expect_list<'a>(name: &str, value: &'a Value) -> Result<&'a List, RuntimeError> {
    match value {
        Value::List(list) => Ok(list),
        other => Err(RuntimeError::type_error(format!(
            "{} expects a sequence, got {}",
            name,
            other.type_name()
        ))),
    }
}

// 2^63 is exactly representable, every whole number below it fits an i64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn expect_integer(name: &str, value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Number(n) if n.fract() == 0.0 && *n >= -I64_BOUND && *n < I64_BOUND => Ok(*n as i64),
        Value::Number(n) => Err(RuntimeError::type_error(format!(
            "{} expects whole numbers within 64-bit range, got {}",
            name, n
        ))),
        other => Err(RuntimeError::type_error(format!(
            "{} expects whole numbers, got {}",
            name,
            other.type_name()
        ))),
    }
}

// Builtins are reachable through `Callable::call` without the interpreter's arity check
fn nth_arg<'a>(name: &str, arity: Arity, args: &'a [Value], n: usize) -> Result<&'a Value, RuntimeError> {
    args.get(n).ok_or_else(|| RuntimeError::Arity {
        callee: name.to_string(),
        expected: arity,
        actual: args.len(),
    })
}

fn single_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, RuntimeError> {
    nth_arg(name, Arity::Fixed(1), args, 0)
}

fn now_impl(interpreter: &mut Interpreter, _args: Vec<Value>) -> Result<Value, RuntimeError> {
    Ok(Value::Number(interpreter.now()))
}

fn len_impl(_interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let list = expect_list("len", single_arg("len", &args)?)?;
    let len = list.borrow().len();
    Ok(Value::Number(len as f64))
}

fn first_impl(_interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let list = expect_list("first", single_arg("first", &args)?)?;
    let first = list.borrow().first().cloned();
    first.ok_or(RuntimeError::EmptyOperand("first"))
}

fn last_impl(_interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let list = expect_list("last", single_arg("last", &args)?)?;
    let last = list.borrow().last().cloned();
    last.ok_or(RuntimeError::EmptyOperand("last"))
}

fn rest_impl(_interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let list = expect_list("rest", single_arg("rest", &args)?)?;
    let items = list.borrow();
    match items.split_first() {
        Some((_, rest)) => Ok(Value::list(rest.to_vec())),
        None => Err(RuntimeError::EmptyOperand("rest")),
    }
}

// Copies the sequence, the argument itself is left untouched
fn append_impl(_interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let head = nth_arg("append", APPEND_ARITY, &args, 0)?;
    let mut items = expect_list("append", head)?.borrow().clone();
    items.extend(args.into_iter().skip(1));
    Ok(Value::list(items))
}

fn str_impl(_interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    Ok(Value::string(&single_arg("str", &args)?.to_string()))
}

fn range_impl(_interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let bounds = args
        .iter()
        .map(|arg| expect_integer("range", arg))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(RuntimeError::Arity {
                callee: "range".to_string(),
                expected: RANGE_ARITY,
                actual: bounds.len(),
            })
        }
    };
    if step == 0 {
        return Err(RuntimeError::type_error("range step must not be zero"));
    }
    let mut values = Vec::new();
    let mut next = Some(start);
    while let Some(i) = next {
        if (step > 0 && i >= stop) || (step < 0 && i <= stop) {
            break;
        }
        values.push(Value::Number(i as f64));
        next = i.checked_add(step);
    }
    Ok(Value::list(values))
}

const APPEND_ARITY: Arity = Arity::Variadic { min: 2, max: None };
const RANGE_ARITY: Arity = Arity::Variadic {
    min: 1,
    max: Some(3),
};

const BUILTINS: [(&str, Arity, BuiltinImpl); 8] = [
    ("now", Arity::Fixed(0), now_impl),
    ("len", Arity::Fixed(1), len_impl),
    ("first", Arity::Fixed(1), first_impl),
    ("rest", Arity::Fixed(1), rest_impl),
    ("last", Arity::Fixed(1), last_impl),
    ("append", APPEND_ARITY, append_impl),
    ("str", Arity::Fixed(1), str_impl),
    ("range", RANGE_ARITY, range_impl),
];

pub fn populate_builtin(global_env: &Environment) {
    for (name, arity, call) in BUILTINS {
        global_env.define(name, Value::Builtin(Rc::new(BuiltinFunc { name, arity, call })));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interpreter::stock_interpreter;
    use crate::interpreter::Callable;
    use crate::interpreter::PrintHandler;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let mut interpreter = stock_interpreter(PrintHandler::buffer());
        let builtin = interpreter.globals().get(name).unwrap();
        interpreter.call_value(&builtin, args)
    }

    fn numbers(values: &[f64]) -> Value {
        Value::list(values.iter().map(|n| Value::Number(*n)).collect())
    }

    #[test]
    fn len_counts_elements() {
        assert_eq!(Value::Number(3.0), call("len", vec![numbers(&[1.0, 2.0, 3.0])]).unwrap());
        assert_eq!(Value::Number(0.0), call("len", vec![numbers(&[])]).unwrap());
    }

    #[test]
    fn len_rejects_non_sequences() {
        assert!(matches!(
            call("len", vec![Value::string("abc")]),
            Err(RuntimeError::TypeError(_))
        ));
    }

    #[test]
    fn first_and_rest_decompose() {
        let list = numbers(&[1.0, 2.0, 3.0]);
        assert_eq!(Value::Number(1.0), call("first", vec![list.clone()]).unwrap());
        let rest = call("rest", vec![list.clone()]).unwrap();
        assert_eq!("[2, 3]", rest.to_string());
        // The argument is left as it was
        assert_eq!("[1, 2, 3]", list.to_string());
        assert_eq!("[]", call("rest", vec![numbers(&[7.0])]).unwrap().to_string());
    }

    #[test]
    fn empty_sequences_fail() {
        for name in ["first", "rest", "last"] {
            assert!(matches!(
                call(name, vec![numbers(&[])]),
                Err(RuntimeError::EmptyOperand(op)) if op == name
            ));
        }
    }

    #[test]
    fn arity_is_checked_for_builtins() {
        match call("len", vec![]) {
            Err(RuntimeError::Arity {
                callee,
                expected,
                actual,
            }) => {
                assert_eq!("len", callee);
                assert_eq!(Arity::Fixed(1), expected);
                assert_eq!(0, actual);
            }
            other => panic!("expected an arity error, got {:?}", other),
        }
        assert!(matches!(
            call("range", vec![Value::Number(1.0); 4]),
            Err(RuntimeError::Arity { .. })
        ));
    }

    #[test]
    fn append_copies() {
        let list = numbers(&[1.0]);
        let appended = call(
            "append",
            vec![list.clone(), Value::Number(2.0), Value::string("x")],
        )
        .unwrap();
        assert_eq!("[1, 2, x]", appended.to_string());
        assert_eq!("[1]", list.to_string());
    }

    #[test]
    fn range_variants() {
        let range = |args: &[f64]| {
            call("range", args.iter().map(|n| Value::Number(*n)).collect())
                .unwrap()
                .to_string()
        };
        assert_eq!("[0, 1, 2]", range(&[3.0]));
        assert_eq!("[2, 3, 4]", range(&[2.0, 5.0]));
        assert_eq!("[10, 7, 4, 1]", range(&[10.0, 0.0, -3.0]));
        assert!(matches!(
            call("range", vec![Value::Number(0.5)]),
            Err(RuntimeError::TypeError(_))
        ));
        assert!(matches!(
            call("range", vec![Value::Number(0.0), Value::Number(3.0), Value::Number(0.0)]),
            Err(RuntimeError::TypeError(_))
        ));
    }

    #[test]
    fn range_stops_before_overflowing() {
        let result = call(
            "range",
            vec![
                Value::Number(0.0),
                Value::Number(9_000_000_000_000_000_000.0),
                Value::Number(5_000_000_000_000_000_000.0),
            ],
        )
        .unwrap();
        match result {
            Value::List(items) => assert_eq!(2, items.borrow().len()),
            other => panic!("expected a sequence, got {:?}", other),
        }
    }

    #[test]
    fn range_rejects_bounds_outside_integer_range() {
        let err = call("range", vec![Value::Number(0.0), Value::Number(1e19)]).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeError(_)));
        let err = call("range", vec![Value::string("3")]).unwrap_err();
        assert_eq!("type error: range expects whole numbers, got string", err.to_string());
    }

    #[test]
    fn direct_calls_without_arguments_fail_cleanly() {
        let mut interpreter = stock_interpreter(PrintHandler::buffer());
        for name in ["len", "first", "last", "rest", "str", "append", "range"] {
            let builtin = match interpreter.globals().get(name).unwrap() {
                Value::Builtin(builtin) => builtin,
                other => panic!("{} is not a builtin: {:?}", name, other),
            };
            let result = Callable::call(builtin.as_ref(), &mut interpreter, vec![]);
            assert!(
                matches!(result, Err(RuntimeError::Arity { actual: 0, .. })),
                "{} returned {:?}",
                name,
                result
            );
        }
    }

    #[test]
    fn str_renders_display_form() {
        assert_eq!(
            Value::string("[1, 2]"),
            call("str", vec![numbers(&[1.0, 2.0])]).unwrap()
        );
    }

    #[test]
    fn now_never_decreases() {
        let mut interpreter = stock_interpreter(PrintHandler::buffer());
        let now = interpreter.globals().get("now").unwrap();
        let mut previous = 0.0;
        for _ in 0..100 {
            match interpreter.call_value(&now, vec![]).unwrap() {
                Value::Number(n) => {
                    assert!(n >= previous);
                    previous = n;
                }
                other => panic!("now returned {:?}", other),
            }
        }
    }
}
