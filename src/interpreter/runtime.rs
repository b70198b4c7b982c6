use std::{
    collections::HashMap,
    rc::Rc,
    time::{Instant, SystemTime},
};

use super::callable::{BoundMethod, Function};
use super::class::{Class, SUPER_LITERAL, THIS_LITERAL};
use super::environment::Environment;
use super::error::{RuntimeError, UnwindCause};
use super::output::PrintHandler;
use super::stack::ensure_sufficient_stack;
use super::value::{List, Value};
use crate::ast::{BinaryOp, Expr, FunDecl, Literal, LogicalOp, Program, Stmt, UnaryOp};
use crate::config::Settings;

pub struct Interpreter {
    globals: Rc<Environment>,
    // The scope statements currently execute in, swapped out for the duration of blocks and calls
    env: Rc<Environment>,
    printer: PrintHandler,
    settings: Settings,
    depth: usize,
    // `now()` is wall clock at startup advanced by a monotonic clock, so it never goes backwards within a run
    started: Instant,
    started_epoch_secs: f64,
}

impl Interpreter {
    pub fn new_with_global(globals: Rc<Environment>, printer: PrintHandler, settings: Settings) -> Interpreter {
        let started_epoch_secs = SystemTime::UNIX_EPOCH
            .elapsed()
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or_default();
        Interpreter {
            env: globals.clone(),
            globals,
            printer,
            settings,
            depth: 0,
            started: Instant::now(),
            started_epoch_secs,
        }
    }

    pub fn globals(&self) -> &Rc<Environment> {
        &self.globals
    }

    pub fn output(&self) -> String {
        self.printer.output()
    }

    pub fn now(&self) -> f64 {
        self.started_epoch_secs + self.started.elapsed().as_secs_f64()
    }

    /// Run every statement of the program in order. Any error aborts the run.
    pub fn interpret(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for stmt in &program.0 {
            self.execute(stmt).map_err(UnwindCause::into_error)?;
        }
        Ok(())
    }

    /// Run a single statement, yielding the value when it is an expression statement
    pub fn interpret_one(&mut self, stmt: &Stmt) -> Result<Value, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => self.eval(expr).map_err(UnwindCause::into_error),
            stmt => self
                .execute(stmt)
                .map(|_| Value::Nil)
                .map_err(UnwindCause::into_error),
        }
    }

    /// Invoke any callable value. Arity is checked here so no callable body starts on a bad argument count.
    #[tracing::instrument(level = "debug", skip_all, fields(args = args.len()))]
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let callable = callee
            .as_callable()
            .ok_or_else(|| RuntimeError::NotCallable(callee.to_string()))?;
        let arity = callable.arity();
        if !arity.accepts(args.len()) {
            return Err(RuntimeError::Arity {
                callee: callable.name().to_string(),
                expected: arity,
                actual: args.len(),
            });
        }
        if self.depth >= self.settings.max_call_depth {
            return Err(RuntimeError::StackOverflow(self.settings.max_call_depth));
        }
        tracing::trace!(callee = callable.name(), depth = self.depth, "call");
        self.depth += 1;
        let result = callable.call(self, args);
        self.depth -= 1;
        result
    }

    /// Execute statements in `env`, restoring the previous scope afterwards however execution ended
    pub(crate) fn execute_block(&mut self, stmts: &[Stmt], env: Rc<Environment>) -> Result<(), UnwindCause> {
        let previous = std::mem::replace(&mut self.env, env);
        let result = stmts.iter().try_for_each(|stmt| self.execute(stmt));
        self.env = previous;
        result
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), UnwindCause> {
        match stmt {
            Stmt::VarDecl { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Nil,
                };
                self.env.define(name, value);
            }
            Stmt::FunDecl(decl) => {
                tracing::debug!(name = decl.name.as_str(), "declare function");
                let function = Function::new(decl.clone(), self.env.clone());
                self.env.define(&decl.name, Value::Function(Rc::new(function)));
            }
            Stmt::ClassDecl {
                name,
                parent,
                methods,
            } => self.declare_class(name, parent.as_ref(), methods)?,
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
            Stmt::Print(expr) => {
                let value = self.eval(expr)?;
                self.printer
                    .println(&value.to_string())
                    .map_err(RuntimeError::from)?;
            }
            Stmt::Block(stmts) => {
                let env = Environment::new_child(&self.env);
                self.execute_block(stmts, env)?;
            }
            Stmt::If {
                expr,
                then,
                or_else,
            } => {
                if self.eval(expr)?.to_bool() {
                    self.execute(then)?;
                } else if let Some(or_else) = or_else {
                    self.execute(or_else)?;
                }
            }
            Stmt::Loop { expr, body } => {
                while self.eval(expr)?.to_bool() {
                    match self.execute(body) {
                        Err(UnwindCause::Break) => break,
                        Err(e) => return Err(e),
                        Ok(()) => {}
                    }
                }
            }
            Stmt::Break => return Err(UnwindCause::Break),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Nil,
                };
                return Err(UnwindCause::Return(value));
            }
        }
        Ok(())
    }

    fn declare_class(
        &mut self,
        name: &str,
        parent: Option<&Expr>,
        methods: &[Rc<FunDecl>],
    ) -> Result<(), UnwindCause> {
        let parent = match parent {
            Some(expr) => match self.eval(expr)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "superclass of {} must be a class, got {}",
                        name,
                        other.type_name()
                    ))
                    .into())
                }
            },
            None => None,
        };

        // Methods close over a scope that pins `super` to the parent, whatever the receiver's runtime class turns
        // out to be. A class without a parent binds nil so it hides the `super` of any enclosing class.
        let closure = Environment::new_child(&self.env);
        let pinned = match &parent {
            Some(parent) => Value::Class(parent.clone()),
            None => Value::Nil,
        };
        closure.define(SUPER_LITERAL, pinned);

        let methods: HashMap<String, Rc<Function>> = methods
            .iter()
            .map(|decl| {
                let method = Function::new(decl.clone(), closure.clone());
                (decl.name.clone(), Rc::new(method))
            })
            .collect();

        tracing::debug!(
            name,
            parent = ?parent.as_ref().map(|p| p.name()),
            methods = methods.len(),
            "declare class"
        );
        let class = Class::new(name, parent, methods);
        self.env.define(name, Value::Class(class));
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, UnwindCause> {
        ensure_sufficient_stack(|| self.eval_expr(expr))
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, UnwindCause> {
        match expr {
            Expr::Ternary {
                test,
                if_true,
                if_false,
            } => {
                if self.eval(test)?.to_bool() {
                    self.eval(if_true)
                } else {
                    self.eval(if_false)
                }
            }
            Expr::Binary { left, op, right } => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                Ok(binary(op, lhs, rhs)?)
            }
            Expr::Unary { op, expr } => {
                let val = self.eval(expr)?;
                match (op, val) {
                    (UnaryOp::Not, val) => Ok(Value::Bool(!val.to_bool())),
                    (UnaryOp::Negative, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Negative, other) => Err(RuntimeError::type_error(format!(
                        "operand of '-' must be a number, got {}",
                        other.type_name()
                    ))
                    .into()),
                }
            }
            Expr::Group(expr) => self.eval(expr),
            Expr::Literal(Literal::Number(n)) => Ok(Value::Number(n.into_inner())),
            Expr::Literal(Literal::String(s)) => Ok(Value::string(s)),
            Expr::Literal(Literal::Boolean(b)) => Ok(Value::Bool(*b)),
            Expr::Literal(Literal::Nil) => Ok(Value::Nil),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(values))
            }
            Expr::Variable(name) => Ok(self.env.get(name)?),
            Expr::This => Ok(self.env.get(THIS_LITERAL)?),
            Expr::Super { method } => self.eval_super(method),
            Expr::Assignment { target, expr } => {
                let value = self.eval(expr)?;
                self.env.assign(target, value.clone())?;
                Ok(value)
            }
            // Short circuit and yield the deciding operand i.e. nil or "a" evaluates to "a"
            Expr::Logical { left, op, right } => {
                let left_val = self.eval(left)?;
                match (op, left_val.to_bool()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left_val),
                    _ => self.eval(right),
                }
            }
            Expr::Call { callee, arguments } => {
                let callee = self.eval(callee)?;
                let args = arguments
                    .iter()
                    .map(|expr| self.eval(expr))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.call_value(&callee, args)?)
            }
            Expr::Get { object, property } => match self.eval(object)? {
                Value::Instance(instance) => Ok(instance.get(property)?),
                other => Err(RuntimeError::type_error(format!(
                    "only instances have properties, got {} looking up '{}'",
                    other.type_name(),
                    property
                ))
                .into()),
            },
            Expr::Set {
                object,
                property,
                value,
            } => {
                let instance = match self.eval(object)? {
                    Value::Instance(instance) => instance,
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "only instances have fields, got {} setting '{}'",
                            other.type_name(),
                            property
                        ))
                        .into())
                    }
                };
                let value = self.eval(value)?;
                instance.set(property, value.clone());
                Ok(value)
            }
            Expr::Index { object, index } => {
                let list = self.eval_list(object)?;
                let index = self.eval(index)?;
                let slot = checked_index(&list, &index)?;
                let value = list.borrow()[slot].clone();
                Ok(value)
            }
            Expr::SetIndex {
                object,
                index,
                value,
            } => {
                let list = self.eval_list(object)?;
                let index = self.eval(index)?;
                let value = self.eval(value)?;
                let slot = checked_index(&list, &index)?;
                list.borrow_mut()[slot] = value.clone();
                Ok(value)
            }
        }
    }

    // Resolve against the parent pinned when the enclosing class was declared and bind to the current `this`
    fn eval_super(&mut self, method: &str) -> Result<Value, UnwindCause> {
        let parent = match self.env.get(SUPER_LITERAL)? {
            Value::Class(class) => class,
            // Bound by a class without a parent
            Value::Nil => return Err(RuntimeError::UnresolvedName(SUPER_LITERAL.to_string()).into()),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "super must refer to a class, got {}",
                    other.type_name()
                ))
                .into())
            }
        };
        let receiver = match self.env.get(THIS_LITERAL)? {
            Value::Instance(instance) => instance,
            other => {
                return Err(RuntimeError::type_error(format!(
                    "this must refer to an instance, got {}",
                    other.type_name()
                ))
                .into())
            }
        };
        match parent.find_method(method) {
            Some(method) => Ok(Value::BoundMethod(Rc::new(BoundMethod {
                receiver,
                method,
            }))),
            None => Err(RuntimeError::UnresolvedProperty {
                object: format!("superclass {}", parent.name()),
                property: method.to_string(),
            }
            .into()),
        }
    }

    fn eval_list(&mut self, expr: &Expr) -> Result<List, UnwindCause> {
        match self.eval(expr)? {
            Value::List(list) => Ok(list),
            other => Err(RuntimeError::type_error(format!(
                "only sequences can be indexed, got {}",
                other.type_name()
            ))
            .into()),
        }
    }
}

fn checked_index(list: &List, index: &Value) -> Result<usize, RuntimeError> {
    let len = list.borrow().len();
    match index {
        Value::Number(n) if n.fract() == 0.0 && n.is_finite() => {
            let index = *n as i64;
            if index < 0 || index as usize >= len {
                Err(RuntimeError::IndexOutOfRange { index, len })
            } else {
                Ok(index as usize)
            }
        }
        other => Err(RuntimeError::type_error(format!(
            "sequence index must be a whole number, got {}",
            other
        ))),
    }
}

fn binary(op: &BinaryOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::NotEqual => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::LessThan => compare(op, &lhs, &rhs).map(|o| Value::Bool(o.is_lt())),
        BinaryOp::LessThanEqual => compare(op, &lhs, &rhs).map(|o| Value::Bool(o.is_le())),
        BinaryOp::GreaterThan => compare(op, &lhs, &rhs).map(|o| Value::Bool(o.is_gt())),
        BinaryOp::GreaterThanEqual => compare(op, &lhs, &rhs).map(|o| Value::Bool(o.is_ge())),
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Subtract => lhs - rhs,
        BinaryOp::Multiply => lhs * rhs,
        BinaryOp::Divide => lhs / rhs,
    }
}

// Numbers with numbers and strings with strings, NaN compares false in every direction
fn compare(op: &BinaryOp, lhs: &Value, rhs: &Value) -> Result<std::cmp::Ordering, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) if l.is_nan() || r.is_nan() => Ok(nan_ordering(op)),
        _ => lhs.partial_cmp(rhs).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "operands of '{}' must be two numbers or two strings, got {} and {}",
                op,
                lhs.type_name(),
                rhs.type_name()
            ))
        }),
    }
}

// An ordering that makes the given comparison operator evaluate to false
fn nan_ordering(op: &BinaryOp) -> std::cmp::Ordering {
    match op {
        BinaryOp::LessThan | BinaryOp::LessThanEqual => std::cmp::Ordering::Greater,
        _ => std::cmp::Ordering::Less,
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::interpreter::{stock_interpreter, stock_interpreter_with};
    use crate::parser::parse;
    use crate::reporter::CollectingReporter;
    use crate::scanner::Scanner;

    fn program(code: &str) -> Program {
        let mut reporter = CollectingReporter::default();
        match parse(&mut reporter, Scanner::new(code)) {
            Ok(program) => program,
            Err(_) => panic!("parse errors: {:?}", reporter.messages),
        }
    }

    fn run(code: &str) -> (String, Result<(), RuntimeError>) {
        let mut interpreter = stock_interpreter(PrintHandler::buffer());
        let result = interpreter.interpret(&program(code));
        (interpreter.output(), result)
    }

    fn run_ok(code: &str) -> String {
        let (output, result) = run(code);
        if let Err(error) = result {
            panic!("runtime error: {} (output so far {:?})", error, output);
        }
        output
    }

    fn run_err(code: &str) -> RuntimeError {
        run(code).1.expect_err("expected the program to fail")
    }

    #[test]
    fn print_forms() {
        assert_eq!(
            "3\n0.5\nhi\ntrue\nnil\n[1, a, [true]]\n",
            run_ok(
                r#"
                print 1 + 2;
                print 1 / 2;
                print "hi";
                print true;
                print nil;
                print [1, "a", [true]];
                "#
            )
        );
    }

    #[test]
    fn string_concatenation_uses_display_forms() {
        assert_eq!("n=4\n[1]x\n", run_ok(r#"print "n=" + 4; print [1] + "x";"#));
        assert!(matches!(run_err("print 1 + nil;"), RuntimeError::TypeError(_)));
    }

    #[test]
    fn closures_capture_defining_scope() {
        let output = run_ok(
            r#"
            fun makeCounter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }
            var counter = makeCounter();
            counter();
            counter();
            print counter();
            var other = makeCounter();
            print other();
            "#,
        );
        assert_eq!("3\n1\n", output);
    }

    #[test]
    fn calls_do_not_see_caller_scope() {
        let err = run_err(
            r#"
            fun peek() { return secret; }
            fun caller() {
                var secret = 1;
                return peek();
            }
            caller();
            "#,
        );
        assert!(matches!(err, RuntimeError::UnresolvedName(name) if name == "secret"));
    }

    #[test]
    fn recursion_through_own_name() {
        assert_eq!(
            "55\n",
            run_ok(
                r#"
                fun fib(n) {
                    if (n < 2) return n;
                    return fib(n - 1) + fib(n - 2);
                }
                print fib(10);
                "#
            )
        );
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!("nil\n", run_ok("fun f() { 1; } print f();"));
    }

    #[test]
    fn return_unwinds_nested_blocks_and_loops() {
        assert_eq!(
            "2\n",
            run_ok(
                r#"
                fun find() {
                    for (var i = 0; i < 10; i = i + 1) {
                        { if (i == 2) return i; }
                    }
                    return -1;
                }
                print find();
                "#
            )
        );
    }

    #[test]
    fn block_scopes_shadow_and_restore() {
        assert_eq!(
            "inner\nouter\n",
            run_ok(
                r#"
                var a = "outer";
                {
                    var a = "inner";
                    print a;
                }
                print a;
                "#
            )
        );
    }

    #[test]
    fn assignment_to_undeclared_fails() {
        assert!(matches!(run_err("x = 1;"), RuntimeError::UnresolvedName(name) if name == "x"));
    }

    #[test]
    fn arity_mismatch_runs_nothing() {
        let (output, result) = run(
            r#"
            fun greet(name) { print "hello " + name; }
            greet();
            "#,
        );
        assert_eq!("", output);
        assert!(matches!(
            result,
            Err(RuntimeError::Arity { expected, actual: 0, .. }) if expected == crate::interpreter::Arity::Fixed(1)
        ));
    }

    #[test]
    fn method_arity_mismatch_runs_nothing() {
        let (output, result) = run(
            r#"
            class Greeter {
                greet(name) { print "hello " + name; }
            }
            var g = Greeter();
            g.greet("a", "b");
            "#,
        );
        assert_eq!("", output);
        match result {
            Err(RuntimeError::Arity {
                callee,
                expected,
                actual,
            }) => {
                assert_eq!("greet", callee);
                assert_eq!(crate::interpreter::Arity::Fixed(1), expected);
                assert_eq!(2, actual);
            }
            other => panic!("expected an arity error, got {:?}", other),
        }
    }

    #[test]
    fn constructor_arity_mismatch_runs_no_init() {
        let (output, result) = run(
            r#"
            class Base {
                init(a, b) { print "init ran"; }
            }
            class Derived < Base {}
            Derived(1);
            "#,
        );
        assert_eq!("", output);
        assert!(matches!(
            result,
            Err(RuntimeError::Arity { callee, actual: 1, .. }) if callee == "Derived"
        ));
    }

    #[test]
    fn methods_bind_this() {
        assert_eq!(
            "Hi, Ada\n",
            run_ok(
                r#"
                class Person {
                    init(name) { this.name = name; }
                    greet() { return "Hi, " + this.name; }
                }
                var p = Person("Ada");
                var g = p.greet;
                print g();
                "#
            )
        );
    }

    #[test]
    fn constructor_discards_init_return_value() {
        assert_eq!(
            "<Box instance>\n",
            run_ok(
                r#"
                class Box { init() { return 42; } }
                print Box();
                "#
            )
        );
    }

    #[test]
    fn field_function_is_not_bound() {
        assert_eq!(
            "11\n",
            run_ok(
                r#"
                class Holder {
                    init(offset) {
                        fun add(x) { return x + offset; }
                        this.add = add;
                    }
                }
                var h = Holder(10);
                print h.add(1);
                "#
            )
        );
    }

    #[test]
    fn field_wins_over_inherited_method() {
        assert_eq!(
            "field\n",
            run_ok(
                r#"
                class A { name() { return "method"; } }
                class B < A {}
                var b = B();
                b.name = "field";
                print b.name;
                "#
            )
        );
    }

    #[test]
    fn super_resolves_from_defining_class() {
        let output = run_ok(
            r#"
            class A { method() { return "A"; } }
            class B < A { method() { return "B>" + super.method(); } }
            class C < B { method() { return "C>" + super.method(); } }
            print C().method();
            var b = B();
            print b.method();
            "#,
        );
        assert_eq!("C>B>A\nB>A\n", output);
    }

    #[test]
    fn super_reaches_any_ancestor_method() {
        assert_eq!(
            "base helper\n",
            run_ok(
                r#"
                class Base { helper() { return "base helper"; } }
                class Mid < Base {}
                class Leaf < Mid {
                    helper() { return "leaf"; }
                    call() { return super.helper(); }
                }
                print Leaf().call();
                "#
            )
        );
    }

    #[test]
    fn super_outside_subclass_fails() {
        assert!(matches!(
            run_err("class A { m() { return super.m(); } } A().m();"),
            RuntimeError::UnresolvedName(name) if name == "super"
        ));
    }

    #[test]
    fn parentless_class_hides_enclosing_super() {
        let err = run_err(
            r#"
            class A { m() { return "A.m"; } }
            class B < A {
                m() {
                    class Inner { n() { return super.m(); } }
                    return Inner().n();
                }
            }
            B().m();
            "#,
        );
        assert!(matches!(err, RuntimeError::UnresolvedName(name) if name == "super"));
    }

    #[test]
    fn super_inside_nested_function_of_method() {
        assert_eq!(
            "A.m\n",
            run_ok(
                r#"
                class A { m() { return "A.m"; } }
                class B < A {
                    m() {
                        fun helper() { return super.m(); }
                        return helper();
                    }
                }
                print B().m();
                "#
            )
        );
    }

    #[test]
    fn runaway_recursion_hits_the_depth_limit_on_a_small_stack() {
        let err = run_err("fun down(n) { return down(n + 1); } down(0);");
        assert!(matches!(
            err,
            RuntimeError::StackOverflow(limit) if limit == crate::config::DEFAULT_MAX_CALL_DEPTH
        ));
    }

    #[test]
    fn missing_property_fails() {
        assert!(matches!(
            run_err("class A {} print A().nothing;"),
            RuntimeError::UnresolvedProperty { property, .. } if property == "nothing"
        ));
    }

    #[test]
    fn parent_must_be_a_class() {
        assert!(matches!(
            run_err("var NotAClass = 1; class B < NotAClass {}"),
            RuntimeError::TypeError(_)
        ));
    }

    #[test]
    fn calling_a_non_callable_fails() {
        assert!(matches!(run_err("\"text\"();"), RuntimeError::NotCallable(_)));
    }

    #[test]
    fn index_read_and_write() {
        assert_eq!(
            "[1, 9, 3]\n9\n",
            run_ok("var xs = [1, 2, 3]; xs[1] = 9; print xs; print xs[1];")
        );
        assert!(matches!(
            run_err("var xs = [1]; print xs[1];"),
            RuntimeError::IndexOutOfRange { index: 1, len: 1 }
        ));
        assert!(matches!(run_err("print [1][0.5];"), RuntimeError::TypeError(_)));
    }

    #[test]
    fn sequence_stored_in_itself_prints() {
        assert_eq!("[[...]]\n", run_ok("var a = [1]; a[0] = a; print a;"));
    }

    #[test]
    fn comparisons_require_matching_kinds() {
        assert_eq!("true\ntrue\nfalse\n", run_ok(r#"print 1 < 2; print "a" < "b"; print 2 <= 1;"#));
        assert!(matches!(run_err("print 1 < \"2\";"), RuntimeError::TypeError(_)));
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(
            "fallback\nnil\n",
            run_ok(
                r#"
                print nil or "fallback";
                print nil and undefined_name;
                "#
            )
        );
    }

    #[test]
    fn break_exits_innermost_loop() {
        assert_eq!(
            "0\n1\n",
            run_ok("var i = 0; while (true) { if (i == 2) break; print i; i = i + 1; }")
        );
        assert!(matches!(run_err("break;"), RuntimeError::InvalidBreak));
    }

    #[test]
    fn top_level_return_is_fatal() {
        assert!(matches!(run_err("return 1;"), RuntimeError::ReturnOutsideFunction));
    }

    #[test]
    fn call_depth_is_limited() {
        let mut interpreter =
            stock_interpreter_with(PrintHandler::buffer(), Settings { max_call_depth: 50 });
        let result = interpreter.interpret(&program("fun down(n) { return down(n + 1); } down(0);"));
        assert!(matches!(result, Err(RuntimeError::StackOverflow(50))));
        // The depth counter unwinds with the error so later calls still work
        interpreter
            .interpret(&program("fun one() { return 1; } print one();"))
            .unwrap();
        assert_eq!("1\n", interpreter.output());
    }

    #[test]
    fn interpret_one_yields_expression_values() {
        let mut interpreter = stock_interpreter(PrintHandler::buffer());
        let stmts = program("var a = 2; a * 21;").0;
        assert_eq!(Value::Nil, interpreter.interpret_one(&stmts[0]).unwrap());
        assert_eq!(Value::Number(42.0), interpreter.interpret_one(&stmts[1]).unwrap());
    }
}
