use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::{
    callable::{Arity, BoundMethod, Callable, Function},
    error::RuntimeError,
    runtime::Interpreter,
    value::Value,
};

pub const INIT_METHOD_NAME: &str = "init";
pub const THIS_LITERAL: &str = "this";
pub const SUPER_LITERAL: &str = "super";

// We split the class from ClassInner so that instances and subclasses can hold a cheap reference to the inner data
// while the Class itself implements Callable
#[derive(Clone)]
pub struct Class {
    pub inner: Rc<ClassInner>,
}

pub struct ClassInner {
    pub name: String,
    pub parent: Option<Class>,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(name: &str, parent: Option<Class>, methods: HashMap<String, Rc<Function>>) -> Class {
        Class {
            inner: Rc::new(ClassInner {
                name: name.to_string(),
                parent,
                methods,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&Class> {
        self.inner.parent.as_ref()
    }

    pub fn same(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Walk this class and then its ancestors until one of them defines `name`
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        let mut class = Some(self);
        while let Some(current) = class {
            if let Some(method) = current.inner.methods.get(name) {
                return Some(method.clone());
            }
            class = current.parent();
        }
        None
    }
}

impl Callable for Class {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn arity(&self) -> Arity {
        match self.find_method(INIT_METHOD_NAME) {
            Some(init) => init.arity(),
            None => Arity::Fixed(0),
        }
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let instance = Rc::new(Instance::new(self.clone()));
        if let Some(init) = self.find_method(INIT_METHOD_NAME) {
            // The initializer's own return value is dropped, construction always yields the instance
            init.invoke(interpreter, Some(Value::Instance(instance.clone())), args)?;
        }
        Ok(Value::Instance(instance))
    }
}

pub struct Instance {
    pub class: Class,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Class) -> Instance {
        Instance {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    /// Fields win over methods and are returned as stored. Methods come back bound to this instance.
    pub fn get(self: &Rc<Self>, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.fields.borrow().get(name) {
            return Ok(value.clone());
        }
        match self.class.find_method(name) {
            Some(method) => Ok(Value::BoundMethod(Rc::new(BoundMethod {
                receiver: self.clone(),
                method,
            }))),
            None => Err(RuntimeError::UnresolvedProperty {
                object: format!("{} instance", self.class.name()),
                property: name.to_string(),
            }),
        }
    }

    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::FunDecl;
    use crate::interpreter::environment::Environment;

    fn method(name: &str, parameters: &[&str]) -> Rc<Function> {
        Rc::new(Function::new(
            Rc::new(FunDecl {
                name: name.to_string(),
                parameters: parameters.iter().map(|p| p.to_string()).collect(),
                body: Vec::new(),
            }),
            Environment::new_global(),
        ))
    }

    fn class(name: &str, parent: Option<Class>, methods: &[Rc<Function>]) -> Class {
        let methods = methods
            .iter()
            .map(|m| (m.decl.name.clone(), m.clone()))
            .collect();
        Class::new(name, parent, methods)
    }

    #[test]
    fn method_resolution_walks_the_chain() {
        let speak = method("speak", &[]);
        let grandparent = class("A", None, &[speak.clone()]);
        let parent = class("B", Some(grandparent), &[]);
        let child = class("C", Some(parent), &[method("other", &[])]);
        let found = child.find_method("speak").unwrap();
        assert!(Rc::ptr_eq(&speak, &found));
        assert!(child.find_method("missing").is_none());
    }

    #[test]
    fn override_shadows_parent_method() {
        let base = class("Base", None, &[method("describe", &[])]);
        let own = method("describe", &["x"]);
        let derived = class("Derived", Some(base.clone()), &[own.clone()]);
        assert!(Rc::ptr_eq(&own, &derived.find_method("describe").unwrap()));
        assert_eq!(Arity::Fixed(0), base.find_method("describe").unwrap().arity());
    }

    #[test]
    fn constructor_arity_follows_inherited_init() {
        let base = class("Base", None, &[method(INIT_METHOD_NAME, &["a", "b"])]);
        let derived = class("Derived", Some(base), &[]);
        assert_eq!(Arity::Fixed(2), derived.arity());
        assert_eq!(Arity::Fixed(0), class("Plain", None, &[]).arity());
    }

    #[test]
    fn fields_take_precedence_over_methods() {
        let cls = class("Thing", None, &[method("name", &[])]);
        let instance = Rc::new(Instance::new(cls));
        assert!(matches!(instance.get("name"), Ok(Value::BoundMethod(_))));
        instance.set("name", Value::string("field"));
        assert_eq!(Value::string("field"), instance.get("name").unwrap());
    }

    #[test]
    fn missing_property_is_an_error() {
        let instance = Rc::new(Instance::new(class("Thing", None, &[])));
        match instance.get("nope") {
            Err(RuntimeError::UnresolvedProperty { object, property }) => {
                assert_eq!("Thing instance", object);
                assert_eq!("nope", property);
            }
            other => panic!("expected an unresolved property, got {:?}", other),
        }
    }
}
