//! Classes, instances and method binding
//!
//! A class value keeps its declaration and the scope it was declared in.
//! `new` builds the instance's field scope from the field declarations of the
//! whole chain, root class first, so a subclass field of the same name
//! replaces the inherited one. Field initializers run in the class's
//! declaring scope.
//!
//! Reading a method through an instance binds it: the resulting closure
//! closes over a small scope holding `this` and, when the defining class has
//! a parent, `super`.

use crate::interpreter::engine::Evaluator;
use crate::interpreter::errors::RuntimeError;
use crate::memory::environment::Env;
use crate::memory::value::{Class, Instance, Value};
use crate::parser::ast::*;
use std::rc::Rc;

const CONSTRUCTOR: &str = "constructor";

impl Evaluator<'_> {
    pub(crate) fn eval_class_decl(
        &mut self,
        decl: &Rc<ClassDecl>,
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let parent = match &decl.parent {
            Some(parent_name) => match self.lookup(env, parent_name, location)? {
                Value::Class(parent) => Some(parent),
                other => {
                    return Err(RuntimeError::type_mismatch(
                        format!("class {} cannot extend {}", decl.name, other.type_name()),
                        location,
                    ))
                }
            },
            None => None,
        };

        let class = Class {
            name: decl.name.clone(),
            parent,
            decl: decl.clone(),
            env: env.clone(),
        };
        tracing::trace!(class = %decl.name, "class declared");
        self.declare(env, &decl.name, Value::Class(Rc::new(class)), false, location)?;
        Ok(Value::Null)
    }

    /// `new Class(args)`
    pub(crate) fn eval_new(
        &mut self,
        class: &AstNode,
        args: &[AstNode],
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let class = match self.eval_expr(class, env)? {
            Value::Class(class) => class,
            other => {
                return Err(RuntimeError::type_mismatch(
                    format!("cannot instantiate {}", other.type_name()),
                    location,
                ))
            }
        };
        let args = self.eval_args(args, env)?;

        let instance = self.instantiate(&class)?;
        self.run_constructor(&class, instance.clone(), args, location)?;
        Ok(instance)
    }

    fn instantiate(&mut self, class: &Rc<Class>) -> Result<Value, RuntimeError> {
        let fields = self.detached_scope();
        for ancestor in class.lineage() {
            for field in &ancestor.decl.fields {
                let value = match &field.init {
                    Some(init) => self.eval_expr(init, &ancestor.env)?,
                    None => Value::Null,
                };
                fields.borrow_mut().redefine(&field.name, value, field.constant);
            }
        }
        Ok(Value::Instance(Rc::new(Instance {
            class: class.clone(),
            fields,
        })))
    }

    /// Run the nearest `constructor` along the chain of `class` on `this`
    pub(crate) fn run_constructor(
        &mut self,
        class: &Rc<Class>,
        this: Value,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match class.find_method(CONSTRUCTOR) {
            Some((method, owner)) => {
                let bound = self.bind_method(this, &method, &owner);
                self.call_value(bound, args, location)?;
                Ok(())
            }
            None if args.is_empty() => Ok(()),
            None => Err(RuntimeError::ArityMismatch {
                function: format!("{}.{}", class.name, CONSTRUCTOR),
                expected: 0,
                got: args.len(),
                location,
            }),
        }
    }

    /// Closure for `method` whose scope defines `this` (and `super` when `owner` has a parent)
    pub(crate) fn bind_method(&mut self, this: Value, method: &Rc<FunctionDecl>, owner: &Rc<Class>) -> Value {
        let scope = self.child_scope(&owner.env);
        {
            let mut bound = scope.borrow_mut();
            bound.redefine("this", this, true);
            if let Some(parent) = &owner.parent {
                bound.redefine("super", Value::Class(parent.clone()), true);
            }
        }
        self.make_closure(method, &scope)
    }

    pub(crate) fn resolve_this(&self, env: &Env, location: SourceLocation) -> Result<Value, RuntimeError> {
        env.borrow().get("this").ok_or(RuntimeError::OutsideMethod {
            keyword: "this",
            location,
        })
    }

    /// The parent class of the method's defining class
    pub(crate) fn resolve_super(&self, env: &Env, location: SourceLocation) -> Result<Value, RuntimeError> {
        let env = env.borrow();
        if let Some(parent) = env.get("super") {
            return Ok(parent);
        }
        if env.get("this").is_some() {
            return Err(RuntimeError::type_mismatch("class has no parent for 'super'", location));
        }
        Err(RuntimeError::OutsideMethod {
            keyword: "super",
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::errors::RuntimeError;
    use crate::interpreter::limits::Limits;
    use crate::interpreter::run;
    use crate::snapshot::ConsoleLog;
    use pretty_assertions::assert_eq;

    fn run_source(source: &str) -> (Result<String, RuntimeError>, Vec<String>) {
        let program = match crate::parser::parse(source) {
            Ok(program) => program,
            Err(errors) => panic!("parse errors: {:?}", errors),
        };
        let mut console = ConsoleLog::new();
        let result = run(&program, &mut console, &Limits::default()).map(|v| v.to_string());
        (result, console.texts())
    }

    fn output(source: &str) -> Vec<String> {
        let (result, lines) = run_source(source);
        if let Err(err) = result {
            panic!("runtime error: {}", err);
        }
        lines
    }

    #[test]
    fn test_fields_and_methods() {
        let source = "
            class Counter {
                let count = 0;
                fn bump(by) { this.count += by; return this.count; }
            }
            let c = new Counter();
            c.bump(2);
            print(c.bump(3), c.count);
        ";
        assert_eq!(output(source), vec!["5 5"]);
    }

    #[test]
    fn test_constructor_sets_fields() {
        let source = "
            class Point {
                let x = 0;
                let y = 0;
                fn constructor(x, y) { this.x = x; this.y = y; }
                fn sum() { return this.x + this.y; }
            }
            let p = new Point(3, 4);
            print(p.sum(), p);
        ";
        assert_eq!(output(source), vec!["7 Point {x: 3, y: 4}"]);
    }

    #[test]
    fn test_inheritance_and_super() {
        let source = "
            class Animal {
                let name = \"?\";
                fn constructor(name) { this.name = name; }
                fn speak() { return f\"{this.name} makes a sound\"; }
            }
            class Dog extends Animal {
                let tricks = 0;
                fn constructor(name) { super(name); this.tricks = 2; }
                fn speak() { return super.speak() + \" (woof)\"; }
            }
            let d = new Dog(\"Rex\");
            print(d.speak());
            print(d.tricks);
        ";
        assert_eq!(output(source), vec!["Rex makes a sound (woof)", "2"]);
    }

    #[test]
    fn test_inherited_constructor() {
        let source = "
            class Base { let v = 1; fn constructor(v) { this.v = v; } }
            class Child extends Base {}
            print(new Child(7).v);
        ";
        assert_eq!(output(source), vec!["7"]);
    }

    #[test]
    fn test_bound_method_keeps_instance() {
        let source = "
            class Box { let v = 5; fn get() { return this.v; } }
            let getter = new Box().get;
            print(getter());
        ";
        assert_eq!(output(source), vec!["5"]);
    }

    #[test]
    fn test_constant_field_rejects_assignment() {
        let (result, _) = run_source("class K { const id = 1; } let k = new K(); k.id = 2;");
        assert!(matches!(result, Err(RuntimeError::ConstantAssignment { .. })));
    }

    #[test]
    fn test_constructor_arguments_without_constructor() {
        let (result, _) = run_source("class E {} new E(1);");
        assert!(matches!(
            result,
            Err(RuntimeError::ArityMismatch { expected: 0, got: 1, .. })
        ));
    }

    #[test]
    fn test_this_outside_method() {
        let (result, _) = run_source("this;");
        assert!(matches!(
            result,
            Err(RuntimeError::OutsideMethod { keyword: "this", .. })
        ));
        let (result, _) = run_source("class A { fn f() { return super.f(); } } new A().f();");
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));
    }

    #[test]
    fn test_unknown_member() {
        let (result, _) = run_source("class A {} new A().missing;");
        match result {
            Err(RuntimeError::UnknownProperty { name, type_name, .. }) => {
                assert_eq!(name, "missing");
                assert_eq!(type_name, "A");
            }
            other => panic!("Expected unknown property, got {:?}", other),
        }
    }

    #[test]
    fn test_extend_non_class() {
        let (result, _) = run_source("let x = 1; class A extends x {}");
        assert!(matches!(result, Err(RuntimeError::TypeMismatch { .. })));
    }
}
