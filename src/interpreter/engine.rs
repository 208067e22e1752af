//! Evaluation engine
//!
//! [`Evaluator`] walks the AST with one exhaustive `match` over
//! [`NodeKind`]. Every node goes through [`Evaluator::visit`], which is the
//! single instrumentation point: it reports entry and exit to the attached
//! [`Tracer`], enforces the step ceiling, and polls for cancellation.
//!
//! # Control flow
//!
//! Statements produce a [`Flow`]. `return`, `break` and `continue` travel
//! upward as `Flow` variants until the function call or loop that handles
//! them; runtime errors travel as `Err` through `?` and are never caught.

use crate::interpreter::builtins::Builtin;
use crate::interpreter::constants::GLOBAL_SCOPE_ID;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::limits::Limits;
use crate::memory::environment::{Env, Environment, ScopeError, ScopeId};
use crate::memory::value::{Closure, Value};
use crate::parser::ast::*;
use crate::snapshot::Console;
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;

/// How a statement or expression finished
#[derive(Debug, Clone)]
pub(crate) enum Flow {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

impl Flow {
    pub(crate) fn into_value(self) -> Value {
        match self {
            Flow::Normal(value) | Flow::Return(value) => value,
            Flow::Break | Flow::Continue => Value::Null,
        }
    }
}

/// Observer of every node visit
///
/// `after` receives `Err` exactly once per pass, for the innermost node
/// that was being evaluated when the first error occurred; the nodes the
/// error unwinds through get no `after` call.
pub trait Tracer {
    /// Where print-family builtins write
    fn console(&mut self) -> &mut dyn Console;

    fn before(&mut self, node: NodeInfo, env: &Env, depth: usize);

    fn after(
        &mut self,
        node: NodeInfo,
        env: &Env,
        depth: usize,
        result: Result<&Value, &RuntimeError>,
    );
}

/// Tracer that only forwards console output
pub struct Untraced<'c> {
    console: &'c mut dyn Console,
}

impl<'c> Untraced<'c> {
    pub fn new(console: &'c mut dyn Console) -> Self {
        Untraced { console }
    }
}

impl Tracer for Untraced<'_> {
    fn console(&mut self) -> &mut dyn Console {
        self.console
    }

    fn before(&mut self, _node: NodeInfo, _env: &Env, _depth: usize) {}

    fn after(
        &mut self,
        _node: NodeInfo,
        _env: &Env,
        _depth: usize,
        _result: Result<&Value, &RuntimeError>,
    ) {
    }
}

/// Tree-walking evaluator for one pass over one program
pub struct Evaluator<'t> {
    tracer: &'t mut dyn Tracer,
    pub(crate) limits: Limits,
    globals: Env,
    next_scope: ScopeId,
    pub(crate) call_depth: usize,
    /// Loops enclosing the current point, reset to zero inside each call
    pub(crate) loop_depth: usize,
    visits: usize,
    error_recorded: bool,
}

impl<'t> Evaluator<'t> {
    pub fn new(tracer: &'t mut dyn Tracer, limits: Limits) -> Self {
        Evaluator {
            tracer,
            limits,
            globals: Environment::new_shared(GLOBAL_SCOPE_ID, None),
            next_scope: GLOBAL_SCOPE_ID,
            call_depth: 0,
            loop_depth: 0,
            visits: 0,
            error_recorded: false,
        }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// Number of nodes visited so far
    pub fn visits(&self) -> usize {
        self.visits
    }

    /// Run every top-level statement; the result is the last statement's value
    pub fn eval_program(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        tracing::debug!(statements = program.statements.len(), "evaluating program");
        let env = self.globals.clone();
        let flow = self.traced(program.info(), &env, |this| {
            this.eval_statements(&program.statements, &env)
        })?;
        Ok(flow.into_value())
    }

    pub(crate) fn console(&mut self) -> &mut dyn Console {
        self.tracer.console()
    }

    // ===== Instrumentation =====

    /// Evaluate `node` in `env`, reporting entry and exit to the tracer
    pub(crate) fn visit(&mut self, node: &AstNode, env: &Env) -> Result<Flow, RuntimeError> {
        ensure_sufficient_stack(|| self.traced(node.info(), env, |this| this.dispatch(node, env)))
    }

    /// Evaluate an expression node to its value
    pub(crate) fn eval_expr(&mut self, node: &AstNode, env: &Env) -> Result<Value, RuntimeError> {
        Ok(self.visit(node, env)?.into_value())
    }

    pub(crate) fn traced<F>(&mut self, info: NodeInfo, env: &Env, run: F) -> Result<Flow, RuntimeError>
    where
        F: FnOnce(&mut Self) -> Result<Flow, RuntimeError>,
    {
        let depth = self.call_depth;
        self.tracer.before(info, env, depth);

        let result = match self.check_budget(info) {
            Ok(()) => run(self),
            Err(err) => Err(err),
        };

        match &result {
            Ok(Flow::Normal(value)) | Ok(Flow::Return(value)) => {
                self.tracer.after(info, env, depth, Ok(value))
            }
            Ok(_) => self.tracer.after(info, env, depth, Ok(&Value::Null)),
            Err(err) => {
                if !self.error_recorded {
                    self.error_recorded = true;
                    tracing::debug!(node = info.kind, error = %err, "runtime error");
                    self.tracer.after(info, env, depth, Err(err));
                }
            }
        }
        result
    }

    fn check_budget(&mut self, info: NodeInfo) -> Result<(), RuntimeError> {
        self.visits += 1;
        if self.limits.is_cancelled() {
            return Err(RuntimeError::Cancelled {
                location: info.span.start,
            });
        }
        if self.visits > self.limits.max_steps {
            return Err(RuntimeError::StepLimit {
                limit: self.limits.max_steps,
                location: info.span.start,
            });
        }
        Ok(())
    }

    // ===== Dispatch =====

    fn dispatch(&mut self, node: &AstNode, env: &Env) -> Result<Flow, RuntimeError> {
        let location = node.span.start;
        let value = match &node.kind {
            NodeKind::Identifier(name) => self.lookup(env, name, location)?,
            NodeKind::Integer(n) => Value::Integer(*n),
            NodeKind::Float(x) => Value::Float(*x),
            NodeKind::Str(s) => Value::string(s),
            NodeKind::Boolean(b) => Value::Boolean(*b),
            NodeKind::Null => Value::Null,
            NodeKind::Template(parts) => self.eval_template(parts, env)?,
            NodeKind::Array(items) => self.eval_array(items, env)?,
            NodeKind::Hash(pairs) => self.eval_hash(pairs, env)?,
            NodeKind::Prefix { op, operand } => {
                let operand = self.eval_expr(operand, env)?;
                self.apply_prefix(*op, operand, location)?
            }
            NodeKind::Infix { op, left, right } => {
                let left = self.eval_expr(left, env)?;
                let right = self.eval_expr(right, env)?;
                self.apply_infix(*op, left, right, location)?
            }
            NodeKind::Logical { op, left, right } => self.eval_logical(*op, left, right, env)?,
            NodeKind::Assign { target, value } => self.eval_assign(target, value, env, location)?,
            NodeKind::CompoundAssign { op, target, value } => {
                self.eval_compound_assign(*op, target, value, env, location)?
            }
            NodeKind::Call { callee, args } => self.eval_call(callee, args, env, location)?,
            NodeKind::Index { target, index } => {
                let target = self.eval_expr(target, env)?;
                let index = self.eval_expr(index, env)?;
                self.index_value(&target, &index, location)?
            }
            NodeKind::Property { object, name } => self.eval_property(object, name, env, location)?,
            NodeKind::Function(decl) => self.make_closure(decl, env),
            NodeKind::This => self.resolve_this(env, location)?,
            NodeKind::Super => self.resolve_super(env, location)?,
            NodeKind::New { class, args } => self.eval_new(class, args, env, location)?,
            NodeKind::Let { name, value } => self.eval_let(name, value.as_deref(), env, location)?,
            NodeKind::Const { name, value } => self.eval_const(name, value, env, location)?,
            NodeKind::Return(value) => return self.eval_return(value.as_deref(), env),
            NodeKind::Break => return self.eval_break(location),
            NodeKind::Continue => return self.eval_continue(location),
            NodeKind::Expression(expr) => self.eval_expr(expr, env)?,
            NodeKind::Block(statements) => {
                let scope = self.child_scope(env);
                return self.eval_statements(statements, &scope);
            }
            NodeKind::If {
                condition,
                consequence,
                alternative,
            } => return self.eval_if(condition, consequence, alternative.as_deref(), env),
            NodeKind::While { condition, body } => {
                return self.eval_while(condition, body, env, location)
            }
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => {
                return self.eval_for(
                    init.as_deref(),
                    condition.as_deref(),
                    update.as_deref(),
                    body,
                    env,
                    location,
                )
            }
            NodeKind::FunctionDecl(decl) => self.eval_function_decl(decl, env, location)?,
            NodeKind::Class(decl) => self.eval_class_decl(decl, env, location)?,
        };
        Ok(Flow::Normal(value))
    }

    /// Run statements in order, stopping at the first non-normal flow
    pub(crate) fn eval_statements(&mut self, statements: &[AstNode], env: &Env) -> Result<Flow, RuntimeError> {
        let mut last = Value::Null;
        for stmt in statements {
            match self.visit(stmt, env)? {
                Flow::Normal(value) => last = value,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(last))
    }

    // ===== Scopes =====

    pub(crate) fn child_scope(&mut self, outer: &Env) -> Env {
        self.next_scope += 1;
        Environment::new_shared(self.next_scope, Some(outer.clone()))
    }

    /// Scope with no enclosing scope, used for instance fields
    pub(crate) fn detached_scope(&mut self) -> Env {
        self.next_scope += 1;
        Environment::new_shared(self.next_scope, None)
    }

    pub(crate) fn declare(
        &mut self,
        env: &Env,
        name: &str,
        value: Value,
        constant: bool,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        env.borrow_mut()
            .define(name, value, constant)
            .map_err(|err| scope_error(err, location))
    }

    /// Resolve a name through the scope chain, then the builtins
    pub(crate) fn lookup(&self, env: &Env, name: &str, location: SourceLocation) -> Result<Value, RuntimeError> {
        if let Some(value) = env.borrow().get(name) {
            return Ok(value);
        }
        Builtin::lookup(name)
            .map(Value::Builtin)
            .ok_or_else(|| RuntimeError::UnknownIdentifier {
                name: name.to_string(),
                location,
            })
    }

    // ===== Calls =====

    pub(crate) fn make_closure(&self, decl: &Rc<FunctionDecl>, env: &Env) -> Value {
        Value::Function(Rc::new(Closure {
            decl: decl.clone(),
            env: env.clone(),
        }))
    }

    pub(crate) fn eval_args(&mut self, args: &[AstNode], env: &Env) -> Result<Vec<Value>, RuntimeError> {
        args.iter().map(|arg| self.eval_expr(arg, env)).collect()
    }

    fn eval_call(
        &mut self,
        callee: &AstNode,
        args: &[AstNode],
        env: &Env,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let function = self.eval_expr(callee, env)?;
        let args = self.eval_args(args, env)?;

        // `super(args)` runs the parent constructor on the current instance
        if let (NodeKind::Super, Value::Class(parent)) = (&callee.kind, &function) {
            let this = self.resolve_this(env, location)?;
            self.run_constructor(parent, this, args, location)?;
            return Ok(Value::Null);
        }

        self.call_value(function, args, location)
    }

    /// Apply any callable value to already-evaluated arguments
    pub(crate) fn call_value(
        &mut self,
        function: Value,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match function {
            Value::Function(closure) => self.call_closure(&closure, args, location),
            Value::Builtin(builtin) => self.call_builtin(builtin, args, location),
            other => Err(RuntimeError::NotCallable {
                type_name: other.type_name(),
                location,
            }),
        }
    }

    /// One child scope of the closure's scope per call; parameters bind positionally
    pub(crate) fn call_closure(
        &mut self,
        closure: &Rc<Closure>,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let decl = closure.decl.clone();
        if args.len() != decl.params.len() {
            return Err(RuntimeError::ArityMismatch {
                function: closure.name().to_string(),
                expected: decl.params.len(),
                got: args.len(),
                location,
            });
        }
        if self.call_depth >= self.limits.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.limits.max_call_depth,
                location,
            });
        }

        let scope = self.child_scope(&closure.env);
        for (param, arg) in decl.params.iter().zip(args) {
            self.declare(&scope, param, arg, false, location)?;
        }

        self.call_depth += 1;
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = &decl.body;
        let result = match &body.kind {
            // The body runs directly in the call scope
            NodeKind::Block(statements) => {
                self.traced(body.info(), &scope, |this| this.eval_statements(statements, &scope))
            }
            _ => self.visit(body, &scope),
        };
        self.loop_depth = saved_loops;
        self.call_depth -= 1;

        match result? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Null),
        }
    }
}

/// Attach a location to a scope failure
pub(crate) fn scope_error(err: ScopeError, location: SourceLocation) -> RuntimeError {
    match err {
        ScopeError::AlreadyDeclared(name) => RuntimeError::Redeclaration { name, location },
        ScopeError::Undefined(name) => RuntimeError::UnknownIdentifier { name, location },
        ScopeError::Constant(name) => RuntimeError::ConstantAssignment { name, location },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::snapshot::ConsoleLog;

    fn eval_with(source: &str, limits: Limits) -> (Result<Value, RuntimeError>, Vec<String>) {
        let program = match parser::parse(source) {
            Ok(program) => program,
            Err(errors) => panic!("parse errors: {:?}", errors),
        };
        let mut console = ConsoleLog::new();
        let result = {
            let mut tracer = Untraced::new(&mut console);
            Evaluator::new(&mut tracer, limits).eval_program(&program)
        };
        (result, console.texts())
    }

    fn eval(source: &str) -> Value {
        match eval_with(source, Limits::default()).0 {
            Ok(value) => value,
            Err(err) => panic!("runtime error: {}", err),
        }
    }

    fn eval_err(source: &str) -> RuntimeError {
        match eval_with(source, Limits::default()).0 {
            Ok(value) => panic!("Expected error, got {}", value),
            Err(err) => err,
        }
    }

    fn output(source: &str) -> Vec<String> {
        eval_with(source, Limits::default()).1
    }

    #[test]
    fn test_program_value_is_last_statement() {
        assert_eq!(eval("1; 2; 3 * 4;").to_string(), "12");
        assert!(matches!(eval("let x = 1;"), Value::Null));
    }

    #[test]
    fn test_let_then_assign() {
        assert_eq!(eval("let x = 5; x = 6; x;").to_string(), "6");
    }

    #[test]
    fn test_const_assignment_fails() {
        match eval_err("const x = 5; x = 6;") {
            RuntimeError::ConstantAssignment { name, .. } => assert_eq!(name, "x"),
            other => panic!("Expected constant assignment error, got {:?}", other),
        }
    }

    #[test]
    fn test_redeclaration_fails() {
        assert!(matches!(
            eval_err("let x = 1; let x = 2;"),
            RuntimeError::Redeclaration { .. }
        ));
        // Shadowing in a nested block is fine
        assert_eq!(eval("let x = 1; { let x = 2; } x;").to_string(), "1");
    }

    #[test]
    fn test_recursive_fib() {
        let source = "let fib = fn(n) { if (n < 2) { return n; } return fib(n-1) + fib(n-2); }; fib(10);";
        assert_eq!(eval(source).to_string(), "55");
    }

    #[test]
    fn test_closures_capture_defining_scope() {
        let source = "
            fn counter() {
                let count = 0;
                return fn() { count += 1; return count; };
            }
            let next = counter();
            next(); next();
            next();
        ";
        assert_eq!(eval(source).to_string(), "3");
    }

    #[test]
    fn test_falling_off_function_yields_null() {
        assert!(matches!(eval("fn f() { 1; } f();"), Value::Null));
    }

    #[test]
    fn test_arity_mismatch() {
        assert!(matches!(
            eval_err("fn f(a, b) { return a; } f(1);"),
            RuntimeError::ArityMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_identifier() {
        match eval_err("let y = missing + 1;") {
            RuntimeError::UnknownIdentifier { name, location } => {
                assert_eq!(name, "missing");
                assert_eq!(location, SourceLocation::new(1, 9));
            }
            other => panic!("Expected unknown identifier, got {:?}", other),
        }
    }

    #[test]
    fn test_not_callable() {
        assert!(matches!(
            eval_err("let x = 3; x();"),
            RuntimeError::NotCallable {
                type_name: "integer",
                ..
            }
        ));
    }

    #[test]
    fn test_call_depth_ceiling() {
        let limits = Limits::default().with_max_call_depth(20);
        let (result, _) = eval_with("fn down(n) { return down(n + 1); } down(0);", limits);
        assert!(matches!(
            result,
            Err(RuntimeError::CallDepthExceeded { limit: 20, .. })
        ));
    }

    #[test]
    fn test_step_ceiling() {
        let limits = Limits::default().with_max_steps(10);
        let (result, _) = eval_with("let a = 1; let b = 2; let c = a + b + a + b;", limits);
        assert!(matches!(result, Err(RuntimeError::StepLimit { limit: 10, .. })));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = crate::interpreter::limits::CancelToken::new();
        token.cancel();
        let (result, _) = eval_with("1;", Limits::default().with_cancel(token));
        assert!(matches!(result, Err(RuntimeError::Cancelled { .. })));
    }

    #[test]
    fn test_print_goes_to_console() {
        assert_eq!(
            output("print(\"a\", 1, 2.5); info(true); error(null); success([1, \"x\"]);"),
            vec!["a 1 2.5", "true", "null", "[1, \"x\"]"]
        );
    }

    #[test]
    fn test_top_level_return_stops_program() {
        assert_eq!(eval("let a = 1; return a + 1; a = 10;").to_string(), "2");
    }
}
