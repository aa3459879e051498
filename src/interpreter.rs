//! Tree-walking evaluator.
//!
//! Locals are reached through the resolution table filled in by the
//! [`Resolver`](crate::resolver::Resolver): each use token maps to the token of
//! the declaration it denotes, and that declaration token is the key in the
//! environment chain. Uses with no resolution are globals, looked up by name
//! when they execute, so subroutines may refer to globals declared after them.

use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info, trace, warn};
use rustc_hash::FxHashMap;

use crate::callable::{Arity, Callable, Function, NativeFn, NativeFunction};
use crate::diagnostics::Diagnostics;
use crate::environment::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind, WickError};
use crate::expr::{Expr, Lambda, LiteralValue, Prototype};
use crate::native;
use crate::object::{Object, Prototypable, Visibility};
use crate::stmt::Stmt;
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Convenient alias for evaluation results.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Interpreter limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Deepest allowed nesting of calls before `StackOverflow`.
    pub max_call_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_call_depth: 200,
        }
    }
}

/// Outcome of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Next,
    Return(Value),
}

pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    resolutions: FxHashMap<Token, Token>,
    output: Box<dyn Write>,
    options: Options,
    depth: usize,
}

impl Interpreter {
    /// An interpreter printing to stdout, with every native installed.
    pub fn new(options: Options) -> Self {
        Self::with_output(options, Box::new(io::stdout()))
    }

    pub fn with_output(options: Options, output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter with {:?}", options);

        let mut globals: Environment = Environment::new();
        native::install(&mut globals);

        Self {
            globals,
            environment: Environment::new(),
            resolutions: FxHashMap::default(),
            output,
            options,
            depth: 0,
        }
    }

    /// Where `print` writes.
    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Registers a host subroutine as a global.
    pub fn define_native(&mut self, name: &'static str, arity: Arity, func: NativeFn) {
        debug!("Defining native '{}'", name);

        self.globals.define(
            Token::global(name),
            Value::Callable(Rc::new(NativeFunction::new(name, arity, func))),
        );
    }

    /// Records that `usage` refers to the local declared at `declaration`.
    pub fn resolve(&mut self, usage: &Token, declaration: &Token) {
        trace!(
            "resolve '{}' at {}:{} -> line {}",
            usage.lexeme,
            usage.line,
            usage.column,
            declaration.line
        );

        self.resolutions.insert(usage.clone(), declaration.clone());
    }

    pub fn resolution_count(&self) -> usize {
        self.resolutions.len()
    }

    /// Executes a program. Each runtime error aborts only its top-level
    /// statement and is reported; returns how many were reported.
    pub fn interpret(&mut self, statements: &[Stmt], diagnostics: &mut dyn Diagnostics) -> usize {
        debug!("Interpreting {} statements", statements.len());

        let mut errors: usize = 0;

        for stmt in statements {
            if let Err(err) = self.execute(stmt) {
                debug!("Runtime error, resuming at next statement: {}", err);

                diagnostics.report_error(&WickError::Runtime(err));

                self.environment = Environment::new();
                self.depth = 0;
                errors += 1;
            }
        }

        if let Err(e) = self.output.flush() {
            warn!("Failed to flush interpreter output: {}", e);
        }

        info!("Interpretation finished with {} runtime errors", errors);

        errors
    }

    // ──────────────────────────── statements ──────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Next)
            }

            Stmt::Variable {
                name,
                initializer,
                constant,
            } => {
                self.declare_variable(name, initializer.as_ref(), *constant)?;

                Ok(Flow::Next)
            }

            Stmt::Scope(statements) => {
                debug!("Entering scope with {} statements", statements.len());

                let scope: Environment = self.environment.child();
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Next)
                }
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                debug!("Entering loop");

                let loop_env: Environment = self.environment.child();
                let previous: Environment = mem::replace(&mut self.environment, loop_env);

                let result = self.run_loop(
                    initializer.as_deref(),
                    condition.as_ref(),
                    increment.as_ref(),
                    body,
                );

                self.environment = previous;

                result
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                Ok(Flow::Return(value))
            }
        }
    }

    fn run_loop(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) -> EvalResult<Flow> {
        if let Some(init) = initializer {
            self.execute(init)?;
        }

        loop {
            if let Some(cond) = condition {
                if !self.evaluate(cond)?.is_truthy() {
                    break;
                }
            }

            if let Flow::Return(value) = self.execute(body)? {
                return Ok(Flow::Return(value));
            }

            if let Some(incr) = increment {
                self.evaluate(incr)?;
            }
        }

        Ok(Flow::Next)
    }

    /// Runs `statements` in `env`, restoring the current environment on every
    /// exit path.
    fn execute_block(&mut self, statements: &[Stmt], env: Environment) -> EvalResult<Flow> {
        let previous: Environment = mem::replace(&mut self.environment, env);

        let mut result: EvalResult<Flow> = Ok(Flow::Next);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Next) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;

        result
    }

    fn declare_variable(
        &mut self,
        name: &Token,
        initializer: Option<&Expr>,
        constant: bool,
    ) -> EvalResult<()> {
        debug!("Defining variable '{}'", name.lexeme);

        if !self.resolutions.contains_key(name) {
            let value: Value = self.initial_value(name, initializer)?;
            let key: Token = name.to_global();

            if constant {
                self.globals.define_constant(key, value);
            } else {
                self.globals.define(key, value);
            }

            return Ok(());
        }

        // Subroutines and prototypes see their own binding.
        if matches!(initializer, Some(Expr::Lambda(_) | Expr::Prototype(_))) {
            let slot = self.environment.declare(name.clone(), constant);
            let value: Value = self.initial_value(name, initializer)?;
            slot.initialize(value);
        } else {
            let value: Value = self.initial_value(name, initializer)?;

            if constant {
                self.environment.define_constant(name.clone(), value);
            } else {
                self.environment.define(name.clone(), value);
            }
        }

        Ok(())
    }

    fn initial_value(&mut self, name: &Token, initializer: Option<&Expr>) -> EvalResult<Value> {
        match initializer {
            Some(Expr::Lambda(lambda)) => Ok(self.make_function(lambda, &name.lexeme)),
            Some(expr) => self.evaluate(expr),
            None => Ok(Value::Nil),
        }
    }

    /// Closes `lambda` over the current environment. Declared subroutines are
    /// named after their binding, lambdas stay anonymous.
    fn make_function(&self, lambda: &Rc<Lambda>, name: &Rc<str>) -> Value {
        let name: Option<Rc<str>> = match lambda.keyword.kind {
            TokenKind::SUBROUTINE => Some(Rc::clone(name)),
            _ => None,
        };

        Value::Callable(Rc::new(Function::new(
            Rc::clone(lambda),
            self.environment.clone(),
            name,
        )))
    }

    // ──────────────────────────── expressions ─────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        trace!("Evaluating expression at line {}", expr.line());

        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::Str(Rc::clone(s)),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Group(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable(name) => self.lookup_variable(name),

            Expr::Assignment { name, value } => {
                let value: Value = self.evaluate(value)?;

                let assigned = match self.resolutions.get(name) {
                    Some(declaration) => self.environment.assign(declaration, value.clone()),
                    None => self.globals.assign(&name.to_global(), value.clone()),
                };

                assigned.map_err(|kind| kind.at(name.line))?;

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(callee, values, paren.line)
            }

            Expr::Get { object: target, name } => {
                let Value::Object(object) = self.evaluate(target)? else {
                    return Err(RuntimeErrorKind::NoProperties.at(name.line));
                };

                match object.find(&name.lexeme) {
                    Some((_, Visibility::Private)) if !is_receiver(target) => Err(
                        RuntimeErrorKind::PrivateProperty(name.lexeme.to_string()).at(name.line),
                    ),
                    Some((Value::Callable(callable), _)) => {
                        Ok(Value::Callable(callable.bind(Rc::clone(&object))))
                    }
                    Some((value, _)) => Ok(value),
                    None => Err(RuntimeErrorKind::UndefinedProperty(name.lexeme.to_string())
                        .at(name.line)),
                }
            }

            Expr::Set {
                object: target,
                name,
                value,
            } => {
                let Value::Object(object) = self.evaluate(target)? else {
                    return Err(RuntimeErrorKind::NoProperties.at(name.line));
                };

                // Writes keep the visibility of the nearest definition.
                let visibility: Visibility = match object.find(&name.lexeme) {
                    Some((_, Visibility::Private)) if !is_receiver(target) => {
                        return Err(RuntimeErrorKind::PrivateProperty(name.lexeme.to_string())
                            .at(name.line))
                    }
                    Some((_, visibility)) => visibility,
                    None => Visibility::Public,
                };

                let value: Value = self.evaluate(value)?;
                object.set_property(Rc::clone(&name.lexeme), value.clone(), visibility);

                Ok(value)
            }

            Expr::Lambda(lambda) => Ok(Value::Callable(Rc::new(Function::new(
                Rc::clone(lambda),
                self.environment.clone(),
                None,
            )))),

            Expr::Prototype(prototype) => self.evaluate_prototype(prototype),
        }
    }

    fn lookup_variable(&self, name: &Token) -> EvalResult<Value> {
        let found = if name.kind == TokenKind::THIS {
            self.environment.get(&Token::this_key())
        } else {
            match self.resolutions.get(name) {
                Some(declaration) => self.environment.get(declaration),
                None => self.globals.get(&name.to_global()),
            }
        };

        found.map_err(|kind| kind.at(name.line))
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> EvalResult<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.kind {
            TokenKind::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(RuntimeErrorKind::type_error(format!(
                    "Operand must be a number, not {}.",
                    other.type_name()
                ))
                .at(operator.line)),
            },

            TokenKind::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(RuntimeErrorKind::type_error(format!(
                "Unsupported unary operator '{}'.",
                operator.lexeme
            ))
            .at(operator.line)),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult<Value> {
        // Short-circuit: yield the deciding operand itself.
        if matches!(operator.kind, TokenKind::AND | TokenKind::OR) {
            let left: Value = self.evaluate(left)?;

            let decided: bool = match operator.kind {
                TokenKind::OR => left.is_truthy(),
                _ => !left.is_truthy(),
            };

            return if decided {
                Ok(left)
            } else {
                self.evaluate(right)
            };
        }

        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        binary_op(operator.kind, left, right).map_err(|kind| kind.at(operator.line))
    }

    fn evaluate_prototype(&mut self, prototype: &Prototype) -> EvalResult<Value> {
        let parent: Option<Rc<Object>> = match &prototype.parent {
            None => None,
            Some(expr) => match self.evaluate(expr)? {
                Value::Object(object) => Some(object),
                Value::Nil => None,
                other => {
                    return Err(RuntimeErrorKind::type_error(format!(
                        "Can only inherit from prototypes, not {}.",
                        other.type_name()
                    ))
                    .at(prototype.keyword.line))
                }
            },
        };

        let object: Rc<Object> = Rc::new(Object::new(parent));

        for member in &prototype.members {
            let value: Value = match &member.value {
                Expr::Lambda(lambda) => self.make_function(lambda, &member.name.lexeme),
                expr => self.evaluate(expr)?,
            };

            let visibility: Visibility = if member.private {
                Visibility::Private
            } else {
                Visibility::Public
            };

            object.set_property(Rc::clone(&member.name.lexeme), value, visibility);
        }

        debug!("Created prototype with {} members", prototype.members.len());

        Ok(Value::Object(object))
    }

    // ────────────────────────────── calls ─────────────────────────────────

    fn call_value(&mut self, callee: Value, arguments: Vec<Value>, line: usize) -> EvalResult<Value> {
        match callee {
            Value::Callable(callable) => self.invoke(callable.as_ref(), arguments, line),
            Value::Object(prototype) => self.construct(prototype, arguments, line),
            _ => Err(RuntimeErrorKind::NotCallable.at(line)),
        }
    }

    fn invoke(
        &mut self,
        callable: &dyn Callable,
        arguments: Vec<Value>,
        line: usize,
    ) -> EvalResult<Value> {
        let arity: Arity = callable.arity();

        if !arity.accepts(arguments.len()) {
            return Err(RuntimeErrorKind::ArityMismatch {
                expected: arity,
                got: arguments.len(),
            }
            .at(line));
        }

        if self.depth >= self.options.max_call_depth {
            return Err(RuntimeErrorKind::StackOverflow(self.options.max_call_depth).at(line));
        }

        debug!("Calling {} with {} arguments", callable, arguments.len());

        self.depth += 1;
        let result = callable.call(self, arguments, line);
        self.depth -= 1;

        result
    }

    /// Calling an object makes a new object that inherits from it and runs
    /// the `constructor` found along its chain, if any.
    fn construct(
        &mut self,
        prototype: Rc<Object>,
        arguments: Vec<Value>,
        line: usize,
    ) -> EvalResult<Value> {
        let instance: Rc<Object> = Rc::new(Object::new(Some(Rc::clone(&prototype))));

        match prototype.find("constructor").map(|(value, _)| value) {
            Some(Value::Callable(constructor)) => {
                let bound: Rc<dyn Callable> = constructor.bind(Rc::clone(&instance));
                self.invoke(bound.as_ref(), arguments, line)?;
            }

            Some(_) => return Err(RuntimeErrorKind::NotCallable.at(line)),

            None if !arguments.is_empty() => {
                return Err(RuntimeErrorKind::ArityMismatch {
                    expected: Arity::exact(0),
                    got: arguments.len(),
                }
                .at(line))
            }

            None => {}
        }

        Ok(Value::Object(instance))
    }

    /// Body of a user subroutine call: parameters are bound in a child of
    /// `closure`, missing trailing arguments take their defaults.
    pub(crate) fn call_lambda(
        &mut self,
        lambda: &Lambda,
        closure: &Environment,
        arguments: Vec<Value>,
    ) -> EvalResult<Value> {
        let mut env: Environment = closure.child();
        let mut arguments = arguments.into_iter();

        for param in &lambda.params {
            let value: Value = match (arguments.next(), &param.default) {
                (Some(value), _) => value,

                (None, Some(default)) => {
                    // Defaults see the parameters bound before them.
                    let previous: Environment = mem::replace(&mut self.environment, env);
                    let result = self.evaluate(default);
                    env = mem::replace(&mut self.environment, previous);

                    result?
                }

                (None, None) => Value::Nil,
            };

            env.define(param.name.clone(), value);
        }

        match self.execute_block(&lambda.body, env)? {
            Flow::Return(value) => Ok(value),
            Flow::Next => Ok(Value::Nil),
        }
    }
}

/// Arithmetic, comparison and equality on two evaluated operands.
/// Private properties are only reachable through `this`.
fn is_receiver(target: &Expr) -> bool {
    matches!(target, Expr::Variable(token) if token.kind == TokenKind::THIS)
}

fn binary_op(operator: TokenKind, left: Value, right: Value) -> Result<Value, RuntimeErrorKind> {
    use Value::{Number, Str};

    if let TokenKind::EQUAL_EQUAL | TokenKind::BANG_EQUAL = operator {
        let equal: bool = left == right;

        return Ok(Value::Bool(equal == (operator == TokenKind::EQUAL_EQUAL)));
    }

    if operator == TokenKind::PLUS {
        return match (left, right) {
            (Number(a), Number(b)) => Ok(Number(a + b)),
            (l @ Str(_), r) | (l, r @ Str(_)) => Ok(Str(Rc::from(format!("{}{}", l, r)))),
            (l, r) => Err(RuntimeErrorKind::type_error(format!(
                "Cannot add {} and {}.",
                l.type_name(),
                r.type_name()
            ))),
        };
    }

    let (Number(a), Number(b)) = (&left, &right) else {
        return Err(RuntimeErrorKind::type_error(format!(
            "Operands must be numbers, not {} and {}.",
            left.type_name(),
            right.type_name()
        )));
    };
    let (a, b) = (*a, *b);

    match operator {
        TokenKind::MINUS => Ok(Number(a - b)),
        TokenKind::STAR => Ok(Number(a * b)),
        TokenKind::SLASH | TokenKind::PERCENT if b == 0.0 => Err(RuntimeErrorKind::DivisionByZero),
        TokenKind::SLASH => Ok(Number(a / b)),
        TokenKind::PERCENT => Ok(Number(a % b)),
        TokenKind::GREATER => Ok(Value::Bool(a > b)),
        TokenKind::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
        TokenKind::LESS => Ok(Value::Bool(a < b)),
        TokenKind::LESS_EQUAL => Ok(Value::Bool(a <= b)),
        other => Err(RuntimeErrorKind::type_error(format!(
            "Unsupported binary operator {}.",
            other.name()
        ))),
    }
}
