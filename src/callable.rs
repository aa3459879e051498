//! Invocable values: user subroutines and lambdas, and native subroutines.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::expr::Lambda;
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::token::Token;
use crate::value::Value;

/// Accepted argument count range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Self { min: n, max: n }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn accepts(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{} to {}", self.min, self.max)
        }
    }
}

/// Anything that can appear on the left of `( … )`.
///
/// The interpreter checks [`Callable::arity`] before calling, so
/// implementations may assume the argument count is acceptable.
pub trait Callable: fmt::Display {
    fn name(&self) -> Option<&str>;

    fn arity(&self) -> Arity;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError>;

    /// A version of this callable in which `this` denotes `receiver`.
    fn bind(self: Rc<Self>, receiver: Rc<Object>) -> Rc<dyn Callable>;

    /// What `==` compares.
    fn identity(&self) -> Identity;
}

/// The unbound callable and, once bound, its receiver.
///
/// Two reads of `o.m` yield distinct bound callables with equal identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    origin: *const (),
    receiver: Option<*const Object>,
}

/// The method a bound function was made from, and its receiver.
struct Bound {
    method: Rc<Function>,
    receiver: Rc<Object>,
}

/// A user subroutine or lambda together with the environment it closes over.
pub struct Function {
    lambda: Rc<Lambda>,
    closure: Environment,
    name: Option<Rc<str>>,
    bound: Option<Bound>,
}

impl Function {
    pub fn new(lambda: Rc<Lambda>, closure: Environment, name: Option<Rc<str>>) -> Self {
        Self {
            lambda,
            closure,
            name,
            bound: None,
        }
    }
}

impl Callable for Function {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn arity(&self) -> Arity {
        Arity::range(self.lambda.required(), self.lambda.params.len())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _line: usize,
    ) -> Result<Value, RuntimeError> {
        interpreter.call_lambda(&self.lambda, &self.closure, arguments)
    }

    fn bind(self: Rc<Self>, receiver: Rc<Object>) -> Rc<dyn Callable> {
        debug!("Binding {} to a receiver", self);

        // Rebinding starts from the unbound method, not from the old receiver.
        let method: Rc<Function> = match self.bound.as_ref().map(|b| Rc::clone(&b.method)) {
            Some(method) => method,
            None => self,
        };

        let mut closure: Environment = method.closure.child();
        closure.define(Token::this_key(), Value::Object(Rc::clone(&receiver)));

        Rc::new(Function {
            lambda: Rc::clone(&method.lambda),
            closure,
            name: method.name.clone(),
            bound: Some(Bound { method, receiver }),
        })
    }

    fn identity(&self) -> Identity {
        match &self.bound {
            Some(bound) => Identity {
                origin: Rc::as_ptr(&bound.method) as *const (),
                receiver: Some(Rc::as_ptr(&bound.receiver)),
            },
            None => Identity {
                origin: self as *const Self as *const (),
                receiver: None,
            },
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "<subroutine {}>", name),
            None => write!(f, "<lambda>"),
        }
    }
}

/// Signature of a host-implemented subroutine.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeErrorKind>;

pub struct NativeFunction {
    name: &'static str,
    arity: Arity,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: &'static str, arity: Arity, func: NativeFn) -> Self {
        Self { name, arity, func }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> Option<&str> {
        Some(self.name)
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling native '{}' with {} arguments", self.name, arguments.len());

        (self.func)(interpreter, &arguments).map_err(|kind| kind.at(line))
    }

    // Natives never refer to `this`.
    fn bind(self: Rc<Self>, _receiver: Rc<Object>) -> Rc<dyn Callable> {
        self
    }

    fn identity(&self) -> Identity {
        Identity {
            origin: self as *const Self as *const (),
            receiver: None,
        }
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native {}>", self.name)
    }
}
