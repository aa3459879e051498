use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::error::RuntimeErrorKind;
use crate::persistent_map::PersistentMap;
use crate::token::Token;
use crate::value::Value;

/// Storage for one declaration. Shared by every environment version that
/// contains the declaration, so an assignment is seen by all of them.
#[derive(Debug)]
pub struct Binding {
    value: RefCell<Value>,
    constant: bool,
}

impl Binding {
    pub fn new(value: Value, constant: bool) -> Self {
        Self {
            value: RefCell::new(value),
            constant,
        }
    }

    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// Installs the value of a slot made by [`Environment::declare`].
    /// Ignores the constant flag.
    pub fn initialize(&self, value: Value) {
        *self.value.borrow_mut() = value;
    }
}

/// A scope frame: persistent bindings keyed by declaration token, plus the
/// enclosing frame.
///
/// Cloning is cheap and yields an independent version. A closure keeps the
/// version it captured, so later `define`s in the same frame are invisible to
/// it while `assign`s through shared slots are not.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: PersistentMap<Token, Rc<Binding>>,
    enclosing: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<Environment>) -> Self {
        Self {
            bindings: PersistentMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A fresh frame nested inside this version.
    pub fn child(&self) -> Self {
        Self::with_enclosing(Rc::new(self.clone()))
    }

    pub fn enclosing(&self) -> Option<&Rc<Environment>> {
        self.enclosing.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.enclosing.is_none()
    }

    pub fn define(&mut self, name: Token, value: Value) {
        self.bind(name, Binding::new(value, false));
    }

    pub fn define_constant(&mut self, name: Token, value: Value) {
        self.bind(name, Binding::new(value, true));
    }

    /// Binds `name` to a `nil` slot and hands the slot back.
    pub fn declare(&mut self, name: Token, constant: bool) -> Rc<Binding> {
        self.bind(name, Binding::new(Value::Nil, constant))
    }

    fn bind(&mut self, name: Token, binding: Binding) -> Rc<Binding> {
        trace!("define {} at line {}", name.lexeme, name.line);

        let slot: Rc<Binding> = Rc::new(binding);
        self.bindings = self.bindings.insert(name, Rc::clone(&slot));

        slot
    }

    /// The slot for `name` in this frame or the nearest enclosing one.
    pub fn lookup(&self, name: &Token) -> Option<&Rc<Binding>> {
        let mut frame: &Environment = self;

        loop {
            if let Some(slot) = frame.bindings.get(name) {
                return Some(slot);
            }

            frame = frame.enclosing.as_deref()?;
        }
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeErrorKind> {
        self.lookup(name)
            .map(|slot| slot.value())
            .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.lexeme.to_string()))
    }

    /// Writes through to the frame where `name` is found.
    pub fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeErrorKind> {
        let slot: &Rc<Binding> = self
            .lookup(name)
            .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.lexeme.to_string()))?;

        if slot.is_constant() {
            return Err(RuntimeErrorKind::ConstantAssignment(name.lexeme.to_string()));
        }

        *slot.value.borrow_mut() = value;

        Ok(())
    }
}
