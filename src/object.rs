//! Prototype-based objects.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::persistent_map::PersistentMap;
use crate::value::Value;

/// Who may see a property from outside the object's own subroutines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    /// Reachable only through `this`.
    Private,
}

/// Delegated property access through a prototype link.
pub trait Prototypable {
    fn own_property(&self, name: &str) -> Option<(Value, Visibility)>;

    fn set_property(&self, name: Rc<str>, value: Value, visibility: Visibility);

    fn prototype(&self) -> Option<Rc<dyn Prototypable>>;

    /// Nearest definition: own properties first, then each ancestor in turn.
    fn find(&self, name: &str) -> Option<(Value, Visibility)> {
        if let Some(found) = self.own_property(name) {
            return Some(found);
        }

        let mut current: Option<Rc<dyn Prototypable>> = self.prototype();

        while let Some(ancestor) = current {
            if let Some(found) = ancestor.own_property(name) {
                return Some(found);
            }

            current = ancestor.prototype();
        }

        None
    }

    /// Public lookup along the chain. A nearer private definition hides the name.
    fn get(&self, name: &str) -> Option<Value> {
        match self.find(name)? {
            (value, Visibility::Public) => Some(value),
            (_, Visibility::Private) => None,
        }
    }

    /// Writes a public own property, shadowing any ancestor's.
    fn set(&self, name: Rc<str>, value: Value) {
        self.set_property(name, value, Visibility::Public);
    }
}

/// A Wick object: own properties plus an optional prototype.
///
/// The prototype is fixed at creation, so chains are acyclic.
#[derive(Default)]
pub struct Object {
    properties: RefCell<PersistentMap<Rc<str>, Value>>,
    private: RefCell<PersistentMap<Rc<str>, Value>>,
    prototype: Option<Rc<Object>>,
}

impl Object {
    pub fn new(prototype: Option<Rc<Object>>) -> Self {
        Self {
            properties: RefCell::new(PersistentMap::new()),
            private: RefCell::new(PersistentMap::new()),
            prototype,
        }
    }

    /// Snapshot of the current public own properties.
    pub fn properties(&self) -> PersistentMap<Rc<str>, Value> {
        self.properties.borrow().clone()
    }

    pub fn parent(&self) -> Option<&Rc<Object>> {
        self.prototype.as_ref()
    }

    fn slot(&self, visibility: Visibility) -> &RefCell<PersistentMap<Rc<str>, Value>> {
        match visibility {
            Visibility::Public => &self.properties,
            Visibility::Private => &self.private,
        }
    }
}

impl Prototypable for Object {
    fn own_property(&self, name: &str) -> Option<(Value, Visibility)> {
        if let Some(value) = self.properties.borrow().get(name) {
            return Some((value.clone(), Visibility::Public));
        }

        self.private
            .borrow()
            .get(name)
            .map(|value| (value.clone(), Visibility::Private))
    }

    fn set_property(&self, name: Rc<str>, value: Value, visibility: Visibility) {
        let slot = self.slot(visibility);
        let next = slot.borrow().insert(name, value);

        *slot.borrow_mut() = next;
    }

    fn prototype(&self) -> Option<Rc<dyn Prototypable>> {
        self.prototype
            .as_ref()
            .map(|p| Rc::clone(p) as Rc<dyn Prototypable>)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties = self.properties();
        let mut entries: Vec<(&Rc<str>, &Value)> = properties.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        write!(f, "{{")?;

        for (i, (name, value)) in entries.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }

            // Nested objects may refer back to this one.
            match value {
                Value::Object(_) => write!(f, "{}: {{...}}", name)?,
                other => write!(f, "{}: {}", name, other)?,
            }
        }

        write!(f, "}}")
    }
}
