//! Attribute bindings: typed get/set access to a field of an owner object.
//!
//! A binding holds only a `Weak` reference to its owner. The owner stays
//! with the game; once it is dropped the binding reports itself dead and
//! the tweener stops the tween instead of keeping the owner alive.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::value::TweenValue;

/// Identity of an owner object, used to look tweens up by owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey(usize);

impl OwnerKey {
    pub fn of<T>(owner: &Rc<RefCell<T>>) -> Self {
        OwnerKey(Rc::as_ptr(owner) as *const () as usize)
    }
}

/// Outcome of writing through a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Write {
    Applied,
    /// The owner is borrowed elsewhere right now; this step is skipped.
    Busy,
    /// The owner has been dropped.
    Gone,
}

/// Typed accessor for one attribute of one owner.
pub struct Binding<V: TweenValue> {
    owner: OwnerKey,
    attribute: &'static str,
    get: Box<dyn Fn() -> Result<V, Write>>,
    set: Box<dyn Fn(V) -> Write>,
}

impl<V: TweenValue> Binding<V> {
    /// Bind `attribute` of `owner` through a getter/setter pair.
    ///
    /// ```ignore
    /// let x = Binding::new(&ball, "x", |b: &Ball| b.pos.x, |b: &mut Ball, v| b.pos.x = v);
    /// ```
    pub fn new<T, G, S>(owner: &Rc<RefCell<T>>, attribute: &'static str, get: G, set: S) -> Self
    where
        T: 'static,
        G: Fn(&T) -> V + 'static,
        S: Fn(&mut T, V) + 'static,
    {
        let read: Weak<RefCell<T>> = Rc::downgrade(owner);
        let write = read.clone();
        Self {
            owner: OwnerKey::of(owner),
            attribute,
            get: Box::new(move || {
                let Some(owner) = read.upgrade() else {
                    return Err(Write::Gone);
                };
                owner.try_borrow().map(|guard| get(&guard)).map_err(|_| Write::Busy)
            }),
            set: Box::new(move |value| {
                let Some(owner) = write.upgrade() else {
                    return Write::Gone;
                };
                owner
                    .try_borrow_mut()
                    .map(|mut guard| {
                        set(&mut guard, value);
                        Write::Applied
                    })
                    .unwrap_or(Write::Busy)
            }),
        }
    }

    /// Current attribute value, `None` if the owner is gone or mutably borrowed.
    pub fn get(&self) -> Option<V> {
        (self.get)().ok()
    }

    pub(crate) fn read(&self) -> Result<V, Write> {
        (self.get)()
    }

    pub(crate) fn set(&self, value: V) -> Write {
        (self.set)(value)
    }

    pub fn owner(&self) -> OwnerKey {
        self.owner
    }

    pub fn attribute(&self) -> &'static str {
        self.attribute
    }
}

impl<V: TweenValue> fmt::Debug for Binding<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("owner", &self.owner)
            .field("attribute", &self.attribute)
            .finish()
    }
}
