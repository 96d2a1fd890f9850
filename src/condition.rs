/*
 * Boolean conditions used to drive action attributes (enabled, visible,
 * checked, default). A condition exposes its current value and a change
 * event; the mutable variant additionally accepts writes, which lets an
 * action route attribute mutations through the bound condition instead of
 * rejecting them.
 */

use std::cell::Cell;
use std::rc::Rc;

use crate::error::Result;
use crate::event::{Event, EventPublisher};

/// An observable boolean value.
pub trait Condition {
    /// The current value of the condition.
    fn satisfied(&self) -> bool;

    /// Raised after the value changes.
    fn changed(&self) -> Event;

    /// Returns the mutable view of this condition, when it has one. The
    /// default is read-only.
    fn as_mutable(&self) -> Option<&dyn MutableCondition> {
        None
    }
}

/// A condition whose value can also be set from outside.
pub trait MutableCondition: Condition {
    /// Sets the condition's value, raising `changed` if it actually changed.
    fn set(&self, value: bool) -> Result<()>;
}

/// The canonical in-memory `MutableCondition`: a plain boolean with a change
/// event.
pub struct BoolCondition {
    value: Cell<bool>,
    changed: EventPublisher,
}

impl BoolCondition {
    pub fn new(value: bool) -> Rc<Self> {
        Rc::new(Self {
            value: Cell::new(value),
            changed: EventPublisher::new(),
        })
    }
}

impl Condition for BoolCondition {
    fn satisfied(&self) -> bool {
        self.value.get()
    }

    fn changed(&self) -> Event {
        self.changed.event()
    }

    fn as_mutable(&self) -> Option<&dyn MutableCondition> {
        Some(self)
    }
}

impl MutableCondition for BoolCondition {
    fn set(&self, value: bool) -> Result<()> {
        if value != self.value.get() {
            self.value.set(value);
            self.changed.publish();
        }
        Ok(())
    }
}
