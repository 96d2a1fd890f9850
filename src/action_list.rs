/*
 * An ordered collection of actions, as held by a menu (or any other action
 * container). The list owns membership refcounts and notifies a single
 * observer about structural changes; the observer (the menu) mirrors them
 * into native state and can veto an insertion by failing.
 *
 * The list also implements the two order-dependent behaviors of the
 * subsystem: automatic separator visibility (no leading, trailing or
 * doubled-up separators among the visible items) and the discovery of
 * contiguous exclusive runs for radio checking.
 */

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::action::Action;
use crate::error::{Error, Result};

/// Receives structural change notifications from an `ActionList`.
pub(crate) trait ActionListObserver {
    fn on_inserted_action(&self, action: &Rc<Action>) -> Result<()>;

    fn on_removing_action(&self, action: &Rc<Action>) -> Result<()>;

    fn on_clearing_actions(&self) -> Result<()>;
}

/// The actions of one menu, in display order.
pub struct ActionList {
    actions: RefCell<Vec<Rc<Action>>>,
    observer: Weak<dyn ActionListObserver>,
}

impl ActionList {
    pub(crate) fn new(observer: Weak<dyn ActionListObserver>) -> Self {
        Self {
            actions: RefCell::new(Vec::new()),
            observer,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.borrow().is_empty()
    }

    pub fn at(&self, index: usize) -> Option<Rc<Action>> {
        self.actions.borrow().get(index).cloned()
    }

    pub fn index(&self, action: &Rc<Action>) -> Option<usize> {
        self.actions
            .borrow()
            .iter()
            .position(|a| Rc::ptr_eq(a, action))
    }

    pub fn contains(&self, action: &Rc<Action>) -> bool {
        self.index(action).is_some()
    }

    /// Appends `action` to the list.
    pub fn add(&self, action: Rc<Action>) -> Result<()> {
        let len = self.len();
        self.insert(len, action)
    }

    /// Inserts `action` at `index`. On observer failure the list is left
    /// unchanged.
    ///
    /// The observer is notified even for hidden actions; it needs to start
    /// observing them so a later visibility change can reach the native
    /// menu.
    pub fn insert(&self, index: usize, action: Rc<Action>) -> Result<()> {
        self.actions.borrow_mut().insert(index, Rc::clone(&action));

        if let Some(observer) = self.observer.upgrade()
            && let Err(err) = observer.on_inserted_action(&action)
        {
            self.actions.borrow_mut().remove(index);
            return Err(err);
        }

        action.add_ref();

        if action.visible() {
            self.update_separator_visibility()?;
        }
        Ok(())
    }

    /// Removes the action at `index`, releasing its list membership.
    pub fn remove_at(&self, index: usize) -> Result<()> {
        let action = self
            .actions
            .borrow()
            .get(index)
            .cloned()
            .ok_or(Error::ActionNotFound)?;

        if action.visible()
            && let Some(observer) = self.observer.upgrade()
        {
            observer.on_removing_action(&action)?;
        }

        action.release();
        self.actions.borrow_mut().remove(index);

        if action.visible() {
            self.update_separator_visibility()?;
        }
        Ok(())
    }

    /// Removes the first occurrence of `action` from the list.
    pub fn remove(&self, action: &Rc<Action>) -> Result<()> {
        let index = self.index(action).ok_or(Error::ActionNotFound)?;
        self.remove_at(index)
    }

    /// Removes all actions, releasing each membership.
    pub fn clear(&self) -> Result<()> {
        if let Some(observer) = self.observer.upgrade() {
            observer.on_clearing_actions()?;
        }

        let actions = std::mem::take(&mut *self.actions.borrow_mut());
        for action in &actions {
            action.release();
        }
        Ok(())
    }

    /// Convenience: creates an action that opens `menu`, appends it and
    /// returns it.
    pub fn add_menu(&self, menu: Rc<crate::menu::Menu>) -> Result<Rc<Action>> {
        let len = self.len();
        self.insert_menu(len, menu)
    }

    pub fn insert_menu(&self, index: usize, menu: Rc<crate::menu::Menu>) -> Result<Rc<Action>> {
        let context = Rc::clone(menu.context());
        let action = Action::new_with_menu(&context, menu)?;
        self.insert(index, Rc::clone(&action))?;
        Ok(action)
    }

    /// Calls `f` for each action, stopping early when `f` returns false.
    pub fn for_each(&self, mut f: impl FnMut(&Rc<Action>) -> bool) {
        let snapshot = self.actions.borrow().clone();
        for action in &snapshot {
            if !f(action) {
                break;
            }
        }
    }

    /// Calls `f` for each visible action, stopping early when `f` returns
    /// false.
    pub fn for_each_visible(&self, mut f: impl FnMut(&Rc<Action>) -> bool) {
        self.for_each(|a| if a.visible() { f(a) } else { true });
    }

    pub fn has_visible(&self) -> bool {
        self.actions.borrow().iter().any(|a| a.visible())
    }

    /// Translates the list position of `action` to its position among the
    /// visible items only, which is the index space the native menu uses.
    /// Returns `None` when the action is not in the list.
    pub(crate) fn index_in_observer(&self, action: &Rc<Action>) -> Option<usize> {
        let actions = self.actions.borrow();
        let mut visible_index = 0;
        for a in actions.iter() {
            if Rc::ptr_eq(a, action) {
                return Some(visible_index);
            }
            if a.visible() {
                visible_index += 1;
            }
        }
        None
    }

    /// For a checked exclusive `action`, finds the native positions of the
    /// contiguous run of exclusive siblings it belongs to. Returns
    /// `(first, last, index)` in visible-item positions.
    pub(crate) fn positions_for_exclusive_check(
        &self,
        action: &Rc<Action>,
    ) -> Result<(u32, u32, u32)> {
        let actions = self.actions.borrow();

        let mut actions_index = None;
        let mut index = 0u32;
        for (i, a) in actions.iter().enumerate() {
            if Rc::ptr_eq(a, action) {
                actions_index = Some(i);
                break;
            }
            if a.visible() {
                index += 1;
            }
        }
        let actions_index = actions_index.ok_or(Error::ActionNotFound)?;

        let mut first = index;
        for a in actions[..actions_index].iter().rev() {
            if !a.exclusive() {
                break;
            }
            if a.visible() {
                first -= 1;
            }
        }

        let mut last = index;
        for a in actions[actions_index + 1..].iter() {
            if !a.exclusive() {
                break;
            }
            if a.visible() {
                last += 1;
            }
        }

        Ok((first, last, index))
    }

    /// Re-evaluates separator visibility over the whole list: a separator is
    /// visible only when it has a visible non-separator item before it and
    /// another one after it, and runs of separators collapse to one.
    pub(crate) fn update_separator_visibility(&self) -> Result<()> {
        let snapshot = self.actions.borrow().clone();

        let mut has_current_visible_action = false;
        let mut current_visible_separator: Option<Rc<Action>> = None;

        for action in &snapshot {
            if action.is_separator() {
                let visible = has_current_visible_action;
                if action.visible() != visible {
                    action.set_visible(visible)?;
                }
                if action.visible() {
                    current_visible_separator = Some(Rc::clone(action));
                }
                has_current_visible_action = false;
            } else if action.visible() {
                has_current_visible_action = true;
            }
        }

        // A separator with nothing visible after it gets hidden as well.
        if !has_current_visible_action
            && let Some(sep) = current_visible_separator
        {
            sep.set_visible(false)?;
        }

        Ok(())
    }
}
