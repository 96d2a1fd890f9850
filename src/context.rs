/*
 * Per-UI-context registries shared by all actions and menus: the command-ID
 * allocator, the ID and shortcut lookup tables, and the DPI metrics cache.
 * Everything here used to be ambient process state in older toolkits; it is
 * an explicit object so independent UI contexts (or tests) never interfere
 * with each other.
 */

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::action::Action;
use crate::dpi_cache::DpiCache;
use crate::error::Result;
use crate::idalloc::IdAllocator;
use crate::platform::MenuPlatform;
use crate::types::Shortcut;

/// Command IDs at or below this value are reserved for standard dialog
/// commands (IDOK, IDCANCEL) and are never allocated or freed.
pub const MAX_RESERVED_ID: u16 = 2;

/// Shared state for one UI context. Actions and menus hold an `Rc` to the
/// context they were created in.
pub struct UiContext {
    action_ids: RefCell<IdAllocator>,
    actions_by_id: RefCell<HashMap<u16, Weak<Action>>>,
    shortcut_to_action: RefCell<HashMap<Shortcut, Weak<Action>>>,
    metrics_cache: DpiCache,
    platform: Rc<dyn MenuPlatform>,
}

impl UiContext {
    pub fn new(platform: Rc<dyn MenuPlatform>) -> Rc<Self> {
        let ctx = Rc::new(Self {
            action_ids: RefCell::new(IdAllocator::new(1 << 16)),
            actions_by_id: RefCell::new(HashMap::new()),
            shortcut_to_action: RefCell::new(HashMap::new()),
            metrics_cache: DpiCache::new(),
            platform,
        });

        // Burn the reserved low IDs so no action ever receives them.
        for _ in 0..=MAX_RESERVED_ID {
            let _ = ctx.action_ids.borrow_mut().allocate();
        }

        ctx
    }

    pub(crate) fn alloc_action_id(&self) -> Result<u16> {
        Ok(self.action_ids.borrow_mut().allocate()? as u16)
    }

    pub(crate) fn free_action_id(&self, id: u16) {
        if id <= MAX_RESERVED_ID {
            return;
        }
        self.action_ids.borrow_mut().free(u32::from(id));
    }

    pub(crate) fn register_action(&self, id: u16, action: &Rc<Action>) {
        self.actions_by_id
            .borrow_mut()
            .insert(id, Rc::downgrade(action));
    }

    pub(crate) fn unregister_action(&self, id: u16) {
        self.actions_by_id.borrow_mut().remove(&id);
    }

    pub(crate) fn register_shortcut(&self, shortcut: Shortcut, action: &Rc<Action>) {
        self.shortcut_to_action
            .borrow_mut()
            .insert(shortcut, Rc::downgrade(action));
    }

    pub(crate) fn remove_shortcut(&self, shortcut: Shortcut) {
        self.shortcut_to_action.borrow_mut().remove(&shortcut);
    }

    /// Looks up the live action registered under the native command `id`.
    pub fn action_for_id(&self, id: u16) -> Option<Rc<Action>> {
        self.actions_by_id.borrow().get(&id)?.upgrade()
    }

    /// Looks up the live action registered under `shortcut`.
    pub fn action_for_shortcut(&self, shortcut: Shortcut) -> Option<Rc<Action>> {
        self.shortcut_to_action.borrow().get(&shortcut)?.upgrade()
    }

    /// The shared cache of DPI-adapted menu metrics.
    pub fn metrics_cache(&self) -> &DpiCache {
        &self.metrics_cache
    }

    pub(crate) fn platform(&self) -> &Rc<dyn MenuPlatform> {
        &self.platform
    }
}
