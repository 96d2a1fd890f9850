/*
 * The command abstraction at the heart of the menu subsystem. An action owns
 * the user-visible attributes of a command (text, image, shortcut, enabled,
 * visible, checked and friends); menus observe actions through the
 * `ActionChangedHandler` seam and mirror every change into their native
 * counterparts.
 *
 * Attribute mutations follow a strict protocol: no change, no notification;
 * on notification failure the attribute rolls back and a compensating
 * notification is raised, so observers always converge on the stored value.
 *
 * Attributes can alternatively be driven by a `Condition`. While a condition
 * is bound it is the sole source of truth: direct writes to enabled/visible
 * are rejected, and writes to checked/default are routed through the
 * condition when it is mutable.
 */

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::condition::Condition;
use crate::context::UiContext;
use crate::error::{Error, Result};
use crate::event::{Event, EventHandle, EventPublisher};
use crate::menu::Menu;
use crate::menu_owner_draw::{
    DefaultOwnerDrawHandler, MenuItemDrawContext, MenuItemMeasureContext, OwnerDrawnMenuItemInfo,
};
use crate::types::{Image, Shortcut, Size};

/// Observes one action; implemented by menus (and the owner-draw item info)
/// to keep native state in sync.
pub(crate) trait ActionChangedHandler {
    fn on_action_changed(&self, action: &Rc<Action>) -> Result<()>;

    fn on_action_visible_changed(&self, action: &Rc<Action>) -> Result<()>;
}

/// Custom measurement and painting for one action's menu item. Implemented
/// by applications that want full control over item rendering.
pub trait ActionOwnerDrawHandler {
    /// Reports the size of the item's content area.
    fn on_measure(&self, action: &Rc<Action>, mctx: &MenuItemMeasureContext) -> Size;

    /// Paints the item's content area.
    fn on_draw(&self, action: &Rc<Action>, dctx: &mut MenuItemDrawContext<'_>);
}

struct ConditionBinding {
    condition: Rc<dyn Condition>,
    changed_handle: EventHandle,
}

impl ConditionBinding {
    fn detach(&self) {
        self.condition.changed().detach(self.changed_handle);
    }
}

/// A command that can appear in menus. Created through a `UiContext`, which
/// assigns it a unique native command ID.
pub struct Action {
    context: Rc<UiContext>,
    id: Option<u16>,
    menu: RefCell<Option<Rc<Menu>>>,
    triggered: EventPublisher,
    changed_handlers: RefCell<Vec<Weak<dyn ActionChangedHandler>>>,

    text: RefCell<String>,
    tool_tip: RefCell<String>,
    image: RefCell<Option<Rc<dyn Image>>>,
    shortcut: Cell<Shortcut>,
    enabled: Cell<bool>,
    visible: Cell<bool>,
    checkable: Cell<bool>,
    checked: Cell<bool>,
    default: Cell<bool>,
    exclusive: Cell<bool>,

    ref_count: Cell<usize>,
    owner_draw_info: RefCell<Option<Rc<OwnerDrawnMenuItemInfo>>>,

    checked_condition: RefCell<Option<ConditionBinding>>,
    default_condition: RefCell<Option<ConditionBinding>>,
    enabled_condition: RefCell<Option<ConditionBinding>>,
    visible_condition: RefCell<Option<ConditionBinding>>,
}

impl Action {
    pub fn new(context: &Rc<UiContext>) -> Result<Rc<Self>> {
        let id = context.alloc_action_id()?;
        let action = Rc::new(Self::raw(context, Some(id)));
        context.register_action(id, &action);
        Ok(action)
    }

    /// Creates an action that opens `menu` as a submenu.
    pub fn new_with_menu(context: &Rc<UiContext>, menu: Rc<Menu>) -> Result<Rc<Self>> {
        let action = Self::new(context)?;
        *action.menu.borrow_mut() = Some(menu);
        Ok(action)
    }

    /// Creates a separator. Separators have no command ID and never trigger.
    pub fn new_separator(context: &Rc<UiContext>) -> Rc<Self> {
        Rc::new(Self::raw(context, None))
    }

    fn raw(context: &Rc<UiContext>, id: Option<u16>) -> Self {
        Self {
            context: Rc::clone(context),
            id,
            menu: RefCell::new(None),
            triggered: EventPublisher::new(),
            changed_handlers: RefCell::new(Vec::new()),
            text: RefCell::new(String::new()),
            tool_tip: RefCell::new(String::new()),
            image: RefCell::new(None),
            shortcut: Cell::new(Shortcut::none()),
            enabled: Cell::new(true),
            visible: Cell::new(true),
            checkable: Cell::new(false),
            checked: Cell::new(false),
            default: Cell::new(false),
            exclusive: Cell::new(false),
            ref_count: Cell::new(0),
            owner_draw_info: RefCell::new(None),
            checked_condition: RefCell::new(None),
            default_condition: RefCell::new(None),
            enabled_condition: RefCell::new(None),
            visible_condition: RefCell::new(None),
        }
    }

    pub fn context(&self) -> &Rc<UiContext> {
        &self.context
    }

    /// The native command ID, or `None` for separators.
    pub fn id(&self) -> Option<u16> {
        self.id
    }

    pub fn menu(&self) -> Option<Rc<Menu>> {
        self.menu.borrow().clone()
    }

    pub fn is_separator(&self) -> bool {
        self.id.is_none() || *self.text.borrow() == "-"
    }

    /// Raised when the action is invoked, whether through a menu, a
    /// shortcut, or programmatically.
    pub fn triggered(&self) -> Event {
        self.triggered.event()
    }

    /// Invokes the action: toggles the checked state for checkable actions,
    /// then raises `triggered`.
    pub fn raise_triggered(self: &Rc<Self>) {
        if self.checkable.get() {
            let _ = self.set_checked(!self.checked.get());
        }
        self.triggered.publish();
    }

    pub(crate) fn add_ref(&self) {
        self.ref_count.set(self.ref_count.get() + 1);
    }

    /// Drops one list membership. When the last membership goes away the
    /// action tears down its registrations, conditions, submenu and
    /// owner-draw state.
    pub(crate) fn release(self: &Rc<Self>) {
        self.ref_count.set(self.ref_count.get() - 1);
        if self.ref_count.get() > 0 {
            return;
        }

        self.set_checked_condition(None);
        self.set_default_condition(None);
        self.set_enabled_condition(None);
        self.set_visible_condition(None);

        let menu = self.menu.borrow().clone();
        if let Some(menu) = menu {
            let _ = menu.actions().clear();
            menu.dispose();
        }

        if let Some(odi) = self.owner_draw_info.borrow_mut().take() {
            odi.dispose();
        }

        if let Some(id) = self.id {
            self.context.unregister_action(id);
            self.context.free_action_id(id);
        }

        let shortcut = self.shortcut.get();
        if !shortcut.is_empty() {
            self.context.remove_shortcut(shortcut);
        }
    }

    pub(crate) fn add_changed_handler(&self, handler: Weak<dyn ActionChangedHandler>) {
        self.changed_handlers.borrow_mut().push(handler);
    }

    pub(crate) fn remove_changed_handler(&self, handler: &Weak<dyn ActionChangedHandler>) {
        let mut handlers = self.changed_handlers.borrow_mut();
        if let Some(i) = handlers
            .iter()
            .position(|h| std::ptr::addr_eq(h.as_ptr(), handler.as_ptr()))
        {
            handlers.remove(i);
        }
    }

    fn raise_changed(self: &Rc<Self>) -> Result<()> {
        let handlers = self.changed_handlers.borrow().clone();
        for handler in handlers {
            if let Some(handler) = handler.upgrade() {
                handler.on_action_changed(self)?;
            }
        }
        Ok(())
    }

    fn raise_visible_changed(self: &Rc<Self>) -> Result<()> {
        let handlers = self.changed_handlers.borrow().clone();
        for handler in handlers {
            if let Some(handler) = handler.upgrade() {
                handler.on_action_visible_changed(self)?;
            }
        }
        Ok(())
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn set_text(self: &Rc<Self>, value: &str) -> Result<()> {
        if value == *self.text.borrow() {
            return Ok(());
        }

        let old = self.text.replace(value.to_string());
        if let Err(err) = self.raise_changed() {
            *self.text.borrow_mut() = old;
            let _ = self.raise_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn tool_tip(&self) -> String {
        self.tool_tip.borrow().clone()
    }

    pub fn set_tool_tip(self: &Rc<Self>, value: &str) -> Result<()> {
        if value == *self.tool_tip.borrow() {
            return Ok(());
        }

        let old = self.tool_tip.replace(value.to_string());
        if let Err(err) = self.raise_changed() {
            *self.tool_tip.borrow_mut() = old;
            let _ = self.raise_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn image(&self) -> Option<Rc<dyn Image>> {
        self.image.borrow().clone()
    }

    pub fn set_image(self: &Rc<Self>, value: Option<Rc<dyn Image>>) -> Result<()> {
        {
            let cur = self.image.borrow();
            let same = match (&*cur, &value) {
                (None, None) => true,
                (Some(a), Some(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
                _ => false,
            };
            if same {
                return Ok(());
            }
        }

        let old = self.image.replace(value);
        if let Err(err) = self.raise_changed() {
            *self.image.borrow_mut() = old;
            let _ = self.raise_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn shortcut(&self) -> Shortcut {
        self.shortcut.get()
    }

    /// Sets the keyboard shortcut and updates the context's shortcut table.
    /// When two live actions claim the same shortcut, the one registered
    /// last wins.
    pub fn set_shortcut(self: &Rc<Self>, value: Shortcut) -> Result<()> {
        let old = self.shortcut.get();
        if value == old {
            return Ok(());
        }

        self.shortcut.set(value);
        if let Err(err) = self.raise_changed() {
            self.shortcut.set(old);
            let _ = self.raise_changed();
            return Err(err);
        }

        if value.is_empty() {
            self.context.remove_shortcut(old);
        } else {
            self.context.register_shortcut(value, self);
        }
        Ok(())
    }

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(self: &Rc<Self>, value: bool) -> Result<()> {
        if self.enabled_condition.borrow().is_some() {
            return Err(Error::ConditionBound("enabled"));
        }
        if value == self.enabled.get() {
            return Ok(());
        }

        self.enabled.set(value);
        if let Err(err) = self.raise_changed() {
            self.enabled.set(!value);
            let _ = self.raise_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn visible(&self) -> bool {
        self.visible.get()
    }

    pub fn set_visible(self: &Rc<Self>, value: bool) -> Result<()> {
        if self.visible_condition.borrow().is_some() {
            return Err(Error::ConditionBound("visible"));
        }
        if value == self.visible.get() {
            return Ok(());
        }

        self.visible.set(value);
        if let Err(err) = self.raise_visible_changed() {
            self.visible.set(!value);
            let _ = self.raise_visible_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn checkable(&self) -> bool {
        self.checkable.get()
    }

    pub fn set_checkable(self: &Rc<Self>, value: bool) -> Result<()> {
        if value == self.checkable.get() {
            return Ok(());
        }

        self.checkable.set(value);
        if let Err(err) = self.raise_changed() {
            self.checkable.set(!value);
            let _ = self.raise_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn checked(&self) -> bool {
        self.checked.get()
    }

    /// Sets the checked state. With a checked condition bound, the write is
    /// routed through the condition, which in turn updates the action.
    pub fn set_checked(self: &Rc<Self>, value: bool) -> Result<()> {
        if let Some(binding) = &*self.checked_condition.borrow() {
            return match binding.condition.as_mutable() {
                Some(mutable) => mutable.set(value),
                None => Err(Error::ConditionNotMutable),
            };
        }

        if value == self.checked.get() {
            return Ok(());
        }

        self.checked.set(value);
        if let Err(err) = self.raise_changed() {
            self.checked.set(!value);
            let _ = self.raise_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn is_default(&self) -> bool {
        self.default.get()
    }

    /// Marks the action as its menu's default (bold) item. With a default
    /// condition bound, the write is routed through the condition.
    pub fn set_default(self: &Rc<Self>, value: bool) -> Result<()> {
        if let Some(binding) = &*self.default_condition.borrow() {
            return match binding.condition.as_mutable() {
                Some(mutable) => mutable.set(value),
                None => Err(Error::ConditionNotMutable),
            };
        }

        if value == self.default.get() {
            return Ok(());
        }

        self.default.set(value);
        if let Err(err) = self.raise_changed() {
            self.default.set(!value);
            let _ = self.raise_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn exclusive(&self) -> bool {
        self.exclusive.get()
    }

    /// Marks the action as part of a radio run: checking it unchecks the
    /// adjacent exclusive siblings in its list.
    pub fn set_exclusive(self: &Rc<Self>, value: bool) -> Result<()> {
        if value == self.exclusive.get() {
            return Ok(());
        }

        self.exclusive.set(value);
        if let Err(err) = self.raise_changed() {
            self.exclusive.set(!value);
            let _ = self.raise_changed();
            return Err(err);
        }
        Ok(())
    }

    pub fn checked_condition(&self) -> Option<Rc<dyn Condition>> {
        self.checked_condition
            .borrow()
            .as_ref()
            .map(|b| Rc::clone(&b.condition))
    }

    pub fn set_checked_condition(self: &Rc<Self>, condition: Option<Rc<dyn Condition>>) {
        if let Some(old) = self.checked_condition.borrow_mut().take() {
            old.detach();
        }

        if let Some(condition) = condition {
            self.checked.set(condition.satisfied());

            let weak = Rc::downgrade(self);
            let handle = condition.changed().attach(move || {
                let Some(action) = weak.upgrade() else {
                    return;
                };
                let satisfied = match &*action.checked_condition.borrow() {
                    Some(binding) => binding.condition.satisfied(),
                    None => return,
                };
                if action.checked.get() != satisfied {
                    action.checked.set(satisfied);
                    let _ = action.raise_changed();
                }
            });

            *self.checked_condition.borrow_mut() = Some(ConditionBinding {
                condition,
                changed_handle: handle,
            });
        }

        let _ = self.raise_changed();
    }

    pub fn default_condition(&self) -> Option<Rc<dyn Condition>> {
        self.default_condition
            .borrow()
            .as_ref()
            .map(|b| Rc::clone(&b.condition))
    }

    pub fn set_default_condition(self: &Rc<Self>, condition: Option<Rc<dyn Condition>>) {
        if let Some(old) = self.default_condition.borrow_mut().take() {
            old.detach();
        }

        if let Some(condition) = condition {
            self.default.set(condition.satisfied());

            let weak = Rc::downgrade(self);
            let handle = condition.changed().attach(move || {
                let Some(action) = weak.upgrade() else {
                    return;
                };
                let satisfied = match &*action.default_condition.borrow() {
                    Some(binding) => binding.condition.satisfied(),
                    None => return,
                };
                if action.default.get() != satisfied {
                    action.default.set(satisfied);
                    let _ = action.raise_changed();
                }
            });

            *self.default_condition.borrow_mut() = Some(ConditionBinding {
                condition,
                changed_handle: handle,
            });
        }

        let _ = self.raise_changed();
    }

    pub fn enabled_condition(&self) -> Option<Rc<dyn Condition>> {
        self.enabled_condition
            .borrow()
            .as_ref()
            .map(|b| Rc::clone(&b.condition))
    }

    pub fn set_enabled_condition(self: &Rc<Self>, condition: Option<Rc<dyn Condition>>) {
        if let Some(old) = self.enabled_condition.borrow_mut().take() {
            old.detach();
        }

        if let Some(condition) = condition {
            self.enabled.set(condition.satisfied());

            let weak = Rc::downgrade(self);
            let handle = condition.changed().attach(move || {
                let Some(action) = weak.upgrade() else {
                    return;
                };
                let satisfied = match &*action.enabled_condition.borrow() {
                    Some(binding) => binding.condition.satisfied(),
                    None => return,
                };
                if action.enabled.get() != satisfied {
                    action.enabled.set(satisfied);
                    let _ = action.raise_changed();
                }
            });

            *self.enabled_condition.borrow_mut() = Some(ConditionBinding {
                condition,
                changed_handle: handle,
            });
        }

        let _ = self.raise_changed();
    }

    pub fn visible_condition(&self) -> Option<Rc<dyn Condition>> {
        self.visible_condition
            .borrow()
            .as_ref()
            .map(|b| Rc::clone(&b.condition))
    }

    pub fn set_visible_condition(self: &Rc<Self>, condition: Option<Rc<dyn Condition>>) {
        if let Some(old) = self.visible_condition.borrow_mut().take() {
            old.detach();
        }

        if let Some(condition) = condition {
            self.visible.set(condition.satisfied());

            let weak = Rc::downgrade(self);
            let handle = condition.changed().attach(move || {
                let Some(action) = weak.upgrade() else {
                    return;
                };
                let satisfied = match &*action.visible_condition.borrow() {
                    Some(binding) => binding.condition.satisfied(),
                    None => return,
                };
                if action.visible.get() != satisfied {
                    action.visible.set(satisfied);
                    let _ = action.raise_visible_changed();
                }
            });

            *self.visible_condition.borrow_mut() = Some(ConditionBinding {
                condition,
                changed_handle: handle,
            });
        }

        let _ = self.raise_changed();
    }

    pub fn is_owner_draw(&self) -> bool {
        self.owner_draw_info.borrow().is_some()
    }

    pub(crate) fn owner_draw_info(&self) -> Option<Rc<OwnerDrawnMenuItemInfo>> {
        self.owner_draw_info.borrow().clone()
    }

    /// Installs or removes a custom draw handler for this action's menu
    /// items. Passing the currently installed handler again is a no-op.
    pub fn set_owner_draw(self: &Rc<Self>, handler: Option<Rc<dyn ActionOwnerDrawHandler>>) {
        {
            let cur = self.owner_draw_info.borrow();
            let same = match (&*cur, &handler) {
                (None, None) => true,
                (Some(odi), Some(h)) => odi.has_handler(h),
                _ => false,
            };
            if same {
                return;
            }
        }

        if let Some(old) = self.owner_draw_info.borrow_mut().take() {
            old.dispose();
        }

        if let Some(handler) = handler {
            let odi = OwnerDrawnMenuItemInfo::new(self, handler);
            *self.owner_draw_info.borrow_mut() = Some(odi);
        }
    }

    /// Upgrades the action to the built-in text renderer. Used by menus
    /// when any sibling is owner-drawn, so all items measure and paint
    /// consistently.
    pub(crate) fn install_default_owner_draw(self: &Rc<Self>) {
        self.set_owner_draw(Some(Rc::new(DefaultOwnerDrawHandler) as Rc<dyn ActionOwnerDrawHandler>));
    }
}
