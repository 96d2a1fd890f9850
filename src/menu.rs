/*
 * Menus: ordered collections of actions mirrored into a native menu. The
 * menu is the observer of its action list and the changed-handler of every
 * visible member action, translating structural and attribute changes into
 * backend calls as they happen.
 *
 * All indices handed to the backend are positions among visible items only;
 * hidden actions have no native counterpart.
 */

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::warn;

use crate::action::{Action, ActionChangedHandler};
use crate::action_list::{ActionList, ActionListObserver};
use crate::context::UiContext;
use crate::error::{Error, Result};
use crate::event::{Event, EventPublisher};
use crate::menu_owner_draw::{MenuSharedMetrics, MenuSpecificMetrics};
use crate::platform::{MenuBackend, MenuHost, MenuItemDescriptor, NativeMenuHandle};
use crate::types::DEFAULT_SCREEN_DPI;

pub struct Menu {
    context: Rc<UiContext>,
    weak_self: Weak<Menu>,
    backend: RefCell<Option<Box<dyn MenuBackend>>>,
    actions: ActionList,
    window: RefCell<Option<Rc<dyn MenuHost>>>,
    is_menu_bar: bool,
    init_popup: EventPublisher,
    per_menu_metrics: Rc<MenuSpecificMetrics>,
    allow_owner_draw_invalidation: Cell<bool>,
}

impl Menu {
    /// Creates a popup menu, usable as a context menu or a submenu.
    pub fn new_popup(context: &Rc<UiContext>) -> Result<Rc<Self>> {
        let backend = context.platform().create_popup_menu()?;
        Ok(Self::with_backend(context, backend, false, None))
    }

    /// Creates a menu bar attached to `window`.
    pub fn new_menu_bar(context: &Rc<UiContext>, window: Rc<dyn MenuHost>) -> Result<Rc<Self>> {
        let backend = context.platform().create_menu_bar()?;
        Ok(Self::with_backend(context, backend, true, Some(window)))
    }

    fn with_backend(
        context: &Rc<UiContext>,
        backend: Box<dyn MenuBackend>,
        is_menu_bar: bool,
        window: Option<Rc<dyn MenuHost>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Menu>| {
            let observer: Weak<dyn ActionListObserver> = weak.clone();
            Self {
                context: Rc::clone(context),
                weak_self: weak.clone(),
                backend: RefCell::new(Some(backend)),
                actions: ActionList::new(observer),
                window: RefCell::new(window),
                is_menu_bar,
                init_popup: EventPublisher::new(),
                per_menu_metrics: Rc::new(MenuSpecificMetrics::new()),
                allow_owner_draw_invalidation: Cell::new(false),
            }
        })
    }

    pub fn context(&self) -> &Rc<UiContext> {
        &self.context
    }

    pub fn actions(&self) -> &ActionList {
        &self.actions
    }

    /// Raised when the menu is about to be displayed as a popup. Handlers
    /// may still mutate the menu's actions; the native state is rebuilt
    /// afterwards.
    pub fn init_popup(&self) -> Event {
        self.init_popup.event()
    }

    /// The native handle, or `None` once disposed.
    pub fn native_handle(&self) -> Option<NativeMenuHandle> {
        self.backend.borrow().as_ref().map(|b| b.native_handle())
    }

    pub fn is_disposed(&self) -> bool {
        self.backend.borrow().is_none()
    }

    /// Clears the actions and destroys the native menu. Idempotent.
    pub fn dispose(&self) {
        if let Err(err) = self.actions.clear() {
            warn!("clearing actions during menu disposal: {err}");
        }

        if let Some(backend) = self.backend.borrow_mut().take() {
            backend.destroy();
        }
    }

    fn with_backend_ref<R>(&self, f: impl FnOnce(&dyn MenuBackend) -> Result<R>) -> Result<R> {
        let backend = self.backend.borrow();
        match backend.as_deref() {
            Some(backend) => f(backend),
            None => Err(Error::InvalidHandle("menu already disposed".into())),
        }
    }

    /// Called by the embedding toolkit when the menu is about to be shown
    /// as a popup for `window`: publishes `init_popup`, then re-measures and
    /// re-synchronizes every item at the window's current DPI.
    pub fn handle_init_popup(self: &Rc<Self>, window: &Rc<dyn MenuHost>) {
        self.allow_owner_draw_invalidation.set(true);
        self.init_popup.publish();
        self.per_menu_metrics.reset();
        self.update_items_for_window(window);
        self.allow_owner_draw_invalidation.set(false);
    }

    fn resolve_dpi(&self) -> i32 {
        self.window
            .borrow()
            .as_ref()
            .map(|w| w.dpi())
            .unwrap_or(DEFAULT_SCREEN_DPI)
    }

    fn update_items_for_window(self: &Rc<Self>, window: &Rc<dyn MenuHost>) {
        // Popup menus have no permanent window; associate transiently so
        // nested lookups resolve, and restore afterwards.
        let had_window = self.window.borrow().is_some();
        if !had_window {
            *self.window.borrow_mut() = Some(Rc::clone(window));
        }

        let mut snapshot = Vec::new();
        self.actions.for_each(|a| {
            snapshot.push(Rc::clone(a));
            true
        });

        let mut need_accel_space = false;
        let mut num_owner_draw = 0usize;
        let mut sm: Option<Rc<MenuSharedMetrics>> = None;

        for action in &snapshot {
            need_accel_space = need_accel_space || !action.shortcut().is_empty();

            if let Some(odi) = action.owner_draw_info() {
                if num_owner_draw == 0 {
                    // First owner-drawn item; fetch the window's shared
                    // metrics, adapted to the current pixel density.
                    sm = window.menu_shared_metrics().map(|m| {
                        self.context
                            .metrics_cache()
                            .instance_for_dpi(&m, self.resolve_dpi())
                    });
                }
                odi.set_metrics(sm.clone(), Some(Rc::clone(&self.per_menu_metrics)));
                num_owner_draw += 1;
                let _ = self.on_action_changed(action);
            } else if action.image().is_some() {
                let _ = self.on_action_changed(action);
            } else if let Some(submenu) = action.menu() {
                submenu.update_items_for_window(window);
            }
        }

        if num_owner_draw > 0 && (need_accel_space || num_owner_draw < snapshot.len()) {
            // Any remaining non-owner-drawn items would render without
            // theming next to the owner-drawn ones; upgrade them to the
            // default handler. With accelerators present, every item's
            // shortcut text feeds the shared accelerator column.
            let theme = window.menu_theme().ok();

            for action in &snapshot {
                if !action.is_owner_draw() {
                    action.install_default_owner_draw();
                    if let Some(odi) = action.owner_draw_info() {
                        odi.set_metrics(sm.clone(), Some(Rc::clone(&self.per_menu_metrics)));
                    }
                    let _ = self.on_action_changed(action);
                }

                if need_accel_space
                    && let Some(theme) = &theme
                {
                    self.per_menu_metrics
                        .measure_accel_text_extent(theme.as_ref(), action);
                }
            }
        }

        if !had_window {
            *self.window.borrow_mut() = None;
        }
    }

    fn descriptor_for_action(&self, action: &Rc<Action>) -> MenuItemDescriptor {
        let owner_drawn = action.is_owner_draw();
        let separator = !owner_drawn && action.is_separator();

        let text = if owner_drawn || separator {
            String::new()
        } else {
            let shortcut = action.shortcut();
            if shortcut.is_empty() {
                action.text()
            } else {
                format!("{}\t{}", action.text(), shortcut)
            }
        };

        MenuItemDescriptor {
            id: action.id().unwrap_or(0),
            text,
            enabled: action.enabled(),
            checked: action.checked(),
            exclusive: action.exclusive(),
            separator,
            owner_drawn,
            invalidate_size: owner_drawn && self.allow_owner_draw_invalidation.get(),
            has_image: action.image().is_some(),
            submenu: action.menu().and_then(|m| m.native_handle()),
        }
    }

    fn handle_default_state(&self, action: &Rc<Action>) {
        if !action.is_default() {
            return;
        }

        // Unset other default actions first; the native menu allows only
        // one default item.
        let _ = self.with_backend_ref(|b| b.set_default_item(None));

        self.actions.for_each(|other| {
            if !Rc::ptr_eq(other, action) {
                let _ = other.set_default(false);
            }
            true
        });
    }

    fn sync_action_changed(self: &Rc<Self>, action: &Rc<Action>) -> Result<()> {
        self.handle_default_state(action);

        if !action.visible() {
            return Ok(());
        }

        let index = self
            .actions
            .index_in_observer(action)
            .ok_or(Error::ActionNotFound)? as u32;

        let desc = self.descriptor_for_action(action);
        self.with_backend_ref(|b| b.update_item(index, &desc))?;

        if action.is_default() {
            let _ = self.with_backend_ref(|b| b.set_default_item(Some(index)));
        }

        if action.checked() && action.exclusive() {
            let (first, last, index) = self.actions.positions_for_exclusive_check(action)?;
            self.with_backend_ref(|b| b.check_radio_item(first, last, index))?;
        }

        Ok(())
    }

    fn insert_native(self: &Rc<Self>, action: &Rc<Action>, visible_changed: bool) -> Result<()> {
        self.handle_default_state(action);

        if !visible_changed {
            let weak: Weak<dyn ActionChangedHandler> = self.weak_self.clone();
            action.add_changed_handler(weak);
        }

        let result = self.insert_native_inner(action);

        if result.is_err() && !visible_changed {
            let weak: Weak<dyn ActionChangedHandler> = self.weak_self.clone();
            action.remove_changed_handler(&weak);
        }

        result
    }

    fn insert_native_inner(self: &Rc<Self>, action: &Rc<Action>) -> Result<()> {
        if !action.visible() {
            return Ok(());
        }

        let index = self
            .actions
            .index_in_observer(action)
            .ok_or(Error::ActionNotFound)? as u32;

        let desc = self.descriptor_for_action(action);
        self.with_backend_ref(|b| b.insert_item(index, &desc))?;

        if action.is_default() {
            let _ = self.with_backend_ref(|b| b.set_default_item(Some(index)));
        }

        // A submenu inherits the window association of its parent.
        if let Some(submenu) = action.menu() {
            *submenu.window.borrow_mut() = self.window.borrow().clone();
        }

        self.ensure_menu_bar_redrawn();

        Ok(())
    }

    fn remove_native(self: &Rc<Self>, action: &Rc<Action>, visible_changed: bool) -> Result<()> {
        let index = self
            .actions
            .index_in_observer(action)
            .ok_or(Error::ActionNotFound)? as u32;

        self.with_backend_ref(|b| b.remove_item(index))?;

        if !visible_changed {
            let weak: Weak<dyn ActionChangedHandler> = self.weak_self.clone();
            action.remove_changed_handler(&weak);
        }

        self.ensure_menu_bar_redrawn();

        Ok(())
    }

    fn ensure_menu_bar_redrawn(&self) {
        if !self.is_menu_bar {
            return;
        }
        if let Some(window) = &*self.window.borrow() {
            window.redraw_menu_bar();
        }
    }

    /// Matches a typed character against the mnemonics of the menu's
    /// visible owner-drawn items; returns the native index of the item to
    /// execute.
    pub fn on_mnemonic(&self, ch: char) -> Option<u32> {
        let target = ch.to_uppercase().next().unwrap_or(ch);

        let mut index = 0u32;
        let mut found = None;
        self.actions.for_each_visible(|action| {
            if let Some(odi) = action.owner_draw_info()
                && odi.mnemonic() == Some(target)
            {
                found = Some(index);
                return false;
            }
            index += 1;
            true
        });

        found
    }
}

impl ActionChangedHandler for Menu {
    fn on_action_changed(&self, action: &Rc<Action>) -> Result<()> {
        let Some(menu) = self.weak_self.upgrade() else {
            return Ok(());
        };

        let result = menu.sync_action_changed(action);
        // The menu bar redraw happens even when synchronization failed.
        menu.ensure_menu_bar_redrawn();
        result
    }

    fn on_action_visible_changed(&self, action: &Rc<Action>) -> Result<()> {
        let Some(menu) = self.weak_self.upgrade() else {
            return Ok(());
        };

        let result = if action.visible() {
            menu.insert_native(action, true)
        } else {
            menu.remove_native(action, true)
        };

        if !action.is_separator() {
            let _ = menu.actions.update_separator_visibility();
        }

        result
    }
}

impl ActionListObserver for Menu {
    fn on_inserted_action(&self, action: &Rc<Action>) -> Result<()> {
        let Some(menu) = self.weak_self.upgrade() else {
            return Ok(());
        };
        menu.insert_native(action, false)
    }

    fn on_removing_action(&self, action: &Rc<Action>) -> Result<()> {
        let Some(menu) = self.weak_self.upgrade() else {
            return Ok(());
        };
        menu.remove_native(action, false)
    }

    fn on_clearing_actions(&self) -> Result<()> {
        for i in (0..self.actions.len()).rev() {
            if let Some(action) = self.actions.at(i)
                && action.visible()
            {
                self.on_removing_action(&action)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BackendCall, FakeHost, RecordingPlatform};
    use crate::types::{Key, Modifiers, Shortcut};

    fn recording_setup() -> (Rc<UiContext>, Rc<RecordingPlatform>) {
        let platform = RecordingPlatform::new();
        let ctx = UiContext::new(Rc::clone(&platform) as Rc<dyn crate::platform::MenuPlatform>);
        (ctx, platform)
    }

    fn named(ctx: &Rc<UiContext>, text: &str) -> Rc<Action> {
        let a = Action::new(ctx).unwrap();
        a.set_text(text).unwrap();
        a
    }

    #[test]
    fn inserting_actions_mirrors_them_into_the_backend() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        menu.actions().add(named(&ctx, "Open")).unwrap();
        menu.actions().add(named(&ctx, "Save")).unwrap();

        let calls = platform.calls();
        assert!(matches!(&calls[0], BackendCall::Insert(0, d) if d.text == "Open"));
        assert!(matches!(&calls[1], BackendCall::Insert(1, d) if d.text == "Save"));
    }

    #[test]
    fn hidden_actions_have_no_native_counterpart() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let hidden = named(&ctx, "Hidden");
        hidden.set_visible(false).unwrap();
        menu.actions().add(hidden).unwrap();
        menu.actions().add(named(&ctx, "Shown")).unwrap();

        let calls = platform.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], BackendCall::Insert(0, d) if d.text == "Shown"));
    }

    #[test]
    fn attribute_changes_update_the_item_in_place() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();
        let action = named(&ctx, "Open");
        menu.actions().add(Rc::clone(&action)).unwrap();
        platform.clear_calls();

        action.set_text("Open File").unwrap();
        action.set_enabled(false).unwrap();

        let calls = platform.calls();
        assert!(matches!(&calls[0], BackendCall::Update(0, d) if d.text == "Open File" && d.enabled));
        assert!(matches!(&calls[1], BackendCall::Update(0, d) if !d.enabled));
    }

    #[test]
    fn shortcut_text_is_appended_to_the_item_text() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();
        let action = named(&ctx, "Save");
        menu.actions().add(Rc::clone(&action)).unwrap();
        platform.clear_calls();

        action
            .set_shortcut(Shortcut::new(Modifiers::CONTROL, Key::char('s')))
            .unwrap();

        let calls = platform.calls();
        assert!(matches!(&calls[0], BackendCall::Update(0, d) if d.text == "Save\tCtrl+S"));
    }

    #[test]
    fn toggling_visibility_inserts_and_removes_at_translated_indices() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let a = named(&ctx, "A");
        let b = named(&ctx, "B");
        let c = named(&ctx, "C");
        for action in [&a, &b, &c] {
            menu.actions().add(Rc::clone(action)).unwrap();
        }
        platform.clear_calls();

        b.set_visible(false).unwrap();
        assert!(matches!(platform.calls()[0], BackendCall::Remove(1)));
        assert_eq!(menu.actions().len(), 3);

        platform.clear_calls();
        b.set_visible(true).unwrap();
        assert!(matches!(&platform.calls()[0], BackendCall::Insert(1, d) if d.text == "B"));
    }

    #[test]
    fn action_inserted_while_hidden_syncs_once_shown() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let action = named(&ctx, "Late");
        action.set_visible(false).unwrap();
        menu.actions().add(Rc::clone(&action)).unwrap();
        assert!(platform.calls().is_empty());

        action.set_visible(true).unwrap();
        assert!(matches!(&platform.calls()[0], BackendCall::Insert(0, d) if d.text == "Late"));

        platform.clear_calls();
        action.set_text("Later").unwrap();
        assert!(matches!(&platform.calls()[0], BackendCall::Update(0, d) if d.text == "Later"));
    }

    #[test]
    fn default_action_unsets_other_defaults() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let a = named(&ctx, "A");
        let b = named(&ctx, "B");
        menu.actions().add(Rc::clone(&a)).unwrap();
        menu.actions().add(Rc::clone(&b)).unwrap();

        a.set_default(true).unwrap();
        assert!(a.is_default());

        b.set_default(true).unwrap();
        assert!(!a.is_default());
        assert!(b.is_default());

        let calls = platform.calls();
        assert!(calls.contains(&BackendCall::SetDefault(Some(1))));
        assert!(calls.contains(&BackendCall::SetDefault(None)));
    }

    #[test]
    fn checking_an_exclusive_action_checks_the_radio_run() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let plain = named(&ctx, "Plain");
        let r1 = named(&ctx, "R1");
        let r2 = named(&ctx, "R2");
        for r in [&r1, &r2] {
            r.set_checkable(true).unwrap();
            r.set_exclusive(true).unwrap();
        }
        for action in [&plain, &r1, &r2] {
            menu.actions().add(Rc::clone(action)).unwrap();
        }
        platform.clear_calls();

        r2.set_checked(true).unwrap();
        assert!(platform.calls().contains(&BackendCall::CheckRadio(1, 2, 2)));
    }

    #[test]
    fn separator_visibility_syncs_through_the_backend() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let a = named(&ctx, "A");
        let sep = Action::new_separator(&ctx);
        let b = named(&ctx, "B");
        for action in [&a, &sep, &b] {
            menu.actions().add(Rc::clone(action)).unwrap();
        }
        assert!(sep.visible());
        platform.clear_calls();

        // Hiding B leaves the separator trailing, so it goes too.
        b.set_visible(false).unwrap();
        assert!(!sep.visible());
        let calls = platform.calls();
        assert!(matches!(calls[0], BackendCall::Remove(2))); // B
        assert!(matches!(calls[1], BackendCall::Remove(1))); // separator
    }

    #[test]
    fn clearing_removes_items_in_reverse_order() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();
        for text in ["A", "B", "C"] {
            menu.actions().add(named(&ctx, text)).unwrap();
        }
        platform.clear_calls();

        menu.actions().clear().unwrap();
        let calls = platform.calls();
        assert_eq!(
            calls,
            vec![
                BackendCall::Remove(2),
                BackendCall::Remove(1),
                BackendCall::Remove(0)
            ]
        );
    }

    #[test]
    fn dispose_destroys_the_backend_once() {
        let (ctx, platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();
        menu.actions().add(named(&ctx, "A")).unwrap();
        platform.clear_calls();

        menu.dispose();
        assert!(menu.is_disposed());
        assert!(menu.native_handle().is_none());
        assert!(platform.calls().contains(&BackendCall::Destroy));

        platform.clear_calls();
        menu.dispose();
        assert!(!platform.calls().contains(&BackendCall::Destroy));
    }

    #[test]
    fn releasing_a_submenu_action_disposes_the_submenu() {
        let (ctx, _platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();
        let submenu = Menu::new_popup(&ctx).unwrap();
        submenu.actions().add(named(&ctx, "Child")).unwrap();

        let action = menu.actions().add_menu(Rc::clone(&submenu)).unwrap();
        assert!(!submenu.is_disposed());

        menu.actions().remove(&action).unwrap();
        assert!(submenu.is_disposed());
        assert!(submenu.actions().is_empty());
    }

    #[test]
    fn shared_membership_keeps_the_action_alive_until_the_last_release() {
        let (ctx, _platform) = recording_setup();
        let menu_a = Menu::new_popup(&ctx).unwrap();
        let menu_b = Menu::new_popup(&ctx).unwrap();
        let action = named(&ctx, "Shared");
        let id = action.id().unwrap();

        menu_a.actions().add(Rc::clone(&action)).unwrap();
        menu_b.actions().add(Rc::clone(&action)).unwrap();

        menu_a.actions().remove(&action).unwrap();
        assert!(ctx.action_for_id(id).is_some());

        menu_b.actions().remove(&action).unwrap();
        assert!(ctx.action_for_id(id).is_none());
    }

    #[test]
    fn init_popup_upgrades_plain_items_when_any_item_is_owner_drawn() {
        let (ctx, _platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let custom = named(&ctx, "Custom");
        custom.set_owner_draw(Some(Rc::new(
            crate::menu_owner_draw::DefaultOwnerDrawHandler,
        )
            as Rc<dyn crate::action::ActionOwnerDrawHandler>));
        let plain = named(&ctx, "&Plain");
        menu.actions().add(Rc::clone(&custom)).unwrap();
        menu.actions().add(Rc::clone(&plain)).unwrap();
        assert!(!plain.is_owner_draw());

        let host = FakeHost::new(96);
        menu.handle_init_popup(&(Rc::clone(&host) as Rc<dyn MenuHost>));

        assert!(plain.is_owner_draw());
        // The upgrade makes the plain item's mnemonic dispatchable.
        assert_eq!(menu.on_mnemonic('p'), Some(1));
        assert_eq!(menu.on_mnemonic('x'), None);
    }

    #[test]
    fn init_popup_measures_the_accelerator_column() {
        let (ctx, _platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let a = named(&ctx, "Save");
        a.set_shortcut(Shortcut::new(Modifiers::CONTROL, Key::char('s')))
            .unwrap();
        a.set_owner_draw(Some(Rc::new(
            crate::menu_owner_draw::DefaultOwnerDrawHandler,
        )
            as Rc<dyn crate::action::ActionOwnerDrawHandler>));
        menu.actions().add(Rc::clone(&a)).unwrap();

        let host = FakeHost::new(96);
        let fired = Rc::new(Cell::new(false));
        {
            let fired = Rc::clone(&fired);
            menu.init_popup().attach(move || fired.set(true));
        }

        menu.handle_init_popup(&(Rc::clone(&host) as Rc<dyn MenuHost>));
        assert!(fired.get());

        // "Ctrl+S" is 6 chars at 5 px each with the fake theme.
        let theme: Rc<dyn crate::theme::MenuTheme> = host.theme();
        let odi = a.owner_draw_info().unwrap();
        let size = odi.on_measure(&theme);
        // "Save" is 20 px; the accel column adds 2 * 30.
        assert_eq!(size.cx, 51 + 60);
    }

    #[test]
    fn init_popup_adapts_shared_metrics_to_the_window_dpi() {
        let (ctx, _platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();

        let a = named(&ctx, "Open");
        a.set_owner_draw(Some(Rc::new(
            crate::menu_owner_draw::DefaultOwnerDrawHandler,
        )
            as Rc<dyn crate::action::ActionOwnerDrawHandler>));
        menu.actions().add(Rc::clone(&a)).unwrap();

        let host = FakeHost::new(144);
        menu.handle_init_popup(&(Rc::clone(&host) as Rc<dyn MenuHost>));

        // FakeHost's shared metrics are measured at 96 DPI; the popup init
        // must hand the item a 144 DPI adaptation.
        let theme: Rc<dyn crate::theme::MenuTheme> = host.theme();
        let odi = a.owner_draw_info().unwrap();
        let size = odi.on_measure(&theme);
        // At 144 DPI the fake part sizes gain one pixel: gutter is 15 and
        // the scaled content margins are (3, 3, 5, 3).
        assert_eq!(size.cx, 15 + 20 + 8 + 9 + 4);
    }

    #[test]
    fn menu_bar_changes_request_a_redraw() {
        let platform = RecordingPlatform::new();
        let ctx = UiContext::new(Rc::clone(&platform) as Rc<dyn crate::platform::MenuPlatform>);
        let host = FakeHost::new(96);
        let bar = Menu::new_menu_bar(&ctx, Rc::clone(&host) as Rc<dyn MenuHost>).unwrap();

        bar.actions().add(named(&ctx, "File")).unwrap();
        assert!(host.redraws() > 0);
    }

    #[test]
    fn disposed_menus_reject_synchronization() {
        let (ctx, _platform) = recording_setup();
        let menu = Menu::new_popup(&ctx).unwrap();
        let action = named(&ctx, "A");
        menu.actions().add(Rc::clone(&action)).unwrap();

        // Take the backend away without clearing, as a disposal race would.
        menu.backend.borrow_mut().take();

        assert!(matches!(
            action.set_text("B"),
            Err(Error::InvalidHandle(_))
        ));
        // The rollback restored the original text.
        assert_eq!(action.text(), "A");
    }
}
