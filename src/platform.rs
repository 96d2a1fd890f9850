/*
 * The native menu facade. The portable core describes menu items as plain
 * descriptors and talks to the platform exclusively through these traits,
 * which keeps the synchronization logic testable with a recording fake and
 * confines the unsafe Win32 calls to one module.
 */

use std::rc::Rc;

use crate::error::Result;
use crate::menu_owner_draw::MenuSharedMetrics;
use crate::theme::MenuTheme;

/// An opaque native menu handle (`HMENU` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeMenuHandle(pub isize);

/// Everything the backend needs to know to create or update one native
/// menu item. Built fresh from the action on every synchronization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MenuItemDescriptor {
    /// Native command ID; zero for separators.
    pub id: u16,
    /// Display text, including any appended accelerator column. Empty for
    /// separators and owner-drawn items.
    pub text: String,
    pub enabled: bool,
    pub checked: bool,
    /// Checked items render as a radio bullet instead of a checkmark.
    pub exclusive: bool,
    pub separator: bool,
    /// Measurement and painting are delegated back to the toolkit.
    pub owner_drawn: bool,
    /// Forces the native menu to discard its cached item size so the next
    /// display re-measures.
    pub invalidate_size: bool,
    pub has_image: bool,
    /// Native handle of the submenu this item opens, if any.
    pub submenu: Option<NativeMenuHandle>,
}

/// One native menu. Item indices are positions among *visible* items only;
/// the portable side performs the translation.
pub trait MenuBackend {
    fn native_handle(&self) -> NativeMenuHandle;

    fn insert_item(&self, index: u32, desc: &MenuItemDescriptor) -> Result<()>;

    fn remove_item(&self, index: u32) -> Result<()>;

    fn update_item(&self, index: u32, desc: &MenuItemDescriptor) -> Result<()>;

    /// Marks the item at `index` as the menu's default (bold) item, or
    /// clears the default when `index` is `None`.
    fn set_default_item(&self, index: Option<u32>) -> Result<()>;

    /// Checks the item at `index` as a radio item within the run
    /// `first..=last`, unchecking the others.
    fn check_radio_item(&self, first: u32, last: u32, index: u32) -> Result<()>;

    /// Destroys the native menu. Called at most once, on disposal.
    fn destroy(&self);
}

/// Creates native menus. One instance is shared by all menus of a UI
/// context.
pub trait MenuPlatform {
    fn create_popup_menu(&self) -> Result<Box<dyn MenuBackend>>;

    fn create_menu_bar(&self) -> Result<Box<dyn MenuBackend>>;
}

/// The window a menu is attached to, as seen from the menu subsystem. The
/// embedding toolkit implements this on its window type.
pub trait MenuHost {
    /// Current pixel density of the window's monitor.
    fn dpi(&self) -> i32;

    /// The menu theme appropriate for this window.
    fn menu_theme(&self) -> Result<Rc<dyn MenuTheme>>;

    /// Theme metrics shared by all menus of this window, measured at the
    /// window's base DPI. `None` disables owner-draw for its menus.
    fn menu_shared_metrics(&self) -> Option<Rc<MenuSharedMetrics>>;

    /// Requests a redraw of the window's menu bar after its structure
    /// changed. The default is a no-op for windows without a menu bar.
    fn redraw_menu_bar(&self) {}
}
