/*
 * Provides the public entry point for the menuduct crate, an action-driven
 * menu subsystem for Win32 UI toolkits. Commands are modeled as `Action`s
 * that menus observe and mirror into native menus, with owner-drawn theming
 * and DPI-aware metric caching layered on top.
 *
 * The native side is reached exclusively through the `platform` and `theme`
 * facades. Conditional compilation keeps the whole portable core available
 * on every platform so the synchronization, layout, and lifecycle logic can
 * compile and test without a Win32 backend; only `platform_win32` is
 * Windows-specific.
 */
pub mod action;
pub mod action_list;
pub mod condition;
pub mod context;
pub mod dpi_cache;
pub mod error;
pub mod event;
pub mod idalloc;
pub mod menu;
pub mod menu_owner_draw;
pub mod platform;
#[cfg(target_os = "windows")]
pub mod platform_win32;
pub mod proceed_event;
#[cfg(test)]
pub(crate) mod test_support;
pub mod theme;
pub mod types;

pub use action::{Action, ActionOwnerDrawHandler};
pub use action_list::ActionList;
pub use condition::{BoolCondition, Condition, MutableCondition};
pub use context::UiContext;
pub use dpi_cache::{DpiCache, DpiCopy};
pub use error::{Error, Result};
pub use event::{Event, EventHandle, EventPublisher, GenericEvent, GenericEventPublisher};
pub use menu::Menu;
pub use menu_owner_draw::{
    DefaultOwnerDrawHandler, MenuItemDrawContext, MenuItemMeasureContext, MenuSharedMetrics,
    OwnerDrawnMenuItemInfo,
};
pub use platform::{MenuBackend, MenuHost, MenuItemDescriptor, MenuPlatform, NativeMenuHandle};
#[cfg(target_os = "windows")]
pub use platform_win32::win32_platform;
pub use proceed_event::{
    ProceedEvent, ProceedEventPublisher, ProceedWithArgEvent, ProceedWithArgEventPublisher,
};
pub use theme::{BufferedPaint, FontKind, MenuCanvas, MenuPart, MenuTheme, TextFlags, ThemeSizeMetric};
pub use types::{Image, Key, Margins, Modifiers, Rect, Shortcut, Size};
