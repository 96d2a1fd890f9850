/*
 * The owner-draw engine for themed menu items. The engine owns everything
 * common to all items (gutters, checkboxes, margins, chevrons, selection
 * backgrounds) and delegates only the content area to the action's
 * `ActionOwnerDrawHandler`, so applications customize exactly the part
 * they care about.
 *
 * Metrics are split in two: `MenuSharedMetrics` holds theme measurements
 * shared by every menu of a window (cacheable per DPI), while
 * `MenuSpecificMetrics` holds the accelerator column width, which depends
 * on the items of one particular menu.
 */

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::action::{Action, ActionChangedHandler, ActionOwnerDrawHandler};
use crate::dpi_cache::DpiCopy;
use crate::error::Result;
use crate::theme::{part_state, FontKind, MenuCanvas, MenuPart, MenuTheme, TextFlags, ThemeSizeMetric};
use crate::types::{draw_state, Margins, Rect, Size};

/// Passed to an `ActionOwnerDrawHandler`'s measure callback.
pub struct MenuItemMeasureContext {
    pub theme: Rc<dyn MenuTheme>,
    /// The font the theme expects for this item in its current state.
    pub theme_font: FontKind,
    /// Theme-compliant spacing usable between sub-components of the content.
    pub padding: i32,
}

/// Passed to an `ActionOwnerDrawHandler`'s draw callback.
pub struct MenuItemDrawContext<'a> {
    /// The drawing action requested by the platform (`draw_action` bits).
    pub draw_action: u32,
    /// The item state reported by the platform (`draw_state` bits).
    pub state: u32,
    pub theme: Rc<dyn MenuTheme>,
    /// The popup-item state ID to pass to theme calls.
    pub theme_state: i32,
    pub canvas: &'a mut dyn MenuCanvas,
    pub theme_font: FontKind,
    /// Bounds of the content area within the canvas.
    pub bounds: Rect,
    pub padding: i32,
}

/// Theme measurements shared by all menus of one window, at one DPI.
pub struct MenuSharedMetrics {
    dpi: i32,

    check_margins: Margins,
    check_bg_margins: Margins,
    item_margins: Margins,
    content_margins: Margins,
    chevron_margins: Margins,

    check_size: Rc<dyn ThemeSizeMetric>,
    combined_check_size: Size,
    gutter_size: Size,

    chevron_size: Rc<dyn ThemeSizeMetric>,
    combined_chevron_size: Size,

    separator_size: Rc<dyn ThemeSizeMetric>,
    combined_separator_size: Size,
}

impl MenuSharedMetrics {
    /// Measures the theme at `dpi`. Metrics for other pixel densities are
    /// obtained through the context's `DpiCache`.
    pub fn new(theme: &dyn MenuTheme, dpi: i32) -> Result<Rc<Self>> {
        let separator_size = theme.part_size(MenuPart::PopupSeparator)?;
        let check_size = theme.part_size(MenuPart::PopupCheck)?;
        let chevron_size = theme.part_size(MenuPart::PopupSubmenu)?;

        let border_size = theme.border_size(MenuPart::PopupItem)?;
        let bg_border_size = theme.border_size(MenuPart::PopupBackground)?;

        let check_margins = theme.margins(MenuPart::PopupCheck)?;
        let check_bg_margins = theme.margins(MenuPart::PopupCheckBackground)?;
        let item_margins = theme.margins(MenuPart::PopupItem)?;
        let chevron_margins = theme.margins(MenuPart::PopupSubmenu)?;

        let mut content_margins = item_margins;
        content_margins.left = bg_border_size;
        content_margins.right = border_size;

        let mut sm = Self {
            dpi,
            check_margins,
            check_bg_margins,
            item_margins,
            content_margins,
            chevron_margins,
            check_size,
            combined_check_size: Size::default(),
            gutter_size: Size::default(),
            chevron_size,
            combined_chevron_size: Size::default(),
            separator_size,
            combined_separator_size: Size::default(),
        };
        sm.build_dependent_sizes();

        Ok(Rc::new(sm))
    }

    fn build_dependent_sizes(&mut self) {
        if let Ok(check_size) = self.check_size.part_size() {
            self.combined_check_size = check_size;
            self.combined_check_size.add_margins(self.check_margins);

            self.gutter_size = self.combined_check_size;
            self.gutter_size.add_margins(self.check_bg_margins);
        }

        if let Ok(chevron_size) = self.chevron_size.part_size() {
            self.combined_chevron_size = chevron_size;
            self.combined_chevron_size.add_margins(self.chevron_margins);
        }

        if let Ok(separator_size) = self.separator_size.part_size() {
            self.combined_separator_size = separator_size;
            self.combined_separator_size.add_margins(self.item_margins);
        }
    }
}

fn scale_margins(m: Margins, ratio: f64) -> Margins {
    let scale = |v: i32| (f64::from(v) * ratio).round() as i32;
    Margins::new(scale(m.left), scale(m.top), scale(m.right), scale(m.bottom))
}

impl DpiCopy for MenuSharedMetrics {
    fn copy_for_dpi(&self, dpi: i32) -> Rc<Self> {
        let ratio = f64::from(dpi) / f64::from(self.dpi);
        let mut copy = Self {
            dpi,
            // Check, check background, item and chevron margins are used as
            // measured; only the content margins scale with density. Part
            // sizes are re-queried from the theme, not scaled.
            check_margins: self.check_margins,
            check_bg_margins: self.check_bg_margins,
            item_margins: self.item_margins,
            content_margins: scale_margins(self.content_margins, ratio),
            chevron_margins: self.chevron_margins,
            check_size: self.check_size.copy_for_dpi(dpi),
            combined_check_size: Size::default(),
            gutter_size: Size::default(),
            chevron_size: self.chevron_size.copy_for_dpi(dpi),
            combined_chevron_size: Size::default(),
            separator_size: self.separator_size.copy_for_dpi(dpi),
            combined_separator_size: Size::default(),
        };
        copy.build_dependent_sizes();

        Rc::new(copy)
    }

    fn dpi(&self) -> Option<i32> {
        Some(self.dpi)
    }
}

/// Per-menu metrics: the widest accelerator text among the menu's items.
#[derive(Default)]
pub struct MenuSpecificMetrics {
    max_accel_text_extent: Cell<Size>,
}

impl MenuSpecificMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&self) {
        self.max_accel_text_extent.set(Size::default());
    }

    pub(crate) fn max_accel_text_extent(&self) -> Size {
        self.max_accel_text_extent.get()
    }

    /// Accumulates the extent of `action`'s right-justified accelerator
    /// text. Only the maximum across all items is kept.
    pub(crate) fn measure_accel_text_extent(&self, theme: &dyn MenuTheme, action: &Action) {
        let shortcut = action.shortcut();
        if shortcut.is_empty() {
            return;
        }

        let font = if action.is_default() {
            FontKind::Bold
        } else {
            FontKind::Normal
        };
        let flags = TextFlags {
            right_align: true,
            single_line: true,
            hide_prefix: false,
        };

        let Ok(extent) = theme.text_extent(font, &shortcut.to_string(), flags) else {
            return;
        };

        let cur = self.max_accel_text_extent.get();
        self.max_accel_text_extent
            .set(Size::new(cur.cx.max(extent.cx), cur.cy.max(extent.cy)));
    }
}

/// Computed bounds for the components of one owner-drawn menu item.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MenuItemLayout {
    content_size: Size,
    combined_content_size: Size,

    checkbox_rect: Rect,
    checkbox_bg_rect: Rect,
    content_rect: Rect,
    gutter_rect: Rect,
    selection_rect: Rect,
    separator_rect: Rect,
    chevron_rect: Rect,
    chevron_clip_rect: Rect,
}

impl MenuItemLayout {
    /// Positions the common item components within `rect`.
    fn layout(&mut self, sm: &MenuSharedMetrics, rect: Rect) {
        self.selection_rect = rect;

        let mut x = rect.left;
        let y = rect.top;
        let h = rect.height();

        // Gutter: from the left edge across the checkbox background,
        // full height.
        self.gutter_rect = Rect::new(x, y, x + sm.gutter_size.cx, y + h);

        // Checkbox background: leftmost, centered vertically.
        let mut offset_v_center = (h - sm.combined_check_size.cy) / 2;
        self.checkbox_bg_rect = Rect::new(
            x,
            y + offset_v_center,
            x + sm.combined_check_size.cx,
            y + sm.combined_check_size.cy + offset_v_center,
        );

        // Checkbox: drawn over its background, margins stripped.
        self.checkbox_rect = self.checkbox_bg_rect;
        self.checkbox_rect.strip_margins(sm.check_margins);

        x += self.gutter_rect.width();

        // Separator: right of the gutter to the right edge, centered
        // vertically.
        offset_v_center = (h - sm.combined_separator_size.cy) / 2;
        self.separator_rect = Rect::new(
            x,
            y + offset_v_center,
            rect.right,
            y + sm.combined_separator_size.cy + offset_v_center,
        );
        self.separator_rect.strip_margins(sm.item_margins);

        // Content: right of the gutter to the right edge, centered
        // vertically, margins stripped.
        offset_v_center = (h - self.combined_content_size.cy) / 2;
        self.content_rect = Rect::new(
            x,
            y + offset_v_center,
            rect.right,
            y + self.combined_content_size.cy + offset_v_center,
        );
        self.content_rect.strip_margins(sm.content_margins);

        // Chevron: rightmost, centered vertically.
        offset_v_center = (h - sm.combined_chevron_size.cy) / 2;
        self.chevron_clip_rect = Rect::new(
            rect.right - sm.combined_chevron_size.cx,
            y + offset_v_center,
            rect.right,
            y + sm.combined_chevron_size.cy + offset_v_center,
        );
        self.chevron_rect = self.chevron_clip_rect;
        self.chevron_rect.strip_margins(sm.chevron_margins);
    }
}

/// Theme part states for the components of one item, derived from the
/// platform's reported item state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThemeStates {
    item: i32,
    chevron: i32,
    checked: bool,
    check_bg: i32,
    check_fg: i32,
}

fn item_state_to_theme_states(state: u32, exclusive: bool) -> ThemeStates {
    let checked = state & draw_state::CHECKED != 0;
    let disabled = state & (draw_state::DISABLED | draw_state::GRAYED) != 0;
    let hot = state & (draw_state::HOTLIGHT | draw_state::SELECTED) != 0;

    let mut item = part_state::MPI_NORMAL;
    let mut chevron = part_state::MSM_NORMAL;

    if hot {
        item += 1;
    }
    if disabled {
        chevron = part_state::MSM_DISABLED;
        // An item's disabled state is offset by 2 from its enabled state.
        item += 2;
    }

    if !checked {
        return ThemeStates {
            item,
            chevron,
            checked,
            check_bg: 0,
            check_fg: 0,
        };
    }

    let mut check_fg = if exclusive {
        part_state::MC_BULLETNORMAL
    } else {
        part_state::MC_CHECKMARKNORMAL
    };

    let check_bg = if disabled {
        // Foreground disabled state is the normal state, plus one.
        check_fg += 1;
        part_state::MCB_DISABLED
    } else {
        part_state::MCB_NORMAL
    };

    ThemeStates {
        item,
        chevron,
        checked,
        check_bg,
        check_fg,
    }
}

/// Finds the first `&`-prefixed character in menu text, skipping escaped
/// `&&` pairs, and returns it uppercased as the item's keyboard mnemonic.
pub(crate) fn find_explicit_mnemonic(text: &str) -> Option<char> {
    let mut maybe_mnemonic = false;

    for c in text.chars() {
        if maybe_mnemonic {
            maybe_mnemonic = false;
            if c == '&' {
                continue;
            }
            return c.to_uppercase().next();
        } else if c == '&' {
            maybe_mnemonic = true;
        }
    }

    None
}

/// The per-item state behind every owner-drawn menu item: the handler, the
/// metrics it measures against, the computed layout and the mnemonic
/// extracted from the item text.
pub struct OwnerDrawnMenuItemInfo {
    action: RefCell<Option<Rc<Action>>>,
    handler: Rc<dyn ActionOwnerDrawHandler>,
    shared_metrics: RefCell<Option<Rc<MenuSharedMetrics>>>,
    per_menu_metrics: RefCell<Option<Rc<MenuSpecificMetrics>>>,
    layout: RefCell<MenuItemLayout>,
    text: RefCell<String>,
    mnemonic: Cell<Option<char>>,
}

impl OwnerDrawnMenuItemInfo {
    pub(crate) fn new(action: &Rc<Action>, handler: Rc<dyn ActionOwnerDrawHandler>) -> Rc<Self> {
        let odi = Rc::new(Self {
            action: RefCell::new(Some(Rc::clone(action))),
            handler,
            shared_metrics: RefCell::new(None),
            per_menu_metrics: RefCell::new(None),
            layout: RefCell::new(MenuItemLayout::default()),
            text: RefCell::new(String::new()),
            mnemonic: Cell::new(None),
        });

        odi.update_text();
        let weak = Rc::downgrade(&odi);
        action.add_changed_handler(weak);

        odi
    }

    pub(crate) fn dispose(self: &Rc<Self>) {
        if let Some(action) = self.action.borrow_mut().take() {
            let weak = Rc::downgrade(self);
            let weak: Weak<dyn ActionChangedHandler> = weak;
            action.remove_changed_handler(&weak);
        }
        *self.shared_metrics.borrow_mut() = None;
        *self.per_menu_metrics.borrow_mut() = None;
    }

    pub(crate) fn has_handler(&self, handler: &Rc<dyn ActionOwnerDrawHandler>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.handler), Rc::as_ptr(handler))
    }

    pub(crate) fn set_metrics(
        &self,
        shared: Option<Rc<MenuSharedMetrics>>,
        per_menu: Option<Rc<MenuSpecificMetrics>>,
    ) {
        *self.shared_metrics.borrow_mut() = shared;
        *self.per_menu_metrics.borrow_mut() = per_menu;
    }

    /// The item's keyboard mnemonic, extracted from its text.
    pub fn mnemonic(&self) -> Option<char> {
        self.mnemonic.get()
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    fn update_text(&self) {
        let Some(action) = self.action.borrow().clone() else {
            return;
        };

        let text = action.text();
        if *self.text.borrow() == text {
            return;
        }

        self.mnemonic.set(find_explicit_mnemonic(&text));
        *self.text.borrow_mut() = text;
    }

    /// Measures the entire menu item: the handler measures the content area,
    /// the engine adds the accelerator column, margins, gutter and chevron.
    pub fn on_measure(&self, theme: &Rc<dyn MenuTheme>) -> Size {
        let Some(sm) = self.shared_metrics.borrow().clone() else {
            return Size::default();
        };
        let Some(action) = self.action.borrow().clone() else {
            return Size::default();
        };

        if action.is_separator() {
            return sm.combined_separator_size;
        }

        let mctx = MenuItemMeasureContext {
            theme: Rc::clone(theme),
            theme_font: if action.is_default() {
                FontKind::Bold
            } else {
                FontKind::Normal
            },
            padding: sm.content_margins.left,
        };

        let mut content = self.handler.on_measure(&action, &mctx);

        if let Some(mm) = self.per_menu_metrics.borrow().clone() {
            let accel = mm.max_accel_text_extent();
            if accel.cx > 0 {
                // The spacing between the end of the menu text and the
                // accelerator text is undocumented; making it as wide as the
                // widest accelerator text in the menu looks right, hence
                // twice the extent.
                content.cx += 2 * accel.cx;
                content.cy = content.cy.max(accel.cy);
            }
        }

        let mut layout = self.layout.borrow_mut();
        layout.content_size = content;

        layout.combined_content_size = content;
        layout.combined_content_size.add_margins(sm.content_margins);

        // Reserve chevron width even for non-submenu items, so content
        // lines up across the menu.
        layout.combined_content_size.cx += sm.combined_chevron_size.cx;

        let mut combined_content_item_size = layout.combined_content_size;
        combined_content_item_size.add_margins(sm.item_margins);

        Size::new(
            sm.gutter_size.cx + combined_content_item_size.cx,
            sm.gutter_size
                .cy
                .max(combined_content_item_size.cy)
                .max(sm.combined_chevron_size.cy),
        )
    }

    /// Draws the entire menu item into a buffered paint scope, delegating
    /// the content area to the handler.
    pub fn on_draw(
        &self,
        theme: &Rc<dyn MenuTheme>,
        target: &mut dyn MenuCanvas,
        bounds: Rect,
        item_state: u32,
        draw_action: u32,
    ) {
        let Some(sm) = self.shared_metrics.borrow().clone() else {
            return;
        };
        let Some(action) = self.action.borrow().clone() else {
            return;
        };

        let layout = {
            let mut layout = self.layout.borrow_mut();
            layout.layout(&sm, bounds);
            *layout
        };

        let is_submenu = action.menu().is_some();

        {
            let Ok(mut bp) = theme.begin_buffered_paint(target, bounds) else {
                return;
            };
            let canvas = bp.canvas();

            theme.draw_background(canvas, MenuPart::PopupBackground, 0, bounds);
            theme.draw_background(canvas, MenuPart::PopupGutter, 0, layout.gutter_rect);

            if action.is_separator() {
                theme.draw_background(canvas, MenuPart::PopupSeparator, 0, layout.separator_rect);
                bp.finish();
                return;
            }

            let states = item_state_to_theme_states(item_state, action.exclusive());
            theme.draw_background(canvas, MenuPart::PopupItem, states.item, layout.selection_rect);

            if states.checked {
                theme.draw_background(
                    canvas,
                    MenuPart::PopupCheckBackground,
                    states.check_bg,
                    layout.checkbox_bg_rect,
                );
                theme.draw_background(
                    canvas,
                    MenuPart::PopupCheck,
                    states.check_fg,
                    layout.checkbox_rect,
                );
            } else if let Some(image) = action.image() {
                // Images occupy the same bounds as a checkmark would.
                theme.draw_image(canvas, image.as_ref(), layout.checkbox_rect);
            }

            let mut dctx = MenuItemDrawContext {
                draw_action,
                state: item_state,
                theme: Rc::clone(theme),
                theme_state: states.item,
                canvas,
                theme_font: if action.is_default() {
                    FontKind::Bold
                } else {
                    FontKind::Normal
                },
                bounds: layout.content_rect,
                padding: sm.content_margins.left,
            };

            self.handler.on_draw(&action, &mut dctx);

            if is_submenu {
                theme.draw_background(
                    dctx.canvas,
                    MenuPart::PopupSubmenu,
                    states.chevron,
                    layout.chevron_rect,
                );
            }

            bp.finish();
        }

        if is_submenu {
            // The native menu draws an unthemed chevron over owner-drawn
            // submenu items; excluding the chevron bounds from the clip
            // region after the blit keeps our themed chevron intact.
            target.exclude_clip(layout.chevron_clip_rect);
        }
    }
}

impl ActionChangedHandler for OwnerDrawnMenuItemInfo {
    fn on_action_changed(&self, _action: &Rc<Action>) -> Result<()> {
        self.update_text();
        Ok(())
    }

    fn on_action_visible_changed(&self, _action: &Rc<Action>) -> Result<()> {
        Ok(())
    }
}

/// The built-in handler: measures and draws the action's text, plus its
/// right-justified accelerator text when a shortcut is set.
pub struct DefaultOwnerDrawHandler;

impl ActionOwnerDrawHandler for DefaultOwnerDrawHandler {
    fn on_measure(&self, action: &Rc<Action>, mctx: &MenuItemMeasureContext) -> Size {
        let flags = TextFlags {
            single_line: true,
            ..TextFlags::default()
        };
        mctx.theme
            .text_extent(mctx.theme_font, &action.text(), flags)
            .unwrap_or_default()
    }

    fn on_draw(&self, action: &Rc<Action>, dctx: &mut MenuItemDrawContext<'_>) {
        let mut flags = TextFlags {
            single_line: true,
            ..TextFlags::default()
        };
        if dctx.state & draw_state::NO_ACCEL != 0 {
            flags.hide_prefix = true;
        }

        dctx.theme.draw_text(
            dctx.canvas,
            dctx.theme_font,
            dctx.theme_state,
            &action.text(),
            flags,
            dctx.bounds,
        );

        let shortcut = action.shortcut();
        if !shortcut.is_empty() {
            let flags = TextFlags {
                right_align: true,
                single_line: true,
                hide_prefix: true,
            };
            dctx.theme.draw_text(
                dctx.canvas,
                dctx.theme_font,
                dctx.theme_state,
                &shortcut.to_string(),
                flags,
                dctx.bounds,
            );
        }
    }
}
