/*
 * Platform-agnostic value types shared across the crate: keyboard shortcuts,
 * simple geometry (sizes, rectangles, margins), owner-draw state bits, and
 * the `Image` capability for menu item icons. These compile on every
 * platform so the portable logic can be tested without a native backend.
 */

use std::fmt;

/// Default pixel density assumed when no window is available to ask.
pub const DEFAULT_SCREEN_DPI: i32 = 96;

/// A key that can participate in a keyboard shortcut or act as a mnemonic.
///
/// Character keys are normalized to uppercase so that lookups are
/// case-insensitive, matching how the native platform reports key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Key {
    #[default]
    None,
    Char(char),
    F(u8),
    Return,
    Escape,
    Space,
    Tab,
    Back,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Right,
    Up,
    Down,
}

impl Key {
    /// Creates a character key, normalizing to uppercase.
    pub fn char(c: char) -> Self {
        Key::Char(c.to_uppercase().next().unwrap_or(c))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Key::None)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::None => Ok(()),
            Key::Char(c) => write!(f, "{c}"),
            Key::F(n) => write!(f, "F{n}"),
            Key::Return => write!(f, "Enter"),
            Key::Escape => write!(f, "Esc"),
            Key::Space => write!(f, "Space"),
            Key::Tab => write!(f, "Tab"),
            Key::Back => write!(f, "Backspace"),
            Key::Delete => write!(f, "Del"),
            Key::Insert => write!(f, "Ins"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
            Key::PageUp => write!(f, "PgUp"),
            Key::PageDown => write!(f, "PgDn"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
        }
    }
}

/// Modifier keys participating in a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        control: false,
        alt: false,
        shift: false,
    };

    pub const CONTROL: Modifiers = Modifiers {
        control: true,
        alt: false,
        shift: false,
    };

    pub const CONTROL_SHIFT: Modifiers = Modifiers {
        control: true,
        alt: false,
        shift: true,
    };

    pub const ALT: Modifiers = Modifiers {
        control: false,
        alt: true,
        shift: false,
    };
}

/// A keyboard shortcut bound to an action. An empty shortcut (key = `None`)
/// means "no shortcut".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shortcut {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl Shortcut {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_none()
    }
}

impl fmt::Display for Shortcut {
    /// Renders accelerator text the way native menus display it, e.g.
    /// `Ctrl+Shift+S`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_none() {
            return Ok(());
        }
        if self.modifiers.control {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.alt {
            f.write_str("Alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("Shift+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub cx: i32,
    pub cy: i32,
}

impl Size {
    pub fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// Accumulates the total width and height of `margins` into `self`.
    pub fn add_margins(&mut self, margins: Margins) {
        self.cx += margins.left + margins.right;
        self.cy += margins.top + margins.bottom;
    }
}

/// A rectangle in pixel coordinates, edges inclusive-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Shrinks the rectangle by removing `margins` from each edge.
    pub fn strip_margins(&mut self, margins: Margins) {
        self.left += margins.left;
        self.top += margins.top;
        self.right -= margins.right;
        self.bottom -= margins.bottom;
    }
}

/// Pixel margins surrounding a themed part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margins {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Owner-draw item state bits, mirroring the native `ODS_*` values that the
/// platform reports in its draw-item callbacks.
pub mod draw_state {
    pub const SELECTED: u32 = 0x0001;
    pub const GRAYED: u32 = 0x0002;
    pub const DISABLED: u32 = 0x0004;
    pub const CHECKED: u32 = 0x0008;
    pub const HOTLIGHT: u32 = 0x0040;
    pub const NO_ACCEL: u32 = 0x0100;
}

/// Owner-draw actions requested by the platform, mirroring `ODA_*` values.
pub mod draw_action {
    pub const DRAW_ENTIRE: u32 = 0x0001;
    pub const SELECT_CHANGE: u32 = 0x0002;
}

/// An icon attached to an action. The menu's owner-draw engine only needs to
/// know its size; rendering is delegated to the theme facade.
pub trait Image: fmt::Debug {
    /// Natural size of the image, in pixels at 96 DPI.
    fn size(&self) -> Size;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcut_display_renders_accelerator_text() {
        let s = Shortcut::new(Modifiers::CONTROL_SHIFT, Key::char('s'));
        assert_eq!(s.to_string(), "Ctrl+Shift+S");

        let s = Shortcut::new(Modifiers::ALT, Key::F(4));
        assert_eq!(s.to_string(), "Alt+F4");

        assert_eq!(Shortcut::none().to_string(), "");
    }

    #[test]
    fn char_keys_are_normalized_to_uppercase() {
        assert_eq!(Key::char('s'), Key::char('S'));
        assert_eq!(Key::char('s').to_string(), "S");
    }

    #[test]
    fn rect_strip_margins_offsets_by_left_and_top() {
        let mut r = Rect::new(10, 10, 110, 50);
        r.strip_margins(Margins::new(2, 3, 4, 5));
        assert_eq!(r, Rect::new(12, 13, 106, 45));
    }

    #[test]
    fn size_add_margins_accumulates_both_axes() {
        let mut sz = Size::new(100, 20);
        sz.add_margins(Margins::new(1, 2, 3, 4));
        assert_eq!(sz, Size::new(104, 26));
    }
}
