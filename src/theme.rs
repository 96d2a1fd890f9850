/*
 * The visual-theme facade used by the owner-draw engine. It mirrors the
 * menu-related subset of the native visual styles API (parts, part states,
 * margins, buffered painting) without exposing any native handle, so the
 * layout and draw logic can run against a scripted fake in tests.
 *
 * The embedding toolkit supplies the real implementation, typically backed
 * by UxTheme on Windows.
 */

use std::rc::Rc;

use crate::error::Result;
use crate::types::{Image, Margins, Rect, Size};

/// The themed menu parts the owner-draw engine asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuPart {
    PopupBackground,
    PopupItem,
    PopupCheck,
    PopupCheckBackground,
    PopupGutter,
    PopupSeparator,
    PopupSubmenu,
}

/// Per-part state IDs, matching the native visual styles numbering.
pub mod part_state {
    // MenuPart::PopupItem
    pub const MPI_NORMAL: i32 = 1;
    pub const MPI_HOT: i32 = 2;
    pub const MPI_DISABLED: i32 = 3;
    pub const MPI_DISABLEDHOT: i32 = 4;

    // MenuPart::PopupSubmenu
    pub const MSM_NORMAL: i32 = 1;
    pub const MSM_DISABLED: i32 = 2;

    // MenuPart::PopupCheck
    pub const MC_CHECKMARKNORMAL: i32 = 1;
    pub const MC_CHECKMARKDISABLED: i32 = 2;
    pub const MC_BULLETNORMAL: i32 = 3;
    pub const MC_BULLETDISABLED: i32 = 4;

    // MenuPart::PopupCheckBackground
    pub const MCB_DISABLED: i32 = 1;
    pub const MCB_NORMAL: i32 = 2;
}

/// The font roles menu items are drawn with. Concrete font objects stay on
/// the theme side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontKind {
    #[default]
    Normal,
    /// Used for the menu's default item.
    Bold,
}

/// Formatting flags for themed text measurement and drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextFlags {
    pub right_align: bool,
    pub single_line: bool,
    /// Renders mnemonic prefix characters (`&`) invisibly instead of
    /// underlining the following character.
    pub hide_prefix: bool,
}

/// The size of one themed part, re-queryable at other pixel densities.
///
/// Implementations must ask the theme engine again at the new density
/// rather than scaling arithmetically; themed part sizes do not scale
/// linearly.
pub trait ThemeSizeMetric {
    fn part_size(&self) -> Result<Size>;

    fn copy_for_dpi(&self, dpi: i32) -> Rc<dyn ThemeSizeMetric>;
}

/// A drawing surface handed to the owner-draw engine.
pub trait MenuCanvas {
    fn dpi(&self) -> i32;

    /// Excludes `rect` from the canvas clip region so later painting cannot
    /// touch it.
    fn exclude_clip(&mut self, rect: Rect);
}

/// A double-buffering scope around the item painting sequence. Dropping
/// without `finish` discards the buffer.
pub trait BufferedPaint {
    /// The buffer canvas to paint into.
    fn canvas(&mut self) -> &mut dyn MenuCanvas;

    /// Blits the buffer to the target canvas.
    fn finish(self: Box<Self>);
}

/// Menu theme queries and painting operations.
pub trait MenuTheme {
    /// The natural size of `part`, wrapped so it can be re-queried per DPI.
    fn part_size(&self, part: MenuPart) -> Result<Rc<dyn ThemeSizeMetric>>;

    fn margins(&self, part: MenuPart) -> Result<Margins>;

    fn border_size(&self, part: MenuPart) -> Result<i32>;

    fn text_extent(&self, font: FontKind, text: &str, flags: TextFlags) -> Result<Size>;

    fn begin_buffered_paint<'a>(
        &self,
        target: &'a mut dyn MenuCanvas,
        bounds: Rect,
    ) -> Result<Box<dyn BufferedPaint + 'a>>;

    fn draw_background(&self, canvas: &mut dyn MenuCanvas, part: MenuPart, state: i32, bounds: Rect);

    fn draw_text(
        &self,
        canvas: &mut dyn MenuCanvas,
        font: FontKind,
        state: i32,
        text: &str,
        flags: TextFlags,
        bounds: Rect,
    );

    fn draw_image(&self, canvas: &mut dyn MenuCanvas, image: &dyn Image, bounds: Rect);
}
