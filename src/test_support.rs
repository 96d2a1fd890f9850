/*
 * Shared fakes for the test suites: a no-op platform, a recording platform
 * that logs every backend call, a scripted theme with fixed metrics, and a
 * menu host tying them together.
 */

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::Result;
use crate::menu_owner_draw::MenuSharedMetrics;
use crate::platform::{
    MenuBackend, MenuHost, MenuItemDescriptor, MenuPlatform, NativeMenuHandle,
};
use crate::theme::{BufferedPaint, FontKind, MenuCanvas, MenuPart, MenuTheme, TextFlags, ThemeSizeMetric};
use crate::types::{Image, Margins, Rect, Size};

pub(crate) struct NullBackend;

impl MenuBackend for NullBackend {
    fn native_handle(&self) -> NativeMenuHandle {
        NativeMenuHandle(1)
    }

    fn insert_item(&self, _: u32, _: &MenuItemDescriptor) -> Result<()> {
        Ok(())
    }

    fn remove_item(&self, _: u32) -> Result<()> {
        Ok(())
    }

    fn update_item(&self, _: u32, _: &MenuItemDescriptor) -> Result<()> {
        Ok(())
    }

    fn set_default_item(&self, _: Option<u32>) -> Result<()> {
        Ok(())
    }

    fn check_radio_item(&self, _: u32, _: u32, _: u32) -> Result<()> {
        Ok(())
    }

    fn destroy(&self) {}
}

pub(crate) struct NullPlatform;

impl MenuPlatform for NullPlatform {
    fn create_popup_menu(&self) -> Result<Box<dyn MenuBackend>> {
        Ok(Box::new(NullBackend))
    }

    fn create_menu_bar(&self) -> Result<Box<dyn MenuBackend>> {
        Ok(Box::new(NullBackend))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendCall {
    Insert(u32, MenuItemDescriptor),
    Remove(u32),
    Update(u32, MenuItemDescriptor),
    SetDefault(Option<u32>),
    CheckRadio(u32, u32, u32),
    Destroy,
}

/// Logs every backend call across all menus created from it.
pub(crate) struct RecordingPlatform {
    calls: Rc<RefCell<Vec<BackendCall>>>,
    next_handle: Cell<isize>,
}

impl RecordingPlatform {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            next_handle: Cell::new(1),
        })
    }

    pub(crate) fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn backend(&self) -> Box<dyn MenuBackend> {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        Box::new(RecordingBackend {
            handle: NativeMenuHandle(handle),
            calls: Rc::clone(&self.calls),
        })
    }
}

impl MenuPlatform for RecordingPlatform {
    fn create_popup_menu(&self) -> Result<Box<dyn MenuBackend>> {
        Ok(self.backend())
    }

    fn create_menu_bar(&self) -> Result<Box<dyn MenuBackend>> {
        Ok(self.backend())
    }
}

struct RecordingBackend {
    handle: NativeMenuHandle,
    calls: Rc<RefCell<Vec<BackendCall>>>,
}

impl MenuBackend for RecordingBackend {
    fn native_handle(&self) -> NativeMenuHandle {
        self.handle
    }

    fn insert_item(&self, index: u32, desc: &MenuItemDescriptor) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(BackendCall::Insert(index, desc.clone()));
        Ok(())
    }

    fn remove_item(&self, index: u32) -> Result<()> {
        self.calls.borrow_mut().push(BackendCall::Remove(index));
        Ok(())
    }

    fn update_item(&self, index: u32, desc: &MenuItemDescriptor) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(BackendCall::Update(index, desc.clone()));
        Ok(())
    }

    fn set_default_item(&self, index: Option<u32>) -> Result<()> {
        self.calls.borrow_mut().push(BackendCall::SetDefault(index));
        Ok(())
    }

    fn check_radio_item(&self, first: u32, last: u32, index: u32) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(BackendCall::CheckRadio(first, last, index));
        Ok(())
    }

    fn destroy(&self) {
        self.calls.borrow_mut().push(BackendCall::Destroy);
    }
}

struct FakeSizeMetric {
    base: Size,
    dpi: i32,
}

impl ThemeSizeMetric for FakeSizeMetric {
    fn part_size(&self) -> Result<Size> {
        // Deliberately non-linear in DPI: one extra pixel past 96, so tests
        // can tell a re-query from arithmetic scaling.
        let extra = i32::from(self.dpi > 96);
        Ok(Size::new(self.base.cx + extra, self.base.cy + extra))
    }

    fn copy_for_dpi(&self, dpi: i32) -> Rc<dyn ThemeSizeMetric> {
        Rc::new(Self {
            base: self.base,
            dpi,
        })
    }
}

/*
 * FakeTheme metrics:
 *   part sizes (96 DPI): check 10x10, chevron 6x8, separator 0x3
 *   margins: item 2 on each side, all others 1 on each side
 *   border size: PopupItem 3, PopupBackground 2
 *   text extent: 5 px per char, 12 px tall
 */
pub(crate) struct FakeTheme {
    calls: Rc<RefCell<Vec<String>>>,
}

impl FakeTheme {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            calls: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl MenuTheme for FakeTheme {
    fn part_size(&self, part: MenuPart) -> Result<Rc<dyn ThemeSizeMetric>> {
        let base = match part {
            MenuPart::PopupCheck => Size::new(10, 10),
            MenuPart::PopupSubmenu => Size::new(6, 8),
            MenuPart::PopupSeparator => Size::new(0, 3),
            _ => Size::default(),
        };
        Ok(Rc::new(FakeSizeMetric { base, dpi: 96 }))
    }

    fn margins(&self, part: MenuPart) -> Result<Margins> {
        Ok(match part {
            MenuPart::PopupItem => Margins::new(2, 2, 2, 2),
            _ => Margins::new(1, 1, 1, 1),
        })
    }

    fn border_size(&self, part: MenuPart) -> Result<i32> {
        Ok(match part {
            MenuPart::PopupItem => 3,
            MenuPart::PopupBackground => 2,
            _ => 0,
        })
    }

    fn text_extent(&self, _font: FontKind, text: &str, _flags: TextFlags) -> Result<Size> {
        Ok(Size::new(text.chars().count() as i32 * 5, 12))
    }

    fn begin_buffered_paint<'a>(
        &self,
        target: &'a mut dyn MenuCanvas,
        _bounds: Rect,
    ) -> Result<Box<dyn BufferedPaint + 'a>> {
        Ok(Box::new(FakeBufferedPaint {
            target,
            log: Rc::clone(&self.calls),
        }))
    }

    fn draw_background(
        &self,
        _canvas: &mut dyn MenuCanvas,
        part: MenuPart,
        state: i32,
        _bounds: Rect,
    ) {
        self.calls
            .borrow_mut()
            .push(format!("background {part:?} {state}"));
    }

    fn draw_text(
        &self,
        _canvas: &mut dyn MenuCanvas,
        _font: FontKind,
        _state: i32,
        text: &str,
        _flags: TextFlags,
        _bounds: Rect,
    ) {
        self.calls.borrow_mut().push(format!("text {text}"));
    }

    fn draw_image(&self, _canvas: &mut dyn MenuCanvas, _image: &dyn Image, _bounds: Rect) {
        self.calls.borrow_mut().push("image".to_string());
    }
}

struct FakeBufferedPaint<'a> {
    target: &'a mut dyn MenuCanvas,
    log: Rc<RefCell<Vec<String>>>,
}

impl BufferedPaint for FakeBufferedPaint<'_> {
    fn canvas(&mut self) -> &mut dyn MenuCanvas {
        &mut *self.target
    }

    fn finish(self: Box<Self>) {
        self.log.borrow_mut().push("finish".to_string());
    }
}

pub(crate) struct FakeCanvas {
    dpi: i32,
    excluded: Vec<Rect>,
}

impl FakeCanvas {
    pub(crate) fn new(dpi: i32) -> Self {
        Self {
            dpi,
            excluded: Vec::new(),
        }
    }

    pub(crate) fn excluded(&self) -> &[Rect] {
        &self.excluded
    }
}

impl MenuCanvas for FakeCanvas {
    fn dpi(&self) -> i32 {
        self.dpi
    }

    fn exclude_clip(&mut self, rect: Rect) {
        self.excluded.push(rect);
    }
}

/// A window stand-in: fixed DPI, the fake theme, and shared metrics
/// measured at 96 DPI.
pub(crate) struct FakeHost {
    dpi: i32,
    theme: Rc<FakeTheme>,
    shared: Rc<MenuSharedMetrics>,
    redraws: Cell<usize>,
}

impl FakeHost {
    pub(crate) fn new(dpi: i32) -> Rc<Self> {
        let theme = FakeTheme::new();
        let shared = MenuSharedMetrics::new(&*theme, 96).unwrap();
        Rc::new(Self {
            dpi,
            theme,
            shared,
            redraws: Cell::new(0),
        })
    }

    pub(crate) fn theme(&self) -> Rc<FakeTheme> {
        Rc::clone(&self.theme)
    }

    pub(crate) fn redraws(&self) -> usize {
        self.redraws.get()
    }
}

impl MenuHost for FakeHost {
    fn dpi(&self) -> i32 {
        self.dpi
    }

    fn menu_theme(&self) -> Result<Rc<dyn MenuTheme>> {
        Ok(Rc::clone(&self.theme) as Rc<dyn MenuTheme>)
    }

    fn menu_shared_metrics(&self) -> Option<Rc<MenuSharedMetrics>> {
        Some(Rc::clone(&self.shared))
    }

    fn redraw_menu_bar(&self) {
        self.redraws.set(self.redraws.get() + 1);
    }
}
