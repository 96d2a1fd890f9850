/*
 * The Win32 implementation of the menu platform facade. This is the only
 * module that touches native menu handles directly; everything above it
 * speaks `MenuItemDescriptor`.
 *
 * Item text is passed as UTF-16; the buffer must outlive the native call,
 * so each operation builds and holds its own buffer. Owner-drawn items
 * carry the action's command ID in dwItemData so a WndProc handling
 * WM_MEASUREITEM/WM_DRAWITEM can resolve the action through its UiContext.
 */

use std::rc::Rc;

use log::debug;

use windows::Win32::Graphics::Gdi::HBITMAP;
use windows::Win32::UI::WindowsAndMessaging::{
    CheckMenuRadioItem, CreateMenu, CreatePopupMenu, DestroyMenu, GetMenuInfo, InsertMenuItemW,
    RemoveMenu, SetMenuDefaultItem, SetMenuInfo, SetMenuItemInfoW, HMENU, MENUINFO,
    MENUITEMINFOW, MENU_ITEM_STATE, MENU_ITEM_TYPE, MFS_CHECKED, MFS_DISABLED, MFT_OWNERDRAW,
    MFT_RADIOCHECK, MFT_SEPARATOR, MF_BYPOSITION, MIIM_BITMAP, MIIM_DATA, MIIM_FTYPE, MIIM_ID,
    MIIM_STATE, MIIM_STRING, MIIM_SUBMENU, MIM_STYLE, MNS_CHECKORBMP, MNS_NOCHECK,
};
use windows::core::PWSTR;

use crate::error::{Error, Result};
use crate::platform::{MenuBackend, MenuItemDescriptor, MenuPlatform, NativeMenuHandle};

fn op_failed(op: &str, err: windows::core::Error) -> Error {
    Error::OperationFailed(format!("{op}: {err:?}"))
}

/// Creates Win32 menus. Share one instance per `UiContext`.
pub struct Win32MenuPlatform;

/// Returns the platform to pass to `UiContext::new` on Windows.
pub fn win32_platform() -> Rc<dyn MenuPlatform> {
    Rc::new(Win32MenuPlatform)
}

impl MenuPlatform for Win32MenuPlatform {
    fn create_popup_menu(&self) -> Result<Box<dyn MenuBackend>> {
        let hmenu = unsafe { CreatePopupMenu() }.map_err(|e| op_failed("CreatePopupMenu", e))?;

        // Popups reserve checkmark space only when an item is checkable,
        // and share that column with item bitmaps.
        let mut mi = MENUINFO {
            cbSize: std::mem::size_of::<MENUINFO>() as u32,
            fMask: MIM_STYLE,
            ..Default::default()
        };
        unsafe {
            GetMenuInfo(hmenu, &mut mi).map_err(|e| op_failed("GetMenuInfo", e))?;
            mi.dwStyle |= MNS_CHECKORBMP;
            mi.dwStyle &= !MNS_NOCHECK;
            SetMenuInfo(hmenu, &mi).map_err(|e| op_failed("SetMenuInfo", e))?;
        }

        debug!("Platform: created popup menu {:?}", hmenu);
        Ok(Box::new(Win32MenuBackend { hmenu }))
    }

    fn create_menu_bar(&self) -> Result<Box<dyn MenuBackend>> {
        let hmenu = unsafe { CreateMenu() }.map_err(|e| op_failed("CreateMenu", e))?;
        debug!("Platform: created menu bar {:?}", hmenu);
        Ok(Box::new(Win32MenuBackend { hmenu }))
    }
}

struct Win32MenuBackend {
    hmenu: HMENU,
}

impl Win32MenuBackend {
    /// Builds the MENUITEMINFOW for `desc`, along with the UTF-16 text
    /// buffer it points into. The buffer must stay alive until after the
    /// native call consuming the struct.
    fn item_info(&self, desc: &MenuItemDescriptor) -> (MENUITEMINFOW, Vec<u16>) {
        let mut mii = MENUITEMINFOW {
            cbSize: std::mem::size_of::<MENUITEMINFOW>() as u32,
            fMask: MIIM_ID | MIIM_STATE,
            wID: u32::from(desc.id),
            fType: MENU_ITEM_TYPE(0),
            fState: MENU_ITEM_STATE(0),
            ..Default::default()
        };

        let mut text_utf16 = Vec::new();

        if desc.owner_drawn {
            mii.fMask |= MIIM_FTYPE | MIIM_DATA;
            mii.fType |= MFT_OWNERDRAW;
            mii.dwItemData = usize::from(desc.id);
            if desc.invalidate_size {
                // Owner-drawn items are not re-measured unless MIIM_BITMAP
                // is specified with a null hbmpItem.
                mii.fMask |= MIIM_BITMAP;
                mii.hbmpItem = HBITMAP::default();
            }
        } else if desc.separator {
            mii.fMask |= MIIM_FTYPE;
            mii.fType |= MFT_SEPARATOR;
        } else {
            mii.fMask |= MIIM_STRING;
            text_utf16 = desc.text.encode_utf16().chain(std::iter::once(0)).collect();
            mii.dwTypeData = PWSTR(text_utf16.as_mut_ptr());
        }

        if !desc.enabled {
            mii.fState |= MFS_DISABLED;
        }
        if desc.checked {
            mii.fState |= MFS_CHECKED;
        }
        if desc.exclusive {
            mii.fMask |= MIIM_FTYPE;
            mii.fType |= MFT_RADIOCHECK;
        }

        if let Some(submenu) = desc.submenu {
            mii.fMask |= MIIM_SUBMENU;
            mii.hSubMenu = HMENU(submenu.0 as *mut core::ffi::c_void);
        }

        (mii, text_utf16)
    }
}

impl MenuBackend for Win32MenuBackend {
    fn native_handle(&self) -> NativeMenuHandle {
        NativeMenuHandle(self.hmenu.0 as isize)
    }

    fn insert_item(&self, index: u32, desc: &MenuItemDescriptor) -> Result<()> {
        let (mii, _text) = self.item_info(desc);
        unsafe { InsertMenuItemW(self.hmenu, index, true, &mii) }
            .map_err(|e| op_failed("InsertMenuItemW", e))
    }

    fn remove_item(&self, index: u32) -> Result<()> {
        unsafe { RemoveMenu(self.hmenu, index, MF_BYPOSITION) }
            .map_err(|e| op_failed("RemoveMenu", e))
    }

    fn update_item(&self, index: u32, desc: &MenuItemDescriptor) -> Result<()> {
        let (mii, _text) = self.item_info(desc);
        unsafe { SetMenuItemInfoW(self.hmenu, index, true, &mii) }
            .map_err(|e| op_failed("SetMenuItemInfoW", e))
    }

    fn set_default_item(&self, index: Option<u32>) -> Result<()> {
        let item = index.unwrap_or(u32::MAX);
        unsafe { SetMenuDefaultItem(self.hmenu, item, 1) }
            .map_err(|e| op_failed("SetMenuDefaultItem", e))
    }

    fn check_radio_item(&self, first: u32, last: u32, index: u32) -> Result<()> {
        unsafe { CheckMenuRadioItem(self.hmenu, first, last, index, MF_BYPOSITION.0) }
            .map_err(|e| op_failed("CheckMenuRadioItem", e))
    }

    fn destroy(&self) {
        if let Err(err) = unsafe { DestroyMenu(self.hmenu) } {
            debug!("Platform: DestroyMenu {:?} failed: {err:?}", self.hmenu);
        }
    }
}
