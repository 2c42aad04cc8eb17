/*
 * The Win32 backend: runs the soft input dialog with DialogBoxIndirectParamW
 * on the dialog thread and routes the dialog procedure's messages into the
 * `DialogMessageHandler`.
 *
 * Host commands are queued on the port and announced with a private
 * `WM_SOFTINPUT_COMMAND` message; the dialog procedure drains the queue on
 * the dialog thread. Text reads and writes go through GetWindowTextW and
 * SetWindowTextW, which the system marshals onto the dialog thread.
 */

use super::backend::{DialogFactory, DialogPort, LiveDialog};
use super::dialog_handler::DialogMessageHandler;
use super::types::{DialogButton, DialogEvent, EventDisposition, HostCommand};
use crate::core::dialog_template::{DialogTemplate, ID_EDITTEXT, IDCANCEL, IDOK};
use crate::core::geometry::{DialogBaseUnits, OwnerMetrics, PixelRect, ScreenRect};
use crate::core::models::{OwnerWindow, SelectionRange};
use crate::error::{Result, SoftInputError};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use windows::{
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, POINT, RECT, WPARAM},
        Graphics::Gdi::ClientToScreen,
        System::LibraryLoader::GetModuleHandleW,
        UI::Input::KeyboardAndMouse::{EnableWindow, SetFocus},
        UI::WindowsAndMessaging::{
            DLGTEMPLATE, DialogBoxIndirectParamW, EndDialog, GWLP_USERDATA, GetClientRect,
            GetDialogBaseUnits, GetDlgItem, GetWindowLongPtrW, GetWindowRect,
            GetWindowTextLengthW, GetWindowTextW, IsWindow, MoveWindow, PostMessageW,
            SendMessageW, SetWindowLongPtrW, SetWindowTextW, WM_COMMAND, WM_CTLCOLOREDIT,
            WM_INITDIALOG, WM_MOUSEACTIVATE, WM_USER,
        },
    },
    core::PCWSTR,
};

/// Private message announcing queued host commands.
pub const WM_SOFTINPUT_COMMAND: u32 = WM_USER + 1;

const EM_GETSEL: u32 = 0x00B0;
const EM_SETSEL: u32 = 0x00B1;
const EM_SETLIMITTEXT: u32 = 0x00C5;

fn hwnd_from(value: isize) -> HWND {
    HWND(value as *mut c_void)
}

fn loword_from_wparam(wparam: WPARAM) -> u16 {
    (wparam.0 & 0xFFFF) as u16
}

fn is_window(hwnd: HWND) -> bool {
    !hwnd.is_invalid() && unsafe { IsWindow(Some(hwnd)) }.as_bool()
}

// Handles are kept as integers so the port can be shared across threads.
struct Win32Port {
    dialog: isize,
    edit: isize,
    owner: isize,
    queue: Mutex<VecDeque<HostCommand>>,
    alive: AtomicBool,
}

impl Win32Port {
    fn pop_command(&self) -> Option<HostCommand> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && is_window(hwnd_from(self.dialog))
    }
}

impl DialogPort for Win32Port {
    fn read_text(&self) -> Option<Vec<u16>> {
        if !self.is_alive() {
            return None;
        }
        let edit = hwnd_from(self.edit);
        let len = unsafe { GetWindowTextLengthW(edit) };
        let mut buffer = vec![0u16; len.max(0) as usize + 1];
        let copied = unsafe { GetWindowTextW(edit, &mut buffer) };
        buffer.truncate(copied.max(0) as usize);
        Some(buffer)
    }

    fn write_text(&self, text: &[u16]) {
        if !self.is_alive() {
            return;
        }
        let mut buffer = Vec::with_capacity(text.len() + 1);
        buffer.extend(text.iter().copied().take_while(|&unit| unit != 0));
        buffer.push(0);
        if let Err(e) = unsafe { SetWindowTextW(hwnd_from(self.edit), PCWSTR(buffer.as_ptr())) } {
            log::warn!("Win32Dialog: SetWindowTextW on the edit control failed: {e:?}");
        }
    }

    fn window_rect(&self) -> Option<ScreenRect> {
        if !self.is_alive() {
            return None;
        }
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd_from(self.dialog), &mut rect) }.ok()?;
        Some(ScreenRect {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        })
    }

    fn post(&self, command: HostCommand) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(command);
        let posted = unsafe {
            PostMessageW(
                Some(hwnd_from(self.dialog)),
                WM_SOFTINPUT_COMMAND,
                WPARAM(0),
                LPARAM(0),
            )
        };
        if let Err(e) = posted {
            log::warn!("Win32Dialog: PostMessageW failed: {e:?}");
            return false;
        }
        true
    }

    fn request_close(&self) -> bool {
        // EndDialog re-enables the owner with a cross-thread send; the host
        // thread is about to block in a join and could not answer it.
        let _ = unsafe { EnableWindow(hwnd_from(self.owner), true) };
        self.post(HostCommand::Close)
    }
}

struct Win32Live {
    dialog: HWND,
    edit: HWND,
}

impl LiveDialog for Win32Live {
    fn edit_text(&self) -> Vec<u16> {
        let len = unsafe { GetWindowTextLengthW(self.edit) };
        let mut buffer = vec![0u16; len.max(0) as usize + 1];
        let copied = unsafe { GetWindowTextW(self.edit, &mut buffer) };
        buffer.truncate(copied.max(0) as usize);
        buffer
    }

    fn edit_selection(&self) -> SelectionRange {
        let mut start: u32 = 0;
        let mut end: u32 = 0;
        unsafe {
            SendMessageW(
                self.edit,
                EM_GETSEL,
                Some(WPARAM(&mut start as *mut u32 as usize)),
                Some(LPARAM(&mut end as *mut u32 as isize)),
            );
        }
        SelectionRange::new(start, end)
    }

    fn set_edit_selection(&mut self, selection: SelectionRange) {
        unsafe {
            SendMessageW(
                self.edit,
                EM_SETSEL,
                Some(WPARAM(selection.start as usize)),
                Some(LPARAM(selection.end as isize)),
            );
        }
    }

    fn set_character_limit(&mut self, limit: u32) {
        unsafe {
            SendMessageW(
                self.edit,
                EM_SETLIMITTEXT,
                Some(WPARAM(limit as usize)),
                Some(LPARAM(0)),
            );
        }
    }

    fn move_edit(&mut self, rect: PixelRect) {
        if let Err(e) =
            unsafe { MoveWindow(self.edit, rect.x, rect.y, rect.width, rect.height, true) }
        {
            log::warn!("Win32Dialog: MoveWindow on the edit control failed: {e:?}");
        }
    }

    fn focus_edit(&mut self) {
        let _ = unsafe { SetFocus(Some(self.edit)) };
    }

    fn end(&mut self, result: isize) {
        if let Err(e) = unsafe { EndDialog(self.dialog, result) } {
            log::error!("Win32Dialog: EndDialog failed: {e:?}");
        }
    }
}

/*
 * Lives on the dialog thread's stack for the whole modal loop; the dialog
 * procedure finds it through GWLP_USERDATA. The handler sits in a RefCell so
 * that a message sent while it is running (SetFocus triggers several) is
 * passed to the default procedure instead of re-entering it.
 */
struct DialogContext {
    handler: RefCell<DialogMessageHandler>,
    port: RefCell<Option<Arc<Win32Port>>>,
    owner: isize,
}

impl DialogContext {
    fn dispatch(&self, hdlg: HWND, event: DialogEvent) -> isize {
        let Ok(mut handler) = self.handler.try_borrow_mut() else {
            log::trace!("Win32Dialog: Skipping re-entrant {event:?}");
            return 0;
        };
        let edit = match unsafe { GetDlgItem(Some(hdlg), ID_EDITTEXT as i32) } {
            Ok(edit) => edit,
            Err(e) => {
                log::error!("Win32Dialog: Edit control {ID_EDITTEXT} not found: {e:?}");
                return 0;
            }
        };
        let mut live = Win32Live { dialog: hdlg, edit };
        match handler.handle_event(event, &mut live) {
            EventDisposition::Handled => 1,
            EventDisposition::NotHandled => 0,
        }
    }

    fn initialize(&self, hdlg: HWND) -> isize {
        let edit = unsafe { GetDlgItem(Some(hdlg), ID_EDITTEXT as i32) }
            .map(|edit| edit.0 as isize)
            .unwrap_or_default();
        let port = Arc::new(Win32Port {
            dialog: hdlg.0 as isize,
            edit,
            owner: self.owner,
            queue: Mutex::new(VecDeque::new()),
            alive: AtomicBool::new(true),
        });
        *self.port.borrow_mut() = Some(Arc::clone(&port));
        self.dispatch(hdlg, DialogEvent::Initialize { port })
    }

    fn drain_commands(&self, hdlg: HWND) -> isize {
        let Some(port) = self.port.borrow().clone() else {
            return 0;
        };
        while let Some(command) = port.pop_command() {
            self.dispatch(hdlg, DialogEvent::Host(command));
        }
        1
    }

    fn mark_closed(&self) {
        if let Some(port) = self.port.borrow().as_ref() {
            port.alive.store(false, Ordering::Release);
        }
    }
}

unsafe extern "system" fn soft_input_dialog_proc(
    hdlg: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> isize {
    let context_ptr = if msg == WM_INITDIALOG {
        unsafe { SetWindowLongPtrW(hdlg, GWLP_USERDATA, lparam.0) };
        lparam.0 as *const DialogContext
    } else {
        unsafe { GetWindowLongPtrW(hdlg, GWLP_USERDATA) as *const DialogContext }
    };
    if context_ptr.is_null() {
        return 0;
    }
    // The context outlives the dialog: DialogBoxIndirectParamW does not return before it is destroyed.
    let context = unsafe { &*context_ptr };

    match msg {
        WM_INITDIALOG => context.initialize(hdlg),
        WM_COMMAND => match loword_from_wparam(wparam) {
            IDOK => context.dispatch(hdlg, DialogEvent::Command(DialogButton::Ok)),
            IDCANCEL => context.dispatch(hdlg, DialogEvent::Command(DialogButton::Cancel)),
            _ => 0,
        },
        WM_CTLCOLOREDIT | WM_MOUSEACTIVATE => {
            context.dispatch(hdlg, DialogEvent::SelectionProbe);
            // Let the dialog manager pick the colours and the activation.
            0
        }
        WM_SOFTINPUT_COMMAND => context.drain_commands(hdlg),
        _ => 0,
    }
}

/// Runs soft input dialogs as native Win32 modal dialogs.
#[derive(Debug, Default)]
pub struct Win32DialogFactory;

impl Win32DialogFactory {
    pub fn new() -> Self {
        Win32DialogFactory
    }
}

impl DialogFactory for Win32DialogFactory {
    fn base_units(&self) -> DialogBaseUnits {
        DialogBaseUnits::from_packed(unsafe { GetDialogBaseUnits() } as u32)
    }

    fn owner_metrics(&self, owner: OwnerWindow) -> Result<OwnerMetrics> {
        let hwnd = hwnd_from(owner.0);
        if owner.is_null() || !is_window(hwnd) {
            return Err(SoftInputError::NoOwnerWindow);
        }
        let mut client = RECT::default();
        unsafe { GetClientRect(hwnd, &mut client)? };
        let mut origin = POINT::default();
        if !unsafe { ClientToScreen(hwnd, &mut origin) }.as_bool() {
            return Err(SoftInputError::Platform(
                "ClientToScreen failed for the owner window".to_string(),
            ));
        }
        Ok(OwnerMetrics {
            client_width: client.right - client.left,
            client_height: client.bottom - client.top,
            origin_x: origin.x,
            origin_y: origin.y,
        })
    }

    fn run_modal(
        &self,
        owner: OwnerWindow,
        template: &DialogTemplate,
        handler: DialogMessageHandler,
    ) -> Result<isize> {
        let owner_hwnd = hwnd_from(owner.0);
        if owner.is_null() || !is_window(owner_hwnd) {
            return Err(SoftInputError::NoOwnerWindow);
        }
        let h_instance = HINSTANCE(unsafe { GetModuleHandleW(PCWSTR::null())? }.0);
        // DialogBoxIndirectParamW requires a DWORD-aligned template.
        let words = template.to_aligned_words();
        let context = DialogContext {
            handler: RefCell::new(handler),
            port: RefCell::new(None),
            owner: owner.0,
        };

        log::debug!(
            "Win32Dialog: Running dialog ({} template bytes) for owner {:#x}.",
            template.len(),
            owner.0
        );
        let result = unsafe {
            DialogBoxIndirectParamW(
                Some(h_instance),
                words.as_ptr() as *const DLGTEMPLATE,
                Some(owner_hwnd),
                Some(soft_input_dialog_proc),
                LPARAM(&context as *const DialogContext as isize),
            )
        };
        context.mark_closed();

        if result == -1 {
            let last_error = unsafe { GetLastError() };
            log::error!("Win32Dialog: DialogBoxIndirectParamW failed: {last_error:?}");
            return Err(SoftInputError::Platform(format!(
                "DialogBoxIndirectParamW failed: {last_error:?}"
            )));
        }
        log::debug!("Win32Dialog: Dialog ended with {result}.");
        Ok(result)
    }
}
