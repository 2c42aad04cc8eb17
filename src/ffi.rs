/*
 * C ABI exports over a process-wide `SoftInput` that uses the platform's
 * default dialog backend. The session is created on first use.
 *
 * No Rust error or panic crosses this boundary: failures are logged and turned
 * into sentinels (`-1`, `false` or a null pointer), and a null output pointer
 * makes a call fail without touching any state. Strings are UTF-16 code units
 * with an explicit length and need not be null-terminated.
 */

use crate::core::config::{ConfigManagerOperations, CoreConfigManager, SoftInputConfig};
use crate::core::models::OwnerWindow;
use crate::platform_layer::default_factory;
use crate::soft_input::{ShowRequest, SoftInput};

use std::ffi::c_void;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, OnceLock};

/// Application name used for the per-user configuration directory.
pub const APP_NAME: &str = "SoftInput";

static SOFT_INPUT: OnceLock<SoftInput> = OnceLock::new();
static RETURNED_STRING: Mutex<Vec<u16>> = Mutex::new(Vec::new());

fn soft_input() -> &'static SoftInput {
    SOFT_INPUT.get_or_init(|| {
        let config = match CoreConfigManager::new().load_config(APP_NAME) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ffi: Could not load configuration, using defaults: {e}");
                SoftInputConfig::default()
            }
        };
        SoftInput::with_config(default_factory(), config)
    })
}

fn guarded<T>(name: &str, failure: T, body: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(_) => {
            log::error!("Ffi: {name} panicked; returning the failure value.");
            failure
        }
    }
}

/// Copies `length` code units from `text`. Null or non-positive lengths give an empty text.
///
/// # Safety
/// `text` must be null or point to at least `length` readable code units.
unsafe fn utf16_argument(text: *const u16, length: i32) -> Vec<u16> {
    if text.is_null() || length <= 0 {
        return Vec::new();
    }
    unsafe { std::slice::from_raw_parts(text, length as usize) }.to_vec()
}

/// Starts a soft input session. Returns 0 on success and -1 on failure.
///
/// # Safety
/// `initial_text` and `placeholder` must be null or valid for their lengths.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn ShowSoftInput(
    owner: *const c_void,
    initial_text: *const u16,
    length: i32,
    input_type: i32,
    correction: bool,
    multiline: bool,
    secure: bool,
    placeholder: *const u16,
    placeholder_length: i32,
    character_limit: i32,
    hidden: bool,
    selection_start: i32,
    selection_length: i32,
) -> i32 {
    let text = unsafe { utf16_argument(initial_text, length) };
    let placeholder = unsafe { utf16_argument(placeholder, placeholder_length) };
    guarded("ShowSoftInput", -1, || {
        let mut request = ShowRequest::from_utf16(OwnerWindow(owner as isize), text)
            .input_type(input_type)
            .correction(correction)
            .multiline(multiline)
            .secure(secure)
            .character_limit(character_limit)
            .hidden(hidden)
            .selection(selection_start, selection_length);
        request.placeholder = placeholder;
        match soft_input().show_soft_input(request) {
            Ok(_) => 0,
            Err(e) => {
                log::error!("Ffi: ShowSoftInput failed: {e}");
                -1
            }
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn HideSoftInput() {
    guarded("HideSoftInput", (), || soft_input().hide_soft_input());
}

/// # Safety
/// `text` must be null or point to at least `length` readable code units.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn SetSoftInputString(text: *const u16, length: i32) {
    let text = unsafe { utf16_argument(text, length) };
    guarded("SetSoftInputString", (), || {
        soft_input().set_soft_input_string(&text)
    });
}

/// Returns the session text as a null-terminated buffer that stays valid until
/// the next call, and writes its length (without the terminator) and whether
/// it changed since the previous call. Returns null if an output pointer is null.
///
/// # Safety
/// `length` and `updated` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn GetSoftInputString(length: *mut i32, updated: *mut bool) -> *const u16 {
    if length.is_null() || updated.is_null() {
        return std::ptr::null();
    }
    guarded("GetSoftInputString", std::ptr::null(), || {
        let (text, changed) = soft_input().get_soft_input_string();
        let mut buffer = RETURNED_STRING
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        buffer.clear();
        buffer.extend_from_slice(&text);
        buffer.push(0);
        unsafe {
            *length = i32::try_from(text.len()).unwrap_or(i32::MAX);
            *updated = changed;
        }
        buffer.as_ptr()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn SetInputSelection(start: i32, length: i32) {
    guarded("SetInputSelection", (), || {
        soft_input().set_input_selection(start, length)
    });
}

/// # Safety
/// `start` and `length` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn GetInputSelection(start: *mut i32, length: *mut i32) -> bool {
    if start.is_null() || length.is_null() {
        return false;
    }
    guarded("GetInputSelection", false, || {
        let (selection_start, selection_length) = soft_input().get_input_selection();
        unsafe {
            *start = selection_start;
            *length = selection_length;
        }
        true
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn SetCharacterLimit(limit: i32) {
    guarded("SetCharacterLimit", (), || {
        soft_input().set_character_limit(limit)
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn SetHideInputField(hidden: bool) {
    guarded("SetHideInputField", (), || {
        soft_input().set_hide_input_field(hidden)
    });
}

/// # Safety
/// All pointers must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn GetInputArea(
    visible: *mut bool,
    x: *mut i32,
    y: *mut i32,
    width: *mut i32,
    height: *mut i32,
) -> bool {
    if visible.is_null() || x.is_null() || y.is_null() || width.is_null() || height.is_null() {
        return false;
    }
    guarded("GetInputArea", false, || {
        let area = match soft_input().get_input_area() {
            Ok(area) => area,
            Err(e) => {
                log::warn!("Ffi: GetInputArea failed: {e}");
                return false;
            }
        };
        unsafe {
            *visible = area.visible;
            *x = area.x;
            *y = area.y;
            *width = area.width;
            *height = area.height;
        }
        true
    })
}

/// # Safety
/// `active` and `canceled` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn GetSoftInputState(active: *mut bool, canceled: *mut bool) -> bool {
    if active.is_null() || canceled.is_null() {
        return false;
    }
    guarded("GetSoftInputState", false, || {
        let (is_active, is_canceled) = soft_input().get_soft_input_state();
        unsafe {
            *active = is_active;
            *canceled = is_canceled;
        }
        true
    })
}
