/*
 * The platform side of the soft input dialog: the backend seam, the shared
 * session state, the dialog thread and its message handler, and the
 * concrete backends (native Win32 on Windows, headless everywhere).
 */
pub mod backend;
pub mod dialog_handler;
pub(crate) mod dialog_thread;
pub mod headless;
pub(crate) mod shared_state;
pub mod types;
#[cfg(target_os = "windows")]
pub mod win32_dialog;

pub use backend::{DialogFactory, DialogPort, LiveDialog};
pub use dialog_handler::DialogMessageHandler;
pub use headless::{HeadlessDialogFactory, HeadlessSnapshot, HeadlessUser};
pub use types::{
    DialogButton, DialogEvent, EditFieldState, EditFieldUpdate, EventDisposition, HostCommand,
    SessionEnd,
};
#[cfg(target_os = "windows")]
pub use win32_dialog::Win32DialogFactory;

use std::sync::Arc;

/// The backend used when the host does not inject one.
pub fn default_factory() -> Arc<dyn DialogFactory> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(Win32DialogFactory::new())
    }
    #[cfg(not(target_os = "windows"))]
    {
        log::debug!("Platform: No native dialog backend on this platform; using the headless one.");
        Arc::new(HeadlessDialogFactory::default())
    }
}
