/*
 * A soft (on-screen) text input overlay for desktop hosts: a small modal
 * dialog with an edit field and OK/Cancel buttons, run on its own thread and
 * laid out along the bottom of the host's window. Hosts drive it through
 * `SoftInput` from Rust or through the C exports in `ffi`.
 */
pub mod core;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod platform_layer;
pub mod soft_input;

pub use error::{Result, SoftInputError};
pub use logging::initialize_logging;
pub use soft_input::{ShowRequest, SoftInput};
