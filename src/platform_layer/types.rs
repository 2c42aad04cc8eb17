/*
 * Data types exchanged between the host-facing session, the dialog message
 * handler and the platform backends: the events a backend feeds into the
 * handler, the commands the host posts into a running dialog, and the
 * bookkeeping records for session endings.
 */

use super::backend::DialogPort;
use crate::core::models::SelectionRange;

use std::sync::Arc;

/// The two buttons of the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogButton {
    Ok,
    Cancel,
}

/*
 * Commands posted by the host into a running dialog. They are queued and
 * processed on the dialog thread in posting order; the host does not wait
 * for them.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    SetSelection(SelectionRange),
    SetCharacterLimit(u32),
    SetFieldHidden(bool),
    Close,
}

/// Events a backend delivers to the `DialogMessageHandler`.
pub enum DialogEvent {
    /// The dialog and its controls exist; `port` is the host's way in.
    Initialize { port: Arc<dyn DialogPort> },
    /// One of the buttons was activated (Enter and Escape map here too).
    Command(DialogButton),
    /// The edit control gained focus or was painted; a good moment to read the selection.
    SelectionProbe,
    /// A command posted by the host.
    Host(HostCommand),
}

impl std::fmt::Debug for DialogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogEvent::Initialize { .. } => write!(f, "Initialize"),
            DialogEvent::Command(button) => write!(f, "Command({button:?})"),
            DialogEvent::SelectionProbe => write!(f, "SelectionProbe"),
            DialogEvent::Host(command) => write!(f, "Host({command:?})"),
        }
    }
}

/// Whether the handler consumed an event (maps to the dialog procedure's TRUE/FALSE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Handled,
    NotHandled,
}

/// Result codes passed to `LiveDialog::end`.
pub const DIALOG_RESULT_OK: isize = 1;
pub const DIALOG_RESULT_CANCEL: isize = 2;
pub const DIALOG_RESULT_CLOSED: isize = 0;

/// How and when a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnd {
    pub generation: u64,
    pub canceled: bool,
}

/// Per-frame classification of the edit field, as the host integration sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditFieldState {
    None,
    TextUpdated,
    EditFinished,
    EditCanceled,
}

/// What `SoftInput::poll_edit_field` reports for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFieldUpdate {
    pub state: EditFieldState,
    pub text: Vec<u16>,
    pub selection_start: i32,
    pub selection_length: i32,
}
