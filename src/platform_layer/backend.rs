/*
 * The seam between the soft input session and a concrete windowing system.
 *
 * A `DialogFactory` knows how to measure the owner window and how to run the
 * modal dialog on the calling thread. While the dialog runs, the backend
 * hands the message handler a `LiveDialog` (the dialog thread's view of the
 * controls) with every event, and publishes a `DialogPort` (the host's view)
 * on initialisation.
 */

use super::dialog_handler::DialogMessageHandler;
use super::types::HostCommand;
use crate::core::dialog_template::DialogTemplate;
use crate::core::geometry::{DialogBaseUnits, OwnerMetrics, PixelRect, ScreenRect};
use crate::core::models::{OwnerWindow, SelectionRange};
use crate::error::Result;

pub trait DialogFactory: Send + Sync {
    fn base_units(&self) -> DialogBaseUnits;

    fn owner_metrics(&self, owner: OwnerWindow) -> Result<OwnerMetrics>;

    /// Runs the dialog to completion on the calling thread, driving `handler`.
    /// Returns the value the dialog was ended with.
    fn run_modal(
        &self,
        owner: OwnerWindow,
        template: &DialogTemplate,
        handler: DialogMessageHandler,
    ) -> Result<isize>;
}

/// Operations on the live controls. Only ever called on the dialog thread.
pub trait LiveDialog {
    fn edit_text(&self) -> Vec<u16>;
    fn edit_selection(&self) -> SelectionRange;
    fn set_edit_selection(&mut self, selection: SelectionRange);
    fn set_character_limit(&mut self, limit: u32);
    fn move_edit(&mut self, rect: PixelRect);
    fn focus_edit(&mut self);
    fn end(&mut self, result: isize);
}

/*
 * The host's handle on a running dialog. Reads and text writes are
 * synchronous; everything else is posted to the dialog thread. All methods
 * tolerate a dialog that has already gone away.
 */
pub trait DialogPort: Send + Sync {
    /// Current content of the edit control, or `None` if it no longer exists.
    fn read_text(&self) -> Option<Vec<u16>>;

    /// Replaces the content of the edit control.
    fn write_text(&self, text: &[u16]);

    /// The dialog window's rectangle in screen coordinates.
    fn window_rect(&self) -> Option<ScreenRect>;

    /// Queues a command for the dialog thread. Returns false if the dialog is gone.
    fn post(&self, command: HostCommand) -> bool;

    /// Asks the dialog to end as canceled.
    fn request_close(&self) -> bool {
        self.post(HostCommand::Close)
    }
}
