/*
 * The host-facing soft input session.
 *
 * `SoftInput` owns the shared input state and the dialog thread controller,
 * and is constructed with the platform `DialogFactory` it should use. Every
 * accessor is a short, synchronous call: it either reads or writes the shared
 * state under its lock, or hands a command to the live dialog through its
 * port. Only `show_soft_input` and `hide_soft_input` block, while the dialog
 * thread starts up or shuts down.
 */

use crate::core::config::SoftInputConfig;
use crate::core::dialog_template::{TemplateSpec, encode_dialog_template};
use crate::core::geometry::{DialogLayout, InputArea};
use crate::core::models::{FieldFlags, OwnerWindow, SelectionRange};
use crate::error::Result;
use crate::platform_layer::backend::DialogFactory;
use crate::platform_layer::dialog_handler::DialogMessageHandler;
use crate::platform_layer::dialog_thread::DialogThreadController;
use crate::platform_layer::shared_state::{SessionStart, SharedInputState};
use crate::platform_layer::types::{EditFieldState, EditFieldUpdate, HostCommand, SessionEnd};

use std::sync::{Arc, Mutex, MutexGuard};

/*
 * Parameters of one `show_soft_input` call. `correction` and `placeholder`
 * are carried for API compatibility with hosts that send them but have no
 * effect on the dialog; only the number pad input type changes behavior.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowRequest {
    pub owner: OwnerWindow,
    pub text: Vec<u16>,
    pub input_type: i32,
    pub correction: bool,
    pub multiline: bool,
    pub secure: bool,
    pub placeholder: Vec<u16>,
    pub character_limit: u32,
    pub hidden: bool,
    pub selection_start: i32,
    pub selection_length: i32,
}

impl ShowRequest {
    pub fn new(owner: OwnerWindow, text: &str) -> Self {
        Self::from_utf16(owner, text.encode_utf16().collect())
    }

    pub fn from_utf16(owner: OwnerWindow, text: Vec<u16>) -> Self {
        ShowRequest {
            owner,
            text,
            input_type: 0,
            correction: false,
            multiline: false,
            secure: false,
            placeholder: Vec::new(),
            character_limit: 0,
            hidden: false,
            selection_start: 0,
            selection_length: 0,
        }
    }

    pub fn input_type(mut self, input_type: i32) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn correction(mut self, correction: bool) -> Self {
        self.correction = correction;
        self
    }

    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.encode_utf16().collect();
        self
    }

    /// Negative limits are treated as 0 (no limit).
    pub fn character_limit(mut self, limit: i32) -> Self {
        self.character_limit = limit.max(0) as u32;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn selection(mut self, start: i32, length: i32) -> Self {
        self.selection_start = start;
        self.selection_length = length;
        self
    }

    fn field_flags(&self) -> FieldFlags {
        FieldFlags::from_input_type(self.input_type, self.multiline, self.secure, self.hidden)
    }
}

pub struct SoftInput {
    factory: Arc<dyn DialogFactory>,
    config: SoftInputConfig,
    shared: Arc<SharedInputState>,
    controller: Mutex<DialogThreadController>,
}

impl SoftInput {
    pub fn new(factory: Arc<dyn DialogFactory>) -> Self {
        Self::with_config(factory, SoftInputConfig::default())
    }

    pub fn with_config(factory: Arc<dyn DialogFactory>, config: SoftInputConfig) -> Self {
        let shared = Arc::new(SharedInputState::new());
        SoftInput {
            factory,
            config,
            controller: Mutex::new(DialogThreadController::new(Arc::clone(&shared))),
            shared,
        }
    }

    pub fn config(&self) -> &SoftInputConfig {
        &self.config
    }

    fn lock_controller(&self) -> MutexGuard<'_, DialogThreadController> {
        self.controller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /*
     * Starts a new session and returns its generation once the dialog is up.
     *
     * A session that is still running is ended first and reported as
     * canceled. The dialog template is fully built before the new session is
     * recorded, so a failure there leaves no session active.
     */
    pub fn show_soft_input(&self, request: ShowRequest) -> Result<u64> {
        let mut controller = self.lock_controller();
        controller.stop_and_delete();

        let flags = request.field_flags();
        log::debug!(
            "SoftInput: Show requested for owner {:#x} ({} text units, flags {:?}, limit {}).",
            request.owner.0,
            request.text.len(),
            flags,
            request.character_limit
        );

        let metrics = self.factory.owner_metrics(request.owner)?;
        let units = self.factory.base_units();
        let layout = DialogLayout::compute(
            metrics.client_width,
            metrics.client_height,
            units,
            self.config.layout_metrics(),
        );
        let font = self.config.template_font();
        let template = encode_dialog_template(&TemplateSpec {
            layout,
            title: &self.config.title,
            ok_caption: &self.config.ok_caption,
            cancel_caption: &self.config.cancel_caption,
            font: font.as_ref(),
            flags,
            initial_text: &request.text,
        })?;
        let edit_geometry = template.layout().edit_pixels(units);

        let owner = request.owner;
        let generation = self.shared.begin_session(SessionStart {
            owner,
            text: template.initial_text().to_vec(),
            flags,
            selection_start: request.selection_start,
            selection_length: request.selection_length,
            character_limit: request.character_limit,
        });

        let factory = Arc::clone(&self.factory);
        let shared = Arc::clone(&self.shared);
        let started = controller.start_dialog(generation, move |signal| {
            let handler = DialogMessageHandler::new(shared, generation, edit_geometry, signal);
            factory.run_modal(owner, &template, handler).map(|_| ())
        });
        if let Err(e) = started {
            log::error!("SoftInput: Session {generation} failed to start: {e}");
            return Err(e);
        }
        log::info!("SoftInput: Session {generation} started.");
        Ok(generation)
    }

    /// Ends the running session as canceled and waits for the dialog to close.
    /// Does nothing if no session is running.
    pub fn hide_soft_input(&self) {
        log::debug!("SoftInput: Hiding soft input.");
        self.lock_controller().stop_and_delete();
    }

    /// Replaces the session text, and the live control's content if a dialog is up.
    pub fn set_soft_input_string(&self, text: &[u16]) {
        if let Some(link) = self.shared.replace_text(text) {
            link.port.write_text(text);
        }
    }

    /*
     * Returns the session text and whether it changed since the previous call.
     * While a dialog is live, its edit control is the source of truth: a
     * differing live text replaces the stored copy and reports `true` once.
     */
    pub fn get_soft_input_string(&self) -> (Vec<u16>, bool) {
        match self.shared.live_link() {
            Some(link) => {
                let live = link.port.read_text();
                self.shared.sync_live_text(link.generation, live)
            }
            None => (self.shared.text(), false),
        }
    }

    /// Selects `length` code units from `start` in the live control. The stored
    /// selection follows once the dialog thread has applied it.
    pub fn set_input_selection(&self, start: i32, length: i32) {
        let Some(link) = self.shared.live_link() else {
            log::trace!("SoftInput: set_input_selection with no live dialog; ignoring.");
            return;
        };
        link.port
            .post(HostCommand::SetSelection(SelectionRange::from_host(start, length)));
    }

    /// The last selection captured from the control, as `(start, length)`.
    pub fn get_input_selection(&self) -> (i32, i32) {
        self.shared.selection().as_start_length()
    }

    /// Negative limits are treated as 0 (no limit).
    pub fn set_character_limit(&self, limit: i32) {
        let limit = limit.max(0) as u32;
        if let Some(link) = self.shared.set_character_limit(limit) {
            link.port.post(HostCommand::SetCharacterLimit(limit));
        }
    }

    pub fn character_limit(&self) -> u32 {
        self.shared.character_limit()
    }

    /// Moves the edit control out of sight, or back, while the dialog stays up.
    pub fn set_hide_input_field(&self, hidden: bool) {
        if let Some(link) = self.shared.live_link() {
            link.port.post(HostCommand::SetFieldHidden(hidden));
        }
    }

    pub fn field_flags(&self) -> FieldFlags {
        self.shared.flags()
    }

    /// The dialog's area in the owner's client coordinates, Y measured from the bottom.
    pub fn get_input_area(&self) -> Result<InputArea> {
        let Some(link) = self.shared.live_link() else {
            return Ok(InputArea::HIDDEN);
        };
        let Some(dialog_rect) = link.port.window_rect() else {
            return Ok(InputArea::HIDDEN);
        };
        let metrics = self.factory.owner_metrics(self.shared.owner())?;
        Ok(InputArea::from_dialog_rect(&metrics, &dialog_rect))
    }

    /// `(active, canceled)` of the current or most recent session.
    pub fn get_soft_input_state(&self) -> (bool, bool) {
        self.shared.state()
    }

    pub fn last_session_end(&self) -> Option<SessionEnd> {
        self.shared.last_end()
    }

    /*
     * One frame of host-side edit field bookkeeping: pulls the text, then
     * classifies the frame. An ended session reports `EditFinished` or
     * `EditCanceled` on every poll until a new session starts.
     */
    pub fn poll_edit_field(&self) -> EditFieldUpdate {
        let (text, updated) = self.get_soft_input_string();
        let (active, canceled) = self.get_soft_input_state();
        let state = if !active {
            if canceled {
                EditFieldState::EditCanceled
            } else {
                EditFieldState::EditFinished
            }
        } else if updated {
            EditFieldState::TextUpdated
        } else {
            EditFieldState::None
        };
        let (selection_start, selection_length) = self.get_input_selection();
        EditFieldUpdate {
            state,
            text,
            selection_start,
            selection_length,
        }
    }
}

impl Drop for SoftInput {
    fn drop(&mut self) {
        self.lock_controller().stop_and_delete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::headless::HeadlessDialogFactory;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_show_request_builder() {
        let request = ShowRequest::new(OwnerWindow(3), "42")
            .input_type(crate::core::models::NUMBER_PAD_INPUT_TYPE)
            .secure(true)
            .character_limit(-5)
            .selection(1, 1);
        let flags = request.field_flags();
        assert!(flags.numeric && flags.secure && !flags.multiline);
        assert_eq!(request.character_limit, 0);
        assert_eq!((request.selection_start, request.selection_length), (1, 1));
    }

    #[test]
    fn test_null_owner_fails_without_starting_a_session() {
        let soft_input = SoftInput::new(Arc::new(HeadlessDialogFactory::default()));
        assert!(soft_input.show_soft_input(ShowRequest::new(OwnerWindow(0), "x")).is_err());
        assert_eq!(soft_input.get_soft_input_state(), (false, false));
        assert_eq!(soft_input.last_session_end(), None);
    }

    #[test]
    fn test_text_is_cut_at_embedded_null() {
        let soft_input = SoftInput::new(Arc::new(HeadlessDialogFactory::default()));
        let mut text = wide("ab");
        text.push(0);
        text.extend(wide("cd"));
        soft_input
            .show_soft_input(ShowRequest::from_utf16(OwnerWindow(1), text))
            .unwrap();
        assert_eq!(soft_input.get_soft_input_string(), (wide("ab"), false));
        soft_input.hide_soft_input();
    }

    #[test]
    fn test_poll_reports_lifecycle() {
        let factory = Arc::new(HeadlessDialogFactory::default());
        let user = factory.user();
        let soft_input = SoftInput::new(factory);
        soft_input
            .show_soft_input(ShowRequest::new(OwnerWindow(1), "a").selection(1, 0))
            .unwrap();

        assert_eq!(soft_input.poll_edit_field().state, EditFieldState::None);
        assert!(user.type_text("b"));
        let update = soft_input.poll_edit_field();
        assert_eq!(update.state, EditFieldState::TextUpdated);
        assert_eq!(update.text, wide("ab"));
        assert!(user.click_ok());
        assert_eq!(soft_input.poll_edit_field().state, EditFieldState::EditFinished);
    }

    #[test]
    fn test_set_string_reaches_live_control() {
        let factory = Arc::new(HeadlessDialogFactory::default());
        let user = factory.user();
        let soft_input = SoftInput::new(factory);
        soft_input
            .show_soft_input(ShowRequest::new(OwnerWindow(1), "old"))
            .unwrap();

        soft_input.set_soft_input_string(&wide("new"));
        assert_eq!(user.edit_text().as_deref(), Some("new"));
        assert_eq!(soft_input.get_soft_input_string(), (wide("new"), false));
        soft_input.hide_soft_input();
        assert_eq!(soft_input.get_soft_input_state(), (false, true));
    }
}
