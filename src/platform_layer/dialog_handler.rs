/*
 * The message handler of the soft input dialog. Backends translate native
 * messages into `DialogEvent`s and pass them here together with a
 * `LiveDialog`; the handler applies them to the controls and to the shared
 * input session.
 *
 * Every terminal transition (OK, Cancel, a close request from the host) ends
 * the modal loop and clears the live link in one critical section on the
 * shared state, so the host never observes a half-finished session.
 */

use super::backend::LiveDialog;
use super::dialog_thread::StartSignal;
use super::shared_state::SharedInputState;
use super::types::{
    DIALOG_RESULT_CANCEL, DIALOG_RESULT_CLOSED, DIALOG_RESULT_OK, DialogButton, DialogEvent,
    EventDisposition, HostCommand,
};
use crate::core::geometry::PixelRect;
use crate::core::models::SelectionRange;

use std::sync::Arc;

pub struct DialogMessageHandler {
    shared: Arc<SharedInputState>,
    generation: u64,
    edit_geometry: PixelRect,
    started: Arc<StartSignal>,
    finished: bool,
}

impl DialogMessageHandler {
    pub(crate) fn new(
        shared: Arc<SharedInputState>,
        generation: u64,
        edit_geometry: PixelRect,
        started: Arc<StartSignal>,
    ) -> Self {
        DialogMessageHandler {
            shared,
            generation,
            edit_geometry,
            started,
            finished: false,
        }
    }

    /// The pixel rectangle the edit control occupies when it is not hidden.
    pub fn edit_geometry(&self) -> PixelRect {
        self.edit_geometry
    }

    /// True once a terminal event has ended the dialog.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn handle_event(
        &mut self,
        event: DialogEvent,
        dialog: &mut dyn LiveDialog,
    ) -> EventDisposition {
        if self.finished {
            log::trace!("DialogHandler: Ignoring {event:?} after the dialog ended.");
            return EventDisposition::NotHandled;
        }
        match event {
            DialogEvent::Initialize { port } => {
                if !self.shared.publish_link(self.generation, port) {
                    log::warn!(
                        "DialogHandler: Session {} was superseded before its dialog initialised.",
                        self.generation
                    );
                    self.end(dialog, true, DIALOG_RESULT_CLOSED);
                    self.started.notify_failed("session superseded during start".to_string());
                    return EventDisposition::Handled;
                }
                if let Some(settings) = self.shared.control_settings(self.generation) {
                    dialog.set_character_limit(settings.character_limit);
                    dialog.set_edit_selection(settings.selection);
                    self.apply_field_hidden(dialog, settings.hidden);
                }
                log::debug!("DialogHandler: Dialog for session {} initialised.", self.generation);
                self.started.notify_started();
                // Focus was set explicitly above.
                EventDisposition::NotHandled
            }
            DialogEvent::Command(DialogButton::Ok) => {
                let text = dialog.edit_text();
                log::debug!(
                    "DialogHandler: OK pressed in session {} ({} text units).",
                    self.generation,
                    text.len()
                );
                self.finish(dialog, false, Some(text), DIALOG_RESULT_OK);
                EventDisposition::Handled
            }
            DialogEvent::Command(DialogButton::Cancel) => {
                log::debug!("DialogHandler: Cancel pressed in session {}.", self.generation);
                self.finish(dialog, true, None, DIALOG_RESULT_CANCEL);
                EventDisposition::Handled
            }
            DialogEvent::SelectionProbe => {
                self.capture_selection(dialog);
                EventDisposition::NotHandled
            }
            DialogEvent::Host(command) => {
                self.handle_host_command(command, dialog);
                EventDisposition::Handled
            }
        }
    }

    fn handle_host_command(&mut self, command: HostCommand, dialog: &mut dyn LiveDialog) {
        log::trace!("DialogHandler: Host command {command:?}");
        match command {
            HostCommand::SetSelection(selection) => {
                dialog.set_edit_selection(selection);
                self.capture_selection(dialog);
            }
            HostCommand::SetCharacterLimit(limit) => dialog.set_character_limit(limit),
            HostCommand::SetFieldHidden(hidden) => self.apply_field_hidden(dialog, hidden),
            HostCommand::Close => {
                log::debug!("DialogHandler: Host closed session {}.", self.generation);
                self.finish(dialog, true, None, DIALOG_RESULT_CLOSED);
            }
        }
    }

    fn capture_selection(&self, dialog: &mut dyn LiveDialog) {
        let selection: SelectionRange = dialog.edit_selection();
        self.shared.store_selection(self.generation, selection);
    }

    // Hidden moves the edit control to a zero rectangle; the dialog stays up.
    fn apply_field_hidden(&self, dialog: &mut dyn LiveDialog, hidden: bool) {
        if hidden {
            dialog.move_edit(PixelRect::ZERO);
        } else {
            dialog.move_edit(self.edit_geometry);
        }
        dialog.focus_edit();
    }

    fn finish(
        &mut self,
        dialog: &mut dyn LiveDialog,
        canceled: bool,
        final_text: Option<Vec<u16>>,
        result: isize,
    ) {
        if !self.shared.finish_session(self.generation, canceled, final_text) {
            log::debug!(
                "DialogHandler: Session {} had already ended; closing its dialog only.",
                self.generation
            );
        }
        self.end(dialog, canceled, result);
    }

    fn end(&mut self, dialog: &mut dyn LiveDialog, canceled: bool, result: isize) {
        self.finished = true;
        log::trace!(
            "DialogHandler: Ending dialog of session {} (canceled: {canceled}).",
            self.generation
        );
        dialog.end(result);
    }
}
