/*
 * The input session shared between the host's threads and the dialog thread.
 *
 * A single mutex guards the text, selection, limit, flags and active/canceled
 * status, and also the link to the live dialog. The link is published by the
 * dialog thread on initialisation and cleared on every terminal transition
 * under the same lock, so a reader either sees a live dialog together with
 * its session generation or sees none at all.
 *
 * The lock is never held while calling into a `DialogPort` or `LiveDialog`;
 * callers copy what they need out, release, and call the backend afterwards.
 */

use super::backend::DialogPort;
use super::types::SessionEnd;
use crate::core::models::{FieldFlags, OwnerWindow, SelectionRange};

use std::sync::{Arc, Mutex, MutexGuard};

/// The live dialog of one session.
#[derive(Clone)]
pub(crate) struct DialogLink {
    pub(crate) generation: u64,
    pub(crate) port: Arc<dyn DialogPort>,
}

/// What the host asks for when a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionStart {
    pub(crate) owner: OwnerWindow,
    pub(crate) text: Vec<u16>,
    pub(crate) flags: FieldFlags,
    pub(crate) selection_start: i32,
    pub(crate) selection_length: i32,
    pub(crate) character_limit: u32,
}

/// Settings pushed onto the edit control once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ControlSettings {
    pub(crate) character_limit: u32,
    pub(crate) selection: SelectionRange,
    pub(crate) hidden: bool,
}

#[derive(Default)]
struct InputSession {
    text: Vec<u16>,
    selection: SelectionRange,
    character_limit: u32,
    flags: FieldFlags,
    owner: OwnerWindow,
    active: bool,
    canceled: bool,
    generation: u64,
    link: Option<DialogLink>,
    last_end: Option<SessionEnd>,
}

impl InputSession {
    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    // Every text replacement goes through here so the selection never points past the end.
    fn set_text(&mut self, text: Vec<u16>) {
        self.text = text;
        self.selection = self.selection.clamped_to(self.text.len());
    }

    fn live_link(&self) -> Option<&DialogLink> {
        self.link
            .as_ref()
            .filter(|link| link.generation == self.generation)
    }
}

#[derive(Default)]
pub(crate) struct SharedInputState {
    session: Mutex<InputSession>,
}

impl SharedInputState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InputSession> {
        // A panic on another thread must not take the host down with it; the
        // session fields are always left in a consistent state between writes.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resets the session for a new dialog and returns its generation.
    pub(crate) fn begin_session(&self, start: SessionStart) -> u64 {
        let mut session = self.lock();
        session.generation += 1;
        session.selection = SelectionRange::from_start_length(
            start.selection_start,
            start.selection_length,
            start.text.len(),
        );
        session.text = start.text;
        session.flags = start.flags;
        session.character_limit = start.character_limit;
        session.owner = start.owner;
        session.active = true;
        session.canceled = false;
        session.link = None;
        session.generation
    }

    /// Publishes the live dialog of `generation`. Returns false if that
    /// session is no longer the current one or has already ended.
    pub(crate) fn publish_link(&self, generation: u64, port: Arc<dyn DialogPort>) -> bool {
        let mut session = self.lock();
        if !session.is_current(generation) || !session.active {
            return false;
        }
        session.link = Some(DialogLink { generation, port });
        true
    }

    /*
     * Ends session `generation`: clears the link, marks it inactive and
     * records whether it was canceled. `final_text` (the OK path) replaces the
     * stored text in the same critical section. Returns false if the session
     * had already ended or was superseded, in which case nothing changes.
     */
    pub(crate) fn finish_session(
        &self,
        generation: u64,
        canceled: bool,
        final_text: Option<Vec<u16>>,
    ) -> bool {
        let mut session = self.lock();
        if !session.is_current(generation) || !session.active {
            return false;
        }
        if let Some(text) = final_text {
            session.set_text(text);
        }
        session.link = None;
        session.active = false;
        session.canceled = canceled;
        session.last_end = Some(SessionEnd {
            generation,
            canceled,
        });
        true
    }

    pub(crate) fn live_link(&self) -> Option<DialogLink> {
        self.lock().live_link().cloned()
    }

    pub(crate) fn live_link_for(&self, generation: u64) -> Option<DialogLink> {
        self.lock()
            .live_link()
            .filter(|link| link.generation == generation)
            .cloned()
    }

    pub(crate) fn owner(&self) -> OwnerWindow {
        self.lock().owner
    }

    pub(crate) fn control_settings(&self, generation: u64) -> Option<ControlSettings> {
        let session = self.lock();
        if !session.is_current(generation) {
            return None;
        }
        Some(ControlSettings {
            character_limit: session.character_limit,
            selection: session.selection,
            hidden: session.flags.hidden,
        })
    }

    /// Replaces the stored text wholesale and returns the live link, if any.
    pub(crate) fn replace_text(&self, text: &[u16]) -> Option<DialogLink> {
        let mut session = self.lock();
        session.set_text(text.to_vec());
        session.live_link().cloned()
    }

    /// Compares `live` against the stored copy of session `generation` and
    /// adopts it if it differs. Returns the current text and whether it changed.
    pub(crate) fn sync_live_text(&self, generation: u64, live: Option<Vec<u16>>) -> (Vec<u16>, bool) {
        let mut session = self.lock();
        let mut updated = false;
        if let Some(live) = live {
            let still_live = session.live_link().is_some() && session.is_current(generation);
            if still_live && live != session.text {
                session.set_text(live);
                updated = true;
            }
        }
        (session.text.clone(), updated)
    }

    pub(crate) fn text(&self) -> Vec<u16> {
        self.lock().text.clone()
    }

    pub(crate) fn store_selection(&self, generation: u64, selection: SelectionRange) {
        let mut session = self.lock();
        if session.is_current(generation) {
            session.selection = selection.clamped_to(session.text.len());
        }
    }

    pub(crate) fn selection(&self) -> SelectionRange {
        self.lock().selection
    }

    pub(crate) fn set_character_limit(&self, limit: u32) -> Option<DialogLink> {
        let mut session = self.lock();
        session.character_limit = limit;
        session.live_link().cloned()
    }

    pub(crate) fn character_limit(&self) -> u32 {
        self.lock().character_limit
    }

    pub(crate) fn flags(&self) -> FieldFlags {
        self.lock().flags
    }

    /// `(active, canceled)`.
    pub(crate) fn state(&self) -> (bool, bool) {
        let session = self.lock();
        (session.active, session.canceled)
    }

    pub(crate) fn last_end(&self) -> Option<SessionEnd> {
        self.lock().last_end
    }
}
