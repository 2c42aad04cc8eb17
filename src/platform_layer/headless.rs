/*
 * A windowless dialog backend. It runs the same modal loop shape as the
 * native one (a queue drained on the dialog thread until the handler ends the
 * dialog) against an in-memory edit control, so sessions can be driven on any
 * platform. `HeadlessUser` plays the part of the person at the keyboard.
 */

use super::backend::{DialogFactory, DialogPort, LiveDialog};
use super::dialog_handler::DialogMessageHandler;
use super::types::{DialogButton, DialogEvent, HostCommand};
use crate::core::dialog_template::{DialogTemplate, ES_NUMBER};
use crate::core::geometry::{DialogBaseUnits, OwnerMetrics, PixelRect, ScreenRect};
use crate::core::models::{OwnerWindow, SelectionRange};
use crate::error::{Result, SoftInputError};

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct HeadlessControl {
    text: Vec<u16>,
    selection: SelectionRange,
    limit: u32,
    numeric: bool,
    rect: PixelRect,
    dialog_rect: ScreenRect,
    alive: bool,
}

impl HeadlessControl {
    // Replaces the selection with `input`, honoring the limit and the digit filter.
    fn type_text(&mut self, input: &[u16]) -> bool {
        if self.numeric
            && input
                .iter()
                .any(|&unit| !(u16::from(b'0')..=u16::from(b'9')).contains(&unit))
        {
            return false;
        }
        let selection = self.selection.clamped_to(self.text.len());
        let start = selection.start as usize;
        let end = selection.end as usize;
        let remaining = self.text.len() - (end - start);
        let room = if self.limit == 0 {
            usize::MAX
        } else {
            (self.limit as usize).saturating_sub(remaining)
        };
        let accepted = &input[..input.len().min(room)];
        if accepted.is_empty() && !input.is_empty() {
            return false;
        }
        self.text.splice(start..end, accepted.iter().copied());
        let caret = (start + accepted.len()) as u32;
        self.selection = SelectionRange::new(caret, caret);
        accepted.len() == input.len()
    }
}

fn lock_control(control: &Mutex<HeadlessControl>) -> MutexGuard<'_, HeadlessControl> {
    control
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
enum UserAction {
    Type(Vec<u16>),
    Click(DialogButton),
    Select(SelectionRange),
    FocusEdit,
    Sync,
}

/// What the dialog looked like right after a user action was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessSnapshot {
    pub accepted: bool,
    pub text: Vec<u16>,
    pub selection: SelectionRange,
    pub edit_rect: PixelRect,
}

enum HeadlessMessage {
    Host(HostCommand),
    User(UserAction, Sender<HeadlessSnapshot>),
}

struct HeadlessHub {
    sender: Sender<HeadlessMessage>,
}

type SharedHub = Arc<Mutex<Option<HeadlessHub>>>;

fn lock_hub(hub: &Mutex<Option<HeadlessHub>>) -> MutexGuard<'_, Option<HeadlessHub>> {
    hub.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct HeadlessPort {
    sender: Sender<HeadlessMessage>,
    control: Arc<Mutex<HeadlessControl>>,
}

impl DialogPort for HeadlessPort {
    fn read_text(&self) -> Option<Vec<u16>> {
        let control = lock_control(&self.control);
        control.alive.then(|| control.text.clone())
    }

    fn write_text(&self, text: &[u16]) {
        let mut control = lock_control(&self.control);
        if control.alive {
            control.text = text.to_vec();
            let len = control.text.len();
            control.selection = control.selection.clamped_to(len);
        }
    }

    fn window_rect(&self) -> Option<ScreenRect> {
        let control = lock_control(&self.control);
        control.alive.then_some(control.dialog_rect)
    }

    fn post(&self, command: HostCommand) -> bool {
        self.sender.send(HeadlessMessage::Host(command)).is_ok()
    }
}

struct HeadlessLive {
    control: Arc<Mutex<HeadlessControl>>,
    ended: Option<isize>,
}

impl LiveDialog for HeadlessLive {
    fn edit_text(&self) -> Vec<u16> {
        lock_control(&self.control).text.clone()
    }

    fn edit_selection(&self) -> SelectionRange {
        lock_control(&self.control).selection
    }

    fn set_edit_selection(&mut self, selection: SelectionRange) {
        let mut control = lock_control(&self.control);
        control.selection = selection.clamped_to(control.text.len());
    }

    fn set_character_limit(&mut self, limit: u32) {
        lock_control(&self.control).limit = limit;
    }

    fn move_edit(&mut self, rect: PixelRect) {
        lock_control(&self.control).rect = rect;
    }

    fn focus_edit(&mut self) {}

    fn end(&mut self, result: isize) {
        self.ended = Some(result);
    }
}

/// Runs soft input dialogs without a windowing system.
pub struct HeadlessDialogFactory {
    metrics: OwnerMetrics,
    units: DialogBaseUnits,
    hub: SharedHub,
}

impl HeadlessDialogFactory {
    pub fn new(metrics: OwnerMetrics, units: DialogBaseUnits) -> Self {
        HeadlessDialogFactory {
            metrics,
            units,
            hub: Arc::new(Mutex::new(None)),
        }
    }

    /// A driver for whichever dialog this factory is currently running.
    pub fn user(&self) -> HeadlessUser {
        HeadlessUser {
            hub: Arc::clone(&self.hub),
        }
    }

    fn dialog_screen_rect(&self, template: &DialogTemplate) -> ScreenRect {
        let dialog = template.layout().dialog_pixels(self.units);
        let left = self.metrics.origin_x + dialog.x;
        let top = self.metrics.origin_y + dialog.y;
        ScreenRect {
            left,
            top,
            right: left + dialog.width,
            bottom: top + dialog.height,
        }
    }

    fn pump(
        &self,
        receiver: &Receiver<HeadlessMessage>,
        handler: &mut DialogMessageHandler,
        live: &mut HeadlessLive,
    ) {
        while live.ended.is_none() {
            let Ok(message) = receiver.recv() else {
                log::warn!("HeadlessDialog: Message queue closed while the dialog was running.");
                break;
            };
            match message {
                HeadlessMessage::Host(command) => {
                    handler.handle_event(DialogEvent::Host(command), live);
                }
                HeadlessMessage::User(action, ack) => {
                    let accepted = self.apply_user_action(action, handler, live);
                    let control = lock_control(&live.control);
                    // The user may have given up waiting.
                    let _ = ack.send(HeadlessSnapshot {
                        accepted,
                        text: control.text.clone(),
                        selection: control.selection,
                        edit_rect: control.rect,
                    });
                }
            }
        }
    }

    fn apply_user_action(
        &self,
        action: UserAction,
        handler: &mut DialogMessageHandler,
        live: &mut HeadlessLive,
    ) -> bool {
        log::trace!("HeadlessDialog: User action {action:?}");
        match action {
            UserAction::Type(input) => lock_control(&live.control).type_text(&input),
            UserAction::Click(button) => {
                handler.handle_event(DialogEvent::Command(button), live);
                true
            }
            UserAction::Select(selection) => {
                live.set_edit_selection(selection);
                handler.handle_event(DialogEvent::SelectionProbe, live);
                true
            }
            UserAction::FocusEdit => {
                handler.handle_event(DialogEvent::SelectionProbe, live);
                true
            }
            UserAction::Sync => true,
        }
    }
}

impl Default for HeadlessDialogFactory {
    fn default() -> Self {
        HeadlessDialogFactory::new(
            OwnerMetrics {
                client_width: 800,
                client_height: 600,
                origin_x: 100,
                origin_y: 100,
            },
            DialogBaseUnits::default(),
        )
    }
}

impl DialogFactory for HeadlessDialogFactory {
    fn base_units(&self) -> DialogBaseUnits {
        self.units
    }

    fn owner_metrics(&self, owner: OwnerWindow) -> Result<OwnerMetrics> {
        if owner.is_null() {
            return Err(SoftInputError::NoOwnerWindow);
        }
        Ok(self.metrics)
    }

    fn run_modal(
        &self,
        owner: OwnerWindow,
        template: &DialogTemplate,
        mut handler: DialogMessageHandler,
    ) -> Result<isize> {
        if owner.is_null() {
            return Err(SoftInputError::NoOwnerWindow);
        }
        let control = Arc::new(Mutex::new(HeadlessControl {
            text: template.initial_text().to_vec(),
            numeric: (template.edit_style() & ES_NUMBER) != 0,
            rect: handler.edit_geometry(),
            dialog_rect: self.dialog_screen_rect(template),
            alive: true,
            ..Default::default()
        }));
        let (sender, receiver) = mpsc::channel();
        *lock_hub(&self.hub) = Some(HeadlessHub {
            sender: sender.clone(),
        });
        let port = Arc::new(HeadlessPort {
            sender,
            control: Arc::clone(&control),
        });
        let mut live = HeadlessLive {
            control: Arc::clone(&control),
            ended: None,
        };

        log::debug!("HeadlessDialog: Running dialog ({} template bytes).", template.len());
        handler.handle_event(DialogEvent::Initialize { port }, &mut live);
        self.pump(&receiver, &mut handler, &mut live);

        lock_control(&control).alive = false;
        *lock_hub(&self.hub) = None;
        let result = live.ended.unwrap_or_default();
        log::debug!("HeadlessDialog: Dialog ended with {result}.");
        Ok(result)
    }
}

/*
 * Simulated user input for the running headless dialog. Every call waits
 * until the dialog thread has processed it, and everything the host posted
 * before it. Calls return `None` (or false) when no dialog is running.
 */
#[derive(Clone)]
pub struct HeadlessUser {
    hub: SharedHub,
}

impl HeadlessUser {
    fn act(&self, action: UserAction) -> Option<HeadlessSnapshot> {
        let sender = lock_hub(&self.hub).as_ref()?.sender.clone();
        let (ack, reply) = mpsc::channel();
        sender.send(HeadlessMessage::User(action, ack)).ok()?;
        reply.recv().ok()
    }

    pub fn is_dialog_running(&self) -> bool {
        lock_hub(&self.hub).is_some()
    }

    /// Types `text` over the current selection. False if any of it was rejected.
    pub fn type_text(&self, text: &str) -> bool {
        self.act(UserAction::Type(text.encode_utf16().collect()))
            .is_some_and(|snapshot| snapshot.accepted)
    }

    pub fn click_ok(&self) -> bool {
        self.act(UserAction::Click(DialogButton::Ok)).is_some()
    }

    pub fn click_cancel(&self) -> bool {
        self.act(UserAction::Click(DialogButton::Cancel)).is_some()
    }

    /// Drags a selection with the mouse.
    pub fn select(&self, start: u32, end: u32) -> bool {
        self.act(UserAction::Select(SelectionRange::new(start, end)))
            .is_some()
    }

    pub fn focus_edit(&self) -> bool {
        self.act(UserAction::FocusEdit).is_some()
    }

    pub fn edit_rect(&self) -> Option<PixelRect> {
        self.act(UserAction::Sync).map(|snapshot| snapshot.edit_rect)
    }

    pub fn edit_text(&self) -> Option<String> {
        self.act(UserAction::Sync)
            .map(|snapshot| String::from_utf16_lossy(&snapshot.text))
    }

    pub fn edit_selection(&self) -> Option<SelectionRange> {
        self.act(UserAction::Sync).map(|snapshot| snapshot.selection)
    }

    /// Waits until every command posted so far has been processed.
    pub fn sync(&self) -> Option<HeadlessSnapshot> {
        self.act(UserAction::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn control(text: &str, limit: u32, numeric: bool) -> HeadlessControl {
        let text = wide(text);
        let len = text.len() as u32;
        HeadlessControl {
            text,
            selection: SelectionRange::new(len, len),
            limit,
            numeric,
            alive: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_typing_replaces_selection() {
        let mut edit = control("hello world", 0, false);
        edit.selection = SelectionRange::new(6, 11);
        assert!(edit.type_text(&wide("there")));
        assert_eq!(edit.text, wide("hello there"));
        assert_eq!(edit.selection, SelectionRange::new(11, 11));
    }

    #[test]
    fn test_typing_respects_limit() {
        let mut edit = control("abc", 5, false);
        assert!(!edit.type_text(&wide("defg")));
        assert_eq!(edit.text, wide("abcde"));
        assert!(!edit.type_text(&wide("x")));
        assert_eq!(edit.text, wide("abcde"));
    }

    #[test]
    fn test_numeric_field_rejects_letters() {
        let mut edit = control("12", 0, true);
        assert!(!edit.type_text(&wide("3a")));
        assert_eq!(edit.text, wide("12"));
        assert!(edit.type_text(&wide("34")));
        assert_eq!(edit.text, wide("1234"));
    }

    #[test]
    fn test_user_without_dialog_reports_nothing() {
        let factory = HeadlessDialogFactory::default();
        let user = factory.user();
        assert!(!user.is_dialog_running());
        assert!(!user.click_ok());
        assert!(!user.type_text("a"));
        assert_eq!(user.edit_text(), None);
    }

    #[test]
    fn test_null_owner_has_no_metrics() {
        let factory = HeadlessDialogFactory::default();
        assert!(matches!(
            factory.owner_metrics(OwnerWindow(0)),
            Err(SoftInputError::NoOwnerWindow)
        ));
        assert!(factory.owner_metrics(OwnerWindow(1)).is_ok());
    }
}
