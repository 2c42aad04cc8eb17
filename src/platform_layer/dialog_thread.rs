/*
 * Owns the background thread that runs the modal dialog.
 *
 * State machine: Idle -> Starting -> Running -> Idle. `start_dialog` first
 * stops any previous dialog (close request + join), spawns a new thread, and
 * blocks until that thread reports through a `StartSignal` that the dialog has
 * initialised, or that it failed to. Only one dialog thread exists at a time.
 */

use super::shared_state::SharedInputState;
use crate::error::{Result, SoftInputError};

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
enum StartState {
    Pending,
    Started,
    Failed(String),
}

/// One-shot start handshake between the dialog thread and the caller of `start_dialog`.
#[derive(Debug)]
pub struct StartSignal {
    state: Mutex<StartState>,
    condition: Condvar,
}

impl StartSignal {
    pub(crate) fn new() -> Self {
        StartSignal {
            state: Mutex::new(StartState::Pending),
            condition: Condvar::new(),
        }
    }

    fn settle(&self, next: StartState) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state == StartState::Pending {
            *state = next;
            self.condition.notify_all();
        }
    }

    pub(crate) fn notify_started(&self) {
        self.settle(StartState::Started);
    }

    /// Has no effect once the dialog reported a successful start.
    pub(crate) fn notify_failed(&self, reason: String) {
        self.settle(StartState::Failed(reason));
    }

    pub(crate) fn wait(&self) -> Result<()> {
        let state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let state = self
            .condition
            .wait_while(state, |s| *s == StartState::Pending)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &*state {
            StartState::Started => Ok(()),
            StartState::Failed(reason) => Err(SoftInputError::DialogStartFailed(reason.clone())),
            StartState::Pending => unreachable!("wait_while returned while pending"),
        }
    }
}

struct DialogThread {
    handle: JoinHandle<()>,
    generation: u64,
}

pub(crate) struct DialogThreadController {
    shared: Arc<SharedInputState>,
    thread: Option<DialogThread>,
}

impl DialogThreadController {
    pub(crate) fn new(shared: Arc<SharedInputState>) -> Self {
        DialogThreadController {
            shared,
            thread: None,
        }
    }

    /*
     * Starts the dialog of session `generation`. `body` runs on the new
     * thread and must not return before the dialog has ended; an `Err` from it
     * (or returning without ever signalling) fails the start.
     *
     * Returns once the dialog signalled initialisation, so that commands aimed
     * at the live edit control are safe to issue from then on.
     */
    pub(crate) fn start_dialog<F>(&mut self, generation: u64, body: F) -> Result<()>
    where
        F: FnOnce(Arc<StartSignal>) -> Result<()> + Send + 'static,
    {
        self.stop_and_delete();

        let signal = Arc::new(StartSignal::new());
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name(format!("soft-input-dialog-{generation}"))
            .spawn(move || {
                let outcome = body(Arc::clone(&thread_signal));
                match outcome {
                    Ok(()) => thread_signal
                        .notify_failed("dialog ended before it initialised".to_string()),
                    Err(e) => {
                        log::error!("DialogThread: Dialog of session {generation} failed: {e}");
                        thread_signal.notify_failed(e.to_string());
                    }
                }
            })
            .map_err(|e| SoftInputError::ThreadSpawn(e.to_string()))?;

        self.thread = Some(DialogThread { handle, generation });
        log::debug!("DialogThread: Waiting for dialog of session {generation} to initialise.");

        if let Err(e) = signal.wait() {
            // The thread is on its way out; reap it before reporting.
            self.stop_and_delete();
            return Err(e);
        }
        log::debug!("DialogThread: Dialog of session {generation} is running.");
        Ok(())
    }

    /*
     * Ends the current dialog, if any, and joins its thread. Idempotent. The
     * session ends as canceled unless the dialog already ended on its own.
     */
    pub(crate) fn stop_and_delete(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if let Some(link) = self.shared.live_link_for(thread.generation) {
            log::debug!(
                "DialogThread: Requesting close of session {}.",
                thread.generation
            );
            if !link.port.request_close() {
                log::warn!(
                    "DialogThread: Close request for session {} was not delivered.",
                    thread.generation
                );
            }
        }
        if thread.handle.join().is_err() {
            log::error!(
                "DialogThread: Dialog thread of session {} panicked.",
                thread.generation
            );
        }
        // Covers backends that went away without reporting a terminal event.
        if self.shared.finish_session(thread.generation, true, None) {
            log::warn!(
                "DialogThread: Session {} ended without a terminal event; marked canceled.",
                thread.generation
            );
        }
    }
}

impl Drop for DialogThreadController {
    fn drop(&mut self) {
        self.stop_and_delete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{FieldFlags, OwnerWindow};
    use crate::platform_layer::shared_state::SessionStart;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn begin(shared: &SharedInputState) -> u64 {
        shared.begin_session(SessionStart {
            owner: OwnerWindow(1),
            text: Vec::new(),
            flags: FieldFlags::default(),
            selection_start: 0,
            selection_length: 0,
            character_limit: 0,
        })
    }

    #[test]
    fn test_start_waits_for_signal() {
        let shared = Arc::new(SharedInputState::new());
        let generation = begin(&shared);
        let mut controller = DialogThreadController::new(shared.clone());
        let signalled = Arc::new(AtomicBool::new(false));
        let flag = signalled.clone();

        controller
            .start_dialog(generation, move |signal| {
                std::thread::sleep(Duration::from_millis(50));
                flag.store(true, Ordering::SeqCst);
                signal.notify_started();
                Ok(())
            })
            .unwrap();
        assert!(signalled.load(Ordering::SeqCst));
        controller.stop_and_delete();
        assert!(controller.thread.is_none());
    }

    #[test]
    fn test_body_error_fails_start_and_cancels_session() {
        let shared = Arc::new(SharedInputState::new());
        let generation = begin(&shared);
        let mut controller = DialogThreadController::new(shared.clone());

        let result = controller.start_dialog(generation, |_signal| {
            Err(SoftInputError::Platform("no display".to_string()))
        });
        match result {
            Err(SoftInputError::DialogStartFailed(reason)) => assert!(reason.contains("no display")),
            other => panic!("Expected a start failure, got {other:?}"),
        }
        assert_eq!(shared.state(), (false, true));
        assert!(controller.thread.is_none());
    }

    #[test]
    fn test_body_returning_without_signal_fails_start() {
        let shared = Arc::new(SharedInputState::new());
        let generation = begin(&shared);
        let mut controller = DialogThreadController::new(shared);
        assert!(controller.start_dialog(generation, |_signal| Ok(())).is_err());
    }

    #[test]
    fn test_stop_and_delete_is_idempotent() {
        let shared = Arc::new(SharedInputState::new());
        let mut controller = DialogThreadController::new(shared.clone());
        controller.stop_and_delete();
        controller.stop_and_delete();
        assert_eq!(shared.state(), (false, false));
    }

    #[test]
    fn test_signal_failure_after_start_is_ignored() {
        let signal = StartSignal::new();
        signal.notify_started();
        signal.notify_failed("late".to_string());
        assert!(signal.wait().is_ok());
    }
}
