//! In-process stand-in for a real host, used by the `hostdi` binary and tests.

use super::{ActiveHostHandle, CommandButton, CommandSurface, DialogService, HostEnvironment};
use crate::errors::CapabilityError;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialog {
    pub title: String,
    pub body: String,
}

/// Dialog service that records every dialog instead of showing it.
#[derive(Debug, Default)]
pub struct RecordingDialogs {
    shown: Mutex<Vec<Dialog>>,
    closed: AtomicBool,
}

impl RecordingDialogs {
    /// A closed service refuses every dialog, like a host shutting its UI down.
    pub fn set_closed(&self, closed: bool) {
        self.closed.store(closed, Ordering::SeqCst);
    }

    pub fn shown(&self) -> Vec<Dialog> {
        self.shown.lock().clone()
    }

    pub fn take(&self) -> Vec<Dialog> {
        std::mem::take(&mut *self.shown.lock())
    }
}

impl DialogService for RecordingDialogs {
    fn show(&self, title: &str, body: &str) -> Result<(), CapabilityError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CapabilityError::host_operation("show_dialog", "dialog service is closed"));
        }
        tracing::debug!(title, "dialog shown");
        self.shown.lock().push(Dialog {
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Host environment with a configurable active application.
#[derive(Clone)]
pub struct SimulatedHost {
    name: String,
    application: Arc<Mutex<Option<ActiveHostHandle>>>,
    dialogs: Arc<RecordingDialogs>,
}

impl SimulatedHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application: Arc::new(Mutex::new(None)),
            dialogs: Arc::new(RecordingDialogs::default()),
        }
    }

    pub fn with_active_application(self, handle: ActiveHostHandle) -> Self {
        self.set_active_application(Some(handle));
        self
    }

    /// Changes the active application; visible through every clone.
    pub fn set_active_application(&self, handle: Option<ActiveHostHandle>) {
        *self.application.lock() = handle;
    }

    pub fn recorded_dialogs(&self) -> &RecordingDialogs {
        &self.dialogs
    }
}

impl HostEnvironment for SimulatedHost {
    fn host_name(&self) -> &str {
        &self.name
    }

    fn active_application(&self) -> Option<ActiveHostHandle> {
        self.application.lock().clone()
    }

    fn dialogs(&self) -> Option<Arc<dyn DialogService>> {
        Some(self.dialogs.clone())
    }
}

/// Command surface that keeps the published buttons in memory.
///
/// Like a real ribbon panel it refuses a second button for the same command
/// on the same panel.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    buttons: Vec<(String, CommandButton)>,
}

impl RecordingSurface {
    pub fn buttons(&self) -> &[(String, CommandButton)] {
        &self.buttons
    }

    pub fn panel(&self, panel: &str) -> Vec<&CommandButton> {
        self.buttons
            .iter()
            .filter(|(name, _)| name == panel)
            .map(|(_, button)| button)
            .collect()
    }
}

impl CommandSurface for RecordingSurface {
    fn add_button(&mut self, panel: &str, button: &CommandButton) -> Result<(), String> {
        let duplicate = self
            .buttons
            .iter()
            .any(|(name, existing)| name == panel && existing.command_id == button.command_id);
        if duplicate {
            return Err(format!(
                "panel '{}' already has a button for '{}'",
                panel, button.command_id
            ));
        }
        self.buttons.push((panel.to_string(), button.clone()));
        Ok(())
    }
}
