//! Host-facing contracts.
//!
//! The plugin talks to its host through the types in this module only: the
//! [`HostEnvironment`] the host hands over at startup, the [`CommandSurface`]
//! used to publish command buttons, and the result types returned from each
//! command invocation.

pub mod application;
pub mod simulated;

pub use application::PluginApplication;
pub use simulated::{Dialog, RecordingDialogs, RecordingSurface, SimulatedHost};

use crate::errors::CapabilityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outcome reported back to the host for every command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Succeeded,
    Failed,
    Cancelled,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::Succeeded => write!(f, "succeeded"),
            ResultCode::Failed => write!(f, "failed"),
            ResultCode::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result code plus the user-visible message the host should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub command: String,
    pub code: ResultCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandResult {
    pub fn new(command: impl Into<String>, code: ResultCode) -> Self {
        Self {
            command: command.into(),
            code,
            message: None,
        }
    }

    pub fn failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            code: ResultCode::Failed,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Succeeded
    }
}

/// Data the host passes when a user triggers a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command_id: String,
}

impl Invocation {
    pub fn new(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
        }
    }
}

/// Snapshot of the host's active application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHostHandle {
    pub application: String,
    pub version: String,
    pub active_document: Option<String>,
}

impl ActiveHostHandle {
    pub fn new(application: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            version: version.into(),
            active_document: None,
        }
    }

    pub fn with_document(mut self, title: impl Into<String>) -> Self {
        self.active_document = Some(title.into());
        self
    }
}

/// The host's modal message dialog.
pub trait DialogService: Send + Sync {
    fn show(&self, title: &str, body: &str) -> Result<(), CapabilityError>;
}

/// Everything the plugin may ask of the host at runtime.
///
/// The host integration layer implements this and passes it to
/// [`PluginApplication::on_startup`]. Values that are not available yet are
/// reported as `None`.
pub trait HostEnvironment: Send + Sync {
    fn host_name(&self) -> &str;

    fn active_application(&self) -> Option<ActiveHostHandle>;

    fn dialogs(&self) -> Option<Arc<dyn DialogService>>;
}

/// Cheaply clonable handle to the host environment supplied at startup.
#[derive(Clone)]
pub struct HostContext {
    environment: Arc<dyn HostEnvironment>,
}

impl HostContext {
    pub fn new<E: HostEnvironment + 'static>(environment: E) -> Self {
        Self {
            environment: Arc::new(environment),
        }
    }

    pub fn from_shared(environment: Arc<dyn HostEnvironment>) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &dyn HostEnvironment {
        self.environment.as_ref()
    }

    pub fn host_name(&self) -> &str {
        self.environment.host_name()
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("host", &self.environment.host_name())
            .finish()
    }
}

/// Button published on the host's command panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandButton {
    pub command_id: String,
    pub text: String,
    pub tooltip: String,
}

/// Host UI registration contract.
pub trait CommandSurface {
    fn add_button(&mut self, panel: &str, button: &CommandButton) -> Result<(), String>;
}
