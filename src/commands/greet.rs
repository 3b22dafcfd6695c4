use crate::capability::CapabilityResolver;
use crate::command::{Command, DiCommand};
use crate::errors::CommandError;
use crate::host::{ActiveHostHandle, DialogService, ResultCode};
use crate::infrastructure::{ContainerBuilder, ContainerError, Resolver};
use parking_lot::Mutex;
use std::sync::Arc;

pub const GREETING: &str = "Hello from DI!";

/// Supplies the greeting text. Registered as transient.
#[derive(Debug, Default)]
pub struct MessageProvider;

impl MessageProvider {
    pub fn message(&self) -> &'static str {
        GREETING
    }
}

/// Shows a greeting together with the title of the host's active document.
pub struct GreetCommand {
    host: Arc<dyn CapabilityResolver<ActiveHostHandle>>,
    dialogs: Arc<dyn CapabilityResolver<Arc<dyn DialogService>>>,
    messages: Arc<MessageProvider>,
    captured: Mutex<Option<String>>,
}

impl GreetCommand {
    /// The message obtained during the last `execute` call.
    pub fn captured_message(&self) -> Option<String> {
        self.captured.lock().clone()
    }
}

impl Command for GreetCommand {
    fn execute(&self) -> Result<ResultCode, CommandError> {
        let active = self.host.get()?;
        let message = self.messages.message();
        *self.captured.lock() = Some(message.to_string());

        let document = active.active_document.as_deref().unwrap_or("(no document)");
        let body = format!("{}\n\nActive document: {}", message, document);
        self.dialogs.get()?.show(Self::NAME, &body)?;

        tracing::info!(
            command = Self::ID,
            application = %active.application,
            document,
            "greeting shown"
        );
        Ok(ResultCode::Succeeded)
    }
}

impl DiCommand for GreetCommand {
    const ID: &'static str = "greet";
    const NAME: &'static str = "Greet";
    const TOOLTIP: &'static str = "Shows a greeting resolved through the service container";
    const EXECUTE_WITHIN_SCOPE: bool = true;

    fn register_dependencies(services: &mut ContainerBuilder) {
        services.try_add_transient(|_| Ok(MessageProvider));
    }

    fn construct(r: &Resolver<'_>) -> Result<Self, ContainerError> {
        Ok(Self {
            host: r.resolve()?,
            dialogs: r.resolve()?,
            messages: r.resolve()?,
            captured: Mutex::new(None),
        })
    }
}
