use super::{CommandButton, CommandResult, CommandSurface, HostContext, Invocation, ResultCode};
use crate::command::{ExecutionReport, ScopedCommandExecutor};
use crate::commands::builtin_catalog;
use crate::config::PluginConfig;
use crate::context::ApplicationContext;
use crate::errors::AppError;
use std::sync::Arc;

/// Host-facing plugin entry point.
///
/// The host calls [`on_startup`](Self::on_startup) once, then
/// [`execute`](Self::execute) for every button press.
#[derive(Debug)]
pub struct PluginApplication {
    context: Arc<ApplicationContext>,
    config: PluginConfig,
}

impl PluginApplication {
    /// Application with the built-in command catalog.
    pub fn new(config: PluginConfig) -> Self {
        Self::with_context(Arc::new(ApplicationContext::new(builtin_catalog())), config)
    }

    pub fn with_context(context: Arc<ApplicationContext>, config: PluginConfig) -> Self {
        Self { context, config }
    }

    pub fn context(&self) -> &Arc<ApplicationContext> {
        &self.context
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Stores the host context and publishes one button per catalog command.
    pub fn on_startup(&self, host: HostContext, surface: &mut dyn CommandSurface) -> ResultCode {
        let panel = self.config.ui.panel_name.as_str();
        tracing::info!(host = host.host_name(), panel, "plugin starting");
        self.context.initialize(host);

        let mut code = ResultCode::Succeeded;
        for descriptor in self.context.catalog().iter() {
            let button = CommandButton {
                command_id: descriptor.id().to_string(),
                text: descriptor.name().to_string(),
                tooltip: descriptor.tooltip().to_string(),
            };
            if let Err(reason) = surface.add_button(panel, &button) {
                tracing::error!(command = descriptor.id(), panel, %reason, "failed to add command button");
                code = ResultCode::Failed;
            }
        }
        code
    }

    /// The container lives for the whole process, nothing to tear down.
    pub fn on_shutdown(&self, host: &HostContext) -> ResultCode {
        tracing::info!(host = host.host_name(), "plugin shutting down");
        ResultCode::Succeeded
    }

    /// Runs one command and converts every error into a failed result.
    pub fn execute(&self, invocation: &Invocation) -> CommandResult {
        let command = invocation.command_id.as_str();
        match self.try_execute(command) {
            Ok(code) => CommandResult::new(command, code),
            Err(err) => {
                tracing::error!(command, guard = err.is_guard(), error = %err, "command invocation failed");
                CommandResult::failed(command, err.to_string())
            }
        }
    }

    pub fn try_execute(&self, command_id: &str) -> Result<ResultCode, AppError> {
        Ok(self.run_traced(command_id)?.outcome?)
    }

    /// Like [`try_execute`](Self::try_execute) but keeps the full execution report.
    pub fn run_traced(&self, command_id: &str) -> Result<ExecutionReport, AppError> {
        let descriptor = self
            .context
            .catalog()
            .get(command_id)
            .copied()
            .ok_or_else(|| AppError::UnknownCommand(command_id.to_string()))?;
        let provider = self.context.container()?;
        Ok(ScopedCommandExecutor::new(&provider).run_traced(&descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ActiveHostHandle, RecordingSurface, SimulatedHost};

    fn started(host: &SimulatedHost) -> (PluginApplication, RecordingSurface) {
        let app = PluginApplication::new(PluginConfig::default());
        let mut surface = RecordingSurface::default();
        let code = app.on_startup(HostContext::new(host.clone()), &mut surface);
        assert_eq!(code, ResultCode::Succeeded);
        (app, surface)
    }

    #[test]
    fn test_startup_publishes_buttons() {
        let host = SimulatedHost::new("Designer");
        let (app, surface) = started(&host);

        let buttons = surface.panel("Host DI");
        assert_eq!(buttons.len(), app.context().catalog().len());
        assert_eq!(buttons[0].command_id, "greet");
        assert_eq!(buttons[0].text, "Greet");
        assert!(app.context().is_initialized());
        assert!(!app.context().is_built());
    }

    #[test]
    fn test_startup_reports_surface_failure() {
        let host = SimulatedHost::new("Designer");
        let (app, mut surface) = started(&host);

        let code = app.on_startup(HostContext::new(host.clone()), &mut surface);
        assert_eq!(code, ResultCode::Failed);
    }

    #[test]
    fn test_execute_greet() {
        let host = SimulatedHost::new("Designer")
            .with_active_application(ActiveHostHandle::new("Designer", "2025"));
        let (app, _) = started(&host);

        let result = app.execute(&Invocation::new("greet"));
        assert!(result.is_success(), "{:?}", result);
        assert!(result.message.is_none());
        assert!(app.context().is_built());
    }

    #[test]
    fn test_unknown_command_is_failed_result() {
        let host = SimulatedHost::new("Designer");
        let (app, _) = started(&host);

        let result = app.execute(&Invocation::new("explode"));
        assert_eq!(result.code, ResultCode::Failed);
        assert_eq!(result.message.as_deref(), Some("Unknown command 'explode'"));
        assert!(!app.context().is_built());
    }

    #[test]
    fn test_execute_before_startup() {
        let app = PluginApplication::new(PluginConfig::default());
        let err = app.try_execute("greet").unwrap_err();
        assert!(matches!(err, AppError::NotInitialized(_)));
        assert!(err.is_guard());
    }

    #[test]
    fn test_shutdown_succeeds() {
        let host = SimulatedHost::new("Designer");
        let (app, _) = started(&host);
        assert_eq!(app.on_shutdown(&HostContext::new(host)), ResultCode::Succeeded);
    }
}
