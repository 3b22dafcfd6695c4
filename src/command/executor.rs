use super::{Command, CommandDescriptor, DiCommand};
use crate::errors::CommandError;
use crate::host::ResultCode;
use crate::infrastructure::{ContainerError, Resolver, ScopeInfo, ServiceProvider};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// 一次命令调度经过的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    /// 读取作用域策略并解析命令
    Resolving,
    /// 调用专属的子作用域已打开
    ScopeOpen,
    Executing,
    /// 子作用域已释放
    ScopeClosed,
    Done(ResultCode),
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Done(_) | ExecutionState::Failed)
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// 命令或其依赖无法解析，命令体没有运行
    #[error("Command '{command}' could not be resolved: {source}")]
    Resolution {
        command: &'static str,
        #[source]
        source: ContainerError,
    },
    /// 命令体运行时失败
    #[error("Command '{command}' failed: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: CommandError,
    },
}

impl ExecutionError {
    pub fn command(&self) -> &'static str {
        match self {
            ExecutionError::Resolution { command, .. } | ExecutionError::Command { command, .. } => {
                command
            }
        }
    }

    /// 失败发生在 `execute()` 之前
    pub fn is_guard(&self) -> bool {
        matches!(self, ExecutionError::Resolution { .. })
    }
}

/// [`ScopedCommandExecutor::run_traced`] 的结果
#[derive(Debug)]
pub struct ExecutionReport {
    pub command: &'static str,
    /// 调用所用子作用域在释放之后的快照；根路径为 `None`
    pub scope: Option<ScopeInfo>,
    pub transitions: Vec<ExecutionState>,
    pub outcome: Result<ResultCode, ExecutionError>,
}

impl ExecutionReport {
    pub fn scoped(&self) -> bool {
        self.scope.is_some()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Ok(ResultCode::Succeeded))
    }

    pub fn final_state(&self) -> Option<ExecutionState> {
        self.transitions.last().copied()
    }
}

/// 按命令的作用域策略解析并执行命令
///
/// 作用域路径上，子作用域在结果（或错误）返回给调用方之前释放。
pub struct ScopedCommandExecutor<'a> {
    provider: &'a ServiceProvider,
}

impl<'a> ScopedCommandExecutor<'a> {
    pub fn new(provider: &'a ServiceProvider) -> Self {
        Self { provider }
    }

    pub fn run(&self, descriptor: &CommandDescriptor) -> Result<ResultCode, ExecutionError> {
        self.run_traced(descriptor).outcome
    }

    /// 执行命令并记录经过的状态
    pub fn run_traced(&self, descriptor: &CommandDescriptor) -> ExecutionReport {
        self.dispatch(descriptor, false, |resolver| descriptor.resolve(resolver)).0
    }

    /// 按类型执行命令，同时返回执行过的实例
    ///
    /// 作用域路径上实例在作用域释放后仍然可以读取，但它的作用域依赖已经失效。
    pub fn run_command<T: DiCommand>(&self) -> (ExecutionReport, Option<Arc<T>>) {
        let descriptor = CommandDescriptor::of::<T>();
        self.dispatch(&descriptor, true, |resolver| resolver.resolve::<T>())
    }

    fn dispatch<C, F>(
        &self,
        descriptor: &CommandDescriptor,
        retain: bool,
        resolve: F,
    ) -> (ExecutionReport, Option<Arc<C>>)
    where
        C: Command + ?Sized,
        F: Fn(&Resolver<'_>) -> Result<Arc<C>, ContainerError>,
    {
        let span = tracing::debug_span!(
            "command",
            command = descriptor.id(),
            scoped = descriptor.execute_within_scope()
        );
        let _entered = span.enter();
        let started = Instant::now();

        let mut transitions = vec![ExecutionState::Idle, ExecutionState::Resolving];
        let mut instance = None;
        let (outcome, scope) = if descriptor.execute_within_scope() {
            let scope = self.provider.create_named_scope(descriptor.id());
            transitions.push(ExecutionState::ScopeOpen);

            let resolved = resolve(&scope.resolver());
            let outcome = invoke(
                descriptor,
                resolved,
                &mut transitions,
                retain.then_some(&mut instance),
            );

            let handle = scope.handle();
            drop(scope);
            transitions.push(ExecutionState::ScopeClosed);
            (outcome, Some(handle.info()))
        } else {
            let resolved = resolve(&self.provider.resolver());
            (
                invoke(descriptor, resolved, &mut transitions, retain.then_some(&mut instance)),
                None,
            )
        };

        match &outcome {
            Ok(code) => {
                transitions.push(ExecutionState::Done(*code));
                tracing::debug!(
                    command = descriptor.id(),
                    code = %code,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "command finished"
                );
            }
            Err(err) => {
                transitions.push(ExecutionState::Failed);
                tracing::warn!(
                    command = descriptor.id(),
                    guard = err.is_guard(),
                    error = %err,
                    "command failed"
                );
            }
        }

        let report = ExecutionReport {
            command: descriptor.id(),
            scope,
            transitions,
            outcome,
        };
        (report, instance)
    }
}

fn invoke<C: Command + ?Sized>(
    descriptor: &CommandDescriptor,
    resolved: Result<Arc<C>, ContainerError>,
    transitions: &mut Vec<ExecutionState>,
    instance: Option<&mut Option<Arc<C>>>,
) -> Result<ResultCode, ExecutionError> {
    let command = resolved.map_err(|source| ExecutionError::Resolution {
        command: descriptor.id(),
        source,
    })?;

    if let Some(slot) = instance {
        *slot = Some(command.clone());
    }
    transitions.push(ExecutionState::Executing);
    command.execute().map_err(|source| ExecutionError::Command {
        command: descriptor.id(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ContainerBuilder, ScopeHandle, ScopeState};
    use parking_lot::Mutex;
    use std::sync::Weak;

    use super::ExecutionState::*;

    struct UnitOfWork;

    /// 记录最后一次执行时所在的作用域
    #[derive(Default)]
    struct Probe {
        handle: Mutex<Option<ScopeHandle>>,
        unit: Mutex<Option<Weak<UnitOfWork>>>,
    }

    struct ScopedCommand {
        unit: Arc<UnitOfWork>,
        handle: Option<ScopeHandle>,
        probe: Arc<Probe>,
    }

    impl Command for ScopedCommand {
        fn execute(&self) -> Result<ResultCode, CommandError> {
            *self.probe.handle.lock() = self.handle.clone();
            *self.probe.unit.lock() = Some(Arc::downgrade(&self.unit));
            Ok(ResultCode::Succeeded)
        }
    }

    impl DiCommand for ScopedCommand {
        const ID: &'static str = "scoped";
        const NAME: &'static str = "Scoped";
        const EXECUTE_WITHIN_SCOPE: bool = true;

        fn register_dependencies(services: &mut ContainerBuilder) {
            services
                .try_add_scoped(|_| Ok(UnitOfWork))
                .try_add_singleton(|_| Ok(Probe::default()));
        }

        fn construct(r: &Resolver<'_>) -> Result<Self, ContainerError> {
            Ok(Self {
                unit: r.resolve()?,
                handle: r.scope_handle(),
                probe: r.resolve()?,
            })
        }
    }

    struct Failing;

    impl Command for Failing {
        fn execute(&self) -> Result<ResultCode, CommandError> {
            Err(CommandError::Failed("disk full".to_string()))
        }
    }

    impl DiCommand for Failing {
        const ID: &'static str = "failing";
        const NAME: &'static str = "Failing";
        const EXECUTE_WITHIN_SCOPE: bool = true;

        fn construct(_: &Resolver<'_>) -> Result<Self, ContainerError> {
            Ok(Failing)
        }
    }

    struct Cancelling;

    impl Command for Cancelling {
        fn execute(&self) -> Result<ResultCode, CommandError> {
            Ok(ResultCode::Cancelled)
        }
    }

    impl DiCommand for Cancelling {
        const ID: &'static str = "cancelling";
        const NAME: &'static str = "Cancelling";

        fn construct(_: &Resolver<'_>) -> Result<Self, ContainerError> {
            Ok(Cancelling)
        }
    }

    /// 依赖一个作用域服务，却在根路径上执行
    struct Misconfigured {
        _unit: Arc<UnitOfWork>,
    }

    impl Command for Misconfigured {
        fn execute(&self) -> Result<ResultCode, CommandError> {
            Ok(ResultCode::Succeeded)
        }
    }

    impl DiCommand for Misconfigured {
        const ID: &'static str = "misconfigured";
        const NAME: &'static str = "Misconfigured";

        fn construct(r: &Resolver<'_>) -> Result<Self, ContainerError> {
            Ok(Self { _unit: r.resolve()? })
        }
    }

    fn provider() -> ServiceProvider {
        let mut services = ContainerBuilder::new();
        services
            .add_command(&CommandDescriptor::of::<ScopedCommand>())
            .add_command(&CommandDescriptor::of::<Failing>())
            .add_command(&CommandDescriptor::of::<Cancelling>())
            .add_command(&CommandDescriptor::of::<Misconfigured>());
        services.build()
    }

    #[test]
    fn test_scoped_run_visits_scope_states() {
        let provider = provider();
        let report = ScopedCommandExecutor::new(&provider)
            .run_traced(&CommandDescriptor::of::<ScopedCommand>());

        assert!(report.is_success());
        assert_eq!(
            report.transitions,
            vec![Idle, Resolving, ScopeOpen, Executing, ScopeClosed, Done(ResultCode::Succeeded)]
        );
        let scope = report.scope.unwrap();
        assert_eq!(scope.state, ScopeState::Disposed);
        assert_eq!(scope.name, "scoped");
    }

    #[test]
    fn test_scope_released_after_run() {
        let provider = provider();
        let result = ScopedCommandExecutor::new(&provider).run(&CommandDescriptor::of::<ScopedCommand>());
        assert_eq!(result.unwrap(), ResultCode::Succeeded);

        let probe = provider.resolve::<Probe>().unwrap();
        let handle = probe.handle.lock().clone().unwrap();
        assert!(handle.is_disposed());
        assert!(matches!(
            handle.resolve::<UnitOfWork>(),
            Err(ContainerError::ScopeDisposed { .. })
        ));

        let unit = probe.unit.lock().clone().unwrap();
        assert!(unit.upgrade().is_none());
        assert_eq!(provider.stats().active_scopes(), 0);
    }

    #[test]
    fn test_failed_command_still_closes_scope() {
        let provider = provider();
        let report =
            ScopedCommandExecutor::new(&provider).run_traced(&CommandDescriptor::of::<Failing>());

        assert_eq!(
            report.transitions,
            vec![Idle, Resolving, ScopeOpen, Executing, ScopeClosed, Failed]
        );
        let err = report.outcome.unwrap_err();
        assert!(!err.is_guard());
        assert_eq!(err.command(), "failing");
        assert!(err.to_string().contains("disk full"));
        assert_eq!(provider.stats().scopes_disposed, 1);
    }

    #[test]
    fn test_root_run_creates_no_scope() {
        let provider = provider();
        let report =
            ScopedCommandExecutor::new(&provider).run_traced(&CommandDescriptor::of::<Cancelling>());

        assert!(!report.scoped());
        assert_eq!(
            report.transitions,
            vec![Idle, Resolving, Executing, Done(ResultCode::Cancelled)]
        );
        assert_eq!(provider.stats().scopes_created, 0);
    }

    #[test]
    fn test_scoped_dependency_on_root_path_is_guard_failure() {
        let provider = provider();
        let report = ScopedCommandExecutor::new(&provider)
            .run_traced(&CommandDescriptor::of::<Misconfigured>());

        assert_eq!(report.transitions, vec![Idle, Resolving, Failed]);
        assert_eq!(report.final_state().map(|s| s.is_terminal()), Some(true));
        match report.outcome {
            Err(ExecutionError::Resolution {
                source: ContainerError::InvalidLifetime { service, requested_by },
                ..
            }) => {
                assert!(service.ends_with("UnitOfWork"));
                assert!(requested_by.unwrap().ends_with("Misconfigured"));
            }
            other => panic!("expected InvalidLifetime, got {:?}", other),
        }
    }

    #[test]
    fn test_run_command_returns_executed_instance() {
        let provider = provider();
        let executor = ScopedCommandExecutor::new(&provider);

        let (report, command) = executor.run_command::<ScopedCommand>();
        assert!(report.is_success());
        let command = command.unwrap();
        assert!(command.handle.as_ref().unwrap().is_disposed());
        assert_eq!(provider.stats().active_scopes(), 0);

        let (report, command) = executor.run_command::<Failing>();
        assert!(!report.outcome.unwrap_err().is_guard());
        assert!(command.is_some());

        // 解析失败时命令从未构造
        let (report, command) = executor.run_command::<Misconfigured>();
        assert_eq!(report.transitions, vec![Idle, Resolving, Failed]);
        assert!(command.is_none());
    }

    #[test]
    fn test_unregistered_command_fails_before_execute() {
        let provider = ContainerBuilder::new().build();
        let err = ScopedCommandExecutor::new(&provider)
            .run(&CommandDescriptor::of::<ScopedCommand>())
            .unwrap_err();

        assert!(err.is_guard());
        assert!(matches!(
            err,
            ExecutionError::Resolution {
                source: ContainerError::ServiceNotRegistered { .. },
                ..
            }
        ));
    }
}
