//! 命令契约与调度
//!
//! 每个命令类型通过 [`DiCommand`] 静态声明自己的 ID、是否在作用域内执行，
//! 以及需要注册到容器中的依赖。[`CommandDescriptor`] 把这些静态信息擦除成普通值，
//! 由 [`CommandCatalog`] 收集，并交给 [`ScopedCommandExecutor`] 调度。

pub mod catalog;
pub mod descriptor;
pub mod executor;

pub use catalog::CommandCatalog;
pub use descriptor::CommandDescriptor;
pub use executor::{ExecutionError, ExecutionReport, ExecutionState, ScopedCommandExecutor};

use crate::errors::CommandError;
use crate::host::ResultCode;
use crate::infrastructure::{ContainerBuilder, ContainerError, Resolver};

/// 可执行的命令实例
pub trait Command: Send + Sync {
    fn execute(&self) -> Result<ResultCode, CommandError>;
}

/// 通过依赖注入构造的命令类型
///
/// ```ignore
/// struct Purge { log: Arc<AuditLog> }
///
/// impl DiCommand for Purge {
///     const ID: &'static str = "purge";
///     const NAME: &'static str = "Purge Unused";
///     const EXECUTE_WITHIN_SCOPE: bool = true;
///
///     fn register_dependencies(services: &mut ContainerBuilder) {
///         services.try_add_scoped(|_| Ok(AuditLog::default()));
///     }
///
///     fn construct(r: &Resolver<'_>) -> Result<Self, ContainerError> {
///         Ok(Self { log: r.resolve()? })
///     }
/// }
/// ```
pub trait DiCommand: Command + Sized + 'static {
    /// 命令ID，在目录中唯一
    const ID: &'static str;
    /// 按钮上显示的名称
    const NAME: &'static str;
    const TOOLTIP: &'static str = "";
    /// 为 `true` 时每次调用都在新的子作用域中解析并执行
    const EXECUTE_WITHIN_SCOPE: bool = false;

    /// 向容器注册命令自身的依赖，应当使用 `try_add_*` 系列
    fn register_dependencies(_services: &mut ContainerBuilder) {}

    /// 从解析器构造命令，构造参数按类型解析
    fn construct(resolver: &Resolver<'_>) -> Result<Self, ContainerError>;
}
