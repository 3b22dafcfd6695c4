use super::{Command, DiCommand};
use crate::infrastructure::{ContainerBuilder, ContainerError, Resolver, ServiceLifetime};
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的命令描述
///
/// 由 [`CommandDescriptor::of`] 从 [`DiCommand`] 的关联常量和函数生成，
/// 之后只在构建容器和调度命令时读取。
#[derive(Clone, Copy)]
pub struct CommandDescriptor {
    id: &'static str,
    name: &'static str,
    tooltip: &'static str,
    type_name: &'static str,
    execute_within_scope: bool,
    register_dependencies: fn(&mut ContainerBuilder),
    register_service: fn(&mut ContainerBuilder, ServiceLifetime),
    resolve: fn(&Resolver<'_>) -> Result<Arc<dyn Command>, ContainerError>,
}

impl CommandDescriptor {
    pub fn of<T: DiCommand>() -> Self {
        Self {
            id: T::ID,
            name: T::NAME,
            tooltip: T::TOOLTIP,
            type_name: std::any::type_name::<T>(),
            execute_within_scope: T::EXECUTE_WITHIN_SCOPE,
            register_dependencies: T::register_dependencies,
            register_service: register_command::<T>,
            resolve: resolve_command::<T>,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tooltip(&self) -> &'static str {
        self.tooltip
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn execute_within_scope(&self) -> bool {
        self.execute_within_scope
    }

    /// 命令自身在容器中的生命周期
    pub fn service_lifetime(&self) -> ServiceLifetime {
        if self.execute_within_scope {
            ServiceLifetime::Scoped
        } else {
            ServiceLifetime::Transient
        }
    }

    /// 注册命令自身（仅在尚未注册时）及其依赖
    pub(crate) fn register(&self, services: &mut ContainerBuilder) {
        (self.register_service)(services, self.service_lifetime());
        (self.register_dependencies)(services);
    }

    /// 从解析器解析命令实例
    pub fn resolve(&self, resolver: &Resolver<'_>) -> Result<Arc<dyn Command>, ContainerError> {
        (self.resolve)(resolver)
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("id", &self.id)
            .field("type", &self.type_name)
            .field("execute_within_scope", &self.execute_within_scope)
            .finish()
    }
}

fn register_command<T: DiCommand>(services: &mut ContainerBuilder, lifetime: ServiceLifetime) {
    services.try_add_service::<T, _>(lifetime, |r: &Resolver<'_>| T::construct(r).map(Arc::new));
}

fn resolve_command<T: DiCommand>(resolver: &Resolver<'_>) -> Result<Arc<dyn Command>, ContainerError> {
    let command: Arc<T> = resolver.resolve::<T>()?;
    Ok(command)
}
