//! 依赖注入容器
//!
//! 提供类型安全的服务注册和解析功能，支持：
//! - 单例 / 作用域 / 瞬态 三种生命周期
//! - 一次性构建、构建后只读的容器
//! - RAII 作用域释放
//! - 循环依赖检测
//!
//! 服务键可以是非定长类型（`dyn Trait`），因此 trait 对象可以直接注册和解析。

mod builder;
mod error;
mod provider;
mod resolver;
mod scope;
mod stats;

pub use builder::ContainerBuilder;
pub use error::ContainerError;
pub use provider::ServiceProvider;
pub use resolver::Resolver;
pub use scope::{ScopeHandle, ScopeInfo, ScopeState, ServiceScope};
pub use stats::ContainerStats;

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 服务生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLifetime {
    /// 整个容器生命周期内只有一个实例
    Singleton,
    /// 每次解析都创建新实例
    Transient,
    /// 在同一个作用域内共享实例，只能在打开的作用域中解析
    Scoped,
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceLifetime::Singleton => write!(f, "singleton"),
            ServiceLifetime::Transient => write!(f, "transient"),
            ServiceLifetime::Scoped => write!(f, "scoped"),
        }
    }
}

/// 服务键：类型ID加类型名称（用于错误信息）
#[derive(Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 类型擦除后的实例，内部总是一个 `Arc<T>`
pub(crate) type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// 类型擦除后的工厂
pub(crate) type ErasedFactory =
    Arc<dyn Fn(&Resolver<'_>) -> Result<ErasedInstance, ContainerError> + Send + Sync>;

/// 服务注册信息
#[derive(Clone)]
pub(crate) struct ServiceRegistration {
    pub(crate) key: ServiceKey,
    pub(crate) lifetime: ServiceLifetime,
    pub(crate) factory: ErasedFactory,
}

impl ServiceRegistration {
    pub(crate) fn new<T, F>(lifetime: ServiceLifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        let factory: ErasedFactory = Arc::new(move |resolver: &Resolver<'_>| {
            let service: Arc<T> = factory(resolver)?;
            Ok(Arc::new(service) as ErasedInstance)
        });

        Self {
            key: ServiceKey::of::<T>(),
            lifetime,
            factory,
        }
    }
}

/// 将擦除的实例还原为 `Arc<T>`
pub(crate) fn downcast_instance<T>(
    key: ServiceKey,
    instance: &ErasedInstance,
    context: &str,
) -> Result<Arc<T>, ContainerError>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| ContainerError::TypeCastFailed {
            expected: key.name().to_string(),
            context: context.to_string(),
        })
}
