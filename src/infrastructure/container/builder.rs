use super::provider::ServiceProvider;
use super::resolver::Resolver;
use super::{ContainerError, ServiceKey, ServiceLifetime, ServiceRegistration};
use crate::capability::CapabilityResolver;
use crate::command::CommandDescriptor;
use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// 容器构建器（注册表）
///
/// 累积能力解析器、命令及其依赖的注册，最后通过 [`build`](Self::build) 生成不可变的
/// [`ServiceProvider`]。`build` 会消耗构建器，构建之后不能再追加注册。
///
/// `add_*` 系列覆盖同一服务键的已有注册（后注册者胜出）；
/// `try_add_*` 系列只在服务键尚未注册时添加。
#[derive(Default)]
pub struct ContainerBuilder {
    registrations: HashMap<TypeId, ServiceRegistration>,
    commands: BTreeSet<&'static str>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册服务（支持 `dyn Trait` 等非定长服务类型）
    pub fn add_service<T, F>(&mut self, lifetime: ServiceLifetime, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        let registration = ServiceRegistration::new::<T, F>(lifetime, factory);
        let key = registration.key;
        if let Some(previous) = self.registrations.insert(key.type_id(), registration) {
            tracing::debug!(
                service = key.name(),
                previous = %previous.lifetime,
                lifetime = %lifetime,
                "service registration replaced"
            );
        } else {
            tracing::trace!(service = key.name(), lifetime = %lifetime, "service registered");
        }
        self
    }

    /// 服务键尚未注册时才注册
    pub fn try_add_service<T, F>(&mut self, lifetime: ServiceLifetime, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            tracing::trace!(service = std::any::type_name::<T>(), "service already registered, skipped");
            return self;
        }
        self.add_service::<T, F>(lifetime, factory)
    }

    /// 注册单例服务
    pub fn add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.add_service::<T, _>(ServiceLifetime::Singleton, move |r: &Resolver<'_>| {
            factory(r).map(Arc::new)
        })
    }

    /// 注册作用域服务
    pub fn add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.add_service::<T, _>(ServiceLifetime::Scoped, move |r: &Resolver<'_>| {
            factory(r).map(Arc::new)
        })
    }

    /// 注册瞬态服务
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.add_service::<T, _>(ServiceLifetime::Transient, move |r: &Resolver<'_>| {
            factory(r).map(Arc::new)
        })
    }

    pub fn try_add_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            return self;
        }
        self.add_singleton(factory)
    }

    pub fn try_add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            return self;
        }
        self.add_scoped(factory)
    }

    pub fn try_add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        if self.contains::<T>() {
            return self;
        }
        self.add_transient(factory)
    }

    /// 注册已有实例为单例
    pub fn add_instance<T>(&mut self, instance: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.add_shared(Arc::new(instance))
    }

    /// 注册共享实例为单例（可用于 trait 对象）
    pub fn add_shared<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.add_service::<T, _>(ServiceLifetime::Singleton, move |_: &Resolver<'_>| {
            Ok(instance.clone())
        })
    }

    /// 注册能力解析器，服务键为 `dyn CapabilityResolver<T>`，生命周期为单例
    pub fn add_capability<T, R, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static,
        R: CapabilityResolver<T> + 'static,
        F: Fn(&Resolver<'_>) -> Result<R, ContainerError> + Send + Sync + 'static,
    {
        self.add_service::<dyn CapabilityResolver<T>, _>(
            ServiceLifetime::Singleton,
            move |r: &Resolver<'_>| {
                let resolver: Arc<dyn CapabilityResolver<T>> = Arc::new(factory(r)?);
                Ok(resolver)
            },
        )
    }

    /// 注册命令及其依赖
    ///
    /// 命令本身按描述符的策略注册（在作用域内执行的命令为作用域服务，否则为瞬态服务），
    /// 随后调用描述符的依赖注册函数。命令自身的注册是幂等的；依赖注册函数应当使用
    /// `try_add_*` 以保证重复添加同一命令时不会覆盖已有注册。
    pub fn add_command(&mut self, descriptor: &CommandDescriptor) -> &mut Self {
        if !self.commands.insert(descriptor.id()) {
            tracing::debug!(command = descriptor.id(), "command already added to builder");
        }
        descriptor.register(self);
        tracing::debug!(
            command = descriptor.id(),
            lifetime = %descriptor.service_lifetime(),
            "command registered"
        );
        self
    }

    /// 检查服务是否已注册
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    /// 服务的注册生命周期
    pub fn lifetime_of<T: ?Sized + 'static>(&self) -> Option<ServiceLifetime> {
        self.registrations
            .get(&ServiceKey::of::<T>().type_id())
            .map(|r| r.lifetime)
    }

    /// 已添加的命令ID
    pub fn commands(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// 构建不可变容器，消耗构建器
    pub fn build(self) -> ServiceProvider {
        tracing::info!(
            services = self.registrations.len(),
            commands = self.commands.len(),
            "service container built"
        );
        ServiceProvider::from_registrations(self.registrations)
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut services: Vec<&str> = self.registrations.values().map(|r| r.key.name()).collect();
        services.sort_unstable();
        f.debug_struct("ContainerBuilder")
            .field("services", &services)
            .field("commands", &self.commands)
            .finish()
    }
}
