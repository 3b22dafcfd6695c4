use super::resolver::Resolver;
use super::scope::ServiceScope;
use super::stats::{ContainerStats, StatsCounters};
use super::{
    ContainerError, ErasedInstance, ServiceKey, ServiceLifetime, ServiceRegistration,
};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 容器内部状态：注册表在构建后只读，只有单例缓存会变化
pub(crate) struct ProviderCore {
    id: Uuid,
    registrations: HashMap<TypeId, ServiceRegistration>,
    singletons: Mutex<HashMap<TypeId, ErasedInstance>>,
    pub(crate) stats: StatsCounters,
}

impl ProviderCore {
    pub(crate) fn find(&self, key: ServiceKey) -> Option<&ServiceRegistration> {
        self.registrations.get(&key.type_id())
    }

    /// 获取或创建单例。创建期间不持有锁，并发创建时先写入者胜出
    pub(crate) fn singleton(
        &self,
        registration: &ServiceRegistration,
        resolver: &Resolver<'_>,
    ) -> Result<ErasedInstance, ContainerError> {
        let type_id = registration.key.type_id();

        if let Some(cached) = self.singletons.lock().get(&type_id).cloned() {
            self.stats.record_singleton_hit();
            return Ok(cached);
        }

        self.stats.record_singleton_miss();
        let created = (registration.factory)(resolver)?;

        let mut singletons = self.singletons.lock();
        Ok(singletons.entry(type_id).or_insert(created).clone())
    }
}

/// 不可变的根容器
///
/// 由 [`ContainerBuilder::build`](super::ContainerBuilder::build) 创建。克隆是廉价的，
/// 所有克隆共享同一个注册表和单例缓存。
#[derive(Clone)]
pub struct ServiceProvider {
    pub(crate) core: Arc<ProviderCore>,
}

impl ServiceProvider {
    pub(crate) fn from_registrations(registrations: HashMap<TypeId, ServiceRegistration>) -> Self {
        Self {
            core: Arc::new(ProviderCore {
                id: Uuid::new_v4(),
                registrations,
                singletons: Mutex::new(HashMap::new()),
                stats: StatsCounters::default(),
            }),
        }
    }

    /// 容器实例ID
    pub fn id(&self) -> Uuid {
        self.core.id
    }

    /// 从根容器解析服务。作用域服务会返回 `InvalidLifetime`
    pub fn resolve<T>(&self) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolver().resolve::<T>()
    }

    /// 根解析器
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::root(&self.core)
    }

    /// 创建新的子作用域
    pub fn create_scope(&self) -> ServiceScope {
        self.create_named_scope("scope")
    }

    /// 创建带名称的子作用域
    pub fn create_named_scope(&self, name: impl Into<String>) -> ServiceScope {
        ServiceScope::new(self.clone(), name.into())
    }

    /// 检查服务是否已注册
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.core.find(ServiceKey::of::<T>()).is_some()
    }

    /// 服务的注册生命周期
    pub fn lifetime_of<T: ?Sized + 'static>(&self) -> Option<ServiceLifetime> {
        self.core.find(ServiceKey::of::<T>()).map(|r| r.lifetime)
    }

    /// 已注册服务的类型名称（排序后）
    pub fn registered_services(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.core.registrations.values().map(|r| r.key.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.core.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.registrations.is_empty()
    }

    /// 获取容器统计信息
    pub fn stats(&self) -> ContainerStats {
        self.core.stats.snapshot(self.core.registrations.len())
    }

    /// 两个句柄是否指向同一个容器实例
    pub fn ptr_eq(&self, other: &ServiceProvider) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("id", &self.core.id)
            .field("services", &self.core.registrations.len())
            .finish()
    }
}
