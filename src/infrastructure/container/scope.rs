use super::provider::ServiceProvider;
use super::resolver::Resolver;
use super::{ContainerError, ErasedInstance, ServiceRegistration};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// 作用域状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// 作用域已打开，可以解析服务
    Active,
    /// 作用域正在释放实例
    Disposing,
    /// 作用域已释放，不能继续使用
    Disposed,
}

/// 作用域信息
#[derive(Debug, Clone)]
pub struct ScopeInfo {
    /// 作用域ID
    pub id: Uuid,
    /// 作用域名称
    pub name: String,
    /// 作用域状态
    pub state: ScopeState,
    /// 创建时间
    pub created_at: Instant,
    /// 释放时间
    pub disposed_at: Option<Instant>,
    /// 当前缓存的作用域实例数量
    pub instance_count: usize,
}

impl ScopeInfo {
    fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            state: ScopeState::Active,
            created_at: Instant::now(),
            disposed_at: None,
            instance_count: 0,
        }
    }

    /// 作用域存活时长
    pub fn duration(&self) -> Duration {
        match self.disposed_at {
            Some(end) => end - self.created_at,
            None => self.created_at.elapsed(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ScopeState::Active
    }
}

pub(crate) struct ScopeCore {
    pub(crate) provider: ServiceProvider,
    info: Mutex<ScopeInfo>,
    instances: Mutex<HashMap<TypeId, ErasedInstance>>,
}

impl ScopeCore {
    fn ensure_active(&self) -> Result<(), ContainerError> {
        let info = self.info.lock();
        if info.is_active() {
            Ok(())
        } else {
            Err(ContainerError::ScopeDisposed {
                scope: info.name.clone(),
            })
        }
    }

    /// 获取或创建作用域实例。创建期间不持有锁，嵌套的作用域依赖可以正常解析
    pub(crate) fn get_or_create(
        &self,
        registration: &ServiceRegistration,
        resolver: &Resolver<'_>,
    ) -> Result<ErasedInstance, ContainerError> {
        self.ensure_active()?;
        let type_id = registration.key.type_id();

        if let Some(cached) = self.instances.lock().get(&type_id).cloned() {
            return Ok(cached);
        }

        let created = (registration.factory)(resolver)?;
        self.provider.core.stats.record_scoped();

        // 工厂运行期间作用域可能已被释放
        self.ensure_active()?;
        let mut instances = self.instances.lock();
        let instance = instances.entry(type_id).or_insert(created).clone();
        self.info.lock().instance_count = instances.len();
        Ok(instance)
    }

    fn dispose(&self) {
        {
            let mut info = self.info.lock();
            if info.state != ScopeState::Active {
                return;
            }
            info.state = ScopeState::Disposing;
        }

        let released = std::mem::take(&mut *self.instances.lock());
        let released_count = released.len();
        drop(released);

        let mut info = self.info.lock();
        info.state = ScopeState::Disposed;
        info.disposed_at = Some(Instant::now());
        info.instance_count = 0;
        self.provider.core.stats.record_scope_disposed();

        tracing::debug!(
            scope = %info.id,
            name = %info.name,
            released = released_count,
            duration_us = info.duration().as_micros() as u64,
            "scope disposed"
        );
    }
}

/// 一次性的子作用域
///
/// 作用域服务在作用域内只创建一次；作用域被 drop（或显式 [`dispose`](Self::dispose)）
/// 时立即释放所有作用域实例，无论调用方是正常返回还是提前返回错误。
pub struct ServiceScope {
    core: Arc<ScopeCore>,
}

impl ServiceScope {
    pub(crate) fn new(provider: ServiceProvider, name: String) -> Self {
        let info = ScopeInfo::new(name);
        provider.core.stats.record_scope_created();
        tracing::debug!(scope = %info.id, name = %info.name, "scope opened");

        Self {
            core: Arc::new(ScopeCore {
                provider,
                info: Mutex::new(info),
                instances: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.core.info.lock().id
    }

    pub fn info(&self) -> ScopeInfo {
        self.core.info.lock().clone()
    }

    /// 在作用域内解析服务
    pub fn resolve<T>(&self) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolver().resolve::<T>()
    }

    /// 作用域解析器
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::scoped(&self.core.provider.core, &self.core)
    }

    /// 可以在作用域外保留的只读句柄，用于观察作用域是否已释放
    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle::from_core(self.core.clone())
    }

    /// 显式释放作用域
    pub fn dispose(self) {}
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        self.core.dispose();
    }
}

impl std::fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ServiceScope").field(&*self.core.info.lock()).finish()
    }
}

/// 作用域句柄
///
/// 不拥有作用域的生命周期：作用域释放后，通过句柄的解析会返回 `ScopeDisposed`。
#[derive(Clone)]
pub struct ScopeHandle {
    core: Arc<ScopeCore>,
}

impl ScopeHandle {
    pub(crate) fn from_core(core: Arc<ScopeCore>) -> Self {
        Self { core }
    }

    pub fn id(&self) -> Uuid {
        self.core.info.lock().id
    }

    pub fn info(&self) -> ScopeInfo {
        self.core.info.lock().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.core.info.lock().state == ScopeState::Disposed
    }

    /// 通过句柄在作用域内解析服务
    pub fn resolve<T>(&self) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.core.ensure_active()?;
        Resolver::scoped(&self.core.provider.core, &self.core).resolve::<T>()
    }
}

impl std::fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ScopeHandle").field(&*self.core.info.lock()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::ContainerBuilder;
    use super::*;
    use std::sync::Weak;

    struct UnitOfWork {
        label: &'static str,
    }

    struct Clock;

    struct Session {
        unit: Arc<UnitOfWork>,
        clock: Arc<Clock>,
    }

    fn provider() -> ServiceProvider {
        let mut services = ContainerBuilder::new();
        services
            .add_scoped(|_| Ok(UnitOfWork { label: "uow" }))
            .add_singleton(|_| Ok(Clock))
            .add_scoped(|r| {
                Ok(Session {
                    unit: r.resolve::<UnitOfWork>()?,
                    clock: r.resolve::<Clock>()?,
                })
            });
        services.build()
    }

    #[test]
    fn test_scoped_instance_shared_within_scope() {
        let provider = provider();
        let scope = provider.create_scope();

        let first = scope.resolve::<UnitOfWork>().unwrap();
        let second = scope.resolve::<UnitOfWork>().unwrap();
        let session = scope.resolve::<Session>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &session.unit));
        assert_eq!(first.label, "uow");
        assert_eq!(scope.info().instance_count, 2);
    }

    #[test]
    fn test_scopes_are_isolated_but_share_singletons() {
        let provider = provider();
        let left = provider.create_named_scope("left");
        let right = provider.create_named_scope("right");

        let left_session = left.resolve::<Session>().unwrap();
        let right_session = right.resolve::<Session>().unwrap();

        assert!(!Arc::ptr_eq(&left_session.unit, &right_session.unit));
        assert!(Arc::ptr_eq(&left_session.clock, &right_session.clock));
        assert_ne!(left.id(), right.id());
    }

    #[test]
    fn test_drop_releases_instances() {
        let provider = provider();
        let scope = provider.create_named_scope("invocation");
        let handle = scope.handle();

        let unit: Weak<UnitOfWork> = Arc::downgrade(&scope.resolve::<UnitOfWork>().unwrap());
        assert!(unit.upgrade().is_some());

        drop(scope);

        assert!(unit.upgrade().is_none());
        assert!(handle.is_disposed());
        assert_eq!(handle.info().state, ScopeState::Disposed);
        assert!(handle.info().disposed_at.is_some());
        assert!(matches!(
            handle.resolve::<UnitOfWork>(),
            Err(ContainerError::ScopeDisposed { scope }) if scope == "invocation"
        ));
    }

    #[test]
    fn test_explicit_dispose_updates_stats() {
        let provider = provider();
        let scope = provider.create_scope();
        scope.resolve::<UnitOfWork>().unwrap();
        assert_eq!(provider.stats().active_scopes(), 1);

        scope.dispose();

        let stats = provider.stats();
        assert_eq!(stats.scopes_created, 1);
        assert_eq!(stats.scopes_disposed, 1);
        assert_eq!(stats.scoped_creations, 1);
        assert_eq!(stats.active_scopes(), 0);
    }

    #[test]
    fn test_handle_resolves_while_active() {
        let provider = provider();
        let scope = provider.create_scope();
        let handle = scope.handle();

        let via_handle = handle.resolve::<UnitOfWork>().unwrap();
        let via_scope = scope.resolve::<UnitOfWork>().unwrap();
        assert!(Arc::ptr_eq(&via_handle, &via_scope));
        assert!(!handle.is_disposed());
        assert_eq!(handle.id(), scope.id());
    }

    #[test]
    fn test_resolver_exposes_scope_handle() {
        struct Probe {
            scope: Option<ScopeHandle>,
        }

        let mut services = ContainerBuilder::new();
        services.add_scoped(|r| Ok(Probe { scope: r.scope_handle() }));
        let provider = services.build();
        let scope = provider.create_scope();

        let probe = scope.resolve::<Probe>().unwrap();
        let captured = probe.scope.clone().unwrap();
        assert_eq!(captured.id(), scope.id());

        drop(scope);
        assert!(captured.is_disposed());
        assert!(provider.resolver().scope_handle().is_none());
    }
}
