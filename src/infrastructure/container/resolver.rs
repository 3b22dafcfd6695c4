use super::provider::ProviderCore;
use super::scope::{ScopeCore, ScopeHandle};
use super::{downcast_instance, ContainerError, ErasedInstance, ServiceKey, ServiceLifetime};
use std::cell::RefCell;
use std::sync::Arc;

/// 一次解析调用链的上下文
///
/// 工厂函数通过它解析自己的依赖。根解析器只能看到单例和瞬态服务；
/// 作用域解析器额外持有当前作用域，作用域服务在其中缓存。
pub struct Resolver<'a> {
    provider: &'a ProviderCore,
    scope: Option<&'a Arc<ScopeCore>>,
    chain: RefCell<Vec<ServiceKey>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn root(provider: &'a ProviderCore) -> Self {
        Self::with_chain(provider, None, Vec::new())
    }

    pub(crate) fn scoped(provider: &'a ProviderCore, scope: &'a Arc<ScopeCore>) -> Self {
        Self::with_chain(provider, Some(scope), Vec::new())
    }

    fn with_chain(
        provider: &'a ProviderCore,
        scope: Option<&'a Arc<ScopeCore>>,
        chain: Vec<ServiceKey>,
    ) -> Self {
        Self {
            provider,
            scope,
            chain: RefCell::new(chain),
        }
    }

    /// 解析服务
    pub fn resolve<T>(&self) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        let instance = self.resolve_key(key)?;
        downcast_instance::<T>(key, &instance, "service resolution")
    }

    /// 服务已注册时解析，未注册时返回 `None`
    pub fn try_resolve<T>(&self) -> Result<Option<Arc<T>>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if !self.is_registered::<T>() {
            return Ok(None);
        }
        self.resolve::<T>().map(Some)
    }

    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.provider.find(ServiceKey::of::<T>()).is_some()
    }

    /// 是否在打开的作用域中解析
    pub fn in_scope(&self) -> bool {
        self.scope.is_some()
    }

    /// 当前作用域的句柄；根解析器返回 `None`
    pub fn scope_handle(&self) -> Option<ScopeHandle> {
        self.scope.map(|core| ScopeHandle::from_core(core.clone()))
    }

    fn resolve_key(&self, key: ServiceKey) -> Result<ErasedInstance, ContainerError> {
        self.provider.stats.record_resolution();

        let registration = self.provider.find(key).ok_or_else(|| {
            tracing::debug!(service = key.name(), "service not registered");
            ContainerError::ServiceNotRegistered {
                service: key.name().to_string(),
                requested_by: self.dependent(),
            }
        })?;

        let requested_by = self.dependent();
        self.enter(key)?;
        let result = match registration.lifetime {
            ServiceLifetime::Singleton => {
                // 单例总是在根上下文中创建，避免捕获作用域服务
                let root = Resolver::with_chain(self.provider, None, self.chain.borrow().clone());
                self.provider.singleton(registration, &root)
            }
            ServiceLifetime::Scoped => match self.scope {
                Some(scope) => scope.get_or_create(registration, self),
                None => Err(ContainerError::InvalidLifetime {
                    service: key.name().to_string(),
                    requested_by,
                }),
            },
            ServiceLifetime::Transient => {
                self.provider.stats.record_transient();
                (registration.factory)(self)
            }
        };
        self.chain.borrow_mut().pop();

        tracing::trace!(
            service = key.name(),
            lifetime = %registration.lifetime,
            ok = result.is_ok(),
            "service resolved"
        );
        result
    }

    fn enter(&self, key: ServiceKey) -> Result<(), ContainerError> {
        let mut chain = self.chain.borrow_mut();
        if chain.contains(&key) {
            let mut names: Vec<String> = chain.iter().map(|k| k.name().to_string()).collect();
            names.push(key.name().to_string());
            return Err(ContainerError::CircularDependency { chain: names });
        }
        chain.push(key);
        Ok(())
    }

    /// 当前正在构造的服务（即发起这次解析的一方）
    fn dependent(&self) -> Option<String> {
        self.chain.borrow().last().map(|k| k.name().to_string())
    }
}
