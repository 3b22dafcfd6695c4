//! 能力解析器
//!
//! 把宿主环境中的单例（当前活动应用、对话框服务等）包装在一个小接口后面，
//! 命令代码只依赖 [`CapabilityResolver<T>`]，不直接接触宿主内部对象。

use crate::errors::CapabilityError;
use crate::host::{ActiveHostHandle, DialogService, HostContext};
use crate::infrastructure::{ContainerBuilder, Resolver};
use std::sync::Arc;

/// 在运行时从宿主获取类型为 `T` 的值
///
/// 实现必须无副作用，并且可以重复调用；缓存由容器的单例生命周期负责。
pub trait CapabilityResolver<T>: Send + Sync {
    fn get(&self) -> Result<T, CapabilityError>;
}

/// 解析当前活动的宿主应用
pub struct ActiveHostResolver {
    host: HostContext,
}

impl ActiveHostResolver {
    pub fn new(host: HostContext) -> Self {
        Self { host }
    }
}

impl CapabilityResolver<ActiveHostHandle> for ActiveHostResolver {
    fn get(&self) -> Result<ActiveHostHandle, CapabilityError> {
        self.host.environment().active_application().ok_or_else(|| {
            CapabilityError::unresolved::<ActiveHostHandle>(format!(
                "host '{}' has no active application yet",
                self.host.host_name()
            ))
        })
    }
}

/// 解析宿主的对话框服务
pub struct HostDialogResolver {
    host: HostContext,
}

impl HostDialogResolver {
    pub fn new(host: HostContext) -> Self {
        Self { host }
    }
}

impl CapabilityResolver<Arc<dyn DialogService>> for HostDialogResolver {
    fn get(&self) -> Result<Arc<dyn DialogService>, CapabilityError> {
        self.host.environment().dialogs().ok_or_else(|| {
            CapabilityError::unresolved::<dyn DialogService>(format!(
                "host '{}' does not provide dialogs",
                self.host.host_name()
            ))
        })
    }
}

impl ContainerBuilder {
    /// 注册宿主上下文本身以及基础能力解析器
    pub fn add_host_capabilities(&mut self, host: &HostContext) -> &mut Self {
        tracing::debug!(host = host.host_name(), "registering host capabilities");
        self.add_instance(host.clone())
            .add_capability::<ActiveHostHandle, _, _>(|r: &Resolver<'_>| {
                let host = r.resolve::<HostContext>()?;
                Ok(ActiveHostResolver::new(HostContext::clone(&host)))
            })
            .add_capability::<Arc<dyn DialogService>, _, _>(|r: &Resolver<'_>| {
                let host = r.resolve::<HostContext>()?;
                Ok(HostDialogResolver::new(HostContext::clone(&host)))
            })
    }
}
