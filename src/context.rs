// 插件应用上下文
// 持有宿主启动句柄与延迟构建的服务容器，容器在第一次请求时构建，之后一直复用

use crate::command::CommandCatalog;
use crate::errors::AppError;
use crate::host::HostContext;
use crate::infrastructure::{ContainerBuilder, ServiceProvider};
use crate::logging::OperationTimer;
use parking_lot::{Mutex, RwLock};

/// 应用上下文
///
/// 每个插件实例一个，通过 `Arc` 传递，不依赖任何全局状态，多个上下文可以并存。
pub struct ApplicationContext {
    catalog: CommandCatalog,
    host: RwLock<Option<HostContext>>,
    container: Mutex<Option<ServiceProvider>>,
}

impl ApplicationContext {
    pub fn new(catalog: CommandCatalog) -> Self {
        Self {
            catalog,
            host: RwLock::new(None),
            container: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// 保存宿主启动句柄
    ///
    /// 容器已经构建时不会重建，之后的 `container()` 仍然返回原容器。
    pub fn initialize(&self, host: HostContext) {
        tracing::info!(host = host.host_name(), "application context initialized");
        if self.is_built() {
            tracing::debug!("container already built, keeping cached instance");
        }
        *self.host.write() = Some(host);
    }

    pub fn is_initialized(&self) -> bool {
        self.host.read().is_some()
    }

    pub fn is_built(&self) -> bool {
        self.container.lock().is_some()
    }

    pub fn host(&self) -> Option<HostContext> {
        self.host.read().clone()
    }

    /// 丢弃宿主句柄和已构建的容器
    pub fn reset(&self) {
        let dropped = self.container.lock().take();
        *self.host.write() = None;
        if let Some(provider) = dropped {
            tracing::info!(container = %provider.id(), "application context reset");
        }
    }

    /// 获取服务容器，第一次调用时构建
    ///
    /// 构建过程在互斥锁内进行，并发的第一次调用只会构建一次。
    pub fn container(&self) -> Result<ServiceProvider, AppError> {
        let host = self.host().ok_or_else(|| {
            AppError::NotInitialized("container requested before host startup".to_string())
        })?;

        let mut cached = self.container.lock();
        if let Some(provider) = cached.as_ref() {
            return Ok(provider.clone());
        }

        let provider = self.build_container(&host);
        *cached = Some(provider.clone());
        Ok(provider)
    }

    fn build_container(&self, host: &HostContext) -> ServiceProvider {
        let timer = OperationTimer::new("build_container")
            .with_metadata("host", host.host_name())
            .with_metadata("commands", self.catalog.len());

        let mut services = ContainerBuilder::new();
        services.add_host_capabilities(host);
        for descriptor in self.catalog.iter() {
            services.add_command(descriptor);
        }
        let provider = services.build();

        timer.finish();
        provider
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("commands", &self.catalog.ids())
            .field("initialized", &self.is_initialized())
            .field("built", &self.is_built())
            .finish()
    }
}
