//! 基础设施层
//!
//! 提供依赖注入容器：服务注册、生命周期管理与作用域释放。

pub mod container;

pub use container::{
    ContainerBuilder, ContainerError, ContainerStats, Resolver, ScopeHandle, ScopeInfo,
    ScopeState, ServiceKey, ServiceLifetime, ServiceProvider, ServiceScope,
};
