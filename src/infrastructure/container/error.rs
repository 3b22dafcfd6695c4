use thiserror::Error;

/// 依赖注入容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 服务未注册
    #[error("Service '{service}' is not registered{}", requested_by_suffix(.requested_by))]
    ServiceNotRegistered {
        service: String,
        requested_by: Option<String>,
    },
    /// 作用域服务在没有打开作用域的情况下被解析，或被单例捕获
    #[error("Scoped service '{service}' cannot be resolved outside an open scope{}", requested_by_suffix(.requested_by))]
    InvalidLifetime {
        service: String,
        requested_by: Option<String>,
    },
    /// 循环依赖
    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },
    /// 服务创建失败
    #[error("Failed to create service '{service}': {reason}")]
    CreationFailed { service: String, reason: String },
    /// 类型转换失败
    #[error("Type cast failed: expected '{expected}' in {context}")]
    TypeCastFailed { expected: String, context: String },
    /// 作用域已释放
    #[error("Scope '{scope}' has been disposed")]
    ScopeDisposed { scope: String },
}

fn requested_by_suffix(requested_by: &Option<String>) -> String {
    match requested_by {
        Some(dependent) => format!(" (requested by '{}')", dependent),
        None => String::new(),
    }
}

impl ContainerError {
    /// 创建服务构造失败错误
    pub fn creation_failed<T: ?Sized>(reason: impl Into<String>) -> Self {
        ContainerError::CreationFailed {
            service: std::any::type_name::<T>().to_string(),
            reason: reason.into(),
        }
    }

    /// 与此错误相关的服务名称
    pub fn service(&self) -> Option<&str> {
        match self {
            ContainerError::ServiceNotRegistered { service, .. }
            | ContainerError::InvalidLifetime { service, .. }
            | ContainerError::CreationFailed { service, .. } => Some(service),
            ContainerError::TypeCastFailed { expected, .. } => Some(expected),
            ContainerError::CircularDependency { chain } => chain.last().map(String::as_str),
            ContainerError::ScopeDisposed { .. } => None,
        }
    }
}
