use crate::command::ExecutionError;
use crate::infrastructure::ContainerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Host context is not initialized: {0}")]
    NotInitialized(String),
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Logging error: {0}")]
    Logging(String),
}

impl AppError {
    /// 是否在命令体开始执行之前失败（守卫失败，而非命令失败）
    pub fn is_guard(&self) -> bool {
        match self {
            AppError::Execution(err) => err.is_guard(),
            AppError::Config(_) | AppError::Logging(_) => false,
            _ => true,
        }
    }
}

/// Failure to obtain a value from the host environment.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Capability '{capability}' could not be resolved: {reason}")]
    Unresolved {
        capability: &'static str,
        reason: String,
    },
    #[error("Host operation '{operation}' failed: {reason}")]
    HostOperation { operation: String, reason: String },
}

impl CapabilityError {
    pub fn unresolved<T: ?Sized>(reason: impl Into<String>) -> Self {
        CapabilityError::Unresolved {
            capability: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    pub fn host_operation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CapabilityError::HostOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised from inside a command body.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for '{field}'")]
    InvalidValue { field: String, value: String },
}
