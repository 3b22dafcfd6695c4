pub mod capability;
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod errors;
pub mod host;
pub mod infrastructure; // 依赖注入容器
pub mod logging;

// Re-export commonly used items for convenience
pub use capability::CapabilityResolver;
pub use command::{Command, CommandCatalog, CommandDescriptor, DiCommand, ScopedCommandExecutor};
pub use config::PluginConfig;
pub use context::ApplicationContext;
pub use errors::AppError;
pub use host::{HostContext, PluginApplication, ResultCode};
pub use infrastructure::{ContainerBuilder, ServiceProvider};
