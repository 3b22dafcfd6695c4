//! Commands shipped with the plugin.

pub mod greet;

pub use greet::{GreetCommand, MessageProvider, GREETING};

use crate::command::CommandCatalog;

/// Catalog with every built-in command, in button order.
pub fn builtin_catalog() -> CommandCatalog {
    let mut catalog = CommandCatalog::new();
    catalog.register::<GreetCommand>();
    catalog
}
