use super::{CommandDescriptor, DiCommand};

/// 插件提供的命令目录，保持注册顺序
///
/// 同一命令ID只保留第一次注册。
#[derive(Debug, Clone, Default)]
pub struct CommandCatalog {
    commands: Vec<CommandDescriptor>,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: DiCommand>(&mut self) -> &mut Self {
        self.insert(CommandDescriptor::of::<T>())
    }

    pub fn insert(&mut self, descriptor: CommandDescriptor) -> &mut Self {
        if let Some(existing) = self.get(descriptor.id()) {
            tracing::warn!(
                command = descriptor.id(),
                existing = existing.type_name(),
                ignored = descriptor.type_name(),
                "duplicate command id ignored"
            );
            return self;
        }
        self.commands.push(descriptor);
        self
    }

    pub fn get(&self, id: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|d| d.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.commands.iter().map(|d| d.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::errors::CommandError;
    use crate::host::ResultCode;
    use crate::infrastructure::{ContainerError, Resolver};

    macro_rules! command {
        ($ty:ident, $id:expr) => {
            struct $ty;

            impl Command for $ty {
                fn execute(&self) -> Result<ResultCode, CommandError> {
                    Ok(ResultCode::Succeeded)
                }
            }

            impl DiCommand for $ty {
                const ID: &'static str = $id;
                const NAME: &'static str = stringify!($ty);

                fn construct(_: &Resolver<'_>) -> Result<Self, ContainerError> {
                    Ok($ty)
                }
            }
        };
    }

    command!(First, "first");
    command!(Second, "second");
    command!(Impostor, "first");

    #[test]
    fn test_catalog_keeps_registration_order() {
        let mut catalog = CommandCatalog::new();
        catalog.register::<Second>().register::<First>();

        assert_eq!(catalog.ids(), vec!["second", "first"]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("first").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_id_keeps_first_registration() {
        let mut catalog = CommandCatalog::new();
        catalog.register::<First>().register::<Impostor>();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("first").unwrap().type_name().ends_with("First"));
    }
}
