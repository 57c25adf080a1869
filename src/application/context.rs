use crate::di::{Container, TypeKey};
use crate::error::{NestError, Result};
use crate::module::{ModuleDef, ModuleNode};
use std::sync::Arc;

/// View of the container from one registered module.
///
/// Lookups are limited to what the module can see: its own providers and
/// controllers, the exports of its imports and the exports of global modules.
pub struct ApplicationContext<'a> {
    container: &'a Container,
    module: &'a ModuleNode,
}

impl<'a> ApplicationContext<'a> {
    pub(crate) fn new(container: &'a Container, module: &ModuleDef) -> Result<Self> {
        let token = container.module_compiler().token_of(module);
        let module = container.get_module_by_key(&token)?;
        Ok(Self { container, module })
    }

    pub fn module(&self) -> &'a ModuleNode {
        self.module
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// Select a module from the same container.
    pub fn select(&self, module: &ModuleDef) -> Result<ApplicationContext<'a>> {
        ApplicationContext::new(self.container, module)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        if !self.is_visible(key) {
            return Err(NestError::DependencyNotFound {
                type_name: format!("{} (not visible from {})", key.short_name(), self.module.name()),
            });
        }
        self.container.get::<T>()
    }

    fn is_visible(&self, key: TypeKey) -> bool {
        if self.module.has_provider(key) || self.module.has_controller(key) {
            return true;
        }
        let exported_by = |token: &str| {
            self.container
                .modules()
                .get(token)
                .is_some_and(|node| node.exports().contains(&key))
        };
        self.module.imports().iter().any(|token| exported_by(token.as_str()))
            || self
                .container
                .global_modules()
                .any(|node| node.exports().contains(&key))
    }
}
