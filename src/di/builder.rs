use crate::config::ContainerConfig;
use crate::di::Container;
use crate::error::Result;
use crate::module::ModuleDef;

/// Builder for a container with pre-registered values and modules.
///
/// # Example
/// ```rust,ignore
/// let container = ContainerBuilder::new()
///     .reset_instances_on_clear(false)
///     .register(DatabaseUrl::from_env())
///     .module(ModuleDef::of::<AppModule>())
///     .build()?;
/// ```
pub struct ContainerBuilder {
    config: ContainerConfig,
    values: Vec<Box<dyn FnOnce(&mut Container) + Send>>,
    modules: Vec<ModuleDef>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
            values: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reset_instances_on_clear(mut self, reset: bool) -> Self {
        self.config.reset_instances_on_clear = reset;
        self
    }

    /// Register a service instance
    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.values.push(Box::new(move |container: &mut Container| {
            container.register(instance);
        }));
        self
    }

    /// Queue a module; modules are added in order after every value.
    pub fn module(mut self, module: ModuleDef) -> Self {
        self.modules.push(module);
        self
    }

    /// Build the container, registering every queued value and module.
    pub fn build(self) -> Result<Container> {
        let mut container = Container::with_config(self.config);
        for register in self.values {
            register(&mut container);
        }
        container.add_modules(&self.modules)?;
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
