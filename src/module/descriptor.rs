use crate::controller::{Controller, ControllerDef};
use crate::di::{Component, ComponentDef, TypeKey};
use std::fmt;

/// Trait for application modules
///
/// Modules are typically defined using the `#[module]` macro, which implements
/// this trait from the declared lists.
///
/// # Example
/// ```
/// use nestrs::{module, Injectable};
///
/// #[derive(Injectable)]
/// pub struct UserService {}
///
/// #[module(providers = [UserService], exports = [UserService])]
/// pub struct UserModule;
/// ```
pub trait Module: 'static {
    fn descriptor() -> ModuleDescriptor;
}

/// Declarative record attached to a module type.
///
/// A list left as `None` was never declared, which is how the compiler tells a
/// module apart from a type that was never declared as one.
#[derive(Clone, Default, Debug)]
pub struct ModuleDescriptor {
    pub imports: Option<Vec<ModuleDef>>,
    pub providers: Option<Vec<ComponentDef>>,
    pub controllers: Option<Vec<ControllerDef>>,
    pub exports: Option<Vec<TypeKey>>,
    pub is_global: bool,
}

impl ModuleDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn imports(mut self, imports: Vec<ModuleDef>) -> Self {
        self.imports.get_or_insert_with(Vec::new).extend(imports);
        self
    }

    pub fn providers(mut self, providers: Vec<ComponentDef>) -> Self {
        self.providers.get_or_insert_with(Vec::new).extend(providers);
        self
    }

    pub fn controllers(mut self, controllers: Vec<ControllerDef>) -> Self {
        self.controllers
            .get_or_insert_with(Vec::new)
            .extend(controllers);
        self
    }

    pub fn exports(mut self, exports: Vec<TypeKey>) -> Self {
        self.exports.get_or_insert_with(Vec::new).extend(exports);
        self
    }

    pub fn import<M: Module>(self) -> Self {
        self.imports(vec![ModuleDef::of::<M>()])
    }

    pub fn provider<T: Component>(self) -> Self {
        self.providers(vec![ComponentDef::of::<T>()])
    }

    pub fn controller<C: Controller>(self) -> Self {
        self.controllers(vec![ControllerDef::of::<C>()])
    }

    pub fn export<T: 'static>(self) -> Self {
        self.exports(vec![TypeKey::of::<T>()])
    }

    pub fn global(mut self, is_global: bool) -> Self {
        self.is_global = is_global;
        self
    }

    pub fn has_module_metadata(&self) -> bool {
        self.imports.is_some() || self.providers.is_some() || self.controllers.is_some()
    }
}

/// A reference to a module type, optionally parameterized.
///
/// Static definitions come from [`ModuleDef::of`]. Dynamic ones carry a JSON
/// configuration that is folded into the module token, plus extra providers
/// (usually pre-built values) that override same-typed providers of the base
/// descriptor.
#[derive(Clone)]
pub struct ModuleDef {
    key: TypeKey,
    descriptor: fn() -> ModuleDescriptor,
    config: Option<serde_json::Value>,
    extra_providers: Vec<ComponentDef>,
    extra_exports: Vec<TypeKey>,
}

impl ModuleDef {
    pub fn of<M: Module>() -> Self {
        Self::new(TypeKey::of::<M>(), M::descriptor)
    }

    pub fn new(key: TypeKey, descriptor: fn() -> ModuleDescriptor) -> Self {
        Self {
            key,
            descriptor,
            config: None,
            extra_providers: Vec::new(),
            extra_exports: Vec::new(),
        }
    }

    /// Parameterize `M` with a configuration value.
    pub fn dynamic<M: Module>(config: serde_json::Value) -> Self {
        Self {
            config: Some(config),
            ..Self::of::<M>()
        }
    }

    pub fn with_provider(mut self, provider: ComponentDef) -> Self {
        self.extra_providers.push(provider);
        self
    }

    /// Add a pre-built instance as an exported provider of this module.
    pub fn with_value<T: Send + Sync + 'static>(mut self, instance: T) -> Self {
        self.extra_exports.push(TypeKey::of::<T>());
        self.with_provider(ComponentDef::value(instance))
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.short_name()
    }

    pub fn config(&self) -> Option<&serde_json::Value> {
        self.config.as_ref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.config.is_some()
    }

    /// Descriptor of the module type merged with the dynamic additions.
    pub fn descriptor(&self) -> ModuleDescriptor {
        let mut descriptor = (self.descriptor)();
        if !self.extra_providers.is_empty() {
            let providers = descriptor.providers.get_or_insert_with(Vec::new);
            providers.retain(|p| !self.extra_providers.iter().any(|e| e.key() == p.key()));
            providers.extend(self.extra_providers.iter().cloned());
        }
        if !self.extra_exports.is_empty() {
            let exports = descriptor.exports.get_or_insert_with(Vec::new);
            for export in &self.extra_exports {
                if !exports.contains(export) {
                    exports.push(*export);
                }
            }
        }
        descriptor
    }
}

impl fmt::Debug for ModuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDef")
            .field("type", &self.key)
            .field("config", &self.config)
            .field("extra_providers", &self.extra_providers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EmptyModule;

    impl Module for EmptyModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new()
        }
    }

    struct SettingsModule;

    impl Module for SettingsModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().exports(vec![])
        }
    }

    struct Settings {
        #[allow(dead_code)]
        url: String,
    }

    #[test]
    fn test_undeclared_lists_mean_no_metadata() {
        assert!(!EmptyModule::descriptor().has_module_metadata());
        assert!(!SettingsModule::descriptor().has_module_metadata());
        assert!(
            ModuleDescriptor::new()
                .imports(vec![])
                .has_module_metadata()
        );
    }

    #[test]
    fn test_dynamic_module_merges_values() {
        let def = ModuleDef::dynamic::<SettingsModule>(json!({ "url": "sqlite::memory:" }))
            .with_value(Settings {
                url: "sqlite::memory:".into(),
            });

        assert!(def.is_dynamic());
        let descriptor = def.descriptor();
        let providers = descriptor.providers.as_ref().expect("providers declared");
        assert_eq!(providers.len(), 1);
        assert!(providers[0].is_value());
        assert_eq!(descriptor.exports, Some(vec![TypeKey::of::<Settings>()]));
        assert!(descriptor.has_module_metadata());
    }
}
