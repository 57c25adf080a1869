use crate::config::ContainerConfig;
use crate::controller::ControllerDef;
use crate::di::{ClassMetadata, Component, ComponentDef, Injector, Instance, TypeKey};
use crate::error::{NestError, Result};
use crate::module::{
    ModuleCompiler, ModuleDef, ModuleFactory, ModuleMetadata, ModuleNode, ModuleTokenFactory,
    ModulesContainer,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of [`Container::add_module`].
#[derive(Debug, Clone)]
pub struct AddModuleResult {
    pub module_ref: ModuleNode,
    pub inserted: bool,
}

/// The dependency container: module registry plus singleton injector.
///
/// Built once at process entry, filled by [`Container::add_module`] on the boot
/// thread, then shared read-only (`Arc<Container>`) with request handlers.
pub struct Container {
    config: ContainerConfig,
    modules: ModulesContainer,
    module_compiler: ModuleCompiler,
    modules_metadata: HashMap<String, ModuleMetadata>,
    global_modules: HashSet<String>,
    injector: Injector,
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            modules: ModulesContainer::new(),
            module_compiler: ModuleCompiler::new(ModuleTokenFactory::new()),
            modules_metadata: HashMap::new(),
            global_modules: HashSet::new(),
            injector: Injector::new(),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn modules(&self) -> &ModulesContainer {
        &self.modules
    }

    pub fn module_compiler(&self) -> &ModuleCompiler {
        &self.module_compiler
    }

    pub fn module_token_factory(&self) -> &ModuleTokenFactory {
        self.module_compiler.token_factory()
    }

    pub fn modules_metadata(&self) -> &HashMap<String, ModuleMetadata> {
        &self.modules_metadata
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    pub fn get_module_by_key(&self, token: &str) -> Result<&ModuleNode> {
        self.modules
            .get(token)
            .ok_or_else(|| NestError::unknown_module(token))
    }

    pub fn global_modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.modules
            .values()
            .filter(|module| self.global_modules.contains(module.token()))
    }

    /// Register a service instance as an already resolved singleton.
    pub fn register<T: Send + Sync + 'static>(&mut self, instance: T) -> &mut Self {
        self.injector.bind(&ComponentDef::value(instance));
        self
    }

    /// Register a module and, recursively, everything it imports.
    ///
    /// A token that is already registered is a no-op returning the existing
    /// node with `inserted == false`.
    pub fn add_module(&mut self, module: &ModuleDef) -> Result<AddModuleResult> {
        self.bind_value_providers(module, &mut HashSet::new())?;
        self.add_module_at(module, 0)
    }

    pub fn add_modules(&mut self, modules: &[ModuleDef]) -> Result<()> {
        for module in modules {
            self.add_module(module)?;
        }
        Ok(())
    }

    fn add_module_at(&mut self, module: &ModuleDef, distance: usize) -> Result<AddModuleResult> {
        let module_factory = self.module_compiler.compile(module)?;
        if let Some(existing) = self.modules.get(&module_factory.token) {
            return Ok(AddModuleResult {
                module_ref: existing.clone(),
                inserted: false,
            });
        }
        let module_ref = self.set_module(module_factory, distance)?;
        Ok(AddModuleResult {
            module_ref,
            inserted: true,
        })
    }

    fn set_module(&mut self, module_factory: ModuleFactory, distance: usize) -> Result<ModuleNode> {
        let ModuleFactory {
            metatype,
            token,
            dynamic_metadata,
        } = module_factory;

        let mut node = ModuleNode::new(metatype, token.clone());
        node.set_distance(distance);
        node.set_global(dynamic_metadata.is_global);
        self.modules.insert(node);
        if dynamic_metadata.is_global {
            self.global_modules.insert(token.clone());
        }
        tracing::info!(token = %&token[..12], distance, "{} detected", metatype.short_name());

        let imports = dynamic_metadata.imports.clone();
        let providers = dynamic_metadata.providers.clone();
        let controllers = dynamic_metadata.controllers.clone();
        let exports = dynamic_metadata.exports.clone();
        self.add_metadata(&token, dynamic_metadata);

        self.add_imports(&token, &imports, distance)?;
        self.add_providers(&providers, &token)?;
        self.set_exports(&token, exports)?;
        self.add_controllers(&controllers, &token)?;

        let node = self.get_module_by_key(&token)?.clone();
        tracing::debug!(
            module = node.name(),
            providers = providers.len(),
            controllers = controllers.len(),
            "module ready"
        );
        Ok(node)
    }

    /// Bind the value providers of every not yet registered module reachable
    /// from `module`, so constructors never run ahead of a value for the same type.
    fn bind_value_providers(&self, module: &ModuleDef, seen: &mut HashSet<String>) -> Result<()> {
        let module_factory = self.module_compiler.compile(module)?;
        if self.modules.has(&module_factory.token) || !seen.insert(module_factory.token.clone()) {
            return Ok(());
        }
        let metadata = &module_factory.dynamic_metadata;
        for provider in metadata.providers.iter().filter(|p| p.is_value()) {
            self.injector.bind_value(provider)?;
        }
        for import in &metadata.imports {
            self.bind_value_providers(import, seen)?;
        }
        Ok(())
    }

    fn add_metadata(&mut self, token: &str, metadata: ModuleMetadata) {
        self.modules_metadata.insert(token.to_string(), metadata);
    }

    fn add_imports(&mut self, token: &str, imports: &[ModuleDef], distance: usize) -> Result<()> {
        for import in imports {
            let imported = self.add_module_at(import, distance + 1)?;
            let imported_token = imported.module_ref.token().to_string();
            self.modules
                .get_mut(token)
                .ok_or_else(|| NestError::unknown_module(token))?
                .add_import(imported_token);
        }
        Ok(())
    }

    /// Record an import edge between two registered modules.
    pub fn add_related_module(&mut self, related: &ModuleDef, token: &str) -> Result<()> {
        let related_token = self.module_compiler.compile(related)?.token;
        if !self.modules.has(&related_token) {
            return Err(NestError::unknown_module(related_token));
        }
        self.modules
            .get_mut(token)
            .ok_or_else(|| NestError::unknown_module(token))?
            .add_import(related_token);
        Ok(())
    }

    pub fn add_providers(&mut self, providers: &[ComponentDef], module_token: &str) -> Result<()> {
        for provider in providers {
            self.add_provider(module_token, provider)?;
        }
        Ok(())
    }

    pub fn add_controllers(&mut self, controllers: &[ControllerDef], module_token: &str) -> Result<()> {
        for controller in controllers {
            self.add_controller(module_token, controller)?;
        }
        Ok(())
    }

    /// Bind a provider into a module.
    ///
    /// The provider must carry the injectable marker. Its declared dependencies
    /// are resolved first (instantiating or reusing singletons), then the
    /// provider itself is instantiated.
    pub fn add_provider(&mut self, token: &str, provider: &ComponentDef) -> Result<String> {
        let module_name = self.get_module_by_key(token)?.name();
        if !provider.is_injectable() {
            tracing::warn!(provider = %provider.key(), module = module_name, "rejected non-injectable provider");
            return Err(NestError::none_injectable(provider.name(), Some(module_name)));
        }

        self.injector.bind_value(provider)?;
        self.bind_dependencies(provider, module_name)?;
        self.get_instance(provider.key())?;

        let node = self
            .modules
            .get_mut(token)
            .ok_or_else(|| NestError::unknown_module(token))?;
        Ok(node.add_provider(provider.clone()))
    }

    /// Bind a controller into a module; controllers need no marker of their own.
    pub fn add_controller(&mut self, token: &str, controller: &ControllerDef) -> Result<String> {
        let module_name = self.get_module_by_key(token)?.name();
        let component = controller.component();

        self.injector.bind(component);
        self.bind_dependencies(component, module_name)?;
        self.get_instance(component.key())?;

        let node = self
            .modules
            .get_mut(token)
            .ok_or_else(|| NestError::unknown_module(token))?;
        Ok(node.add_controller(controller.clone()))
    }

    fn bind_dependencies(&self, component: &ComponentDef, module_name: &str) -> Result<()> {
        let metadata = self.injector.metadata_of(component);
        for dependency in metadata.dependencies() {
            if !dependency.injectable {
                tracing::warn!(
                    component = component.name(),
                    dependency = dependency.name,
                    "dependency is not injectable"
                );
                return Err(NestError::none_injectable(
                    dependency.key.short_name(),
                    Some(module_name),
                ));
            }
            // Unbound dependencies are bound by `resolve` while the component is built.
            if self.injector.is_bound(dependency.key) {
                self.get_instance(dependency.key)?;
            }
        }
        Ok(())
    }

    /// Cached dependency binding record of a registered type.
    pub fn class_metadata(&self, def: &ComponentDef) -> Arc<ClassMetadata> {
        self.injector.metadata_of(def)
    }

    /// Look up or lazily construct the singleton of a bound type.
    pub fn get_instance(&self, key: TypeKey) -> Result<Instance> {
        self.injector.instance(key, self)
    }

    /// Typed access to a bound singleton.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get_instance(TypeKey::of::<T>())?
            .downcast::<T>()
            .map_err(|_| NestError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Resolve a dependency of a component under construction.
    ///
    /// Called by the code generated for `#[derive(Injectable)]` and
    /// `#[controller]`. Rejects types without the injectable marker and binds
    /// `T` on first use.
    pub fn resolve<T: Component>(&self) -> Result<Arc<T>> {
        if !T::INJECTABLE {
            return Err(NestError::none_injectable(
                TypeKey::of::<T>().short_name(),
                None,
            ));
        }
        self.injector.bind(&ComponentDef::of::<T>());
        self.get::<T>()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.injector.is_bound(TypeKey::of::<T>())
    }

    /// Number of instantiated singletons.
    pub fn len(&self) -> usize {
        self.injector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.injector.is_empty()
    }

    /// Empty the module registry.
    ///
    /// Bindings and singletons are dropped too when
    /// [`ContainerConfig::reset_instances_on_clear`] is set.
    pub fn clear(&mut self) {
        self.clear_modules();
        if self.config.reset_instances_on_clear {
            self.injector.clear();
        }
    }

    /// Empty the module registry, keeping every binding and singleton.
    pub fn clear_modules(&mut self) {
        self.modules.clear();
        self.modules_metadata.clear();
        self.global_modules.clear();
    }

    fn set_exports(&mut self, token: &str, exports: Vec<TypeKey>) -> Result<()> {
        let node = self.get_module_by_key(token)?;
        for export in &exports {
            let re_exported = node.imports().iter().any(|imported| {
                self.modules_metadata
                    .get(imported)
                    .is_some_and(|meta| meta.exports.contains(export))
            });
            if !node.has_provider(*export) && !re_exported {
                return Err(NestError::InvalidExport {
                    module: node.name().to_string(),
                    export: export.short_name().to_string(),
                });
            }
        }
        self.modules
            .get_mut(token)
            .ok_or_else(|| NestError::unknown_module(token))?
            .set_exports(exports);
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, RouteDefinition};
    use crate::module::{Module, ModuleDescriptor};
    use crate::server::AppState;
    use axum::Router;
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Debug)]
    struct ServiceA {
        id: Uuid,
    }

    impl Component for ServiceA {
        const INJECTABLE: bool = true;

        fn inject(_: &Container) -> Result<Self> {
            Ok(Self { id: Uuid::new_v4() })
        }
    }

    struct ServiceB {
        a: Arc<ServiceA>,
    }

    impl Component for ServiceB {
        const INJECTABLE: bool = true;

        fn metadata() -> ClassMetadata {
            ClassMetadata::new(TypeKey::of::<Self>()).dependency::<ServiceA>("a")
        }

        fn inject(container: &Container) -> Result<Self> {
            Ok(Self {
                a: container.resolve::<ServiceA>()?,
            })
        }
    }

    struct PlainService;

    impl Component for PlainService {
        const INJECTABLE: bool = false;

        fn inject(_: &Container) -> Result<Self> {
            Ok(Self)
        }
    }

    struct NeedsPlain {
        _plain: Arc<PlainService>,
    }

    impl Component for NeedsPlain {
        const INJECTABLE: bool = true;

        fn metadata() -> ClassMetadata {
            ClassMetadata::new(TypeKey::of::<Self>()).dependency::<PlainService>("plain")
        }

        fn inject(container: &Container) -> Result<Self> {
            Ok(Self {
                _plain: container.resolve::<PlainService>()?,
            })
        }
    }

    struct CycleA {
        _b: Arc<CycleB>,
    }

    struct CycleB {
        _a: Arc<CycleA>,
    }

    impl Component for CycleA {
        const INJECTABLE: bool = true;

        fn inject(container: &Container) -> Result<Self> {
            Ok(Self {
                _b: container.resolve::<CycleB>()?,
            })
        }
    }

    impl Component for CycleB {
        const INJECTABLE: bool = true;

        fn inject(container: &Container) -> Result<Self> {
            Ok(Self {
                _a: container.resolve::<CycleA>()?,
            })
        }
    }

    struct HomeController {
        service: Arc<ServiceB>,
    }

    impl Component for HomeController {
        const INJECTABLE: bool = false;

        fn metadata() -> ClassMetadata {
            ClassMetadata::new(TypeKey::of::<Self>()).dependency::<ServiceB>("service")
        }

        fn inject(container: &Container) -> Result<Self> {
            Ok(Self {
                service: container.resolve::<ServiceB>()?,
            })
        }
    }

    impl Controller for HomeController {
        fn prefix() -> &'static str {
            "/home"
        }

        fn routes() -> Vec<RouteDefinition> {
            Vec::new()
        }

        fn router(_: Arc<Self>) -> Router<AppState> {
            Router::new()
        }
    }

    struct CoreModule;

    impl Module for CoreModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new()
                .provider::<ServiceA>()
                .provider::<ServiceB>()
                .export::<ServiceB>()
        }
    }

    struct HomeModule;

    impl Module for HomeModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new()
                .import::<CoreModule>()
                .controller::<HomeController>()
                .export::<ServiceB>()
        }
    }

    struct BrokenModule;

    impl Module for BrokenModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new()
                .provider::<ServiceA>()
                .provider::<PlainService>()
        }
    }

    struct LeakyModule;

    impl Module for LeakyModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new()
                .provider::<ServiceA>()
                .export::<ServiceB>()
        }
    }

    struct CycleModule;

    impl Module for CycleModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().provider::<CycleA>()
        }
    }

    struct SharedModule;

    impl Module for SharedModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new()
                .provider::<ServiceA>()
                .global(true)
        }
    }

    #[test]
    fn test_add_module_is_idempotent() {
        let mut container = Container::new();
        let first = container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();
        let second = container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();

        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(first.module_ref.token(), second.module_ref.token());
        assert_eq!(first.module_ref.id(), second.module_ref.id());
        assert_eq!(container.modules().len(), 1);
    }

    #[test]
    fn test_dependency_binding_shares_singletons() {
        let mut container = Container::new();
        container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();

        let a = container.get::<ServiceA>().unwrap();
        let b = container.get::<ServiceB>().unwrap();
        assert!(Arc::ptr_eq(&a, &b.a));
        assert_eq!(a.id, b.a.id);
        assert!(Arc::ptr_eq(&b, &container.get::<ServiceB>().unwrap()));
    }

    #[test]
    fn test_imports_are_registered_depth_first() {
        let mut container = Container::new();
        let home = container.add_module(&ModuleDef::of::<HomeModule>()).unwrap();

        let core_token = container
            .module_compiler()
            .token_of(&ModuleDef::of::<CoreModule>());
        let core = container.get_module_by_key(&core_token).unwrap();
        assert_eq!(core.distance(), 1);
        assert_eq!(home.module_ref.distance(), 0);
        assert_eq!(home.module_ref.imports(), [core_token.clone()]);

        let names: Vec<_> = container.modules().values().map(ModuleNode::name).collect();
        assert_eq!(names, ["HomeModule", "CoreModule"]);

        let controller = container.get::<HomeController>().unwrap();
        assert!(Arc::ptr_eq(
            &controller.service,
            &container.get::<ServiceB>().unwrap()
        ));
        assert!(home.module_ref.has_controller(TypeKey::of::<HomeController>()));
        assert_eq!(home.module_ref.exports(), [TypeKey::of::<ServiceB>()]);
    }

    #[test]
    fn test_non_injectable_provider_is_rejected() {
        let mut container = Container::new();
        let err = container
            .add_module(&ModuleDef::of::<BrokenModule>())
            .unwrap_err();

        match err {
            NestError::NoneInjectable { type_name, message } => {
                assert_eq!(type_name, "PlainService");
                assert!(message.contains("BrokenModule"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The provider declared before the rejected one stays consistent.
        assert!(container.get::<ServiceA>().is_ok());
        assert!(!container.contains::<PlainService>());
    }

    #[test]
    fn test_non_injectable_dependency_is_rejected() {
        struct NeedsPlainModule;

        impl Module for NeedsPlainModule {
            fn descriptor() -> ModuleDescriptor {
                ModuleDescriptor::new().provider::<NeedsPlain>()
            }
        }

        let mut container = Container::new();
        let err = container
            .add_module(&ModuleDef::of::<NeedsPlainModule>())
            .unwrap_err();
        assert!(
            matches!(err, NestError::NoneInjectable { ref type_name, .. } if type_name == "PlainService")
        );
    }

    #[test]
    fn test_add_provider_to_unknown_module() {
        let mut container = Container::new();
        let err = container
            .add_provider("missing", &ComponentDef::of::<ServiceA>())
            .unwrap_err();
        assert!(matches!(err, NestError::UnknownModule { ref token } if token == "missing"));
    }

    #[test]
    fn test_circular_dependency_reports_path() {
        let mut container = Container::new();
        let err = container
            .add_module(&ModuleDef::of::<CycleModule>())
            .unwrap_err();
        match err {
            NestError::CircularDependency { cycle } => {
                assert_eq!(cycle, "CycleA -> CycleB -> CycleA");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(container.injector().is_empty());
    }

    #[test]
    fn test_invalid_export_is_rejected() {
        let mut container = Container::new();
        let err = container
            .add_module(&ModuleDef::of::<LeakyModule>())
            .unwrap_err();
        assert!(matches!(
            err,
            NestError::InvalidExport { ref module, ref export }
                if module == "LeakyModule" && export == "ServiceB"
        ));
    }

    #[test]
    fn test_missing_dependency_binding() {
        let container = Container::new();
        let err = container.get::<ServiceA>().unwrap_err();
        assert!(matches!(err, NestError::DependencyNotFound { .. }));
    }

    #[test]
    fn test_resolve_binds_on_first_use() {
        let container = Container::new();
        let b = container.resolve::<ServiceB>().unwrap();
        assert!(container.contains::<ServiceA>());
        assert!(Arc::ptr_eq(&b.a, &container.get::<ServiceA>().unwrap()));
        assert!(matches!(
            container.resolve::<PlainService>(),
            Err(NestError::NoneInjectable { .. })
        ));
    }

    #[test]
    fn test_registered_value_is_singleton() {
        let mut container = Container::new();
        container.register(String::from("postgres://localhost"));
        let first = container.get::<String>().unwrap();
        let second = container.get::<String>().unwrap();
        assert_eq!(first.as_str(), "postgres://localhost");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_dynamic_modules_get_distinct_tokens() {
        let mut container = Container::new();
        let dev = ModuleDef::dynamic::<SharedModule>(json!({"env": "dev"}));
        let prod = ModuleDef::dynamic::<SharedModule>(json!({"env": "prod"}));
        let a = container.add_module(&dev).unwrap();
        let b = container.add_module(&prod).unwrap();

        assert!(a.inserted && b.inserted);
        assert_ne!(a.module_ref.token(), b.module_ref.token());
        assert_eq!(container.global_modules().count(), 2);
        assert!(a.module_ref.is_global());
    }

    #[test]
    fn test_add_related_module() {
        let mut container = Container::new();
        let core = container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();
        let shared = container.add_module(&ModuleDef::of::<SharedModule>()).unwrap();
        let core_token = core.module_ref.token().to_string();

        container
            .add_related_module(&ModuleDef::of::<SharedModule>(), &core_token)
            .unwrap();
        container
            .add_related_module(&ModuleDef::of::<SharedModule>(), &core_token)
            .unwrap();
        let core = container.get_module_by_key(&core_token).unwrap();
        assert_eq!(core.imports(), [shared.module_ref.token().to_string()]);

        let err = container
            .add_related_module(&ModuleDef::of::<HomeModule>(), &core_token)
            .unwrap_err();
        assert!(matches!(err, NestError::UnknownModule { .. }));
    }

    #[test]
    fn test_clear_resets_instances_by_default() {
        let mut container = Container::new();
        container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();
        let before = container.get::<ServiceA>().unwrap();

        container.clear();
        assert!(container.modules().is_empty());
        assert!(container.modules_metadata().is_empty());
        assert!(container.is_empty());

        container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();
        let after = container.get::<ServiceA>().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_clear_can_keep_instances() {
        let mut container = Container::with_config(ContainerConfig {
            reset_instances_on_clear: false,
            ..ContainerConfig::default()
        });
        container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();
        let before = container.get::<ServiceA>().unwrap();

        container.clear();
        assert!(container.modules().is_empty());
        let reinserted = container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();
        assert!(reinserted.inserted);
        assert!(Arc::ptr_eq(&before, &container.get::<ServiceA>().unwrap()));

        let mut container = Container::new();
        container.add_module(&ModuleDef::of::<CoreModule>()).unwrap();
        let before = container.get::<ServiceA>().unwrap();
        container.clear_modules();
        assert!(Arc::ptr_eq(&before, &container.get::<ServiceA>().unwrap()));
    }
}
