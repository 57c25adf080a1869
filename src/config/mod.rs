//! Runtime configuration: container behaviour, server options and the
//! injectable key/value [`ConfigService`].

use crate::di::{Component, Container};
use crate::error::Result;
use crate::module::{Module, ModuleDef, ModuleDescriptor};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// Container behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Drop bindings and cached singletons on [`Container::clear`].
    pub reset_instances_on_clear: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            reset_instances_on_clear: true,
        }
    }
}

impl ContainerConfig {
    /// Reads `NEST_RESET_INSTANCES_ON_CLEAR`, falling back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(reset) = env_flag("NEST_RESET_INSTANCES_ON_CLEAR") {
            config.reset_instances_on_clear = reset;
        }
        config
    }
}

/// Options passed through to the HTTP adapter when the application is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    pub title: String,
    pub description: String,
    pub version: String,
    pub debug: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            title: "nestrs".to_string(),
            description: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            debug: false,
        }
    }
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Defaults overridden by `NEST_TITLE`, `NEST_DESCRIPTION`, `NEST_VERSION`
    /// and `NEST_DEBUG`.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(title) = env::var("NEST_TITLE") {
            options.title = title;
        }
        if let Ok(description) = env::var("NEST_DESCRIPTION") {
            options.description = description;
        }
        if let Ok(version) = env::var("NEST_VERSION") {
            options.version = version;
        }
        if let Some(debug) = env_flag("NEST_DEBUG") {
            options.debug = debug;
        }
        options
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let value = env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(key, value = other, "ignoring unparsable boolean flag");
            None
        }
    }
}

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// A service seeded from the process environment.
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    /// A service seeded from the environment, then from a JSON object.
    ///
    /// Nested objects are flattened with `.` separators; strings are stored as
    /// is and other scalars through their JSON rendering.
    pub fn from_json(values: &serde_json::Value) -> Self {
        let service = Self::new();
        service.merge_json("", values);
        service
    }

    fn merge_json(&self, prefix: &str, value: &serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    let key = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    self.merge_json(&key, value);
                }
            }
            serde_json::Value::String(s) if !prefix.is_empty() => self.set(prefix, s),
            serde_json::Value::Null => {}
            other if !prefix.is_empty() => self.set(prefix, &other.to_string()),
            _ => {}
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.config.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_empty()
    }
}

impl Component for ConfigService {
    const INJECTABLE: bool = true;

    fn inject(_: &Container) -> Result<Self> {
        Ok(Self::new())
    }
}

/// Global module exporting [`ConfigService`].
pub struct ConfigModule;

impl ConfigModule {
    /// The module parameterized with JSON values that seed the service.
    pub fn for_root(values: serde_json::Value) -> ModuleDef {
        let service = ConfigService::from_json(&values);
        ModuleDef::dynamic::<Self>(values).with_value(service)
    }
}

impl Module for ConfigModule {
    fn descriptor() -> ModuleDescriptor {
        ModuleDescriptor::new()
            .provider::<ConfigService>()
            .export::<ConfigService>()
            .global(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_service_flattens_json() {
        let service = ConfigService::from_json(&json!({
            "database": { "url": "postgres://localhost/app", "pool": 8 },
            "feature": true,
            "unset": null,
        }));
        assert_eq!(
            service.get("database.url").as_deref(),
            Some("postgres://localhost/app")
        );
        assert_eq!(service.get("database.pool").as_deref(), Some("8"));
        assert_eq!(service.get("feature").as_deref(), Some("true"));
        assert!(service.get("unset").is_none());
        assert_eq!(service.get_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_for_root_provides_seeded_service() {
        let mut container = Container::new();
        let module = ConfigModule::for_root(json!({ "app": { "name": "shop" } }));
        let added = container.add_module(&module).unwrap();

        assert!(added.module_ref.is_global());
        assert_eq!(added.module_ref.exports().len(), 1);
        let service = container.get::<ConfigService>().unwrap();
        assert_eq!(service.get("app.name").as_deref(), Some("shop"));
    }

    struct PriceService {
        config: Arc<ConfigService>,
    }

    impl Component for PriceService {
        const INJECTABLE: bool = true;

        fn inject(container: &Container) -> Result<Self> {
            Ok(Self {
                config: container.resolve::<ConfigService>()?,
            })
        }
    }

    struct PriceModule;

    impl Module for PriceModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().provider::<PriceService>()
        }
    }

    struct ShopModule;

    impl Module for ShopModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().imports(vec![
                ModuleDef::of::<PriceModule>(),
                ConfigModule::for_root(json!({ "products": { "currency": "EUR" } })),
            ])
        }
    }

    #[test]
    fn test_for_root_values_reach_consumers_imported_first() {
        let mut container = Container::new();
        container.add_module(&ModuleDef::of::<ShopModule>()).unwrap();

        let prices = container.get::<PriceService>().unwrap();
        assert_eq!(prices.config.get("products.currency").as_deref(), Some("EUR"));
        assert!(Arc::ptr_eq(
            &prices.config,
            &container.get::<ConfigService>().unwrap()
        ));
    }

    #[test]
    fn test_for_root_after_constructed_service_is_rejected() {
        let mut container = Container::new();
        container.add_module(&ModuleDef::of::<PriceModule>()).unwrap();

        let err = container
            .add_module(&ConfigModule::for_root(json!({ "products": { "currency": "EUR" } })))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::NestError::ValueProviderConflict { ref type_name } if type_name.ends_with("ConfigService")
        ));
    }

    #[test]
    fn test_static_config_module_reads_environment() {
        let mut container = Container::new();
        container
            .add_module(&ModuleDef::of::<ConfigModule>())
            .unwrap();
        let service = container.get::<ConfigService>().unwrap();
        assert_eq!(service.get("PATH"), env::var("PATH").ok());
    }

    #[test]
    fn test_server_options_builder() {
        let options = ServerOptions::new()
            .title("shop")
            .description("demo shop")
            .version("1.2.3")
            .debug(true);
        assert_eq!(options.title, "shop");
        assert_eq!(options.description, "demo shop");
        assert_eq!(options.version, "1.2.3");
        assert!(options.debug);
        assert!(ContainerConfig::default().reset_instances_on_clear);

        let parsed: ServerOptions =
            serde_json::from_value(json!({ "title": "api", "debug": true })).unwrap();
        assert_eq!(parsed.title, "api");
        assert!(parsed.debug);
        assert_eq!(parsed.version, ServerOptions::default().version);
    }
}
