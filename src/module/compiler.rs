use crate::controller::ControllerDef;
use crate::di::{ComponentDef, TypeKey};
use crate::error::{NestError, Result};
use crate::module::{ModuleDef, ModuleTokenFactory};

/// The four descriptor lists of a compiled module, with defaults applied.
#[derive(Clone, Debug, Default)]
pub struct ModuleMetadata {
    pub imports: Vec<ModuleDef>,
    pub providers: Vec<ComponentDef>,
    pub controllers: Vec<ControllerDef>,
    pub exports: Vec<TypeKey>,
    pub is_global: bool,
    pub config: Option<serde_json::Value>,
}

/// Output of [`ModuleCompiler::compile`].
#[derive(Clone, Debug)]
pub struct ModuleFactory {
    pub metatype: TypeKey,
    pub token: String,
    pub dynamic_metadata: ModuleMetadata,
}

#[derive(Default)]
pub struct ModuleCompiler {
    token_factory: ModuleTokenFactory,
}

impl ModuleCompiler {
    pub fn new(token_factory: ModuleTokenFactory) -> Self {
        Self { token_factory }
    }

    pub fn token_factory(&self) -> &ModuleTokenFactory {
        &self.token_factory
    }

    pub fn compile(&self, module: &ModuleDef) -> Result<ModuleFactory> {
        let metadata = self.extract_metadata(module)?;
        let token = self.token_factory.create(module.key(), module.config());
        Ok(ModuleFactory {
            metatype: module.key(),
            token,
            dynamic_metadata: metadata,
        })
    }

    pub fn extract_metadata(&self, module: &ModuleDef) -> Result<ModuleMetadata> {
        let descriptor = module.descriptor();
        if !descriptor.has_module_metadata() {
            return Err(NestError::MissingModuleMetadata {
                type_name: module.name().to_string(),
            });
        }
        Ok(ModuleMetadata {
            imports: descriptor.imports.unwrap_or_default(),
            providers: descriptor.providers.unwrap_or_default(),
            controllers: descriptor.controllers.unwrap_or_default(),
            exports: descriptor.exports.unwrap_or_default(),
            is_global: descriptor.is_global,
            config: module.config().cloned(),
        })
    }

    /// Token a definition compiles to, without validating its metadata.
    pub fn token_of(&self, module: &ModuleDef) -> String {
        self.token_factory.create(module.key(), module.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Module, ModuleDescriptor};
    use serde_json::json;

    struct NotAModule;

    impl Module for NotAModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().global(true)
        }
    }

    struct ImportsOnly;

    impl Module for ImportsOnly {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().imports(vec![])
        }
    }

    #[test]
    fn test_compile_rejects_undeclared_module() {
        let compiler = ModuleCompiler::default();
        let err = compiler
            .compile(&ModuleDef::of::<NotAModule>())
            .unwrap_err();
        assert!(matches!(err, NestError::MissingModuleMetadata { ref type_name } if type_name == "NotAModule"));
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let compiler = ModuleCompiler::default();
        let factory = compiler.compile(&ModuleDef::of::<ImportsOnly>()).unwrap();
        assert_eq!(factory.metatype, TypeKey::of::<ImportsOnly>());
        assert!(factory.dynamic_metadata.providers.is_empty());
        assert!(factory.dynamic_metadata.controllers.is_empty());
        assert!(factory.dynamic_metadata.exports.is_empty());
        assert!(!factory.dynamic_metadata.is_global);
        assert_eq!(factory.token, compiler.token_of(&ModuleDef::of::<ImportsOnly>()));
    }

    #[test]
    fn test_dynamic_definitions_compile_to_distinct_tokens() {
        let compiler = ModuleCompiler::default();
        let a = compiler
            .compile(&ModuleDef::dynamic::<ImportsOnly>(json!({ "name": "a" })))
            .unwrap();
        let b = compiler
            .compile(&ModuleDef::dynamic::<ImportsOnly>(json!({ "name": "b" })))
            .unwrap();
        assert_ne!(a.token, b.token);
        assert_eq!(a.dynamic_metadata.config, Some(json!({ "name": "a" })));
    }
}
