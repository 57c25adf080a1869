use crate::di::TypeKey;
use dashmap::DashMap;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::any::TypeId;

/// Derives the identity ("token") of a compiled module.
///
/// The per-type id is memoized by `TypeId` and derived from the fully qualified
/// type name, so tokens are deterministic for a given build. Dynamic
/// configuration is folded into the hash input, giving distinct tokens to
/// distinct configurations of the same module type.
#[derive(Default)]
pub struct ModuleTokenFactory {
    module_ids: DashMap<TypeId, String>,
    module_tokens: DashMap<String, String>,
}

impl ModuleTokenFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, metatype: TypeKey, dynamic_metadata: Option<&serde_json::Value>) -> String {
        let module_id = self.get_module_id(metatype);
        let module_name = metatype.short_name();

        match dynamic_metadata {
            None => self.get_static_module_token(&module_id, module_name),
            Some(dynamic) => {
                let opaque_token = json!({
                    "id": module_id,
                    "module": module_name,
                    "dynamic": dynamic,
                });
                Self::hash_string(&Self::stringify_opaque_token(&opaque_token))
            }
        }
    }

    pub fn get_static_module_token(&self, module_id: &str, module_name: &str) -> String {
        let key = format!("{module_id}_{module_name}");
        if let Some(token) = self.module_tokens.get(&key) {
            return token.value().clone();
        }
        let token = Self::hash_string(&key);
        self.module_tokens.insert(key, token.clone());
        token
    }

    pub fn get_module_id(&self, metatype: TypeKey) -> String {
        self.module_ids
            .entry(metatype.id())
            .or_insert_with(|| Self::hash_string(metatype.type_name())[..16].to_string())
            .value()
            .clone()
    }

    /// Objects serialize with sorted keys, so equal values give equal strings.
    pub fn stringify_opaque_token(opaque_token: &serde_json::Value) -> String {
        opaque_token.to_string()
    }

    pub fn hash_string(value: &str) -> String {
        hex::encode(Sha256::digest(value.as_bytes()))
    }
}
