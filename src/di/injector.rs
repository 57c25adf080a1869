use crate::di::{ClassMetadata, ComponentDef, Container, Instance, TypeKey};
use crate::error::{NestError, Result};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, Mutex, PoisonError};

/// Singleton-scoped instance store behind the [`Container`].
///
/// Bindings say how a type is built, instances hold the one object built per
/// type. Both live for the whole process unless the container is cleared.
pub struct Injector {
    bindings: DashMap<TypeId, ComponentDef>,
    instances: DashMap<TypeId, Instance>,
    metadata: DashMap<TypeId, Arc<ClassMetadata>>,
    resolving: Mutex<Vec<TypeKey>>,
}

impl Injector {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
            instances: DashMap::new(),
            metadata: DashMap::new(),
            resolving: Mutex::new(Vec::new()),
        }
    }

    /// Bind a definition unless the type is already bound.
    ///
    /// Returns `true` when the binding is new. Value definitions also seed the
    /// instance cache.
    pub fn bind(&self, def: &ComponentDef) -> bool {
        let id = def.key().id();
        if self.bindings.contains_key(&id) {
            return false;
        }
        self.bindings.insert(id, def.clone());
        if let Some(instance) = def.prebuilt() {
            self.instances.entry(id).or_insert(instance);
        }
        tracing::debug!(provider = %def.key(), "bound");
        true
    }

    /// Bind a pre-built value.
    ///
    /// A value replaces a constructor binding of the same type as long as that
    /// binding has not produced an instance yet. The first value bound for a
    /// type wins. Non-value definitions fall back to [`Injector::bind`].
    pub fn bind_value(&self, def: &ComponentDef) -> Result<bool> {
        let Some(instance) = def.prebuilt() else {
            return Ok(self.bind(def));
        };
        let id = def.key().id();
        if self.bindings.get(&id).is_some_and(|existing| existing.is_value()) {
            return Ok(false);
        }
        if self.instances.contains_key(&id) {
            return Err(NestError::ValueProviderConflict {
                type_name: def.key().type_name().to_string(),
            });
        }
        self.bindings.insert(id, def.clone());
        self.instances.insert(id, instance);
        self.metadata.remove(&id);
        tracing::debug!(provider = %def.key(), "bound value");
        Ok(true)
    }

    pub fn is_bound(&self, key: TypeKey) -> bool {
        self.bindings.contains_key(&key.id())
    }

    pub fn is_instantiated(&self, key: TypeKey) -> bool {
        self.instances.contains_key(&key.id())
    }

    /// Class metadata of a definition, computed once per type.
    pub fn metadata_of(&self, def: &ComponentDef) -> Arc<ClassMetadata> {
        let id = def.key().id();
        if let Some(cached) = self.metadata.get(&id) {
            return Arc::clone(cached.value());
        }
        let computed = Arc::new(def.metadata());
        Arc::clone(self.metadata.entry(id).or_insert(computed).value())
    }

    /// Cached singleton, constructing it from its binding on first use.
    pub fn instance(&self, key: TypeKey, container: &Container) -> Result<Instance> {
        let id = key.id();
        if let Some(instance) = self.instances.get(&id) {
            return Ok(Arc::clone(instance.value()));
        }

        let def = self
            .bindings
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NestError::DependencyNotFound {
                type_name: format!(
                    "{} (it is not listed in the providers of any registered module)",
                    key.type_name()
                ),
            })?;

        self.enter(key)?;
        let built = def.instantiate(container);
        self.leave(key);

        let instance = built?;
        tracing::debug!(provider = %key, "instantiated");
        Ok(Arc::clone(self.instances.entry(id).or_insert(instance).value()))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Drop every binding, cached singleton and metadata record.
    pub fn clear(&self) {
        self.bindings.clear();
        self.instances.clear();
        self.metadata.clear();
        self.resolving
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn enter(&self, key: TypeKey) -> Result<()> {
        let mut stack = self.resolving.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = stack.iter().position(|k| *k == key) {
            let cycle = stack[pos..]
                .iter()
                .chain(std::iter::once(&key))
                .map(|k| k.short_name())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(NestError::CircularDependency { cycle });
        }
        stack.push(key);
        Ok(())
    }

    fn leave(&self, key: TypeKey) {
        let mut stack = self.resolving.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = stack.iter().rposition(|k| *k == key) {
            stack.remove(pos);
        }
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}
